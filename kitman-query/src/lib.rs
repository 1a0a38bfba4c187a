//! Glues the `kitman` CLI surface to the catalog-generation engine: resolves
//! tags, prepares the source-tag list (spec §4.7), invokes
//! `CatalogGenerator`, and hands the result to `kitman-xml`.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::as_conversions, clippy::clone_on_ref_ptr)]

use eyre::Context;
use kitman_invoke::CommandContext;
use kitman_lib::core::generator::CatalogGenerator;
use kitman_lib::core::graph::CommitGraph;
use kitman_lib::core::tag_order::sort_tags;
use kitman_lib::util::EyreExitOr;
use kitman_opts::{Command, CommitSubcommand, Opts, StreamSubcommand, TagSubcommand};
use kitman_sqlite::{FileChange, SqliteStore};
use tracing::instrument;

/// Dispatch a parsed [`Opts`] to the matching subcommand.
#[instrument(skip(ctx))]
pub fn command_main(ctx: CommandContext, opts: Opts) -> EyreExitOr<()> {
    let CommandContext { effects, mut store } = ctx;

    match opts.command {
        Command::Catalog { stream, paths } => catalog(store, &stream, paths)?,
        Command::Stream { subcommand } => match subcommand {
            StreamSubcommand::Create { name, parent, tag } => {
                let commit_id = store
                    .create_stream(&name, &parent, &tag)
                    .wrap_err("creating stream")?;
                effects.print(&format!("created stream {name:?} at commit {commit_id}"));
            }
            StreamSubcommand::Delete { name } => {
                store.delete_stream(&name).wrap_err("deleting stream")?;
                effects.print(&format!("deleted stream {name:?}"));
            }
            StreamSubcommand::List => {
                for name in store.list_streams().wrap_err("listing streams")? {
                    effects.print(&name);
                }
            }
        },
        Command::Tag { subcommand } => match subcommand {
            TagSubcommand::Create { name, commit_id } => {
                store
                    .create_tag(&name, commit_id)
                    .wrap_err("creating tag")?;
                effects.print(&format!("tagged commit {commit_id} as {name:?}"));
            }
            TagSubcommand::List { stream } => {
                for tag in store
                    .list_source_tags(&stream)
                    .wrap_err("listing source tags")?
                {
                    effects.print(&tag);
                }
            }
        },
        Command::Commit { subcommand } => match subcommand {
            CommitSubcommand::Add {
                stream,
                comment,
                files,
            } => {
                let changes = into_file_changes(files);
                let commit_id = store
                    .append_commit(&stream, &comment, &changes)
                    .wrap_err("appending commit")?;
                effects.print(&format!("committed {commit_id} to {stream:?}"));
            }
        },
        Command::Merge {
            stream,
            from_stream,
            comment,
            files,
        } => {
            let changes = into_file_changes(files);
            let commit_id = store
                .merge(&stream, &from_stream, &comment, &changes)
                .wrap_err("merging stream")?;
            effects.print(&format!(
                "merged {from_stream:?} into {stream:?} as commit {commit_id}"
            ));
        }
    }

    Ok(Ok(()))
}

fn into_file_changes(files: Vec<kitman_opts::FileArg>) -> Vec<FileChange> {
    files
        .into_iter()
        .map(|file| FileChange {
            path: file.path,
            is_delete: file.is_delete,
        })
        .collect()
}

/// `catalog` command: prepare the source-tag list per spec §4.7, generate,
/// and print the resulting XML to stdout.
#[instrument(skip(store))]
fn catalog(store: SqliteStore, stream: &str, paths: Vec<String>) -> eyre::Result<()> {
    let head = store
        .stream_head(stream)
        .wrap_err("resolving stream head")?;
    let last_tag = store
        .last_tag(head)
        .wrap_err("resolving stream's last tag")?;

    let mut tags = paths;
    if let Some(last_tag) = &last_tag {
        if !tags.contains(last_tag) {
            tags.push(last_tag.clone());
        }
    }
    sort_tags(&mut tags, last_tag.as_deref());

    let generator = CatalogGenerator::new(store, head).wrap_err("loading commit graph")?;
    let catalog = generator.generate(&tags).wrap_err("generating catalog")?;

    print!("{}", kitman_xml::render(&catalog));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        {
            let txn = store.transaction().unwrap();
            txn.conn()
                .execute(
                    "INSERT INTO streams (id, name, head_commit_id, parent_stream_id) VALUES (1, 'main', 2, NULL)",
                    [],
                )
                .unwrap();
            txn.conn()
                .execute(
                    "INSERT INTO commits (id, parent, merge_from, comment, date) VALUES (1, NULL, NULL, 'init', '2024-01-01')",
                    [],
                )
                .unwrap();
            txn.conn()
                .execute(
                    "INSERT INTO commits (id, parent, merge_from, comment, date) VALUES (2, 1, NULL, 'second', '2024-01-02')",
                    [],
                )
                .unwrap();
            txn.conn()
                .execute(
                    "INSERT INTO commit_files (commit_id, path, is_delete, seq) VALUES (2, 'b.sql', 0, 0)",
                    [],
                )
                .unwrap();
            txn.conn()
                .execute("INSERT INTO tags (name, commit_id) VALUES ('V1', 1)", [])
                .unwrap();
            txn.conn()
                .execute("INSERT INTO tags (name, commit_id) VALUES ('V2', 2)", [])
                .unwrap();
            txn.commit().unwrap();
        }
        store
    }

    #[test]
    fn catalog_prepends_last_tag_and_renders_xml() {
        let store = seeded_store();
        catalog(store, "main", vec!["V1".to_string()]).unwrap();
    }

    #[test]
    fn catalog_surfaces_unknown_stream() {
        let store = seeded_store();
        let err = catalog(store, "missing", vec!["V1".to_string()]).unwrap_err();
        assert!(err.to_string().contains("resolving stream head"));
    }
}
