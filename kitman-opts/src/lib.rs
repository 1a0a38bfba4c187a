//! The command-line options for `kitman`.

#![warn(missing_docs)]
#![warn(
    clippy::all,
    clippy::as_conversions,
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro
)]
#![allow(clippy::too_many_arguments, clippy::blocks_in_conditions)]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Whether to display terminal colors.
#[derive(Clone, Debug, ValueEnum)]
pub enum ColorSetting {
    /// Automatically determine whether to display colors from the terminal
    /// and environment variables. This is the default behavior.
    Auto,
    /// Always display terminal colors.
    Always,
    /// Never display terminal colors.
    Never,
}

/// Arguments which apply to all commands.
#[derive(Debug, Parser)]
pub struct GlobalArgs {
    /// Path to the SQLite database file.
    #[clap(value_parser, long = "db", global = true, default_value = "kitman.db")]
    pub db_path: PathBuf,

    /// Flag to force enable or disable terminal colors.
    #[clap(long = "color", value_enum, global = true)]
    pub color: Option<ColorSetting>,
}

/// One file to add/replace or delete on a new commit, given as `+path` or
/// `-path` on the command line.
#[derive(Clone, Debug)]
pub struct FileArg {
    /// The script path.
    pub path: String,
    /// `true` if this is a `-path` deletion.
    pub is_delete: bool,
}

impl std::str::FromStr for FileArg {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix('-') {
            Some(path) => Ok(FileArg {
                path: path.to_string(),
                is_delete: true,
            }),
            None => Ok(FileArg {
                path: s.strip_prefix('+').unwrap_or(s).to_string(),
                is_delete: false,
            }),
        }
    }
}

/// `stream` subcommands.
#[derive(Debug, Subcommand)]
pub enum StreamSubcommand {
    /// Create a new stream, forked from an existing stream at a given tag.
    Create {
        /// The new stream's name.
        name: String,

        /// The existing stream to fork from.
        #[clap(long = "from")]
        parent: String,

        /// The tag on `parent` to fork at.
        #[clap(long = "at")]
        tag: String,
    },

    /// Delete a stream. Its commits are left in place.
    Delete {
        /// The stream to delete.
        name: String,
    },

    /// List all known streams.
    List,
}

/// `tag` subcommands.
#[derive(Debug, Subcommand)]
pub enum TagSubcommand {
    /// Attach a new tag name to an existing commit.
    Create {
        /// The new tag's name.
        name: String,

        /// The commit id to attach it to.
        #[clap(long = "commit")]
        commit_id: i64,
    },

    /// List the candidate source tags on a stream's history, oldest first.
    List {
        /// The stream to list tags for.
        stream: String,
    },
}

/// `commit` subcommands.
#[derive(Debug, Subcommand)]
pub enum CommitSubcommand {
    /// Append a new commit to a stream's head.
    Add {
        /// The stream to commit to.
        stream: String,

        /// The commit message.
        #[clap(long = "message", short = 'm')]
        comment: String,

        /// Files touched by this commit: `+path` to add/replace, `-path` to
        /// delete.
        files: Vec<FileArg>,
    },
}

/// Top-level `kitman` subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate an upgrade catalog for a stream and write it as XML.
    Catalog {
        /// The stream to generate a catalog for; its head is the catalog's
        /// target.
        stream: String,

        /// Source tags to generate upgrades from. The stream's own last tag
        /// is implicitly included if absent (spec §4.7).
        paths: Vec<String>,
    },

    /// Manage streams.
    Stream {
        /// The subcommand to run.
        #[clap(subcommand)]
        subcommand: StreamSubcommand,
    },

    /// Manage tags.
    Tag {
        /// The subcommand to run.
        #[clap(subcommand)]
        subcommand: TagSubcommand,
    },

    /// Manage commits.
    Commit {
        /// The subcommand to run.
        #[clap(subcommand)]
        subcommand: CommitSubcommand,
    },

    /// Merge one stream's head into another's.
    Merge {
        /// The stream receiving the merge.
        stream: String,

        /// The stream being merged in.
        #[clap(long = "from")]
        from_stream: String,

        /// The commit message for the merge commit.
        #[clap(long = "message", short = 'm')]
        comment: String,

        /// Files touched by the merge commit itself: `+path` to add/replace,
        /// `-path` to delete.
        files: Vec<FileArg>,
    },
}

/// Manages database-upgrade script catalogs over a commit DAG of named
/// streams.
#[derive(Debug, Parser)]
#[clap(version = env!("CARGO_PKG_VERSION"), author = "Waleed Khan <me@waleedkhan.name>")]
pub struct Opts {
    /// Global arguments.
    #[clap(flatten)]
    pub global_args: GlobalArgs,

    /// The `kitman` subcommand to run.
    #[clap(subcommand)]
    pub command: Command,
}
