//! Script accumulator: folds file events along a replay list into an ordered
//! per-tag script list, carrying provenance comments (spec §4.6).

use tracing::instrument;

use crate::core::graph::CommitGraph;
use crate::error::{CommitId, KitmanError, Result};

const DELETED_TAG: &str = "DELETED";

/// One script in an upgrade's ordered list, with its accumulated provenance
/// comment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Script {
    /// The script's path.
    pub path: String,

    /// `from TAG (ID N)`, possibly extended with `, TAG (ID N)` for every
    /// later commit on the replay list that re-touched the same path.
    pub comment: String,
}

/// Accumulates an ordered, deduplicated script list by folding file events
/// along a replay list.
#[derive(Default)]
pub struct ScriptAccumulator {
    scripts: Vec<Script>,
}

impl ScriptAccumulator {
    /// A fresh, empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, path: &str) -> Option<usize> {
        self.scripts.iter().position(|script| script.path == path)
    }

    /// Fold in every file event touched by `commit_id`. A no-op if the
    /// commit introduces no files.
    #[instrument(skip(self, graph))]
    pub fn apply<G: CommitGraph>(&mut self, graph: &G, commit_id: CommitId) -> Result<()>
    where
        G::Error: 'static,
    {
        let files = graph
            .files(commit_id)
            .map_err(|err| KitmanError::StorageFailure(Box::new(err)))?;
        if files.is_empty() {
            return Ok(());
        }

        let tag = graph
            .last_tag(commit_id)
            .map_err(|err| KitmanError::StorageFailure(Box::new(err)))?
            .unwrap_or_else(|| DELETED_TAG.to_string());

        for file in files {
            if file.is_delete {
                if let Some(index) = self.position(&file.path) {
                    self.scripts.remove(index);
                }
                continue;
            }

            match self.position(&file.path) {
                Some(index) => {
                    use std::fmt::Write;
                    write!(
                        self.scripts[index].comment,
                        ", {tag} (ID {commit_id})"
                    )
                    .expect("writing to a String cannot fail");
                }
                None => self.scripts.push(Script {
                    path: file.path,
                    comment: format!("from {tag} (ID {commit_id})"),
                }),
            }
        }

        Ok(())
    }

    /// Consume the accumulator, returning the final ordered script list.
    pub fn into_scripts(self) -> Vec<Script> {
        self.scripts
    }
}
