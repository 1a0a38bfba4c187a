//! Replay engine: expands a commit sequence into a linearized replay list
//! that interleaves merged-in branch histories at the correct points (spec
//! §4.4).

use std::collections::HashMap;

use tracing::instrument;

use crate::core::graph::Commit;
use crate::core::path_finder::PathFinder;
use crate::error::{CommitId, KitmanError, Result};

/// Expands an ordered commit sequence into the flat replay order its scripts
/// must execute in, splicing in merged-in branches at the point they arrive.
pub struct ReplayEngine<'a> {
    commits: &'a HashMap<CommitId, Commit>,
    path_finder: &'a PathFinder<'a>,
}

impl<'a> ReplayEngine<'a> {
    /// Build a replay engine over a fixed commit snapshot, reusing `path_finder`
    /// for the `DirectPath` lookups merge expansion needs.
    pub fn new(commits: &'a HashMap<CommitId, Commit>, path_finder: &'a PathFinder<'a>) -> Self {
        Self {
            commits,
            path_finder,
        }
    }

    fn lookup(&self, commit_id: CommitId) -> Result<&Commit> {
        self.commits
            .get(&commit_id)
            .ok_or(KitmanError::GraphInconsistent {
                from: commit_id,
                edge: "commits",
                missing: commit_id,
            })
    }

    /// Top-level entry point: replay `path[from..to)`, returning the
    /// resulting flat commit sequence.
    #[instrument(skip(self, path))]
    pub fn replay(&self, path: &[CommitId], from: usize, to: usize) -> Result<Vec<CommitId>> {
        let mut out = Vec::new();
        self.replay_into(path, from, to, &mut out)?;
        Ok(out)
    }

    fn replay_into(
        &self,
        path: &[CommitId],
        from: usize,
        to: usize,
        out: &mut Vec<CommitId>,
    ) -> Result<()> {
        let mut i = from;
        while i < to {
            let commit_id = path[i];
            let commit = self.lookup(commit_id)?;

            if let Some(merge_from) = commit.merge_from {
                if i > 0 && path[i - 1] == merge_from {
                    // Case A — in-line merge: we just walked onto
                    // `merge_from`'s branch at i - 1 and are now crossing
                    // back onto `commit_id`'s own stream. Splice the two and
                    // let a single recursive call finish both the branch's
                    // remaining ancestors and the rest of `path`.
                    let branch = self.path_finder.direct_path(commit_id)?;
                    let from_branch = self.merge_splice(&branch, path, i)?;

                    let mut composed = branch;
                    composed.extend_from_slice(&path[i + 1..to]);
                    return self.replay_into(&composed, from_branch, composed.len(), out);
                }

                if !out.contains(&merge_from) {
                    // Case B — lateral merge-in: bring the foreign branch's
                    // unreplayed commits in before `commit_id` itself.
                    let branch = self.path_finder.direct_path(merge_from)?;
                    let from_branch = self.merge_splice(&branch, path, i)?;
                    self.replay_into(&branch, from_branch, branch.len(), out)?;
                }
            }

            out.push(commit_id);
            i += 1;
        }
        Ok(())
    }

    /// `MergeSplice` (spec §4.4.1): find the latest branch commit whose
    /// merge into `to_path` (at some position before `current_index`) has
    /// already accounted for it, and return the index of the next
    /// unreplayed commit on `from_branch_path`. Pure — makes no changes to
    /// `out`.
    fn merge_splice(
        &self,
        from_branch_path: &[CommitId],
        to_path: &[CommitId],
        current_index: usize,
    ) -> Result<usize> {
        if from_branch_path.len() > 1 {
            for i in (0..from_branch_path.len() - 1).rev() {
                for j in (0..current_index).rev() {
                    let candidate = self.lookup(to_path[j])?;
                    if candidate.merge_from == Some(from_branch_path[i]) {
                        return Ok(i + 1);
                    }
                }
            }
        }
        Ok(1)
    }
}
