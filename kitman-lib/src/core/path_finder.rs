//! Path finding over the in-memory commit map (spec §4.3).

use std::collections::{HashMap, VecDeque};

use tracing::instrument;

use crate::core::graph::Commit;
use crate::error::{CommitId, KitmanError, Result};

/// Computes direct and shortest paths through a fixed snapshot of the commit
/// DAG, held as `id -> Commit`.
pub struct PathFinder<'a> {
    commits: &'a HashMap<CommitId, Commit>,
    stop_commit: Option<CommitId>,
}

impl<'a> PathFinder<'a> {
    /// Build a path finder over `commits`. `stop_commit`, when set, lets
    /// [`Self::direct_path`] stop early instead of walking all the way to a
    /// root.
    pub fn new(commits: &'a HashMap<CommitId, Commit>, stop_commit: Option<CommitId>) -> Self {
        Self {
            commits,
            stop_commit,
        }
    }

    fn get(&self, from: CommitId, edge: &'static str, to: CommitId) -> Result<&Commit> {
        self.commits.get(&to).ok_or(KitmanError::GraphInconsistent {
            from,
            edge,
            missing: to,
        })
    }

    /// Look up a commit that must already be in the snapshot because it was
    /// itself reached via a followed edge (or is the configured head).
    fn lookup(&self, commit_id: CommitId) -> Result<&Commit> {
        self.get(commit_id, "commits", commit_id)
    }

    /// `DirectPath(to)`: follow `parent` from `to` back to a root (or to
    /// `stop_commit`, inclusive), then reverse. The result runs from the
    /// root (or stop commit) down to `to`.
    #[instrument(skip(self))]
    pub fn direct_path(&self, to: CommitId) -> Result<Vec<CommitId>> {
        let mut path = vec![to];
        let mut commit_id = to;

        loop {
            if Some(commit_id) == self.stop_commit {
                break;
            }
            let commit = self.lookup(commit_id)?;
            match commit.parent {
                Some(parent) => {
                    path.push(parent);
                    commit_id = parent;
                }
                None => break,
            }
        }

        path.reverse();
        Ok(path)
    }

    /// Single-source BFS from `head` over outgoing `parent`/`merge_from`
    /// edges, computing the shortest path from `head` to every commit in
    /// `targets` in one pass (spec §4.3). Edge-visit order is `parent`
    /// before `merge_from`, dequeued FIFO, which is the tie-break the rest
    /// of the engine relies on for determinism.
    #[instrument(skip(self, targets))]
    pub fn shortest_paths(
        &self,
        head: CommitId,
        targets: &[CommitId],
    ) -> Result<HashMap<CommitId, Vec<CommitId>>> {
        let mut from_to: HashMap<CommitId, CommitId> = HashMap::new();
        let mut visited: std::collections::HashSet<CommitId> = std::collections::HashSet::new();
        let mut work: VecDeque<CommitId> = VecDeque::new();
        work.push_back(head);

        while let Some(commit_id) = work.pop_front() {
            if !visited.insert(commit_id) {
                continue;
            }

            let commit = self.lookup(commit_id)?;

            if let Some(parent) = commit.parent {
                from_to.entry(parent).or_insert(commit_id);
                work.push_back(parent);
            }
            if let Some(merge_from) = commit.merge_from {
                from_to.entry(merge_from).or_insert(commit_id);
                work.push_back(merge_from);
            }

            if targets.iter().all(|target| from_to.contains_key(target)) {
                break;
            }
        }

        let mut paths = HashMap::with_capacity(targets.len());
        for &target in targets {
            let mut path = vec![target];
            let mut commit_id = target;
            while let Some(&next) = from_to.get(&commit_id) {
                path.push(next);
                commit_id = next;
            }
            paths.insert(target, path);
        }
        Ok(paths)
    }
}
