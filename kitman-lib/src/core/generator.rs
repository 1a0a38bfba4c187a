//! Catalog generator: the top-level orchestration of path finding, replay
//! expansion, and script accumulation (spec §4.5).

use std::collections::HashMap;

use tracing::{info, instrument};

use crate::core::accumulator::{Script, ScriptAccumulator};
use crate::core::graph::{Commit, CommitGraph};
use crate::core::path_finder::PathFinder;
use crate::core::replay::ReplayEngine;
use crate::error::{CommitId, KitmanError, Result};

/// One entry of a [`Catalog`]: the ordered scripts a client at `from` must
/// run to reach the stream's head.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upgrade {
    /// The source tag this upgrade starts from.
    pub from: String,

    /// `false` only for the last upgrade in a catalog — the head is not
    /// itself a release.
    pub is_release: bool,

    /// The ordered scripts to execute, with provenance comments.
    pub scripts: Vec<Script>,
}

/// The full output of [`CatalogGenerator::generate`]: one [`Upgrade`] per
/// source tag, in the caller's (pre-sorted) order.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Catalog {
    /// The upgrades, in source-tag order.
    pub upgrades: Vec<Upgrade>,
}

/// Orchestrates the catalog generation algorithm against a fixed snapshot of
/// the commit DAG reachable from `head`. Single-use per `head` (spec §3).
pub struct CatalogGenerator<G: CommitGraph> {
    graph: G,
    head: CommitId,
    commits: HashMap<CommitId, Commit>,
}

impl<G: CommitGraph> CatalogGenerator<G>
where
    G::Error: 'static,
{
    /// Load the entire commit DAG reachable from `head` into memory. Files
    /// and last-tags are fetched lazily by the downstream collaborators.
    #[instrument(skip(graph))]
    pub fn new(graph: G, head: CommitId) -> Result<Self> {
        let loaded = graph
            .commits(head)
            .map_err(|err| KitmanError::StorageFailure(Box::new(err)))?;
        let commits = loaded.into_iter().map(|c| (c.id, c)).collect();
        Ok(Self {
            graph,
            head,
            commits,
        })
    }

    /// `Generate(head, source_tags) → Catalog` (spec §4.5). `source_tags`
    /// must already be in ascending catalog order with the head's own tag
    /// last — tag preparation (§4.7) is the caller's responsibility.
    #[instrument(skip(self, source_tags))]
    pub fn generate(&self, source_tags: &[String]) -> Result<Catalog> {
        let mut commit_ids = Vec::with_capacity(source_tags.len());
        for tag in source_tags {
            let commit_id = self
                .graph
                .commit_of(tag)
                .map_err(|err| KitmanError::StorageFailure(Box::new(err)))?
                .ok_or_else(|| KitmanError::UnknownTag { tag: tag.clone() })?;
            commit_ids.push(commit_id);
        }

        let path_finder = PathFinder::new(&self.commits, None);
        let replay_engine = ReplayEngine::new(&self.commits, &path_finder);
        let shortest_paths = path_finder.shortest_paths(self.head, &commit_ids)?;

        let mut upgrades = Vec::with_capacity(source_tags.len());
        for (tag, commit_id) in source_tags.iter().zip(commit_ids.iter().copied()) {
            let base = path_finder.direct_path(commit_id)?;
            let replay_from = base.len();

            let shortest_path = &shortest_paths[&commit_id];
            let mut full = base;
            full.extend_from_slice(&shortest_path[1..]);

            let replay = replay_engine.replay(&full, replay_from, full.len())?;

            let mut accumulator = ScriptAccumulator::new();
            for commit_id in &replay {
                accumulator.apply(&self.graph, *commit_id)?;
            }

            upgrades.push(Upgrade {
                from: tag.clone(),
                is_release: true,
                scripts: accumulator.into_scripts(),
            });
        }

        if let Some(last) = upgrades.last_mut() {
            last.is_release = false;
        }

        info!(upgrades = upgrades.len(), "generated catalog");
        Ok(Catalog { upgrades })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::FileEvent;
    use std::convert::Infallible;

    struct FixtureGraph {
        commits: Vec<Commit>,
        files: HashMap<CommitId, Vec<FileEvent>>,
        tags: HashMap<CommitId, String>,
        commit_of: HashMap<String, CommitId>,
    }

    impl CommitGraph for FixtureGraph {
        type Error = Infallible;

        fn commits(&self, _head: CommitId) -> std::result::Result<Vec<Commit>, Self::Error> {
            Ok(self.commits.clone())
        }

        fn files(&self, commit_id: CommitId) -> std::result::Result<Vec<FileEvent>, Self::Error> {
            Ok(self.files.get(&commit_id).cloned().unwrap_or_default())
        }

        fn last_tag(&self, commit_id: CommitId) -> std::result::Result<Option<String>, Self::Error> {
            Ok(self.tags.get(&commit_id).cloned())
        }

        fn commit_of(&self, tag: &str) -> std::result::Result<Option<CommitId>, Self::Error> {
            Ok(self.commit_of.get(tag).copied())
        }
    }

    fn commit(id: CommitId, parent: Option<CommitId>, merge_from: Option<CommitId>) -> Commit {
        Commit {
            id,
            parent,
            merge_from,
        }
    }

    fn file(path: &str, is_delete: bool) -> FileEvent {
        FileEvent {
            path: path.to_string(),
            is_delete,
        }
    }

    /// S1 — linear chain, single source: a single upgrade, not a release.
    #[test]
    fn linear_chain_single_source_produces_one_non_release_upgrade() {
        let graph = FixtureGraph {
            commits: vec![commit(1, None, None), commit(2, Some(1), None)],
            files: HashMap::from([
                (1, vec![file("a.sql", false)]),
                (2, vec![file("b.sql", false)]),
            ]),
            tags: HashMap::from([(1, "V1".to_string()), (2, "V2".to_string())]),
            commit_of: HashMap::from([("V1".to_string(), 1)]),
        };

        let generator = CatalogGenerator::new(graph, 2).unwrap();
        let catalog = generator.generate(&["V1".to_string()]).unwrap();

        assert_eq!(catalog.upgrades.len(), 1);
        let upgrade = &catalog.upgrades[0];
        assert_eq!(upgrade.from, "V1");
        assert!(!upgrade.is_release);
        assert_eq!(upgrade.scripts.len(), 1);
        assert_eq!(upgrade.scripts[0].path, "b.sql");
        assert_eq!(upgrade.scripts[0].comment, "from V2 (ID 2)");
    }

    /// Unknown source tag aborts the whole generation — no partial catalog.
    #[test]
    fn unknown_tag_is_surfaced() {
        let graph = FixtureGraph {
            commits: vec![commit(1, None, None)],
            files: HashMap::new(),
            tags: HashMap::new(),
            commit_of: HashMap::new(),
        };
        let generator = CatalogGenerator::new(graph, 1).unwrap();
        let err = generator.generate(&["missing".to_string()]).unwrap_err();
        assert!(matches!(err, KitmanError::UnknownTag { .. }));
    }

    /// Multiple sources: only the last upgrade is non-release.
    #[test]
    fn only_last_upgrade_is_non_release() {
        let graph = FixtureGraph {
            commits: vec![
                commit(1, None, None),
                commit(2, Some(1), None),
                commit(3, Some(2), None),
            ],
            files: HashMap::new(),
            tags: HashMap::from([
                (1, "V1".to_string()),
                (2, "V2".to_string()),
                (3, "V3".to_string()),
            ]),
            commit_of: HashMap::from([("V1".to_string(), 1), ("V2".to_string(), 2)]),
        };
        let generator = CatalogGenerator::new(graph, 3).unwrap();
        let catalog = generator
            .generate(&["V1".to_string(), "V2".to_string()])
            .unwrap();

        assert_eq!(catalog.upgrades.len(), 2);
        assert!(catalog.upgrades[0].is_release);
        assert!(!catalog.upgrades[1].is_release);
    }

    /// S3 — merge interleaving, end to end through the generator.
    #[test]
    fn merge_interleaving_produces_expected_scripts() {
        let graph = FixtureGraph {
            commits: vec![
                commit(1, None, None),
                commit(2, Some(1), None),
                commit(3, None, Some(1)),
                commit(4, Some(3), None),
                commit(5, Some(4), Some(2)),
            ],
            files: HashMap::from([
                (1, vec![file("x1.sql", false)]),
                (2, vec![file("x2.sql", false)]),
                (4, vec![file("y1.sql", false)]),
                (5, vec![file("m.sql", false)]),
            ]),
            tags: HashMap::from([
                (1, "X1".to_string()),
                (2, "X2".to_string()),
                (3, "Y_init".to_string()),
                (4, "Y1".to_string()),
                (5, "Y2".to_string()),
            ]),
            commit_of: HashMap::from([("Y1".to_string(), 4)]),
        };

        let generator = CatalogGenerator::new(graph, 5).unwrap();
        let catalog = generator.generate(&["Y1".to_string()]).unwrap();

        let paths: Vec<&str> = catalog.upgrades[0]
            .scripts
            .iter()
            .map(|script| script.path.as_str())
            .collect();
        assert_eq!(paths, vec!["x2.sql", "m.sql"]);
    }
}
