//! Errors surfaced by the core (see spec §7).

use thiserror::Error;

/// The id of a commit, as assigned by the collaborator that owns the graph.
pub type CommitId = i64;

/// Errors the core can surface while generating a catalog. The core never
/// retries; it aborts `Generate` on the first error and returns no partial
/// result.
#[derive(Debug, Error)]
pub enum KitmanError {
    /// A source tag passed to `Generate` has no matching commit.
    #[error("unknown tag: {tag:?}")]
    UnknownTag {
        /// The tag that could not be resolved.
        tag: String,
    },

    /// An edge (`parent` or `merge_from`) referenced a commit id that isn't
    /// present in the snapshot returned by `CommitGraph::commits`.
    #[error("commit {from} references {missing} via {edge}, but {missing} is not in the loaded graph")]
    GraphInconsistent {
        /// The commit carrying the dangling edge.
        from: CommitId,
        /// The edge kind (`"parent"` or `"merge_from"`).
        edge: &'static str,
        /// The commit id that could not be found.
        missing: CommitId,
    },

    /// An error propagated unchanged from the `CommitGraph` collaborator.
    #[error("storage failure")]
    StorageFailure(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Convenience alias for results produced by the core.
pub type Result<T> = std::result::Result<T, KitmanError>;
