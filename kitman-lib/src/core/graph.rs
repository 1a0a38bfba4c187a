//! The read-only snapshot interface the core consumes (spec §4.1).
//!
//! The core never writes through this trait; every method is a pure query
//! against a fixed snapshot of the commit DAG.

use crate::error::CommitId;

/// A single commit (node) in the DAG. See spec §3.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    /// This commit's id.
    pub id: CommitId,

    /// The previous commit on the same stream, if any. `None` for root
    /// commits.
    pub parent: Option<CommitId>,

    /// Either the tip of a foreign branch being merged in, or (when `parent`
    /// is `None`) the origin commit a stream was created from.
    pub merge_from: Option<CommitId>,
}

/// A file event attached to a commit: the path touched, and whether the
/// commit deletes it (as opposed to creating or replacing it).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEvent {
    /// The script path, relative to the stream root.
    pub path: String,

    /// `true` if this commit deletes `path`; `false` if it adds/replaces it.
    pub is_delete: bool,
}

/// Read-only snapshot of a commit DAG reachable from a `head`, as required by
/// the core (spec §4.1). Implementations are free to back this with any
/// storage; the core is pure with respect to it.
pub trait CommitGraph {
    /// The error type surfaced by this collaborator. Propagated unchanged by
    /// the core as [`crate::error::KitmanError::StorageFailure`].
    type Error: std::error::Error + Send + Sync + 'static;

    /// Every commit reachable from `head` via `parent`/`merge_from` edges.
    /// Order is irrelevant.
    fn commits(&self, head: CommitId) -> Result<Vec<Commit>, Self::Error>;

    /// The ordered file events a commit introduces, in the commit's original
    /// insertion order. Empty if the commit introduces no files.
    fn files(&self, commit_id: CommitId) -> Result<Vec<FileEvent>, Self::Error>;

    /// The nearest tag on the `parent` chain from `commit_id`, inclusive.
    /// `None` if no tag is reachable.
    fn last_tag(&self, commit_id: CommitId) -> Result<Option<String>, Self::Error>;

    /// The commit a tag is attached to. Total on tags the caller actually
    /// supplies; callers that pass an unknown tag get `Ok(None)` back and
    /// are expected to turn that into [`crate::error::KitmanError::UnknownTag`].
    fn commit_of(&self, tag: &str) -> Result<Option<CommitId>, Self::Error>;
}
