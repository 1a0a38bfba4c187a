//! SQLite-backed persistence for kitman: the `CommitGraph` the core consumes,
//! plus the mutation API (streams, tags, commits) that is otherwise outside
//! the core's scope.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::as_conversions, clippy::clone_on_ref_ptr)]

mod mutate;
mod schema;
mod transaction;

use kitman_lib::core::graph::{Commit, CommitGraph, FileEvent};
use kitman_lib::error::CommitId;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::instrument;

pub use mutate::FileChange;
pub use transaction::ScopedTransaction;

/// Errors surfaced by the SQLite collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Propagated unchanged from `rusqlite`.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// A mutation referenced a stream name that does not exist.
    #[error("unknown stream: {0:?}")]
    UnknownStream(String),

    /// A mutation referenced a tag name that does not exist.
    #[error("unknown tag: {0:?}")]
    UnknownTag(String),

    /// `create_stream` or `create_tag` was given a name already in use.
    #[error("name already in use: {0:?}")]
    NameInUse(String),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// A SQLite-backed commit store: owns the connection, runs the schema
/// migration on open, and implements `CommitGraph` by read-only query.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if absent) the database at `path`, running schema
    /// setup if the `commits` table doesn't already exist.
    #[instrument]
    pub fn open(path: &std::path::Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::ensure_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database. Used by tests and by callers that don't
    /// need durability across process restarts.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::ensure_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Begin a scoped transaction: commits on success, rolls back on drop if
    /// the closure returns an error or panics mid-way (spec §9's
    /// scoped-acquisition design note).
    pub fn transaction(&mut self) -> Result<ScopedTransaction<'_>> {
        ScopedTransaction::new(&mut self.conn)
    }

    /// The commit id a stream's head currently points to.
    #[instrument(skip(self))]
    pub fn stream_head(&self, stream_name: &str) -> Result<CommitId> {
        self.conn
            .query_row(
                "SELECT head_commit_id FROM streams WHERE name = ?1",
                params![stream_name],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::UnknownStream(stream_name.to_string()))
    }

    /// Every stream name currently defined, in creation order.
    pub fn list_streams(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM streams ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<Vec<String>>>()
            .map_err(StoreError::from)
    }

    /// Every tag name reachable as a "last tag" somewhere on `stream_name`'s
    /// history, in commit order — candidates for a catalog's source-tag
    /// list (spec §4.7 calls this the caller's job; this just enumerates
    /// what's available to choose from).
    #[instrument(skip(self))]
    pub fn list_source_tags(&self, stream_name: &str) -> Result<Vec<String>> {
        let head = self.stream_head(stream_name)?;
        let mut stmt = self.conn.prepare(
            "WITH RECURSIVE chain(id, depth) AS (
                SELECT ?1, 0
                UNION ALL
                SELECT c.parent, chain.depth + 1
                FROM commits c JOIN chain ON c.id = chain.id
                WHERE c.parent IS NOT NULL
            )
            SELECT t.name FROM tags t JOIN chain ON t.commit_id = chain.id
            ORDER BY chain.depth DESC",
        )?;
        let rows = stmt.query_map(params![head], |row| row.get(0))?;
        rows.collect::<rusqlite::Result<Vec<String>>>()
            .map_err(StoreError::from)
    }
}

impl CommitGraph for SqliteStore {
    type Error = StoreError;

    #[instrument(skip(self))]
    fn commits(&self, head: CommitId) -> std::result::Result<Vec<Commit>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "WITH RECURSIVE reachable(id) AS (
                SELECT ?1
                UNION
                SELECT c.parent FROM commits c JOIN reachable ON c.id = reachable.id WHERE c.parent IS NOT NULL
                UNION
                SELECT c.merge_from FROM commits c JOIN reachable ON c.id = reachable.id WHERE c.merge_from IS NOT NULL
            )
            SELECT c.id, c.parent, c.merge_from
            FROM commits c JOIN reachable ON c.id = reachable.id",
        )?;
        let rows = stmt.query_map(params![head], |row| {
            Ok(Commit {
                id: row.get(0)?,
                parent: row.get(1)?,
                merge_from: row.get(2)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<Commit>>>()
            .map_err(StoreError::from)
    }

    #[instrument(skip(self))]
    fn files(&self, commit_id: CommitId) -> std::result::Result<Vec<FileEvent>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT path, is_delete FROM commit_files WHERE commit_id = ?1 ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![commit_id], |row| {
            Ok(FileEvent {
                path: row.get(0)?,
                is_delete: row.get::<_, i64>(1)? != 0,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<FileEvent>>>()
            .map_err(StoreError::from)
    }

    #[instrument(skip(self))]
    fn last_tag(&self, commit_id: CommitId) -> std::result::Result<Option<String>, Self::Error> {
        self.conn
            .query_row(
                "WITH RECURSIVE chain(id, depth) AS (
                    SELECT ?1, 0
                    UNION ALL
                    SELECT c.parent, chain.depth + 1
                    FROM commits c JOIN chain ON c.id = chain.id
                    WHERE c.parent IS NOT NULL
                )
                SELECT t.name FROM chain JOIN tags t ON t.commit_id = chain.id
                ORDER BY chain.depth ASC LIMIT 1",
                params![commit_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::from)
    }

    #[instrument(skip(self))]
    fn commit_of(&self, tag: &str) -> std::result::Result<Option<CommitId>, Self::Error> {
        self.conn
            .query_row(
                "SELECT commit_id FROM tags WHERE name = ?1",
                params![tag],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::from)
    }
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
    fn commits_walks_parent_and_merge_from() {
        let store = seeded_store();
        let mut commits = store.commits(2).unwrap();
        commits.sort_by_key(|c| c.id);
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[1].parent, Some(1));
    }

    #[test]
    fn last_tag_walks_parent_chain() {
        let store = seeded_store();
        assert_eq!(store.last_tag(2).unwrap().as_deref(), Some("V2"));
        assert_eq!(store.last_tag(1).unwrap().as_deref(), Some("V1"));
    }

    #[test]
    fn commit_of_resolves_known_tag() {
        let store = seeded_store();
        assert_eq!(store.commit_of("V2").unwrap(), Some(2));
        assert_eq!(store.commit_of("missing").unwrap(), None);
    }

    #[test]
    fn files_are_ordered_by_sequence() {
        let store = seeded_store();
        let files = store.files(2).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "b.sql");
        assert!(!files[0].is_delete);
    }

    #[test]
    fn stream_head_resolves_and_rejects_unknown() {
        let store = seeded_store();
        assert_eq!(store.stream_head("main").unwrap(), 2);
        assert!(matches!(
            store.stream_head("missing").unwrap_err(),
            StoreError::UnknownStream(_)
        ));
    }

    #[test]
    fn rolled_back_transaction_does_not_persist() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        {
            let txn = store.transaction().unwrap();
            txn.conn()
                .execute(
                    "INSERT INTO streams (id, name, head_commit_id, parent_stream_id) VALUES (1, 'doomed', 1, NULL)",
                    [],
                )
                .unwrap();
            // Dropped without calling `commit` — rolls back.
        }
        assert!(store.list_streams().unwrap().is_empty());
    }
}
