//! The mutation API: how a commit DAG actually gets built, grounded in
//! `kitman.cpp`'s route handlers (`create_stream`, `create_tag`,
//! `delete_stream`, `commit_files`, `merge`).

use kitman_lib::error::CommitId;
use rusqlite::{params, OptionalExtension};
use tracing::instrument;

use crate::{Result, SqliteStore, StoreError};

/// One file event to record against a new commit.
pub struct FileChange {
    /// The path being added, replaced, or deleted.
    pub path: String,
    /// `true` to delete `path`, `false` to add/replace it.
    pub is_delete: bool,
}

impl SqliteStore {
    fn stream_id(&self, stream_name: &str) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT id FROM streams WHERE name = ?1",
                params![stream_name],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::UnknownStream(stream_name.to_string()))
    }

    /// Create a new stream. `parent` names an existing stream this one
    /// forks from; `tag` names the source commit on `parent`'s history to
    /// fork at. The stream's first commit is a creation commit with
    /// `parent = NULL, merge_from = <tag's commit>`.
    #[instrument(skip(self))]
    pub fn create_stream(&mut self, name: &str, parent: &str, tag: &str) -> Result<CommitId> {
        let origin = self
            .commit_of(tag)
            .map_err(StoreError::from)?
            .ok_or_else(|| StoreError::UnknownTag(tag.to_string()))?;
        let parent_stream_id = self.stream_id(parent)?;

        let txn = self.transaction()?;
        let already_exists: Option<i64> = txn
            .conn()
            .query_row(
                "SELECT id FROM streams WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        if already_exists.is_some() {
            return Err(StoreError::NameInUse(name.to_string()));
        }

        txn.conn().execute(
            "INSERT INTO streams (name, head_commit_id, parent_stream_id) VALUES (?1, NULL, ?2)",
            params![name, parent_stream_id],
        )?;
        let stream_id = txn.conn().last_insert_rowid();

        txn.conn().execute(
            "INSERT INTO commits (stream_id, parent, merge_from, comment, date)
             VALUES (?1, NULL, ?2, ?3, datetime('now'))",
            params![stream_id, origin, format!("create stream {name}")],
        )?;
        let commit_id = txn.conn().last_insert_rowid();
        txn.conn().execute(
            "UPDATE streams SET head_commit_id = ?1 WHERE id = ?2",
            params![commit_id, stream_id],
        )?;

        txn.commit()?;
        Ok(commit_id)
    }

    /// Delete a stream. Its commits are left in place (other streams may
    /// have merged from them); only the `streams` row is removed.
    #[instrument(skip(self))]
    pub fn delete_stream(&mut self, name: &str) -> Result<()> {
        let txn = self.transaction()?;
        let changed = txn
            .conn()
            .execute("DELETE FROM streams WHERE name = ?1", params![name])?;
        if changed == 0 {
            return Err(StoreError::UnknownStream(name.to_string()));
        }
        txn.commit()
    }

    /// Attach a new tag name to an existing commit.
    #[instrument(skip(self))]
    pub fn create_tag(&mut self, name: &str, commit_id: CommitId) -> Result<()> {
        let txn = self.transaction()?;
        let commit_exists: Option<i64> = txn
            .conn()
            .query_row(
                "SELECT id FROM commits WHERE id = ?1",
                params![commit_id],
                |row| row.get(0),
            )
            .optional()?;
        if commit_exists.is_none() {
            return Err(StoreError::UnknownTag(format!(
                "commit {commit_id} does not exist"
            )));
        }
        txn.conn()
            .execute(
                "INSERT INTO tags (name, commit_id) VALUES (?1, ?2)",
                params![name, commit_id],
            )
            .map_err(|err| match err {
                rusqlite::Error::SqliteFailure(e, _)
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    StoreError::NameInUse(name.to_string())
                }
                other => StoreError::from(other),
            })?;
        txn.commit()
    }

    /// Append a new commit to `stream`'s head, recording `files` against it
    /// and advancing the stream's head.
    #[instrument(skip(self, files))]
    pub fn append_commit(
        &mut self,
        stream: &str,
        comment: &str,
        files: &[FileChange],
    ) -> Result<CommitId> {
        let stream_id = self.stream_id(stream)?;
        let parent = self.stream_head(stream)?;

        let txn = self.transaction()?;
        txn.conn().execute(
            "INSERT INTO commits (stream_id, parent, merge_from, comment, date)
             VALUES (?1, ?2, NULL, ?3, datetime('now'))",
            params![stream_id, parent, comment],
        )?;
        let commit_id = txn.conn().last_insert_rowid();
        for (seq, file) in files.iter().enumerate() {
            txn.conn().execute(
                "INSERT INTO commit_files (commit_id, seq, path, is_delete) VALUES (?1, ?2, ?3, ?4)",
                params![commit_id, i64::try_from(seq).unwrap_or(i64::MAX), file.path, i64::from(file.is_delete)],
            )?;
        }
        txn.conn().execute(
            "UPDATE streams SET head_commit_id = ?1 WHERE id = ?2",
            params![commit_id, stream_id],
        )?;
        txn.commit()?;
        Ok(commit_id)
    }

    /// Merge `from_stream`'s head into `stream`'s head: a single commit on
    /// `stream` whose `parent` is `stream`'s current head and whose
    /// `merge_from` is `from_stream`'s current head.
    #[instrument(skip(self, files))]
    pub fn merge(
        &mut self,
        stream: &str,
        from_stream: &str,
        comment: &str,
        files: &[FileChange],
    ) -> Result<CommitId> {
        let stream_id = self.stream_id(stream)?;
        let parent = self.stream_head(stream)?;
        let merge_from = self.stream_head(from_stream)?;

        let txn = self.transaction()?;
        txn.conn().execute(
            "INSERT INTO commits (stream_id, parent, merge_from, comment, date)
             VALUES (?1, ?2, ?3, ?4, datetime('now'))",
            params![stream_id, parent, merge_from, comment],
        )?;
        let commit_id = txn.conn().last_insert_rowid();
        for (seq, file) in files.iter().enumerate() {
            txn.conn().execute(
                "INSERT INTO commit_files (commit_id, seq, path, is_delete) VALUES (?1, ?2, ?3, ?4)",
                params![commit_id, i64::try_from(seq).unwrap_or(i64::MAX), file.path, i64::from(file.is_delete)],
            )?;
        }
        txn.conn().execute(
            "UPDATE streams SET head_commit_id = ?1 WHERE id = ?2",
            params![commit_id, stream_id],
        )?;
        txn.commit()?;
        Ok(commit_id)
    }
}
