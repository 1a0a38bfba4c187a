//! Table definitions, grounded in the original `kitman.cpp` schema:
//! `streams`, `commits`, `commit_files`, `tags`, `config`.

use rusqlite::Connection;

use crate::Result;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS streams (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    head_commit_id INTEGER,
    parent_stream_id INTEGER REFERENCES streams(id)
);

CREATE TABLE IF NOT EXISTS commits (
    id INTEGER PRIMARY KEY,
    stream_id INTEGER NOT NULL REFERENCES streams(id),
    parent INTEGER REFERENCES commits(id),
    merge_from INTEGER REFERENCES commits(id),
    comment TEXT NOT NULL DEFAULT '',
    date TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS commit_files (
    commit_id INTEGER NOT NULL REFERENCES commits(id),
    seq INTEGER NOT NULL,
    path TEXT NOT NULL,
    is_delete INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (commit_id, seq)
);

CREATE TABLE IF NOT EXISTS tags (
    name TEXT PRIMARY KEY,
    commit_id INTEGER NOT NULL REFERENCES commits(id)
);

CREATE TABLE IF NOT EXISTS config (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// Create the schema if it isn't already present. Idempotent.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
