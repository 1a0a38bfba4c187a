//! A scoped transaction wrapper. The original collaborator used a C++
//! destructor to commit on normal scope exit and roll back on stack
//! unwinding; `rusqlite::Transaction` already gives us that via `Drop`, so
//! this wraps it rather than reinventing it.

use rusqlite::Connection;

use crate::Result;

/// A transaction that rolls back on drop unless [`Self::commit`] is called.
pub struct ScopedTransaction<'conn> {
    inner: rusqlite::Transaction<'conn>,
}

impl<'conn> ScopedTransaction<'conn> {
    pub(crate) fn new(conn: &'conn mut Connection) -> Result<Self> {
        Ok(Self {
            inner: conn.transaction()?,
        })
    }

    /// The underlying connection, for issuing statements within the scope.
    pub fn conn(&self) -> &Connection {
        &self.inner
    }

    /// Commit the transaction. Consumes `self`; dropping without calling
    /// this rolls back.
    pub fn commit(self) -> Result<()> {
        self.inner.commit()?;
        Ok(())
    }
}
