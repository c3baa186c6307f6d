//! Scoped SQLite transactions.

use crate::store::StoreResult;
use rusqlite::{Connection, Params};

/// An open `BEGIN ... COMMIT` block on a borrowed connection.
///
/// Dropping it without [`Transaction::commit`] rolls back whatever is still
/// pending. SQLite can end a transaction on its own (a trigger raising
/// `ROLLBACK`, a full disk); [`Transaction::is_active`] reports that.
pub struct Transaction<'a> {
    conn: &'a Connection,
    committed: bool,
}

impl<'a> Transaction<'a> {
    pub(crate) fn begin(conn: &'a Connection) -> rusqlite::Result<Self> {
        conn.execute_batch("BEGIN")?;
        Ok(Self {
            conn,
            committed: false,
        })
    }

    pub(crate) fn conn(&self) -> &Connection {
        self.conn
    }

    /// Returns false once SQLite has rolled the transaction back by itself.
    pub fn is_active(&self) -> bool {
        !self.conn.is_autocommit()
    }

    pub fn execute(&self, sql: &str, params: impl Params) -> StoreResult<usize> {
        Ok(self.conn.execute(sql, params)?)
    }

    /// Commits the transaction. Migration steps map the raw error themselves.
    pub fn commit(mut self) -> rusqlite::Result<()> {
        self.conn.execute_batch("COMMIT")?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed && self.is_active() {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!(error = %e, "rollback failed");
            }
        }
    }
}
