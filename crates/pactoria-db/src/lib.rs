//! # pactoria-db
//!
//! libSQL persistence for Pactoria.
//!
//! Handles all relational state: companies, users, contracts and their
//! versions, templates, clauses, invitations, notifications, wizard
//! sessions, integration connections, and the audit trail. Full-text search
//! uses the FTS5 tables created by the migrations; no ranking or indexing
//! lives outside the database.
//!
//! Uses the `libsql` crate (C `SQLite` fork, v0.9.29) which ships FTS5.

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
pub mod updates;

#[cfg(test)]
mod test_support;

use error::DatabaseError;
use libsql::Builder;
use tokio::sync::{Mutex, MutexGuard};

/// Central database handle.
///
/// Wraps a libSQL database and a single shared connection. Every write holds
/// [`PactoriaDb::write_lock`] for its whole transaction, so no other write
/// can land inside it and be lost on rollback.
pub struct PactoriaDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    tx_lock: Mutex<()>,
}

impl PactoriaDb {
    /// Open a local database at the given path (`:memory:` for tests).
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let pactoria_db = Self {
            db,
            conn,
            tx_lock: Mutex::new(()),
        };
        pactoria_db.run_migrations().await?;
        tracing::debug!(path, "database opened");
        Ok(pactoria_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Serialize writes on the shared connection.
    pub async fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.tx_lock.lock().await
    }

    /// Generate a prefixed ID via libSQL. Returns e.g., `"ctr-a3f8b2c1"`.
    ///
    /// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the prefix.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob(4)))"),
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<String>(0)?)
    }

    /// Cheap liveness probe for health checks.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the connection cannot run a query.
    pub async fn ping(&self) -> Result<(), DatabaseError> {
        let mut rows = self.conn.query("SELECT 1", ()).await?;
        rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(())
    }
}
