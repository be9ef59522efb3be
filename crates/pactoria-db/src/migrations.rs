//! Database migration runner.
//!
//! Embeds the SQL migration files at compile time and executes them on
//! database open. All statements are idempotent (`IF NOT EXISTS`,
//! `INSERT OR IGNORE`) so they re-run safely.

use crate::PactoriaDb;
use crate::error::DatabaseError;

/// Initial schema: 11 tables, 3 FTS5 virtual tables, and their sync triggers.
const MIGRATION_001: &str = include_str!("../migrations/001_initial.sql");
/// System templates visible to every company.
const MIGRATION_002: &str = include_str!("../migrations/002_system_templates.sql");

impl PactoriaDb {
    /// Run all embedded migrations in sequence.
    pub(crate) async fn run_migrations(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(MIGRATION_001)
            .await
            .map_err(|e| DatabaseError::Migration(format!("001_initial: {e}")))?;
        self.conn
            .execute_batch(MIGRATION_002)
            .await
            .map_err(|e| DatabaseError::Migration(format!("002_system_templates: {e}")))?;
        Ok(())
    }
}
