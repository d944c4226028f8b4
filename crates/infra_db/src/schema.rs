//! Schema bootstrap
//!
//! The initial schema is embedded at compile time and applied as a single
//! script. Every statement is idempotent, so applying it to an already
//! initialised database is a no-op.

use sqlx::PgPool;
use tracing::info;

use crate::error::DatabaseError;

/// Tables created by [`INITIAL_SCHEMA`], in dependency order
pub const TABLES: &[&str] = &["games", "players", "properties", "trade_requests", "game_logs"];

/// The initial schema script
pub const INITIAL_SCHEMA: &str =
    include_str!("../../../migrations/20240101_000001_initial_schema.sql");

/// Applies the initial schema
///
/// # Errors
///
/// Returns `DatabaseError::MigrationFailed` if any statement fails.
pub async fn apply_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    info!(tables = TABLES.len(), "Applying schema");
    sqlx::raw_sql(INITIAL_SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
    info!("Schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creates_every_table() {
        for table in TABLES {
            assert!(
                INITIAL_SCHEMA.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table)),
                "missing table {}",
                table
            );
        }
    }

    #[test]
    fn test_schema_indexes_live_rows() {
        let partial = INITIAL_SCHEMA.matches("(created_at, id) WHERE deleted_at IS NULL").count();
        assert_eq!(partial, TABLES.len());
    }
}
