//! Database error types
//!
//! This module defines the error types that can occur during data-access
//! operations, from store failures to round-trip mapping and page token
//! problems.

use std::time::Duration;

use core_kernel::CodecError;
use thiserror::Error;

/// Errors that can occur during database operations
///
/// Every failure is returned to the caller as-is; the repository layer never
/// retries or recovers internally.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// No live row matched the key
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// A stored column does not have the type the entity expects
    #[error("Type mismatch on column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        found: String,
    },

    /// A column required by the entity schema is absent from the row
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// A column decoded with the right type but holds an unknown value
    #[error("Invalid value '{value}' for column '{column}'")]
    InvalidValue { column: String, value: String },

    /// A page token could not be decoded
    #[error("Invalid page token: {0}")]
    TokenDecode(String),

    /// An identifier could not be decoded
    #[error("Identifier codec error: {0}")]
    Codec(#[from] CodecError),

    /// Pagination parameters were rejected
    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    /// A composite key does not match the entity's key columns
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The statement did not finish within the configured timeout
    #[error("Statement timed out after {0:?}")]
    Timeout(Duration),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Schema bootstrap failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Generic SQL error
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Creates a not found error for a specific entity type and identifier
    ///
    /// # Example
    ///
    /// ```rust
    /// use infra_db::DatabaseError;
    ///
    /// let error = DatabaseError::not_found("player", "id=42");
    /// assert!(error.to_string().contains("player"));
    /// ```
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} with {} not found", entity, id))
    }

    /// Creates a type mismatch error for a column
    pub fn type_mismatch(
        column: impl Into<String>,
        expected: &'static str,
        found: impl Into<String>,
    ) -> Self {
        DatabaseError::TypeMismatch {
            column: column.into(),
            expected,
            found: found.into(),
        }
    }

    /// Creates a duplicate entry error
    pub fn duplicate(entity: &str, field: &str, value: impl std::fmt::Display) -> Self {
        DatabaseError::DuplicateEntry(format!(
            "{} with {} '{}' already exists",
            entity, field, value
        ))
    }

    /// Checks if this error indicates a record was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }

    /// Checks if this error comes from the read-side type checks
    pub fn is_type_mismatch(&self) -> bool {
        matches!(
            self,
            DatabaseError::TypeMismatch { .. } | DatabaseError::MissingColumn(_)
        )
    }

    /// Checks if this error is a constraint violation
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::DuplicateEntry(_)
                | DatabaseError::ForeignKeyViolation(_)
                | DatabaseError::ConstraintViolation(_)
        )
    }

    /// Checks if this error is a connection-related issue
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted
        )
    }
}

/// Converts SQLx errors to more specific DatabaseError variants
///
/// The mapping is driven by the PostgreSQL error code.
impl From<&sqlx::Error> for DatabaseError {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => {
                DatabaseError::NotFound("Record not found".to_string())
            }
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::ColumnNotFound(column) => DatabaseError::MissingColumn(column.clone()),
            sqlx::Error::Database(db_err) => {
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => DatabaseError::DuplicateEntry(db_err.message().to_string()),
                        "23503" => {
                            DatabaseError::ForeignKeyViolation(db_err.message().to_string())
                        }
                        "23514" => {
                            DatabaseError::ConstraintViolation(db_err.message().to_string())
                        }
                        _ => DatabaseError::QueryFailed(db_err.message().to_string()),
                    }
                } else {
                    DatabaseError::QueryFailed(db_err.message().to_string())
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}
