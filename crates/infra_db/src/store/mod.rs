//! Store backends
//!
//! A [`Store`] executes column-map level statements against a table. It
//! knows nothing about entities or soft deletion; the repository builds the
//! statements and the store runs them.
//!
//! Two backends are provided:
//!
//! - [`PgStore`]: PostgreSQL through SQLx
//! - [`MemoryStore`]: in-process tables, for tests and embedding

use std::fmt;

use async_trait::async_trait;

use crate::columns::{ColumnDef, ColumnMap};
use crate::error::DatabaseError;
use crate::filter::Query;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// One ascending `ORDER BY` term; NULLs sort last
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
}

impl OrderBy {
    pub const fn asc(column: &'static str) -> Self {
        Self { column }
    }
}

/// A row to insert
#[derive(Debug, Clone)]
pub struct InsertStatement<'a> {
    pub table: &'static str,
    /// Columns forming the row's identity; used to detect duplicates
    pub key_columns: &'static [&'static str],
    pub row: &'a ColumnMap,
}

/// A filtered, ordered, windowed read
#[derive(Debug, Clone)]
pub struct SelectStatement {
    pub table: &'static str,
    /// Columns to return and how to decode them
    pub schema: Vec<ColumnDef>,
    pub query: Query,
    pub order_by: Vec<OrderBy>,
    pub offset: u64,
    pub limit: Option<u64>,
}

impl SelectStatement {
    pub fn new(table: &'static str, schema: Vec<ColumnDef>, query: Query) -> Self {
        Self {
            table,
            schema,
            query,
            order_by: Vec::new(),
            offset: 0,
            limit: None,
        }
    }

    pub fn order_by(mut self, order: &[OrderBy]) -> Self {
        self.order_by.extend_from_slice(order);
        self
    }

    pub fn window(mut self, offset: u64, limit: u64) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT FROM {} WHERE {}", self.table, self.query)?;
        if !self.order_by.is_empty() {
            let order: Vec<String> = self
                .order_by
                .iter()
                .map(|o| format!("{} ASC", o.column))
                .collect();
            write!(f, " ORDER BY {}", order.join(", "))?;
        }
        write!(f, " OFFSET {}", self.offset)?;
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        Ok(())
    }
}

/// Executes statements against a backend
#[async_trait]
pub trait Store: Send + Sync + fmt::Debug {
    /// Inserts one row
    async fn insert(&self, statement: InsertStatement<'_>) -> Result<(), DatabaseError>;

    /// Returns the rows selected by the statement, decoded per its schema
    async fn select(&self, statement: &SelectStatement) -> Result<Vec<ColumnMap>, DatabaseError>;

    /// Sets `values` on every row matching `query`
    ///
    /// # Returns
    ///
    /// The number of rows affected
    async fn update(
        &self,
        table: &'static str,
        query: &Query,
        values: &ColumnMap,
    ) -> Result<u64, DatabaseError>;

    /// Verifies the backend is reachable
    async fn health_check(&self) -> Result<(), DatabaseError>;
}
