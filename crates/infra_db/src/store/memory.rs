//! In-memory store
//!
//! Tables are vectors of column maps behind a single lock. Conditions are
//! evaluated with [`crate::filter::Condition::matches`], which follows the
//! same NULL semantics PostgreSQL applies, so listings, filters and row
//! counts agree with [`super::PgStore`] for rows both stores accept.
//!
//! The only constraint enforced is key uniqueness. Foreign keys and `CHECK`
//! constraints from the migration are not: a player whose game does not
//! exist is stored here and rejected by PostgreSQL.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use super::{InsertStatement, OrderBy, SelectStatement, Store};
use crate::columns::{ColumnMap, Value};
use crate::error::DatabaseError;
use crate::filter::Query;

/// Store keeping every table in process memory
///
/// Cloning yields a handle to the same tables. Inserts are checked for
/// duplicate keys only; references between tables are never verified.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, Vec<ColumnMap>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored row of a table, soft-deleted ones included
    pub fn rows(&self, table: &str) -> Vec<ColumnMap> {
        self.tables.read().get(table).cloned().unwrap_or_default()
    }

    /// Stores a row as-is, bypassing key and schema checks
    pub fn insert_raw(&self, table: &str, row: ColumnMap) {
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    /// Drops every row of every table
    pub fn clear(&self) {
        self.tables.write().clear();
    }
}

fn same_key(a: &ColumnMap, b: &ColumnMap, key_columns: &[&str]) -> bool {
    key_columns.iter().all(|column| match (a.get(column), b.get(column)) {
        (Some(x), Some(y)) => x == y && !x.is_null(),
        _ => false,
    })
}

fn compare_rows(a: &ColumnMap, b: &ColumnMap, order_by: &[OrderBy]) -> Ordering {
    for order in order_by {
        let left = a.get(order.column).unwrap_or(&Value::Null);
        let right = b.get(order.column).unwrap_or(&Value::Null);
        // PostgreSQL sorts NULL after every value in ascending order
        let ordering = match (left.is_null(), right.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => left.compare(right).unwrap_or(Ordering::Equal),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert(&self, statement: InsertStatement<'_>) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write();
        let rows = tables.entry(statement.table.to_string()).or_default();
        if rows
            .iter()
            .any(|row| same_key(row, statement.row, statement.key_columns))
        {
            return Err(DatabaseError::duplicate(
                statement.table,
                &statement.key_columns.join(","),
                statement
                    .key_columns
                    .iter()
                    .filter_map(|c| statement.row.get(c).map(ToString::to_string))
                    .collect::<Vec<_>>()
                    .join(","),
            ));
        }
        rows.push(statement.row.clone());
        debug!(table = statement.table, rows = rows.len(), "insert");
        Ok(())
    }

    async fn select(&self, statement: &SelectStatement) -> Result<Vec<ColumnMap>, DatabaseError> {
        let tables = self.tables.read();
        let mut matched: Vec<&ColumnMap> = tables
            .get(statement.table)
            .map(|rows| rows.iter().filter(|row| statement.query.matches(row)).collect())
            .unwrap_or_default();
        matched.sort_by(|a, b| compare_rows(a, b, &statement.order_by));

        let offset = usize::try_from(statement.offset).unwrap_or(usize::MAX);
        let limit = statement
            .limit
            .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

        let schema_has_missing = |row: &ColumnMap| {
            statement
                .schema
                .iter()
                .find(|def| !row.contains(def.name))
                .map(|def| def.name)
        };

        let mut result = Vec::new();
        for row in matched.into_iter().skip(offset).take(limit) {
            if let Some(column) = schema_has_missing(row) {
                return Err(DatabaseError::MissingColumn(column.to_string()));
            }
            result.push(row.project(&statement.schema));
        }
        debug!(table = statement.table, returned = result.len(), "select");
        Ok(result)
    }

    async fn update(
        &self,
        table: &'static str,
        query: &Query,
        values: &ColumnMap,
    ) -> Result<u64, DatabaseError> {
        if values.is_empty() {
            return Err(DatabaseError::QueryFailed(format!(
                "update of {} sets no columns",
                table
            )));
        }

        let mut tables = self.tables.write();
        let mut affected = 0u64;
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| query.matches(row)) {
                for (column, value) in values.iter() {
                    row.insert(column.clone(), value.clone());
                }
                affected += 1;
            }
        }
        debug!(table, affected, "update");
        Ok(affected)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
