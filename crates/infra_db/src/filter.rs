//! Filter predicates
//!
//! A filter lists `(column, operator, value)` conditions for the fields the
//! caller set; [`Query`] ANDs them together. Stores translate a `Query` into
//! SQL (`PgStore`) or evaluate it directly against rows (`MemoryStore`).
//!
//! Only conjunction is supported. A disjunction is run as separate queries
//! whose results are combined with [`crate::repository::merge_unique`].

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::columns::{ColumnMap, Value};

/// Comparison applied by a [`Condition`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    /// `column = value`
    Eq,
    /// `column = ANY(value)`; the value is an identifier list
    In,
    /// `column >= value`
    Gte,
    /// `column <= value`
    Lte,
    /// `column IS NULL`; the value is ignored
    IsNull,
}

impl Operator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::In => "= ANY",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::IsNull => "IS NULL",
        }
    }
}

/// A single predicate over one column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub column: String,
    pub operator: Operator,
    pub value: Value,
}

impl Condition {
    pub fn new(column: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, Operator::Eq, value)
    }

    pub fn in_list(column: impl Into<String>, ids: Vec<Uuid>) -> Self {
        Self::new(column, Operator::In, Value::UuidArray(ids))
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, Operator::Gte, value)
    }

    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, Operator::Lte, value)
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::new(column, Operator::IsNull, Value::Null)
    }

    /// Evaluates the condition against a row
    ///
    /// Follows SQL semantics: comparisons involving NULL, or a column the
    /// row does not have, are false.
    pub fn matches(&self, row: &ColumnMap) -> bool {
        let actual = row.get(&self.column).unwrap_or(&Value::Null);
        match self.operator {
            Operator::IsNull => actual.is_null(),
            Operator::Eq => actual.compare(&self.value).is_some_and(|o| o.is_eq()),
            Operator::Gte => actual.compare(&self.value).is_some_and(|o| o.is_ge()),
            Operator::Lte => actual.compare(&self.value).is_some_and(|o| o.is_le()),
            Operator::In => match (actual, &self.value) {
                (Value::Uuid(id), Value::UuidArray(ids)) => ids.contains(id),
                _ => false,
            },
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operator {
            Operator::IsNull => write!(f, "{} IS NULL", self.column),
            Operator::In => write!(f, "{} = ANY({})", self.column, self.value),
            op => write!(f, "{} {} {}", self.column, op.as_sql(), self.value),
        }
    }
}

/// A conjunction of conditions
///
/// Equality ignores the order in which conditions were added.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Query {
    conditions: Vec<Condition>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// ANDs a condition onto the query
    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Adds `column = value` when the value is set
    pub fn eq_opt<T: Into<Value>>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.and(Condition::eq(column, v)),
            None => self,
        }
    }

    /// Adds `column = ANY(ids)` when a list is given
    ///
    /// An empty list is kept as a condition and matches no row.
    pub fn in_list(self, column: &str, ids: Option<&[Uuid]>) -> Self {
        match ids {
            Some(ids) => self.and(Condition::in_list(column, ids.to_vec())),
            None => self,
        }
    }

    pub fn gte_opt<T: Into<Value>>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.and(Condition::gte(column, v)),
            None => self,
        }
    }

    pub fn lte_opt<T: Into<Value>>(self, column: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.and(Condition::lte(column, v)),
            None => self,
        }
    }

    pub fn is_null(self, column: &str) -> Self {
        self.and(Condition::is_null(column))
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn into_conditions(self) -> Vec<Condition> {
        self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// True when every condition holds for the row
    pub fn matches(&self, row: &ColumnMap) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.conditions.len() == other.conditions.len()
            && self.conditions.iter().all(|c| other.conditions.contains(c))
            && other.conditions.iter().all(|c| self.conditions.contains(c))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conditions.is_empty() {
            return write!(f, "TRUE");
        }
        let parts: Vec<String> = self.conditions.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(" AND "))
    }
}

/// Per-entity filter
///
/// Implementors list a condition for each field the caller set. The
/// repository folds them into a query and adds the soft-delete condition
/// itself, so filters never mention `deleted_at`.
pub trait Filter: Send + Sync + fmt::Debug {
    /// Conditions contributed by the set fields
    fn conditions(&self) -> Vec<Condition>;

    /// ANDs this filter's conditions onto `query`
    fn filter(&self, query: Query) -> Query {
        self.conditions().into_iter().fold(query, Query::and)
    }
}
