//! Column model for the map-based round trip
//!
//! Entities are written as a [`ColumnMap`] (column name to [`Value`]) and
//! read back from one. Each entity declares its columns as a static
//! [`ColumnDef`] table; stores use that table to decode rows and the typed
//! getters on [`ColumnMap`] check every value against the expected kind,
//! failing with [`DatabaseError::TypeMismatch`] instead of coercing.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    Uuid,
    Text,
    BigInt,
    Bool,
    Timestamp,
    UuidArray,
}

impl ColumnKind {
    /// Returns the SQL type name, used in error messages
    pub fn name(self) -> &'static str {
        match self {
            ColumnKind::Uuid => "uuid",
            ColumnKind::Text => "text",
            ColumnKind::BigInt => "bigint",
            ColumnKind::Bool => "boolean",
            ColumnKind::Timestamp => "timestamptz",
            ColumnKind::UuidArray => "uuid[]",
        }
    }
}

/// Declaration of a single column in an entity schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
}

impl ColumnDef {
    /// Declares a NOT NULL column
    pub const fn required(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
        }
    }

    /// Declares a nullable column
    pub const fn nullable(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            nullable: true,
        }
    }

    /// Checks that a value is acceptable for this column
    pub fn accepts(&self, value: &Value) -> bool {
        match value.kind() {
            None => self.nullable,
            Some(kind) => kind == self.kind,
        }
    }
}

/// A single column value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Uuid(Uuid),
    Text(String),
    BigInt(i64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    UuidArray(Vec<Uuid>),
}

impl Value {
    /// Returns the kind of a non-null value
    pub fn kind(&self) -> Option<ColumnKind> {
        match self {
            Value::Null => None,
            Value::Uuid(_) => Some(ColumnKind::Uuid),
            Value::Text(_) => Some(ColumnKind::Text),
            Value::BigInt(_) => Some(ColumnKind::BigInt),
            Value::Bool(_) => Some(ColumnKind::Bool),
            Value::Timestamp(_) => Some(ColumnKind::Timestamp),
            Value::UuidArray(_) => Some(ColumnKind::UuidArray),
        }
    }

    /// Describes the runtime representation, used in mismatch errors
    pub fn describe(&self) -> String {
        self.kind()
            .map(|kind| kind.name().to_string())
            .unwrap_or_else(|| "null".to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Orders two values of the same kind
    ///
    /// Returns `None` for nulls and for values of different kinds, which
    /// mirrors SQL comparison semantics.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::BigInt(a), Value::BigInt(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Uuid(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "'{}'", v),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Value::UuidArray(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::BigInt(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

impl From<Vec<Uuid>> for Value {
    fn from(value: Vec<Uuid>) -> Self {
        Value::UuidArray(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// An ordered mapping from column name to value
///
/// This is the only shape that crosses the store boundary in either
/// direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ColumnMap(BTreeMap<String, Value>);

impl ColumnMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Adds a column, builder style
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(column.into(), value.into());
    }

    /// Merges another map into this one; later values win
    pub fn merge(mut self, other: ColumnMap) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.remove(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Keeps only the columns named in the schema
    pub fn project(&self, schema: &[ColumnDef]) -> ColumnMap {
        let mut projected = ColumnMap::new();
        for def in schema {
            if let Some(value) = self.0.get(def.name) {
                projected.insert(def.name, value.clone());
            }
        }
        projected
    }

    /// Checks every schema column is present with an acceptable value
    pub fn validate(&self, schema: &[ColumnDef]) -> Result<(), DatabaseError> {
        for def in schema {
            let value = self.require(def.name)?;
            if !def.accepts(value) {
                return Err(DatabaseError::type_mismatch(
                    def.name,
                    def.kind.name(),
                    value.describe(),
                ));
            }
        }
        Ok(())
    }

    fn require(&self, column: &str) -> Result<&Value, DatabaseError> {
        self.0
            .get(column)
            .ok_or_else(|| DatabaseError::MissingColumn(column.to_string()))
    }

    fn mismatch(column: &str, expected: ColumnKind, found: &Value) -> DatabaseError {
        DatabaseError::type_mismatch(column, expected.name(), found.describe())
    }

    pub fn uuid(&self, column: &str) -> Result<Uuid, DatabaseError> {
        match self.require(column)? {
            Value::Uuid(v) => Ok(*v),
            other => Err(Self::mismatch(column, ColumnKind::Uuid, other)),
        }
    }

    pub fn opt_uuid(&self, column: &str) -> Result<Option<Uuid>, DatabaseError> {
        match self.require(column)? {
            Value::Null => Ok(None),
            Value::Uuid(v) => Ok(Some(*v)),
            other => Err(Self::mismatch(column, ColumnKind::Uuid, other)),
        }
    }

    pub fn text(&self, column: &str) -> Result<String, DatabaseError> {
        match self.require(column)? {
            Value::Text(v) => Ok(v.clone()),
            other => Err(Self::mismatch(column, ColumnKind::Text, other)),
        }
    }

    pub fn big_int(&self, column: &str) -> Result<i64, DatabaseError> {
        match self.require(column)? {
            Value::BigInt(v) => Ok(*v),
            other => Err(Self::mismatch(column, ColumnKind::BigInt, other)),
        }
    }

    pub fn bool(&self, column: &str) -> Result<bool, DatabaseError> {
        match self.require(column)? {
            Value::Bool(v) => Ok(*v),
            other => Err(Self::mismatch(column, ColumnKind::Bool, other)),
        }
    }

    pub fn timestamp(&self, column: &str) -> Result<DateTime<Utc>, DatabaseError> {
        match self.require(column)? {
            Value::Timestamp(v) => Ok(*v),
            other => Err(Self::mismatch(column, ColumnKind::Timestamp, other)),
        }
    }

    pub fn opt_timestamp(&self, column: &str) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        match self.require(column)? {
            Value::Null => Ok(None),
            Value::Timestamp(v) => Ok(Some(*v)),
            other => Err(Self::mismatch(column, ColumnKind::Timestamp, other)),
        }
    }

    pub fn uuid_array(&self, column: &str) -> Result<Vec<Uuid>, DatabaseError> {
        match self.require(column)? {
            Value::UuidArray(v) => Ok(v.clone()),
            other => Err(Self::mismatch(column, ColumnKind::UuidArray, other)),
        }
    }
}
