//! Composite keys and soft-delete metadata
//!
//! Every persisted entity carries a [`CompositeKey`] (its identity) and a
//! [`SoftDeleteMetadata`] block (its lifecycle timestamps). Both are
//! serialized into the same [`ColumnMap`] as the entity's domain columns.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use core_kernel::base62;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::columns::{ColumnDef, ColumnKind, ColumnMap};
use crate::error::DatabaseError;
use crate::filter::{Condition, Query};

/// Column holding the creation timestamp
pub const CREATED_AT: &str = "created_at";
/// Column holding the last update timestamp
pub const UPDATED_AT: &str = "updated_at";
/// Column holding the soft-delete timestamp; NULL for live rows
pub const DELETED_AT: &str = "deleted_at";

/// Schema of the metadata columns shared by every table
pub const METADATA_COLUMNS: &[ColumnDef] = &[
    ColumnDef::required(CREATED_AT, ColumnKind::Timestamp),
    ColumnDef::required(UPDATED_AT, ColumnKind::Timestamp),
    ColumnDef::nullable(DELETED_AT, ColumnKind::Timestamp),
];

/// Identity of a persisted entity
///
/// An ordered mapping from key column name to identifier. Single-column
/// keys are the common case; the map form allows multi-column identities.
/// There is no way to change a value once the key is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeKey(BTreeMap<String, Uuid>);

impl CompositeKey {
    /// Creates a key over a single column
    pub fn single(column: impl Into<String>, id: Uuid) -> Self {
        let mut map = BTreeMap::new();
        map.insert(column.into(), id);
        Self(map)
    }

    /// Creates a key from column/identifier pairs
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Uuid)>,
        K: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Generates a fresh random identifier for every key column
    pub fn generate(key_columns: &[&str]) -> Self {
        Self::from_pairs(key_columns.iter().map(|column| (*column, Uuid::new_v4())))
    }

    /// Builds a single-column key from the compact base62 form
    pub fn from_base62(column: impl Into<String>, encoded: &str) -> Result<Self, DatabaseError> {
        Ok(Self::single(column, base62::decode(encoded)?))
    }

    pub fn get(&self, column: &str) -> Option<Uuid> {
        self.0.get(column).copied()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks that the key names exactly the given columns
    pub fn validate(&self, key_columns: &[&str]) -> Result<(), DatabaseError> {
        let matches = self.0.len() == key_columns.len()
            && key_columns.iter().all(|column| self.0.contains_key(*column));
        if matches {
            Ok(())
        } else {
            Err(DatabaseError::InvalidKey(format!(
                "expected columns {:?}, got {}",
                key_columns, self
            )))
        }
    }

    pub fn to_columns(&self) -> ColumnMap {
        let mut map = ColumnMap::new();
        for (column, id) in &self.0 {
            map.insert(column.clone(), *id);
        }
        map
    }

    /// Reads the key columns out of a row
    pub fn from_columns(key_columns: &[&str], columns: &ColumnMap) -> Result<Self, DatabaseError> {
        let mut map = BTreeMap::new();
        for column in key_columns {
            map.insert((*column).to_string(), columns.uuid(column)?);
        }
        Ok(Self(map))
    }

    /// Equality conditions selecting exactly this key
    pub fn to_query(&self) -> Query {
        self.0
            .iter()
            .fold(Query::new(), |query, (column, id)| {
                query.and(Condition::eq(column.clone(), *id))
            })
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(column, id)| format!("{}={}", column, id))
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Lifecycle timestamps of a persisted entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftDeleteMetadata {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SoftDeleteMetadata {
    /// Metadata for a row created at `now`
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn to_columns(&self) -> ColumnMap {
        ColumnMap::new()
            .with(CREATED_AT, self.created_at)
            .with(UPDATED_AT, self.updated_at)
            .with(DELETED_AT, self.deleted_at)
    }

    pub fn from_columns(columns: &ColumnMap) -> Result<Self, DatabaseError> {
        Ok(Self {
            created_at: columns.timestamp(CREATED_AT)?,
            updated_at: columns.timestamp(UPDATED_AT)?,
            deleted_at: columns.opt_timestamp(DELETED_AT)?,
        })
    }
}

impl Default for SoftDeleteMetadata {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

/// Source of the timestamps written by the repository
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock truncated to the microsecond precision of `timestamptz`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::Value;
    use chrono::Timelike;

    #[test]
    fn test_generate_uses_fresh_identifiers() {
        let a = CompositeKey::generate(&["id"]);
        let b = CompositeKey::generate(&["id"]);
        assert_ne!(a, b);
        assert!(a.get("id").is_some());
    }

    #[test]
    fn test_validate_requires_exact_columns() {
        let key = CompositeKey::single("id", Uuid::new_v4());
        assert!(key.validate(&["id"]).is_ok());
        assert!(matches!(
            key.validate(&["game_id", "id"]),
            Err(DatabaseError::InvalidKey(_))
        ));
        assert!(CompositeKey::default().validate(&["id"]).is_err());
    }

    #[test]
    fn test_key_column_round_trip() {
        let key = CompositeKey::from_pairs([("game_id", Uuid::new_v4()), ("id", Uuid::new_v4())]);
        let columns = key.to_columns();
        let restored = CompositeKey::from_columns(&["game_id", "id"], &columns).unwrap();
        assert_eq!(key, restored);
    }

    #[test]
    fn test_to_query_has_one_condition_per_column() {
        let key = CompositeKey::from_pairs([("a", Uuid::new_v4()), ("b", Uuid::new_v4())]);
        assert_eq!(key.to_query().conditions().len(), 2);
    }

    #[test]
    fn test_from_base62() {
        let id = Uuid::new_v4();
        let key = CompositeKey::from_base62("id", &base62::encode(id)).unwrap();
        assert_eq!(key.get("id"), Some(id));
        assert!(matches!(
            CompositeKey::from_base62("id", ""),
            Err(DatabaseError::Codec(_))
        ));
    }

    #[test]
    fn test_metadata_round_trip_with_null_deleted_at() {
        let metadata = SoftDeleteMetadata::new(SystemClock.now());
        let columns = metadata.to_columns();
        assert_eq!(columns.get(DELETED_AT), Some(&Value::Null));
        assert_eq!(SoftDeleteMetadata::from_columns(&columns).unwrap(), metadata);
        assert!(!metadata.is_deleted());
    }

    #[test]
    fn test_system_clock_is_microsecond_precision() {
        let now = SystemClock.now();
        assert_eq!(now.nanosecond() % 1_000, 0);
    }
}
