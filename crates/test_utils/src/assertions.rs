//! Custom Test Assertions
//!
//! Provides assertion helpers for repository results that give more
//! meaningful failure messages than matching on errors by hand.

use std::fmt::Debug;

use infra_db::{CompositeKey, DatabaseError, Entity};

/// Asserts that an operation failed with `NotFound`
///
/// # Panics
///
/// Panics if the result is `Ok` or carries any other error
pub fn assert_not_found<T: Debug>(result: Result<T, DatabaseError>) {
    match result {
        Err(DatabaseError::NotFound(_)) => {}
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

/// Asserts that a read failed the column type checks
pub fn assert_type_mismatch<T: Debug>(result: Result<T, DatabaseError>) {
    match result {
        Err(err) if err.is_type_mismatch() => {}
        other => panic!("Expected TypeMismatch or MissingColumn, got {:?}", other),
    }
}

/// Asserts that a page holds exactly the given keys, in order
pub fn assert_keys<E: Entity>(items: &[E], expected: &[CompositeKey]) {
    let actual: Vec<&CompositeKey> = items.iter().map(Entity::key).collect();
    let expected: Vec<&CompositeKey> = expected.iter().collect();
    assert_eq!(
        actual, expected,
        "Page keys differ: actual={:?}, expected={:?}",
        actual, expected
    );
}

/// Asserts that a list of entities contains no key twice
pub fn assert_unique_keys<E: Entity>(items: &[E]) {
    let mut keys: Vec<&CompositeKey> = items.iter().map(Entity::key).collect();
    let total = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), total, "Duplicate keys in {:?}", items);
}
