//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! Monopoly persistence test suite.
//!
//! # Modules
//!
//! - `clock`: Deterministic clocks for repository timestamps
//! - `fixtures`: Pre-built board data and repository sets
//! - `builders`: Builder patterns for entity construction
//! - `database`: PostgreSQL test container management
//! - `assertions`: Assertion helpers for repository results
//! - `generators`: Property-based test data generators

pub mod assertions;
pub mod builders;
pub mod clock;
pub mod database;
pub mod fixtures;
pub mod generators;

pub use assertions::*;
pub use builders::*;
pub use clock::*;
pub use database::*;
pub use fixtures::*;
pub use generators::*;
