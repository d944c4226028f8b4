//! Core Kernel - Foundational types for the Monopoly persistence layer
//!
//! This crate provides the building blocks shared by the data-access layer:
//! - The base62 identifier codec
//! - Strongly-typed entity identifiers and public identifier resolution
//! - Common error types

pub mod base62;
pub mod identifiers;
pub mod error;

pub use identifiers::{resolve_public_id, GameId, GameLogId, PlayerId, PropertyId, TradeRequestId};
pub use error::{CodecError, CoreError};
