//! Strongly-typed identifiers for game entities
//!
//! Using newtype wrappers around UUIDs provides type safety and prevents
//! accidental mixing of different identifier types. Every identifier can be
//! shown publicly either in canonical hyphenated form or in the compact
//! base62 form produced by [`crate::base62`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::base62;
use crate::error::CoreError;

/// Resolves a public identifier in either accepted form
///
/// The canonical hyphenated UUID form is tried first; if it does not parse,
/// the input is decoded as base62.
///
/// # Errors
///
/// Returns `CoreError::InvalidIdentifier` when neither form matches.
pub fn resolve_public_id(input: &str) -> Result<Uuid, CoreError> {
    if let Ok(id) = Uuid::parse_str(input) {
        return Ok(id);
    }

    base62::decode(input).map_err(|err| {
        CoreError::invalid_identifier(format!("'{}' is neither a UUID nor base62 ({})", input, err))
    })
}

macro_rules! define_id {
    ($name:ident, $entity:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the entity name used in messages
            pub fn entity() -> &'static str {
                $entity
            }

            /// Returns the compact base62 form
            pub fn to_base62(&self) -> String {
                base62::encode(self.0)
            }

            /// Parses the compact base62 form
            pub fn from_base62(s: &str) -> Result<Self, CoreError> {
                Ok(Self(base62::decode(s)?))
            }

            /// Parses either the canonical or the base62 form
            pub fn parse_public(s: &str) -> Result<Self, CoreError> {
                resolve_public_id(s).map(Self)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse_public(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

define_id!(GameId, "game");
define_id!(PlayerId, "player");
define_id!(PropertyId, "property");
define_id!(TradeRequestId, "trade request");
define_id!(GameLogId, "game log");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_canonical() {
        let id = GameId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
    }

    #[test]
    fn test_parse_both_forms() {
        let original = PlayerId::new();
        let canonical: PlayerId = original.to_string().parse().unwrap();
        let compact: PlayerId = original.to_base62().parse().unwrap();
        assert_eq!(original, canonical);
        assert_eq!(original, compact);
    }

    #[test]
    fn test_uuid_conversion() {
        let uuid = Uuid::new_v4();
        let game_id = GameId::from(uuid);
        let back: Uuid = game_id.into();
        assert_eq!(uuid, back);
    }
}
