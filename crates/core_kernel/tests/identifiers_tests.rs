//! Unit tests for the Identifiers module
//!
//! Tests cover identifier creation, public parsing in both accepted forms,
//! conversion, and serialization.

use core_kernel::{resolve_public_id, CoreError, GameId, GameLogId, PlayerId, PropertyId, TradeRequestId};
use uuid::Uuid;

mod resolver_tests {
    use super::*;

    #[test]
    fn test_canonical_form_is_tried_first() {
        let id = Uuid::new_v4();
        assert_eq!(resolve_public_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_simple_uuid_form_is_canonical() {
        let id = Uuid::new_v4();
        assert_eq!(resolve_public_id(&id.simple().to_string()).unwrap(), id);
    }

    #[test]
    fn test_falls_back_to_base62() {
        let id = Uuid::new_v4();
        let compact = core_kernel::base62::encode(id);
        assert_eq!(resolve_public_id(&compact).unwrap(), id);
    }

    #[test]
    fn test_both_forms_failing_is_invalid_identifier() {
        let err = resolve_public_id("not-an-id!").unwrap_err();
        assert!(matches!(err, CoreError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_empty_input_is_invalid_identifier() {
        assert!(matches!(
            resolve_public_id(""),
            Err(CoreError::InvalidIdentifier(_))
        ));
    }
}

mod game_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = GameId::new();
        let id2 = GameId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_from_uuid() {
        let uuid = Uuid::new_v4();
        let id = GameId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }

    #[test]
    fn test_base62_roundtrip() {
        let original = GameId::new();
        let parsed = GameId::from_base62(&original.to_base62()).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_from_base62_rejects_invalid_input() {
        assert!(matches!(
            GameId::from_base62("??"),
            Err(CoreError::Codec(_))
        ));
    }

    #[test]
    fn test_json_serialization_is_transparent() {
        let id = GameId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
        let deserialized: GameId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}

mod entity_name_tests {
    use super::*;

    #[test]
    fn test_entity_names() {
        assert_eq!(GameId::entity(), "game");
        assert_eq!(PlayerId::entity(), "player");
        assert_eq!(PropertyId::entity(), "property");
        assert_eq!(TradeRequestId::entity(), "trade request");
        assert_eq!(GameLogId::entity(), "game log");
    }

    #[test]
    fn test_parse_public_accepts_compact_form() {
        let original = TradeRequestId::new();
        let parsed = TradeRequestId::parse_public(&original.to_base62()).unwrap();
        assert_eq!(original, parsed);
    }
}
