//! Game entities
//!
//! Each module defines one persisted entity, its column schema, its filter
//! and a repository alias. Identity and lifecycle columns come from
//! [`crate::metadata`]; only the domain columns are declared here.

pub mod game;
pub mod game_log;
pub mod player;
pub mod property;
pub mod trade_request;

pub use game::{game_key, Game, GameFilter, GameRepository, GameStatus};
pub use game_log::{game_log_key, GameLog, GameLogFilter, GameLogRepository};
pub use player::{player_key, Player, PlayerFilter, PlayerRepository, STARTING_BALANCE};
pub use property::{
    property_key, Ownership, Property, PropertyFilter, PropertyRepository, RentTable,
};
pub use trade_request::{
    read_list_involving, trade_request_key, InvolvingPage, TradeRequest, TradeRequestFilter,
    TradeRequestRepository, TradeStatus,
};

use uuid::Uuid;

use crate::error::DatabaseError;
use crate::metadata::CompositeKey;
use crate::repository::ID;

/// Key of a single-column entity
pub(crate) fn id_key(id: Uuid) -> CompositeKey {
    CompositeKey::single(ID, id)
}

/// Reads the `id` column of a key, or the nil identifier for an unsaved entity
pub(crate) fn key_id(key: &CompositeKey) -> Uuid {
    key.get(ID).unwrap_or_default()
}

/// Error for a text column holding a value outside its enumeration
pub(crate) fn invalid_value(column: &str, value: &str) -> DatabaseError {
    DatabaseError::InvalidValue {
        column: column.to_string(),
        value: value.to_string(),
    }
}
