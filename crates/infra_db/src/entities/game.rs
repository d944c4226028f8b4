//! Games

use std::fmt;

use core_kernel::{GameId, PlayerId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{id_key, invalid_value, key_id};
use crate::columns::{ColumnDef, ColumnKind, ColumnMap};
use crate::error::DatabaseError;
use crate::filter::{Condition, Filter, Query};
use crate::metadata::{CompositeKey, SoftDeleteMetadata};
use crate::repository::{Entity, EntityRepository, ID};
use crate::store::PgStore;

const NAME: &str = "name";
const STATUS: &str = "status";
const CURRENT_PLAYER_ID: &str = "current_player_id";
const WINNER_ID: &str = "winner_id";

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::required(NAME, ColumnKind::Text),
    ColumnDef::required(STATUS, ColumnKind::Text),
    ColumnDef::nullable(CURRENT_PLAYER_ID, ColumnKind::Uuid),
    ColumnDef::nullable(WINNER_ID, ColumnKind::Uuid),
];

/// Lifecycle stage of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    #[default]
    Waiting,
    InProgress,
    Finished,
}

impl GameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Waiting => "waiting",
            GameStatus::InProgress => "in_progress",
            GameStatus::Finished => "finished",
        }
    }

    fn parse(value: &str) -> Result<Self, DatabaseError> {
        match value {
            "waiting" => Ok(GameStatus::Waiting),
            "in_progress" => Ok(GameStatus::InProgress),
            "finished" => Ok(GameStatus::Finished),
            other => Err(invalid_value(STATUS, other)),
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A game session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Game {
    pub key: CompositeKey,
    pub metadata: SoftDeleteMetadata,
    pub name: String,
    pub status: GameStatus,
    pub current_player_id: Option<PlayerId>,
    pub winner_id: Option<PlayerId>,
}

impl Game {
    /// A new game waiting for players
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            key: CompositeKey::default(),
            metadata: SoftDeleteMetadata::default(),
            name: name.into(),
            status: GameStatus::Waiting,
            current_player_id: None,
            winner_id: None,
        }
    }

    pub fn id(&self) -> GameId {
        GameId::from_uuid(key_id(&self.key))
    }

    /// Attaches the key returned by `create`
    pub fn with_key(mut self, key: CompositeKey) -> Self {
        self.key = key;
        self
    }
}

impl Entity for Game {
    const TABLE: &'static str = "games";
    const NAME: &'static str = "game";

    fn columns() -> &'static [ColumnDef] {
        COLUMNS
    }

    fn key(&self) -> &CompositeKey {
        &self.key
    }

    fn metadata(&self) -> &SoftDeleteMetadata {
        &self.metadata
    }

    fn domain_columns(&self) -> ColumnMap {
        ColumnMap::new()
            .with(NAME, self.name.as_str())
            .with(STATUS, self.status.as_str())
            .with(CURRENT_PLAYER_ID, self.current_player_id.map(Uuid::from))
            .with(WINNER_ID, self.winner_id.map(Uuid::from))
    }

    fn from_parts(
        key: CompositeKey,
        metadata: SoftDeleteMetadata,
        columns: &ColumnMap,
    ) -> Result<Self, DatabaseError> {
        Ok(Self {
            key,
            metadata,
            name: columns.text(NAME)?,
            status: GameStatus::parse(&columns.text(STATUS)?)?,
            current_player_id: columns.opt_uuid(CURRENT_PLAYER_ID)?.map(PlayerId::from_uuid),
            winner_id: columns.opt_uuid(WINNER_ID)?.map(PlayerId::from_uuid),
        })
    }
}

/// Game listing filter; unset fields do not constrain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameFilter {
    pub ids: Option<Vec<Uuid>>,
    pub name: Option<String>,
    pub status: Option<GameStatus>,
    pub current_player_id: Option<PlayerId>,
    pub winner_id: Option<PlayerId>,
}

impl Filter for GameFilter {
    fn conditions(&self) -> Vec<Condition> {
        Query::new()
            .in_list(ID, self.ids.as_deref())
            .eq_opt(NAME, self.name.clone())
            .eq_opt(STATUS, self.status.map(GameStatus::as_str))
            .eq_opt(CURRENT_PLAYER_ID, self.current_player_id.map(Uuid::from))
            .eq_opt(WINNER_ID, self.winner_id.map(Uuid::from))
            .into_conditions()
    }
}

/// Repository of games
pub type GameRepository<S = PgStore> = EntityRepository<Game, GameFilter, S>;

/// Key of an existing game
pub fn game_key(id: GameId) -> CompositeKey {
    id_key(id.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::Value;

    #[test]
    fn test_round_trip() {
        let mut game = Game::new("Friday").with_key(game_key(GameId::new()));
        game.status = GameStatus::InProgress;
        game.current_player_id = Some(PlayerId::new());

        let restored = Game::from_columns(&game.to_columns()).unwrap();
        assert_eq!(restored, game);
    }

    #[test]
    fn test_unknown_status_rejected() {
        let game = Game::new("Friday").with_key(game_key(GameId::new()));
        let columns = game.to_columns().with(STATUS, "paused");
        assert!(matches!(
            Game::from_columns(&columns),
            Err(DatabaseError::InvalidValue { column, value }) if column == "status" && value == "paused"
        ));
    }

    #[test]
    fn test_winner_type_mismatch() {
        let game = Game::new("Friday").with_key(game_key(GameId::new()));
        let columns = game.to_columns().with(WINNER_ID, Value::BigInt(7));
        assert!(Game::from_columns(&columns).unwrap_err().is_type_mismatch());
    }

    #[test]
    fn test_filter_conditions() {
        assert!(GameFilter::default().conditions().is_empty());

        let filter = GameFilter {
            status: Some(GameStatus::Finished),
            ..Default::default()
        };
        assert_eq!(
            filter.conditions(),
            vec![Condition::eq("status", "finished")]
        );
    }
}
