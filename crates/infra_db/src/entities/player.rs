//! Players

use core_kernel::{GameId, PlayerId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{id_key, key_id};
use crate::columns::{ColumnDef, ColumnKind, ColumnMap};
use crate::error::DatabaseError;
use crate::filter::{Condition, Filter, Query};
use crate::metadata::{CompositeKey, SoftDeleteMetadata};
use crate::repository::{Entity, EntityRepository, ID};
use crate::store::PgStore;

const GAME_ID: &str = "game_id";
const NAME: &str = "name";
const BALANCE: &str = "balance";
const POSITION: &str = "position";
const IN_JAIL: &str = "in_jail";
const JAIL_TURNS: &str = "jail_turns";
const BANKRUPT: &str = "bankrupt";

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::required(GAME_ID, ColumnKind::Uuid),
    ColumnDef::required(NAME, ColumnKind::Text),
    ColumnDef::required(BALANCE, ColumnKind::BigInt),
    ColumnDef::required(POSITION, ColumnKind::BigInt),
    ColumnDef::required(IN_JAIL, ColumnKind::Bool),
    ColumnDef::required(JAIL_TURNS, ColumnKind::BigInt),
    ColumnDef::required(BANKRUPT, ColumnKind::Bool),
];

/// Cash every player starts with
pub const STARTING_BALANCE: i64 = 1500;

/// A participant in a game
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub key: CompositeKey,
    pub metadata: SoftDeleteMetadata,
    pub game_id: GameId,
    pub name: String,
    pub balance: i64,
    /// Board square index
    pub position: i64,
    pub in_jail: bool,
    pub jail_turns: i64,
    pub bankrupt: bool,
}

impl Player {
    /// A player on Go with the starting balance
    pub fn new(game_id: GameId, name: impl Into<String>) -> Self {
        Self {
            key: CompositeKey::default(),
            metadata: SoftDeleteMetadata::default(),
            game_id,
            name: name.into(),
            balance: STARTING_BALANCE,
            position: 0,
            in_jail: false,
            jail_turns: 0,
            bankrupt: false,
        }
    }

    pub fn id(&self) -> PlayerId {
        PlayerId::from_uuid(key_id(&self.key))
    }

    pub fn with_key(mut self, key: CompositeKey) -> Self {
        self.key = key;
        self
    }
}

impl Entity for Player {
    const TABLE: &'static str = "players";
    const NAME: &'static str = "player";

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
            .with(GAME_ID, Uuid::from(self.game_id))
            .with(NAME, self.name.as_str())
            .with(BALANCE, self.balance)
            .with(POSITION, self.position)
            .with(IN_JAIL, self.in_jail)
            .with(JAIL_TURNS, self.jail_turns)
            .with(BANKRUPT, self.bankrupt)
    }

    fn from_parts(
        key: CompositeKey,
        metadata: SoftDeleteMetadata,
        columns: &ColumnMap,
    ) -> Result<Self, DatabaseError> {
        Ok(Self {
            key,
            metadata,
            game_id: GameId::from_uuid(columns.uuid(GAME_ID)?),
            name: columns.text(NAME)?,
            balance: columns.big_int(BALANCE)?,
            position: columns.big_int(POSITION)?,
            in_jail: columns.bool(IN_JAIL)?,
            jail_turns: columns.big_int(JAIL_TURNS)?,
            bankrupt: columns.bool(BANKRUPT)?,
        })
    }
}

/// Player listing filter
///
/// `Some(false)` and `Some(0)` constrain; `None` does not.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerFilter {
    pub ids: Option<Vec<Uuid>>,
    pub game_id: Option<GameId>,
    pub name: Option<String>,
    pub balance: Option<i64>,
    pub position: Option<i64>,
    pub in_jail: Option<bool>,
    pub jail_turns: Option<i64>,
    pub bankrupt: Option<bool>,
}

impl PlayerFilter {
    /// Players of one game
    pub fn in_game(game_id: GameId) -> Self {
        Self {
            game_id: Some(game_id),
            ..Self::default()
        }
    }
}

impl Filter for PlayerFilter {
    fn conditions(&self) -> Vec<Condition> {
        Query::new()
            .in_list(ID, self.ids.as_deref())
            .eq_opt(GAME_ID, self.game_id.map(Uuid::from))
            .eq_opt(NAME, self.name.clone())
            .eq_opt(BALANCE, self.balance)
            .eq_opt(POSITION, self.position)
            .eq_opt(IN_JAIL, self.in_jail)
            .eq_opt(JAIL_TURNS, self.jail_turns)
            .eq_opt(BANKRUPT, self.bankrupt)
            .into_conditions()
    }
}

/// Repository of players
pub type PlayerRepository<S = PgStore> = EntityRepository<Player, PlayerFilter, S>;

/// Key of an existing player
pub fn player_key(id: PlayerId) -> CompositeKey {
    id_key(id.into())
}
