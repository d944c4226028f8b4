//! Game event log

use chrono::{DateTime, SubsecRound, Utc};
use core_kernel::{GameId, GameLogId, PlayerId};
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
const PLAYER_ID: &str = "player_id";
const ACTION: &str = "action";
const DESCRIPTION: &str = "description";
const TIMESTAMP: &str = "timestamp";

// timestamptz keeps microseconds
const TIMESTAMP_DIGITS: u16 = 6;

fn storage_precision(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.trunc_subsecs(TIMESTAMP_DIGITS)
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::required(GAME_ID, ColumnKind::Uuid),
    ColumnDef::nullable(PLAYER_ID, ColumnKind::Uuid),
    ColumnDef::required(ACTION, ColumnKind::Text),
    ColumnDef::required(DESCRIPTION, ColumnKind::Text),
    ColumnDef::required(TIMESTAMP, ColumnKind::Timestamp),
];

/// One recorded game event
///
/// `player_id` is empty for events not caused by a player. The timestamp is
/// held at microsecond precision; finer digits are truncated on construction
/// and again when the row is written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameLog {
    pub key: CompositeKey,
    pub metadata: SoftDeleteMetadata,
    pub game_id: GameId,
    pub player_id: Option<PlayerId>,
    pub action: String,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

impl GameLog {
    pub fn new(
        game_id: GameId,
        player_id: Option<PlayerId>,
        action: impl Into<String>,
        description: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            key: CompositeKey::default(),
            metadata: SoftDeleteMetadata::default(),
            game_id,
            player_id,
            action: action.into(),
            description: description.into(),
            timestamp: storage_precision(timestamp),
        }
    }

    pub fn id(&self) -> GameLogId {
        GameLogId::from_uuid(key_id(&self.key))
    }

    pub fn with_key(mut self, key: CompositeKey) -> Self {
        self.key = key;
        self
    }
}

impl Entity for GameLog {
    const TABLE: &'static str = "game_logs";
    const NAME: &'static str = "game log";

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
            .with(PLAYER_ID, self.player_id.map(Uuid::from))
            .with(ACTION, self.action.as_str())
            .with(DESCRIPTION, self.description.as_str())
            .with(TIMESTAMP, storage_precision(self.timestamp))
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
            player_id: columns.opt_uuid(PLAYER_ID)?.map(PlayerId::from_uuid),
            action: columns.text(ACTION)?,
            description: columns.text(DESCRIPTION)?,
            timestamp: columns.timestamp(TIMESTAMP)?,
        })
    }
}

/// Game log listing filter; the timestamp bounds are inclusive
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameLogFilter {
    pub ids: Option<Vec<Uuid>>,
    pub game_id: Option<GameId>,
    pub player_id: Option<PlayerId>,
    pub action: Option<String>,
    pub timestamp_start: Option<DateTime<Utc>>,
    pub timestamp_end: Option<DateTime<Utc>>,
}

impl Filter for GameLogFilter {
    fn conditions(&self) -> Vec<Condition> {
        Query::new()
            .in_list(ID, self.ids.as_deref())
            .eq_opt(GAME_ID, self.game_id.map(Uuid::from))
            .eq_opt(PLAYER_ID, self.player_id.map(Uuid::from))
            .eq_opt(ACTION, self.action.clone())
            .gte_opt(TIMESTAMP, self.timestamp_start.map(storage_precision))
            .lte_opt(TIMESTAMP, self.timestamp_end.map(storage_precision))
            .into_conditions()
    }
}

/// Repository of game log entries
pub type GameLogRepository<S = PgStore> = EntityRepository<GameLog, GameLogFilter, S>;

/// Key of an existing log entry
pub fn game_log_key(id: GameLogId) -> CompositeKey {
    id_key(id.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn nanosecond_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 19, 30, 0).unwrap()
            + Duration::nanoseconds(123_456_789)
    }

    #[test]
    fn test_round_trip_without_player() {
        let log = GameLog::new(GameId::new(), None, "auction", "Boardwalk sold", Utc::now())
            .with_key(game_log_key(GameLogId::new()));
        assert_eq!(GameLog::from_columns(&log.to_columns()).unwrap(), log);
    }

    #[test]
    fn test_timestamp_truncated_to_micros() {
        let at = nanosecond_instant();
        let micros = Utc.with_ymd_and_hms(2024, 3, 1, 19, 30, 0).unwrap()
            + Duration::microseconds(123_456);

        let log = GameLog::new(GameId::new(), None, "roll", "Rolled a 7", at);
        assert_eq!(log.timestamp, micros);

        let mut raw = log.clone().with_key(game_log_key(GameLogId::new()));
        raw.timestamp = at;
        let stored = GameLog::from_columns(&raw.to_columns()).unwrap();
        assert_eq!(stored.timestamp, micros);
    }

    #[test]
    fn test_time_window_conditions() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 19, 30, 0).unwrap();
        let filter = GameLogFilter {
            timestamp_start: Some(start),
            timestamp_end: Some(start + Duration::hours(1)),
            ..Default::default()
        };
        let conditions = filter.conditions();
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0], Condition::gte("timestamp", start));

        let filter = GameLogFilter {
            timestamp_end: Some(nanosecond_instant()),
            ..Default::default()
        };
        assert_eq!(
            filter.conditions(),
            vec![Condition::lte(
                "timestamp",
                nanosecond_instant().trunc_subsecs(6)
            )]
        );
    }
}
