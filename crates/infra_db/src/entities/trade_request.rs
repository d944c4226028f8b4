//! Trade requests
//!
//! A trade request offers money and properties from a sender to a receiver
//! in exchange for money and properties of the receiver. Settling a trade
//! is the caller's business; this module only persists the request.

use std::fmt;

use core_kernel::{GameId, PlayerId, TradeRequestId};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{id_key, invalid_value, key_id};
use crate::columns::{ColumnDef, ColumnKind, ColumnMap};
use crate::error::DatabaseError;
use crate::filter::{Condition, Filter, Query};
use crate::metadata::{CompositeKey, SoftDeleteMetadata};
use crate::pagination::{Cursor, Pagination};
use crate::repository::{merge_unique, Entity, EntityRepository, Repository, ID};
use crate::store::PgStore;

const GAME_ID: &str = "game_id";
const SENDER_ID: &str = "sender_id";
const RECEIVER_ID: &str = "receiver_id";
const OFFERING_MONEY: &str = "offering_money";
const REQUESTING_MONEY: &str = "requesting_money";
const OFFERING_PROPERTIES: &str = "offering_properties";
const REQUESTING_PROPERTIES: &str = "requesting_properties";
const STATUS: &str = "status";

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::required(GAME_ID, ColumnKind::Uuid),
    ColumnDef::required(SENDER_ID, ColumnKind::Uuid),
    ColumnDef::required(RECEIVER_ID, ColumnKind::Uuid),
    ColumnDef::required(OFFERING_MONEY, ColumnKind::BigInt),
    ColumnDef::required(REQUESTING_MONEY, ColumnKind::BigInt),
    ColumnDef::required(OFFERING_PROPERTIES, ColumnKind::UuidArray),
    ColumnDef::required(REQUESTING_PROPERTIES, ColumnKind::UuidArray),
    ColumnDef::required(STATUS, ColumnKind::Text),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl TradeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TradeStatus::Pending => "pending",
            TradeStatus::Accepted => "accepted",
            TradeStatus::Rejected => "rejected",
            TradeStatus::Cancelled => "cancelled",
        }
    }

    fn parse(value: &str) -> Result<Self, DatabaseError> {
        match value {
            "pending" => Ok(TradeStatus::Pending),
            "accepted" => Ok(TradeStatus::Accepted),
            "rejected" => Ok(TradeStatus::Rejected),
            "cancelled" => Ok(TradeStatus::Cancelled),
            other => Err(invalid_value(STATUS, other)),
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An offer between two players of the same game
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRequest {
    pub key: CompositeKey,
    pub metadata: SoftDeleteMetadata,
    pub game_id: GameId,
    pub sender_id: PlayerId,
    pub receiver_id: PlayerId,
    pub offering_money: i64,
    pub requesting_money: i64,
    pub offering_properties: Vec<Uuid>,
    pub requesting_properties: Vec<Uuid>,
    pub status: TradeStatus,
}

impl TradeRequest {
    /// A pending request with nothing offered or asked yet
    pub fn new(game_id: GameId, sender_id: PlayerId, receiver_id: PlayerId) -> Self {
        Self {
            key: CompositeKey::default(),
            metadata: SoftDeleteMetadata::default(),
            game_id,
            sender_id,
            receiver_id,
            offering_money: 0,
            requesting_money: 0,
            offering_properties: Vec::new(),
            requesting_properties: Vec::new(),
            status: TradeStatus::Pending,
        }
    }

    pub fn id(&self) -> TradeRequestId {
        TradeRequestId::from_uuid(key_id(&self.key))
    }

    pub fn with_key(mut self, key: CompositeKey) -> Self {
        self.key = key;
        self
    }

    /// True when the player is the sender or the receiver
    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.sender_id == player_id || self.receiver_id == player_id
    }
}

impl Entity for TradeRequest {
    const TABLE: &'static str = "trade_requests";
    const NAME: &'static str = "trade request";

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
            .with(SENDER_ID, Uuid::from(self.sender_id))
            .with(RECEIVER_ID, Uuid::from(self.receiver_id))
            .with(OFFERING_MONEY, self.offering_money)
            .with(REQUESTING_MONEY, self.requesting_money)
            .with(OFFERING_PROPERTIES, self.offering_properties.clone())
            .with(REQUESTING_PROPERTIES, self.requesting_properties.clone())
            .with(STATUS, self.status.as_str())
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
            sender_id: PlayerId::from_uuid(columns.uuid(SENDER_ID)?),
            receiver_id: PlayerId::from_uuid(columns.uuid(RECEIVER_ID)?),
            offering_money: columns.big_int(OFFERING_MONEY)?,
            requesting_money: columns.big_int(REQUESTING_MONEY)?,
            offering_properties: columns.uuid_array(OFFERING_PROPERTIES)?,
            requesting_properties: columns.uuid_array(REQUESTING_PROPERTIES)?,
            status: TradeStatus::parse(&columns.text(STATUS)?)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeRequestFilter {
    pub ids: Option<Vec<Uuid>>,
    pub game_id: Option<GameId>,
    pub sender_id: Option<PlayerId>,
    pub receiver_id: Option<PlayerId>,
    pub status: Option<TradeStatus>,
}

impl Filter for TradeRequestFilter {
    fn conditions(&self) -> Vec<Condition> {
        Query::new()
            .in_list(ID, self.ids.as_deref())
            .eq_opt(GAME_ID, self.game_id.map(Uuid::from))
            .eq_opt(SENDER_ID, self.sender_id.map(Uuid::from))
            .eq_opt(RECEIVER_ID, self.receiver_id.map(Uuid::from))
            .eq_opt(STATUS, self.status.map(TradeStatus::as_str))
            .into_conditions()
    }
}

/// Repository of trade requests
pub type TradeRequestRepository<S = PgStore> =
    EntityRepository<TradeRequest, TradeRequestFilter, S>;

/// Key of an existing trade request
pub fn trade_request_key(id: TradeRequestId) -> CompositeKey {
    id_key(id.into())
}

/// Trade requests a player sent or received, with a cursor per side
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvolvingPage {
    pub items: Vec<TradeRequest>,
    pub sent_cursor: Option<Cursor>,
    pub received_cursor: Option<Cursor>,
}

/// Lists trade requests where the player is sender or receiver
///
/// Runs one listing with the player as sender and one with the player as
/// receiver, each narrowed by `base`, and merges them without duplicates.
/// The `sender_id` and `receiver_id` of `base` are overridden.
#[instrument(skip(repo, base), fields(player_id = %player_id))]
pub async fn read_list_involving<R>(
    repo: &R,
    player_id: PlayerId,
    base: &TradeRequestFilter,
    sent: &Pagination,
    received: &Pagination,
) -> Result<InvolvingPage, DatabaseError>
where
    R: Repository<TradeRequest, TradeRequestFilter> + ?Sized,
{
    let as_sender = TradeRequestFilter {
        sender_id: Some(player_id),
        receiver_id: None,
        ..base.clone()
    };
    let as_receiver = TradeRequestFilter {
        sender_id: None,
        receiver_id: Some(player_id),
        ..base.clone()
    };

    let (sent_items, sent_cursor) = repo.read_list(sent, &as_sender).await?;
    let (received_items, received_cursor) = repo.read_list(received, &as_receiver).await?;
    let items = merge_unique(sent_items, received_items);
    debug!(count = items.len(), "listed trade requests involving player");

    Ok(InvolvingPage {
        items,
        sent_cursor,
        received_cursor,
    })
}
