//! Infrastructure Database Layer
//!
//! This crate provides the data-access layer for the Monopoly game core: a
//! generic, soft-delete aware repository over PostgreSQL (via SQLx) or an
//! in-memory store.
//!
//! # Architecture
//!
//! ```text
//! entity ──to_columns──▶ ColumnMap ──▶ Store (PgStore | MemoryStore)
//! entity ◀─from_columns─ ColumnMap ◀──
//! ```
//!
//! - [`repository::Repository`] is the CRUD contract; [`EntityRepository`]
//!   implements it once for every [`Entity`] / [`Filter`] pair.
//! - [`filter`] turns the set fields of a filter into AND-ed conditions.
//! - [`pagination`] provides offset cursors carried as opaque page tokens.
//! - [`metadata`] holds composite keys and the soft-delete timestamps.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, GameRepository, Pagination, Repository, Settings};
//!
//! let settings = Settings::from_env()?;
//! let pool = create_pool(&settings).await?;
//! let games = GameRepository::from_pool(pool);
//! let key = games.create(&Game::new("Friday night")).await?;
//! ```

pub mod columns;
pub mod config;
pub mod entities;
pub mod error;
pub mod filter;
pub mod metadata;
pub mod pagination;
pub mod pool;
pub mod repository;
pub mod schema;
pub mod store;

pub use columns::{ColumnDef, ColumnKind, ColumnMap, Value};
pub use crate::config::Settings;
pub use entities::{
    game_key, game_log_key, player_key, property_key, read_list_involving, trade_request_key,
    Game, GameFilter, GameLog, GameLogFilter, GameLogRepository, GameRepository, GameStatus,
    InvolvingPage, Ownership, Player, PlayerFilter, PlayerRepository, Property, PropertyFilter,
    PropertyRepository, RentTable, TradeRequest, TradeRequestFilter, TradeRequestRepository,
    TradeStatus,
};
pub use error::DatabaseError;
pub use filter::{Condition, Filter, Operator, Query};
pub use metadata::{Clock, CompositeKey, SoftDeleteMetadata, SystemClock};
pub use pagination::{Cursor, Page, PageRequest, Pagination};
pub use pool::{connect_options, create_pool, pool_options, DatabasePool};
pub use repository::{merge_unique, Entity, EntityRepository, Repository};
pub use schema::apply_schema;
pub use store::{MemoryStore, PgStore, Store};
