//! Generic soft-delete repository
//!
//! [`Repository`] is the uniform CRUD contract shared by every entity. It
//! is implemented once, by [`EntityRepository`], for any pairing of an
//! [`Entity`] with a [`Filter`] over any [`Store`].
//!
//! # Soft deletion
//!
//! Rows are never physically removed. Delete stamps `deleted_at`, and every
//! read, list, update and delete ANDs `deleted_at IS NULL` onto its
//! predicate, so a soft-deleted row behaves exactly like a missing one.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{GameFilter, GameRepository, Pagination, Repository};
//!
//! let repo = GameRepository::from_pool(pool);
//! let key = repo.create(&Game::new("Friday night")).await?;
//! let (games, next) = repo
//!     .read_list(&Pagination::first_page(20)?, &GameFilter::default())
//!     .await?;
//! ```

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, instrument, warn};

use crate::columns::{ColumnDef, ColumnKind, ColumnMap};
use crate::error::DatabaseError;
use crate::filter::{Filter, Query};
use crate::metadata::{
    Clock, CompositeKey, SoftDeleteMetadata, SystemClock, CREATED_AT, DELETED_AT,
    METADATA_COLUMNS, UPDATED_AT,
};
use crate::pagination::{Cursor, Page, Pagination};
use crate::store::{InsertStatement, OrderBy, PgStore, SelectStatement, Store};

/// Name of the single key column used by every built-in entity
pub const ID: &str = "id";

/// A persisted entity and its mapping to columns
///
/// Implementors describe their domain columns once, as a static schema, and
/// convert between themselves and a [`ColumnMap`]. Key and metadata columns
/// are handled here.
pub trait Entity: Send + Sync + Sized + Clone + fmt::Debug + 'static {
    /// Table the entity is stored in
    const TABLE: &'static str;
    /// Human readable name used in errors
    const NAME: &'static str;
    /// Columns forming the entity's identity
    const KEY_COLUMNS: &'static [&'static str] = &[ID];

    /// Domain columns, excluding key and metadata columns
    fn columns() -> &'static [ColumnDef];

    fn key(&self) -> &CompositeKey;

    fn metadata(&self) -> &SoftDeleteMetadata;

    /// Values of the domain columns
    fn domain_columns(&self) -> ColumnMap;

    /// Builds the entity from its key, metadata and domain columns
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` or `MissingColumn` when a domain column cannot
    /// be read with its declared type, and `InvalidValue` when it holds a
    /// value outside the entity's domain.
    fn from_parts(
        key: CompositeKey,
        metadata: SoftDeleteMetadata,
        columns: &ColumnMap,
    ) -> Result<Self, DatabaseError>;

    /// Full column schema: key, domain and metadata columns
    fn schema() -> Vec<ColumnDef> {
        Self::KEY_COLUMNS
            .iter()
            .map(|column| ColumnDef::required(*column, ColumnKind::Uuid))
            .chain(Self::columns().iter().copied())
            .chain(METADATA_COLUMNS.iter().copied())
            .collect()
    }

    /// Serializes the whole entity
    fn to_columns(&self) -> ColumnMap {
        self.key()
            .to_columns()
            .merge(self.domain_columns())
            .merge(self.metadata().to_columns())
    }

    /// Inverse of [`Entity::to_columns`]
    fn from_columns(columns: &ColumnMap) -> Result<Self, DatabaseError> {
        let key = CompositeKey::from_columns(Self::KEY_COLUMNS, columns)?;
        let metadata = SoftDeleteMetadata::from_columns(columns)?;
        Self::from_parts(key, metadata, columns)
    }
}

/// CRUD contract over one entity type and its filter
#[async_trait]
pub trait Repository<E, F>: Send + Sync
where
    E: Entity,
    F: Filter,
{
    /// Persists a new entity under a freshly generated key
    ///
    /// The key and metadata carried by `entity` are ignored.
    async fn create(&self, entity: &E) -> Result<CompositeKey, DatabaseError>;

    /// Loads a live entity by key
    ///
    /// # Errors
    ///
    /// `NotFound` when no live row has this key.
    async fn read(&self, key: &CompositeKey) -> Result<E, DatabaseError>;

    /// Lists live entities matching `filter`, one page at a time
    ///
    /// # Returns
    ///
    /// The page of entities and, when more rows exist, the cursor of the
    /// next page
    async fn read_list(
        &self,
        pagination: &Pagination,
        filter: &F,
    ) -> Result<(Vec<E>, Option<Cursor>), DatabaseError>;

    /// Replaces the domain columns of a live entity
    ///
    /// # Returns
    ///
    /// The new `updated_at`
    async fn update(&self, entity: &E) -> Result<DateTime<Utc>, DatabaseError>;

    /// Soft-deletes a live entity
    ///
    /// # Returns
    ///
    /// The `deleted_at` that was stored
    async fn delete(&self, key: &CompositeKey) -> Result<DateTime<Utc>, DatabaseError>;
}

/// [`Repository`] implementation shared by all entities
pub struct EntityRepository<E, F, S = PgStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    _marker: PhantomData<fn() -> (E, F)>,
}

impl<E, F, S> EntityRepository<E, F, S>
where
    E: Entity,
    F: Filter,
    S: Store,
{
    /// Creates a repository over the given store using the system clock
    pub fn new(store: S) -> Self {
        Self::from_arc(Arc::new(store))
    }

    /// Creates a repository sharing an existing store handle
    pub fn from_arc(store: Arc<S>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            _marker: PhantomData,
        }
    }

    /// Replaces the clock used for `created_at`, `updated_at` and `deleted_at`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Lists a page and packages it with the next page token
    pub async fn read_page(
        &self,
        pagination: &Pagination,
        filter: &F,
    ) -> Result<Page<E>, DatabaseError> {
        let (items, next) = self.read_list(pagination, filter).await?;
        Ok(Page::new(items, next))
    }

    /// Sort order of listings: creation time, then key
    fn list_order() -> Vec<OrderBy> {
        std::iter::once(OrderBy::asc(CREATED_AT))
            .chain(E::KEY_COLUMNS.iter().map(|column| OrderBy::asc(*column)))
            .collect()
    }

    fn live(key: &CompositeKey) -> Query {
        key.to_query().is_null(DELETED_AT)
    }
}

impl<E, F> EntityRepository<E, F, PgStore>
where
    E: Entity,
    F: Filter,
{
    /// Creates a PostgreSQL-backed repository
    ///
    /// # Arguments
    ///
    /// * `pool` - The PostgreSQL connection pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self::new(PgStore::new(pool))
    }
}

impl<E, F, S> Clone for EntityRepository<E, F, S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            _marker: PhantomData,
        }
    }
}

impl<E: Entity, F, S: fmt::Debug> fmt::Debug for EntityRepository<E, F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRepository")
            .field("table", &E::TABLE)
            .field("store", &self.store)
            .field("clock", &self.clock)
            .finish()
    }
}

#[async_trait]
impl<E, F, S> Repository<E, F> for EntityRepository<E, F, S>
where
    E: Entity,
    F: Filter,
    S: Store,
{
    #[instrument(skip(self, entity), fields(table = E::TABLE))]
    async fn create(&self, entity: &E) -> Result<CompositeKey, DatabaseError> {
        let key = CompositeKey::generate(E::KEY_COLUMNS);
        let metadata = SoftDeleteMetadata::new(self.clock.now());
        let row = key
            .to_columns()
            .merge(entity.domain_columns())
            .merge(metadata.to_columns());
        row.validate(&E::schema())?;

        self.store
            .insert(InsertStatement {
                table: E::TABLE,
                key_columns: E::KEY_COLUMNS,
                row: &row,
            })
            .await?;

        debug!(key = %key, "created {}", E::NAME);
        Ok(key)
    }

    #[instrument(skip(self, key), fields(table = E::TABLE, key = %key))]
    async fn read(&self, key: &CompositeKey) -> Result<E, DatabaseError> {
        key.validate(E::KEY_COLUMNS)?;

        let statement = SelectStatement::new(E::TABLE, E::schema(), Self::live(key)).window(0, 1);
        let row = self.store.select(&statement).await?.into_iter().next();

        match row {
            Some(columns) => E::from_columns(&columns),
            None => {
                warn!("{} not found", E::NAME);
                Err(DatabaseError::not_found(E::NAME, key))
            }
        }
    }

    #[instrument(skip(self, pagination, filter), fields(table = E::TABLE, offset = pagination.offset(), limit = pagination.limit()))]
    async fn read_list(
        &self,
        pagination: &Pagination,
        filter: &F,
    ) -> Result<(Vec<E>, Option<Cursor>), DatabaseError> {
        let query = filter.filter(Query::new()).is_null(DELETED_AT);
        debug!(%query, "listing {}", E::NAME);

        let statement = SelectStatement::new(E::TABLE, E::schema(), query)
            .order_by(&Self::list_order())
            .window(u64::from(pagination.offset()), pagination.fetch_limit());
        let mut rows = self.store.select(&statement).await?;

        let limit = pagination.limit() as usize;
        let next = if rows.len() > limit {
            rows.truncate(limit);
            Some(pagination.next_cursor()?)
        } else {
            None
        };

        let entities = rows
            .iter()
            .map(E::from_columns)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = entities.len(), has_next = next.is_some(), "listed {}", E::NAME);
        Ok((entities, next))
    }

    #[instrument(skip(self, entity), fields(table = E::TABLE, key = %entity.key()))]
    async fn update(&self, entity: &E) -> Result<DateTime<Utc>, DatabaseError> {
        let key = entity.key();
        key.validate(E::KEY_COLUMNS)?;

        let domain = entity.domain_columns();
        domain.validate(E::columns())?;

        let now = self.clock.now();
        let values = domain.with(UPDATED_AT, now);
        let affected = self.store.update(E::TABLE, &Self::live(key), &values).await?;

        if affected == 0 {
            warn!("no live {} to update", E::NAME);
            return Err(DatabaseError::not_found(E::NAME, key));
        }
        debug!(affected, "updated {}", E::NAME);
        Ok(now)
    }

    #[instrument(skip(self, key), fields(table = E::TABLE, key = %key))]
    async fn delete(&self, key: &CompositeKey) -> Result<DateTime<Utc>, DatabaseError> {
        key.validate(E::KEY_COLUMNS)?;

        let now = self.clock.now();
        let values = ColumnMap::new().with(DELETED_AT, now);
        let affected = self.store.update(E::TABLE, &Self::live(key), &values).await?;

        if affected == 0 {
            warn!("no live {} to delete", E::NAME);
            return Err(DatabaseError::not_found(E::NAME, key));
        }
        debug!("soft-deleted {}", E::NAME);
        Ok(now)
    }
}

/// Concatenates two result sets, dropping later entities whose key was
/// already seen
pub fn merge_unique<E: Entity>(first: Vec<E>, second: Vec<E>) -> Vec<E> {
    let mut seen = HashSet::new();
    first
        .into_iter()
        .chain(second)
        .filter(|entity| seen.insert(entity.key().clone()))
        .collect()
}
