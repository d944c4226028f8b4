//! PostgreSQL store
//!
//! Statements are rendered with [`sqlx::QueryBuilder`]: every value is a
//! bind parameter and every identifier is checked and quoted before it is
//! pushed. Rows are decoded column by column using the statement's schema,
//! so a column whose stored type differs from the declared one surfaces as
//! [`DatabaseError::TypeMismatch`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::debug;
use uuid::Uuid;

use super::{InsertStatement, SelectStatement, Store};
use crate::columns::{ColumnDef, ColumnKind, ColumnMap, Value};
use crate::error::DatabaseError;
use crate::filter::{Operator, Query};

/// Store backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    statement_timeout: Option<Duration>,
}

impl PgStore {
    /// Creates a store over the given pool with no statement timeout
    ///
    /// # Arguments
    ///
    /// * `pool` - The PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            statement_timeout: None,
        }
    }

    /// Fails any statement that runs longer than `timeout`
    pub fn with_statement_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.statement_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn run<T, F>(&self, fut: F) -> Result<T, DatabaseError>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        let result = match self.statement_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| DatabaseError::Timeout(limit))?,
            None => fut.await,
        };
        result.map_err(|e| DatabaseError::from(&e))
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert(&self, statement: InsertStatement<'_>) -> Result<(), DatabaseError> {
        let mut builder = render_insert(statement.table, statement.row)?;
        debug!(sql = builder.sql(), "insert");
        self.run(builder.build().execute(&self.pool)).await?;
        Ok(())
    }

    async fn select(&self, statement: &SelectStatement) -> Result<Vec<ColumnMap>, DatabaseError> {
        let mut builder = render_select(statement)?;
        debug!(sql = builder.sql(), "select");
        let rows = self.run(builder.build().fetch_all(&self.pool)).await?;
        rows.iter()
            .map(|row| decode_row(row, &statement.schema))
            .collect()
    }

    async fn update(
        &self,
        table: &'static str,
        query: &Query,
        values: &ColumnMap,
    ) -> Result<u64, DatabaseError> {
        let mut builder = render_update(table, query, values)?;
        debug!(sql = builder.sql(), "update");
        let result = self.run(builder.build().execute(&self.pool)).await?;
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.run(sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool))
            .await?;
        Ok(())
    }
}

/// Quotes an identifier after checking it is a plain lowercase name
fn quote_ident(name: &str) -> Result<String, DatabaseError> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(format!("\"{}\"", name))
    } else {
        Err(DatabaseError::QueryFailed(format!(
            "invalid identifier '{}'",
            name
        )))
    }
}

fn push_value(builder: &mut QueryBuilder<'static, Postgres>, value: &Value) {
    match value.clone() {
        // an untyped literal coerces to the column type
        Value::Null => builder.push("NULL"),
        Value::Uuid(v) => builder.push_bind(v),
        Value::Text(v) => builder.push_bind(v),
        Value::BigInt(v) => builder.push_bind(v),
        Value::Bool(v) => builder.push_bind(v),
        Value::Timestamp(v) => builder.push_bind(v),
        Value::UuidArray(v) => builder.push_bind(v),
    };
}

fn push_where(builder: &mut QueryBuilder<'static, Postgres>, query: &Query) -> Result<(), DatabaseError> {
    for (i, condition) in query.conditions().iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        builder.push(quote_ident(&condition.column)?);
        match condition.operator {
            Operator::IsNull => {
                builder.push(" IS NULL");
            }
            Operator::In => {
                builder.push(" = ANY(");
                push_value(builder, &condition.value);
                builder.push(")");
            }
            op => {
                builder.push(format!(" {} ", op.as_sql()));
                push_value(builder, &condition.value);
            }
        }
    }
    Ok(())
}

fn to_i64(value: u64, what: &str) -> Result<i64, DatabaseError> {
    i64::try_from(value)
        .map_err(|_| DatabaseError::InvalidPagination(format!("{} {} out of range", what, value)))
}

pub(crate) fn render_insert(
    table: &str,
    row: &ColumnMap,
) -> Result<QueryBuilder<'static, Postgres>, DatabaseError> {
    let mut builder = QueryBuilder::new(format!("INSERT INTO {} (", quote_ident(table)?));
    for (i, (column, _)) in row.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(quote_ident(column)?);
    }
    builder.push(") VALUES (");
    for (i, (_, value)) in row.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        push_value(&mut builder, value);
    }
    builder.push(")");
    Ok(builder)
}

pub(crate) fn render_select(
    statement: &SelectStatement,
) -> Result<QueryBuilder<'static, Postgres>, DatabaseError> {
    let columns = statement
        .schema
        .iter()
        .map(|def| quote_ident(def.name))
        .collect::<Result<Vec<_>, _>>()?;

    let mut builder = QueryBuilder::new(format!(
        "SELECT {} FROM {}",
        columns.join(", "),
        quote_ident(statement.table)?
    ));
    push_where(&mut builder, &statement.query)?;

    for (i, order) in statement.order_by.iter().enumerate() {
        builder.push(if i == 0 { " ORDER BY " } else { ", " });
        builder.push(format!("{} ASC", quote_ident(order.column)?));
    }

    builder.push(" OFFSET ");
    builder.push_bind(to_i64(statement.offset, "offset")?);
    if let Some(limit) = statement.limit {
        builder.push(" LIMIT ");
        builder.push_bind(to_i64(limit, "limit")?);
    }
    Ok(builder)
}

pub(crate) fn render_update(
    table: &str,
    query: &Query,
    values: &ColumnMap,
) -> Result<QueryBuilder<'static, Postgres>, DatabaseError> {
    if values.is_empty() {
        return Err(DatabaseError::QueryFailed(format!(
            "update of {} sets no columns",
            table
        )));
    }

    let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", quote_ident(table)?));
    for (i, (column, value)) in values.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(format!("{} = ", quote_ident(column)?));
        push_value(&mut builder, value);
    }
    push_where(&mut builder, query)?;
    Ok(builder)
}

fn decode_row(row: &PgRow, schema: &[ColumnDef]) -> Result<ColumnMap, DatabaseError> {
    let mut columns = ColumnMap::new();
    for def in schema {
        columns.insert(def.name, decode_column(row, def)?);
    }
    Ok(columns)
}

fn decode_column(row: &PgRow, def: &ColumnDef) -> Result<Value, DatabaseError> {
    let name = def.name;
    let decoded = match def.kind {
        ColumnKind::Uuid => row.try_get::<Option<Uuid>, _>(name).map(Value::from),
        ColumnKind::Text => row.try_get::<Option<String>, _>(name).map(Value::from),
        ColumnKind::BigInt => row.try_get::<Option<i64>, _>(name).map(Value::from),
        ColumnKind::Bool => row.try_get::<Option<bool>, _>(name).map(Value::from),
        ColumnKind::Timestamp => row
            .try_get::<Option<DateTime<Utc>>, _>(name)
            .map(Value::from),
        ColumnKind::UuidArray => row.try_get::<Option<Vec<Uuid>>, _>(name).map(Value::from),
    };

    let value = decoded.map_err(|err| match err {
        sqlx::Error::ColumnDecode { source, .. } => {
            DatabaseError::type_mismatch(name, def.kind.name(), source.to_string())
        }
        other => DatabaseError::from(&other),
    })?;

    if value.is_null() && !def.nullable {
        return Err(DatabaseError::type_mismatch(name, def.kind.name(), "null"));
    }
    Ok(value)
}
