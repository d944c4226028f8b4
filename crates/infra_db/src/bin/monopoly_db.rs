//! Monopoly database bootstrap binary
//!
//! Connects to PostgreSQL, applies the schema and verifies the database
//! answers queries.
//!
//! # Usage
//!
//! ```bash
//! MONOPOLY_DATABASE_URL=postgres://localhost/monopoly cargo run --bin monopoly-db
//! ```
//!
//! # Environment Variables
//!
//! * `MONOPOLY_DATABASE_URL` - PostgreSQL connection string
//! * `MONOPOLY_MAX_CONNECTIONS` / `MONOPOLY_MIN_CONNECTIONS` - pool bounds
//! * `MONOPOLY_CONNECT_TIMEOUT_SECS` - pool acquire timeout (default: 30)
//! * `MONOPOLY_MAX_LIFETIME_SECS` / `MONOPOLY_IDLE_TIMEOUT_SECS` - connection
//!   recycling (defaults: 1800 / 600)
//! * `MONOPOLY_STATEMENT_TIMEOUT_MS` - per-statement timeout (default: none)
//! * `MONOPOLY_LOG_LEVEL` - trace, debug, info, warn, error (default: info)

use anyhow::Context;
use infra_db::{apply_schema, create_pool, PgStore, Settings, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let settings = Settings::from_env().context("invalid MONOPOLY_* configuration")?;
    init_tracing(&settings.log_level);

    tracing::info!(
        max_connections = settings.max_connections,
        statement_timeout_ms = ?settings.statement_timeout_ms,
        "Starting Monopoly database bootstrap"
    );

    let pool = create_pool(&settings)
        .await
        .context("failed to connect to database")?;

    apply_schema(&pool).await.context("failed to apply schema")?;

    let store = PgStore::new(pool.clone()).with_statement_timeout(settings.statement_timeout());
    store.health_check().await.context("health check failed")?;

    tracing::info!("Database ready");
    pool.close().await;
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
