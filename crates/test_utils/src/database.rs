//! Database Test Utilities
//!
//! Provides a PostgreSQL test container with the schema applied, for tests
//! that exercise [`infra_db::PgStore`]. These need a running Docker daemon;
//! tests using them are marked `#[ignore]` and run with
//! `cargo test -- --ignored`.

use std::sync::Arc;

use infra_db::{apply_schema, create_pool, schema::TABLES, PgStore, Settings};
use sqlx::PgPool;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

use crate::clock::SteppingClock;
use crate::fixtures::Repositories;

/// Default PostgreSQL image for testing
const POSTGRES_IMAGE: &str = "postgres";
const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_USER: &str = "test_user";
const POSTGRES_PASSWORD: &str = "test_password";
const POSTGRES_DB: &str = "monopoly_test";

/// Configuration for test database
#[derive(Debug, Clone)]
pub struct TestDatabaseConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl Default for TestDatabaseConfig {
    fn default() -> Self {
        Self {
            user: POSTGRES_USER.to_string(),
            password: POSTGRES_PASSWORD.to_string(),
            database: POSTGRES_DB.to_string(),
            host: "localhost".to_string(),
            port: 5432,
        }
    }
}

impl TestDatabaseConfig {
    /// Creates the database connection URL
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// A PostgreSQL container with the schema applied
pub struct TestDatabase {
    _container: ContainerAsync<GenericImage>,
    pub config: TestDatabaseConfig,
    pub pool: PgPool,
}

impl TestDatabase {
    /// Starts a new PostgreSQL container and applies the schema
    ///
    /// # Errors
    ///
    /// Returns an error if the container fails to start or the schema
    /// cannot be applied
    pub async fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let container = GenericImage::new(POSTGRES_IMAGE, POSTGRES_TAG)
            .with_exposed_port(5432.tcp())
            .with_wait_for(WaitFor::message_on_stderr(
                "database system is ready to accept connections",
            ))
            .with_env_var("POSTGRES_USER", POSTGRES_USER)
            .with_env_var("POSTGRES_PASSWORD", POSTGRES_PASSWORD)
            .with_env_var("POSTGRES_DB", POSTGRES_DB)
            .start()
            .await?;

        let config = TestDatabaseConfig {
            host: container.get_host().await?.to_string(),
            port: container.get_host_port_ipv4(5432).await?,
            ..TestDatabaseConfig::default()
        };

        let settings = Settings {
            database_url: config.connection_url(),
            max_connections: 5,
            min_connections: 1,
            ..Settings::default()
        };
        let pool = create_pool(&settings).await?;

        apply_schema(&pool).await?;

        Ok(Self {
            _container: container,
            config,
            pool,
        })
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Repositories over this database with a stepping clock
    pub fn repositories(&self) -> Repositories<PgStore> {
        Repositories::over(
            Arc::new(PgStore::new(self.pool.clone())),
            Arc::new(SteppingClock::default()),
        )
    }

    /// Removes every row, soft-deleted ones included, keeping the schema
    pub async fn clear_data(&self) -> Result<(), sqlx::Error> {
        let tables = TABLES.join(", ");
        sqlx::query(&format!("TRUNCATE TABLE {} CASCADE", tables))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Helper macro for tests that need a fresh database
///
/// The body sees `db: TestDatabase`. The generated test is ignored unless
/// run with `--ignored`, since it needs Docker.
#[macro_export]
macro_rules! db_test {
    ($name:ident, |$db:ident| $body:block) => {
        #[tokio::test]
        #[ignore = "requires docker"]
        async fn $name() {
            let $db = $crate::database::TestDatabase::new()
                .await
                .expect("Failed to create test database");
            $body
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_connection_url() {
        let config = TestDatabaseConfig::default();
        let url = config.connection_url();

        assert!(url.starts_with("postgres://"));
        assert!(url.contains(POSTGRES_USER));
        assert!(url.ends_with(POSTGRES_DB));
    }
}
