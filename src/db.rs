use crate::config::Config;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Connection factory shared by all handlers.
///
/// Every request checks a session out of the pool and hands it back when the
/// pooled connection is dropped, on success and error paths alike.
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let pool = pool_options(config)
            .connect(&config.database_url)
            .await?;

        // Fail at startup rather than on the first request
        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Builds the pool without opening any connection until first use.
    pub fn lazy(config: &Config) -> anyhow::Result<Self> {
        let pool = pool_options(config).connect_lazy(&config.database_url)?;
        Ok(Self { pool })
    }
}

fn pool_options(config: &Config) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
}
