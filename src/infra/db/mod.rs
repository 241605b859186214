//! Postgres-backed post store.

mod posts;
mod util;

pub use util::map_sqlx_error;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::config::DatabaseSettings;
use crate::infra::error::InfraError;

/// Connection pool plus the post queries implemented in `posts`.
#[derive(Clone)]
pub struct PostgresRepositories {
    pool: PgPool,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool from settings. Fails when no url is configured.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, InfraError> {
        let url = settings
            .url
            .as_deref()
            .ok_or(InfraError::MissingSetting("database.url"))?;
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections.get())
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), InfraError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!(target: "postboard::db", "schema up to date");
        Ok(())
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}
