use std::sync::Arc;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{configuration::Config, db::MIGRATOR};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
}

pub type SharedAppState = Arc<AppState>;

impl AppState {
    pub async fn init(config: Config) -> Result<Self, anyhow::Error> {
        let pool = PgPoolOptions::new()
            .min_connections(config.database.min_connections)
            .max_connections(config.database.max_connections)
            .connect_lazy_with(config.database.with_db()?);

        if config.application.run_migration {
            tracing::warn!("Running database migrations...");
            MIGRATOR.run(&pool).await?;
        }

        Ok(AppState { pool, config })
    }

    pub fn with_pool(pool: PgPool, config: Config) -> Self {
        AppState { pool, config }
    }
}
