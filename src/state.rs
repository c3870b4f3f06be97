use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    auth::repo::{PgUserStore, UserStore},
    config::{AppConfig, MAX_DB_CONNECTIONS},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Open the pool, apply migrations, and wrap it as the user store.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let options = config.database.connect_options()?;
        let db = PgPoolOptions::new()
            .max_connections(MAX_DB_CONNECTIONS)
            .connect_with(options)
            .await
            .context("connect to database")?;

        run_migrations(&db).await?;

        Ok(Self {
            store: Arc::new(PgUserStore::new(db)),
            config: Arc::new(config),
        })
    }

    #[cfg(test)]
    pub fn for_tests(store: Arc<dyn UserStore>, expose_db_errors: bool) -> Self {
        use crate::config::DatabaseConfig;

        let config = AppConfig {
            database: DatabaseConfig {
                url: None,
                host: "localhost".into(),
                port: 5432,
                user: "test".into(),
                password: "test".into(),
                name: "test".into(),
            },
            host: "127.0.0.1".into(),
            port: 0,
            expose_db_errors,
        };
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// Migrations are embedded at build time, so any failure here is fatal.
pub async fn run_migrations(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    tracing::info!("migrations applied");
    Ok(())
}
