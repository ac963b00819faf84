//! Database setup and initialization

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tubely_core::Config;
use tubely_db::{
    InMemoryUserRepository, InMemoryVideoRepository, PgUserRepository, PgVideoRepository,
};

use crate::state::DbState;

/// Build the record stores for the configured backend.
pub async fn setup_database(config: &Config) -> Result<DbState> {
    match config.database_backend() {
        "memory" => {
            tracing::warn!("Using in-memory record store; data is lost on restart");
            Ok(DbState {
                pool: None,
                videos: Arc::new(InMemoryVideoRepository::new()),
                users: Arc::new(InMemoryUserRepository::new()),
            })
        }
        _ => {
            let pool = connect(config).await?;
            Ok(DbState {
                pool: Some(pool.clone()),
                videos: Arc::new(PgVideoRepository::new(pool.clone())),
                users: Arc::new(PgUserRepository::new(pool)),
            })
        }
    }
}

/// Setup database connection pool and run migrations
async fn connect(config: &Config) -> Result<PgPool> {
    let database_url = config
        .database_url()
        .context("DATABASE_URL must be set when DATABASE_BACKEND is postgres")?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Database connected successfully"
    );

    // Run pending migrations on startup (path: workspace migrations/ from crate root)
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations_dir)
        .await
        .context("Failed to load migrations")?;
    migrator
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}
