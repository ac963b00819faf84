//! Application setup and initialization
//!
//! Everything `main` needs to go from a loaded `Config` to a running router.

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;
use tubely_processing::FfmpegToolchain;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Telemetry first so every later step is logged
    crate::telemetry::init_telemetry(&config);

    config
        .validate()
        .context("Configuration validation failed")?;
    tracing::info!("Configuration loaded and validated successfully");

    // Record stores
    let db = database::setup_database(&config).await?;

    // Object store and assets directory
    let (storage, assets) = storage::setup_storage(&config).await?;

    let toolchain = FfmpegToolchain::new(config.ffmpeg_path(), config.ffprobe_path())
        .context("Invalid media tool path")?;
    tracing::info!(
        ffmpeg_path = %config.ffmpeg_path(),
        ffprobe_path = %config.ffprobe_path(),
        "Media toolchain configured"
    );

    let state = Arc::new(AppState::new(
        config.clone(),
        db,
        storage,
        assets,
        Arc::new(toolchain),
    ));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
