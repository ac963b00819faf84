//! Storage setup and initialization

use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;
use tubely_storage::{create_assets_storage, create_storage, LocalStorage, Storage};

/// Build the object store, verify it is reachable, and prepare the assets
/// directory for locally placed thumbnails.
pub async fn setup_storage(config: &Config) -> Result<(Arc<dyn Storage>, LocalStorage)> {
    tracing::info!("Initializing storage...");
    let storage = create_storage(config).await?;

    storage
        .check_access()
        .await
        .with_context(|| format!("Cannot access bucket {:?}", storage.bucket()))?;

    tracing::info!(
        backend = ?storage.backend_type(),
        bucket = %storage.bucket(),
        "Storage initialized successfully"
    );

    let assets = create_assets_storage(config).await?;
    tracing::info!(
        assets_root = %assets.base_path().display(),
        thumbnail_placement = %config.thumbnail_placement(),
        "Assets directory ready"
    );

    Ok((storage, assets))
}
