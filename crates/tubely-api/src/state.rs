//! Application state.
//!
//! AppState is split into domain sub-states so the upload pipeline and the
//! read path only reach for what they use.

use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use tubely_core::{Config, ThumbnailPlacement};
use tubely_db::{UserRepository, VideoRepository};
use tubely_processing::{MediaToolchain, StagingArea};
use tubely_storage::{LocalStorage, SignedUrlIssuer, Storage};

use crate::auth::JwtValidator;

/// Record stores. `pool` is `None` for the in-memory backend.
#[derive(Clone)]
pub struct DbState {
    pub pool: Option<PgPool>,
    pub videos: Arc<dyn VideoRepository>,
    pub users: Arc<dyn UserRepository>,
}

/// Size caps for each upload endpoint.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_thumbnail_bytes: u64,
    pub max_video_bytes: u64,
}

/// Everything the upload pipeline and the read path need to move media.
#[derive(Clone)]
pub struct MediaState {
    /// Object store for videos and remote thumbnails.
    pub storage: Arc<dyn Storage>,
    /// Directory served as static assets, for locally placed thumbnails.
    pub assets: LocalStorage,
    pub toolchain: Arc<dyn MediaToolchain>,
    pub signer: SignedUrlIssuer,
    pub staging: StagingArea,
    pub thumbnail_placement: ThumbnailPlacement,
    pub limits: UploadLimits,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: DbState,
    pub media: MediaState,
    pub jwt: JwtValidator,
}

impl AppState {
    pub fn new(
        config: Config,
        db: DbState,
        storage: Arc<dyn Storage>,
        assets: LocalStorage,
        toolchain: Arc<dyn MediaToolchain>,
    ) -> Self {
        let signer = SignedUrlIssuer::new(
            Arc::clone(&storage),
            Duration::from_secs(config.signed_url_ttl_secs()),
        );

        let media = MediaState {
            storage,
            assets,
            toolchain,
            signer,
            staging: StagingArea::new(config.staging_dir().cloned()),
            thumbnail_placement: config.thumbnail_placement(),
            limits: UploadLimits {
                max_thumbnail_bytes: config.max_thumbnail_size_bytes(),
                max_video_bytes: config.max_video_size_bytes(),
            },
        };

        let jwt = JwtValidator::new(config.jwt_secret());

        Self {
            config,
            db,
            media,
            jwt,
        }
    }
}
