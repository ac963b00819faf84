//! Configuration module
//!
//! Configuration is read once at startup from the process environment (and an
//! optional `.env` file). Every value has an accessor on [`Config`] so the rest
//! of the workspace never touches `std::env` directly.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

use crate::models::is_local_url;
use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 8091;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const HTTP_CONCURRENCY_LIMIT: usize = 256;
const MIN_JWT_SECRET_LEN: usize = 32;

/// Base configuration for the HTTP service
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub jwt_secret: String,
    pub http_concurrency_limit: usize,
}

/// Where uploaded thumbnails end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailPlacement {
    /// Written under the assets directory and served by a static file server.
    Local,
    /// Uploaded to the object store next to the videos.
    Remote,
    /// Kept on the video record itself.
    Inline,
}

impl FromStr for ThumbnailPlacement {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(ThumbnailPlacement::Local),
            "remote" | "s3" => Ok(ThumbnailPlacement::Remote),
            "inline" => Ok(ThumbnailPlacement::Inline),
            _ => Err(anyhow::anyhow!("Invalid thumbnail placement: {}", s)),
        }
    }
}

impl Display for ThumbnailPlacement {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ThumbnailPlacement::Local => write!(f, "local"),
            ThumbnailPlacement::Remote => write!(f, "remote"),
            ThumbnailPlacement::Inline => write!(f, "inline"),
        }
    }
}

/// Upload pipeline configuration
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub max_thumbnail_size_bytes: u64,
    pub max_video_size_bytes: u64,
    /// Directory for staging files. `None` means the OS temp directory.
    pub staging_dir: Option<PathBuf>,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub thumbnail_placement: ThumbnailPlacement,
    pub assets_root: PathBuf,
    pub assets_base_url: String,
    pub signed_url_ttl_secs: u64,
}

/// Full application configuration
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub base: BaseConfig,
    /// `postgres` or `memory`
    pub database_backend: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub local_storage_bucket: String,
    pub upload: UploadConfig,
}

#[derive(Clone, Debug)]
pub struct Config(pub Box<AppConfig>);

impl Config {
    fn inner(&self) -> &AppConfig {
        &self.0
    }

    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = AppConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().base.jwt_secret
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.inner().base.http_concurrency_limit
    }

    pub fn database_backend(&self) -> &str {
        &self.inner().database_backend
    }

    pub fn database_url(&self) -> Option<&str> {
        self.inner().database_url.as_deref()
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().db_timeout_seconds
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn local_storage_bucket(&self) -> &str {
        &self.inner().local_storage_bucket
    }

    pub fn configured_bucket(&self) -> Option<&str> {
        self.inner().configured_bucket()
    }

    pub fn upload(&self) -> &UploadConfig {
        &self.inner().upload
    }

    pub fn max_thumbnail_size_bytes(&self) -> u64 {
        self.inner().upload.max_thumbnail_size_bytes
    }

    pub fn max_video_size_bytes(&self) -> u64 {
        self.inner().upload.max_video_size_bytes
    }

    pub fn staging_dir(&self) -> Option<&PathBuf> {
        self.inner().upload.staging_dir.as_ref()
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.inner().upload.ffmpeg_path
    }

    pub fn ffprobe_path(&self) -> &str {
        &self.inner().upload.ffprobe_path
    }

    pub fn thumbnail_placement(&self) -> ThumbnailPlacement {
        self.inner().upload.thumbnail_placement
    }

    pub fn assets_root(&self) -> &PathBuf {
        &self.inner().upload.assets_root
    }

    pub fn assets_base_url(&self) -> &str {
        &self.inner().upload.assets_base_url
    }

    pub fn signed_url_ttl_secs(&self) -> u64 {
        self.inner().upload.signed_url_ttl_secs
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        const MAX_THUMBNAIL_SIZE_MB: u64 = 10;
        const MAX_VIDEO_SIZE_MB: u64 = 10 * 1024;
        const SIGNED_URL_TTL_SECS: u64 = 15 * 60;

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let server_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| SERVER_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let base = BaseConfig {
            server_port,
            cors_origins,
            environment,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            http_concurrency_limit: env::var("HTTP_CONCURRENCY_LIMIT")
                .unwrap_or_else(|_| HTTP_CONCURRENCY_LIMIT.to_string())
                .parse()
                .unwrap_or(HTTP_CONCURRENCY_LIMIT),
        };

        let database_backend = env::var("DATABASE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase();

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse::<StorageBackend>()?,
            Err(_) => StorageBackend::S3,
        };

        let thumbnail_placement = match env::var("THUMBNAIL_STORAGE") {
            Ok(value) => value.parse::<ThumbnailPlacement>()?,
            Err(_) => ThumbnailPlacement::Local,
        };

        let upload = UploadConfig {
            max_thumbnail_size_bytes: env::var("MAX_THUMBNAIL_SIZE_MB")
                .unwrap_or_else(|_| MAX_THUMBNAIL_SIZE_MB.to_string())
                .parse::<u64>()
                .unwrap_or(MAX_THUMBNAIL_SIZE_MB)
                * 1024
                * 1024,
            max_video_size_bytes: env::var("MAX_VIDEO_SIZE_MB")
                .unwrap_or_else(|_| MAX_VIDEO_SIZE_MB.to_string())
                .parse::<u64>()
                .unwrap_or(MAX_VIDEO_SIZE_MB)
                * 1024
                * 1024,
            staging_dir: env::var("STAGING_DIR").ok().map(PathBuf::from),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            thumbnail_placement,
            assets_root: PathBuf::from(
                env::var("ASSETS_ROOT").unwrap_or_else(|_| "./assets".to_string()),
            ),
            assets_base_url: env::var("ASSETS_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}/assets", server_port)),
            signed_url_ttl_secs: env::var("SIGNED_URL_TTL_SECS")
                .unwrap_or_else(|_| SIGNED_URL_TTL_SECS.to_string())
                .parse()
                .unwrap_or(SIGNED_URL_TTL_SECS),
        };

        let config = AppConfig {
            base,
            database_backend,
            database_url: env::var("DATABASE_URL").ok(),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            local_storage_bucket: env::var("LOCAL_STORAGE_BUCKET")
                .unwrap_or_else(|_| "local".to_string()),
            upload,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LEN
            ));
        }

        match self.database_backend.as_str() {
            "postgres" => {
                if self.database_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be set when DATABASE_BACKEND is postgres"
                    ));
                }
            }
            "memory" => {}
            other => {
                return Err(anyhow::anyhow!(
                    "DATABASE_BACKEND must be 'postgres' or 'memory', got '{}'",
                    other
                ));
            }
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!("S3_BUCKET must be set for the s3 backend"));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set for the s3 backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set for the local backend"
                    ));
                }
            }
        }

        if !is_local_url(&self.upload.assets_base_url) {
            return Err(anyhow::anyhow!(
                "ASSETS_BASE_URL must be an absolute path or include a scheme, got '{}'",
                self.upload.assets_base_url
            ));
        }
        if let Some(base_url) = &self.local_storage_base_url {
            if !is_local_url(base_url) {
                return Err(anyhow::anyhow!(
                    "LOCAL_STORAGE_BASE_URL must be an absolute path or include a scheme, got '{}'",
                    base_url
                ));
            }
        }

        if self.upload.max_thumbnail_size_bytes == 0 || self.upload.max_video_size_bytes == 0 {
            return Err(anyhow::anyhow!("Upload size limits must be greater than zero"));
        }

        if self.upload.signed_url_ttl_secs == 0 {
            return Err(anyhow::anyhow!("SIGNED_URL_TTL_SECS must be greater than zero"));
        }

        Ok(())
    }

    /// The bucket name written into stored references for the active backend.
    pub fn configured_bucket(&self) -> Option<&str> {
        match self.storage_backend {
            StorageBackend::S3 => self.s3_bucket.as_deref(),
            StorageBackend::Local => Some(self.local_storage_bucket.as_str()),
        }
    }
}
