//! Test helpers: build AppState and router for integration tests.
//!
//! Every app runs on the in-memory record stores, a local storage backend
//! and assets directory in temp dirs, and a fake media toolchain.

pub mod auth;
pub mod fixtures;
pub mod toolchain;

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tubely_api::setup::routes;
use tubely_api::state::{AppState, DbState};
use tubely_core::config::AppConfig;
use tubely_core::models::{MediaReference, User, VideoRecord};
use tubely_core::{AppError, BaseConfig, Config, StorageBackend, ThumbnailPlacement, UploadConfig};
use tubely_db::{InMemoryUserRepository, InMemoryVideoRepository, UserRepository, VideoRepository};
use tubely_storage::LocalStorage;
use uuid::Uuid;

pub use toolchain::FakeToolchain;

pub const TEST_BUCKET: &str = "tubely-test";
pub const TEST_JWT_SECRET: &str = "test-secret-key-min-32-characters-long-for-testing";
pub const MEDIA_BASE_URL: &str = "http://localhost:8091/media";
pub const ASSETS_BASE_URL: &str = "http://localhost:8091/assets";

pub struct TestOptions {
    pub thumbnail_placement: ThumbnailPlacement,
    pub max_thumbnail_bytes: u64,
    pub max_video_bytes: u64,
    pub toolchain: FakeToolchain,
    /// Make every record update fail after the media is stored.
    pub fail_record_updates: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            thumbnail_placement: ThumbnailPlacement::Local,
            max_thumbnail_bytes: 10 * 1024 * 1024,
            max_video_bytes: 64 * 1024 * 1024,
            toolchain: FakeToolchain::with_aspect_ratio("16:9"),
            fail_record_updates: false,
        }
    }
}

/// Test application: server plus handles on everything behind it.
pub struct TestApp {
    pub server: TestServer,
    pub videos: InMemoryVideoRepository,
    pub users: InMemoryUserRepository,
    pub toolchain: FakeToolchain,
    pub storage_dir: TempDir,
    pub assets_dir: TempDir,
    pub staging_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub async fn create_user(&self, email: &str) -> User {
        self.users
            .create_user(email)
            .await
            .expect("Failed to create test user")
    }

    pub async fn create_video(&self, owner: Uuid) -> VideoRecord {
        self.videos
            .create_video(&VideoRecord::new(owner, "Boots", "A bear in the woods"))
            .await
            .expect("Failed to create test video")
    }

    pub async fn stored_video(&self, id: Uuid) -> VideoRecord {
        self.videos
            .get_video(id)
            .await
            .expect("Failed to load video")
            .expect("Video missing")
    }

    /// Files left in the staging directory.
    pub fn staged_files(&self) -> Vec<PathBuf> {
        files_under(self.staging_dir.path())
    }

    /// Objects written to the storage backend, as keys.
    pub fn stored_keys(&self) -> Vec<String> {
        let root = self.storage_dir.path();
        let mut keys: Vec<String> = files_under(root)
            .into_iter()
            .filter_map(|p| {
                p.strip_prefix(root)
                    .ok()
                    .map(|k| k.to_string_lossy().replace('\\', "/"))
            })
            .collect();
        keys.sort();
        keys
    }
}

pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return files;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            files.extend(files_under(&path));
        } else {
            files.push(path);
        }
    }
    files
}

/// Video repository whose updates always fail.
#[derive(Clone)]
struct FailingUpdates {
    inner: InMemoryVideoRepository,
}

#[async_trait]
impl VideoRepository for FailingUpdates {
    async fn create_video(&self, video: &VideoRecord) -> Result<VideoRecord, AppError> {
        self.inner.create_video(video).await
    }

    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        self.inner.get_video(id).await
    }

    async fn set_video_reference(
        &self,
        _id: Uuid,
        _video: &MediaReference,
        _updated_at: DateTime<Utc>,
    ) -> Result<VideoRecord, AppError> {
        Err(AppError::Persistence("connection reset by peer".to_string()))
    }

    async fn set_thumbnail(
        &self,
        _id: Uuid,
        _thumbnail: &MediaReference,
        _updated_at: DateTime<Utc>,
    ) -> Result<VideoRecord, AppError> {
        Err(AppError::Persistence("connection reset by peer".to_string()))
    }

    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<VideoRecord>, AppError> {
        self.inner.list_videos_for_user(user_id).await
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(TestOptions::default()).await
}

pub async fn setup_test_app_with(options: TestOptions) -> TestApp {
    let storage_dir = tempfile::tempdir().expect("Failed to create storage dir");
    let assets_dir = tempfile::tempdir().expect("Failed to create assets dir");
    let staging_dir = tempfile::tempdir().expect("Failed to create staging dir");

    let config = create_test_config(&options, &storage_dir, &assets_dir, &staging_dir);

    let videos = InMemoryVideoRepository::new();
    let users = InMemoryUserRepository::new();
    let video_repo: Arc<dyn VideoRepository> = if options.fail_record_updates {
        Arc::new(FailingUpdates {
            inner: videos.clone(),
        })
    } else {
        Arc::new(videos.clone())
    };

    let db = DbState {
        pool: None,
        videos: video_repo,
        users: Arc::new(users.clone()),
    };

    let storage = LocalStorage::new(
        storage_dir.path(),
        MEDIA_BASE_URL.to_string(),
        TEST_BUCKET,
    )
    .await
    .expect("Failed to create storage");
    let assets = LocalStorage::new(assets_dir.path(), ASSETS_BASE_URL.to_string(), "assets")
        .await
        .expect("Failed to create assets storage");

    let state = Arc::new(AppState::new(
        config.clone(),
        db,
        Arc::new(storage),
        assets,
        Arc::new(options.toolchain.clone()),
    ));

    let app = routes::setup_routes(&config, state).expect("Failed to setup routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        videos,
        users,
        toolchain: options.toolchain,
        storage_dir,
        assets_dir,
        staging_dir,
    }
}

fn create_test_config(
    options: &TestOptions,
    storage_dir: &TempDir,
    assets_dir: &TempDir,
    staging_dir: &TempDir,
) -> Config {
    let base = BaseConfig {
        server_port: 8091,
        cors_origins: vec!["*".to_string()],
        environment: "test".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        http_concurrency_limit: 64,
    };

    let upload = UploadConfig {
        max_thumbnail_size_bytes: options.max_thumbnail_bytes,
        max_video_size_bytes: options.max_video_bytes,
        staging_dir: Some(staging_dir.path().to_path_buf()),
        ffmpeg_path: "ffmpeg".to_string(),
        ffprobe_path: "ffprobe".to_string(),
        thumbnail_placement: options.thumbnail_placement,
        assets_root: assets_dir.path().to_path_buf(),
        assets_base_url: ASSETS_BASE_URL.to_string(),
        signed_url_ttl_secs: 900,
    };

    Config(Box::new(AppConfig {
        base,
        database_backend: "memory".to_string(),
        database_url: None,
        db_max_connections: 5,
        db_timeout_seconds: 30,
        storage_backend: StorageBackend::Local,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        local_storage_path: Some(storage_dir.path().to_string_lossy().into_owned()),
        local_storage_base_url: Some(MEDIA_BASE_URL.to_string()),
        local_storage_bucket: TEST_BUCKET.to_string(),
        upload,
    }))
}
