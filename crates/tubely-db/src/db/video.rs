//! Video repository: the `videos` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres};
use tubely_core::models::{MediaReference, VideoRecord};
use tubely_core::AppError;
use uuid::Uuid;

/// Record store operations used by the upload pipeline and the read path.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn create_video(&self, video: &VideoRecord) -> Result<VideoRecord, AppError>;

    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError>;

    /// Replace the video reference and bump `updated_at`. No other column
    /// is written. Returns the record as stored after the update.
    async fn set_video_reference(
        &self,
        id: Uuid,
        video: &MediaReference,
        updated_at: DateTime<Utc>,
    ) -> Result<VideoRecord, AppError>;

    /// Replace the thumbnail reference and bump `updated_at`. No other column
    /// is written. Returns the record as stored after the update.
    async fn set_thumbnail(
        &self,
        id: Uuid,
        thumbnail: &MediaReference,
        updated_at: DateTime<Utc>,
    ) -> Result<VideoRecord, AppError>;

    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<VideoRecord>, AppError>;
}

/// Row type for the videos table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct VideoRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub thumbnail_data: Option<Vec<u8>>,
    pub thumbnail_media_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRow {
    pub fn to_domain(self) -> Result<VideoRecord, AppError> {
        let video = self
            .video_url
            .as_deref()
            .map(MediaReference::from_wire)
            .transpose()?;

        let thumbnail = match (self.thumbnail_data, self.thumbnail_media_type) {
            (Some(data), Some(media_type)) => Some(MediaReference::Inline { data, media_type }),
            _ => self
                .thumbnail_url
                .as_deref()
                .map(MediaReference::from_wire)
                .transpose()?,
        };

        Ok(VideoRecord {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
            video,
            thumbnail,
        })
    }
}

/// Column values for a thumbnail reference: (thumbnail_url, thumbnail_data, thumbnail_media_type).
fn thumbnail_columns(
    thumbnail: Option<&MediaReference>,
) -> (Option<String>, Option<Vec<u8>>, Option<String>) {
    match thumbnail {
        Some(MediaReference::Inline { data, media_type }) => {
            (None, Some(data.clone()), Some(media_type.clone()))
        }
        Some(other) => (other.to_wire(), None, None),
        None => (None, None, None),
    }
}

const VIDEO_COLUMNS: &str = "id, user_id, title, description, video_url, thumbnail_url, \
     thumbnail_data, thumbnail_media_type, created_at, updated_at";

/// Postgres implementation of [`VideoRepository`].
#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.record_id = %video.id))]
    async fn create_video(&self, video: &VideoRecord) -> Result<VideoRecord, AppError> {
        let (thumbnail_url, thumbnail_data, thumbnail_media_type) =
            thumbnail_columns(video.thumbnail.as_ref());

        let row: VideoRow = sqlx::query_as::<Postgres, VideoRow>(&format!(
            r#"
            INSERT INTO videos (id, user_id, title, description, video_url, thumbnail_url,
                                thumbnail_data, thumbnail_media_type, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            VIDEO_COLUMNS
        ))
        .bind(video.id)
        .bind(video.user_id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.video.as_ref().and_then(MediaReference::to_wire))
        .bind(thumbnail_url)
        .bind(thumbnail_data)
        .bind(thumbnail_media_type)
        .bind(video.created_at)
        .bind(video.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.to_domain()
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.record_id = %id))]
    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        let row: Option<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(&format!(
            "SELECT {} FROM videos WHERE id = $1",
            VIDEO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(VideoRow::to_domain).transpose()
    }

    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.record_id = %id))]
    async fn set_video_reference(
        &self,
        id: Uuid,
        video: &MediaReference,
        updated_at: DateTime<Utc>,
    ) -> Result<VideoRecord, AppError> {
        let row: Option<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(&format!(
            r#"
            UPDATE videos
            SET video_url = $2,
                updated_at = $3
            WHERE id = $1
            RETURNING {}
            "#,
            VIDEO_COLUMNS
        ))
        .bind(id)
        .bind(video.to_wire())
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?
            .to_domain()
    }

    #[tracing::instrument(skip(self, thumbnail), fields(db.table = "videos", db.record_id = %id))]
    async fn set_thumbnail(
        &self,
        id: Uuid,
        thumbnail: &MediaReference,
        updated_at: DateTime<Utc>,
    ) -> Result<VideoRecord, AppError> {
        let (thumbnail_url, thumbnail_data, thumbnail_media_type) =
            thumbnail_columns(Some(thumbnail));

        let row: Option<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(&format!(
            r#"
            UPDATE videos
            SET thumbnail_url = $2,
                thumbnail_data = $3,
                thumbnail_media_type = $4,
                updated_at = $5
            WHERE id = $1
            RETURNING {}
            "#,
            VIDEO_COLUMNS
        ))
        .bind(id)
        .bind(thumbnail_url)
        .bind(thumbnail_data)
        .bind(thumbnail_media_type)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?
            .to_domain()
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", user_id = %user_id))]
    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<VideoRecord>, AppError> {
        let rows: Vec<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(&format!(
            "SELECT {} FROM videos WHERE user_id = $1 ORDER BY created_at DESC",
            VIDEO_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(VideoRow::to_domain).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> VideoRow {
        let now = Utc::now();
        VideoRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Boots".to_string(),
            description: "a bear".to_string(),
            video_url: None,
            thumbnail_url: None,
            thumbnail_data: None,
            thumbnail_media_type: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_with_remote_video() {
        let mut row = row();
        row.video_url = Some("tubely-videos,landscape/abc.mp4".to_string());
        let record = row.to_domain().unwrap();
        let remote = record.video.as_ref().and_then(|v| v.as_remote()).unwrap();
        assert_eq!(remote.bucket, "tubely-videos");
        assert_eq!(remote.key, "landscape/abc.mp4");
    }

    #[test]
    fn test_row_with_malformed_video_reference() {
        let mut row = row();
        row.video_url = Some("no-separator".to_string());
        let err = row.to_domain().unwrap_err();
        assert!(matches!(err, AppError::MalformedReference(_)));
    }

    #[test]
    fn test_inline_thumbnail_wins_over_url() {
        let mut row = row();
        row.thumbnail_data = Some(vec![1, 2, 3]);
        row.thumbnail_media_type = Some("image/png".to_string());
        let record = row.to_domain().unwrap();
        assert_eq!(
            record.thumbnail,
            Some(MediaReference::Inline {
                data: vec![1, 2, 3],
                media_type: "image/png".to_string()
            })
        );
    }

    #[test]
    fn test_thumbnail_columns_round_trip_local_file() {
        let reference = MediaReference::LocalFile {
            url: "http://localhost:8091/assets/x.png".to_string(),
        };
        let (url, data, media_type) = thumbnail_columns(Some(&reference));
        assert_eq!(url.as_deref(), Some("http://localhost:8091/assets/x.png"));
        assert!(data.is_none());
        assert!(media_type.is_none());
    }
}
