use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::reference::MediaReference;

/// Path under which inline thumbnails are served.
pub const INLINE_THUMBNAIL_ROUTE: &str = "/api/thumbnails";

/// A video record. Title and description are owned by the metadata
/// endpoints; the upload pipeline only touches the two references and
/// `updated_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub video: Option<MediaReference>,
    pub thumbnail: Option<MediaReference>,
}

impl VideoRecord {
    pub fn new(user_id: Uuid, title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            description: description.into(),
            created_at: now,
            updated_at: now,
            video: None,
            thumbnail: None,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    pub fn inline_thumbnail_url(&self) -> String {
        format!("{}/{}", INLINE_THUMBNAIL_ROUTE, self.id)
    }
}

/// Video record as returned by the API.
///
/// Upload responses carry the stored references verbatim; read endpoints
/// replace remote references with freshly signed URLs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

impl From<&VideoRecord> for VideoResponse {
    fn from(record: &VideoRecord) -> Self {
        let thumbnail_url = record.thumbnail.as_ref().map(|thumbnail| match thumbnail {
            MediaReference::Inline { .. } => record.inline_thumbnail_url(),
            other => other.to_wire().unwrap_or_default(),
        });

        Self {
            id: record.id,
            user_id: record.user_id,
            title: record.title.clone(),
            description: record.description.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            video_url: record.video.as_ref().and_then(MediaReference::to_wire),
            thumbnail_url,
        }
    }
}
