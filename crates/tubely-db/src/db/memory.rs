//! In-memory repositories
//!
//! Behave like the Postgres repositories without a database: used by the API
//! integration tests and by `DATABASE_BACKEND=memory` development runs.
//! Contents are lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tubely_core::models::{MediaReference, User, VideoRecord};
use tubely_core::AppError;
use uuid::Uuid;

use super::user::UserRepository;
use super::video::VideoRepository;

#[derive(Clone, Default)]
pub struct InMemoryVideoRepository {
    videos: Arc<RwLock<HashMap<Uuid, VideoRecord>>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `change` to the stored record under the write lock.
    async fn modify(
        &self,
        id: Uuid,
        change: impl FnOnce(&mut VideoRecord),
    ) -> Result<VideoRecord, AppError> {
        let mut videos = self.videos.write().await;
        let record = videos
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;
        change(record);
        Ok(record.clone())
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn create_video(&self, video: &VideoRecord) -> Result<VideoRecord, AppError> {
        let mut videos = self.videos.write().await;
        if videos.contains_key(&video.id) {
            return Err(AppError::Persistence(format!(
                "Video {} already exists",
                video.id
            )));
        }
        videos.insert(video.id, video.clone());
        Ok(video.clone())
    }

    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        Ok(self.videos.read().await.get(&id).cloned())
    }

    async fn set_video_reference(
        &self,
        id: Uuid,
        video: &MediaReference,
        updated_at: DateTime<Utc>,
    ) -> Result<VideoRecord, AppError> {
        self.modify(id, |record| {
            record.video = Some(video.clone());
            record.updated_at = updated_at;
        })
        .await
    }

    async fn set_thumbnail(
        &self,
        id: Uuid,
        thumbnail: &MediaReference,
        updated_at: DateTime<Utc>,
    ) -> Result<VideoRecord, AppError> {
        self.modify(id, |record| {
            record.thumbnail = Some(thumbnail.clone());
            record.updated_at = updated_at;
        })
        .await
    }

    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<VideoRecord>, AppError> {
        let mut videos: Vec<VideoRecord> = self
            .videos
            .read()
            .await
            .values()
            .filter(|video| video.user_id == user_id)
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, email: &str) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|user| user.email == email) {
            return Err(AppError::Persistence(format!(
                "User with email {} already exists",
                email
            )));
        }
        let user = User::new(email);
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubely_core::models::RemoteObject;

    #[tokio::test]
    async fn test_set_video_reference() {
        let repo = InMemoryVideoRepository::new();
        let video = VideoRecord::new(Uuid::new_v4(), "Boots", "");
        repo.create_video(&video).await.unwrap();

        let reference =
            MediaReference::RemoteObject(RemoteObject::new("bucket", "other/abc.mp4"));
        let updated_at = Utc::now();
        let updated = repo
            .set_video_reference(video.id, &reference, updated_at)
            .await
            .unwrap();

        assert_eq!(updated.video, Some(reference));
        assert_eq!(updated.updated_at, updated_at);
        assert_eq!(repo.get_video(video.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_field_updates_leave_other_columns_alone() {
        let repo = InMemoryVideoRepository::new();
        let video = VideoRecord::new(Uuid::new_v4(), "Boots", "a bear");
        repo.create_video(&video).await.unwrap();

        // Each writer only names its own field.
        let thumbnail = MediaReference::LocalFile {
            url: "http://localhost:8091/assets/x.png".to_string(),
        };
        let remote = MediaReference::RemoteObject(RemoteObject::new("bucket", "landscape/a.mp4"));
        repo.set_thumbnail(video.id, &thumbnail, Utc::now())
            .await
            .unwrap();
        repo.set_video_reference(video.id, &remote, Utc::now())
            .await
            .unwrap();

        let stored = repo.get_video(video.id).await.unwrap().unwrap();
        assert_eq!(stored.thumbnail, Some(thumbnail));
        assert_eq!(stored.video, Some(remote));
        assert_eq!(stored.title, "Boots");
        assert_eq!(stored.description, "a bear");
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let repo = InMemoryVideoRepository::new();
        let reference = MediaReference::LocalFile {
            url: "/assets/x.png".to_string(),
        };
        let err = repo
            .set_thumbnail(Uuid::new_v4(), &reference, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_filters_by_owner() {
        let repo = InMemoryVideoRepository::new();
        let owner = Uuid::new_v4();
        repo.create_video(&VideoRecord::new(owner, "a", ""))
            .await
            .unwrap();
        repo.create_video(&VideoRecord::new(owner, "b", ""))
            .await
            .unwrap();
        repo.create_video(&VideoRecord::new(Uuid::new_v4(), "c", ""))
            .await
            .unwrap();

        let videos = repo.list_videos_for_user(owner).await.unwrap();
        assert_eq!(videos.len(), 2);
        assert!(videos.iter().all(|v| v.user_id == owner));
    }

    #[tokio::test]
    async fn test_users_are_unique_by_email() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create_user("walt@breakingbad.com").await.unwrap();
        assert_eq!(repo.get_user(user.id).await.unwrap(), Some(user));
        assert!(repo.create_user("walt@breakingbad.com").await.is_err());
    }
}
