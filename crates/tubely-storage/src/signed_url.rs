//! Signed URL issuing for stored remote references.
//!
//! URLs are minted on every read and never persisted. A reference whose
//! bucket is not the configured one is refused instead of signed.

use crate::traits::{Storage, StorageError, StorageResult};
use std::sync::Arc;
use std::time::Duration;
use tubely_core::models::RemoteObject;

/// Default lifetime of an issued URL.
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Clone)]
pub struct SignedUrlIssuer {
    storage: Arc<dyn Storage>,
    ttl: Duration,
}

impl SignedUrlIssuer {
    pub fn new(storage: Arc<dyn Storage>, ttl: Duration) -> Self {
        Self { storage, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a read URL for `object`, valid for the configured TTL.
    pub async fn issue_signed_url(&self, object: &RemoteObject) -> StorageResult<String> {
        let expected = self.storage.bucket();
        if object.bucket != expected {
            tracing::warn!(
                expected_bucket = %expected,
                found_bucket = %object.bucket,
                key = %object.key,
                "Refusing to sign reference to a foreign bucket"
            );
            return Err(StorageError::ForeignBucket {
                key: object.key.clone(),
                expected: expected.to_string(),
                found: object.bucket.clone(),
            });
        }

        let url = self
            .storage
            .get_presigned_url(&object.key, self.ttl)
            .await?;

        tracing::debug!(
            bucket = %object.bucket,
            key = %object.key,
            ttl_secs = self.ttl.as_secs(),
            "Issued signed URL"
        );

        Ok(url)
    }
}
