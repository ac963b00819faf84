//! Tubely Storage Library
//!
//! Storage abstraction for uploaded media with S3 (object_store) and local
//! filesystem backends.
//!
//! # Storage key format
//!
//! - **Videos**: `{orientation}/{64 hex chars}.{extension}`, random per upload
//! - **Thumbnails**: `{video_id}.{extension}` on local disk, `thumbnails/{video_id}.{extension}`
//!   in the object store; deterministic so a re-upload overwrites
//!
//! Keys must not contain `..` or a leading `/`. Key generation lives in the
//! `keys` module so every backend sees the same layout.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod signed_url;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use factory::create_assets_storage;
pub use keys::{derive_video_key, remote_thumbnail_key, thumbnail_key};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use signed_url::SignedUrlIssuer;
pub use traits::{Storage, StorageError, StorageResult};
pub use tubely_core::StorageBackend;
