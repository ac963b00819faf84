//! Object key generation.
//!
//! Keys are built only from server-side values (orientation, random bytes,
//! record IDs) and an extension that has already passed media type
//! classification; client filenames never reach a key.

use rand::RngCore;
use tubely_core::models::AspectClassification;
use uuid::Uuid;

const VIDEO_KEY_RANDOM_BYTES: usize = 32;

/// Derive a fresh key for a video object: `{orientation}/{64 hex}.{extension}`.
///
/// The random component comes from the thread-local CSPRNG. No collision
/// check is made; 256 bits of entropy is treated as collision-free.
pub fn derive_video_key(orientation: AspectClassification, extension: &str) -> String {
    let mut bytes = [0u8; VIDEO_KEY_RANDOM_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    format!("{}/{}.{}", orientation, hex::encode(bytes), extension)
}

/// Key for a thumbnail on local disk: `{video_id}.{extension}`.
pub fn thumbnail_key(video_id: Uuid, extension: &str) -> String {
    format!("{}.{}", video_id, extension)
}

/// Key for a thumbnail in the object store: `thumbnails/{video_id}.{extension}`.
pub fn remote_thumbnail_key(video_id: Uuid, extension: &str) -> String {
    format!("thumbnails/{}", thumbnail_key(video_id, extension))
}
