//! API constants

/// API base path prefix
pub const API_BASE: &str = "/api";

/// Multipart field carrying a thumbnail image.
pub const THUMBNAIL_FIELD: &str = "thumbnail";

/// Multipart field carrying a video file.
pub const VIDEO_FIELD: &str = "video";

/// Allowance on top of the file size cap for multipart framing and headers.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Issuer claim of access tokens.
pub const ACCESS_TOKEN_ISSUER: &str = "tubely-access";

/// Request body limit for an upload route with the given file cap.
pub fn upload_body_limit(max_file_bytes: u64) -> usize {
    usize::try_from(max_file_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES)).unwrap_or(usize::MAX)
}
