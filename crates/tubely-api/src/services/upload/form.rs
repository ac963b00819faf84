use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use tubely_core::AppError;
use tubely_processing::{classify_media_type, MediaKind, StagingArea};

use super::types::StagedUpload;

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::InvalidInput(format!("Invalid multipart body: {}", err.body_text()))
    }
}

/// Find `field_name` in the form, classify its declared content type and
/// stream it to a staging file.
///
/// The type is checked before any byte is written, so an unacceptable
/// upload never touches the disk. Other fields are skipped.
pub async fn stage_form_file(
    multipart: &mut Multipart,
    field_name: &str,
    kind: MediaKind,
    max_bytes: u64,
    staging: &StagingArea,
) -> Result<StagedUpload, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(field_name) {
            continue;
        }

        let declared = field.content_type().unwrap_or_default().to_string();
        let extension = classify_media_type(&declared, kind)?;

        let file = staging
            .stage(field, max_bytes, &format!(".{}", extension))
            .await?;

        tracing::debug!(
            field = field_name,
            content_type = %declared,
            size_bytes = file.size(),
            "Staged form file"
        );

        return Ok(StagedUpload {
            content_type: format!("{}/{}", kind, extension),
            extension,
            file,
        });
    }

    Err(AppError::InvalidInput(format!(
        "Missing form field {:?}",
        field_name
    )))
}
