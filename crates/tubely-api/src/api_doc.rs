//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use tubely_core::models;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tubely API",
        version = "0.1.0",
        description = "Video hosting API. Owners upload thumbnails and videos for their video records; reads return short-lived signed media URLs."
    ),
    paths(
        // Uploads
        handlers::thumbnail_upload::upload_thumbnail,
        handlers::video_upload::upload_video,
        // Videos
        handlers::video_get::get_video,
        handlers::video_get::list_videos,
        handlers::thumbnail_get::get_thumbnail,
    ),
    components(
        schemas(
            models::VideoResponse,
            models::AspectClassification,
            error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "uploads", description = "Thumbnail and video uploads"),
        (name = "videos", description = "Video records with resolved media URLs")
    )
)]
pub struct ApiDoc;
