//! Route configuration and setup.

mod health;

use crate::api_doc::ApiDoc;
use crate::constants::{upload_body_limit, API_BASE};
use crate::handlers::{thumbnail_get, thumbnail_upload, video_get, video_upload};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tubely_core::Config;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let thumbnail_limit = upload_body_limit(config.max_thumbnail_size_bytes());
    let video_limit = upload_body_limit(config.max_video_size_bytes());

    let thumbnail_upload = post(thumbnail_upload::upload_thumbnail)
        .layer(DefaultBodyLimit::max(thumbnail_limit));
    let video_upload =
        post(video_upload::upload_video).layer(DefaultBodyLimit::max(video_limit));

    let upload_routes = Router::new()
        .route("/upload/{video_id}", thumbnail_upload.clone())
        .route(
            &format!("{}/thumbnail_upload/{{video_id}}", API_BASE),
            thumbnail_upload,
        )
        .route("/upload-video/{video_id}", video_upload.clone())
        .route(
            &format!("{}/video_upload/{{video_id}}", API_BASE),
            video_upload,
        );

    let read_routes = Router::new()
        .route(
            &format!("{}/videos", API_BASE),
            get(video_get::list_videos),
        )
        .route(
            &format!("{}/videos/{{video_id}}", API_BASE),
            get(video_get::get_video),
        )
        .route(
            &format!("{}/thumbnails/{{video_id}}", API_BASE),
            get(thumbnail_get::get_thumbnail),
        );

    let http_concurrency_limit = config.http_concurrency_limit().max(1);
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        "HTTP concurrency limit layer enabled"
    );

    let app = upload_routes
        .merge(read_routes)
        .route(
            "/health",
            get({
                let state = state.clone();
                move || health::health_check(state)
            }),
        )
        .route(&format!("{}/openapi.json", API_BASE), get(openapi_spec))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(thumbnail_limit.max(video_limit)))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

async fn openapi_spec() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}
