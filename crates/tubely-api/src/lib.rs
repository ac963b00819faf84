//! Tubely API Library
//!
//! HTTP handlers, the upload orchestrator, authentication and application
//! setup for the Tubely video service.

mod api_doc;
pub mod constants;
mod handlers;
pub mod services;
pub mod setup;
mod telemetry;

// Public modules
pub mod auth;
pub mod error;
pub mod state;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
