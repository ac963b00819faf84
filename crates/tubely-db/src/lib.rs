//! Tubely Database Layer
//!
//! Repositories for the video and user records. Every repository is a trait
//! with a Postgres implementation (sqlx) and an in-memory implementation used
//! by tests and by `DATABASE_BACKEND=memory` development runs.

pub mod db;

pub use db::memory::{InMemoryUserRepository, InMemoryVideoRepository};
pub use db::user::{PgUserRepository, UserRepository};
pub use db::video::{PgVideoRepository, VideoRepository};
