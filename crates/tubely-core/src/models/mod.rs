//! Data models for the application

mod orientation;
mod reference;
mod user;
mod video;

pub use orientation::AspectClassification;
pub use reference::{is_local_url, MediaReference, ReferenceError, RemoteObject};
pub use user::User;
pub use video::{VideoRecord, VideoResponse, INLINE_THUMBNAIL_ROUTE};
