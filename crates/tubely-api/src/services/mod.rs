pub mod media_resolver;
pub mod upload;

pub use media_resolver::MediaResolver;
pub use upload::UploadOrchestrator;
