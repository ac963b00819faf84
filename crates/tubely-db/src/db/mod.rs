pub mod memory;
pub mod user;
pub mod video;
