//! Services for the Portfolio domain

pub mod images;
pub mod projects;

pub use images::{ImageOrchestrator, ImageUploadError};
pub use projects::ProjectService;
