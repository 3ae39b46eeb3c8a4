//! Portfolio domain: projects, gallery images, and the multi-resource
//! write workflow coordinating object storage and the relational store.

pub mod domain;
pub mod repository;
pub mod service;

// Re-export domain types at the crate root for convenience
pub use domain::dto::{GalleryImageResponse, ProjectRequest, ProjectResponse};
pub use domain::entities::{Project, ProjectCategory, ProjectImage, ProjectStatus};

// Re-export repository types
pub use repository::{InMemoryProjectRepository, PgProjectRepository, ProjectRepository};

// Re-export service types
pub use service::{ImageOrchestrator, ImageUploadError, ProjectService};
