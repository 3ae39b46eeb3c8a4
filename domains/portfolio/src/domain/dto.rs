//! Request and response shapes for the project workflow
//!
//! Requests carry their field constraints as `validator` rules; the workflow
//! treats validation as a pass/fail gate with a list of violation messages.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::entities::{Project, ProjectCategory, ProjectStatus};

lazy_static! {
    /// 4-digit project year, 1900-2099
    static ref PROJECT_YEAR_REGEX: Regex = Regex::new(r"^(19|20)\d{2}$").unwrap();
}

/// Incoming project payload for create and update operations.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProjectRequest {
    #[validate(length(min = 3, max = 150))]
    pub title: String,

    #[validate(length(min = 20, max = 5000))]
    pub description: String,

    pub category: ProjectCategory,

    #[validate(length(min = 1, max = 100))]
    pub location: String,

    #[validate(regex(
        path = *PROJECT_YEAR_REGEX,
        message = "project year must be a 4-digit year between 1900 and 2099"
    ))]
    pub project_year: String,

    #[validate(length(max = 100))]
    pub client_name: Option<String>,

    #[serde(default)]
    pub status: ProjectStatus,

    #[validate(custom(function = validate_tags))]
    pub tags: Vec<String>,
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.is_empty() {
        return Err(ValidationError::new("tags")
            .with_message("at least one tag is required".into()));
    }
    for tag in tags {
        if tag.is_empty() || tag.chars().count() > 50 {
            return Err(ValidationError::new("tags")
                .with_message("tags must be 1-50 characters".into()));
        }
    }
    Ok(())
}

/// Gallery image in the external representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryImageResponse {
    pub id: Uuid,
    pub url: String,
}

/// External representation of a persisted project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: ProjectCategory,
    pub location: String,
    pub project_year: String,
    pub client_name: Option<String>,
    pub status: ProjectStatus,
    pub main_image_url: Option<String>,
    pub tags: Vec<String>,
    pub gallery: Vec<GalleryImageResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        ProjectResponse {
            id: project.id,
            title: project.title,
            description: project.description,
            category: project.category,
            location: project.location,
            project_year: project.project_year,
            client_name: project.client_name,
            status: project.status,
            main_image_url: project.main_image_url,
            tags: project.tags,
            gallery: project
                .gallery
                .into_iter()
                .map(|image| GalleryImageResponse {
                    id: image.id,
                    url: image.url,
                })
                .collect(),
            created_at: project.created_at,
        }
    }
}
