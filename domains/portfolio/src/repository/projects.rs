//! Postgres project repository
//!
//! Create and update persist the whole project graph inside one transaction.
//! The unique index on `lower(title)` backstops the workflow's advisory
//! title check; violations surface as `RepositoryError::AlreadyExists`.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use atelier_common::RepositoryError;

use crate::domain::entities::{Project, ProjectImage};
use crate::repository::ProjectRepository;

#[derive(Clone)]
pub struct PgProjectRepository {
    pool: PgPool,
}

impl PgProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_tags(&self, project_id: Uuid) -> Result<Vec<String>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT value
            FROM project_tags
            WHERE project_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("value").map_err(Into::into))
            .collect()
    }

    async fn load_gallery(&self, project_id: Uuid) -> Result<Vec<ProjectImage>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, project_id, url, public_id, position
            FROM project_images
            WHERE project_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(image_from_row).collect()
    }

    async fn fetch_project(&self, id: Uuid) -> Result<Option<Project>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, category, location, project_year,
                   client_name, status, main_image_url, main_image_public_id, created_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut project = project_from_row(&row)?;
        project.tags = self.load_tags(project.id).await?;
        Ok(Some(project))
    }
}

fn project_from_row(row: &PgRow) -> Result<Project, RepositoryError> {
    let category: String = row.try_get("category")?;
    let status: String = row.try_get("status")?;

    Ok(Project {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: category.parse().map_err(RepositoryError::InvalidData)?,
        location: row.try_get("location")?,
        project_year: row.try_get("project_year")?,
        client_name: row.try_get("client_name")?,
        status: status.parse().map_err(RepositoryError::InvalidData)?,
        main_image_url: row.try_get("main_image_url")?,
        main_image_public_id: row.try_get("main_image_public_id")?,
        tags: Vec::new(),
        gallery: Vec::new(),
        created_at: row.try_get("created_at")?,
    })
}

fn image_from_row(row: &PgRow) -> Result<ProjectImage, RepositoryError> {
    Ok(ProjectImage {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        url: row.try_get("url")?,
        public_id: row.try_get("public_id")?,
        position: row.try_get("position")?,
    })
}

/// Insert tag rows for a project within an existing transaction.
async fn insert_tags_tx(
    tx: &mut Transaction<'_, Postgres>,
    project: &Project,
) -> Result<(), RepositoryError> {
    for (position, value) in project.tags.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO project_tags (project_id, position, value)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(project.id)
        .bind(position as i32)
        .bind(value)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Insert gallery rows for a project within an existing transaction.
async fn insert_gallery_tx(
    tx: &mut Transaction<'_, Postgres>,
    gallery: &[ProjectImage],
) -> Result<(), RepositoryError> {
    for image in gallery {
        sqlx::query(
            r#"
            INSERT INTO project_images (id, project_id, url, public_id, position)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(image.id)
        .bind(image.project_id)
        .bind(&image.url)
        .bind(&image.public_id)
        .bind(image.position)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn create(&self, project: &Project) -> Result<Project, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO projects (
                id, title, description, category, location, project_year,
                client_name, status, main_image_url, main_image_public_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(project.id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(project.category.as_str())
        .bind(&project.location)
        .bind(&project.project_year)
        .bind(&project.client_name)
        .bind(project.status.as_str())
        .bind(&project.main_image_url)
        .bind(&project.main_image_public_id)
        .bind(project.created_at)
        .execute(&mut *tx)
        .await
        .map_err(RepositoryError::from_sqlx)?;

        insert_tags_tx(&mut tx, project).await?;
        insert_gallery_tx(&mut tx, &project.gallery).await?;

        tx.commit().await?;
        Ok(project.clone())
    }

    async fn update(&self, project: &Project) -> Result<Project, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE projects
            SET title = $2, description = $3, category = $4, location = $5,
                project_year = $6, client_name = $7, status = $8,
                main_image_url = $9, main_image_public_id = $10
            WHERE id = $1
            "#,
        )
        .bind(project.id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(project.category.as_str())
        .bind(&project.location)
        .bind(&project.project_year)
        .bind(&project.client_name)
        .bind(project.status.as_str())
        .bind(&project.main_image_url)
        .bind(&project.main_image_public_id)
        .execute(&mut *tx)
        .await
        .map_err(RepositoryError::from_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM project_tags WHERE project_id = $1")
            .bind(project.id)
            .execute(&mut *tx)
            .await?;
        insert_tags_tx(&mut tx, project).await?;

        sqlx::query("DELETE FROM project_images WHERE project_id = $1")
            .bind(project.id)
            .execute(&mut *tx)
            .await?;
        insert_gallery_tx(&mut tx, &project.gallery).await?;

        tx.commit().await?;
        Ok(project.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Project>, RepositoryError> {
        self.fetch_project(id).await
    }

    async fn get_by_id_with_gallery(&self, id: Uuid) -> Result<Option<Project>, RepositoryError> {
        let Some(mut project) = self.fetch_project(id).await? else {
            return Ok(None);
        };
        project.gallery = self.load_gallery(project.id).await?;
        Ok(Some(project))
    }

    async fn get_by_title(&self, title: &str) -> Result<Option<Project>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, category, location, project_year,
                   client_name, status, main_image_url, main_image_public_id, created_at
            FROM projects
            WHERE lower(title) = lower($1)
            "#,
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut project = project_from_row(&row)?;
        project.tags = self.load_tags(project.id).await?;
        Ok(Some(project))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        // Tag and gallery rows cascade with the project row
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Project>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, description, category, location, project_year,
                   client_name, status, main_image_url, main_image_public_id, created_at
            FROM projects
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut projects = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut project = project_from_row(row)?;
            project.tags = self.load_tags(project.id).await?;
            project.gallery = self.load_gallery(project.id).await?;
            projects.push(project);
        }
        Ok(projects)
    }
}
