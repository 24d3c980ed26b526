use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Program;
use crate::database::repository::Repository;
use crate::services::catalog::{validate_title, CatalogError};
use crate::types::{ContentStatus, Page};

#[derive(Debug, Deserialize)]
pub struct NewProgram {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub departments: Vec<String>,
    pub status: Option<ContentStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProgramChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub departments: Option<Vec<String>>,
    pub status: Option<ContentStatus>,
}

pub struct ProgramService {
    pool: PgPool,
    repo: Repository<Program>,
}

impl ProgramService {
    pub fn new(pool: PgPool) -> Self {
        let repo = Repository::new("programs", pool.clone());
        Self { pool, repo }
    }

    pub async fn list(
        &self,
        page: Page,
        include_archived: bool,
        department: Option<&str>,
    ) -> Result<Vec<Program>, CatalogError> {
        let max = crate::config::config().api.max_page_size;
        let (limit, offset) = (page.limit(max), page.offset());

        let Some(department) = department else {
            return Ok(self.repo.list(limit, offset, include_archived).await?);
        };

        let archived = if include_archived { "" } else { "AND status <> 'archived'" };
        let sql = format!(
            "SELECT * FROM programs WHERE $1 = ANY(departments) {} \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            archived
        );
        let rows = sqlx::query_as::<_, Program>(&sql)
            .bind(department)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: Uuid) -> Result<Program, CatalogError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("program {} not found", id)))
    }

    pub async fn create(&self, input: NewProgram, created_by: Uuid) -> Result<Program, CatalogError> {
        validate_title(&input.title)?;
        let status = input.status.unwrap_or(ContentStatus::Draft);

        let program = sqlx::query_as::<_, Program>(
            "INSERT INTO programs (title, description, status, departments, created_by) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(status.as_str())
        .bind(&input.departments)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(program)
    }

    pub async fn update(&self, id: Uuid, changes: ProgramChanges) -> Result<Program, CatalogError> {
        if let Some(title) = changes.title.as_deref() {
            validate_title(title)?;
        }

        let program = sqlx::query_as::<_, Program>(
            "UPDATE programs SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 departments = COALESCE($4, departments), \
                 status = COALESCE($5, status), \
                 updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(changes.title.as_deref().map(str::trim))
        .bind(changes.description)
        .bind(changes.departments)
        .bind(changes.status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("program {} not found", id)))?;
        Ok(program)
    }

    /// Soft delete: flip status to archived
    pub async fn archive(&self, id: Uuid) -> Result<Program, CatalogError> {
        let program = sqlx::query_as::<_, Program>(
            "UPDATE programs SET status = 'archived', updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("program {} not found", id)))?;
        Ok(program)
    }

    /// Undo an archive; the row returns as a draft
    pub async fn restore(&self, id: Uuid) -> Result<Program, CatalogError> {
        let program = sqlx::query_as::<_, Program>(
            "UPDATE programs SET status = 'draft', updated_at = now() \
             WHERE id = $1 AND status = 'archived' RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("archived program {} not found", id)))?;
        Ok(program)
    }

    /// Hard delete, cascading to the content hierarchy beneath
    pub async fn delete(&self, id: Uuid) -> Result<(), CatalogError> {
        let result = sqlx::query("DELETE FROM programs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(format!("program {} not found", id)));
        }
        Ok(())
    }
}
