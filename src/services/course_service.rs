use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Course;
use crate::database::repository::Repository;
use crate::services::catalog::{validate_title, CatalogError};
use crate::types::ContentStatus;

#[derive(Debug, Deserialize)]
pub struct NewCourse {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sequence_order: i32,
    pub status: Option<ContentStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CourseChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub sequence_order: Option<i32>,
    pub status: Option<ContentStatus>,
}

pub struct CourseService {
    pool: PgPool,
    repo: Repository<Course>,
}

impl CourseService {
    pub fn new(pool: PgPool) -> Self {
        let repo = Repository::new("courses", pool.clone());
        Self { pool, repo }
    }

    /// Courses of a program in sequence order
    pub async fn list_for_program(
        &self,
        program_id: Uuid,
        include_archived: bool,
    ) -> Result<Vec<Course>, CatalogError> {
        Ok(self.repo.list_by_parent("program_id", program_id, include_archived).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Course, CatalogError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("course {} not found", id)))
    }

    pub async fn create(
        &self,
        program_id: Uuid,
        input: NewCourse,
        created_by: Uuid,
    ) -> Result<Course, CatalogError> {
        validate_title(&input.title)?;
        let status = input.status.unwrap_or(ContentStatus::Draft);

        let course = sqlx::query_as::<_, Course>(
            "INSERT INTO courses (program_id, title, description, sequence_order, status, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(program_id)
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.sequence_order)
        .bind(status.as_str())
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(course)
    }

    pub async fn update(&self, id: Uuid, changes: CourseChanges) -> Result<Course, CatalogError> {
        if let Some(title) = changes.title.as_deref() {
            validate_title(title)?;
        }

        let course = sqlx::query_as::<_, Course>(
            "UPDATE courses SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 sequence_order = COALESCE($4, sequence_order), \
                 status = COALESCE($5, status), \
                 updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(changes.title.as_deref().map(str::trim))
        .bind(changes.description)
        .bind(changes.sequence_order)
        .bind(changes.status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("course {} not found", id)))?;
        Ok(course)
    }

    pub async fn archive(&self, id: Uuid) -> Result<Course, CatalogError> {
        let course = sqlx::query_as::<_, Course>(
            "UPDATE courses SET status = 'archived', updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("course {} not found", id)))?;
        Ok(course)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), CatalogError> {
        let result =
            sqlx::query("DELETE FROM courses WHERE id = $1").bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(format!("course {} not found", id)));
        }
        Ok(())
    }
}
