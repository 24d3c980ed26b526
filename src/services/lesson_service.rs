use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Lesson;
use crate::database::repository::Repository;
use crate::services::catalog::{validate_title, CatalogError};
use crate::types::ContentStatus;

#[derive(Debug, Deserialize)]
pub struct NewLesson {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sequence_order: i32,
    pub status: Option<ContentStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LessonChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub sequence_order: Option<i32>,
    pub status: Option<ContentStatus>,
}

pub struct LessonService {
    pool: PgPool,
    repo: Repository<Lesson>,
}

impl LessonService {
    pub fn new(pool: PgPool) -> Self {
        let repo = Repository::new("lessons", pool.clone());
        Self { pool, repo }
    }

    pub async fn list_for_course(
        &self,
        course_id: Uuid,
        include_archived: bool,
    ) -> Result<Vec<Lesson>, CatalogError> {
        Ok(self.repo.list_by_parent("course_id", course_id, include_archived).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Lesson, CatalogError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("lesson {} not found", id)))
    }

    pub async fn create(
        &self,
        course_id: Uuid,
        input: NewLesson,
        created_by: Uuid,
    ) -> Result<Lesson, CatalogError> {
        validate_title(&input.title)?;
        let status = input.status.unwrap_or(ContentStatus::Draft);

        let lesson = sqlx::query_as::<_, Lesson>(
            "INSERT INTO lessons (course_id, title, description, sequence_order, status, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(course_id)
        .bind(input.title.trim())
        .bind(&input.description)
        .bind(input.sequence_order)
        .bind(status.as_str())
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(lesson)
    }

    pub async fn update(&self, id: Uuid, changes: LessonChanges) -> Result<Lesson, CatalogError> {
        if let Some(title) = changes.title.as_deref() {
            validate_title(title)?;
        }

        let lesson = sqlx::query_as::<_, Lesson>(
            "UPDATE lessons SET \
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
        .ok_or_else(|| CatalogError::NotFound(format!("lesson {} not found", id)))?;
        Ok(lesson)
    }

    pub async fn archive(&self, id: Uuid) -> Result<Lesson, CatalogError> {
        let lesson = sqlx::query_as::<_, Lesson>(
            "UPDATE lessons SET status = 'archived', updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("lesson {} not found", id)))?;
        Ok(lesson)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), CatalogError> {
        let result =
            sqlx::query("DELETE FROM lessons WHERE id = $1").bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(format!("lesson {} not found", id)));
        }
        Ok(())
    }
}
