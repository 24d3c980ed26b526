use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Module;
use crate::database::repository::Repository;
use crate::services::catalog::{validate_title, CatalogError};
use crate::types::ContentStatus;

const CONTENT_TYPES: &[&str] = &["video", "document", "quiz", "external"];

#[derive(Debug, Deserialize)]
pub struct NewModule {
    pub title: String,
    #[serde(default)]
    pub sequence_order: i32,
    pub content_type: Option<String>,
    pub content_url: Option<String>,
    /// Required modules count toward program completion
    #[serde(default = "default_required")]
    pub is_required: bool,
    #[serde(default)]
    pub has_quiz: bool,
    pub status: Option<ContentStatus>,
}

fn default_required() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct ModuleChanges {
    pub title: Option<String>,
    pub sequence_order: Option<i32>,
    pub content_type: Option<String>,
    pub content_url: Option<String>,
    pub is_required: Option<bool>,
    pub has_quiz: Option<bool>,
    pub status: Option<ContentStatus>,
}

pub struct ModuleService {
    pool: PgPool,
    repo: Repository<Module>,
}

impl ModuleService {
    pub fn new(pool: PgPool) -> Self {
        let repo = Repository::new("modules", pool.clone());
        Self { pool, repo }
    }

    pub async fn list_for_lesson(
        &self,
        lesson_id: Uuid,
        include_archived: bool,
    ) -> Result<Vec<Module>, CatalogError> {
        Ok(self.repo.list_by_parent("lesson_id", lesson_id, include_archived).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Module, CatalogError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("module {} not found", id)))
    }

    pub async fn create(
        &self,
        lesson_id: Uuid,
        input: NewModule,
        created_by: Uuid,
    ) -> Result<Module, CatalogError> {
        validate_title(&input.title)?;
        let content_type = input.content_type.as_deref().unwrap_or("video");
        validate_content_type(content_type)?;
        let status = input.status.unwrap_or(ContentStatus::Draft);

        let module = sqlx::query_as::<_, Module>(
            "INSERT INTO modules \
                 (lesson_id, title, sequence_order, content_type, content_url, \
                  is_required, has_quiz, status, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(lesson_id)
        .bind(input.title.trim())
        .bind(input.sequence_order)
        .bind(content_type)
        .bind(input.content_url)
        .bind(input.is_required)
        .bind(input.has_quiz)
        .bind(status.as_str())
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(module)
    }

    pub async fn update(&self, id: Uuid, changes: ModuleChanges) -> Result<Module, CatalogError> {
        if let Some(title) = changes.title.as_deref() {
            validate_title(title)?;
        }
        if let Some(content_type) = changes.content_type.as_deref() {
            validate_content_type(content_type)?;
        }

        let module = sqlx::query_as::<_, Module>(
            "UPDATE modules SET \
                 title = COALESCE($2, title), \
                 sequence_order = COALESCE($3, sequence_order), \
                 content_type = COALESCE($4, content_type), \
                 content_url = COALESCE($5, content_url), \
                 is_required = COALESCE($6, is_required), \
                 has_quiz = COALESCE($7, has_quiz), \
                 status = COALESCE($8, status), \
                 updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(changes.title.as_deref().map(str::trim))
        .bind(changes.sequence_order)
        .bind(changes.content_type)
        .bind(changes.content_url)
        .bind(changes.is_required)
        .bind(changes.has_quiz)
        .bind(changes.status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("module {} not found", id)))?;
        Ok(module)
    }

    pub async fn archive(&self, id: Uuid) -> Result<Module, CatalogError> {
        let module = sqlx::query_as::<_, Module>(
            "UPDATE modules SET status = 'archived', updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CatalogError::NotFound(format!("module {} not found", id)))?;
        Ok(module)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), CatalogError> {
        let result =
            sqlx::query("DELETE FROM modules WHERE id = $1").bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(format!("module {} not found", id)));
        }
        Ok(())
    }
}

fn validate_content_type(content_type: &str) -> Result<(), CatalogError> {
    if CONTENT_TYPES.contains(&content_type) {
        Ok(())
    } else {
        Err(CatalogError::Validation(format!(
            "content_type must be one of {:?}, got '{}'",
            CONTENT_TYPES, content_type
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_whitelist() {
        assert!(validate_content_type("video").is_ok());
        assert!(validate_content_type("quiz").is_ok());
        assert!(validate_content_type("podcast").is_err());
    }
}
