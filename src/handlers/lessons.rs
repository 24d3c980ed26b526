use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::capability::{self, Capability};
use crate::database::manager::DatabaseManager;
use crate::database::models::Lesson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::lesson_service::{LessonChanges, NewLesson};
use crate::services::LessonService;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_archived: bool,
}

/// GET /api/courses/:course_id/lessons
pub async fn list(
    Extension(_auth): Extension<AuthUser>,
    Path(course_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Lesson>> {
    let service = LessonService::new(DatabaseManager::pool().await?);
    let lessons = service.list_for_course(course_id, query.include_archived).await?;
    Ok(ApiResponse::success(lessons))
}

/// GET /api/lessons/:id
pub async fn get(
    Extension(_auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Lesson> {
    let service = LessonService::new(DatabaseManager::pool().await?);
    Ok(ApiResponse::success(service.get(id).await?))
}

/// POST /api/courses/:course_id/lessons
pub async fn create(
    Extension(auth): Extension<AuthUser>,
    Path(course_id): Path<Uuid>,
    Json(input): Json<NewLesson>,
) -> ApiResult<Lesson> {
    capability::require(&auth, Capability::CreateContent)?;
    let service = LessonService::new(DatabaseManager::pool().await?);
    let lesson = service.create(course_id, input, auth.user_id).await?;
    Ok(ApiResponse::created(lesson))
}

/// PATCH /api/lessons/:id
pub async fn update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(changes): Json<LessonChanges>,
) -> ApiResult<Lesson> {
    let service = LessonService::new(DatabaseManager::pool().await?);
    let existing = service.get(id).await?;
    capability::require_owner_or(&auth, existing.created_by, Capability::EditContent)?;
    Ok(ApiResponse::success(service.update(id, changes).await?))
}

/// POST /api/lessons/:id/archive
pub async fn archive(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Lesson> {
    let service = LessonService::new(DatabaseManager::pool().await?);
    let existing = service.get(id).await?;
    capability::require_owner_or(&auth, existing.created_by, Capability::DeleteContent)?;
    Ok(ApiResponse::success(service.archive(id).await?))
}

/// DELETE /api/lessons/:id
pub async fn delete(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    capability::require(&auth, Capability::HardDeleteContent)?;
    let service = LessonService::new(DatabaseManager::pool().await?);
    service.delete(id).await?;
    Ok(ApiResponse::<()>::no_content())
}
