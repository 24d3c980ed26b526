use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::capability::{self, Capability};
use crate::database::manager::DatabaseManager;
use crate::database::models::Course;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::course_service::{CourseChanges, NewCourse};
use crate::services::CourseService;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_archived: bool,
}

/// GET /api/programs/:program_id/courses
pub async fn list(
    Extension(_auth): Extension<AuthUser>,
    Path(program_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Course>> {
    let service = CourseService::new(DatabaseManager::pool().await?);
    let courses = service.list_for_program(program_id, query.include_archived).await?;
    Ok(ApiResponse::success(courses))
}

/// GET /api/courses/:id
pub async fn get(
    Extension(_auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Course> {
    let service = CourseService::new(DatabaseManager::pool().await?);
    Ok(ApiResponse::success(service.get(id).await?))
}

/// POST /api/programs/:program_id/courses
pub async fn create(
    Extension(auth): Extension<AuthUser>,
    Path(program_id): Path<Uuid>,
    Json(input): Json<NewCourse>,
) -> ApiResult<Course> {
    capability::require(&auth, Capability::CreateContent)?;
    let service = CourseService::new(DatabaseManager::pool().await?);
    let course = service.create(program_id, input, auth.user_id).await?;
    Ok(ApiResponse::created(course))
}

/// PATCH /api/courses/:id
pub async fn update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(changes): Json<CourseChanges>,
) -> ApiResult<Course> {
    let service = CourseService::new(DatabaseManager::pool().await?);
    let existing = service.get(id).await?;
    capability::require_owner_or(&auth, existing.created_by, Capability::EditContent)?;
    Ok(ApiResponse::success(service.update(id, changes).await?))
}

/// POST /api/courses/:id/archive
pub async fn archive(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Course> {
    let service = CourseService::new(DatabaseManager::pool().await?);
    let existing = service.get(id).await?;
    capability::require_owner_or(&auth, existing.created_by, Capability::DeleteContent)?;
    Ok(ApiResponse::success(service.archive(id).await?))
}

/// DELETE /api/courses/:id
pub async fn delete(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    capability::require(&auth, Capability::HardDeleteContent)?;
    let service = CourseService::new(DatabaseManager::pool().await?);
    service.delete(id).await?;
    Ok(ApiResponse::<()>::no_content())
}
