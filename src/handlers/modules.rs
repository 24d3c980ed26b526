use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::capability::{self, Capability};
use crate::database::manager::DatabaseManager;
use crate::database::models::Module;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::module_service::{ModuleChanges, NewModule};
use crate::services::ModuleService;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_archived: bool,
}

/// GET /api/lessons/:lesson_id/modules
pub async fn list(
    Extension(_auth): Extension<AuthUser>,
    Path(lesson_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Module>> {
    let service = ModuleService::new(DatabaseManager::pool().await?);
    let modules = service.list_for_lesson(lesson_id, query.include_archived).await?;
    Ok(ApiResponse::success(modules))
}

/// GET /api/modules/:id
pub async fn get(
    Extension(_auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Module> {
    let service = ModuleService::new(DatabaseManager::pool().await?);
    Ok(ApiResponse::success(service.get(id).await?))
}

/// POST /api/lessons/:lesson_id/modules
pub async fn create(
    Extension(auth): Extension<AuthUser>,
    Path(lesson_id): Path<Uuid>,
    Json(input): Json<NewModule>,
) -> ApiResult<Module> {
    capability::require(&auth, Capability::CreateContent)?;
    let service = ModuleService::new(DatabaseManager::pool().await?);
    let module = service.create(lesson_id, input, auth.user_id).await?;
    Ok(ApiResponse::created(module))
}

/// PATCH /api/modules/:id
pub async fn update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(changes): Json<ModuleChanges>,
) -> ApiResult<Module> {
    let service = ModuleService::new(DatabaseManager::pool().await?);
    let existing = service.get(id).await?;
    capability::require_owner_or(&auth, existing.created_by, Capability::EditContent)?;
    Ok(ApiResponse::success(service.update(id, changes).await?))
}

/// POST /api/modules/:id/archive
pub async fn archive(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Module> {
    let service = ModuleService::new(DatabaseManager::pool().await?);
    let existing = service.get(id).await?;
    capability::require_owner_or(&auth, existing.created_by, Capability::DeleteContent)?;
    Ok(ApiResponse::success(service.archive(id).await?))
}

/// DELETE /api/modules/:id
pub async fn delete(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    capability::require(&auth, Capability::HardDeleteContent)?;
    let service = ModuleService::new(DatabaseManager::pool().await?);
    service.delete(id).await?;
    Ok(ApiResponse::<()>::no_content())
}
