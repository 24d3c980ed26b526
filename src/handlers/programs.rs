use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::capability::{self, Capability};
use crate::database::manager::DatabaseManager;
use crate::database::models::Program;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::program_service::{NewProgram, ProgramChanges};
use crate::services::ProgramService;
use crate::types::Page;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(default)]
    pub include_archived: bool,
    pub department: Option<String>,
}

/// GET /api/programs
pub async fn list(
    Extension(_auth): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Program>> {
    let service = ProgramService::new(DatabaseManager::pool().await?);
    let page = Page { limit: query.limit, offset: query.offset };
    let programs =
        service.list(page, query.include_archived, query.department.as_deref()).await?;
    Ok(ApiResponse::success(programs))
}

/// GET /api/programs/:id
pub async fn get(
    Extension(_auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Program> {
    let service = ProgramService::new(DatabaseManager::pool().await?);
    Ok(ApiResponse::success(service.get(id).await?))
}

/// POST /api/programs
pub async fn create(
    Extension(auth): Extension<AuthUser>,
    Json(input): Json<NewProgram>,
) -> ApiResult<Program> {
    capability::require(&auth, Capability::CreateContent)?;
    let service = ProgramService::new(DatabaseManager::pool().await?);
    let program = service.create(input, auth.user_id).await?;
    Ok(ApiResponse::created(program))
}

/// PATCH /api/programs/:id
pub async fn update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(changes): Json<ProgramChanges>,
) -> ApiResult<Program> {
    let service = ProgramService::new(DatabaseManager::pool().await?);
    let existing = service.get(id).await?;
    capability::require_owner_or(&auth, existing.created_by, Capability::EditContent)?;
    Ok(ApiResponse::success(service.update(id, changes).await?))
}

/// POST /api/programs/:id/archive - soft delete
pub async fn archive(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Program> {
    let service = ProgramService::new(DatabaseManager::pool().await?);
    let existing = service.get(id).await?;
    capability::require_owner_or(&auth, existing.created_by, Capability::DeleteContent)?;
    Ok(ApiResponse::success(service.archive(id).await?))
}

/// POST /api/programs/:id/restore
pub async fn restore(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Program> {
    capability::require(&auth, Capability::DeleteContent)?;
    let service = ProgramService::new(DatabaseManager::pool().await?);
    Ok(ApiResponse::success(service.restore(id).await?))
}

/// DELETE /api/programs/:id - hard delete, admin only
pub async fn delete(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    capability::require(&auth, Capability::HardDeleteContent)?;
    let service = ProgramService::new(DatabaseManager::pool().await?);
    service.delete(id).await?;
    Ok(ApiResponse::<()>::no_content())
}
