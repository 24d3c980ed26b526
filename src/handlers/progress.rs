use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::capability::{self, Capability};
use crate::database::manager::DatabaseManager;
use crate::database::models::{UserProgramProgress, UserProgress};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::progress_service::{ModuleCompletion, ProgramCompletion};
use crate::services::ProgressService;

/// POST /api/modules/:module_id/progress/start - lazy progress row creation
pub async fn start(
    Extension(auth): Extension<AuthUser>,
    Path(module_id): Path<Uuid>,
) -> ApiResult<UserProgress> {
    let service = ProgressService::new(DatabaseManager::pool().await?);
    let row = service.start_module(auth.user_id, module_id).await?;
    Ok(ApiResponse::created(row))
}

/// GET /api/modules/:module_id/progress - the caller's own progress row
pub async fn get_module_progress(
    Extension(auth): Extension<AuthUser>,
    Path(module_id): Path<Uuid>,
) -> ApiResult<Option<UserProgress>> {
    let service = ProgressService::new(DatabaseManager::pool().await?);
    let row = service.get_module_progress(auth.user_id, module_id).await?;
    Ok(ApiResponse::success(row))
}

#[derive(Debug, Deserialize)]
pub struct AttemptRequest {
    pub score: i32,
}

/// POST /api/progress/:id/attempt - record a quiz attempt
pub async fn attempt(
    Extension(auth): Extension<AuthUser>,
    Path(progress_id): Path<Uuid>,
    Json(payload): Json<AttemptRequest>,
) -> ApiResult<UserProgress> {
    let service = ProgressService::new(DatabaseManager::pool().await?);
    require_progress_owner(&service, &auth, progress_id).await?;
    let row = service.record_attempt(progress_id, payload.score).await?;
    Ok(ApiResponse::success(row))
}

/// POST /api/progress/:id/complete - mark a module done; the program summary
/// refreshes asynchronously afterwards
pub async fn complete(
    Extension(auth): Extension<AuthUser>,
    Path(progress_id): Path<Uuid>,
    Json(completion): Json<ModuleCompletion>,
) -> ApiResult<UserProgress> {
    let service = ProgressService::new(DatabaseManager::pool().await?);
    require_progress_owner(&service, &auth, progress_id).await?;
    let row = service.complete_module(progress_id, completion).await?;
    Ok(ApiResponse::success(row))
}

/// GET /api/programs/:program_id/progress - the caller's own program summary
pub async fn get_program_progress(
    Extension(auth): Extension<AuthUser>,
    Path(program_id): Path<Uuid>,
) -> ApiResult<Option<UserProgramProgress>> {
    let service = ProgressService::new(DatabaseManager::pool().await?);
    let row = service.get_program_progress(auth.user_id, program_id).await?;
    Ok(ApiResponse::success(row))
}

/// GET /api/programs/:program_id/progress/users/:user_id - reporting view
pub async fn get_user_program_progress(
    Extension(auth): Extension<AuthUser>,
    Path((program_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Option<UserProgramProgress>> {
    if user_id != auth.user_id {
        capability::require(&auth, Capability::ViewReports)?;
    }
    let service = ProgressService::new(DatabaseManager::pool().await?);
    let row = service.get_program_progress(user_id, program_id).await?;
    Ok(ApiResponse::success(row))
}

#[derive(Debug, Deserialize)]
pub struct RecalculateQuery {
    /// Recompute for another user; requires the reporting capability
    pub user_id: Option<Uuid>,
}

/// POST /api/programs/:program_id/progress/recalculate - synchronous recount
pub async fn recalculate(
    Extension(auth): Extension<AuthUser>,
    Path(program_id): Path<Uuid>,
    Query(query): Query<RecalculateQuery>,
) -> ApiResult<ProgramCompletion> {
    let user_id = query.user_id.unwrap_or(auth.user_id);
    if user_id != auth.user_id {
        capability::require(&auth, Capability::ViewReports)?;
    }
    let service = ProgressService::new(DatabaseManager::pool().await?);
    let result = service.calculate_program_progress(user_id, program_id).await?;
    Ok(ApiResponse::success(result))
}

/// Progress rows are personal: only the owner (or a report viewer) may act
async fn require_progress_owner(
    service: &ProgressService,
    auth: &AuthUser,
    progress_id: Uuid,
) -> Result<(), crate::error::ApiError> {
    let row = service.find_progress(progress_id).await?;
    match row {
        Some(row) if row.user_id == auth.user_id => Ok(()),
        Some(_) => capability::require(auth, Capability::ViewReports),
        // Let the service surface its own not-found for a consistent message
        None => Ok(()),
    }
}
