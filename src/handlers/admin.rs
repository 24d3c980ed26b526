use axum::Extension;
use serde::Serialize;

use crate::auth::capability::{self, Capability};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Course, Lesson, Module, Program};
use crate::database::repository::Repository;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub programs: i64,
    pub courses: i64,
    pub lessons: i64,
    pub modules: i64,
    pub users: i64,
    pub module_completions: i64,
    pub program_completions: i64,
}

/// GET /api/admin/stats - dashboard counts (archived content excluded)
pub async fn stats(Extension(auth): Extension<AuthUser>) -> ApiResult<AdminStats> {
    capability::require(&auth, Capability::ViewReports)?;

    let pool = DatabaseManager::pool().await?;

    let programs = Repository::<Program>::new("programs", pool.clone()).count(false).await?;
    let courses = Repository::<Course>::new("courses", pool.clone()).count(false).await?;
    let lessons = Repository::<Lesson>::new("lessons", pool.clone()).count(false).await?;
    let modules = Repository::<Module>::new("modules", pool.clone()).count(false).await?;

    let users: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .map_err(DatabaseError::from)?;
    let module_completions: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM user_progress WHERE status = 'completed'")
            .fetch_one(&pool)
            .await
            .map_err(DatabaseError::from)?;
    let program_completions: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM user_program_progress WHERE status = 'completed'")
            .fetch_one(&pool)
            .await
            .map_err(DatabaseError::from)?;

    Ok(ApiResponse::success(AdminStats {
        programs,
        courses,
        lessons,
        modules,
        users: users.0,
        module_completions: module_completions.0,
        program_completions: program_completions.0,
    }))
}
