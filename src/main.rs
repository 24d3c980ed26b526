use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use cohort_api::database::manager::DatabaseManager;
use cohort_api::handlers;
use cohort_api::middleware::jwt_auth_middleware;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = cohort_api::config::config();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Cohort API in {:?} mode", config.environment);

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("COHORT_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Cohort API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    let protected = Router::new()
        .merge(program_routes())
        .merge(course_routes())
        .merge(lesson_routes())
        .merge(module_routes())
        .merge(progress_routes())
        .merge(admin_routes())
        .layer(axum::middleware::from_fn(jwt_auth_middleware));

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/login", axum::routing::post(handlers::login::login_post))
        // Protected API
        .merge(protected)
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn program_routes() -> Router {
    use axum::routing::post;
    use cohort_api::handlers::programs;

    Router::new()
        .route("/api/programs", get(programs::list).post(programs::create))
        .route(
            "/api/programs/:id",
            get(programs::get).patch(programs::update).delete(programs::delete),
        )
        .route("/api/programs/:id/archive", post(programs::archive))
        .route("/api/programs/:id/restore", post(programs::restore))
}

fn course_routes() -> Router {
    use cohort_api::handlers::courses;

    Router::new()
        .route(
            "/api/programs/:program_id/courses",
            get(courses::list).post(courses::create),
        )
        .route(
            "/api/courses/:id",
            get(courses::get).patch(courses::update).delete(courses::delete),
        )
        .route("/api/courses/:id/archive", axum::routing::post(courses::archive))
}

fn lesson_routes() -> Router {
    use cohort_api::handlers::lessons;

    Router::new()
        .route(
            "/api/courses/:course_id/lessons",
            get(lessons::list).post(lessons::create),
        )
        .route(
            "/api/lessons/:id",
            get(lessons::get).patch(lessons::update).delete(lessons::delete),
        )
        .route("/api/lessons/:id/archive", axum::routing::post(lessons::archive))
}

fn module_routes() -> Router {
    use cohort_api::handlers::modules;

    Router::new()
        .route(
            "/api/lessons/:lesson_id/modules",
            get(modules::list).post(modules::create),
        )
        .route(
            "/api/modules/:id",
            get(modules::get).patch(modules::update).delete(modules::delete),
        )
        .route("/api/modules/:id/archive", axum::routing::post(modules::archive))
}

fn progress_routes() -> Router {
    use axum::routing::post;
    use cohort_api::handlers::progress;

    Router::new()
        .route(
            "/api/modules/:module_id/progress",
            get(progress::get_module_progress),
        )
        .route("/api/modules/:module_id/progress/start", post(progress::start))
        .route("/api/progress/:id/attempt", post(progress::attempt))
        .route("/api/progress/:id/complete", post(progress::complete))
        .route(
            "/api/programs/:program_id/progress",
            get(progress::get_program_progress),
        )
        .route(
            "/api/programs/:program_id/progress/users/:user_id",
            get(progress::get_user_program_progress),
        )
        .route(
            "/api/programs/:program_id/progress/recalculate",
            post(progress::recalculate),
        )
}

fn admin_routes() -> Router {
    use cohort_api::handlers::admin;

    Router::new().route("/api/admin/stats", get(admin::stats))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Cohort API",
            "version": version,
            "description": "Internal learning-management backend",
            "endpoints": {
                "home": "/ (public)",
                "login": "/auth/login (public - token acquisition)",
                "programs": "/api/programs[/:id] (protected)",
                "courses": "/api/programs/:id/courses, /api/courses/:id (protected)",
                "lessons": "/api/courses/:id/lessons, /api/lessons/:id (protected)",
                "modules": "/api/lessons/:id/modules, /api/modules/:id (protected)",
                "progress": "/api/modules/:id/progress, /api/progress/:id/* (protected)",
                "admin": "/api/admin/stats (protected, reporting roles)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
