use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::capability::Role;
use crate::auth::{generate_jwt, verify_password, Claims};
use crate::config;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Value,
    pub expires_in: u64,
}

/// POST /auth/login - authenticate by email/password and receive a JWT
pub async fn login_post(Json(payload): Json<LoginRequest>) -> ApiResult<LoginResponse> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }

    let pool = DatabaseManager::pool().await?;
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(payload.email.trim())
        .fetch_optional(&pool)
        .await
        .map_err(DatabaseError::from)?;

    let Some(user) = user else {
        return Err(ApiError::unauthorized("invalid credentials"));
    };
    if !verify_password(&payload.password, &user.password_digest) {
        return Err(ApiError::unauthorized("invalid credentials"));
    }

    let role = effective_role(&user);
    let claims = Claims::new(user.id, user.email.clone(), role.as_str().to_string());
    let token = generate_jwt(claims).map_err(|e| {
        tracing::error!("JWT generation failed: {}", e);
        ApiError::internal_server_error("could not issue token")
    })?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(ApiResponse::success(LoginResponse {
        token,
        user: public_user(&user, role),
        expires_in: config::config().security.jwt_expiry_hours * 3600,
    }))
}

/// The legacy is_admin flag outranks the role column
fn effective_role(user: &User) -> Role {
    if user.is_admin {
        Role::Admin
    } else {
        user.role.parse().unwrap_or(Role::Member)
    }
}

fn public_user(user: &User, role: Role) -> Value {
    json!({
        "id": user.id,
        "email": user.email,
        "display_name": user.display_name,
        "role": role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(role: &str, is_admin: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "t@example.com".into(),
            password_digest: String::new(),
            display_name: "T".into(),
            role: role.into(),
            is_admin,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn is_admin_flag_outranks_role_column() {
        assert_eq!(effective_role(&user("member", true)), Role::Admin);
        assert_eq!(effective_role(&user("manager", false)), Role::Manager);
        assert_eq!(effective_role(&user("gibberish", false)), Role::Member);
    }
}
