//! Authentication handlers

use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::AuthService;
use crate::AppState;
use shared::{ApiResponse, AuthToken, User};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<AuthToken>>> {
    body.validate()?;
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let token = auth_service.login(&body.email, &body.password).await?;
    Ok(Json(ApiResponse::with_message(token, "Login successful")))
}

/// Current user profile
pub async fn profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let user = auth_service.profile(current_user.0.user_id).await?;
    Ok(Json(ApiResponse::ok(user)))
}

/// Tokens are stateless; logout only acknowledges
pub async fn logout(current_user: CurrentUser) -> Json<ApiResponse<()>> {
    tracing::info!(user_id = %current_user.0.user_id, "user logged out");
    Json(ApiResponse::with_message((), "Logged out"))
}
