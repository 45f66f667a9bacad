//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration, login and the current user.

use axum::{extract::State, http::StatusCode, Extension, Json};
use lucid_lists_core::domain::Session;
use lucid_lists_core::dto::{AuthResponse, LoginRequest, RegisterRequest, UserView};
use std::sync::Arc;
use tracing::info;

use crate::error::{ApiError, ErrorBody};
use crate::web::state::AppState;

/// POST /api/auth/register - Create a new account and sign it in
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid name, email or password", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let response = state.services.access.register(req).await?;
    info!(user_uid = %response.user.user_uid, "user registered");
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login - Exchange credentials for a session token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    Ok(Json(state.services.access.login(req).await?))
}

/// GET /api/auth/me - The user behind the bearer token
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current user", body = UserView),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<UserView>, ApiError> {
    Ok(Json(state.services.access.current_user(&session).await?))
}
