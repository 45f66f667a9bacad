//! services/api/src/web/settings.rs
//!
//! Per-user preferences. No project membership is involved; the session alone decides
//! whose settings are read.

use axum::{extract::State, Extension, Json};
use lucid_lists_core::domain::Session;
use lucid_lists_core::dto::SettingsView;
use lucid_lists_core::patch::SettingsPatch;
use std::sync::Arc;

use crate::error::{ApiError, ErrorBody};
use crate::web::state::AppState;

/// GET /api/settings - Initialised with defaults on first read
#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "settings",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current settings", body = SettingsView),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
pub async fn get_settings_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<SettingsView>, ApiError> {
    Ok(Json(state.services.settings.get_settings(&session).await?))
}

/// PATCH /api/settings - Sparse update
#[utoipa::path(
    patch,
    path = "/api/settings",
    tag = "settings",
    security(("bearer" = [])),
    request_body = SettingsPatch,
    responses(
        (status = 200, description = "Updated settings", body = SettingsView),
        (status = 400, description = "Invalid value or no fields to update", body = ErrorBody)
    )
)]
pub async fn update_settings_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<SettingsView>, ApiError> {
    Ok(Json(
        state.services.settings.update_settings(&session, patch).await?,
    ))
}

/// POST /api/settings/reset - Back to the defaults
#[utoipa::path(
    post,
    path = "/api/settings/reset",
    tag = "settings",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Default settings", body = SettingsView)
    )
)]
pub async fn reset_settings_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<SettingsView>, ApiError> {
    Ok(Json(state.services.settings.reset_settings(&session).await?))
}
