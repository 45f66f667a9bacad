//! services/api/src/web/canvas.rs
//!
//! The per-project brainstorm canvas. Reading a project that has none creates the
//! empty default.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use lucid_lists_core::domain::{ResourceRef, Session};
use lucid_lists_core::dto::{CanvasView, UpdateCanvasRequest};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;

/// GET /api/projects/{project_uid}/canvas
#[utoipa::path(
    get,
    path = "/api/projects/{project_uid}/canvas",
    tag = "canvas",
    security(("bearer" = [])),
    params(("project_uid" = Uuid, Path, description = "Project uid")),
    responses(
        (status = 200, description = "Canvas state", body = CanvasView),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active project", body = ErrorBody)
    )
)]
pub async fn get_canvas_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(project_uid): Path<Uuid>,
) -> Result<Json<CanvasView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Project(project_uid)).await?;
    Ok(Json(services.canvas.get_canvas(project_uid, &session).await?))
}

/// PUT /api/projects/{project_uid}/canvas - Replace the stored state
#[utoipa::path(
    put,
    path = "/api/projects/{project_uid}/canvas",
    tag = "canvas",
    security(("bearer" = [])),
    params(("project_uid" = Uuid, Path, description = "Project uid")),
    request_body = UpdateCanvasRequest,
    responses(
        (status = 200, description = "Updated canvas", body = CanvasView),
        (status = 400, description = "State is not valid JSON", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active project", body = ErrorBody)
    )
)]
pub async fn update_canvas_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(project_uid): Path<Uuid>,
    Json(req): Json<UpdateCanvasRequest>,
) -> Result<Json<CanvasView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Project(project_uid)).await?;
    Ok(Json(
        services.canvas.update_canvas(project_uid, req, &session).await?,
    ))
}

/// DELETE /api/projects/{project_uid}/canvas
#[utoipa::path(
    delete,
    path = "/api/projects/{project_uid}/canvas",
    tag = "canvas",
    security(("bearer" = [])),
    params(("project_uid" = Uuid, Path, description = "Project uid")),
    responses(
        (status = 200, description = "Canvas deleted", body = MessageResponse),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "Project has no active canvas", body = ErrorBody)
    )
)]
pub async fn delete_canvas_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(project_uid): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Project(project_uid)).await?;
    services.canvas.delete_canvas(project_uid, &session).await?;
    Ok(Json(MessageResponse::new("Canvas deleted successfully")))
}
