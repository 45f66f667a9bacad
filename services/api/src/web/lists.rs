//! services/api/src/web/lists.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use lucid_lists_core::domain::{ResourceRef, Session};
use lucid_lists_core::dto::{
    CreateListRequest, ListView, TaskView, UpdateListRequest, UpdatePositionRequest,
};
use lucid_lists_core::patch::ListPatch;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;

/// GET /api/projects/{project_uid}/lists - Lists of a project in position order
#[utoipa::path(
    get,
    path = "/api/projects/{project_uid}/lists",
    tag = "lists",
    security(("bearer" = [])),
    params(("project_uid" = Uuid, Path, description = "Project uid")),
    responses(
        (status = 200, description = "Active lists", body = [ListView]),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active project", body = ErrorBody)
    )
)]
pub async fn project_lists_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(project_uid): Path<Uuid>,
) -> Result<Json<Vec<ListView>>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Project(project_uid)).await?;
    Ok(Json(services.lists.get_lists_by_project(project_uid).await?))
}

/// POST /api/lists - Create a list, appended after its siblings unless a position is given
#[utoipa::path(
    post,
    path = "/api/lists",
    tag = "lists",
    security(("bearer" = [])),
    request_body = CreateListRequest,
    responses(
        (status = 201, description = "List created", body = ListView),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 403, description = "Not a member of the target project", body = ErrorBody),
        (status = 404, description = "No such active project", body = ErrorBody)
    )
)]
pub async fn create_list_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateListRequest>,
) -> Result<(StatusCode, Json<ListView>), ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Project(req.project_uid)).await?;
    let list = services.lists.create_list(req, &session).await?;
    Ok((StatusCode::CREATED, Json(list)))
}

/// GET /api/lists/{list_uid}
#[utoipa::path(
    get,
    path = "/api/lists/{list_uid}",
    tag = "lists",
    security(("bearer" = [])),
    params(("list_uid" = Uuid, Path, description = "List uid")),
    responses(
        (status = 200, description = "The list", body = ListView),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active list", body = ErrorBody)
    )
)]
pub async fn get_list_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(list_uid): Path<Uuid>,
) -> Result<Json<ListView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::List(list_uid)).await?;
    Ok(Json(services.lists.get_list(list_uid).await?))
}

/// PUT /api/lists/{list_uid} - Replace name and color
#[utoipa::path(
    put,
    path = "/api/lists/{list_uid}",
    tag = "lists",
    security(("bearer" = [])),
    params(("list_uid" = Uuid, Path, description = "List uid")),
    request_body = UpdateListRequest,
    responses(
        (status = 200, description = "Updated list", body = ListView),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active list", body = ErrorBody)
    )
)]
pub async fn update_list_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(list_uid): Path<Uuid>,
    Json(req): Json<UpdateListRequest>,
) -> Result<Json<ListView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::List(list_uid)).await?;
    Ok(Json(services.lists.update_list(list_uid, req, &session).await?))
}

/// PATCH /api/lists/{list_uid} - Sparse update
#[utoipa::path(
    patch,
    path = "/api/lists/{list_uid}",
    tag = "lists",
    security(("bearer" = [])),
    params(("list_uid" = Uuid, Path, description = "List uid")),
    request_body = ListPatch,
    responses(
        (status = 200, description = "Updated list", body = ListView),
        (status = 400, description = "Invalid input or no fields to update", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active list", body = ErrorBody)
    )
)]
pub async fn patch_list_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(list_uid): Path<Uuid>,
    Json(patch): Json<ListPatch>,
) -> Result<Json<ListView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::List(list_uid)).await?;
    Ok(Json(
        services.lists.partial_update_list(list_uid, patch, &session).await?,
    ))
}

/// PUT /api/lists/{list_uid}/position - Store an explicit position; siblings are not renumbered
#[utoipa::path(
    put,
    path = "/api/lists/{list_uid}/position",
    tag = "lists",
    security(("bearer" = [])),
    params(("list_uid" = Uuid, Path, description = "List uid")),
    request_body = UpdatePositionRequest,
    responses(
        (status = 200, description = "Updated list", body = ListView),
        (status = 400, description = "Negative position", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active list", body = ErrorBody)
    )
)]
pub async fn update_list_position_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(list_uid): Path<Uuid>,
    Json(req): Json<UpdatePositionRequest>,
) -> Result<Json<ListView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::List(list_uid)).await?;
    Ok(Json(
        services
            .lists
            .update_position(list_uid, req.position, &session)
            .await?,
    ))
}

/// DELETE /api/lists/{list_uid} - Soft delete; the list's tasks are left as they are
#[utoipa::path(
    delete,
    path = "/api/lists/{list_uid}",
    tag = "lists",
    security(("bearer" = [])),
    params(("list_uid" = Uuid, Path, description = "List uid")),
    responses(
        (status = 200, description = "List deleted", body = MessageResponse),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active list", body = ErrorBody)
    )
)]
pub async fn delete_list_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(list_uid): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::List(list_uid)).await?;
    services.lists.delete_list(list_uid, &session).await?;
    Ok(Json(MessageResponse::new("List deleted successfully")))
}

/// GET /api/lists/{list_uid}/tasks - Tasks of a list in position order
#[utoipa::path(
    get,
    path = "/api/lists/{list_uid}/tasks",
    tag = "lists",
    security(("bearer" = [])),
    params(("list_uid" = Uuid, Path, description = "List uid")),
    responses(
        (status = 200, description = "Active tasks", body = [TaskView]),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active list", body = ErrorBody)
    )
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(list_uid): Path<Uuid>,
) -> Result<Json<Vec<TaskView>>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::List(list_uid)).await?;
    Ok(Json(services.tasks.get_tasks_by_list(list_uid).await?))
}
