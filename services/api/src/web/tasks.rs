//! services/api/src/web/tasks.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use lucid_lists_core::domain::{ResourceRef, Session};
use lucid_lists_core::dto::{CreateTaskRequest, MoveTaskRequest, TaskView, UpdateTaskRequest};
use lucid_lists_core::patch::TaskPatch;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;

/// POST /api/tasks
#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "tasks",
    security(("bearer" = [])),
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskView),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 403, description = "Not a member of the list's project", body = ErrorBody),
        (status = 404, description = "No such active list", body = ErrorBody)
    )
)]
pub async fn create_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskView>), ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::List(req.list_uid)).await?;
    let task = services.tasks.create_task(req, &session).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /api/tasks/{task_uid}
#[utoipa::path(
    get,
    path = "/api/tasks/{task_uid}",
    tag = "tasks",
    security(("bearer" = [])),
    params(("task_uid" = Uuid, Path, description = "Task uid")),
    responses(
        (status = 200, description = "The task", body = TaskView),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active task", body = ErrorBody)
    )
)]
pub async fn get_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(task_uid): Path<Uuid>,
) -> Result<Json<TaskView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Task(task_uid)).await?;
    Ok(Json(services.tasks.get_task(task_uid).await?))
}

/// PUT /api/tasks/{task_uid} - Full replacement
///
/// `completed_at` is stamped when the task becomes completed, kept while it stays
/// completed and cleared otherwise.
#[utoipa::path(
    put,
    path = "/api/tasks/{task_uid}",
    tag = "tasks",
    security(("bearer" = [])),
    params(("task_uid" = Uuid, Path, description = "Task uid")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Updated task", body = TaskView),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active task", body = ErrorBody)
    )
)]
pub async fn update_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(task_uid): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<TaskView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Task(task_uid)).await?;
    Ok(Json(services.tasks.update_task(task_uid, req, &session).await?))
}

/// PATCH /api/tasks/{task_uid} - Sparse update
#[utoipa::path(
    patch,
    path = "/api/tasks/{task_uid}",
    tag = "tasks",
    security(("bearer" = [])),
    params(("task_uid" = Uuid, Path, description = "Task uid")),
    request_body = TaskPatch,
    responses(
        (status = 200, description = "Updated task", body = TaskView),
        (status = 400, description = "Invalid input or no fields to update", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active task", body = ErrorBody)
    )
)]
pub async fn patch_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(task_uid): Path<Uuid>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<TaskView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Task(task_uid)).await?;
    Ok(Json(
        services.tasks.partial_update_task(task_uid, patch, &session).await?,
    ))
}

/// PUT /api/tasks/{task_uid}/move - Move a task to another list of the same project
#[utoipa::path(
    put,
    path = "/api/tasks/{task_uid}/move",
    tag = "tasks",
    security(("bearer" = [])),
    params(("task_uid" = Uuid, Path, description = "Task uid")),
    request_body = MoveTaskRequest,
    responses(
        (status = 200, description = "Moved task", body = TaskView),
        (status = 400, description = "Target list belongs to another project", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active task or list", body = ErrorBody)
    )
)]
pub async fn move_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(task_uid): Path<Uuid>,
    Json(req): Json<MoveTaskRequest>,
) -> Result<Json<TaskView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Task(task_uid)).await?;
    services.access.authorize(&session, ResourceRef::List(req.list_uid)).await?;
    Ok(Json(services.tasks.move_task(task_uid, req, &session).await?))
}

/// DELETE /api/tasks/{task_uid} - Soft delete
#[utoipa::path(
    delete,
    path = "/api/tasks/{task_uid}",
    tag = "tasks",
    security(("bearer" = [])),
    params(("task_uid" = Uuid, Path, description = "Task uid")),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active task", body = ErrorBody)
    )
)]
pub async fn delete_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(task_uid): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Task(task_uid)).await?;
    services.tasks.delete_task(task_uid, &session).await?;
    Ok(Json(MessageResponse::new("Task deleted successfully")))
}
