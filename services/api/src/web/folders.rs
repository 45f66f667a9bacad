//! services/api/src/web/folders.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use lucid_lists_core::domain::{ResourceRef, Session};
use lucid_lists_core::dto::{CreateFolderRequest, FolderView, FoldersListView, UpdateFolderRequest};
use lucid_lists_core::patch::FolderPatch;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;

/// GET /api/projects/{project_uid}/folders
#[utoipa::path(
    get,
    path = "/api/projects/{project_uid}/folders",
    tag = "folders",
    security(("bearer" = [])),
    params(("project_uid" = Uuid, Path, description = "Project uid")),
    responses(
        (status = 200, description = "Active folders in position order", body = FoldersListView),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active project", body = ErrorBody)
    )
)]
pub async fn project_folders_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(project_uid): Path<Uuid>,
) -> Result<Json<FoldersListView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Project(project_uid)).await?;
    Ok(Json(services.folders.get_folders_by_project(project_uid).await?))
}

/// POST /api/folders
#[utoipa::path(
    post,
    path = "/api/folders",
    tag = "folders",
    security(("bearer" = [])),
    request_body = CreateFolderRequest,
    responses(
        (status = 201, description = "Folder created", body = FolderView),
        (status = 400, description = "Invalid input or parent of another project", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active project or parent", body = ErrorBody)
    )
)]
pub async fn create_folder_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<FolderView>), ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Project(req.project_uid)).await?;
    let folder = services.folders.create_folder(req, &session).await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

/// GET /api/folders/{folder_uid}
#[utoipa::path(
    get,
    path = "/api/folders/{folder_uid}",
    tag = "folders",
    security(("bearer" = [])),
    params(("folder_uid" = Uuid, Path, description = "Folder uid")),
    responses(
        (status = 200, description = "The folder", body = FolderView),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active folder", body = ErrorBody)
    )
)]
pub async fn get_folder_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(folder_uid): Path<Uuid>,
) -> Result<Json<FolderView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Folder(folder_uid)).await?;
    Ok(Json(services.folders.get_folder(folder_uid).await?))
}

/// PUT /api/folders/{folder_uid} - Replace name, parent and position
#[utoipa::path(
    put,
    path = "/api/folders/{folder_uid}",
    tag = "folders",
    security(("bearer" = [])),
    params(("folder_uid" = Uuid, Path, description = "Folder uid")),
    request_body = UpdateFolderRequest,
    responses(
        (status = 200, description = "Updated folder", body = FolderView),
        (status = 400, description = "Invalid input or cyclic parent", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active folder", body = ErrorBody)
    )
)]
pub async fn update_folder_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(folder_uid): Path<Uuid>,
    Json(req): Json<UpdateFolderRequest>,
) -> Result<Json<FolderView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Folder(folder_uid)).await?;
    Ok(Json(
        services.folders.update_folder(folder_uid, req, &session).await?,
    ))
}

/// PATCH /api/folders/{folder_uid} - Sparse update
#[utoipa::path(
    patch,
    path = "/api/folders/{folder_uid}",
    tag = "folders",
    security(("bearer" = [])),
    params(("folder_uid" = Uuid, Path, description = "Folder uid")),
    request_body = FolderPatch,
    responses(
        (status = 200, description = "Updated folder", body = FolderView),
        (status = 400, description = "Invalid input, cyclic parent or no fields to update", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active folder", body = ErrorBody)
    )
)]
pub async fn patch_folder_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(folder_uid): Path<Uuid>,
    Json(patch): Json<FolderPatch>,
) -> Result<Json<FolderView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Folder(folder_uid)).await?;
    Ok(Json(
        services
            .folders
            .partial_update_folder(folder_uid, patch, &session)
            .await?,
    ))
}

/// DELETE /api/folders/{folder_uid} - Soft delete; contained notes keep their folder reference
#[utoipa::path(
    delete,
    path = "/api/folders/{folder_uid}",
    tag = "folders",
    security(("bearer" = [])),
    params(("folder_uid" = Uuid, Path, description = "Folder uid")),
    responses(
        (status = 200, description = "Folder deleted", body = MessageResponse),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active folder", body = ErrorBody)
    )
)]
pub async fn delete_folder_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(folder_uid): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Folder(folder_uid)).await?;
    services.folders.delete_folder(folder_uid, &session).await?;
    Ok(Json(MessageResponse::new("Folder deleted successfully")))
}
