//! services/api/src/web/projects.rs
//!
//! Project endpoints. Every handler except listing and creation first checks that the
//! caller is a member of the addressed project.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use lucid_lists_core::domain::{ResourceRef, Session};
use lucid_lists_core::dto::{
    AddMemberRequest, CreateProjectRequest, MemberView, ProjectProgressView, ProjectView,
    ProjectWithListsView, ProjectWithStatsView, UpdateProjectRequest,
};
use lucid_lists_core::patch::ProjectPatch;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;

/// GET /api/projects - Every project the caller is a member of, with task statistics
#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "projects",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Projects in display order", body = [ProjectWithStatsView]),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    )
)]
pub async fn list_projects_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<ProjectWithStatsView>>, ApiError> {
    Ok(Json(state.services.projects.get_all_projects(&session).await?))
}

/// POST /api/projects - Create a project owned by the caller
#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "projects",
    security(("bearer" = [])),
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectView),
        (status = 400, description = "Invalid input", body = ErrorBody)
    )
)]
pub async fn create_project_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectView>), ApiError> {
    let project = state.services.projects.create_project(req, &session).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// GET /api/projects/{project_uid}
#[utoipa::path(
    get,
    path = "/api/projects/{project_uid}",
    tag = "projects",
    security(("bearer" = [])),
    params(("project_uid" = Uuid, Path, description = "Project uid")),
    responses(
        (status = 200, description = "The project", body = ProjectView),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active project", body = ErrorBody)
    )
)]
pub async fn get_project_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(project_uid): Path<Uuid>,
) -> Result<Json<ProjectView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Project(project_uid)).await?;
    Ok(Json(services.projects.get_project(project_uid).await?))
}

/// PUT /api/projects/{project_uid} - Replace the project's editable fields
#[utoipa::path(
    put,
    path = "/api/projects/{project_uid}",
    tag = "projects",
    security(("bearer" = [])),
    params(("project_uid" = Uuid, Path, description = "Project uid")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Updated project", body = ProjectView),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active project", body = ErrorBody)
    )
)]
pub async fn update_project_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(project_uid): Path<Uuid>,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Project(project_uid)).await?;
    Ok(Json(
        services.projects.update_project(project_uid, req, &session).await?,
    ))
}

/// PATCH /api/projects/{project_uid} - Sparse update; absent keys are left untouched
#[utoipa::path(
    patch,
    path = "/api/projects/{project_uid}",
    tag = "projects",
    security(("bearer" = [])),
    params(("project_uid" = Uuid, Path, description = "Project uid")),
    request_body = ProjectPatch,
    responses(
        (status = 200, description = "Updated project", body = ProjectView),
        (status = 400, description = "Invalid input or no fields to update", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active project", body = ErrorBody)
    )
)]
pub async fn patch_project_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(project_uid): Path<Uuid>,
    Json(patch): Json<ProjectPatch>,
) -> Result<Json<ProjectView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Project(project_uid)).await?;
    Ok(Json(
        services
            .projects
            .partial_update_project(project_uid, patch, &session)
            .await?,
    ))
}

/// DELETE /api/projects/{project_uid} - Soft delete
#[utoipa::path(
    delete,
    path = "/api/projects/{project_uid}",
    tag = "projects",
    security(("bearer" = [])),
    params(("project_uid" = Uuid, Path, description = "Project uid")),
    responses(
        (status = 200, description = "Project deleted", body = MessageResponse),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active project", body = ErrorBody)
    )
)]
pub async fn delete_project_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(project_uid): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Project(project_uid)).await?;
    services.projects.delete_project(project_uid, &session).await?;
    Ok(Json(MessageResponse::new("Project deleted successfully")))
}

/// GET /api/projects/{project_uid}/progress - Task completion statistics
#[utoipa::path(
    get,
    path = "/api/projects/{project_uid}/progress",
    tag = "projects",
    security(("bearer" = [])),
    params(("project_uid" = Uuid, Path, description = "Project uid")),
    responses(
        (status = 200, description = "Progress statistics", body = ProjectProgressView),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active project", body = ErrorBody)
    )
)]
pub async fn project_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(project_uid): Path<Uuid>,
) -> Result<Json<ProjectProgressView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Project(project_uid)).await?;
    Ok(Json(services.projects.get_project_progress(project_uid).await?))
}

/// GET /api/projects/{project_uid}/with-lists - The project with its lists and their tasks
#[utoipa::path(
    get,
    path = "/api/projects/{project_uid}/with-lists",
    tag = "projects",
    security(("bearer" = [])),
    params(("project_uid" = Uuid, Path, description = "Project uid")),
    responses(
        (status = 200, description = "Project board", body = ProjectWithListsView),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active project", body = ErrorBody)
    )
)]
pub async fn project_with_lists_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(project_uid): Path<Uuid>,
) -> Result<Json<ProjectWithListsView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Project(project_uid)).await?;
    Ok(Json(services.projects.get_project_with_lists(project_uid).await?))
}

/// GET /api/projects/{project_uid}/members
#[utoipa::path(
    get,
    path = "/api/projects/{project_uid}/members",
    tag = "projects",
    security(("bearer" = [])),
    params(("project_uid" = Uuid, Path, description = "Project uid")),
    responses(
        (status = 200, description = "Members by join time", body = [MemberView]),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active project", body = ErrorBody)
    )
)]
pub async fn list_members_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(project_uid): Path<Uuid>,
) -> Result<Json<Vec<MemberView>>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Project(project_uid)).await?;
    Ok(Json(services.projects.get_members(project_uid).await?))
}

/// POST /api/projects/{project_uid}/members - Add a registered user by email
#[utoipa::path(
    post,
    path = "/api/projects/{project_uid}/members",
    tag = "projects",
    security(("bearer" = [])),
    params(("project_uid" = Uuid, Path, description = "Project uid")),
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Member added", body = MemberView),
        (status = 400, description = "Already a member or invalid role", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such project or user", body = ErrorBody)
    )
)]
pub async fn add_member_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(project_uid): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<MemberView>), ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Project(project_uid)).await?;
    let member = services.projects.add_member_by_email(project_uid, req).await?;
    Ok((StatusCode::CREATED, Json(member)))
}
