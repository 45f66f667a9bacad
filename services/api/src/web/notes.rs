//! services/api/src/web/notes.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use lucid_lists_core::domain::{ResourceRef, Session};
use lucid_lists_core::dto::{
    CreateNoteRequest, MoveNoteRequest, NoteView, NotesListView, UpdateNoteRequest,
};
use lucid_lists_core::patch::NotePatch;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;

/// GET /api/projects/{project_uid}/notes
#[utoipa::path(
    get,
    path = "/api/projects/{project_uid}/notes",
    tag = "notes",
    security(("bearer" = [])),
    params(("project_uid" = Uuid, Path, description = "Project uid")),
    responses(
        (status = 200, description = "Active notes in position order", body = NotesListView),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active project", body = ErrorBody)
    )
)]
pub async fn project_notes_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(project_uid): Path<Uuid>,
) -> Result<Json<NotesListView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Project(project_uid)).await?;
    Ok(Json(services.notes.get_notes_by_project(project_uid).await?))
}

/// POST /api/notes
#[utoipa::path(
    post,
    path = "/api/notes",
    tag = "notes",
    security(("bearer" = [])),
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created", body = NoteView),
        (status = 400, description = "Invalid input or folder of another project", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active project or folder", body = ErrorBody)
    )
)]
pub async fn create_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<NoteView>), ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Project(req.project_uid)).await?;
    let note = services.notes.create_note(req, &session).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /api/notes/{note_uid}
#[utoipa::path(
    get,
    path = "/api/notes/{note_uid}",
    tag = "notes",
    security(("bearer" = [])),
    params(("note_uid" = Uuid, Path, description = "Note uid")),
    responses(
        (status = 200, description = "The note", body = NoteView),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active note", body = ErrorBody)
    )
)]
pub async fn get_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(note_uid): Path<Uuid>,
) -> Result<Json<NoteView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Note(note_uid)).await?;
    Ok(Json(services.notes.get_note(note_uid).await?))
}

/// PUT /api/notes/{note_uid} - Replace title and content
#[utoipa::path(
    put,
    path = "/api/notes/{note_uid}",
    tag = "notes",
    security(("bearer" = [])),
    params(("note_uid" = Uuid, Path, description = "Note uid")),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Updated note", body = NoteView),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active note", body = ErrorBody)
    )
)]
pub async fn update_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(note_uid): Path<Uuid>,
    Json(req): Json<UpdateNoteRequest>,
) -> Result<Json<NoteView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Note(note_uid)).await?;
    Ok(Json(services.notes.update_note(note_uid, req, &session).await?))
}

/// PATCH /api/notes/{note_uid} - Sparse update
#[utoipa::path(
    patch,
    path = "/api/notes/{note_uid}",
    tag = "notes",
    security(("bearer" = [])),
    params(("note_uid" = Uuid, Path, description = "Note uid")),
    request_body = NotePatch,
    responses(
        (status = 200, description = "Updated note", body = NoteView),
        (status = 400, description = "Invalid input or no fields to update", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active note or folder", body = ErrorBody)
    )
)]
pub async fn patch_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(note_uid): Path<Uuid>,
    Json(patch): Json<NotePatch>,
) -> Result<Json<NoteView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Note(note_uid)).await?;
    Ok(Json(
        services.notes.partial_update_note(note_uid, patch, &session).await?,
    ))
}

/// PUT /api/notes/{note_uid}/move - File a note into a folder, or back to the root with `null`
#[utoipa::path(
    put,
    path = "/api/notes/{note_uid}/move",
    tag = "notes",
    security(("bearer" = [])),
    params(("note_uid" = Uuid, Path, description = "Note uid")),
    request_body = MoveNoteRequest,
    responses(
        (status = 200, description = "Moved note", body = NoteView),
        (status = 400, description = "Folder belongs to another project", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active note or folder", body = ErrorBody)
    )
)]
pub async fn move_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(note_uid): Path<Uuid>,
    Json(req): Json<MoveNoteRequest>,
) -> Result<Json<NoteView>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Note(note_uid)).await?;
    Ok(Json(
        services.notes.move_note_to_folder(note_uid, req, &session).await?,
    ))
}

/// DELETE /api/notes/{note_uid} - Soft delete
#[utoipa::path(
    delete,
    path = "/api/notes/{note_uid}",
    tag = "notes",
    security(("bearer" = [])),
    params(("note_uid" = Uuid, Path, description = "Note uid")),
    responses(
        (status = 200, description = "Note deleted", body = MessageResponse),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active note", body = ErrorBody)
    )
)]
pub async fn delete_note_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(note_uid): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Note(note_uid)).await?;
    services.notes.delete_note(note_uid, &session).await?;
    Ok(Json(MessageResponse::new("Note deleted successfully")))
}
