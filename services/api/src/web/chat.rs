//! services/api/src/web/chat.rs
//!
//! Chat conversations of a project and their messages.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use lucid_lists_core::domain::{ResourceRef, Session};
use lucid_lists_core::dto::{
    ConversationView, ConversationWithMessagesView, CreateConversationRequest,
    CreateMessageRequest, MessageView, RenameConversationRequest,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;

/// GET /api/projects/{project_uid}/conversations - Most recently updated first
#[utoipa::path(
    get,
    path = "/api/projects/{project_uid}/conversations",
    tag = "chat",
    security(("bearer" = [])),
    params(("project_uid" = Uuid, Path, description = "Project uid")),
    responses(
        (status = 200, description = "Active conversations", body = [ConversationView]),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active project", body = ErrorBody)
    )
)]
pub async fn list_conversations_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(project_uid): Path<Uuid>,
) -> Result<Json<Vec<ConversationView>>, ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Project(project_uid)).await?;
    Ok(Json(services.chat.get_conversations(project_uid).await?))
}

/// POST /api/projects/{project_uid}/conversations
///
/// When the project is at capacity the least recently updated conversation is retired.
#[utoipa::path(
    post,
    path = "/api/projects/{project_uid}/conversations",
    tag = "chat",
    security(("bearer" = [])),
    params(("project_uid" = Uuid, Path, description = "Project uid")),
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversation created", body = ConversationView),
        (status = 400, description = "Invalid name", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active project", body = ErrorBody)
    )
)]
pub async fn create_conversation_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(project_uid): Path<Uuid>,
    Json(req): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<ConversationView>), ApiError> {
    let services = &state.services;
    services.access.authorize(&session, ResourceRef::Project(project_uid)).await?;
    let conversation = services
        .chat
        .create_conversation(project_uid, req, &session)
        .await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

/// GET /api/conversations/{conversation_uid} - The conversation with its messages, oldest first
#[utoipa::path(
    get,
    path = "/api/conversations/{conversation_uid}",
    tag = "chat",
    security(("bearer" = [])),
    params(("conversation_uid" = Uuid, Path, description = "Conversation uid")),
    responses(
        (status = 200, description = "Conversation and messages", body = ConversationWithMessagesView),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active conversation", body = ErrorBody)
    )
)]
pub async fn get_conversation_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(conversation_uid): Path<Uuid>,
) -> Result<Json<ConversationWithMessagesView>, ApiError> {
    let services = &state.services;
    services
        .access
        .authorize(&session, ResourceRef::Conversation(conversation_uid))
        .await?;
    Ok(Json(
        services
            .chat
            .get_conversation_with_messages(conversation_uid)
            .await?,
    ))
}

/// PATCH /api/conversations/{conversation_uid} - Rename
#[utoipa::path(
    patch,
    path = "/api/conversations/{conversation_uid}",
    tag = "chat",
    security(("bearer" = [])),
    params(("conversation_uid" = Uuid, Path, description = "Conversation uid")),
    request_body = RenameConversationRequest,
    responses(
        (status = 200, description = "Renamed conversation", body = ConversationView),
        (status = 400, description = "Invalid name", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active conversation", body = ErrorBody)
    )
)]
pub async fn rename_conversation_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(conversation_uid): Path<Uuid>,
    Json(req): Json<RenameConversationRequest>,
) -> Result<Json<ConversationView>, ApiError> {
    let services = &state.services;
    services
        .access
        .authorize(&session, ResourceRef::Conversation(conversation_uid))
        .await?;
    Ok(Json(
        services
            .chat
            .rename_conversation(conversation_uid, req, &session)
            .await?,
    ))
}

/// DELETE /api/conversations/{conversation_uid} - Permanent, messages included
#[utoipa::path(
    delete,
    path = "/api/conversations/{conversation_uid}",
    tag = "chat",
    security(("bearer" = [])),
    params(("conversation_uid" = Uuid, Path, description = "Conversation uid")),
    responses(
        (status = 200, description = "Conversation deleted", body = MessageResponse),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active conversation", body = ErrorBody)
    )
)]
pub async fn delete_conversation_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(conversation_uid): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let services = &state.services;
    services
        .access
        .authorize(&session, ResourceRef::Conversation(conversation_uid))
        .await?;
    services.chat.delete_conversation(conversation_uid).await?;
    Ok(Json(MessageResponse::new("Conversation deleted successfully")))
}

/// POST /api/conversations/{conversation_uid}/messages
#[utoipa::path(
    post,
    path = "/api/conversations/{conversation_uid}/messages",
    tag = "chat",
    security(("bearer" = [])),
    params(("conversation_uid" = Uuid, Path, description = "Conversation uid")),
    request_body = CreateMessageRequest,
    responses(
        (status = 201, description = "Message stored", body = MessageView),
        (status = 400, description = "Unknown message type or empty content", body = ErrorBody),
        (status = 403, description = "Not a member", body = ErrorBody),
        (status = 404, description = "No such active conversation", body = ErrorBody)
    )
)]
pub async fn create_message_handler(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(conversation_uid): Path<Uuid>,
    Json(req): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<MessageView>), ApiError> {
    let services = &state.services;
    services
        .access
        .authorize(&session, ResourceRef::Conversation(conversation_uid))
        .await?;
    let message = services
        .chat
        .create_message(conversation_uid, req, &session)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}
