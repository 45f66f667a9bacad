//! services/api/src/web/rest.rs
//!
//! Contains the shared REST payloads, the health probe and the master definition for
//! the OpenAPI specification.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use crate::error::ErrorBody;
use crate::web::{auth, canvas, chat, folders, lists, notes, projects, settings, tasks};
use lucid_lists_core::{domain, dto, note_content, patch};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    info(title = "Lucid Lists API", description = "Projects, boards, notes and chat for small teams."),
    paths(
        health_handler,
        auth::register_handler,
        auth::login_handler,
        auth::me_handler,
        projects::list_projects_handler,
        projects::create_project_handler,
        projects::get_project_handler,
        projects::update_project_handler,
        projects::patch_project_handler,
        projects::delete_project_handler,
        projects::project_progress_handler,
        projects::project_with_lists_handler,
        projects::list_members_handler,
        projects::add_member_handler,
        lists::project_lists_handler,
        lists::create_list_handler,
        lists::get_list_handler,
        lists::update_list_handler,
        lists::patch_list_handler,
        lists::update_list_position_handler,
        lists::delete_list_handler,
        lists::list_tasks_handler,
        tasks::create_task_handler,
        tasks::get_task_handler,
        tasks::update_task_handler,
        tasks::patch_task_handler,
        tasks::move_task_handler,
        tasks::delete_task_handler,
        canvas::get_canvas_handler,
        canvas::update_canvas_handler,
        canvas::delete_canvas_handler,
        notes::project_notes_handler,
        notes::create_note_handler,
        notes::get_note_handler,
        notes::update_note_handler,
        notes::patch_note_handler,
        notes::move_note_handler,
        notes::delete_note_handler,
        folders::project_folders_handler,
        folders::create_folder_handler,
        folders::get_folder_handler,
        folders::update_folder_handler,
        folders::patch_folder_handler,
        folders::delete_folder_handler,
        chat::list_conversations_handler,
        chat::create_conversation_handler,
        chat::get_conversation_handler,
        chat::rename_conversation_handler,
        chat::delete_conversation_handler,
        chat::create_message_handler,
        settings::get_settings_handler,
        settings::update_settings_handler,
        settings::reset_settings_handler,
    ),
    components(
        schemas(
            ErrorBody,
            MessageResponse,
            HealthResponse,
            domain::ProjectStatus,
            domain::TaskStatus,
            domain::Priority,
            domain::MemberRole,
            domain::MessageType,
            domain::Theme,
            domain::Language,
            note_content::NoteContent,
            note_content::NoteBlock,
            note_content::BlockType,
            note_content::BlockMetadata,
            note_content::ChecklistItem,
            dto::RegisterRequest,
            dto::LoginRequest,
            dto::UserView,
            dto::AuthResponse,
            dto::CreateProjectRequest,
            dto::UpdateProjectRequest,
            dto::ProjectView,
            dto::TaskStats,
            dto::ProjectProgressView,
            dto::ProjectWithStatsView,
            dto::ProjectWithListsView,
            dto::AddMemberRequest,
            dto::MemberView,
            dto::CreateListRequest,
            dto::UpdateListRequest,
            dto::UpdatePositionRequest,
            dto::ListView,
            dto::ListWithTasksView,
            dto::CreateTaskRequest,
            dto::UpdateTaskRequest,
            dto::MoveTaskRequest,
            dto::TaskView,
            dto::UpdateCanvasRequest,
            dto::CanvasView,
            dto::CreateNoteRequest,
            dto::UpdateNoteRequest,
            dto::MoveNoteRequest,
            dto::NoteView,
            dto::NotesListView,
            dto::CreateFolderRequest,
            dto::UpdateFolderRequest,
            dto::FolderView,
            dto::FoldersListView,
            dto::CreateConversationRequest,
            dto::RenameConversationRequest,
            dto::CreateMessageRequest,
            dto::ConversationView,
            dto::MessageView,
            dto::ConversationWithMessagesView,
            dto::SettingsView,
            patch::ProjectPatch,
            patch::ListPatch,
            patch::TaskPatch,
            patch::NotePatch,
            patch::FolderPatch,
            patch::SettingsPatch,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness probe."),
        (name = "auth", description = "Registration, login and the current user."),
        (name = "projects", description = "Projects, their progress and membership."),
        (name = "lists", description = "Ordered task lists inside a project."),
        (name = "tasks", description = "Tasks inside a list."),
        (name = "canvas", description = "The brainstorm canvas of a project."),
        (name = "notes", description = "Block-structured notes."),
        (name = "folders", description = "Folders that organise notes."),
        (name = "chat", description = "Project chat conversations and messages."),
        (name = "settings", description = "Per-user preferences.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by every protected path.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Acknowledgement returned by delete endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// GET /health - Liveness probe; does not touch the database
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
    })
}
