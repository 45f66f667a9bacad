//! crates/lucid_lists_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the relational store, the password hasher and the token signer.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Canvas, ChatConversation, ChatMessage, InternalId, List, MemberRole, NewConversation,
    NewList, NewMessage, NewNote, NewNoteFolder, NewProject, NewTask, NewUser, NewUserSettings,
    Note, NoteFolder, Project, ProjectMember, ResourceRef, Session, Task, TaskCounts, User,
    UserSettings,
};
use crate::patch::{
    Changes, FolderField, ListField, NoteField, ProjectField, SettingsField, TaskField,
};
use crate::position::SiblingScope;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, hashing).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("No fields to update")]
    NoFieldsToUpdate,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Entity Store Ports (Traits)
//=========================================================================================
//
// Every `get_*` and `*_by_*` read filters on `is_active = true`. Every `update_*`
// returns `NotFound` when no active row matched, and every `delete_*` is a soft delete
// unless documented otherwise.

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    async fn create_user(&self, user: NewUser) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: InternalId) -> PortResult<User>;
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Inserts the project and its creator's `owner` membership in one transaction.
    async fn create_project_with_owner(&self, project: NewProject) -> PortResult<Project>;

    async fn get_project_by_uid(&self, project_uid: Uuid) -> PortResult<Project>;

    /// Active projects the user is a member of, in display order.
    async fn projects_for_member(&self, user_id: InternalId) -> PortResult<Vec<Project>>;

    async fn update_project(
        &self,
        project_uid: Uuid,
        changes: &Changes<ProjectField>,
    ) -> PortResult<()>;

    async fn delete_project(&self, project_uid: Uuid, deleted_by: InternalId) -> PortResult<()>;

    /// Counts active tasks under the project's active lists.
    async fn count_project_tasks(&self, project_id: InternalId) -> PortResult<TaskCounts>;
}

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Fails with `Conflict` when the pair already exists.
    async fn add_member(
        &self,
        project_id: InternalId,
        user_id: InternalId,
        role: MemberRole,
    ) -> PortResult<()>;

    async fn is_member(&self, project_id: InternalId, user_id: InternalId) -> PortResult<bool>;

    /// Members ordered by join time.
    async fn list_members(&self, project_id: InternalId) -> PortResult<Vec<ProjectMember>>;

    /// Follows the resource's parent chain to the internal id of its active root project.
    async fn resolve_project_id(&self, resource: ResourceRef) -> PortResult<InternalId>;
}

#[async_trait]
pub trait PositionRepository: Send + Sync {
    /// Highest position among active siblings in the scope, `None` when there are none
    /// (or when every sibling has a null position).
    async fn max_position(&self, scope: &SiblingScope) -> PortResult<Option<i32>>;
}

#[async_trait]
pub trait ListRepository: Send + Sync {
    async fn create_list(&self, list: NewList) -> PortResult<List>;

    async fn get_list_by_uid(&self, list_uid: Uuid) -> PortResult<List>;

    async fn lists_by_project(&self, project_id: InternalId) -> PortResult<Vec<List>>;

    async fn update_list(&self, list_uid: Uuid, changes: &Changes<ListField>) -> PortResult<()>;

    async fn delete_list(&self, list_uid: Uuid, deleted_by: InternalId) -> PortResult<()>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create_task(&self, task: NewTask) -> PortResult<Task>;

    async fn get_task_by_uid(&self, task_uid: Uuid) -> PortResult<Task>;

    /// Tasks of one list ordered by `COALESCE(position, 999999), created_at`.
    async fn tasks_by_list(&self, list_id: InternalId) -> PortResult<Vec<Task>>;

    async fn update_task(&self, task_uid: Uuid, changes: &Changes<TaskField>) -> PortResult<()>;

    async fn delete_task(&self, task_uid: Uuid, deleted_by: InternalId) -> PortResult<()>;
}

#[async_trait]
pub trait CanvasRepository: Send + Sync {
    async fn get_canvas(&self, project_id: InternalId) -> PortResult<Option<Canvas>>;

    async fn create_canvas(
        &self,
        project_id: InternalId,
        state_json: &str,
        created_by: InternalId,
    ) -> PortResult<Canvas>;

    async fn update_canvas(
        &self,
        project_id: InternalId,
        state_json: &str,
        updated_by: InternalId,
    ) -> PortResult<()>;

    async fn delete_canvas(&self, project_id: InternalId, deleted_by: InternalId)
        -> PortResult<()>;
}

#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn create_note(&self, note: NewNote) -> PortResult<Note>;

    async fn get_note_by_uid(&self, note_uid: Uuid) -> PortResult<Note>;

    async fn notes_by_project(&self, project_id: InternalId) -> PortResult<Vec<Note>>;

    async fn update_note(&self, note_uid: Uuid, changes: &Changes<NoteField>) -> PortResult<()>;

    async fn delete_note(&self, note_uid: Uuid, deleted_by: InternalId) -> PortResult<()>;
}

#[async_trait]
pub trait FolderRepository: Send + Sync {
    async fn create_folder(&self, folder: NewNoteFolder) -> PortResult<NoteFolder>;

    async fn get_folder_by_uid(&self, folder_uid: Uuid) -> PortResult<NoteFolder>;

    async fn folders_by_project(&self, project_id: InternalId) -> PortResult<Vec<NoteFolder>>;

    async fn update_folder(
        &self,
        folder_uid: Uuid,
        changes: &Changes<FolderField>,
    ) -> PortResult<()>;

    async fn delete_folder(&self, folder_uid: Uuid, deleted_by: InternalId) -> PortResult<()>;
}

#[async_trait]
pub trait ChatRepository: Send + Sync {
    /// Inserts a conversation. When the project already holds `capacity` active
    /// conversations the least recently updated one is soft-deleted first; both steps
    /// happen atomically with respect to other creates on the same project.
    async fn create_conversation(
        &self,
        conversation: NewConversation,
        capacity: usize,
    ) -> PortResult<ChatConversation>;

    async fn get_conversation_by_uid(&self, conversation_uid: Uuid)
        -> PortResult<ChatConversation>;

    /// Most recently updated first, at most `limit` rows.
    async fn conversations_by_project(
        &self,
        project_id: InternalId,
        limit: usize,
    ) -> PortResult<Vec<ChatConversation>>;

    async fn rename_conversation(
        &self,
        conversation_uid: Uuid,
        name: &str,
        updated_by: InternalId,
    ) -> PortResult<()>;

    /// Hard delete; the conversation's messages go with it.
    async fn delete_conversation(&self, conversation_uid: Uuid) -> PortResult<()>;

    /// Inserts a message and stamps the conversation's `updated_at`.
    async fn create_message(&self, message: NewMessage) -> PortResult<ChatMessage>;

    /// Oldest first.
    async fn messages_by_conversation(
        &self,
        conversation_id: InternalId,
    ) -> PortResult<Vec<ChatMessage>>;
}

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get_settings(&self, user_id: InternalId) -> PortResult<Option<UserSettings>>;

    async fn create_settings(&self, settings: NewUserSettings) -> PortResult<UserSettings>;

    async fn update_settings(
        &self,
        user_id: InternalId,
        changes: &Changes<SettingsField>,
    ) -> PortResult<()>;

    /// Hard delete.
    async fn delete_settings(&self, user_id: InternalId) -> PortResult<()>;
}

/// The full Entity Store as one object. Implemented for anything that implements every
/// repository, so adapters only implement the individual traits.
pub trait DatabaseService:
    UserRepository
    + ProjectRepository
    + MembershipRepository
    + PositionRepository
    + ListRepository
    + TaskRepository
    + CanvasRepository
    + NoteRepository
    + FolderRepository
    + ChatRepository
    + SettingsRepository
{
}

impl<T> DatabaseService for T where
    T: UserRepository
        + ProjectRepository
        + MembershipRepository
        + PositionRepository
        + ListRepository
        + TaskRepository
        + CanvasRepository
        + NoteRepository
        + FolderRepository
        + ChatRepository
        + SettingsRepository
{
}

//=========================================================================================
// Credential Ports (Traits)
//=========================================================================================

pub trait PasswordService: Send + Sync {
    /// Produces a salted hash suitable for storage.
    fn hash_password(&self, password: &str) -> PortResult<String>;

    /// `Ok(false)` for a wrong password; `Err` only when the stored hash is unreadable.
    fn verify_password(&self, password: &str, password_hash: &str) -> PortResult<bool>;
}

pub trait TokenService: Send + Sync {
    /// Signs a time-boxed token embedding the session identity.
    fn issue_token(&self, session: &Session) -> PortResult<String>;

    /// Checks signature and expiry. Any failure is `Unauthorized`.
    fn verify_token(&self, token: &str) -> PortResult<Session>;
}
