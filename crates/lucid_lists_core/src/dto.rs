//! crates/lucid_lists_core/src/dto.rs
//!
//! Request bodies and the external views returned to clients. Views carry external
//! uids only; internal ids and foreign keys stay inside the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    Canvas, ChatConversation, ChatMessage, List, MemberRole, MessageType, Note, NoteFolder,
    Priority, Project, ProjectMember, ProjectStatus, Task, TaskCounts, TaskStatus, Theme,
    Language, User, UserSettings,
};
use crate::note_content::NoteContent;

//=========================================================================================
// Auth
//=========================================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserView {
    pub user_uid: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            user_uid: user.user_uid,
            email: user.email,
            name: user.name,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserView,
}

//=========================================================================================
// Projects
//=========================================================================================

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to `active`.
    #[serde(default)]
    pub status: Option<String>,
    /// Defaults to `#FFFFFF`.
    #[serde(default)]
    pub color: Option<String>,
    /// Appended after the owner's other projects when omitted.
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_private: Option<bool>,
    #[serde(default)]
    pub dbml_content: Option<String>,
    #[serde(default)]
    pub dbml_layout_data: Option<String>,
    #[serde(default)]
    pub flowchart_content: Option<String>,
}

/// Full replacement of a project's editable fields.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: String,
    pub color: String,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProjectView {
    pub project_uid: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub color: String,
    pub position: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_private: bool,
    pub dbml_content: Option<String>,
    pub dbml_layout_data: Option<String>,
    pub flowchart_content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Project> for ProjectView {
    fn from(p: Project) -> Self {
        Self {
            project_uid: p.project_uid,
            name: p.name,
            description: p.description,
            status: p.status,
            color: p.color,
            position: p.position,
            start_date: p.start_date,
            end_date: p.end_date,
            is_private: p.is_private,
            dbml_content: p.dbml_content,
            dbml_layout_data: p.dbml_layout_data,
            flowchart_content: p.flowchart_content,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct TaskStats {
    pub total: i64,
    pub completed: i64,
    pub todo: i64,
    /// `completed / total`, or 0 for a project without tasks.
    pub progress: f64,
}

impl From<TaskCounts> for TaskStats {
    fn from(counts: TaskCounts) -> Self {
        let progress = if counts.total > 0 {
            counts.completed as f64 / counts.total as f64
        } else {
            0.0
        };
        Self {
            total: counts.total,
            completed: counts.completed,
            todo: counts.total - counts.completed,
            progress,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProjectProgressView {
    pub project_uid: Uuid,
    #[serde(flatten)]
    pub stats: TaskStats,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProjectWithStatsView {
    #[serde(flatten)]
    pub project: ProjectView,
    pub task_stats: TaskStats,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProjectWithListsView {
    #[serde(flatten)]
    pub project: ProjectView,
    pub lists: Vec<ListWithTasksView>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddMemberRequest {
    pub email: String,
    /// `owner` or `member`; defaults to `member`.
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberView {
    pub user_uid: Uuid,
    pub email: String,
    pub name: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

impl From<ProjectMember> for MemberView {
    fn from(m: ProjectMember) -> Self {
        Self {
            user_uid: m.user_uid,
            email: m.email,
            name: m.name,
            role: m.role,
            joined_at: m.joined_at,
        }
    }
}

//=========================================================================================
// Lists and tasks
//=========================================================================================

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateListRequest {
    pub project_uid: Uuid,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateListRequest {
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdatePositionRequest {
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListView {
    pub list_uid: Uuid,
    pub project_uid: Uuid,
    pub name: String,
    pub color: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<List> for ListView {
    fn from(l: List) -> Self {
        Self {
            list_uid: l.list_uid,
            project_uid: l.project_uid,
            name: l.name,
            color: l.color,
            position: l.position,
            created_at: l.created_at,
            updated_at: l.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListWithTasksView {
    #[serde(flatten)]
    pub list: ListView,
    pub tasks: Vec<TaskView>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    pub list_uid: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    /// Defaults to `todo`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Full replacement of a task's editable fields.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    pub status: String,
    pub color: String,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MoveTaskRequest {
    pub list_uid: Uuid,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TaskView {
    pub task_uid: Uuid,
    pub list_uid: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: TaskStatus,
    pub color: String,
    pub position: Option<i32>,
    pub is_completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Task> for TaskView {
    fn from(t: Task) -> Self {
        Self {
            task_uid: t.task_uid,
            list_uid: t.list_uid,
            title: t.title,
            description: t.description,
            priority: t.priority,
            status: t.status,
            color: t.color,
            position: t.position,
            is_completed: t.is_completed,
            due_date: t.due_date,
            completed_at: t.completed_at,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

//=========================================================================================
// Canvas
//=========================================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateCanvasRequest {
    /// Opaque JSON document, stored as given.
    pub state_json: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CanvasView {
    pub canvas_uid: Uuid,
    pub project_uid: Uuid,
    pub state_json: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Canvas> for CanvasView {
    fn from(c: Canvas) -> Self {
        Self {
            canvas_uid: c.canvas_uid,
            project_uid: c.project_uid,
            state_json: c.state_json,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

//=========================================================================================
// Notes and folders
//=========================================================================================

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    pub project_uid: Uuid,
    #[serde(default)]
    pub folder_uid: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub content: Option<NoteContent>,
    #[serde(default)]
    pub position: Option<i32>,
}

/// Full replacement of title and content; position is kept when omitted.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateNoteRequest {
    pub title: String,
    pub content: NoteContent,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MoveNoteRequest {
    /// Target folder, or `null` for the project root.
    #[serde(default)]
    pub folder_uid: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NoteView {
    pub note_uid: Uuid,
    pub project_uid: Uuid,
    pub folder_uid: Option<Uuid>,
    pub title: String,
    pub content: NoteContent,
    pub position: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Note> for NoteView {
    fn from(n: Note) -> Self {
        Self {
            content: NoteContent::from_json_lossy(&n.content_json),
            note_uid: n.note_uid,
            project_uid: n.project_uid,
            folder_uid: n.folder_uid,
            title: n.title,
            position: n.position,
            created_at: n.created_at,
            updated_at: n.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotesListView {
    pub notes: Vec<NoteView>,
    pub total: usize,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateFolderRequest {
    pub project_uid: Uuid,
    #[serde(default)]
    pub parent_folder_uid: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub position: Option<i32>,
}

/// Full replacement of name, parent and position.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateFolderRequest {
    pub name: String,
    #[serde(default)]
    pub parent_folder_uid: Option<Uuid>,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FolderView {
    pub folder_uid: Uuid,
    pub project_uid: Uuid,
    pub parent_folder_uid: Option<Uuid>,
    pub name: String,
    pub position: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<NoteFolder> for FolderView {
    fn from(f: NoteFolder) -> Self {
        Self {
            folder_uid: f.folder_uid,
            project_uid: f.project_uid,
            parent_folder_uid: f.parent_folder_uid,
            name: f.name,
            position: f.position,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FoldersListView {
    pub folders: Vec<FolderView>,
    pub total: usize,
}

//=========================================================================================
// Chat
//=========================================================================================

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateConversationRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RenameConversationRequest {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateMessageRequest {
    /// `user` or `ai`.
    pub message_type: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConversationView {
    pub conversation_uid: Uuid,
    pub project_uid: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<ChatConversation> for ConversationView {
    fn from(c: ChatConversation) -> Self {
        Self {
            conversation_uid: c.conversation_uid,
            project_uid: c.project_uid,
            name: c.name,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageView {
    pub message_uid: Uuid,
    pub conversation_uid: Uuid,
    pub message_type: MessageType,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<ChatMessage> for MessageView {
    fn from(m: ChatMessage) -> Self {
        Self {
            message_uid: m.message_uid,
            conversation_uid: m.conversation_uid,
            message_type: m.message_type,
            content: m.content,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConversationWithMessagesView {
    #[serde(flatten)]
    pub conversation: ConversationView,
    pub messages: Vec<MessageView>,
}

//=========================================================================================
// Settings
//=========================================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SettingsView {
    pub settings_uid: Uuid,
    pub theme: Theme,
    pub language: Language,
    pub timezone: String,
    pub notifications_enabled: bool,
    pub email_notifications: bool,
    pub sound_enabled: bool,
    pub compact_mode: bool,
    pub auto_save: bool,
    pub auto_save_interval: i32,
    pub updated_at: DateTime<Utc>,
}

impl From<UserSettings> for SettingsView {
    fn from(s: UserSettings) -> Self {
        Self {
            settings_uid: s.settings_uid,
            theme: s.theme,
            language: s.language,
            timezone: s.timezone,
            notifications_enabled: s.notifications_enabled,
            email_notifications: s.email_notifications,
            sound_enabled: s.sound_enabled,
            compact_mode: s.compact_mode,
            auto_save: s.auto_save,
            auto_save_interval: s.auto_save_interval,
            updated_at: s.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_for_an_empty_project_report_zero_progress() {
        let stats = TaskStats::from(TaskCounts::default());
        assert_eq!(stats.todo, 0);
        assert_eq!(stats.progress, 0.0);
    }

    #[test]
    fn stats_derive_todo_and_progress_from_counts() {
        let stats = TaskStats::from(TaskCounts { total: 4, completed: 1 });
        assert_eq!(stats.todo, 3);
        assert_eq!(stats.progress, 0.25);
    }
}
