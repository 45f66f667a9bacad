//! crates/lucid_lists_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs mirror the persisted entities but are independent of any database
//! driver. Internal ids never leave the core; views (see `dto.rs`) only carry
//! external uids.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::ports::PortError;

/// Sequential storage-local identifier. Never exposed to clients.
pub type InternalId = i64;

pub const DEFAULT_COLOR: &str = "#FFFFFF";

//=========================================================================================
// Enumerations stored as text
//=========================================================================================

/// Implements `as_str`, `Display` and `FromStr` for a text-backed enum.
macro_rules! text_enum {
    ($name:ident, $what:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = PortError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(PortError::BadRequest(format!(
                        "invalid {}: '{}'",
                        $what, other
                    ))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Inactive,
    Completed,
}
text_enum!(ProjectStatus, "project status", {
    Active => "active",
    Inactive => "inactive",
    Completed => "completed",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
}
text_enum!(TaskStatus, "task status", {
    Todo => "todo",
    InProgress => "in_progress",
    Completed => "completed",
});

impl TaskStatus {
    /// Whether moving a task into this status marks it done.
    pub fn implies_completion(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}
text_enum!(Priority, "priority", {
    Low => "low",
    Medium => "medium",
    High => "high",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Member,
}
text_enum!(MemberRole, "member role", {
    Owner => "owner",
    Member => "member",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    User,
    Ai,
}
text_enum!(MessageType, "message type", {
    User => "user",
    Ai => "ai",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum Theme {
    #[default]
    #[serde(rename = "projectnest-default")]
    ProjectnestDefault,
    #[serde(rename = "projectnest-dark")]
    ProjectnestDark,
    #[serde(rename = "solarized-light")]
    SolarizedLight,
}
text_enum!(Theme, "theme", {
    ProjectnestDefault => "projectnest-default",
    ProjectnestDark => "projectnest-dark",
    SolarizedLight => "solarized-light",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    De,
    It,
    Pt,
    Ru,
    Ja,
    Ko,
    Zh,
}
text_enum!(Language, "language", {
    En => "en",
    Es => "es",
    Fr => "fr",
    De => "de",
    It => "it",
    Pt => "pt",
    Ru => "ru",
    Ja => "ja",
    Ko => "ko",
    Zh => "zh",
});

//=========================================================================================
// Persisted records
//=========================================================================================

/// A registered account. The password hash never leaves the access-control layer.
#[derive(Debug, Clone)]
pub struct User {
    pub id: InternalId,
    pub user_uid: Uuid,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
}

/// The authenticated identity carried by a verified session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: InternalId,
    pub user_uid: Uuid,
    pub email: String,
    pub name: String,
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            user_uid: user.user_uid,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Project {
    pub id: InternalId,
    pub project_uid: Uuid,
    pub user_id: InternalId,
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
    pub created_by: Option<InternalId>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<InternalId>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub user_id: InternalId,
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
}

/// A (project, user) membership row joined with the member's public identity.
#[derive(Debug, Clone)]
pub struct ProjectMember {
    pub project_id: InternalId,
    pub user_id: InternalId,
    pub user_uid: Uuid,
    pub email: String,
    pub name: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct List {
    pub id: InternalId,
    pub list_uid: Uuid,
    pub project_id: InternalId,
    pub project_uid: Uuid,
    pub name: String,
    pub color: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<InternalId>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<InternalId>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewList {
    pub project_id: InternalId,
    pub name: String,
    pub color: String,
    pub position: i32,
    pub created_by: Option<InternalId>,
}

#[derive(Debug, Clone)]
pub struct Task {
    pub id: InternalId,
    pub task_uid: Uuid,
    pub list_id: InternalId,
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
    pub created_by: Option<InternalId>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<InternalId>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub list_id: InternalId,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: TaskStatus,
    pub color: String,
    pub position: Option<i32>,
    pub is_completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_by: Option<InternalId>,
}

/// Active/completed task counts over a project's active lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub total: i64,
    pub completed: i64,
}

/// Brainstorm canvas state, one per project.
#[derive(Debug, Clone)]
pub struct Canvas {
    pub id: InternalId,
    pub canvas_uid: Uuid,
    pub project_id: InternalId,
    pub project_uid: Uuid,
    pub state_json: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<InternalId>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<InternalId>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NoteFolder {
    pub id: InternalId,
    pub folder_uid: Uuid,
    pub project_id: InternalId,
    pub project_uid: Uuid,
    pub parent_folder_id: Option<InternalId>,
    pub parent_folder_uid: Option<Uuid>,
    pub name: String,
    pub position: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<InternalId>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<InternalId>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewNoteFolder {
    pub project_id: InternalId,
    pub parent_folder_id: Option<InternalId>,
    pub name: String,
    pub position: i32,
    pub created_by: Option<InternalId>,
}

/// A note; `content_json` is the serialized form of [`crate::note_content::NoteContent`].
#[derive(Debug, Clone)]
pub struct Note {
    pub id: InternalId,
    pub note_uid: Uuid,
    pub project_id: InternalId,
    pub project_uid: Uuid,
    pub folder_id: Option<InternalId>,
    pub folder_uid: Option<Uuid>,
    pub title: String,
    pub content_json: String,
    pub position: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<InternalId>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<InternalId>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewNote {
    pub project_id: InternalId,
    pub folder_id: Option<InternalId>,
    pub title: String,
    pub content_json: String,
    pub position: i32,
    pub created_by: Option<InternalId>,
}

#[derive(Debug, Clone)]
pub struct ChatConversation {
    pub id: InternalId,
    pub conversation_uid: Uuid,
    pub project_id: InternalId,
    pub project_uid: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<InternalId>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<InternalId>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewConversation {
    pub project_id: InternalId,
    pub name: String,
    pub created_by: Option<InternalId>,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: InternalId,
    pub message_uid: Uuid,
    pub conversation_id: InternalId,
    pub conversation_uid: Uuid,
    pub message_type: MessageType,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<InternalId>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: InternalId,
    pub message_type: MessageType,
    pub content: String,
    pub created_by: Option<InternalId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserSettings {
    pub id: InternalId,
    pub settings_uid: Uuid,
    pub user_id: InternalId,
    pub theme: Theme,
    pub language: Language,
    pub timezone: String,
    pub notifications_enabled: bool,
    pub email_notifications: bool,
    pub sound_enabled: bool,
    pub compact_mode: bool,
    pub auto_save: bool,
    pub auto_save_interval: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The values a user's settings are initialised with.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUserSettings {
    pub user_id: InternalId,
    pub theme: Theme,
    pub language: Language,
    pub timezone: String,
    pub notifications_enabled: bool,
    pub email_notifications: bool,
    pub sound_enabled: bool,
    pub compact_mode: bool,
    pub auto_save: bool,
    pub auto_save_interval: i32,
}

impl NewUserSettings {
    pub fn defaults_for(user_id: InternalId) -> Self {
        Self {
            user_id,
            theme: Theme::ProjectnestDefault,
            language: Language::En,
            timezone: "UTC".to_string(),
            notifications_enabled: true,
            email_notifications: true,
            sound_enabled: true,
            compact_mode: false,
            auto_save: true,
            auto_save_interval: 30,
        }
    }
}

/// A nested resource (or a project itself) named by its external uid. Every variant
/// resolves to exactly one root project by following its parent edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceRef {
    Project(Uuid),
    List(Uuid),
    Task(Uuid),
    Note(Uuid),
    Folder(Uuid),
    Conversation(Uuid),
}

impl ResourceRef {
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceRef::Project(_) => "project",
            ResourceRef::List(_) => "list",
            ResourceRef::Task(_) => "task",
            ResourceRef::Note(_) => "note",
            ResourceRef::Folder(_) => "folder",
            ResourceRef::Conversation(_) => "conversation",
        }
    }

    pub fn uid(&self) -> Uuid {
        match *self {
            ResourceRef::Project(uid)
            | ResourceRef::List(uid)
            | ResourceRef::Task(uid)
            | ResourceRef::Note(uid)
            | ResourceRef::Folder(uid)
            | ResourceRef::Conversation(uid) => uid,
        }
    }
}
