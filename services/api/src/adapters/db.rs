//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the entity store ports from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Queries are checked at runtime (`query_as::<_, Record>`) so the workspace builds
//! without a live database. Sparse updates are rendered from [`Changes`] with a
//! `QueryBuilder`, binding only the staged columns.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lucid_lists_core::domain::{
    Canvas, ChatConversation, ChatMessage, InternalId, List, MemberRole, NewConversation,
    NewList, NewMessage, NewNote, NewNoteFolder, NewProject, NewTask, NewUser, NewUserSettings,
    Note, NoteFolder, Project, ProjectMember, ResourceRef, Task, TaskCounts, User, UserSettings,
};
use lucid_lists_core::patch::{
    Changes, FolderField, ListField, NoteField, ProjectField, SettingsField, TaskField,
};
use lucid_lists_core::ports::{
    CanvasRepository, ChatRepository, FolderRepository, ListRepository, MembershipRepository,
    NoteRepository, PortError, PortResult, PositionRepository, ProjectRepository,
    SettingsRepository, TaskRepository, UserRepository,
};
use lucid_lists_core::position::{SiblingScope, NULL_POSITION_SENTINEL};
use sqlx::postgres::PgQueryResult;
use sqlx::query_builder::Separated;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements every entity store port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// Error helpers
//=========================================================================================

const UNIQUE_VIOLATION: &str = "23505";

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found(kind: &str, uid: Uuid) -> PortError {
    PortError::NotFound(format!("{kind} with uid {uid}"))
}

/// `RowNotFound` becomes `NotFound` for the named row; everything else is unexpected.
fn fetch_error(kind: &'static str, uid: Uuid) -> impl FnOnce(sqlx::Error) -> PortError {
    move |e| match e {
        sqlx::Error::RowNotFound => not_found(kind, uid),
        _ => unexpected(e),
    }
}

/// Unique violations become `Conflict` with the given message.
fn insert_error(conflict: impl Into<String>) -> impl FnOnce(sqlx::Error) -> PortError {
    move |e| match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            PortError::Conflict(conflict.into())
        }
        _ => unexpected(e),
    }
}

fn ensure_affected(result: PgQueryResult, kind: &'static str, uid: Uuid) -> PortResult<()> {
    if result.rows_affected() == 0 {
        return Err(not_found(kind, uid));
    }
    Ok(())
}

/// Parses a text column into one of the core's text enums.
fn stored<T>(column: &str, raw: &str) -> PortResult<T>
where
    T: FromStr<Err = PortError>,
{
    raw.parse()
        .map_err(|e| PortError::Unexpected(format!("corrupt {column} column: {e}")))
}

fn collect<R, T>(records: Vec<R>, to_domain: impl Fn(R) -> PortResult<T>) -> PortResult<Vec<T>> {
    records.into_iter().map(to_domain).collect()
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    user_uid: Uuid,
    email: String,
    password_hash: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_active: bool,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            user_uid: self.user_uid,
            email: self.email,
            password_hash: self.password_hash,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
            is_active: self.is_active,
        }
    }
}

const USER_COLUMNS: &str =
    "id, user_uid, email, password_hash, name, created_at, updated_at, is_active";

#[derive(FromRow)]
struct ProjectRecord {
    id: i64,
    project_uid: Uuid,
    user_id: i64,
    name: String,
    description: Option<String>,
    status: String,
    color: String,
    position: Option<i32>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    is_private: bool,
    dbml_content: Option<String>,
    dbml_layout_data: Option<String>,
    flowchart_content: Option<String>,
    created_at: DateTime<Utc>,
    created_by: Option<i64>,
    updated_at: Option<DateTime<Utc>>,
    updated_by: Option<i64>,
    is_active: bool,
}
impl ProjectRecord {
    fn to_domain(self) -> PortResult<Project> {
        Ok(Project {
            id: self.id,
            project_uid: self.project_uid,
            user_id: self.user_id,
            name: self.name,
            description: self.description,
            status: stored("project.status", &self.status)?,
            color: self.color,
            position: self.position,
            start_date: self.start_date,
            end_date: self.end_date,
            is_private: self.is_private,
            dbml_content: self.dbml_content,
            dbml_layout_data: self.dbml_layout_data,
            flowchart_content: self.flowchart_content,
            created_at: self.created_at,
            created_by: self.created_by,
            updated_at: self.updated_at,
            updated_by: self.updated_by,
            is_active: self.is_active,
        })
    }
}

const PROJECT_COLUMNS: &str = "p.id, p.project_uid, p.user_id, p.name, p.description, p.status, \
     p.color, p.position, p.start_date, p.end_date, p.is_private, p.dbml_content, \
     p.dbml_layout_data, p.flowchart_content, p.created_at, p.created_by, p.updated_at, \
     p.updated_by, p.is_active";

#[derive(FromRow)]
struct MemberRecord {
    project_id: i64,
    user_id: i64,
    user_uid: Uuid,
    email: String,
    name: String,
    role: String,
    joined_at: DateTime<Utc>,
}
impl MemberRecord {
    fn to_domain(self) -> PortResult<ProjectMember> {
        Ok(ProjectMember {
            project_id: self.project_id,
            user_id: self.user_id,
            user_uid: self.user_uid,
            email: self.email,
            name: self.name,
            role: stored("project_member.role", &self.role)?,
            joined_at: self.joined_at,
        })
    }
}

#[derive(FromRow)]
struct ListRecord {
    id: i64,
    list_uid: Uuid,
    project_id: i64,
    project_uid: Uuid,
    name: String,
    color: String,
    position: i32,
    created_at: DateTime<Utc>,
    created_by: Option<i64>,
    updated_at: Option<DateTime<Utc>>,
    updated_by: Option<i64>,
    is_active: bool,
}
impl ListRecord {
    fn to_domain(self) -> PortResult<List> {
        Ok(List {
            id: self.id,
            list_uid: self.list_uid,
            project_id: self.project_id,
            project_uid: self.project_uid,
            name: self.name,
            color: self.color,
            position: self.position,
            created_at: self.created_at,
            created_by: self.created_by,
            updated_at: self.updated_at,
            updated_by: self.updated_by,
            is_active: self.is_active,
        })
    }
}

const LIST_SELECT: &str = "SELECT l.id, l.list_uid, l.project_id, p.project_uid, l.name, \
     l.color, l.position, l.created_at, l.created_by, l.updated_at, l.updated_by, l.is_active \
     FROM list l JOIN project p ON p.id = l.project_id";

#[derive(FromRow)]
struct TaskRecord {
    id: i64,
    task_uid: Uuid,
    list_id: i64,
    list_uid: Uuid,
    title: String,
    description: Option<String>,
    priority: Option<String>,
    status: String,
    color: String,
    position: Option<i32>,
    is_completed: bool,
    due_date: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    created_by: Option<i64>,
    updated_at: Option<DateTime<Utc>>,
    updated_by: Option<i64>,
    is_active: bool,
}
impl TaskRecord {
    fn to_domain(self) -> PortResult<Task> {
        Ok(Task {
            id: self.id,
            task_uid: self.task_uid,
            list_id: self.list_id,
            list_uid: self.list_uid,
            title: self.title,
            description: self.description,
            priority: self
                .priority
                .as_deref()
                .map(|raw| stored("task.priority", raw))
                .transpose()?,
            status: stored("task.status", &self.status)?,
            color: self.color,
            position: self.position,
            is_completed: self.is_completed,
            due_date: self.due_date,
            completed_at: self.completed_at,
            created_at: self.created_at,
            created_by: self.created_by,
            updated_at: self.updated_at,
            updated_by: self.updated_by,
            is_active: self.is_active,
        })
    }
}

const TASK_SELECT: &str = "SELECT t.id, t.task_uid, t.list_id, l.list_uid, t.title, \
     t.description, t.priority, t.status, t.color, t.position, t.is_completed, t.due_date, \
     t.completed_at, t.created_at, t.created_by, t.updated_at, t.updated_by, t.is_active \
     FROM task t JOIN list l ON l.id = t.list_id";

#[derive(FromRow)]
struct CanvasRecord {
    id: i64,
    canvas_uid: Uuid,
    project_id: i64,
    project_uid: Uuid,
    state_json: String,
    created_at: DateTime<Utc>,
    created_by: Option<i64>,
    updated_at: Option<DateTime<Utc>>,
    updated_by: Option<i64>,
    is_active: bool,
}
impl CanvasRecord {
    fn to_domain(self) -> Canvas {
        Canvas {
            id: self.id,
            canvas_uid: self.canvas_uid,
            project_id: self.project_id,
            project_uid: self.project_uid,
            state_json: self.state_json,
            created_at: self.created_at,
            created_by: self.created_by,
            updated_at: self.updated_at,
            updated_by: self.updated_by,
            is_active: self.is_active,
        }
    }
}

const CANVAS_SELECT: &str = "SELECT c.id, c.canvas_uid, c.project_id, p.project_uid, \
     c.state_json::text AS state_json, c.created_at, c.created_by, c.updated_at, c.updated_by, \
     c.is_active FROM brainstorm_canvas c JOIN project p ON p.id = c.project_id";

#[derive(FromRow)]
struct FolderRecord {
    id: i64,
    folder_uid: Uuid,
    project_id: i64,
    project_uid: Uuid,
    parent_folder_id: Option<i64>,
    parent_folder_uid: Option<Uuid>,
    name: String,
    position: Option<i32>,
    created_at: DateTime<Utc>,
    created_by: Option<i64>,
    updated_at: Option<DateTime<Utc>>,
    updated_by: Option<i64>,
    is_active: bool,
}
impl FolderRecord {
    fn to_domain(self) -> PortResult<NoteFolder> {
        Ok(NoteFolder {
            id: self.id,
            folder_uid: self.folder_uid,
            project_id: self.project_id,
            project_uid: self.project_uid,
            parent_folder_id: self.parent_folder_id,
            parent_folder_uid: self.parent_folder_uid,
            name: self.name,
            position: self.position,
            created_at: self.created_at,
            created_by: self.created_by,
            updated_at: self.updated_at,
            updated_by: self.updated_by,
            is_active: self.is_active,
        })
    }
}

const FOLDER_SELECT: &str = "SELECT f.id, f.folder_uid, f.project_id, p.project_uid, \
     f.parent_folder_id, parent.folder_uid AS parent_folder_uid, f.name, f.position, \
     f.created_at, f.created_by, f.updated_at, f.updated_by, f.is_active \
     FROM note_folder f JOIN project p ON p.id = f.project_id \
     LEFT JOIN note_folder parent ON parent.id = f.parent_folder_id";

#[derive(FromRow)]
struct NoteRecord {
    id: i64,
    note_uid: Uuid,
    project_id: i64,
    project_uid: Uuid,
    folder_id: Option<i64>,
    folder_uid: Option<Uuid>,
    title: String,
    content_json: String,
    position: Option<i32>,
    created_at: DateTime<Utc>,
    created_by: Option<i64>,
    updated_at: Option<DateTime<Utc>>,
    updated_by: Option<i64>,
    is_active: bool,
}
impl NoteRecord {
    fn to_domain(self) -> PortResult<Note> {
        Ok(Note {
            id: self.id,
            note_uid: self.note_uid,
            project_id: self.project_id,
            project_uid: self.project_uid,
            folder_id: self.folder_id,
            folder_uid: self.folder_uid,
            title: self.title,
            content_json: self.content_json,
            position: self.position,
            created_at: self.created_at,
            created_by: self.created_by,
            updated_at: self.updated_at,
            updated_by: self.updated_by,
            is_active: self.is_active,
        })
    }
}

const NOTE_SELECT: &str = "SELECT n.id, n.note_uid, n.project_id, p.project_uid, n.folder_id, \
     f.folder_uid, n.title, n.content_json::text AS content_json, n.position, n.created_at, \
     n.created_by, n.updated_at, n.updated_by, n.is_active \
     FROM note n JOIN project p ON p.id = n.project_id \
     LEFT JOIN note_folder f ON f.id = n.folder_id";

#[derive(FromRow)]
struct ConversationRecord {
    id: i64,
    conversation_uid: Uuid,
    project_id: i64,
    project_uid: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    created_by: Option<i64>,
    updated_at: Option<DateTime<Utc>>,
    updated_by: Option<i64>,
    is_active: bool,
}
impl ConversationRecord {
    fn to_domain(self) -> ChatConversation {
        ChatConversation {
            id: self.id,
            conversation_uid: self.conversation_uid,
            project_id: self.project_id,
            project_uid: self.project_uid,
            name: self.name,
            created_at: self.created_at,
            created_by: self.created_by,
            updated_at: self.updated_at,
            updated_by: self.updated_by,
            is_active: self.is_active,
        }
    }
}

const CONVERSATION_SELECT: &str = "SELECT c.id, c.conversation_uid, c.project_id, \
     p.project_uid, c.name, c.created_at, c.created_by, c.updated_at, c.updated_by, c.is_active \
     FROM chat_conversations c JOIN project p ON p.id = c.project_id";

#[derive(FromRow)]
struct MessageRecord {
    id: i64,
    message_uid: Uuid,
    conversation_id: i64,
    conversation_uid: Uuid,
    message_type: String,
    content: String,
    created_at: DateTime<Utc>,
    created_by: Option<i64>,
}
impl MessageRecord {
    fn to_domain(self) -> PortResult<ChatMessage> {
        Ok(ChatMessage {
            id: self.id,
            message_uid: self.message_uid,
            conversation_id: self.conversation_id,
            conversation_uid: self.conversation_uid,
            message_type: stored("chat_messages.message_type", &self.message_type)?,
            content: self.content,
            created_at: self.created_at,
            created_by: self.created_by,
        })
    }
}

#[derive(FromRow)]
struct SettingsRecord {
    id: i64,
    settings_uid: Uuid,
    user_id: i64,
    theme: String,
    language: String,
    timezone: String,
    notifications_enabled: bool,
    email_notifications: bool,
    sound_enabled: bool,
    compact_mode: bool,
    auto_save: bool,
    auto_save_interval: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl SettingsRecord {
    fn to_domain(self) -> PortResult<UserSettings> {
        Ok(UserSettings {
            id: self.id,
            settings_uid: self.settings_uid,
            user_id: self.user_id,
            theme: stored("user_settings.theme", &self.theme)?,
            language: stored("user_settings.language", &self.language)?,
            timezone: self.timezone,
            notifications_enabled: self.notifications_enabled,
            email_notifications: self.email_notifications,
            sound_enabled: self.sound_enabled,
            compact_mode: self.compact_mode,
            auto_save: self.auto_save,
            auto_save_interval: self.auto_save_interval,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SETTINGS_COLUMNS: &str = "id, settings_uid, user_id, theme, language, timezone, \
     notifications_enabled, email_notifications, sound_enabled, compact_mode, auto_save, \
     auto_save_interval, created_at, updated_at";

//=========================================================================================
// Sparse update rendering
//=========================================================================================

type Assignments<'qb> = Separated<'qb, 'static, Postgres, &'static str>;

/// Starts `UPDATE <table> SET ` and hands the comma-separated assignment list to `fill`.
fn render_update<F>(
    table: &str,
    changes: &Changes<F>,
    stamp_actor: bool,
    fill: impl Fn(&mut Assignments<'_>, &F),
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("UPDATE {table} SET "));
    {
        let mut set = qb.separated(", ");
        for field in &changes.fields {
            fill(&mut set, field);
        }
        set.push("updated_at = ").push_bind_unseparated(changes.updated_at);
        if stamp_actor {
            set.push("updated_by = ").push_bind_unseparated(changes.updated_by);
        }
    }
    qb
}

fn push_project_field(set: &mut Assignments<'_>, field: &ProjectField) {
    match field {
        ProjectField::Name(v) => set.push("name = ").push_bind_unseparated(v.clone()),
        ProjectField::Description(v) => {
            set.push("description = ").push_bind_unseparated(v.clone())
        }
        ProjectField::Status(v) => set.push("status = ").push_bind_unseparated(v.as_str()),
        ProjectField::Color(v) => set.push("color = ").push_bind_unseparated(v.clone()),
        ProjectField::Position(v) => set.push("position = ").push_bind_unseparated(*v),
        ProjectField::StartDate(v) => set.push("start_date = ").push_bind_unseparated(*v),
        ProjectField::EndDate(v) => set.push("end_date = ").push_bind_unseparated(*v),
        ProjectField::IsPrivate(v) => set.push("is_private = ").push_bind_unseparated(*v),
        ProjectField::DbmlContent(v) => {
            set.push("dbml_content = ").push_bind_unseparated(v.clone())
        }
        ProjectField::DbmlLayoutData(v) => {
            set.push("dbml_layout_data = ").push_bind_unseparated(v.clone())
        }
        ProjectField::FlowchartContent(v) => {
            set.push("flowchart_content = ").push_bind_unseparated(v.clone())
        }
    };
}

fn push_list_field(set: &mut Assignments<'_>, field: &ListField) {
    match field {
        ListField::Name(v) => set.push("name = ").push_bind_unseparated(v.clone()),
        ListField::Color(v) => set.push("color = ").push_bind_unseparated(v.clone()),
        ListField::Position(v) => set.push("position = ").push_bind_unseparated(*v),
    };
}

fn push_task_field(set: &mut Assignments<'_>, field: &TaskField) {
    match field {
        TaskField::Title(v) => set.push("title = ").push_bind_unseparated(v.clone()),
        TaskField::Description(v) => set.push("description = ").push_bind_unseparated(v.clone()),
        TaskField::Priority(v) => set
            .push("priority = ")
            .push_bind_unseparated(v.map(|p| p.as_str())),
        TaskField::Status(v) => set.push("status = ").push_bind_unseparated(v.as_str()),
        TaskField::Color(v) => set.push("color = ").push_bind_unseparated(v.clone()),
        TaskField::Position(v) => set.push("position = ").push_bind_unseparated(*v),
        TaskField::IsCompleted(v) => set.push("is_completed = ").push_bind_unseparated(*v),
        TaskField::DueDate(v) => set.push("due_date = ").push_bind_unseparated(*v),
        TaskField::CompletedAt(v) => set.push("completed_at = ").push_bind_unseparated(*v),
        TaskField::ListId(v) => set.push("list_id = ").push_bind_unseparated(*v),
    };
}

fn push_note_field(set: &mut Assignments<'_>, field: &NoteField) {
    match field {
        NoteField::Title(v) => set.push("title = ").push_bind_unseparated(v.clone()),
        NoteField::Content(v) => {
            set.push("content_json = ").push_bind_unseparated(v.clone());
            set.push_unseparated("::jsonb")
        }
        NoteField::FolderId(v) => set.push("folder_id = ").push_bind_unseparated(*v),
        NoteField::Position(v) => set.push("position = ").push_bind_unseparated(*v),
    };
}

fn push_folder_field(set: &mut Assignments<'_>, field: &FolderField) {
    match field {
        FolderField::Name(v) => set.push("name = ").push_bind_unseparated(v.clone()),
        FolderField::ParentFolderId(v) => {
            set.push("parent_folder_id = ").push_bind_unseparated(*v)
        }
        FolderField::Position(v) => set.push("position = ").push_bind_unseparated(*v),
    };
}

fn push_settings_field(set: &mut Assignments<'_>, field: &SettingsField) {
    match field {
        SettingsField::Theme(v) => set.push("theme = ").push_bind_unseparated(v.as_str()),
        SettingsField::Language(v) => set.push("language = ").push_bind_unseparated(v.as_str()),
        SettingsField::Timezone(v) => set.push("timezone = ").push_bind_unseparated(v.clone()),
        SettingsField::NotificationsEnabled(v) => {
            set.push("notifications_enabled = ").push_bind_unseparated(*v)
        }
        SettingsField::EmailNotifications(v) => {
            set.push("email_notifications = ").push_bind_unseparated(*v)
        }
        SettingsField::SoundEnabled(v) => set.push("sound_enabled = ").push_bind_unseparated(*v),
        SettingsField::CompactMode(v) => set.push("compact_mode = ").push_bind_unseparated(*v),
        SettingsField::AutoSave(v) => set.push("auto_save = ").push_bind_unseparated(*v),
        SettingsField::AutoSaveInterval(v) => {
            set.push("auto_save_interval = ").push_bind_unseparated(*v)
        }
    };
}

/// Appends `WHERE <uid_column> = $n AND is_active = TRUE`.
fn where_active_uid(
    mut qb: QueryBuilder<'static, Postgres>,
    uid_column: &str,
    uid: Uuid,
) -> QueryBuilder<'static, Postgres> {
    qb.push(format!(" WHERE {uid_column} = "))
        .push_bind(uid)
        .push(" AND is_active = TRUE");
    qb
}

impl DbAdapter {
    async fn apply(
        &self,
        mut qb: QueryBuilder<'static, Postgres>,
        kind: &'static str,
        uid: Uuid,
    ) -> PortResult<()> {
        debug!(sql = qb.sql(), "applying partial update");
        let result = qb.build().execute(&self.pool).await.map_err(unexpected)?;
        ensure_affected(result, kind, uid)
    }

    /// Soft delete of one active row by its uid.
    async fn deactivate(
        &self,
        table: &'static str,
        uid_column: &'static str,
        kind: &'static str,
        uid: Uuid,
        deleted_by: InternalId,
    ) -> PortResult<()> {
        let sql = format!(
            "UPDATE {table} SET is_active = FALSE, updated_at = NOW(), updated_by = $2 \
             WHERE {uid_column} = $1 AND is_active = TRUE"
        );
        let result = sqlx::query(&sql)
            .bind(uid)
            .bind(deleted_by)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        ensure_affected(result, kind, uid)?;
        info!(kind, %uid, "soft-deleted");
        Ok(())
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl UserRepository for DbAdapter {
    async fn create_user(&self, user: NewUser) -> PortResult<User> {
        let sql = format!(
            "INSERT INTO users (email, password_hash, name) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.name)
            .fetch_one(&self.pool)
            .await
            .map_err(insert_error(format!("email {} is already registered", user.email)))?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND is_active = TRUE");
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => PortError::NotFound(format!("user {email}")),
                _ => unexpected(e),
            })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: InternalId) -> PortResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND is_active = TRUE");
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => PortError::NotFound(format!("user {user_id}")),
                _ => unexpected(e),
            })?;
        Ok(record.to_domain())
    }
}

#[async_trait]
impl ProjectRepository for DbAdapter {
    async fn create_project_with_owner(&self, project: NewProject) -> PortResult<Project> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let sql = format!(
            "INSERT INTO project AS p (user_id, name, description, status, color, position, \
             start_date, end_date, is_private, dbml_content, dbml_layout_data, flowchart_content, \
             created_by) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $1) \
             RETURNING {PROJECT_COLUMNS}"
        );
        let record = sqlx::query_as::<_, ProjectRecord>(&sql)
            .bind(project.user_id)
            .bind(&project.name)
            .bind(&project.description)
            .bind(project.status.as_str())
            .bind(&project.color)
            .bind(project.position)
            .bind(project.start_date)
            .bind(project.end_date)
            .bind(project.is_private)
            .bind(&project.dbml_content)
            .bind(&project.dbml_layout_data)
            .bind(&project.flowchart_content)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;

        sqlx::query("INSERT INTO project_member (project_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(record.id)
            .bind(project.user_id)
            .bind(MemberRole::Owner.as_str())
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        record.to_domain()
    }

    async fn get_project_by_uid(&self, project_uid: Uuid) -> PortResult<Project> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM project p \
             WHERE p.project_uid = $1 AND p.is_active = TRUE"
        );
        sqlx::query_as::<_, ProjectRecord>(&sql)
            .bind(project_uid)
            .fetch_one(&self.pool)
            .await
            .map_err(fetch_error("project", project_uid))?
            .to_domain()
    }

    async fn projects_for_member(&self, user_id: InternalId) -> PortResult<Vec<Project>> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM project p \
             JOIN project_member pm ON pm.project_id = p.id \
             WHERE pm.user_id = $1 AND p.is_active = TRUE \
             ORDER BY COALESCE(p.position, $2), p.created_at DESC"
        );
        let records = sqlx::query_as::<_, ProjectRecord>(&sql)
            .bind(user_id)
            .bind(NULL_POSITION_SENTINEL)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        collect(records, ProjectRecord::to_domain)
    }

    async fn update_project(
        &self,
        project_uid: Uuid,
        changes: &Changes<ProjectField>,
    ) -> PortResult<()> {
        let qb = render_update("project", changes, true, push_project_field);
        self.apply(where_active_uid(qb, "project_uid", project_uid), "project", project_uid)
            .await
    }

    async fn delete_project(&self, project_uid: Uuid, deleted_by: InternalId) -> PortResult<()> {
        self.deactivate("project", "project_uid", "project", project_uid, deleted_by)
            .await
    }

    async fn count_project_tasks(&self, project_id: InternalId) -> PortResult<TaskCounts> {
        let (total, completed) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE t.is_completed) \
             FROM task t JOIN list l ON l.id = t.list_id \
             WHERE l.project_id = $1 AND l.is_active = TRUE AND t.is_active = TRUE",
        )
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(TaskCounts { total, completed })
    }
}

#[async_trait]
impl MembershipRepository for DbAdapter {
    async fn add_member(
        &self,
        project_id: InternalId,
        user_id: InternalId,
        role: MemberRole,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO project_member (project_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(project_id)
            .bind(user_id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await
            .map_err(insert_error("user is already a member of this project"))?;
        Ok(())
    }

    async fn is_member(&self, project_id: InternalId, user_id: InternalId) -> PortResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM project_member WHERE project_id = $1 AND user_id = $2)",
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn list_members(&self, project_id: InternalId) -> PortResult<Vec<ProjectMember>> {
        let records = sqlx::query_as::<_, MemberRecord>(
            "SELECT pm.project_id, pm.user_id, u.user_uid, u.email, u.name, pm.role, pm.joined_at \
             FROM project_member pm JOIN users u ON u.id = pm.user_id \
             WHERE pm.project_id = $1 AND u.is_active = TRUE \
             ORDER BY pm.joined_at ASC, pm.id ASC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        collect(records, MemberRecord::to_domain)
    }

    async fn resolve_project_id(&self, resource: ResourceRef) -> PortResult<InternalId> {
        let sql = match resource {
            ResourceRef::Project(_) => {
                "SELECT p.id FROM project p WHERE p.project_uid = $1 AND p.is_active = TRUE"
            }
            ResourceRef::List(_) => {
                "SELECT p.id FROM list l JOIN project p ON p.id = l.project_id \
                 WHERE l.list_uid = $1 AND l.is_active = TRUE AND p.is_active = TRUE"
            }
            ResourceRef::Task(_) => {
                "SELECT p.id FROM task t JOIN list l ON l.id = t.list_id \
                 JOIN project p ON p.id = l.project_id \
                 WHERE t.task_uid = $1 AND t.is_active = TRUE AND l.is_active = TRUE \
                 AND p.is_active = TRUE"
            }
            ResourceRef::Note(_) => {
                "SELECT p.id FROM note n JOIN project p ON p.id = n.project_id \
                 WHERE n.note_uid = $1 AND n.is_active = TRUE AND p.is_active = TRUE"
            }
            ResourceRef::Folder(_) => {
                "SELECT p.id FROM note_folder f JOIN project p ON p.id = f.project_id \
                 WHERE f.folder_uid = $1 AND f.is_active = TRUE AND p.is_active = TRUE"
            }
            ResourceRef::Conversation(_) => {
                "SELECT p.id FROM chat_conversations c JOIN project p ON p.id = c.project_id \
                 WHERE c.conversation_uid = $1 AND c.is_active = TRUE AND p.is_active = TRUE"
            }
        };
        sqlx::query_scalar::<_, i64>(sql)
            .bind(resource.uid())
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| not_found(resource.kind(), resource.uid()))
    }
}

#[async_trait]
impl PositionRepository for DbAdapter {
    async fn max_position(&self, scope: &SiblingScope) -> PortResult<Option<i32>> {
        let query = match *scope {
            SiblingScope::ProjectsOf(owner) => sqlx::query_scalar::<_, Option<i32>>(
                "SELECT MAX(position) FROM project WHERE user_id = $1 AND is_active = TRUE",
            )
            .bind(owner),
            SiblingScope::ListsOf(project_id) => sqlx::query_scalar(
                "SELECT MAX(position) FROM list WHERE project_id = $1 AND is_active = TRUE",
            )
            .bind(project_id),
            SiblingScope::TasksOf(list_id) => sqlx::query_scalar(
                "SELECT MAX(position) FROM task WHERE list_id = $1 AND is_active = TRUE",
            )
            .bind(list_id),
            SiblingScope::FoldersOf { project_id, parent_folder_id } => sqlx::query_scalar(
                "SELECT MAX(position) FROM note_folder WHERE project_id = $1 \
                 AND parent_folder_id IS NOT DISTINCT FROM $2 AND is_active = TRUE",
            )
            .bind(project_id)
            .bind(parent_folder_id),
            SiblingScope::NotesOf { project_id, folder_id } => sqlx::query_scalar(
                "SELECT MAX(position) FROM note WHERE project_id = $1 \
                 AND folder_id IS NOT DISTINCT FROM $2 AND is_active = TRUE",
            )
            .bind(project_id)
            .bind(folder_id),
        };
        query.fetch_one(&self.pool).await.map_err(unexpected)
    }
}

#[async_trait]
impl ListRepository for DbAdapter {
    async fn create_list(&self, list: NewList) -> PortResult<List> {
        let list_uid = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO list (project_id, name, color, position, created_by) \
             VALUES ($1, $2, $3, $4, $5) RETURNING list_uid",
        )
        .bind(list.project_id)
        .bind(&list.name)
        .bind(&list.color)
        .bind(list.position)
        .bind(list.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        self.get_list_by_uid(list_uid).await
    }

    async fn get_list_by_uid(&self, list_uid: Uuid) -> PortResult<List> {
        let sql = format!("{LIST_SELECT} WHERE l.list_uid = $1 AND l.is_active = TRUE");
        sqlx::query_as::<_, ListRecord>(&sql)
            .bind(list_uid)
            .fetch_one(&self.pool)
            .await
            .map_err(fetch_error("list", list_uid))?
            .to_domain()
    }

    async fn lists_by_project(&self, project_id: InternalId) -> PortResult<Vec<List>> {
        let sql = format!(
            "{LIST_SELECT} WHERE l.project_id = $1 AND l.is_active = TRUE \
             ORDER BY l.position, l.created_at"
        );
        let records = sqlx::query_as::<_, ListRecord>(&sql)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        collect(records, ListRecord::to_domain)
    }

    async fn update_list(&self, list_uid: Uuid, changes: &Changes<ListField>) -> PortResult<()> {
        let qb = render_update("list", changes, true, push_list_field);
        self.apply(where_active_uid(qb, "list_uid", list_uid), "list", list_uid)
            .await
    }

    async fn delete_list(&self, list_uid: Uuid, deleted_by: InternalId) -> PortResult<()> {
        self.deactivate("list", "list_uid", "list", list_uid, deleted_by)
            .await
    }
}

#[async_trait]
impl TaskRepository for DbAdapter {
    async fn create_task(&self, task: NewTask) -> PortResult<Task> {
        let task_uid = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO task (list_id, title, description, priority, status, color, position, \
             is_completed, due_date, completed_at, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING task_uid",
        )
        .bind(task.list_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority.map(|p| p.as_str()))
        .bind(task.status.as_str())
        .bind(&task.color)
        .bind(task.position)
        .bind(task.is_completed)
        .bind(task.due_date)
        .bind(task.completed_at)
        .bind(task.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        self.get_task_by_uid(task_uid).await
    }

    async fn get_task_by_uid(&self, task_uid: Uuid) -> PortResult<Task> {
        let sql = format!("{TASK_SELECT} WHERE t.task_uid = $1 AND t.is_active = TRUE");
        sqlx::query_as::<_, TaskRecord>(&sql)
            .bind(task_uid)
            .fetch_one(&self.pool)
            .await
            .map_err(fetch_error("task", task_uid))?
            .to_domain()
    }

    async fn tasks_by_list(&self, list_id: InternalId) -> PortResult<Vec<Task>> {
        let sql = format!(
            "{TASK_SELECT} WHERE t.list_id = $1 AND t.is_active = TRUE \
             ORDER BY COALESCE(t.position, $2), t.created_at"
        );
        let records = sqlx::query_as::<_, TaskRecord>(&sql)
            .bind(list_id)
            .bind(NULL_POSITION_SENTINEL)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        collect(records, TaskRecord::to_domain)
    }

    async fn update_task(&self, task_uid: Uuid, changes: &Changes<TaskField>) -> PortResult<()> {
        let qb = render_update("task", changes, true, push_task_field);
        self.apply(where_active_uid(qb, "task_uid", task_uid), "task", task_uid)
            .await
    }

    async fn delete_task(&self, task_uid: Uuid, deleted_by: InternalId) -> PortResult<()> {
        self.deactivate("task", "task_uid", "task", task_uid, deleted_by)
            .await
    }
}

#[async_trait]
impl CanvasRepository for DbAdapter {
    async fn get_canvas(&self, project_id: InternalId) -> PortResult<Option<Canvas>> {
        let sql = format!("{CANVAS_SELECT} WHERE c.project_id = $1 AND c.is_active = TRUE");
        let record = sqlx::query_as::<_, CanvasRecord>(&sql)
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(record.map(CanvasRecord::to_domain))
    }

    async fn create_canvas(
        &self,
        project_id: InternalId,
        state_json: &str,
        created_by: InternalId,
    ) -> PortResult<Canvas> {
        sqlx::query(
            "INSERT INTO brainstorm_canvas (project_id, state_json, created_by) \
             VALUES ($1, $2::jsonb, $3)",
        )
        .bind(project_id)
        .bind(state_json)
        .bind(created_by)
        .execute(&self.pool)
        .await
        .map_err(insert_error("project already has an active canvas"))?;
        self.get_canvas(project_id)
            .await?
            .ok_or_else(|| {
                PortError::Unexpected(format!("canvas of project {project_id} vanished"))
            })
    }

    async fn update_canvas(
        &self,
        project_id: InternalId,
        state_json: &str,
        updated_by: InternalId,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE brainstorm_canvas SET state_json = $2::jsonb, updated_at = NOW(), \
             updated_by = $3 WHERE project_id = $1 AND is_active = TRUE",
        )
        .bind(project_id)
        .bind(state_json)
        .bind(updated_by)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("canvas of project {project_id}")));
        }
        Ok(())
    }

    async fn delete_canvas(
        &self,
        project_id: InternalId,
        deleted_by: InternalId,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE brainstorm_canvas SET is_active = FALSE, updated_at = NOW(), updated_by = $2 \
             WHERE project_id = $1 AND is_active = TRUE",
        )
        .bind(project_id)
        .bind(deleted_by)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("canvas of project {project_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl NoteRepository for DbAdapter {
    async fn create_note(&self, note: NewNote) -> PortResult<Note> {
        let note_uid = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO note (project_id, folder_id, title, content_json, position, created_by) \
             VALUES ($1, $2, $3, $4::jsonb, $5, $6) RETURNING note_uid",
        )
        .bind(note.project_id)
        .bind(note.folder_id)
        .bind(&note.title)
        .bind(&note.content_json)
        .bind(note.position)
        .bind(note.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        self.get_note_by_uid(note_uid).await
    }

    async fn get_note_by_uid(&self, note_uid: Uuid) -> PortResult<Note> {
        let sql = format!("{NOTE_SELECT} WHERE n.note_uid = $1 AND n.is_active = TRUE");
        sqlx::query_as::<_, NoteRecord>(&sql)
            .bind(note_uid)
            .fetch_one(&self.pool)
            .await
            .map_err(fetch_error("note", note_uid))?
            .to_domain()
    }

    async fn notes_by_project(&self, project_id: InternalId) -> PortResult<Vec<Note>> {
        let sql = format!(
            "{NOTE_SELECT} WHERE n.project_id = $1 AND n.is_active = TRUE \
             ORDER BY COALESCE(n.position, $2), n.created_at"
        );
        let records = sqlx::query_as::<_, NoteRecord>(&sql)
            .bind(project_id)
            .bind(NULL_POSITION_SENTINEL)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        collect(records, NoteRecord::to_domain)
    }

    async fn update_note(&self, note_uid: Uuid, changes: &Changes<NoteField>) -> PortResult<()> {
        let qb = render_update("note", changes, true, push_note_field);
        self.apply(where_active_uid(qb, "note_uid", note_uid), "note", note_uid)
            .await
    }

    async fn delete_note(&self, note_uid: Uuid, deleted_by: InternalId) -> PortResult<()> {
        self.deactivate("note", "note_uid", "note", note_uid, deleted_by)
            .await
    }
}

#[async_trait]
impl FolderRepository for DbAdapter {
    async fn create_folder(&self, folder: NewNoteFolder) -> PortResult<NoteFolder> {
        let folder_uid = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO note_folder (project_id, parent_folder_id, name, position, created_by) \
             VALUES ($1, $2, $3, $4, $5) RETURNING folder_uid",
        )
        .bind(folder.project_id)
        .bind(folder.parent_folder_id)
        .bind(&folder.name)
        .bind(folder.position)
        .bind(folder.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        self.get_folder_by_uid(folder_uid).await
    }

    async fn get_folder_by_uid(&self, folder_uid: Uuid) -> PortResult<NoteFolder> {
        let sql = format!("{FOLDER_SELECT} WHERE f.folder_uid = $1 AND f.is_active = TRUE");
        sqlx::query_as::<_, FolderRecord>(&sql)
            .bind(folder_uid)
            .fetch_one(&self.pool)
            .await
            .map_err(fetch_error("folder", folder_uid))?
            .to_domain()
    }

    async fn folders_by_project(&self, project_id: InternalId) -> PortResult<Vec<NoteFolder>> {
        let sql = format!(
            "{FOLDER_SELECT} WHERE f.project_id = $1 AND f.is_active = TRUE \
             ORDER BY COALESCE(f.position, $2), f.created_at"
        );
        let records = sqlx::query_as::<_, FolderRecord>(&sql)
            .bind(project_id)
            .bind(NULL_POSITION_SENTINEL)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        collect(records, FolderRecord::to_domain)
    }

    async fn update_folder(
        &self,
        folder_uid: Uuid,
        changes: &Changes<FolderField>,
    ) -> PortResult<()> {
        let qb = render_update("note_folder", changes, true, push_folder_field);
        self.apply(where_active_uid(qb, "folder_uid", folder_uid), "folder", folder_uid)
            .await
    }

    async fn delete_folder(&self, folder_uid: Uuid, deleted_by: InternalId) -> PortResult<()> {
        self.deactivate("note_folder", "folder_uid", "folder", folder_uid, deleted_by)
            .await
    }
}

#[async_trait]
impl ChatRepository for DbAdapter {
    async fn create_conversation(
        &self,
        conversation: NewConversation,
        capacity: usize,
    ) -> PortResult<ChatConversation> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // Serializes concurrent creates on the same project until commit.
        sqlx::query_scalar::<_, i64>(
            "SELECT id FROM project WHERE id = $1 AND is_active = TRUE FOR UPDATE",
        )
        .bind(conversation.project_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("project {}", conversation.project_id)))?;

        let active = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM chat_conversations WHERE project_id = $1 AND is_active = TRUE",
        )
        .bind(conversation.project_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        if active as usize >= capacity {
            let evicted = sqlx::query_scalar::<_, Uuid>(
                "UPDATE chat_conversations SET is_active = FALSE WHERE id = ( \
                   SELECT id FROM chat_conversations WHERE project_id = $1 AND is_active = TRUE \
                   ORDER BY updated_at ASC NULLS FIRST, created_at ASC, id ASC LIMIT 1 \
                 ) RETURNING conversation_uid",
            )
            .bind(conversation.project_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?;
            if let Some(uid) = evicted {
                info!(conversation_uid = %uid, "evicted least recently updated conversation");
            }
        }

        let conversation_uid = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO chat_conversations (project_id, name, created_by) \
             VALUES ($1, $2, $3) RETURNING conversation_uid",
        )
        .bind(conversation.project_id)
        .bind(&conversation.name)
        .bind(conversation.created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        self.get_conversation_by_uid(conversation_uid).await
    }

    async fn get_conversation_by_uid(
        &self,
        conversation_uid: Uuid,
    ) -> PortResult<ChatConversation> {
        let sql =
            format!("{CONVERSATION_SELECT} WHERE c.conversation_uid = $1 AND c.is_active = TRUE");
        let record = sqlx::query_as::<_, ConversationRecord>(&sql)
            .bind(conversation_uid)
            .fetch_one(&self.pool)
            .await
            .map_err(fetch_error("conversation", conversation_uid))?;
        Ok(record.to_domain())
    }

    async fn conversations_by_project(
        &self,
        project_id: InternalId,
        limit: usize,
    ) -> PortResult<Vec<ChatConversation>> {
        let sql = format!(
            "{CONVERSATION_SELECT} WHERE c.project_id = $1 AND c.is_active = TRUE \
             ORDER BY c.updated_at DESC NULLS LAST, c.created_at DESC, c.id DESC LIMIT $2"
        );
        let records = sqlx::query_as::<_, ConversationRecord>(&sql)
            .bind(project_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(ConversationRecord::to_domain).collect())
    }

    async fn rename_conversation(
        &self,
        conversation_uid: Uuid,
        name: &str,
        updated_by: InternalId,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE chat_conversations SET name = $2, updated_at = NOW(), updated_by = $3 \
             WHERE conversation_uid = $1 AND is_active = TRUE",
        )
        .bind(conversation_uid)
        .bind(name)
        .bind(updated_by)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        ensure_affected(result, "conversation", conversation_uid)
    }

    async fn delete_conversation(&self, conversation_uid: Uuid) -> PortResult<()> {
        let result = sqlx::query(
            "DELETE FROM chat_conversations WHERE conversation_uid = $1 AND is_active = TRUE",
        )
        .bind(conversation_uid)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        ensure_affected(result, "conversation", conversation_uid)
    }

    async fn create_message(&self, message: NewMessage) -> PortResult<ChatMessage> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let conversation_uid = sqlx::query_scalar::<_, Uuid>(
            "UPDATE chat_conversations SET updated_at = NOW() \
             WHERE id = $1 AND is_active = TRUE RETURNING conversation_uid",
        )
        .bind(message.conversation_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("conversation {}", message.conversation_id)))?;

        let (id, message_uid, created_at) = sqlx::query_as::<_, (i64, Uuid, DateTime<Utc>)>(
            "INSERT INTO chat_messages (conversation_id, message_type, content, created_by) \
             VALUES ($1, $2, $3, $4) RETURNING id, message_uid, created_at",
        )
        .bind(message.conversation_id)
        .bind(message.message_type.as_str())
        .bind(&message.content)
        .bind(message.created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        Ok(ChatMessage {
            id,
            message_uid,
            conversation_id: message.conversation_id,
            conversation_uid,
            message_type: message.message_type,
            content: message.content,
            created_at,
            created_by: message.created_by,
        })
    }

    async fn messages_by_conversation(
        &self,
        conversation_id: InternalId,
    ) -> PortResult<Vec<ChatMessage>> {
        let records = sqlx::query_as::<_, MessageRecord>(
            "SELECT m.id, m.message_uid, m.conversation_id, c.conversation_uid, m.message_type, \
             m.content, m.created_at, m.created_by \
             FROM chat_messages m JOIN chat_conversations c ON c.id = m.conversation_id \
             WHERE m.conversation_id = $1 ORDER BY m.created_at ASC, m.id ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        collect(records, MessageRecord::to_domain)
    }
}

#[async_trait]
impl SettingsRepository for DbAdapter {
    async fn get_settings(&self, user_id: InternalId) -> PortResult<Option<UserSettings>> {
        let sql = format!("SELECT {SETTINGS_COLUMNS} FROM user_settings WHERE user_id = $1");
        sqlx::query_as::<_, SettingsRecord>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .map(SettingsRecord::to_domain)
            .transpose()
    }

    async fn create_settings(&self, settings: NewUserSettings) -> PortResult<UserSettings> {
        let sql = format!(
            "INSERT INTO user_settings (user_id, theme, language, timezone, \
             notifications_enabled, email_notifications, sound_enabled, compact_mode, auto_save, \
             auto_save_interval) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {SETTINGS_COLUMNS}"
        );
        sqlx::query_as::<_, SettingsRecord>(&sql)
            .bind(settings.user_id)
            .bind(settings.theme.as_str())
            .bind(settings.language.as_str())
            .bind(&settings.timezone)
            .bind(settings.notifications_enabled)
            .bind(settings.email_notifications)
            .bind(settings.sound_enabled)
            .bind(settings.compact_mode)
            .bind(settings.auto_save)
            .bind(settings.auto_save_interval)
            .fetch_one(&self.pool)
            .await
            .map_err(insert_error(format!("settings for user {} already exist", settings.user_id)))?
            .to_domain()
    }

    async fn update_settings(
        &self,
        user_id: InternalId,
        changes: &Changes<SettingsField>,
    ) -> PortResult<()> {
        let mut qb = render_update("user_settings", changes, false, push_settings_field);
        qb.push(" WHERE user_id = ").push_bind(user_id);
        debug!(sql = qb.sql(), "applying settings update");
        let result = qb.build().execute(&self.pool).await.map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("settings for user {user_id}")));
        }
        Ok(())
    }

    async fn delete_settings(&self, user_id: InternalId) -> PortResult<()> {
        sqlx::query("DELETE FROM user_settings WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
