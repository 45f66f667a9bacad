//! crates/lucid_lists_core/src/patch.rs
//!
//! The partial update engine. A sparse request (`*Patch`) is validated and turned into
//! a [`Changes`] value: the list of typed column assignments to apply, plus the audit
//! stamp. Storage adapters render that list; nothing here knows about SQL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{InternalId, Language, Priority, ProjectStatus, TaskStatus, Theme};
use crate::note_content::NoteContent;
use crate::position::validate_position;
use crate::ports::{PortError, PortResult};
use crate::validation::{require_length, validate_color, validate_name};

//=========================================================================================
// Three-state optional
//=========================================================================================

/// A request field that can be absent, explicitly `null`, or carry a value.
///
/// Use with `#[serde(default)]`: a missing key stays `Unset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Unset,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Unset
    }
}

impl<T> Patch<T> {
    pub fn is_unset(&self) -> bool {
        matches!(self, Patch::Unset)
    }

    /// `None` when unset, `Some(None)` when null.
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Patch::Unset => None,
            Patch::Null => Some(None),
            Patch::Value(v) => Some(Some(v)),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Patch<U> {
        match self {
            Patch::Unset => Patch::Unset,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(f(v)),
        }
    }

    pub fn try_map<U>(self, f: impl FnOnce(T) -> PortResult<U>) -> PortResult<Patch<U>> {
        Ok(match self {
            Patch::Unset => Patch::Unset,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(f(v)?),
        })
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

//=========================================================================================
// Staged changes
//=========================================================================================

/// Column assignments for one partial update. Always stamps `updated_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct Changes<F> {
    pub fields: Vec<F>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<InternalId>,
}

impl<F> Changes<F> {
    pub fn new(updated_by: Option<InternalId>) -> Self {
        Self {
            fields: Vec::new(),
            updated_at: Utc::now(),
            updated_by,
        }
    }

    pub fn push(&mut self, field: F) {
        self.fields.push(field);
    }

    pub fn with(mut self, field: F) -> Self {
        self.fields.push(field);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Fails with `NoFieldsToUpdate` when nothing was staged.
    pub fn ensure_not_empty(self) -> PortResult<Self> {
        if self.fields.is_empty() {
            return Err(PortError::NoFieldsToUpdate);
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectField {
    Name(String),
    Description(Option<String>),
    Status(ProjectStatus),
    Color(String),
    Position(Option<i32>),
    StartDate(Option<DateTime<Utc>>),
    EndDate(Option<DateTime<Utc>>),
    IsPrivate(bool),
    DbmlContent(Option<String>),
    DbmlLayoutData(Option<String>),
    FlowchartContent(Option<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListField {
    Name(String),
    Color(String),
    Position(i32),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskField {
    Title(String),
    Description(Option<String>),
    Priority(Option<Priority>),
    Status(TaskStatus),
    Color(String),
    Position(Option<i32>),
    IsCompleted(bool),
    DueDate(Option<DateTime<Utc>>),
    CompletedAt(Option<DateTime<Utc>>),
    ListId(InternalId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NoteField {
    Title(String),
    /// Serialized [`NoteContent`].
    Content(String),
    FolderId(Option<InternalId>),
    Position(Option<i32>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FolderField {
    Name(String),
    ParentFolderId(Option<InternalId>),
    Position(Option<i32>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsField {
    Theme(Theme),
    Language(Language),
    Timezone(String),
    NotificationsEnabled(bool),
    EmailNotifications(bool),
    SoundEnabled(bool),
    CompactMode(bool),
    AutoSave(bool),
    AutoSaveInterval(i32),
}

//=========================================================================================
// Sparse requests
//=========================================================================================

fn optional_position(position: Patch<i32>) -> PortResult<Patch<i32>> {
    position.try_map(validate_position)
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProjectPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub description: Patch<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<i32>)]
    pub position: Patch<i32>,
    #[serde(default)]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub start_date: Patch<DateTime<Utc>>,
    #[serde(default)]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub end_date: Patch<DateTime<Utc>>,
    #[serde(default)]
    pub is_private: Option<bool>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub dbml_content: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub dbml_layout_data: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub flowchart_content: Patch<String>,
}

impl ProjectPatch {
    pub fn into_changes(self, actor: InternalId) -> PortResult<Changes<ProjectField>> {
        let mut changes = Changes::new(Some(actor));
        if let Some(name) = self.name {
            changes.push(ProjectField::Name(validate_name("name", name)?));
        }
        if let Some(description) = self.description.into_option() {
            changes.push(ProjectField::Description(description));
        }
        if let Some(status) = self.status {
            changes.push(ProjectField::Status(status.parse()?));
        }
        if let Some(color) = self.color {
            changes.push(ProjectField::Color(validate_color(color)?));
        }
        if let Some(position) = optional_position(self.position)?.into_option() {
            changes.push(ProjectField::Position(position));
        }
        if let Some(start) = self.start_date.into_option() {
            changes.push(ProjectField::StartDate(start));
        }
        if let Some(end) = self.end_date.into_option() {
            changes.push(ProjectField::EndDate(end));
        }
        if let Some(is_private) = self.is_private {
            changes.push(ProjectField::IsPrivate(is_private));
        }
        if let Some(dbml) = self.dbml_content.into_option() {
            changes.push(ProjectField::DbmlContent(dbml));
        }
        if let Some(layout) = self.dbml_layout_data.into_option() {
            changes.push(ProjectField::DbmlLayoutData(layout));
        }
        if let Some(flowchart) = self.flowchart_content.into_option() {
            changes.push(ProjectField::FlowchartContent(flowchart));
        }
        changes.ensure_not_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ListPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
}

impl ListPatch {
    pub fn into_changes(self, actor: InternalId) -> PortResult<Changes<ListField>> {
        let mut changes = Changes::new(Some(actor));
        if let Some(name) = self.name {
            changes.push(ListField::Name(validate_name("name", name)?));
        }
        if let Some(color) = self.color {
            changes.push(ListField::Color(validate_color(color)?));
        }
        if let Some(position) = self.position {
            changes.push(ListField::Position(validate_position(position)?));
        }
        changes.ensure_not_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub description: Patch<String>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub priority: Patch<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<i32>)]
    pub position: Patch<i32>,
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default)]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub due_date: Patch<DateTime<Utc>>,
}

impl TaskPatch {
    /// `status` and `is_completed` both drive `completed_at`; when both are present a
    /// single assignment is emitted and `is_completed` decides it.
    pub fn into_changes(self, actor: InternalId) -> PortResult<Changes<TaskField>> {
        let mut changes = Changes::new(Some(actor));
        if let Some(title) = self.title {
            changes.push(TaskField::Title(validate_name("title", title)?));
        }
        if let Some(description) = self.description.into_option() {
            changes.push(TaskField::Description(description));
        }
        if let Some(priority) = self.priority.try_map(|p| p.parse::<Priority>())?.into_option() {
            changes.push(TaskField::Priority(priority));
        }
        let mut done_by_status = None;
        if let Some(status) = self.status {
            let status: TaskStatus = status.parse()?;
            done_by_status = Some(status.implies_completion());
            changes.push(TaskField::Status(status));
        }
        if let Some(color) = self.color {
            changes.push(TaskField::Color(validate_color(color)?));
        }
        if let Some(position) = optional_position(self.position)?.into_option() {
            changes.push(TaskField::Position(position));
        }
        if let Some(is_completed) = self.is_completed {
            changes.push(TaskField::IsCompleted(is_completed));
        }
        if let Some(due_date) = self.due_date.into_option() {
            changes.push(TaskField::DueDate(due_date));
        }
        let mut changes = changes.ensure_not_empty()?;

        if let Some(done) = self.is_completed.or(done_by_status) {
            let completed_at = done.then_some(changes.updated_at);
            changes.push(TaskField::CompletedAt(completed_at));
        }
        Ok(changes)
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NotePatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<NoteContent>,
    /// `null` files the note at the project root.
    #[serde(default)]
    #[schema(value_type = Option<Uuid>)]
    pub folder_uid: Patch<Uuid>,
    #[serde(default)]
    #[schema(value_type = Option<i32>)]
    pub position: Patch<i32>,
}

impl NotePatch {
    /// `folder_id` is `folder_uid` already resolved (and checked) by the caller.
    pub fn into_changes(
        self,
        folder_id: Patch<InternalId>,
        actor: InternalId,
    ) -> PortResult<Changes<NoteField>> {
        let mut changes = Changes::new(Some(actor));
        if let Some(title) = self.title {
            changes.push(NoteField::Title(validate_name("title", title)?));
        }
        if let Some(content) = self.content {
            content.validate()?;
            changes.push(NoteField::Content(content.to_json()?));
        }
        if let Some(folder_id) = folder_id.into_option() {
            changes.push(NoteField::FolderId(folder_id));
        }
        if let Some(position) = optional_position(self.position)?.into_option() {
            changes.push(NoteField::Position(position));
        }
        changes.ensure_not_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct FolderPatch {
    #[serde(default)]
    pub name: Option<String>,
    /// `null` moves the folder to the project root.
    #[serde(default)]
    #[schema(value_type = Option<Uuid>)]
    pub parent_folder_uid: Patch<Uuid>,
    #[serde(default)]
    #[schema(value_type = Option<i32>)]
    pub position: Patch<i32>,
}

impl FolderPatch {
    /// `parent_folder_id` is `parent_folder_uid` already resolved by the caller.
    pub fn into_changes(
        self,
        parent_folder_id: Patch<InternalId>,
        actor: InternalId,
    ) -> PortResult<Changes<FolderField>> {
        let mut changes = Changes::new(Some(actor));
        if let Some(name) = self.name {
            changes.push(FolderField::Name(validate_name("name", name)?));
        }
        if let Some(parent) = parent_folder_id.into_option() {
            changes.push(FolderField::ParentFolderId(parent));
        }
        if let Some(position) = optional_position(self.position)?.into_option() {
            changes.push(FolderField::Position(position));
        }
        changes.ensure_not_empty()
    }
}

pub const MIN_AUTO_SAVE_INTERVAL: i32 = 10;
pub const MAX_AUTO_SAVE_INTERVAL: i32 = 600;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SettingsPatch {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub notifications_enabled: Option<bool>,
    #[serde(default)]
    pub email_notifications: Option<bool>,
    #[serde(default)]
    pub sound_enabled: Option<bool>,
    #[serde(default)]
    pub compact_mode: Option<bool>,
    #[serde(default)]
    pub auto_save: Option<bool>,
    /// Seconds, 10 to 600.
    #[serde(default)]
    pub auto_save_interval: Option<i32>,
}

impl SettingsPatch {
    pub fn into_changes(self) -> PortResult<Changes<SettingsField>> {
        let mut changes = Changes::new(None);
        if let Some(theme) = self.theme {
            changes.push(SettingsField::Theme(theme.parse()?));
        }
        if let Some(language) = self.language {
            changes.push(SettingsField::Language(language.parse()?));
        }
        if let Some(timezone) = self.timezone {
            require_length("timezone", &timezone, 1, 100)?;
            changes.push(SettingsField::Timezone(timezone));
        }
        let toggles: [(Option<bool>, fn(bool) -> SettingsField); 5] = [
            (self.notifications_enabled, SettingsField::NotificationsEnabled),
            (self.email_notifications, SettingsField::EmailNotifications),
            (self.sound_enabled, SettingsField::SoundEnabled),
            (self.compact_mode, SettingsField::CompactMode),
            (self.auto_save, SettingsField::AutoSave),
        ];
        for (value, field) in toggles {
            if let Some(value) = value {
                changes.push(field(value));
            }
        }
        if let Some(interval) = self.auto_save_interval {
            if !(MIN_AUTO_SAVE_INTERVAL..=MAX_AUTO_SAVE_INTERVAL).contains(&interval) {
                return Err(PortError::BadRequest(format!(
                    "auto_save_interval must be between {MIN_AUTO_SAVE_INTERVAL} \
                     and {MAX_AUTO_SAVE_INTERVAL} seconds"
                )));
            }
            changes.push(SettingsField::AutoSaveInterval(interval));
        }
        changes.ensure_not_empty()
    }
}
