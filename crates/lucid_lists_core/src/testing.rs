//! crates/lucid_lists_core/src/testing.rs
//!
//! In-memory implementations of every port, used by the service tests. Reads follow the
//! same active filtering and ordering rules as the Postgres adapter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::*;
use crate::dto::{ProjectView, RegisterRequest};
use crate::patch::{
    Changes, FolderField, ListField, NoteField, ProjectField, SettingsField, TaskField,
};
use crate::position::{display_key, SiblingScope};
use crate::ports::*;
use crate::services::Services;

#[derive(Default)]
struct State {
    next_id: InternalId,
    users: Vec<User>,
    projects: Vec<Project>,
    members: Vec<(InternalId, InternalId, MemberRole, chrono::DateTime<Utc>)>,
    lists: Vec<List>,
    tasks: Vec<Task>,
    canvases: Vec<Canvas>,
    folders: Vec<NoteFolder>,
    notes: Vec<Note>,
    conversations: Vec<ChatConversation>,
    messages: Vec<ChatMessage>,
    settings: Vec<UserSettings>,
    /// Rows a concurrent request inserts just before the next matching create.
    racing_canvas: Option<(InternalId, String)>,
    racing_settings: Option<NewUserSettings>,
}

impl State {
    fn next_id(&mut self) -> InternalId {
        self.next_id += 1;
        self.next_id
    }

    fn active_project(&self, id: InternalId) -> PortResult<&Project> {
        self.projects
            .iter()
            .find(|p| p.id == id && p.is_active)
            .ok_or_else(|| PortError::NotFound(format!("project {id}")))
    }

    fn active_list_by_id(&self, id: InternalId) -> PortResult<&List> {
        self.lists
            .iter()
            .find(|l| l.id == id && l.is_active)
            .ok_or_else(|| PortError::NotFound(format!("list {id}")))
    }

    fn insert_canvas(
        &mut self,
        project_id: InternalId,
        state_json: &str,
        created_by: InternalId,
    ) -> PortResult<Canvas> {
        if self.canvases.iter().any(|c| c.project_id == project_id && c.is_active) {
            return Err(PortError::Conflict("project already has a canvas".to_string()));
        }
        let project_uid = self.active_project(project_id)?.project_uid;
        let record = Canvas {
            id: self.next_id(),
            canvas_uid: Uuid::new_v4(),
            project_id,
            project_uid,
            state_json: state_json.to_string(),
            created_at: Utc::now(),
            created_by: Some(created_by),
            updated_at: None,
            updated_by: None,
            is_active: true,
        };
        self.canvases.push(record.clone());
        Ok(record)
    }

    fn insert_settings(&mut self, settings: NewUserSettings) -> PortResult<UserSettings> {
        if self.settings.iter().any(|s| s.user_id == settings.user_id) {
            return Err(PortError::Conflict("settings already exist".to_string()));
        }
        let now = Utc::now();
        let record = UserSettings {
            id: self.next_id(),
            settings_uid: Uuid::new_v4(),
            user_id: settings.user_id,
            theme: settings.theme,
            language: settings.language,
            timezone: settings.timezone,
            notifications_enabled: settings.notifications_enabled,
            email_notifications: settings.email_notifications,
            sound_enabled: settings.sound_enabled,
            compact_mode: settings.compact_mode,
            auto_save: settings.auto_save,
            auto_save_interval: settings.auto_save_interval,
            created_at: now,
            updated_at: now,
        };
        self.settings.push(record.clone());
        Ok(record)
    }

    fn folder_uid(&self, id: Option<InternalId>) -> Option<Uuid> {
        id.and_then(|id| self.folders.iter().find(|f| f.id == id).map(|f| f.folder_uid))
    }
}

fn not_found(kind: &str, uid: Uuid) -> PortError {
    PortError::NotFound(format!("{kind} with uid {uid}"))
}

/// Every repository port backed by vectors behind a mutex.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("in-memory store mutex poisoned")
    }

    /// Direct row lookups that bypass the active filter.
    pub fn project_row(&self, uid: Uuid) -> Option<Project> {
        self.state().projects.iter().find(|p| p.project_uid == uid).cloned()
    }

    pub fn task_row(&self, uid: Uuid) -> Option<Task> {
        self.state().tasks.iter().find(|t| t.task_uid == uid).cloned()
    }

    pub fn note_row(&self, uid: Uuid) -> Option<Note> {
        self.state().notes.iter().find(|n| n.note_uid == uid).cloned()
    }

    pub fn canvas_rows(&self) -> Vec<Canvas> {
        self.state().canvases.clone()
    }

    pub fn conversation_rows(&self) -> Vec<ChatConversation> {
        self.state().conversations.clone()
    }

    pub fn settings_row(&self, user_id: InternalId) -> Option<UserSettings> {
        self.state().settings.iter().find(|s| s.user_id == user_id).cloned()
    }

    /// The next `create_canvas` loses to a concurrent insert of `state_json`.
    pub fn race_next_canvas_create(&self, project_id: InternalId, state_json: &str) {
        self.state().racing_canvas = Some((project_id, state_json.to_string()));
    }

    /// The next `create_settings` loses to a concurrent insert of `settings`.
    pub fn race_next_settings_create(&self, settings: NewUserSettings) {
        self.state().racing_settings = Some(settings);
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> PortResult<User> {
        let mut state = self.state();
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(PortError::Conflict(format!("email {} already registered", user.email)));
        }
        let now = Utc::now();
        let record = User {
            id: state.next_id(),
            user_uid: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            created_at: now,
            updated_at: now,
            is_active: true,
        };
        state.users.push(record.clone());
        Ok(record)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<User> {
        self.state()
            .users
            .iter()
            .find(|u| u.email == email && u.is_active)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("user {email}")))
    }

    async fn get_user_by_id(&self, user_id: InternalId) -> PortResult<User> {
        self.state()
            .users
            .iter()
            .find(|u| u.id == user_id && u.is_active)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("user {user_id}")))
    }
}

#[async_trait]
impl ProjectRepository for InMemoryStore {
    async fn create_project_with_owner(&self, project: NewProject) -> PortResult<Project> {
        let mut state = self.state();
        let now = Utc::now();
        let record = Project {
            id: state.next_id(),
            project_uid: Uuid::new_v4(),
            user_id: project.user_id,
            name: project.name,
            description: project.description,
            status: project.status,
            color: project.color,
            position: project.position,
            start_date: project.start_date,
            end_date: project.end_date,
            is_private: project.is_private,
            dbml_content: project.dbml_content,
            dbml_layout_data: project.dbml_layout_data,
            flowchart_content: project.flowchart_content,
            created_at: now,
            created_by: Some(project.user_id),
            updated_at: None,
            updated_by: None,
            is_active: true,
        };
        state.projects.push(record.clone());
        state.members.push((record.id, record.user_id, MemberRole::Owner, now));
        Ok(record)
    }

    async fn get_project_by_uid(&self, project_uid: Uuid) -> PortResult<Project> {
        self.state()
            .projects
            .iter()
            .find(|p| p.project_uid == project_uid && p.is_active)
            .cloned()
            .ok_or_else(|| not_found("project", project_uid))
    }

    async fn projects_for_member(&self, user_id: InternalId) -> PortResult<Vec<Project>> {
        let state = self.state();
        let mut projects: Vec<Project> = state
            .projects
            .iter()
            .filter(|p| p.is_active)
            .filter(|p| state.members.iter().any(|m| m.0 == p.id && m.1 == user_id))
            .cloned()
            .collect();
        projects.sort_by(|a, b| {
            display_key(a.position)
                .cmp(&display_key(b.position))
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(projects)
    }

    async fn update_project(
        &self,
        project_uid: Uuid,
        changes: &Changes<ProjectField>,
    ) -> PortResult<()> {
        let mut state = self.state();
        let project = state
            .projects
            .iter_mut()
            .find(|p| p.project_uid == project_uid && p.is_active)
            .ok_or_else(|| not_found("project", project_uid))?;
        for field in &changes.fields {
            match field.clone() {
                ProjectField::Name(v) => project.name = v,
                ProjectField::Description(v) => project.description = v,
                ProjectField::Status(v) => project.status = v,
                ProjectField::Color(v) => project.color = v,
                ProjectField::Position(v) => project.position = v,
                ProjectField::StartDate(v) => project.start_date = v,
                ProjectField::EndDate(v) => project.end_date = v,
                ProjectField::IsPrivate(v) => project.is_private = v,
                ProjectField::DbmlContent(v) => project.dbml_content = v,
                ProjectField::DbmlLayoutData(v) => project.dbml_layout_data = v,
                ProjectField::FlowchartContent(v) => project.flowchart_content = v,
            }
        }
        project.updated_at = Some(changes.updated_at);
        project.updated_by = changes.updated_by;
        Ok(())
    }

    async fn delete_project(&self, project_uid: Uuid, deleted_by: InternalId) -> PortResult<()> {
        let mut state = self.state();
        let project = state
            .projects
            .iter_mut()
            .find(|p| p.project_uid == project_uid && p.is_active)
            .ok_or_else(|| not_found("project", project_uid))?;
        project.is_active = false;
        project.updated_at = Some(Utc::now());
        project.updated_by = Some(deleted_by);
        Ok(())
    }

    async fn count_project_tasks(&self, project_id: InternalId) -> PortResult<TaskCounts> {
        let state = self.state();
        let mut counts = TaskCounts::default();
        for task in state.tasks.iter().filter(|t| t.is_active) {
            let in_project = state
                .lists
                .iter()
                .any(|l| l.id == task.list_id && l.is_active && l.project_id == project_id);
            if in_project {
                counts.total += 1;
                if task.is_completed {
                    counts.completed += 1;
                }
            }
        }
        Ok(counts)
    }
}

#[async_trait]
impl MembershipRepository for InMemoryStore {
    async fn add_member(
        &self,
        project_id: InternalId,
        user_id: InternalId,
        role: MemberRole,
    ) -> PortResult<()> {
        let mut state = self.state();
        if state.members.iter().any(|m| m.0 == project_id && m.1 == user_id) {
            return Err(PortError::Conflict("user is already a member".to_string()));
        }
        state.members.push((project_id, user_id, role, Utc::now()));
        Ok(())
    }

    async fn is_member(&self, project_id: InternalId, user_id: InternalId) -> PortResult<bool> {
        Ok(self.state().members.iter().any(|m| m.0 == project_id && m.1 == user_id))
    }

    async fn list_members(&self, project_id: InternalId) -> PortResult<Vec<ProjectMember>> {
        let state = self.state();
        let mut members: Vec<ProjectMember> = state
            .members
            .iter()
            .filter(|m| m.0 == project_id)
            .filter_map(|&(project_id, user_id, role, joined_at)| {
                state.users.iter().find(|u| u.id == user_id).map(|u| ProjectMember {
                    project_id,
                    user_id,
                    user_uid: u.user_uid,
                    email: u.email.clone(),
                    name: u.name.clone(),
                    role,
                    joined_at,
                })
            })
            .collect();
        members.sort_by_key(|m| m.joined_at);
        Ok(members)
    }

    async fn resolve_project_id(&self, resource: ResourceRef) -> PortResult<InternalId> {
        let state = self.state();
        let uid = resource.uid();
        let missing = || not_found(resource.kind(), uid);
        let project_id = match resource {
            ResourceRef::Project(uid) => state
                .projects
                .iter()
                .find(|p| p.project_uid == uid && p.is_active)
                .map(|p| p.id)
                .ok_or_else(missing)?,
            ResourceRef::List(uid) => state
                .lists
                .iter()
                .find(|l| l.list_uid == uid && l.is_active)
                .map(|l| l.project_id)
                .ok_or_else(missing)?,
            ResourceRef::Task(uid) => {
                let task = state
                    .tasks
                    .iter()
                    .find(|t| t.task_uid == uid && t.is_active)
                    .ok_or_else(missing)?;
                state.active_list_by_id(task.list_id).map_err(|_| missing())?.project_id
            }
            ResourceRef::Note(uid) => state
                .notes
                .iter()
                .find(|n| n.note_uid == uid && n.is_active)
                .map(|n| n.project_id)
                .ok_or_else(missing)?,
            ResourceRef::Folder(uid) => state
                .folders
                .iter()
                .find(|f| f.folder_uid == uid && f.is_active)
                .map(|f| f.project_id)
                .ok_or_else(missing)?,
            ResourceRef::Conversation(uid) => state
                .conversations
                .iter()
                .find(|c| c.conversation_uid == uid && c.is_active)
                .map(|c| c.project_id)
                .ok_or_else(missing)?,
        };
        state.active_project(project_id).map_err(|_| missing())?;
        Ok(project_id)
    }
}

#[async_trait]
impl PositionRepository for InMemoryStore {
    async fn max_position(&self, scope: &SiblingScope) -> PortResult<Option<i32>> {
        let state = self.state();
        let max = match *scope {
            SiblingScope::ProjectsOf(owner) => state
                .projects
                .iter()
                .filter(|p| p.is_active && p.user_id == owner)
                .filter_map(|p| p.position)
                .max(),
            SiblingScope::ListsOf(project_id) => state
                .lists
                .iter()
                .filter(|l| l.is_active && l.project_id == project_id)
                .map(|l| l.position)
                .max(),
            SiblingScope::TasksOf(list_id) => state
                .tasks
                .iter()
                .filter(|t| t.is_active && t.list_id == list_id)
                .filter_map(|t| t.position)
                .max(),
            SiblingScope::FoldersOf { project_id, parent_folder_id } => state
                .folders
                .iter()
                .filter(|f| {
                    f.is_active
                        && f.project_id == project_id
                        && f.parent_folder_id == parent_folder_id
                })
                .filter_map(|f| f.position)
                .max(),
            SiblingScope::NotesOf { project_id, folder_id } => state
                .notes
                .iter()
                .filter(|n| n.is_active && n.project_id == project_id && n.folder_id == folder_id)
                .filter_map(|n| n.position)
                .max(),
        };
        Ok(max)
    }
}

#[async_trait]
impl ListRepository for InMemoryStore {
    async fn create_list(&self, list: NewList) -> PortResult<List> {
        let mut state = self.state();
        let project_uid = state.active_project(list.project_id)?.project_uid;
        let record = List {
            id: state.next_id(),
            list_uid: Uuid::new_v4(),
            project_id: list.project_id,
            project_uid,
            name: list.name,
            color: list.color,
            position: list.position,
            created_at: Utc::now(),
            created_by: list.created_by,
            updated_at: None,
            updated_by: None,
            is_active: true,
        };
        state.lists.push(record.clone());
        Ok(record)
    }

    async fn get_list_by_uid(&self, list_uid: Uuid) -> PortResult<List> {
        self.state()
            .lists
            .iter()
            .find(|l| l.list_uid == list_uid && l.is_active)
            .cloned()
            .ok_or_else(|| not_found("list", list_uid))
    }

    async fn lists_by_project(&self, project_id: InternalId) -> PortResult<Vec<List>> {
        let mut lists: Vec<List> = self
            .state()
            .lists
            .iter()
            .filter(|l| l.is_active && l.project_id == project_id)
            .cloned()
            .collect();
        lists.sort_by(|a, b| a.position.cmp(&b.position).then(a.created_at.cmp(&b.created_at)));
        Ok(lists)
    }

    async fn update_list(&self, list_uid: Uuid, changes: &Changes<ListField>) -> PortResult<()> {
        let mut state = self.state();
        let list = state
            .lists
            .iter_mut()
            .find(|l| l.list_uid == list_uid && l.is_active)
            .ok_or_else(|| not_found("list", list_uid))?;
        for field in &changes.fields {
            match field.clone() {
                ListField::Name(v) => list.name = v,
                ListField::Color(v) => list.color = v,
                ListField::Position(v) => list.position = v,
            }
        }
        list.updated_at = Some(changes.updated_at);
        list.updated_by = changes.updated_by;
        Ok(())
    }

    async fn delete_list(&self, list_uid: Uuid, deleted_by: InternalId) -> PortResult<()> {
        let mut state = self.state();
        let list = state
            .lists
            .iter_mut()
            .find(|l| l.list_uid == list_uid && l.is_active)
            .ok_or_else(|| not_found("list", list_uid))?;
        list.is_active = false;
        list.updated_at = Some(Utc::now());
        list.updated_by = Some(deleted_by);
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn create_task(&self, task: NewTask) -> PortResult<Task> {
        let mut state = self.state();
        let list_uid = state.active_list_by_id(task.list_id)?.list_uid;
        let record = Task {
            id: state.next_id(),
            task_uid: Uuid::new_v4(),
            list_id: task.list_id,
            list_uid,
            title: task.title,
            description: task.description,
            priority: task.priority,
            status: task.status,
            color: task.color,
            position: task.position,
            is_completed: task.is_completed,
            due_date: task.due_date,
            completed_at: task.completed_at,
            created_at: Utc::now(),
            created_by: task.created_by,
            updated_at: None,
            updated_by: None,
            is_active: true,
        };
        state.tasks.push(record.clone());
        Ok(record)
    }

    async fn get_task_by_uid(&self, task_uid: Uuid) -> PortResult<Task> {
        self.state()
            .tasks
            .iter()
            .find(|t| t.task_uid == task_uid && t.is_active)
            .cloned()
            .ok_or_else(|| not_found("task", task_uid))
    }

    async fn tasks_by_list(&self, list_id: InternalId) -> PortResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .state()
            .tasks
            .iter()
            .filter(|t| t.is_active && t.list_id == list_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| {
            display_key(a.position)
                .cmp(&display_key(b.position))
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(tasks)
    }

    async fn update_task(&self, task_uid: Uuid, changes: &Changes<TaskField>) -> PortResult<()> {
        let mut state = self.state();
        let mut moved_to = None;
        for field in &changes.fields {
            if let TaskField::ListId(list_id) = field {
                moved_to = Some(state.active_list_by_id(*list_id)?.list_uid);
            }
        }
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.task_uid == task_uid && t.is_active)
            .ok_or_else(|| not_found("task", task_uid))?;
        for field in &changes.fields {
            match field.clone() {
                TaskField::Title(v) => task.title = v,
                TaskField::Description(v) => task.description = v,
                TaskField::Priority(v) => task.priority = v,
                TaskField::Status(v) => task.status = v,
                TaskField::Color(v) => task.color = v,
                TaskField::Position(v) => task.position = v,
                TaskField::IsCompleted(v) => task.is_completed = v,
                TaskField::DueDate(v) => task.due_date = v,
                TaskField::CompletedAt(v) => task.completed_at = v,
                TaskField::ListId(v) => task.list_id = v,
            }
        }
        if let Some(list_uid) = moved_to {
            task.list_uid = list_uid;
        }
        task.updated_at = Some(changes.updated_at);
        task.updated_by = changes.updated_by;
        Ok(())
    }

    async fn delete_task(&self, task_uid: Uuid, deleted_by: InternalId) -> PortResult<()> {
        let mut state = self.state();
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.task_uid == task_uid && t.is_active)
            .ok_or_else(|| not_found("task", task_uid))?;
        task.is_active = false;
        task.updated_at = Some(Utc::now());
        task.updated_by = Some(deleted_by);
        Ok(())
    }
}

#[async_trait]
impl CanvasRepository for InMemoryStore {
    async fn get_canvas(&self, project_id: InternalId) -> PortResult<Option<Canvas>> {
        Ok(self
            .state()
            .canvases
            .iter()
            .find(|c| c.project_id == project_id && c.is_active)
            .cloned())
    }

    async fn create_canvas(
        &self,
        project_id: InternalId,
        state_json: &str,
        created_by: InternalId,
    ) -> PortResult<Canvas> {
        let mut state = self.state();
        if let Some((racing_project, racing_json)) = state.racing_canvas.take() {
            state.insert_canvas(racing_project, &racing_json, created_by)?;
        }
        state.insert_canvas(project_id, state_json, created_by)
    }

    async fn update_canvas(
        &self,
        project_id: InternalId,
        state_json: &str,
        updated_by: InternalId,
    ) -> PortResult<()> {
        let mut state = self.state();
        let canvas = state
            .canvases
            .iter_mut()
            .find(|c| c.project_id == project_id && c.is_active)
            .ok_or_else(|| PortError::NotFound(format!("canvas for project {project_id}")))?;
        canvas.state_json = state_json.to_string();
        canvas.updated_at = Some(Utc::now());
        canvas.updated_by = Some(updated_by);
        Ok(())
    }

    async fn delete_canvas(
        &self,
        project_id: InternalId,
        deleted_by: InternalId,
    ) -> PortResult<()> {
        let mut state = self.state();
        let canvas = state
            .canvases
            .iter_mut()
            .find(|c| c.project_id == project_id && c.is_active)
            .ok_or_else(|| PortError::NotFound(format!("canvas for project {project_id}")))?;
        canvas.is_active = false;
        canvas.updated_at = Some(Utc::now());
        canvas.updated_by = Some(deleted_by);
        Ok(())
    }
}

#[async_trait]
impl NoteRepository for InMemoryStore {
    async fn create_note(&self, note: NewNote) -> PortResult<Note> {
        let mut state = self.state();
        let project_uid = state.active_project(note.project_id)?.project_uid;
        let folder_uid = state.folder_uid(note.folder_id);
        let record = Note {
            id: state.next_id(),
            note_uid: Uuid::new_v4(),
            project_id: note.project_id,
            project_uid,
            folder_id: note.folder_id,
            folder_uid,
            title: note.title,
            content_json: note.content_json,
            position: Some(note.position),
            created_at: Utc::now(),
            created_by: note.created_by,
            updated_at: None,
            updated_by: None,
            is_active: true,
        };
        state.notes.push(record.clone());
        Ok(record)
    }

    async fn get_note_by_uid(&self, note_uid: Uuid) -> PortResult<Note> {
        self.state()
            .notes
            .iter()
            .find(|n| n.note_uid == note_uid && n.is_active)
            .cloned()
            .ok_or_else(|| not_found("note", note_uid))
    }

    async fn notes_by_project(&self, project_id: InternalId) -> PortResult<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .state()
            .notes
            .iter()
            .filter(|n| n.is_active && n.project_id == project_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| {
            display_key(a.position)
                .cmp(&display_key(b.position))
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(notes)
    }

    async fn update_note(&self, note_uid: Uuid, changes: &Changes<NoteField>) -> PortResult<()> {
        let mut state = self.state();
        let mut new_folder_uid = None;
        for field in &changes.fields {
            if let NoteField::FolderId(folder_id) = field {
                new_folder_uid = Some(state.folder_uid(*folder_id));
            }
        }
        let note = state
            .notes
            .iter_mut()
            .find(|n| n.note_uid == note_uid && n.is_active)
            .ok_or_else(|| not_found("note", note_uid))?;
        for field in &changes.fields {
            match field.clone() {
                NoteField::Title(v) => note.title = v,
                NoteField::Content(v) => note.content_json = v,
                NoteField::FolderId(v) => note.folder_id = v,
                NoteField::Position(v) => note.position = v,
            }
        }
        if let Some(folder_uid) = new_folder_uid {
            note.folder_uid = folder_uid;
        }
        note.updated_at = Some(changes.updated_at);
        note.updated_by = changes.updated_by;
        Ok(())
    }

    async fn delete_note(&self, note_uid: Uuid, deleted_by: InternalId) -> PortResult<()> {
        let mut state = self.state();
        let note = state
            .notes
            .iter_mut()
            .find(|n| n.note_uid == note_uid && n.is_active)
            .ok_or_else(|| not_found("note", note_uid))?;
        note.is_active = false;
        note.updated_at = Some(Utc::now());
        note.updated_by = Some(deleted_by);
        Ok(())
    }
}

#[async_trait]
impl FolderRepository for InMemoryStore {
    async fn create_folder(&self, folder: NewNoteFolder) -> PortResult<NoteFolder> {
        let mut state = self.state();
        let project_uid = state.active_project(folder.project_id)?.project_uid;
        let parent_folder_uid = state.folder_uid(folder.parent_folder_id);
        let record = NoteFolder {
            id: state.next_id(),
            folder_uid: Uuid::new_v4(),
            project_id: folder.project_id,
            project_uid,
            parent_folder_id: folder.parent_folder_id,
            parent_folder_uid,
            name: folder.name,
            position: Some(folder.position),
            created_at: Utc::now(),
            created_by: folder.created_by,
            updated_at: None,
            updated_by: None,
            is_active: true,
        };
        state.folders.push(record.clone());
        Ok(record)
    }

    async fn get_folder_by_uid(&self, folder_uid: Uuid) -> PortResult<NoteFolder> {
        self.state()
            .folders
            .iter()
            .find(|f| f.folder_uid == folder_uid && f.is_active)
            .cloned()
            .ok_or_else(|| not_found("folder", folder_uid))
    }

    async fn folders_by_project(&self, project_id: InternalId) -> PortResult<Vec<NoteFolder>> {
        let mut folders: Vec<NoteFolder> = self
            .state()
            .folders
            .iter()
            .filter(|f| f.is_active && f.project_id == project_id)
            .cloned()
            .collect();
        folders.sort_by(|a, b| {
            display_key(a.position)
                .cmp(&display_key(b.position))
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(folders)
    }

    async fn update_folder(
        &self,
        folder_uid: Uuid,
        changes: &Changes<FolderField>,
    ) -> PortResult<()> {
        let mut state = self.state();
        let mut new_parent_uid = None;
        for field in &changes.fields {
            if let FolderField::ParentFolderId(parent) = field {
                new_parent_uid = Some(state.folder_uid(*parent));
            }
        }
        let folder = state
            .folders
            .iter_mut()
            .find(|f| f.folder_uid == folder_uid && f.is_active)
            .ok_or_else(|| not_found("folder", folder_uid))?;
        for field in &changes.fields {
            match field.clone() {
                FolderField::Name(v) => folder.name = v,
                FolderField::ParentFolderId(v) => folder.parent_folder_id = v,
                FolderField::Position(v) => folder.position = v,
            }
        }
        if let Some(parent_uid) = new_parent_uid {
            folder.parent_folder_uid = parent_uid;
        }
        folder.updated_at = Some(changes.updated_at);
        folder.updated_by = changes.updated_by;
        Ok(())
    }

    async fn delete_folder(&self, folder_uid: Uuid, deleted_by: InternalId) -> PortResult<()> {
        let mut state = self.state();
        let folder = state
            .folders
            .iter_mut()
            .find(|f| f.folder_uid == folder_uid && f.is_active)
            .ok_or_else(|| not_found("folder", folder_uid))?;
        folder.is_active = false;
        folder.updated_at = Some(Utc::now());
        folder.updated_by = Some(deleted_by);
        Ok(())
    }
}

#[async_trait]
impl ChatRepository for InMemoryStore {
    async fn create_conversation(
        &self,
        conversation: NewConversation,
        capacity: usize,
    ) -> PortResult<ChatConversation> {
        let mut state = self.state();
        let project_uid = state.active_project(conversation.project_id)?.project_uid;
        let active = state
            .conversations
            .iter()
            .filter(|c| c.is_active && c.project_id == conversation.project_id)
            .count();
        if active >= capacity {
            // updated_at ASC NULLS FIRST, created_at ASC, id ASC
            let oldest = state
                .conversations
                .iter_mut()
                .filter(|c| c.is_active && c.project_id == conversation.project_id)
                .min_by(|a, b| {
                    a.updated_at
                        .cmp(&b.updated_at)
                        .then(a.created_at.cmp(&b.created_at))
                        .then(a.id.cmp(&b.id))
                });
            if let Some(oldest) = oldest {
                oldest.is_active = false;
            }
        }
        let record = ChatConversation {
            id: state.next_id(),
            conversation_uid: Uuid::new_v4(),
            project_id: conversation.project_id,
            project_uid,
            name: conversation.name,
            created_at: Utc::now(),
            created_by: conversation.created_by,
            updated_at: None,
            updated_by: None,
            is_active: true,
        };
        state.conversations.push(record.clone());
        Ok(record)
    }

    async fn get_conversation_by_uid(
        &self,
        conversation_uid: Uuid,
    ) -> PortResult<ChatConversation> {
        self.state()
            .conversations
            .iter()
            .find(|c| c.conversation_uid == conversation_uid && c.is_active)
            .cloned()
            .ok_or_else(|| not_found("conversation", conversation_uid))
    }

    async fn conversations_by_project(
        &self,
        project_id: InternalId,
        limit: usize,
    ) -> PortResult<Vec<ChatConversation>> {
        let mut conversations: Vec<ChatConversation> = self
            .state()
            .conversations
            .iter()
            .filter(|c| c.is_active && c.project_id == project_id)
            .cloned()
            .collect();
        // updated_at DESC NULLS LAST, created_at DESC
        conversations.sort_by(|a, b| {
            let by_update = match (a.updated_at, b.updated_at) {
                (Some(x), Some(y)) => y.cmp(&x),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            };
            by_update.then(b.created_at.cmp(&a.created_at)).then(b.id.cmp(&a.id))
        });
        conversations.truncate(limit);
        Ok(conversations)
    }

    async fn rename_conversation(
        &self,
        conversation_uid: Uuid,
        name: &str,
        updated_by: InternalId,
    ) -> PortResult<()> {
        let mut state = self.state();
        let conversation = state
            .conversations
            .iter_mut()
            .find(|c| c.conversation_uid == conversation_uid && c.is_active)
            .ok_or_else(|| not_found("conversation", conversation_uid))?;
        conversation.name = name.to_string();
        conversation.updated_at = Some(Utc::now());
        conversation.updated_by = Some(updated_by);
        Ok(())
    }

    async fn delete_conversation(&self, conversation_uid: Uuid) -> PortResult<()> {
        let mut state = self.state();
        let id = state
            .conversations
            .iter()
            .find(|c| c.conversation_uid == conversation_uid && c.is_active)
            .map(|c| c.id)
            .ok_or_else(|| not_found("conversation", conversation_uid))?;
        state.conversations.retain(|c| c.id != id);
        state.messages.retain(|m| m.conversation_id != id);
        Ok(())
    }

    async fn create_message(&self, message: NewMessage) -> PortResult<ChatMessage> {
        let mut state = self.state();
        let now = Utc::now();
        let conversation = state
            .conversations
            .iter_mut()
            .find(|c| c.id == message.conversation_id && c.is_active)
            .ok_or_else(|| {
                PortError::NotFound(format!("conversation {}", message.conversation_id))
            })?;
        conversation.updated_at = Some(now);
        let conversation_uid = conversation.conversation_uid;
        let record = ChatMessage {
            id: state.next_id(),
            message_uid: Uuid::new_v4(),
            conversation_id: message.conversation_id,
            conversation_uid,
            message_type: message.message_type,
            content: message.content,
            created_at: now,
            created_by: message.created_by,
        };
        state.messages.push(record.clone());
        Ok(record)
    }

    async fn messages_by_conversation(
        &self,
        conversation_id: InternalId,
    ) -> PortResult<Vec<ChatMessage>> {
        let mut messages: Vec<ChatMessage> = self
            .state()
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(messages)
    }
}

#[async_trait]
impl SettingsRepository for InMemoryStore {
    async fn get_settings(&self, user_id: InternalId) -> PortResult<Option<UserSettings>> {
        Ok(self.state().settings.iter().find(|s| s.user_id == user_id).cloned())
    }

    async fn create_settings(&self, settings: NewUserSettings) -> PortResult<UserSettings> {
        let mut state = self.state();
        if let Some(racing) = state.racing_settings.take() {
            state.insert_settings(racing)?;
        }
        state.insert_settings(settings)
    }

    async fn update_settings(
        &self,
        user_id: InternalId,
        changes: &Changes<SettingsField>,
    ) -> PortResult<()> {
        let mut state = self.state();
        let settings = state
            .settings
            .iter_mut()
            .find(|s| s.user_id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("settings for user {user_id}")))?;
        for field in &changes.fields {
            match field.clone() {
                SettingsField::Theme(v) => settings.theme = v,
                SettingsField::Language(v) => settings.language = v,
                SettingsField::Timezone(v) => settings.timezone = v,
                SettingsField::NotificationsEnabled(v) => settings.notifications_enabled = v,
                SettingsField::EmailNotifications(v) => settings.email_notifications = v,
                SettingsField::SoundEnabled(v) => settings.sound_enabled = v,
                SettingsField::CompactMode(v) => settings.compact_mode = v,
                SettingsField::AutoSave(v) => settings.auto_save = v,
                SettingsField::AutoSaveInterval(v) => settings.auto_save_interval = v,
            }
        }
        settings.updated_at = changes.updated_at;
        Ok(())
    }

    async fn delete_settings(&self, user_id: InternalId) -> PortResult<()> {
        self.state().settings.retain(|s| s.user_id != user_id);
        Ok(())
    }
}

//=========================================================================================
// Credential fakes
//=========================================================================================

pub struct FakePasswords;

impl PasswordService for FakePasswords {
    fn hash_password(&self, password: &str) -> PortResult<String> {
        Ok(format!("hashed:{password}"))
    }

    fn verify_password(&self, password: &str, password_hash: &str) -> PortResult<bool> {
        Ok(password_hash == format!("hashed:{password}"))
    }
}

/// Hands out random tokens and remembers which session each one belongs to.
#[derive(Default)]
pub struct FakeTokens {
    issued: Mutex<HashMap<String, Session>>,
}

impl TokenService for FakeTokens {
    fn issue_token(&self, session: &Session) -> PortResult<String> {
        let token = Uuid::new_v4().to_string();
        self.issued
            .lock()
            .expect("token map poisoned")
            .insert(token.clone(), session.clone());
        Ok(token)
    }

    fn verify_token(&self, token: &str) -> PortResult<Session> {
        self.issued
            .lock()
            .expect("token map poisoned")
            .get(token)
            .cloned()
            .ok_or(PortError::Unauthorized)
    }
}

//=========================================================================================
// Fixture
//=========================================================================================

pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub services: Services,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let services = Services::new(
            store.clone(),
            Arc::new(FakePasswords),
            Arc::new(FakeTokens::default()),
        );
        Self { store, services }
    }

    /// Registers a user and returns the session their token carries.
    pub async fn user(&self, email: &str) -> Session {
        let auth = self
            .services
            .access
            .register(RegisterRequest {
                name: "Test User".to_string(),
                email: email.to_string(),
                password: "secret-pass".to_string(),
            })
            .await
            .expect("register");
        self.services.access.authenticate(&auth.token).expect("token")
    }

    pub async fn project(&self, owner: &Session, name: &str) -> ProjectView {
        self.services
            .projects
            .create_project(
                crate::dto::CreateProjectRequest {
                    name: name.to_string(),
                    ..Default::default()
                },
                owner,
            )
            .await
            .expect("create project")
    }
}
