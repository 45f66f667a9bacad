//! crates/lucid_lists_core/src/services/task.rs
//!
//! Tasks live in lists. Completion is tracked twice: the `is_completed` flag and the
//! `status` column both decide whether `completed_at` is stamped or cleared.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::domain::{NewTask, Priority, ResourceRef, Session, TaskStatus};
use crate::dto::{CreateTaskRequest, MoveTaskRequest, TaskView, UpdateTaskRequest};
use crate::patch::{Changes, TaskField, TaskPatch};
use crate::position::{resolve_position, validate_position, SiblingScope};
use crate::ports::{DatabaseService, PortError, PortResult};
use crate::validation::{color_or_default, parse_or, validate_color, validate_name};

#[derive(Clone)]
pub struct TaskService {
    db: Arc<dyn DatabaseService>,
}

impl TaskService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn create_task(
        &self,
        req: CreateTaskRequest,
        actor: &Session,
    ) -> PortResult<TaskView> {
        let title = validate_name("title", req.title)?;
        let status = parse_or(req.status.as_deref(), TaskStatus::Todo)?;
        let priority = req.priority.as_deref().map(str::parse::<Priority>).transpose()?;
        let color = color_or_default(req.color)?;
        let list = self.db.get_list_by_uid(req.list_uid).await?;
        let position =
            resolve_position(self.db.as_ref(), SiblingScope::TasksOf(list.id), req.position)
                .await?;

        let is_completed = req.is_completed.unwrap_or(false);
        let done = req.is_completed.unwrap_or_else(|| status.implies_completion());
        let task = self
            .db
            .create_task(NewTask {
                list_id: list.id,
                title,
                description: req.description,
                priority,
                status,
                color,
                position: Some(position),
                is_completed,
                due_date: req.due_date,
                completed_at: done.then(Utc::now),
                created_by: Some(actor.user_id),
            })
            .await?;
        info!(task_uid = %task.task_uid, list_uid = %list.list_uid, position, "task created");
        Ok(task.into())
    }

    pub async fn get_task(&self, task_uid: Uuid) -> PortResult<TaskView> {
        Ok(self.db.get_task_by_uid(task_uid).await?.into())
    }

    pub async fn get_tasks_by_list(&self, list_uid: Uuid) -> PortResult<Vec<TaskView>> {
        let list = self.db.get_list_by_uid(list_uid).await?;
        let tasks = self.db.tasks_by_list(list.id).await?;
        Ok(tasks.into_iter().map(Into::into).collect())
    }

    /// Replaces every editable field. `completed_at` is kept when the task was already
    /// completed, stamped when it becomes completed and cleared otherwise.
    pub async fn update_task(
        &self,
        task_uid: Uuid,
        req: UpdateTaskRequest,
        actor: &Session,
    ) -> PortResult<TaskView> {
        let current = self.db.get_task_by_uid(task_uid).await?;
        let status: TaskStatus = req.status.parse()?;
        let priority = req.priority.as_deref().map(str::parse::<Priority>).transpose()?;
        let position = req.position.map(validate_position).transpose()?;

        let mut changes = Changes::new(Some(actor.user_id))
            .with(TaskField::Title(validate_name("title", req.title)?))
            .with(TaskField::Description(req.description))
            .with(TaskField::Priority(priority))
            .with(TaskField::Status(status))
            .with(TaskField::Color(validate_color(req.color)?))
            .with(TaskField::Position(position))
            .with(TaskField::IsCompleted(req.is_completed))
            .with(TaskField::DueDate(req.due_date));
        let completed_at = match (req.is_completed, current.completed_at) {
            (true, Some(already)) => Some(already),
            (true, None) => Some(changes.updated_at),
            (false, _) => None,
        };
        changes.push(TaskField::CompletedAt(completed_at));

        self.apply(task_uid, changes).await
    }

    pub async fn partial_update_task(
        &self,
        task_uid: Uuid,
        patch: TaskPatch,
        actor: &Session,
    ) -> PortResult<TaskView> {
        let changes = patch.into_changes(actor.user_id)?;
        self.apply(task_uid, changes).await
    }

    /// Re-parents the task. Its position value travels with it unchanged, even if it
    /// collides with a position already used in the destination list.
    pub async fn move_task(
        &self,
        task_uid: Uuid,
        req: MoveTaskRequest,
        actor: &Session,
    ) -> PortResult<TaskView> {
        let source_project = self.db.resolve_project_id(ResourceRef::Task(task_uid)).await?;
        let target_project = self.db.resolve_project_id(ResourceRef::List(req.list_uid)).await?;
        if source_project != target_project {
            return Err(PortError::BadRequest(
                "a task can only be moved to a list of the same project".to_string(),
            ));
        }
        let target = self.db.get_list_by_uid(req.list_uid).await?;

        let changes = Changes::new(Some(actor.user_id)).with(TaskField::ListId(target.id));
        let moved = self.apply(task_uid, changes).await?;
        info!(task_uid = %task_uid, list_uid = %target.list_uid, "task moved");
        Ok(moved)
    }

    pub async fn delete_task(&self, task_uid: Uuid, actor: &Session) -> PortResult<()> {
        self.db.delete_task(task_uid, actor.user_id).await?;
        info!(task_uid = %task_uid, "task deleted");
        Ok(())
    }

    async fn apply(&self, task_uid: Uuid, changes: Changes<TaskField>) -> PortResult<TaskView> {
        self.db.update_task(task_uid, &changes).await?;
        self.get_task(task_uid).await
    }
}
