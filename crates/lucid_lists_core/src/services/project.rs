//! crates/lucid_lists_core/src/services/project.rs

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{MemberRole, NewProject, ProjectStatus, Session};
use crate::dto::{
    AddMemberRequest, CreateProjectRequest, ListWithTasksView, MemberView, ProjectProgressView,
    ProjectView, ProjectWithListsView, ProjectWithStatsView, TaskStats, UpdateProjectRequest,
};
use crate::patch::{Changes, ProjectField, ProjectPatch};
use crate::position::{resolve_position, validate_position, SiblingScope};
use crate::ports::{DatabaseService, PortError, PortResult};
use crate::validation::{color_or_default, parse_or, validate_color, validate_email, validate_name};

#[derive(Clone)]
pub struct ProjectService {
    db: Arc<dyn DatabaseService>,
}

impl ProjectService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    /// Creates the project and makes `actor` its owner in the same transaction.
    pub async fn create_project(
        &self,
        req: CreateProjectRequest,
        actor: &Session,
    ) -> PortResult<ProjectView> {
        let name = validate_name("name", req.name)?;
        let status = parse_or(req.status.as_deref(), ProjectStatus::Active)?;
        let color = color_or_default(req.color)?;
        let position = resolve_position(
            self.db.as_ref(),
            SiblingScope::ProjectsOf(actor.user_id),
            req.position,
        )
        .await?;

        let project = self
            .db
            .create_project_with_owner(NewProject {
                user_id: actor.user_id,
                name,
                description: req.description,
                status,
                color,
                position: Some(position),
                start_date: req.start_date,
                end_date: req.end_date,
                is_private: req.is_private.unwrap_or(false),
                dbml_content: req.dbml_content,
                dbml_layout_data: req.dbml_layout_data,
                flowchart_content: req.flowchart_content,
            })
            .await?;
        info!(project_uid = %project.project_uid, owner = %actor.user_uid, "project created");
        Ok(project.into())
    }

    pub async fn get_project(&self, project_uid: Uuid) -> PortResult<ProjectView> {
        Ok(self.db.get_project_by_uid(project_uid).await?.into())
    }

    /// Every active project `actor` is a member of, with task statistics.
    pub async fn get_all_projects(&self, actor: &Session) -> PortResult<Vec<ProjectWithStatsView>> {
        let projects = self.db.projects_for_member(actor.user_id).await?;
        let mut views = Vec::with_capacity(projects.len());
        for project in projects {
            let counts = self.db.count_project_tasks(project.id).await?;
            views.push(ProjectWithStatsView {
                project: project.into(),
                task_stats: counts.into(),
            });
        }
        debug!(user_uid = %actor.user_uid, count = views.len(), "listed projects");
        Ok(views)
    }

    /// Replaces every editable field.
    pub async fn update_project(
        &self,
        project_uid: Uuid,
        req: UpdateProjectRequest,
        actor: &Session,
    ) -> PortResult<ProjectView> {
        let position = req.position.map(validate_position).transpose()?;
        let changes = Changes::new(Some(actor.user_id))
            .with(ProjectField::Name(validate_name("name", req.name)?))
            .with(ProjectField::Description(req.description))
            .with(ProjectField::Status(req.status.parse()?))
            .with(ProjectField::Color(validate_color(req.color)?))
            .with(ProjectField::Position(position))
            .with(ProjectField::StartDate(req.start_date))
            .with(ProjectField::EndDate(req.end_date))
            .with(ProjectField::IsPrivate(req.is_private));
        self.db.update_project(project_uid, &changes).await?;
        info!(project_uid = %project_uid, "project updated");
        self.get_project(project_uid).await
    }

    pub async fn partial_update_project(
        &self,
        project_uid: Uuid,
        patch: ProjectPatch,
        actor: &Session,
    ) -> PortResult<ProjectView> {
        let changes = patch.into_changes(actor.user_id)?;
        self.db.update_project(project_uid, &changes).await?;
        info!(project_uid = %project_uid, fields = changes.fields.len(), "project patched");
        self.get_project(project_uid).await
    }

    /// Soft delete. Lists, tasks and notes of the project are left as they are.
    pub async fn delete_project(&self, project_uid: Uuid, actor: &Session) -> PortResult<()> {
        self.db.delete_project(project_uid, actor.user_id).await?;
        info!(project_uid = %project_uid, "project deleted");
        Ok(())
    }

    pub async fn get_project_progress(&self, project_uid: Uuid) -> PortResult<ProjectProgressView> {
        let project = self.db.get_project_by_uid(project_uid).await?;
        let counts = self.db.count_project_tasks(project.id).await?;
        Ok(ProjectProgressView {
            project_uid,
            stats: TaskStats::from(counts),
        })
    }

    pub async fn get_project_with_lists(
        &self,
        project_uid: Uuid,
    ) -> PortResult<ProjectWithListsView> {
        let project = self.db.get_project_by_uid(project_uid).await?;
        let lists = self.db.lists_by_project(project.id).await?;
        let mut list_views = Vec::with_capacity(lists.len());
        for list in lists {
            let tasks = self.db.tasks_by_list(list.id).await?;
            list_views.push(ListWithTasksView {
                list: list.into(),
                tasks: tasks.into_iter().map(Into::into).collect(),
            });
        }
        Ok(ProjectWithListsView {
            project: project.into(),
            lists: list_views,
        })
    }

    pub async fn get_members(&self, project_uid: Uuid) -> PortResult<Vec<MemberView>> {
        let project = self.db.get_project_by_uid(project_uid).await?;
        let members = self.db.list_members(project.id).await?;
        Ok(members.into_iter().map(Into::into).collect())
    }

    pub async fn add_member_by_email(
        &self,
        project_uid: Uuid,
        req: AddMemberRequest,
    ) -> PortResult<MemberView> {
        let email = req.email.trim().to_lowercase();
        validate_email(&email)?;
        let role = parse_or(req.role.as_deref(), MemberRole::Member)?;
        let project = self.db.get_project_by_uid(project_uid).await?;
        let user = self.db.get_user_by_email(&email).await?;

        if self.db.is_member(project.id, user.id).await? {
            return Err(PortError::BadRequest(format!(
                "{email} is already a member of this project"
            )));
        }
        self.db.add_member(project.id, user.id, role).await?;
        info!(project_uid = %project_uid, user_uid = %user.user_uid, role = %role, "member added");

        self.db
            .list_members(project.id)
            .await?
            .into_iter()
            .find(|m| m.user_id == user.id)
            .map(Into::into)
            .ok_or_else(|| PortError::Unexpected("member vanished after insert".to_string()))
    }
}
