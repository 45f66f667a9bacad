//! crates/lucid_lists_core/src/services/note_folder.rs
//!
//! Folders form a tree per project. Positions are 0-based within (project, parent).

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::{InternalId, NewNoteFolder, NoteFolder, Session};
use crate::dto::{CreateFolderRequest, FolderView, FoldersListView, UpdateFolderRequest};
use crate::patch::{Changes, FolderField, FolderPatch, Patch};
use crate::position::{resolve_position, validate_position, SiblingScope};
use crate::ports::{DatabaseService, PortError, PortResult};
use crate::validation::validate_name;

#[derive(Clone)]
pub struct NoteFolderService {
    db: Arc<dyn DatabaseService>,
}

impl NoteFolderService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn get_folders_by_project(&self, project_uid: Uuid) -> PortResult<FoldersListView> {
        let project = self.db.get_project_by_uid(project_uid).await?;
        let folders: Vec<FolderView> = self
            .db
            .folders_by_project(project.id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(FoldersListView {
            total: folders.len(),
            folders,
        })
    }

    pub async fn get_folder(&self, folder_uid: Uuid) -> PortResult<FolderView> {
        Ok(self.db.get_folder_by_uid(folder_uid).await?.into())
    }

    pub async fn create_folder(
        &self,
        req: CreateFolderRequest,
        actor: &Session,
    ) -> PortResult<FolderView> {
        let name = validate_name("name", req.name)?;
        let project = self.db.get_project_by_uid(req.project_uid).await?;
        let parent_folder_id = match req.parent_folder_uid {
            Some(uid) => Some(folder_in_project(self.db.as_ref(), uid, project.id).await?.id),
            None => None,
        };
        let scope = SiblingScope::FoldersOf {
            project_id: project.id,
            parent_folder_id,
        };
        let position = resolve_position(self.db.as_ref(), scope, req.position).await?;

        let folder = self
            .db
            .create_folder(NewNoteFolder {
                project_id: project.id,
                parent_folder_id,
                name,
                position,
                created_by: Some(actor.user_id),
            })
            .await?;
        info!(
            folder_uid = %folder.folder_uid,
            project_uid = %project.project_uid,
            position,
            "folder created"
        );
        Ok(folder.into())
    }

    /// Replaces name, parent and position.
    pub async fn update_folder(
        &self,
        folder_uid: Uuid,
        req: UpdateFolderRequest,
        actor: &Session,
    ) -> PortResult<FolderView> {
        let name = validate_name("name", req.name)?;
        let position = req.position.map(validate_position).transpose()?;
        let folder = self.db.get_folder_by_uid(folder_uid).await?;
        let parent = self.resolve_parent(&folder, Patch::from(req.parent_folder_uid)).await?;

        let mut changes = Changes::new(Some(actor.user_id))
            .with(FolderField::Name(name))
            .with(FolderField::Position(position));
        if let Some(parent) = parent.into_option() {
            changes.push(FolderField::ParentFolderId(parent));
        }
        self.apply(folder_uid, changes).await
    }

    pub async fn partial_update_folder(
        &self,
        folder_uid: Uuid,
        patch: FolderPatch,
        actor: &Session,
    ) -> PortResult<FolderView> {
        let parent = if patch.parent_folder_uid.is_unset() {
            Patch::Unset
        } else {
            let folder = self.db.get_folder_by_uid(folder_uid).await?;
            self.resolve_parent(&folder, patch.parent_folder_uid.clone()).await?
        };
        let changes = patch.into_changes(parent, actor.user_id)?;
        self.apply(folder_uid, changes).await
    }

    /// Soft delete. Child folders and notes keep pointing at the deleted folder.
    pub async fn delete_folder(&self, folder_uid: Uuid, actor: &Session) -> PortResult<()> {
        self.db.delete_folder(folder_uid, actor.user_id).await?;
        info!(folder_uid = %folder_uid, "folder deleted");
        Ok(())
    }

    async fn apply(
        &self,
        folder_uid: Uuid,
        changes: Changes<FolderField>,
    ) -> PortResult<FolderView> {
        self.db.update_folder(folder_uid, &changes).await?;
        self.get_folder(folder_uid).await
    }

    /// Resolves a new parent for `folder`, rejecting other projects' folders and any
    /// parent that would close a cycle.
    async fn resolve_parent(
        &self,
        folder: &NoteFolder,
        parent_uid: Patch<Uuid>,
    ) -> PortResult<Patch<InternalId>> {
        let parent_uid = match parent_uid {
            Patch::Value(uid) => uid,
            Patch::Null => return Ok(Patch::Null),
            Patch::Unset => return Ok(Patch::Unset),
        };
        let parent = folder_in_project(self.db.as_ref(), parent_uid, folder.project_id).await?;

        let tree: HashMap<InternalId, Option<InternalId>> = self
            .db
            .folders_by_project(folder.project_id)
            .await?
            .into_iter()
            .map(|f| (f.id, f.parent_folder_id))
            .collect();
        let mut cursor = Some(parent.id);
        while let Some(id) = cursor {
            if id == folder.id {
                return Err(PortError::BadRequest(
                    "a folder cannot be moved into itself or one of its descendants".to_string(),
                ));
            }
            cursor = tree.get(&id).copied().flatten();
        }
        Ok(Patch::Value(parent.id))
    }
}

/// Looks up a folder and requires it to belong to `project_id`.
pub(crate) async fn folder_in_project(
    db: &dyn DatabaseService,
    folder_uid: Uuid,
    project_id: InternalId,
) -> PortResult<NoteFolder> {
    let folder = db.get_folder_by_uid(folder_uid).await?;
    if folder.project_id != project_id {
        return Err(PortError::BadRequest(format!(
            "folder {folder_uid} belongs to a different project"
        )));
    }
    Ok(folder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    fn new_folder(project_uid: Uuid, name: &str, parent: Option<Uuid>) -> CreateFolderRequest {
        CreateFolderRequest {
            project_uid,
            parent_folder_uid: parent,
            name: name.into(),
            position: None,
        }
    }

    #[tokio::test]
    async fn test_folder_positions_are_zero_based_per_parent() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;
        let folders = &fx.services.folders;

        let root_a = folders
            .create_folder(new_folder(p.project_uid, "a", None), &owner)
            .await
            .unwrap();
        let root_b = folders
            .create_folder(new_folder(p.project_uid, "b", None), &owner)
            .await
            .unwrap();
        let child = folders
            .create_folder(new_folder(p.project_uid, "c", Some(root_a.folder_uid)), &owner)
            .await
            .unwrap();

        assert_eq!(root_a.position, Some(0));
        assert_eq!(root_b.position, Some(1));
        assert_eq!(child.position, Some(0));
        assert_eq!(child.parent_folder_uid, Some(root_a.folder_uid));

        let listed = folders.get_folders_by_project(p.project_uid).await.unwrap();
        assert_eq!(listed.total, 3);
    }

    #[tokio::test]
    async fn test_folder_cannot_become_its_own_descendant() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;
        let folders = &fx.services.folders;
        let top = folders
            .create_folder(new_folder(p.project_uid, "top", None), &owner)
            .await
            .unwrap();
        let mid = folders
            .create_folder(new_folder(p.project_uid, "mid", Some(top.folder_uid)), &owner)
            .await
            .unwrap();

        for parent in [top.folder_uid, mid.folder_uid] {
            let patch = FolderPatch {
                parent_folder_uid: Patch::Value(parent),
                ..Default::default()
            };
            let err = folders
                .partial_update_folder(top.folder_uid, patch, &owner)
                .await
                .unwrap_err();
            assert!(matches!(err, PortError::BadRequest(_)));
        }
    }

    #[tokio::test]
    async fn test_null_parent_moves_folder_to_root() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;
        let folders = &fx.services.folders;
        let top = folders
            .create_folder(new_folder(p.project_uid, "top", None), &owner)
            .await
            .unwrap();
        let child = folders
            .create_folder(new_folder(p.project_uid, "child", Some(top.folder_uid)), &owner)
            .await
            .unwrap();

        let patch: FolderPatch = serde_json::from_str(r#"{"parent_folder_uid":null}"#).unwrap();
        let moved = folders.partial_update_folder(child.folder_uid, patch, &owner).await.unwrap();
        assert_eq!(moved.parent_folder_uid, None);
        assert_eq!(moved.name, "child");
    }

    #[tokio::test]
    async fn test_parent_from_another_project_is_rejected() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;
        let q = fx.project(&owner, "Q").await;
        let foreign = fx
            .services
            .folders
            .create_folder(new_folder(q.project_uid, "foreign", None), &owner)
            .await
            .unwrap();
        let err = fx
            .services
            .folders
            .create_folder(new_folder(p.project_uid, "x", Some(foreign.folder_uid)), &owner)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_full_update_replaces_name_parent_and_position() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;
        let folders = &fx.services.folders;
        let top = folders
            .create_folder(new_folder(p.project_uid, "top", None), &owner)
            .await
            .unwrap();
        let other = folders
            .create_folder(new_folder(p.project_uid, "other", None), &owner)
            .await
            .unwrap();

        let updated = folders
            .update_folder(
                other.folder_uid,
                UpdateFolderRequest {
                    name: "renamed".into(),
                    parent_folder_uid: Some(top.folder_uid),
                    position: Some(4),
                },
                &owner,
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.parent_folder_uid, Some(top.folder_uid));
        assert_eq!(updated.position, Some(4));
    }
}
