//! crates/lucid_lists_core/src/services/note.rs
//!
//! Notes hold a structured block document (see `note_content`) and are positioned
//! 0-based within (project, folder).

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::{InternalId, NewNote, Session};
use crate::dto::{CreateNoteRequest, MoveNoteRequest, NoteView, NotesListView, UpdateNoteRequest};
use crate::patch::{Changes, NoteField, NotePatch, Patch};
use crate::position::{resolve_position, validate_position, SiblingScope};
use crate::ports::{DatabaseService, PortResult};
use crate::services::note_folder::folder_in_project;
use crate::validation::validate_name;

#[derive(Clone)]
pub struct NoteService {
    db: Arc<dyn DatabaseService>,
}

impl NoteService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn get_notes_by_project(&self, project_uid: Uuid) -> PortResult<NotesListView> {
        let project = self.db.get_project_by_uid(project_uid).await?;
        let notes: Vec<NoteView> = self
            .db
            .notes_by_project(project.id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(NotesListView {
            total: notes.len(),
            notes,
        })
    }

    pub async fn get_note(&self, note_uid: Uuid) -> PortResult<NoteView> {
        Ok(self.db.get_note_by_uid(note_uid).await?.into())
    }

    pub async fn create_note(
        &self,
        req: CreateNoteRequest,
        actor: &Session,
    ) -> PortResult<NoteView> {
        let title = validate_name("title", req.title)?;
        let content = req.content.unwrap_or_default();
        content.validate()?;
        let project = self.db.get_project_by_uid(req.project_uid).await?;
        let folder_id = self.folder_id(req.folder_uid, project.id).await?;
        let scope = SiblingScope::NotesOf {
            project_id: project.id,
            folder_id,
        };
        let position = resolve_position(self.db.as_ref(), scope, req.position).await?;

        let note = self
            .db
            .create_note(NewNote {
                project_id: project.id,
                folder_id,
                title,
                content_json: content.to_json()?,
                position,
                created_by: Some(actor.user_id),
            })
            .await?;
        info!(
            note_uid = %note.note_uid,
            project_uid = %project.project_uid,
            position,
            "note created"
        );
        Ok(note.into())
    }

    /// Replaces title and content. Position changes only when one is given.
    pub async fn update_note(
        &self,
        note_uid: Uuid,
        req: UpdateNoteRequest,
        actor: &Session,
    ) -> PortResult<NoteView> {
        req.content.validate()?;
        let mut changes = Changes::new(Some(actor.user_id))
            .with(NoteField::Title(validate_name("title", req.title)?))
            .with(NoteField::Content(req.content.to_json()?));
        if let Some(position) = req.position {
            changes.push(NoteField::Position(Some(validate_position(position)?)));
        }
        self.apply(note_uid, changes).await
    }

    pub async fn partial_update_note(
        &self,
        note_uid: Uuid,
        patch: NotePatch,
        actor: &Session,
    ) -> PortResult<NoteView> {
        let folder_id = match patch.folder_uid.clone() {
            Patch::Unset => Patch::Unset,
            Patch::Null => Patch::Null,
            Patch::Value(uid) => {
                let note = self.db.get_note_by_uid(note_uid).await?;
                Patch::Value(folder_in_project(self.db.as_ref(), uid, note.project_id).await?.id)
            }
        };
        let changes = patch.into_changes(folder_id, actor.user_id)?;
        self.apply(note_uid, changes).await
    }

    /// Files the note under another folder of the same project, or at the root.
    pub async fn move_note_to_folder(
        &self,
        note_uid: Uuid,
        req: MoveNoteRequest,
        actor: &Session,
    ) -> PortResult<NoteView> {
        let note = self.db.get_note_by_uid(note_uid).await?;
        let folder_id = self.folder_id(req.folder_uid, note.project_id).await?;
        let changes = Changes::new(Some(actor.user_id)).with(NoteField::FolderId(folder_id));
        let moved = self.apply(note_uid, changes).await?;
        info!(note_uid = %note_uid, folder_uid = ?req.folder_uid, "note moved");
        Ok(moved)
    }

    pub async fn delete_note(&self, note_uid: Uuid, actor: &Session) -> PortResult<()> {
        self.db.delete_note(note_uid, actor.user_id).await?;
        info!(note_uid = %note_uid, "note deleted");
        Ok(())
    }

    async fn apply(&self, note_uid: Uuid, changes: Changes<NoteField>) -> PortResult<NoteView> {
        self.db.update_note(note_uid, &changes).await?;
        self.get_note(note_uid).await
    }

    async fn folder_id(
        &self,
        folder_uid: Option<Uuid>,
        project_id: InternalId,
    ) -> PortResult<Option<InternalId>> {
        match folder_uid {
            Some(uid) => Ok(Some(folder_in_project(self.db.as_ref(), uid, project_id).await?.id)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::CreateFolderRequest;
    use crate::note_content::{BlockMetadata, BlockType, ChecklistItem, NoteBlock, NoteContent};
    use crate::ports::PortError;
    use crate::testing::Fixture;

    fn new_note(project_uid: Uuid, title: &str, folder_uid: Option<Uuid>) -> CreateNoteRequest {
        CreateNoteRequest { project_uid, folder_uid, title: title.into(), ..Default::default() }
    }

    fn sample_content() -> NoteContent {
        NoteContent {
            blocks: vec![
                NoteBlock {
                    id: "h".into(),
                    block_type: BlockType::Heading,
                    content: "Plan".into(),
                    metadata: Some(BlockMetadata { level: Some(1), ..Default::default() }),
                    items: Vec::new(),
                    children: Vec::new(),
                },
                NoteBlock {
                    id: "c".into(),
                    block_type: BlockType::Checklist,
                    content: String::new(),
                    metadata: None,
                    items: vec![ChecklistItem {
                        id: "1".into(),
                        text: "draft".into(),
                        completed: true,
                    }],
                    children: Vec::new(),
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_note_positions_start_at_zero() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;

        let first = fx
            .services
            .notes
            .create_note(new_note(p.project_uid, "a", None), &owner)
            .await
            .unwrap();
        let second = fx
            .services
            .notes
            .create_note(new_note(p.project_uid, "b", None), &owner)
            .await
            .unwrap();
        assert_eq!(first.position, Some(0));
        assert_eq!(second.position, Some(1));

        let folder = fx
            .services
            .folders
            .create_folder(
                CreateFolderRequest {
                    project_uid: p.project_uid,
                    name: "F".into(),
                    ..Default::default()
                },
                &owner,
            )
            .await
            .unwrap();
        let filed = fx
            .services
            .notes
            .create_note(new_note(p.project_uid, "c", Some(folder.folder_uid)), &owner)
            .await
            .unwrap();
        assert_eq!(filed.position, Some(0));
        assert_eq!(filed.folder_uid, Some(folder.folder_uid));
    }

    #[tokio::test]
    async fn test_structured_content_round_trips_through_the_store() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;
        let mut req = new_note(p.project_uid, "a", None);
        req.content = Some(sample_content());

        let created = fx.services.notes.create_note(req, &owner).await.unwrap();
        let fetched = fx.services.notes.get_note(created.note_uid).await.unwrap();
        assert_eq!(fetched.content, sample_content());
    }

    #[tokio::test]
    async fn test_update_keeps_position_when_omitted() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;
        fx.services.notes.create_note(new_note(p.project_uid, "a", None), &owner).await.unwrap();
        let note = fx
            .services
            .notes
            .create_note(new_note(p.project_uid, "b", None), &owner)
            .await
            .unwrap();

        let updated = fx
            .services
            .notes
            .update_note(
                note.note_uid,
                UpdateNoteRequest { title: "b2".into(), content: sample_content(), position: None },
                &owner,
            )
            .await
            .unwrap();
        assert_eq!(updated.position, Some(1));
        assert_eq!(updated.title, "b2");
        assert_eq!(updated.content, sample_content());
    }

    #[tokio::test]
    async fn test_empty_note_patch_is_rejected_without_writing() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;
        let note = fx
            .services
            .notes
            .create_note(new_note(p.project_uid, "a", None), &owner)
            .await
            .unwrap();
        let before = fx.store.note_row(note.note_uid).unwrap();

        let err = fx
            .services
            .notes
            .partial_update_note(note.note_uid, NotePatch::default(), &owner)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NoFieldsToUpdate));
        let after = fx.store.note_row(note.note_uid).unwrap();
        assert_eq!(format!("{before:?}"), format!("{after:?}"));
    }

    #[tokio::test]
    async fn test_move_between_folders_and_back_to_root() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;
        let folder = fx
            .services
            .folders
            .create_folder(
                CreateFolderRequest {
                    project_uid: p.project_uid,
                    name: "F".into(),
                    ..Default::default()
                },
                &owner,
            )
            .await
            .unwrap();
        let note = fx
            .services
            .notes
            .create_note(new_note(p.project_uid, "a", None), &owner)
            .await
            .unwrap();

        let filed = fx
            .services
            .notes
            .move_note_to_folder(
                note.note_uid,
                MoveNoteRequest { folder_uid: Some(folder.folder_uid) },
                &owner,
            )
            .await
            .unwrap();
        assert_eq!(filed.folder_uid, Some(folder.folder_uid));

        let root = fx
            .services
            .notes
            .move_note_to_folder(note.note_uid, MoveNoteRequest { folder_uid: None }, &owner)
            .await
            .unwrap();
        assert_eq!(root.folder_uid, None);
    }

    #[tokio::test]
    async fn test_deleted_note_disappears_from_listing() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;
        let note = fx
            .services
            .notes
            .create_note(new_note(p.project_uid, "a", None), &owner)
            .await
            .unwrap();
        fx.services.notes.delete_note(note.note_uid, &owner).await.unwrap();

        let listed = fx.services.notes.get_notes_by_project(p.project_uid).await.unwrap();
        assert_eq!(listed.total, 0);
        assert!(!fx.store.note_row(note.note_uid).unwrap().is_active);
    }
}
