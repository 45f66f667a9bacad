//! crates/lucid_lists_core/src/services/list.rs

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::{NewList, Session};
use crate::dto::{CreateListRequest, ListView, UpdateListRequest};
use crate::patch::{Changes, ListField, ListPatch};
use crate::position::{resolve_position, validate_position, SiblingScope};
use crate::ports::{DatabaseService, PortResult};
use crate::validation::{color_or_default, validate_color, validate_name};

#[derive(Clone)]
pub struct ListService {
    db: Arc<dyn DatabaseService>,
}

impl ListService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn create_list(
        &self,
        req: CreateListRequest,
        actor: &Session,
    ) -> PortResult<ListView> {
        let name = validate_name("name", req.name)?;
        let color = color_or_default(req.color)?;
        let project = self.db.get_project_by_uid(req.project_uid).await?;
        let position =
            resolve_position(self.db.as_ref(), SiblingScope::ListsOf(project.id), req.position)
                .await?;

        let list = self
            .db
            .create_list(NewList {
                project_id: project.id,
                name,
                color,
                position,
                created_by: Some(actor.user_id),
            })
            .await?;
        info!(
            list_uid = %list.list_uid,
            project_uid = %project.project_uid,
            position,
            "list created"
        );
        Ok(list.into())
    }

    pub async fn get_list(&self, list_uid: Uuid) -> PortResult<ListView> {
        Ok(self.db.get_list_by_uid(list_uid).await?.into())
    }

    pub async fn get_lists_by_project(&self, project_uid: Uuid) -> PortResult<Vec<ListView>> {
        let project = self.db.get_project_by_uid(project_uid).await?;
        let lists = self.db.lists_by_project(project.id).await?;
        Ok(lists.into_iter().map(Into::into).collect())
    }

    pub async fn update_list(
        &self,
        list_uid: Uuid,
        req: UpdateListRequest,
        actor: &Session,
    ) -> PortResult<ListView> {
        let changes = Changes::new(Some(actor.user_id))
            .with(ListField::Name(validate_name("name", req.name)?))
            .with(ListField::Color(validate_color(req.color)?));
        self.apply(list_uid, changes).await
    }

    pub async fn partial_update_list(
        &self,
        list_uid: Uuid,
        patch: ListPatch,
        actor: &Session,
    ) -> PortResult<ListView> {
        let changes = patch.into_changes(actor.user_id)?;
        self.apply(list_uid, changes).await
    }

    /// Stores `position` as given; siblings are not renumbered.
    pub async fn update_position(
        &self,
        list_uid: Uuid,
        position: i32,
        actor: &Session,
    ) -> PortResult<ListView> {
        let changes = Changes::new(Some(actor.user_id))
            .with(ListField::Position(validate_position(position)?));
        self.apply(list_uid, changes).await
    }

    pub async fn delete_list(&self, list_uid: Uuid, actor: &Session) -> PortResult<()> {
        self.db.delete_list(list_uid, actor.user_id).await?;
        info!(list_uid = %list_uid, "list deleted");
        Ok(())
    }

    async fn apply(&self, list_uid: Uuid, changes: Changes<ListField>) -> PortResult<ListView> {
        self.db.update_list(list_uid, &changes).await?;
        self.get_list(list_uid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::PortError;
    use crate::testing::Fixture;

    fn new_list(project_uid: Uuid, name: &str) -> CreateListRequest {
        CreateListRequest { project_uid, name: name.into(), ..Default::default() }
    }

    #[tokio::test]
    async fn test_lists_append_after_previous_max_starting_at_one() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;

        let first = fx
            .services
            .lists
            .create_list(new_list(p.project_uid, "a"), &owner)
            .await
            .unwrap();
        assert_eq!(first.position, 1);

        let mut explicit = new_list(p.project_uid, "b");
        explicit.position = Some(7);
        fx.services.lists.create_list(explicit, &owner).await.unwrap();

        let next = fx
            .services
            .lists
            .create_list(new_list(p.project_uid, "c"), &owner)
            .await
            .unwrap();
        assert_eq!(next.position, 8);
    }

    #[tokio::test]
    async fn test_explicit_position_update_does_not_renumber_siblings() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;
        let a = fx.services.lists.create_list(new_list(p.project_uid, "a"), &owner).await.unwrap();
        let b = fx.services.lists.create_list(new_list(p.project_uid, "b"), &owner).await.unwrap();

        fx.services.lists.update_position(b.list_uid, a.position, &owner).await.unwrap();

        let lists = fx.services.lists.get_lists_by_project(p.project_uid).await.unwrap();
        let positions: Vec<_> = lists.iter().map(|l| (l.name.as_str(), l.position)).collect();
        // Tie on position 1 is broken by creation order.
        assert_eq!(positions, vec![("a", 1), ("b", 1)]);
    }

    #[tokio::test]
    async fn test_append_after_sibling_at_max_position_is_bad_request() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;
        let a = fx.services.lists.create_list(new_list(p.project_uid, "a"), &owner).await.unwrap();
        fx.services.lists.update_position(a.list_uid, i32::MAX, &owner).await.unwrap();

        let err = fx
            .services
            .lists
            .create_list(new_list(p.project_uid, "b"), &owner)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::BadRequest(_)));

        let lists = fx.services.lists.get_lists_by_project(p.project_uid).await.unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].position, i32::MAX);
    }

    #[tokio::test]
    async fn test_full_update_replaces_name_and_color() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;
        let list = fx
            .services
            .lists
            .create_list(new_list(p.project_uid, "a"), &owner)
            .await
            .unwrap();

        let updated = fx
            .services
            .lists
            .update_list(
                list.list_uid,
                UpdateListRequest { name: "Done".into(), color: "#00FF00".into() },
                &owner,
            )
            .await
            .unwrap();
        assert_eq!((updated.name.as_str(), updated.color.as_str()), ("Done", "#00FF00"));
        assert_eq!(updated.position, list.position);
    }

    #[tokio::test]
    async fn test_create_list_in_missing_project_is_not_found() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let err = fx
            .services
            .lists
            .create_list(new_list(Uuid::new_v4(), "a"), &owner)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_deleted_list_positions_no_longer_count() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;
        fx.services.lists.create_list(new_list(p.project_uid, "a"), &owner).await.unwrap();
        let b = fx.services.lists.create_list(new_list(p.project_uid, "b"), &owner).await.unwrap();
        fx.services.lists.delete_list(b.list_uid, &owner).await.unwrap();

        let c = fx.services.lists.create_list(new_list(p.project_uid, "c"), &owner).await.unwrap();
        assert_eq!(c.position, 2);
        assert!(matches!(
            fx.services.lists.get_list(b.list_uid).await,
            Err(PortError::NotFound(_))
        ));
    }
}
