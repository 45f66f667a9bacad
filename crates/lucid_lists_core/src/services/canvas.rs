//! crates/lucid_lists_core/src/services/canvas.rs

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::{InternalId, Session};
use crate::dto::{CanvasView, UpdateCanvasRequest};
use crate::ports::{DatabaseService, PortError, PortResult};

/// State a project's canvas starts from.
pub const DEFAULT_CANVAS_STATE: &str =
    r#"{"nodes":[],"edges":[],"viewport":{"x":0,"y":0,"zoom":1}}"#;

#[derive(Clone)]
pub struct CanvasService {
    db: Arc<dyn DatabaseService>,
}

impl CanvasService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    /// Returns the project's canvas, creating an empty one on first read.
    pub async fn get_canvas(&self, project_uid: Uuid, actor: &Session) -> PortResult<CanvasView> {
        let project = self.db.get_project_by_uid(project_uid).await?;
        if let Some(canvas) = self.db.get_canvas(project.id).await? {
            return Ok(canvas.into());
        }
        match self
            .db
            .create_canvas(project.id, DEFAULT_CANVAS_STATE, actor.user_id)
            .await
        {
            Ok(canvas) => {
                info!(project_uid = %project_uid, "initialised default canvas");
                Ok(canvas.into())
            }
            // A concurrent first read created it.
            Err(PortError::Conflict(_)) => self.current(project_uid, project.id).await,
            Err(e) => Err(e),
        }
    }

    /// Replaces the stored state, creating the canvas when the project has none.
    pub async fn update_canvas(
        &self,
        project_uid: Uuid,
        req: UpdateCanvasRequest,
        actor: &Session,
    ) -> PortResult<CanvasView> {
        serde_json::from_str::<serde_json::Value>(&req.state_json)
            .map_err(|e| PortError::BadRequest(format!("state_json is not valid JSON: {e}")))?;
        let project = self.db.get_project_by_uid(project_uid).await?;

        if self.db.get_canvas(project.id).await?.is_none() {
            match self
                .db
                .create_canvas(project.id, &req.state_json, actor.user_id)
                .await
            {
                Ok(canvas) => return Ok(canvas.into()),
                // Someone else created it first; overwrite their state below.
                Err(PortError::Conflict(_)) => {}
                Err(e) => return Err(e),
            }
        }
        self.db
            .update_canvas(project.id, &req.state_json, actor.user_id)
            .await?;
        self.current(project_uid, project.id).await
    }

    /// Soft delete. The next read starts over from the default state.
    pub async fn delete_canvas(&self, project_uid: Uuid, actor: &Session) -> PortResult<()> {
        let project = self.db.get_project_by_uid(project_uid).await?;
        self.db.delete_canvas(project.id, actor.user_id).await?;
        info!(project_uid = %project_uid, "canvas deleted");
        Ok(())
    }

    async fn current(&self, project_uid: Uuid, project_id: InternalId) -> PortResult<CanvasView> {
        self.db
            .get_canvas(project_id)
            .await?
            .map(CanvasView::from)
            .ok_or_else(|| PortError::NotFound(format!("canvas for project {project_uid}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    #[tokio::test]
    async fn test_first_read_creates_default_canvas_once() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;

        let first = fx.services.canvas.get_canvas(p.project_uid, &owner).await.unwrap();
        assert_eq!(first.state_json, DEFAULT_CANVAS_STATE);
        let second = fx.services.canvas.get_canvas(p.project_uid, &owner).await.unwrap();
        assert_eq!(first.canvas_uid, second.canvas_uid);
        assert_eq!(fx.store.canvas_rows().len(), 1);
    }

    #[tokio::test]
    async fn test_update_stores_state_and_rejects_invalid_json() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;
        let state = r#"{"nodes":[{"id":"n1"}],"edges":[]}"#.to_string();

        let saved = fx
            .services
            .canvas
            .update_canvas(p.project_uid, UpdateCanvasRequest { state_json: state.clone() }, &owner)
            .await
            .unwrap();
        assert_eq!(saved.state_json, state);

        let err = fx
            .services
            .canvas
            .update_canvas(
                p.project_uid,
                UpdateCanvasRequest { state_json: "{oops".into() },
                &owner,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_delete_is_soft_and_missing_canvas_is_not_found() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;

        let err = fx.services.canvas.delete_canvas(p.project_uid, &owner).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));

        let original = fx.services.canvas.get_canvas(p.project_uid, &owner).await.unwrap();
        fx.services.canvas.delete_canvas(p.project_uid, &owner).await.unwrap();
        let fresh = fx.services.canvas.get_canvas(p.project_uid, &owner).await.unwrap();

        assert_ne!(original.canvas_uid, fresh.canvas_uid);
        let rows = fx.store.canvas_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.iter().filter(|c| c.is_active).count(), 1);
    }

    #[tokio::test]
    async fn test_first_read_that_loses_the_insert_returns_the_winner() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;
        let project_id = fx.store.project_row(p.project_uid).unwrap().id;
        let winner = r#"{"nodes":[{"id":"w"}],"edges":[]}"#;
        fx.store.race_next_canvas_create(project_id, winner);

        let canvas = fx.services.canvas.get_canvas(p.project_uid, &owner).await.unwrap();

        assert_eq!(canvas.state_json, winner);
        assert_eq!(fx.store.canvas_rows().len(), 1);
    }

    #[tokio::test]
    async fn test_first_write_that_loses_the_insert_overwrites_the_winner() {
        let fx = Fixture::new();
        let owner = fx.user("o@b.io").await;
        let p = fx.project(&owner, "P").await;
        let project_id = fx.store.project_row(p.project_uid).unwrap().id;
        fx.store.race_next_canvas_create(project_id, DEFAULT_CANVAS_STATE);
        let state = r#"{"nodes":[],"edges":[{"id":"e1"}]}"#.to_string();

        let canvas = fx
            .services
            .canvas
            .update_canvas(p.project_uid, UpdateCanvasRequest { state_json: state.clone() }, &owner)
            .await
            .unwrap();

        assert_eq!(canvas.state_json, state);
        let rows = fx.store.canvas_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].state_json, state);
    }
}
