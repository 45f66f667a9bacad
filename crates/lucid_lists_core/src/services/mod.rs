//! crates/lucid_lists_core/src/services/mod.rs
//!
//! Domain services, one per aggregate, plus the access-control layer that gates them.

pub mod access;
pub mod canvas;
pub mod chat;
pub mod list;
pub mod note;
pub mod note_folder;
pub mod project;
pub mod task;
pub mod user_settings;

use std::sync::Arc;

use crate::ports::{DatabaseService, PasswordService, TokenService};

pub use access::AccessControl;
pub use canvas::CanvasService;
pub use chat::{ChatService, MAX_ACTIVE_CONVERSATIONS};
pub use list::ListService;
pub use note::NoteService;
pub use note_folder::NoteFolderService;
pub use project::ProjectService;
pub use task::TaskService;
pub use user_settings::UserSettingsService;

/// Every service wired to the same store.
#[derive(Clone)]
pub struct Services {
    pub access: AccessControl,
    pub projects: ProjectService,
    pub lists: ListService,
    pub tasks: TaskService,
    pub canvas: CanvasService,
    pub notes: NoteService,
    pub folders: NoteFolderService,
    pub chat: ChatService,
    pub settings: UserSettingsService,
}

impl Services {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            access: AccessControl::new(db.clone(), passwords, tokens),
            projects: ProjectService::new(db.clone()),
            lists: ListService::new(db.clone()),
            tasks: TaskService::new(db.clone()),
            canvas: CanvasService::new(db.clone()),
            notes: NoteService::new(db.clone()),
            folders: NoteFolderService::new(db.clone()),
            chat: ChatService::new(db.clone()),
            settings: UserSettingsService::new(db),
        }
    }
}
