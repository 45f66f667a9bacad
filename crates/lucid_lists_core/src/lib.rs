pub mod domain;
pub mod dto;
pub mod note_content;
pub mod patch;
pub mod ports;
pub mod position;
pub mod services;
pub mod validation;

#[cfg(test)]
mod testing;

pub use domain::{InternalId, ResourceRef, Session};
pub use patch::{
    Changes, FolderField, ListField, NoteField, Patch, ProjectField, SettingsField, TaskField,
};
pub use ports::{
    CanvasRepository, ChatRepository, DatabaseService, FolderRepository, ListRepository,
    MembershipRepository, NoteRepository, PasswordService, PortError, PortResult,
    PositionRepository, ProjectRepository, SettingsRepository, TaskRepository, TokenService,
    UserRepository,
};
pub use position::{SiblingScope, NULL_POSITION_SENTINEL};
pub use services::Services;
