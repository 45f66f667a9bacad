//! crates/lucid_lists_core/src/services/chat.rs
//!
//! Chat threads per project. At most [`MAX_ACTIVE_CONVERSATIONS`] stay active; creating
//! one more evicts the least recently updated.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::{MessageType, NewConversation, NewMessage, Session};
use crate::dto::{
    ConversationView, ConversationWithMessagesView, CreateConversationRequest,
    CreateMessageRequest, MessageView, RenameConversationRequest,
};
use crate::ports::{DatabaseService, PortError, PortResult};
use crate::validation::validate_name;

pub const MAX_ACTIVE_CONVERSATIONS: usize = 10;

#[derive(Clone)]
pub struct ChatService {
    db: Arc<dyn DatabaseService>,
}

impl ChatService {
    pub fn new(db: Arc<dyn DatabaseService>) -> Self {
        Self { db }
    }

    /// Most recently updated first.
    pub async fn get_conversations(&self, project_uid: Uuid) -> PortResult<Vec<ConversationView>> {
        let project = self.db.get_project_by_uid(project_uid).await?;
        let conversations = self
            .db
            .conversations_by_project(project.id, MAX_ACTIVE_CONVERSATIONS)
            .await?;
        Ok(conversations.into_iter().map(Into::into).collect())
    }

    pub async fn get_conversation_with_messages(
        &self,
        conversation_uid: Uuid,
    ) -> PortResult<ConversationWithMessagesView> {
        let conversation = self.db.get_conversation_by_uid(conversation_uid).await?;
        let messages = self.db.messages_by_conversation(conversation.id).await?;
        Ok(ConversationWithMessagesView {
            conversation: conversation.into(),
            messages: messages.into_iter().map(Into::into).collect(),
        })
    }

    pub async fn create_conversation(
        &self,
        project_uid: Uuid,
        req: CreateConversationRequest,
        actor: &Session,
    ) -> PortResult<ConversationView> {
        let name = validate_name("name", req.name)?;
        let project = self.db.get_project_by_uid(project_uid).await?;
        let conversation = self
            .db
            .create_conversation(
                NewConversation {
                    project_id: project.id,
                    name,
                    created_by: Some(actor.user_id),
                },
                MAX_ACTIVE_CONVERSATIONS,
            )
            .await?;
        info!(
            conversation_uid = %conversation.conversation_uid,
            project_uid = %project_uid,
            "conversation created"
        );
        Ok(conversation.into())
    }

    pub async fn rename_conversation(
        &self,
        conversation_uid: Uuid,
        req: RenameConversationRequest,
        actor: &Session,
    ) -> PortResult<ConversationView> {
        let name = validate_name("name", req.name)?;
        self.db
            .rename_conversation(conversation_uid, &name, actor.user_id)
            .await?;
        Ok(self.db.get_conversation_by_uid(conversation_uid).await?.into())
    }

    /// Hard delete, messages included.
    pub async fn delete_conversation(&self, conversation_uid: Uuid) -> PortResult<()> {
        self.db.delete_conversation(conversation_uid).await?;
        info!(conversation_uid = %conversation_uid, "conversation deleted");
        Ok(())
    }

    pub async fn create_message(
        &self,
        conversation_uid: Uuid,
        req: CreateMessageRequest,
        actor: &Session,
    ) -> PortResult<MessageView> {
        let message_type: MessageType = req.message_type.parse()?;
        if req.content.trim().is_empty() {
            return Err(PortError::BadRequest("message content must not be empty".to_string()));
        }
        let conversation = self.db.get_conversation_by_uid(conversation_uid).await?;
        let message = self
            .db
            .create_message(NewMessage {
                conversation_id: conversation.id,
                message_type,
                content: req.content,
                created_by: Some(actor.user_id),
            })
            .await?;
        Ok(message.into())
    }
}
