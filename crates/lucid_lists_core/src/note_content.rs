//! crates/lucid_lists_core/src/note_content.rs
//!
//! The structured body of a note: an ordered list of typed blocks, stored as JSON text.

use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::ports::{PortError, PortResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Text,
    Checklist,
    Heading,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BlockMetadata {
    /// Heading level, 1 through 6.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NoteBlock {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BlockMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ChecklistItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[schema(no_recursion)]
    pub children: Vec<NoteBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NoteContent {
    #[serde(default)]
    pub blocks: Vec<NoteBlock>,
}

impl NoteContent {
    /// Rejects heading levels outside 1..=6 anywhere in the tree.
    pub fn validate(&self) -> PortResult<()> {
        fn check(blocks: &[NoteBlock]) -> PortResult<()> {
            for block in blocks {
                if let Some(level) = block.metadata.as_ref().and_then(|m| m.level) {
                    if !(1..=6).contains(&level) {
                        return Err(PortError::BadRequest(format!(
                            "heading level must be between 1 and 6, got {level}"
                        )));
                    }
                }
                check(&block.children)?;
            }
            Ok(())
        }
        check(&self.blocks)
    }

    pub fn to_json(&self) -> PortResult<String> {
        serde_json::to_string(self)
            .map_err(|e| PortError::Unexpected(format!("failed to encode note content: {e}")))
    }

    /// Malformed stored content degrades to an empty document instead of failing the read.
    pub fn from_json_lossy(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        serde_json::from_str(raw).unwrap_or_else(|e| {
            warn!(error = %e, "stored note content is not valid, returning empty blocks");
            Self::default()
        })
    }
}
