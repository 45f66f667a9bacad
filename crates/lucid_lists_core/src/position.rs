//! crates/lucid_lists_core/src/position.rs
//!
//! Sibling ordering. New siblings are appended after the current maximum; explicit
//! positions are stored as given with no renumbering or collision handling. Readers
//! order by `COALESCE(position, NULL_POSITION_SENTINEL), created_at`.

use tracing::debug;

use crate::domain::InternalId;
use crate::ports::{PortError, PortResult, PositionRepository};

/// Stand-in for a null position when ordering, so unpositioned rows sort last.
pub const NULL_POSITION_SENTINEL: i32 = 999_999;

/// How the first position in an empty scope is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numbering {
    /// `MAX + 1`, with an empty scope counting as `MAX = 0` (first sibling gets 1).
    OneBased,
    /// `COALESCE(MAX, -1) + 1` (first sibling gets 0).
    ZeroBased,
}

/// The group of siblings within which `position` is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingScope {
    /// A user's own projects.
    ProjectsOf(InternalId),
    ListsOf(InternalId),
    TasksOf(InternalId),
    FoldersOf {
        project_id: InternalId,
        parent_folder_id: Option<InternalId>,
    },
    NotesOf {
        project_id: InternalId,
        folder_id: Option<InternalId>,
    },
}

impl SiblingScope {
    /// Each entity type keeps its own convention; they are not interchangeable.
    pub fn numbering(&self) -> Numbering {
        match self {
            SiblingScope::ProjectsOf(_) | SiblingScope::ListsOf(_) | SiblingScope::TasksOf(_) => {
                Numbering::OneBased
            }
            SiblingScope::FoldersOf { .. } | SiblingScope::NotesOf { .. } => Numbering::ZeroBased,
        }
    }

    /// The position a new sibling receives given the scope's current maximum.
    ///
    /// Fails once a sibling already sits at `i32::MAX`; there is no slot after it.
    pub fn next_after(&self, current_max: Option<i32>) -> PortResult<i32> {
        let next = match (self.numbering(), current_max) {
            (Numbering::OneBased, None) => Some(1),
            (Numbering::ZeroBased, None) => Some(0),
            (_, Some(max)) => max.checked_add(1),
        };
        next.ok_or_else(|| {
            PortError::BadRequest(
                "position space exhausted; move a sibling to a lower position first".to_string(),
            )
        })
    }
}

/// Reads the scope's maximum from the store and returns the next free slot.
pub async fn next_position<R>(repo: &R, scope: SiblingScope) -> PortResult<i32>
where
    R: PositionRepository + ?Sized,
{
    let current_max = repo.max_position(&scope).await?;
    let next = scope.next_after(current_max)?;
    debug!(?scope, ?current_max, next, "assigned sibling position");
    Ok(next)
}

/// Uses the caller's explicit position when given, otherwise appends to the scope.
pub async fn resolve_position<R>(
    repo: &R,
    scope: SiblingScope,
    explicit: Option<i32>,
) -> PortResult<i32>
where
    R: PositionRepository + ?Sized,
{
    match explicit {
        Some(position) => validate_position(position),
        None => next_position(repo, scope).await,
    }
}

pub fn validate_position(position: i32) -> PortResult<i32> {
    if position < 0 {
        return Err(PortError::BadRequest(format!(
            "position must be >= 0, got {position}"
        )));
    }
    Ok(position)
}

/// Display-order key shared by the in-memory store and the SQL `ORDER BY`.
pub fn display_key(position: Option<i32>) -> i32 {
    position.unwrap_or(NULL_POSITION_SENTINEL)
}
