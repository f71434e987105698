//! Task domain model.
//!
//! # Responsibility
//! - Define the durable record shape shared by storage and presentation.
//!
//! # Invariants
//! - `id` is assigned at creation, immutable afterwards and never reused.
//! - Equality, hashing and identity are by `id` alone.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Stable identifier for a task over its entire lifetime.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type TaskId = Uuid;

/// The sole durable entity: one to-do item.
///
/// A pure value type; equality is identity (`id`), so two instances with the
/// same `id` compare equal even when their mutable fields differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Stable global ID, generated once at creation.
    pub id: TaskId,
    /// User-visible label. May be empty in storage; the list model rejects
    /// submitting an empty title.
    pub title: String,
    /// Completion flag, `false` at creation.
    pub is_complete: bool,
}

impl Task {
    /// Creates a new task with a generated stable ID and `is_complete = false`.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title, false)
    }

    /// Creates a task with a caller-provided stable ID.
    ///
    /// Used by callers that synthesize identity up front and rely on the
    /// repository upsert to persist it.
    pub fn with_id(id: TaskId, title: impl Into<String>, is_complete: bool) -> Self {
        Self {
            id,
            title: title.into(),
            is_complete,
        }
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Task {}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
