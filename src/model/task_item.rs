use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity of a task item. Generated once, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKey(Uuid);

impl ItemKey {
    pub fn generate() -> Self {
        ItemKey(Uuid::new_v4())
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single entry in a task list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub key: ItemKey,
    /// Display text
    pub text: String,
    /// Completion flag
    #[serde(default)]
    pub is_complete: bool,
}

impl TaskItem {
    /// Create an incomplete item with a fresh key
    pub fn new(text: impl Into<String>) -> Self {
        TaskItem {
            key: ItemKey::generate(),
            text: text.into(),
            is_complete: false,
        }
    }
}
