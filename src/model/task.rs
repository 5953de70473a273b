use serde::{Deserialize, Serialize};

use super::task_item::TaskItem;

/// Color tag of a task list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskColor {
    #[default]
    Gray,
    Blue,
    Green,
    Yellow,
    Orange,
    Red,
}

impl TaskColor {
    pub const ALL: [TaskColor; 6] = [
        TaskColor::Gray,
        TaskColor::Blue,
        TaskColor::Green,
        TaskColor::Yellow,
        TaskColor::Orange,
        TaskColor::Red,
    ];

    /// Lowercase name, matching the serialized form
    pub fn name(self) -> &'static str {
        match self {
            TaskColor::Gray => "gray",
            TaskColor::Blue => "blue",
            TaskColor::Green => "green",
            TaskColor::Yellow => "yellow",
            TaskColor::Orange => "orange",
            TaskColor::Red => "red",
        }
    }
}

/// Archiveable snapshot of a task list: its color and items in presented order.
///
/// Regenerated from presenter state on demand; editing a `Task` never feeds
/// back into the presenter except through `TaskPresenting::set_task`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub color: TaskColor,
    #[serde(default)]
    pub items: Vec<TaskItem>,
}

impl Task {
    pub fn new(color: TaskColor, items: Vec<TaskItem>) -> Self {
        Task { color, items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
