//! Task list presentation: the presenter capability, its delegate, and the
//! undo history that backs every mutation.

pub mod all_items;
pub mod undo;

use std::rc::Weak;

use crate::model::task::{Task, TaskColor};
use crate::model::task_item::TaskItem;

pub use all_items::AllTaskItemsPresenter;

/// A change the presenter reports to its delegate.
///
/// Indices are in presented coordinates. Multiple removed indices are listed
/// in descending order so a listener can remove them one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    Inserted(Vec<usize>),
    Removed(Vec<usize>),
    Updated(Vec<usize>),
    Moved { from: usize, to: usize },
    ColorChanged(TaskColor),
    /// Presented items were replaced wholesale; reload everything
    RefreshedCompleteLayout,
}

/// Receives presenter change notifications. Owned by the UI layer; the
/// presenter only keeps a `Weak` handle.
pub trait TaskPresenterDelegate {
    fn task_presenter_did_change(&self, event: &PresenterEvent);
}

/// Shared capability of every presenter variant
pub trait TaskPresenting {
    fn color(&self) -> TaskColor;

    /// Color is list metadata; setting it is not undoable.
    fn set_color(&mut self, color: TaskColor);

    /// Snapshot of the color and presented items, for persistence
    fn archiveable_task(&self) -> Task;

    fn presented_task_items(&self) -> Vec<TaskItem>;

    fn count(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Replace the whole list (e.g. after loading a document).
    fn set_task(&mut self, task: Task);

    fn set_delegate(&mut self, delegate: Weak<dyn TaskPresenterDelegate>);
}
