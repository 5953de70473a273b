use std::rc::Weak;

use tracing::debug;

use super::undo::{Operation, StoreChange, UndoStack};
use super::{PresenterEvent, TaskPresenterDelegate, TaskPresenting};
use crate::model::config::UndoConfig;
use crate::model::task::{Task, TaskColor};
use crate::model::task_item::{ItemKey, TaskItem};
use crate::ops::item_store::OrderedItemStore;

/// Presents every item of a task list in storage order.
///
/// All mutations go through this type so each one lands on the undo stack
/// and is reported to the delegate. Unknown keys are ignored: a UI action can
/// race with a removal and that must never be fatal.
pub struct AllTaskItemsPresenter {
    color: TaskColor,
    store: OrderedItemStore,
    undo: UndoStack,
    delegate: Option<Weak<dyn TaskPresenterDelegate>>,
}

impl Default for AllTaskItemsPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl AllTaskItemsPresenter {
    pub fn new() -> Self {
        Self::with_undo_stack(UndoStack::new())
    }

    pub fn with_undo_limit(limit: usize) -> Self {
        Self::with_undo_stack(UndoStack::with_limit(limit))
    }

    /// Presenter bounded by the configured undo depth
    pub fn from_config(config: &UndoConfig) -> Self {
        Self::with_undo_limit(config.limit)
    }

    fn with_undo_stack(undo: UndoStack) -> Self {
        AllTaskItemsPresenter {
            color: TaskColor::default(),
            store: OrderedItemStore::new(),
            undo,
            delegate: None,
        }
    }

    /// Build a presenter from a loaded snapshot. Loading is not undoable.
    pub fn from_task(task: Task) -> Self {
        let mut presenter = Self::new();
        presenter.color = task.color;
        presenter.insert_task_items(task.items);
        presenter.undo.clear();
        presenter
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub fn insert_task_item(&mut self, item: TaskItem) {
        self.insert_task_items(vec![item]);
    }

    /// Append items to the end of the list as one undo step.
    pub fn insert_task_items(&mut self, items: Vec<TaskItem>) {
        let mut ops = Vec::new();
        let mut indices = Vec::new();
        for item in items {
            let index = match self.store.insert(item.clone(), self.store.len()) {
                Ok(index) => index,
                Err(e) => {
                    debug!("insert skipped: {}", e);
                    continue;
                }
            };
            indices.push(self.presented_index(index));
            ops.push(Operation::Insert { index, item });
        }
        if ops.is_empty() {
            return;
        }
        self.record(ops);
        self.notify(PresenterEvent::Inserted(indices));
    }

    pub fn remove_task_item(&mut self, key: &ItemKey) {
        self.remove_task_items(std::slice::from_ref(key));
    }

    /// Remove items as one undo step. Reported indices are descending.
    pub fn remove_task_items(&mut self, keys: &[ItemKey]) {
        let mut targets: Vec<(usize, ItemKey)> = keys
            .iter()
            .filter_map(|key| self.store.index_of(key).map(|index| (index, *key)))
            .collect();
        targets.sort_by(|a, b| b.0.cmp(&a.0));
        targets.dedup_by_key(|(index, _)| *index);

        let mut ops = Vec::new();
        let mut indices = Vec::new();
        for (_, key) in targets {
            let (index, item) = match self.store.remove(&key) {
                Ok(removed) => removed,
                Err(e) => {
                    debug!("remove skipped: {}", e);
                    continue;
                }
            };
            indices.push(self.presented_index(index));
            ops.push(Operation::Remove { index, item });
        }
        if ops.is_empty() {
            return;
        }
        self.record(ops);
        self.notify(PresenterEvent::Removed(indices));
    }

    /// Change an item's text. Missing items and identical text are no-ops.
    pub fn update_task_item(&mut self, key: &ItemKey, text: impl Into<String>) {
        let new_text = text.into();
        match self.store.get(key) {
            Some(item) if item.text == new_text => return,
            Some(_) => {}
            None => {
                debug!("update skipped: task item not found: {}", key);
                return;
            }
        }
        let Ok(old_text) = self.store.update(key, new_text.clone()) else {
            return;
        };
        self.undo.push(Operation::TextEdit {
            key: *key,
            old_text,
            new_text,
        });
        self.notify_updated(key);
    }

    /// Whether `move_task_item(key, to_index)` would be accepted
    pub fn can_move_task_item(&self, key: &ItemKey, to_index: usize) -> bool {
        self.store.contains(key) && to_index < self.store.len()
    }

    /// Move an item. Rejected moves and moves onto the current index do nothing.
    pub fn move_task_item(&mut self, key: &ItemKey, to_index: usize) {
        if !self.can_move_task_item(key, to_index) {
            debug!("move rejected: {} -> {}", key, to_index);
            return;
        }
        if self.store.index_of(key) == Some(to_index) {
            return;
        }
        let Ok(from_index) = self.store.move_item(key, to_index) else {
            return;
        };
        self.undo.push(Operation::Move {
            key: *key,
            from_index,
            to_index,
        });
        self.notify(PresenterEvent::Moved {
            from: self.presented_index(from_index),
            to: self.presented_index(to_index),
        });
    }

    pub fn toggle_task_item(&mut self, key: &ItemKey) {
        if self.store.toggle_completion(key).is_err() {
            debug!("toggle skipped: task item not found: {}", key);
            return;
        }
        self.undo.push(Operation::Toggle { key: *key });
        self.notify_updated(key);
    }

    /// Set every presented item to `state` as one undo step. Items already in
    /// that state are left alone.
    pub fn update_presented_task_items_to_completion_state(&mut self, state: bool) {
        let pending: Vec<ItemKey> = self
            .store
            .items_in_order()
            .into_iter()
            .filter(|item| item.is_complete != state)
            .map(|item| item.key)
            .collect();

        let mut ops = Vec::new();
        let mut indices = Vec::new();
        for key in pending {
            let Ok(old_state) = self.store.set_completion(&key, state) else {
                continue;
            };
            if let Some(index) = self.store.index_of(&key) {
                indices.push(self.presented_index(index));
            }
            ops.push(Operation::SetCompletion {
                key,
                old_state,
                new_state: state,
            });
        }
        if ops.is_empty() {
            return;
        }
        self.undo.push(Operation::Group(ops));
        self.notify(PresenterEvent::Updated(indices));
    }

    // -----------------------------------------------------------------------
    // Undo / redo
    // -----------------------------------------------------------------------

    /// Undo the last mutation. Returns false when there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.undo.undo(&mut self.store) {
            Some(changes) => {
                self.notify_changes(&changes);
                true
            }
            None => false,
        }
    }

    /// Redo the last undone mutation. Returns false when there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.undo.redo(&mut self.store) {
            Some(changes) => {
                self.notify_changes(&changes);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Map a storage index to a presented index. Identity for this variant.
    fn presented_index(&self, store_index: usize) -> usize {
        store_index
    }

    fn record(&mut self, mut ops: Vec<Operation>) {
        let op = if ops.len() == 1 {
            ops.remove(0)
        } else {
            Operation::Group(ops)
        };
        self.undo.push(op);
    }

    fn notify_updated(&self, key: &ItemKey) {
        if let Some(index) = self.store.index_of(key) {
            self.notify(PresenterEvent::Updated(vec![self.presented_index(index)]));
        }
    }

    fn notify_changes(&self, changes: &[StoreChange]) {
        for event in coalesce(changes, |i| self.presented_index(i)) {
            self.notify(event);
        }
    }

    fn notify(&self, event: PresenterEvent) {
        if let Some(delegate) = self.delegate.as_ref().and_then(Weak::upgrade) {
            delegate.task_presenter_did_change(&event);
        }
    }
}

impl TaskPresenting for AllTaskItemsPresenter {
    fn color(&self) -> TaskColor {
        self.color
    }

    fn set_color(&mut self, color: TaskColor) {
        if self.color == color {
            return;
        }
        debug!("color set to {}", color.name());
        self.color = color;
        self.notify(PresenterEvent::ColorChanged(color));
    }

    fn archiveable_task(&self) -> Task {
        Task::new(self.color, self.presented_task_items())
    }

    fn presented_task_items(&self) -> Vec<TaskItem> {
        self.store.items_in_order()
    }

    fn count(&self) -> usize {
        self.store.len()
    }

    fn set_task(&mut self, task: Task) {
        self.color = task.color;
        self.store.clear();
        for item in task.items {
            let end = self.store.len();
            if let Err(e) = self.store.insert(item, end) {
                debug!("set_task skipped item: {}", e);
            }
        }
        self.undo.clear();
        self.notify(PresenterEvent::RefreshedCompleteLayout);
    }

    fn set_delegate(&mut self, delegate: Weak<dyn TaskPresenterDelegate>) {
        self.delegate = Some(delegate);
    }
}

/// Fold consecutive same-kind index changes into single events
fn coalesce(changes: &[StoreChange], presented: impl Fn(usize) -> usize) -> Vec<PresenterEvent> {
    let mut events: Vec<PresenterEvent> = Vec::new();
    for change in changes {
        let merged = match (change, events.last_mut()) {
            (StoreChange::Inserted(i), Some(PresenterEvent::Inserted(indices)))
            | (StoreChange::Removed(i), Some(PresenterEvent::Removed(indices))) => {
                indices.push(presented(*i));
                true
            }
            (StoreChange::Updated(i), Some(PresenterEvent::Updated(indices))) => {
                let i = presented(*i);
                if !indices.contains(&i) {
                    indices.push(i);
                }
                true
            }
            _ => false,
        };
        if merged {
            continue;
        }
        events.push(match *change {
            StoreChange::Inserted(i) => PresenterEvent::Inserted(vec![presented(i)]),
            StoreChange::Removed(i) => PresenterEvent::Removed(vec![presented(i)]),
            StoreChange::Updated(i) => PresenterEvent::Updated(vec![presented(i)]),
            StoreChange::Moved { from, to } => PresenterEvent::Moved {
                from: presented(from),
                to: presented(to),
            },
        });
    }
    events
}
