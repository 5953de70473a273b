use tracing::warn;

use crate::model::task_item::{ItemKey, TaskItem};
use crate::ops::item_store::{OrderedItemStore, StoreError};

pub const DEFAULT_UNDO_LIMIT: usize = 500;

/// A single undoable store mutation, holding enough state to run either way
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// An item was inserted at `index`
    Insert { index: usize, item: TaskItem },
    /// An item was removed from `index`
    Remove { index: usize, item: TaskItem },
    /// An item was moved within the list
    Move {
        key: ItemKey,
        from_index: usize,
        to_index: usize,
    },
    /// An item's text was edited
    TextEdit {
        key: ItemKey,
        old_text: String,
        new_text: String,
    },
    /// An item's completion flag was flipped
    Toggle { key: ItemKey },
    /// An item's completion flag was set explicitly
    SetCompletion {
        key: ItemKey,
        old_state: bool,
        new_state: bool,
    },
    /// Several operations undone/redone as one step
    Group(Vec<Operation>),
}

/// A positional change applied to the store while undoing or redoing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    Inserted(usize),
    Removed(usize),
    Updated(usize),
    Moved { from: usize, to: usize },
}

/// Per-presenter linear undo history
#[derive(Debug)]
pub struct UndoStack {
    undo: Vec<Operation>,
    redo: Vec<Operation>,
    limit: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoStack {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_UNDO_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        UndoStack {
            undo: Vec::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Record an operation that was just applied. Clears the redo stack.
    pub fn push(&mut self, op: Operation) {
        if matches!(&op, Operation::Group(ops) if ops.is_empty()) {
            return;
        }
        self.undo.push(op);
        if self.undo.len() > self.limit {
            self.undo.drain(..self.undo.len() - self.limit);
        }
        self.redo.clear();
    }

    /// Undo the most recent operation. `None` when there is nothing to undo.
    pub fn undo(&mut self, store: &mut OrderedItemStore) -> Option<Vec<StoreChange>> {
        let op = self.undo.pop()?;
        let mut changes = Vec::new();
        apply_inverse(&op, store, &mut changes);
        self.redo.push(op);
        Some(changes)
    }

    /// Reapply the most recently undone operation.
    pub fn redo(&mut self, store: &mut OrderedItemStore) -> Option<Vec<StoreChange>> {
        let op = self.redo.pop()?;
        let mut changes = Vec::new();
        apply_forward(&op, store, &mut changes);
        self.undo.push(op);
        Some(changes)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.undo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

/// Apply the inverse of an operation (for undo)
fn apply_inverse(op: &Operation, store: &mut OrderedItemStore, changes: &mut Vec<StoreChange>) {
    let result = match op {
        Operation::Insert { item, .. } => store
            .remove(&item.key)
            .map(|(index, _)| changes.push(StoreChange::Removed(index))),
        Operation::Remove { index, item } => store
            .insert(item.clone(), *index)
            .map(|index| changes.push(StoreChange::Inserted(index))),
        Operation::Move {
            key, from_index, ..
        } => store.move_item(key, *from_index).map(|from| {
            changes.push(StoreChange::Moved {
                from,
                to: *from_index,
            })
        }),
        Operation::TextEdit { key, old_text, .. } => store
            .update(key, old_text.clone())
            .and_then(|_| updated_at(store, key))
            .map(|index| changes.push(StoreChange::Updated(index))),
        Operation::Toggle { key } => store
            .toggle_completion(key)
            .and_then(|_| updated_at(store, key))
            .map(|index| changes.push(StoreChange::Updated(index))),
        Operation::SetCompletion { key, old_state, .. } => store
            .set_completion(key, *old_state)
            .and_then(|_| updated_at(store, key))
            .map(|index| changes.push(StoreChange::Updated(index))),
        Operation::Group(ops) => {
            for op in ops.iter().rev() {
                apply_inverse(op, store, changes);
            }
            Ok(())
        }
    };
    if let Err(e) = result {
        warn!("skipping stale undo entry: {}", e);
    }
}

/// Reapply an operation (for redo)
fn apply_forward(op: &Operation, store: &mut OrderedItemStore, changes: &mut Vec<StoreChange>) {
    let result = match op {
        Operation::Insert { index, item } => store
            .insert(item.clone(), *index)
            .map(|index| changes.push(StoreChange::Inserted(index))),
        Operation::Remove { item, .. } => store
            .remove(&item.key)
            .map(|(index, _)| changes.push(StoreChange::Removed(index))),
        Operation::Move { key, to_index, .. } => store
            .move_item(key, *to_index)
            .map(|from| changes.push(StoreChange::Moved { from, to: *to_index })),
        Operation::TextEdit { key, new_text, .. } => store
            .update(key, new_text.clone())
            .and_then(|_| updated_at(store, key))
            .map(|index| changes.push(StoreChange::Updated(index))),
        Operation::Toggle { key } => store
            .toggle_completion(key)
            .and_then(|_| updated_at(store, key))
            .map(|index| changes.push(StoreChange::Updated(index))),
        Operation::SetCompletion { key, new_state, .. } => store
            .set_completion(key, *new_state)
            .and_then(|_| updated_at(store, key))
            .map(|index| changes.push(StoreChange::Updated(index))),
        Operation::Group(ops) => {
            for op in ops {
                apply_forward(op, store, changes);
            }
            Ok(())
        }
    };
    if let Err(e) = result {
        warn!("skipping stale redo entry: {}", e);
    }
}

fn updated_at(store: &OrderedItemStore, key: &ItemKey) -> Result<usize, StoreError> {
    store.index_of(key).ok_or(StoreError::NotFound(*key))
}
