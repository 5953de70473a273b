use indexmap::IndexMap;

use crate::model::task_item::{ItemKey, TaskItem};

/// Error type for store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("task item not found: {0}")]
    NotFound(ItemKey),
    #[error("invalid index {index} for {len} items")]
    InvalidIndex { index: usize, len: usize },
    #[error("task item already present: {0}")]
    DuplicateKey(ItemKey),
}

/// Ordered, uniquely-keyed collection of task items.
///
/// Positions are always within `[0, len)` and moves never duplicate or drop
/// an item. Callers only ever see clones; nothing hands out `&mut TaskItem`.
#[derive(Debug, Clone, Default)]
pub struct OrderedItemStore {
    items: IndexMap<ItemKey, TaskItem>,
}

impl OrderedItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, key: &ItemKey) -> bool {
        self.items.contains_key(key)
    }

    pub fn get(&self, key: &ItemKey) -> Option<&TaskItem> {
        self.items.get(key)
    }

    pub fn index_of(&self, key: &ItemKey) -> Option<usize> {
        self.items.get_index_of(key)
    }

    /// Insert `item` at `index`, clamped to `[0, len]`. Returns the index used.
    pub fn insert(&mut self, item: TaskItem, index: usize) -> Result<usize, StoreError> {
        if self.items.contains_key(&item.key) {
            return Err(StoreError::DuplicateKey(item.key));
        }
        let index = index.min(self.items.len());
        self.items.shift_insert(index, item.key, item);
        Ok(index)
    }

    /// Remove an item, returning its prior index and the item itself.
    pub fn remove(&mut self, key: &ItemKey) -> Result<(usize, TaskItem), StoreError> {
        self.items
            .shift_remove_full(key)
            .map(|(index, _, item)| (index, item))
            .ok_or(StoreError::NotFound(*key))
    }

    /// Move an item to `to_index` as if removed and re-inserted there.
    /// Out-of-range targets are rejected, not clamped. Returns the old index.
    pub fn move_item(&mut self, key: &ItemKey, to_index: usize) -> Result<usize, StoreError> {
        let from = self.index_of(key).ok_or(StoreError::NotFound(*key))?;
        let len = self.items.len();
        if to_index >= len {
            return Err(StoreError::InvalidIndex {
                index: to_index,
                len,
            });
        }
        if from != to_index {
            self.items.move_index(from, to_index);
        }
        Ok(from)
    }

    /// Replace an item's text, keeping position and completion. Returns the old text.
    pub fn update(&mut self, key: &ItemKey, text: String) -> Result<String, StoreError> {
        let item = self.items.get_mut(key).ok_or(StoreError::NotFound(*key))?;
        Ok(std::mem::replace(&mut item.text, text))
    }

    /// Flip the completion flag. Returns the new value.
    pub fn toggle_completion(&mut self, key: &ItemKey) -> Result<bool, StoreError> {
        let item = self.items.get_mut(key).ok_or(StoreError::NotFound(*key))?;
        item.is_complete = !item.is_complete;
        Ok(item.is_complete)
    }

    /// Set the completion flag. Returns the previous value.
    pub fn set_completion(&mut self, key: &ItemKey, state: bool) -> Result<bool, StoreError> {
        let item = self.items.get_mut(key).ok_or(StoreError::NotFound(*key))?;
        Ok(std::mem::replace(&mut item.is_complete, state))
    }

    /// Ordered snapshot of every item
    pub fn items_in_order(&self) -> Vec<TaskItem> {
        self.items.values().cloned().collect()
    }

    /// Keys in order
    pub fn keys(&self) -> impl Iterator<Item = &ItemKey> {
        self.items.keys()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
