//! Keyed sequence diffing.
//!
//! [`diff`] compares the keys of the previously rendered sequence with a new
//! emission and produces the operations that turn one into the other.
//! Operations are ordered so they can be applied front to back against a
//! live container:
//!
//! 1. removals, highest old index first, so earlier indexes stay valid;
//! 2. inserts and moves in ascending target index.
//!
//! Step 2 is computed against a simulated container, so once target index
//! `i` is handled, positions `0..=i` hold exactly the first `i + 1` items of
//! the new sequence. A retained item gets a `Move` whenever its old index
//! differs from its target or earlier operations have pushed it away from
//! the target. A moved row is therefore always found at or after its
//! target, and an insert index never exceeds the container length.

use std::collections::HashMap;

use crate::error::TreeError;
use crate::key::{Key, TrackBy};

/// One structural change.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation<T> {
    /// Create a row for `item` at `index` of the new sequence.
    Insert { key: Key, item: T, index: usize },
    /// Destroy the row at `index` of the previous sequence.
    Remove { key: Key, index: usize },
    /// Relocate an existing row from its previous index to its new one.
    Move { key: Key, from: usize, to: usize },
}

impl<T> Operation<T> {
    pub fn key(&self) -> &Key {
        match self {
            Operation::Insert { key, .. }
            | Operation::Remove { key, .. }
            | Operation::Move { key, .. } => key,
        }
    }
}

/// Operations produced by one diff.
#[derive(Debug, Clone, PartialEq)]
pub struct Changes<T> {
    pub operations: Vec<Operation<T>>,
    /// Keys of the new sequence, in order.
    pub keys: Vec<Key>,
}

impl<T> Default for Changes<T> {
    fn default() -> Self {
        Self {
            operations: Vec::new(),
            keys: Vec::new(),
        }
    }
}

impl<T> Changes<T> {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn inserts(&self) -> usize {
        self.count(|op| matches!(op, Operation::Insert { .. }))
    }

    pub fn removals(&self) -> usize {
        self.count(|op| matches!(op, Operation::Remove { .. }))
    }

    pub fn moves(&self) -> usize {
        self.count(|op| matches!(op, Operation::Move { .. }))
    }

    fn count(&self, f: impl Fn(&Operation<T>) -> bool) -> usize {
        self.operations.iter().filter(|op| f(op)).count()
    }

    /// Apply the operations to a list of keys laid out like the previous
    /// sequence.
    pub fn replay(&self, keys: &mut Vec<Key>) {
        for op in &self.operations {
            match op {
                Operation::Remove { index, .. } => {
                    keys.remove(*index);
                }
                Operation::Insert { key, index, .. } => keys.insert(*index, key.clone()),
                Operation::Move { key, to, .. } => {
                    if let Some(at) = keys.iter().position(|k| k == key)
                        && at != *to
                    {
                        let moved = keys.remove(at);
                        keys.insert(*to, moved);
                    }
                }
            }
        }
    }
}

/// Compute the key of every item, rejecting duplicates.
pub fn keys_of<T>(items: &[T], track_by: &TrackBy<T>) -> Result<Vec<Key>, TreeError> {
    let mut seen: HashMap<Key, usize> = HashMap::with_capacity(items.len());
    let mut keys = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let key = track_by.key(index, item);
        if let Some(first) = seen.insert(key.clone(), index) {
            return Err(TreeError::DuplicateKey {
                key,
                first,
                second: index,
            });
        }
        keys.push(key);
    }
    Ok(keys)
}

/// Diff `previous` keys against the `next` emission.
pub fn diff<T: Clone>(
    previous: &[Key],
    next: &[T],
    track_by: &TrackBy<T>,
) -> Result<Changes<T>, TreeError> {
    let keys = keys_of(next, track_by)?;
    let old_index: HashMap<&Key, usize> = previous.iter().enumerate().map(|(i, k)| (k, i)).collect();
    let new_index: HashMap<&Key, usize> = keys.iter().enumerate().map(|(i, k)| (k, i)).collect();

    let mut operations = Vec::new();

    for (index, key) in previous.iter().enumerate().rev() {
        if !new_index.contains_key(key) {
            operations.push(Operation::Remove {
                key: key.clone(),
                index,
            });
        }
    }

    // Container layout as the operations emitted so far leave it.
    let mut container: Vec<&Key> = previous
        .iter()
        .filter(|key| new_index.contains_key(key))
        .collect();

    for (index, (key, item)) in keys.iter().zip(next).enumerate() {
        let Some(&from) = old_index.get(key) else {
            operations.push(Operation::Insert {
                key: key.clone(),
                item: item.clone(),
                index,
            });
            container.insert(index, key);
            continue;
        };
        let at = container[index..]
            .iter()
            .position(|current| *current == key)
            .map_or(index, |offset| index + offset);
        if from != index || at != index {
            operations.push(Operation::Move {
                key: key.clone(),
                from,
                to: index,
            });
        }
        if at != index {
            let moved = container.remove(at);
            container.insert(index, moved);
        }
    }

    Ok(Changes { operations, keys })
}
