//! The level map: depth of every rendered item.

use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::key::Key;
use crate::node::TreeNode;

struct Entry<T> {
    level: usize,
    node: Weak<TreeNode<T>>,
}

/// Depth of every rendered item, keyed by identity.
///
/// An entry is added when its row is inserted and removed when the row is
/// removed. Only the owning tree writes to the map; nested children go
/// through the tree rather than keeping a copy.
pub(crate) struct LevelMap<T> {
    entries: HashMap<Key, Entry<T>>,
}

impl<T> LevelMap<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: Key, level: usize, node: &Rc<TreeNode<T>>) {
        let previous = self.entries.insert(
            key.clone(),
            Entry {
                level,
                node: Rc::downgrade(node),
            },
        );
        if let Some(previous) = previous
            && previous
                .node
                .upgrade()
                .is_some_and(|previous| !Rc::ptr_eq(&previous, node))
        {
            log::warn!("level map entry for {key} replaced by another row");
        }
    }

    /// Remove the entry for `key` if it still belongs to `node`.
    pub fn remove(&mut self, key: &Key, node: &Rc<TreeNode<T>>) {
        let owned = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.node.as_ptr() == Rc::as_ptr(node));
        if owned {
            self.entries.remove(key);
        }
    }

    pub fn level(&self, key: &Key) -> Option<usize> {
        self.entries.get(key).map(|entry| entry.level)
    }

    pub fn node(&self, key: &Key) -> Option<Rc<TreeNode<T>>> {
        self.entries.get(key).and_then(|entry| entry.node.upgrade())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn snapshot(&self) -> Vec<(Key, usize)> {
        self.entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.level))
            .collect()
    }
}
