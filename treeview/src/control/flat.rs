//! Control for trees whose data is a flat, pre-ordered list with levels.

use std::cell::RefCell;
use std::rc::Rc;

use super::{Capabilities, ExpansionModel, TreeControl};
use crate::key::{Identity, Key, TrackBy};
use crate::signal::Subscription;

type LevelFn<T> = Rc<dyn Fn(&T) -> usize>;
type ExpandableFn<T> = Rc<dyn Fn(&T) -> bool>;

/// Control over flat data where every item knows its own level.
///
/// Descendants of an item are the items that follow it in the data list
/// with a greater level, up to the next item at its level or above.
pub struct FlatTreeControl<T> {
    level: LevelFn<T>,
    expandable: ExpandableFn<T>,
    data_nodes: RefCell<Vec<T>>,
    expansion: ExpansionModel<T>,
}

impl<T: Clone + Identity + 'static> FlatTreeControl<T> {
    pub fn new(
        level: impl Fn(&T) -> usize + 'static,
        expandable: impl Fn(&T) -> bool + 'static,
    ) -> Self {
        Self::with_track_by(level, expandable, TrackBy::identity())
    }
}

impl<T: Clone + 'static> FlatTreeControl<T> {
    pub fn with_track_by(
        level: impl Fn(&T) -> usize + 'static,
        expandable: impl Fn(&T) -> bool + 'static,
        track_by: TrackBy<T>,
    ) -> Self {
        Self {
            level: Rc::new(level),
            expandable: Rc::new(expandable),
            data_nodes: RefCell::new(Vec::new()),
            expansion: ExpansionModel::new(track_by),
        }
    }

    /// Set the full data list used for descendant lookups and `expand_all`.
    pub fn set_data_nodes(&self, nodes: Vec<T>) {
        *self.data_nodes.borrow_mut() = nodes;
    }

    pub fn data_nodes(&self) -> Vec<T> {
        self.data_nodes.borrow().clone()
    }

    pub fn descendants(&self, item: &T) -> Vec<T> {
        let nodes = self.data_nodes.borrow();
        let key = self.expansion.key(item);
        let Some(start) = nodes.iter().position(|n| self.expansion.key(n) == key) else {
            return Vec::new();
        };
        let level = (self.level)(item);
        nodes[start + 1..]
            .iter()
            .take_while(|n| (self.level)(*n) > level)
            .cloned()
            .collect()
    }

    pub fn expand(&self, item: &T) {
        self.expansion.expand(item);
    }

    pub fn collapse(&self, item: &T) {
        self.expansion.collapse(item);
    }

    pub fn expand_all(&self) {
        let nodes = self.data_nodes();
        self.expansion.expand_many(&nodes);
    }

    pub fn collapse_all(&self) {
        self.expansion.clear();
    }

    /// Expand `item` and everything below it.
    pub fn expand_descendants(&self, item: &T) {
        let mut nodes = vec![item.clone()];
        nodes.extend(self.descendants(item));
        self.expansion.expand_many(&nodes);
    }

    /// Collapse `item` and everything below it.
    pub fn collapse_descendants(&self, item: &T) {
        let mut nodes = vec![item.clone()];
        nodes.extend(self.descendants(item));
        self.expansion.collapse_many(&nodes);
    }

    pub fn expanded_keys(&self) -> Vec<Key> {
        self.expansion.expanded_keys()
    }

    pub fn on_change(&self, callback: impl Fn() + 'static) -> Subscription {
        self.expansion.on_change(callback)
    }
}

impl<T: Clone + 'static> TreeControl<T> for FlatTreeControl<T> {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            level: true,
            children: false,
            expandable: true,
        }
    }

    fn level(&self, item: &T) -> Option<usize> {
        Some((self.level)(item))
    }

    fn is_expandable(&self, item: &T) -> Option<bool> {
        Some((self.expandable)(item))
    }

    fn is_expanded(&self, item: &T) -> bool {
        self.expansion.is_expanded(item)
    }

    fn toggle(&self, item: &T) {
        self.expansion.toggle(item);
    }

    fn toggle_descendants(&self, item: &T) {
        if self.expansion.is_expanded(item) {
            self.collapse_descendants(item);
        } else {
            self.expand_descendants(item);
        }
    }
}
