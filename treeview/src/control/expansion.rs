//! Expansion state shared by the supplied tree controls.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::key::{Key, TrackBy};
use crate::signal::{Listeners, Subscription};

/// Set of expanded items, keyed by identity.
pub struct ExpansionModel<T> {
    track_by: TrackBy<T>,
    expanded: RefCell<HashSet<Key>>,
    changed: Listeners<()>,
}

impl<T: 'static> ExpansionModel<T> {
    pub fn new(track_by: TrackBy<T>) -> Self {
        Self {
            track_by,
            expanded: RefCell::new(HashSet::new()),
            changed: Listeners::new(),
        }
    }

    pub fn key(&self, item: &T) -> Key {
        self.track_by.key(0, item)
    }

    pub fn is_expanded(&self, item: &T) -> bool {
        self.expanded.borrow().contains(&self.key(item))
    }

    /// Expand `item`. Returns true if it was collapsed.
    pub fn expand(&self, item: &T) -> bool {
        let inserted = self.expanded.borrow_mut().insert(self.key(item));
        if inserted {
            self.changed.notify(&());
        }
        inserted
    }

    /// Collapse `item`. Returns true if it was expanded.
    pub fn collapse(&self, item: &T) -> bool {
        let removed = self.expanded.borrow_mut().remove(&self.key(item));
        if removed {
            self.changed.notify(&());
        }
        removed
    }

    pub fn toggle(&self, item: &T) {
        if !self.collapse(item) {
            self.expand(item);
        }
    }

    /// Expand every item in `items`, notifying once.
    pub fn expand_many<'a>(&self, items: impl IntoIterator<Item = &'a T>) {
        let changed = {
            let mut expanded = self.expanded.borrow_mut();
            items
                .into_iter()
                .fold(false, |acc, item| expanded.insert(self.key(item)) | acc)
        };
        if changed {
            self.changed.notify(&());
        }
    }

    /// Collapse every item in `items`, notifying once.
    pub fn collapse_many<'a>(&self, items: impl IntoIterator<Item = &'a T>) {
        let changed = {
            let mut expanded = self.expanded.borrow_mut();
            items
                .into_iter()
                .fold(false, |acc, item| expanded.remove(&self.key(item)) | acc)
        };
        if changed {
            self.changed.notify(&());
        }
    }

    pub fn clear(&self) {
        let had_any = {
            let mut expanded = self.expanded.borrow_mut();
            let had_any = !expanded.is_empty();
            expanded.clear();
            had_any
        };
        if had_any {
            self.changed.notify(&());
        }
    }

    pub fn expanded_keys(&self) -> Vec<Key> {
        self.expanded.borrow().iter().cloned().collect()
    }

    /// Be told whenever the expanded set changes.
    pub fn on_change(&self, callback: impl Fn() + 'static) -> Subscription {
        self.changed.add(Rc::new(move |_: &()| callback()))
    }
}
