//! Control for trees whose items carry their own children.

use std::cell::RefCell;
use std::rc::Rc;

use super::{Capabilities, ExpansionModel, TreeControl};
use crate::key::{Identity, Key, TrackBy};
use crate::signal::Subscription;
use crate::source::Source;

type ChildrenFn<T> = Rc<dyn Fn(&T) -> Source<T>>;
type ExpandableFn<T> = Rc<dyn Fn(&T) -> bool>;

/// Control over recursively nested data.
///
/// Descendant lookups only see children that are available without
/// waiting: static children, and whatever a stream replays on subscription.
pub struct NestedTreeControl<T> {
    children: ChildrenFn<T>,
    expandable: Option<ExpandableFn<T>>,
    data_nodes: RefCell<Vec<T>>,
    expansion: ExpansionModel<T>,
}

impl<T: Clone + Identity + 'static> NestedTreeControl<T> {
    pub fn new(children: impl Fn(&T) -> Source<T> + 'static) -> Self {
        Self::with_track_by(children, TrackBy::identity())
    }
}

impl<T: Clone + 'static> NestedTreeControl<T> {
    pub fn with_track_by(children: impl Fn(&T) -> Source<T> + 'static, track_by: TrackBy<T>) -> Self {
        Self {
            children: Rc::new(children),
            expandable: None,
            data_nodes: RefCell::new(Vec::new()),
            expansion: ExpansionModel::new(track_by),
        }
    }

    /// Answer expandability directly instead of deriving it from children.
    pub fn expandable(mut self, expandable: impl Fn(&T) -> bool + 'static) -> Self {
        self.expandable = Some(Rc::new(expandable));
        self
    }

    /// Set the root items used by `expand_all`.
    pub fn set_data_nodes(&self, nodes: Vec<T>) {
        *self.data_nodes.borrow_mut() = nodes;
    }

    pub fn descendants(&self, item: &T) -> Vec<T> {
        let mut out = Vec::new();
        self.collect_descendants(item, &mut out);
        out
    }

    fn collect_descendants(&self, item: &T, out: &mut Vec<T>) {
        let children = (self.children)(item).snapshot().unwrap_or_default();
        for child in children {
            out.push(child.clone());
            self.collect_descendants(&child, out);
        }
    }

    pub fn expand(&self, item: &T) {
        self.expansion.expand(item);
    }

    pub fn collapse(&self, item: &T) {
        self.expansion.collapse(item);
    }

    pub fn expand_all(&self) {
        let roots = self.data_nodes.borrow().clone();
        let mut nodes = Vec::new();
        for root in roots {
            nodes.push(root.clone());
            self.collect_descendants(&root, &mut nodes);
        }
        self.expansion.expand_many(&nodes);
    }

    pub fn collapse_all(&self) {
        self.expansion.clear();
    }

    pub fn expand_descendants(&self, item: &T) {
        let mut nodes = vec![item.clone()];
        self.collect_descendants(item, &mut nodes);
        self.expansion.expand_many(&nodes);
    }

    pub fn collapse_descendants(&self, item: &T) {
        let mut nodes = vec![item.clone()];
        self.collect_descendants(item, &mut nodes);
        self.expansion.collapse_many(&nodes);
    }

    pub fn expanded_keys(&self) -> Vec<Key> {
        self.expansion.expanded_keys()
    }

    pub fn on_change(&self, callback: impl Fn() + 'static) -> Subscription {
        self.expansion.on_change(callback)
    }
}

impl<T: Clone + 'static> TreeControl<T> for NestedTreeControl<T> {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            level: false,
            children: true,
            expandable: self.expandable.is_some(),
        }
    }

    fn children(&self, item: &T) -> Option<Source<T>> {
        Some((self.children)(item))
    }

    fn is_expandable(&self, item: &T) -> Option<bool> {
        self.expandable.as_ref().map(|f| f(item))
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
