//! Tree controls: what the tree may ask about an item.
//!
//! A control advertises which optional queries it supports through
//! [`Capabilities`]. The tree picks its level strategy from them: a control
//! that can report levels puts the tree in flat mode, one that cannot puts
//! it in nested mode.

mod expansion;
mod flat;
mod nested;

pub use expansion::ExpansionModel;
pub use flat::FlatTreeControl;
pub use nested::NestedTreeControl;

use crate::source::Source;

/// Optional queries a [`TreeControl`] answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub level: bool,
    pub children: bool,
    pub expandable: bool,
}

/// Capability object the tree queries for levels, children and expansion.
pub trait TreeControl<T> {
    fn capabilities(&self) -> Capabilities;

    /// Depth of `item`, when [`Capabilities::level`] is set.
    fn level(&self, _item: &T) -> Option<usize> {
        None
    }

    /// Children of `item`, when [`Capabilities::children`] is set.
    fn children(&self, _item: &T) -> Option<Source<T>> {
        None
    }

    /// Whether `item` can be expanded, when [`Capabilities::expandable`] is set.
    fn is_expandable(&self, _item: &T) -> Option<bool> {
        None
    }

    fn is_expanded(&self, item: &T) -> bool;

    fn toggle(&self, item: &T);

    fn toggle_descendants(&self, item: &T);
}
