//! Expand/collapse command bound to a row's toggle region.

use std::rc::Rc;

use crate::control::TreeControl;
use crate::node::TreeNode;

/// What triggered a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Click,
    Key,
}

/// Input event delivered to a toggle region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleEvent {
    pub trigger: Trigger,
    propagation_stopped: bool,
}

impl ToggleEvent {
    pub fn new(trigger: Trigger) -> Self {
        Self {
            trigger,
            propagation_stopped: false,
        }
    }

    pub fn click() -> Self {
        Self::new(Trigger::Click)
    }

    pub fn key() -> Self {
        Self::new(Trigger::Key)
    }

    /// Keep enclosing toggle regions from handling this event.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// Toggles an item through the tree control.
pub struct ToggleCommand<T> {
    control: Rc<dyn TreeControl<T>>,
    recursive: bool,
}

impl<T> ToggleCommand<T> {
    pub fn new(control: Rc<dyn TreeControl<T>>) -> Self {
        Self {
            control,
            recursive: false,
        }
    }

    /// Toggle the item and all of its descendants.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub fn activate(&self, item: &T, event: &mut ToggleEvent) {
        if self.recursive {
            self.control.toggle_descendants(item);
        } else {
            self.control.toggle(item);
        }
        event.stop_propagation();
    }
}

impl<T: Clone + PartialEq + 'static> ToggleCommand<T> {
    /// Activate for the item currently bound to `node`.
    pub fn activate_node(&self, node: &TreeNode<T>, event: &mut ToggleEvent) {
        let item = node.data();
        self.activate(&item, event);
    }
}
