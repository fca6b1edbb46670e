//! Indentation of rows by level.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use crate::error::TreeError;
use crate::node::TreeNode;
use crate::signal::Subscription;

/// Distance added per level.
#[derive(Debug, Clone, PartialEq)]
pub struct Indent {
    pub value: f64,
    pub unit: String,
}

impl Indent {
    pub fn new(value: f64, unit: impl Into<String>) -> Self {
        Self {
            value,
            unit: unit.into(),
        }
    }

    pub fn px(value: f64) -> Self {
        Self::new(value, "px")
    }

    /// Indentation for `level`, e.g. `"80px"` for level 2 at 40px.
    pub fn distance(&self, level: usize) -> String {
        format!("{}{}", level as f64 * self.value, self.unit)
    }
}

impl Default for Indent {
    fn default() -> Self {
        Self::px(40.0)
    }
}

impl fmt::Display for Indent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}

impl FromStr for Indent {
    type Err = TreeError;

    /// Parse a CSS length such as `"40px"`, `"2em"` or `"10%"`. A bare
    /// number is taken as pixels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let number = trimmed.trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '%');
        let unit = &trimmed[number.len()..];
        let value: f64 = number
            .trim()
            .parse()
            .map_err(|_| TreeError::InvalidIndent(s.to_string()))?;
        if !value.is_finite() {
            return Err(TreeError::InvalidIndent(s.to_string()));
        }
        let unit = if unit.is_empty() { "px" } else { unit };
        Ok(Self::new(value, unit))
    }
}

/// Layout direction of the text a row lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

impl TextDirection {
    /// The edge indentation is applied to.
    pub fn leading(&self) -> Edge {
        match self {
            TextDirection::Ltr => Edge::Left,
            TextDirection::Rtl => Edge::Right,
        }
    }

    pub fn trailing(&self) -> Edge {
        match self {
            TextDirection::Ltr => Edge::Right,
            TextDirection::Rtl => Edge::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Edge {
    Left,
    Right,
}

impl Edge {
    pub fn property(&self) -> &'static str {
        match self {
            Edge::Left => "padding-left",
            Edge::Right => "padding-right",
        }
    }
}

/// Something padding can be written to, typically a row's element style.
pub trait PaddingTarget {
    /// Set padding on `edge`, or clear it when `value` is `None`.
    fn set_padding(&mut self, edge: Edge, value: Option<&str>);
}

/// Inline style properties with a write counter.
#[derive(Debug, Clone, Default)]
pub struct InlineStyle {
    properties: BTreeMap<&'static str, String>,
    writes: usize,
}

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn padding(&self, edge: Edge) -> Option<&str> {
        self.properties.get(edge.property()).map(String::as_str)
    }

    /// Number of `set_padding` calls received.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl PaddingTarget for InlineStyle {
    fn set_padding(&mut self, edge: Edge, value: Option<&str>) {
        self.writes += 1;
        match value {
            Some(value) => {
                self.properties.insert(edge.property(), value.to_string());
            }
            None => {
                self.properties.remove(edge.property());
            }
        }
    }
}

struct PaddingState {
    level: Option<usize>,
    indent: Indent,
    direction: TextDirection,
    target: Rc<RefCell<dyn PaddingTarget>>,
    applied: Option<(Option<String>, TextDirection)>,
}

impl PaddingState {
    fn apply<T: Clone + PartialEq + 'static>(&mut self, node: &TreeNode<T>) {
        let value = if node.is_destroyed() {
            None
        } else {
            let level = self.level.unwrap_or_else(|| node.level());
            Some(self.indent.distance(level))
        };
        let applied = (value, self.direction);
        if self.applied.as_ref() == Some(&applied) {
            return;
        }
        {
            let mut target = self.target.borrow_mut();
            target.set_padding(self.direction.leading(), applied.0.as_deref());
            target.set_padding(self.direction.trailing(), None);
        }
        self.applied = Some(applied);
    }
}

/// Keeps a row's leading padding at `level * indent`.
///
/// The padding is re-applied when the level override, the indent or the
/// direction changes, and whenever the row is handed a different item.
pub struct NodePadding<T> {
    node: Rc<TreeNode<T>>,
    state: Rc<RefCell<PaddingState>>,
    _watch: Subscription,
}

impl<T: Clone + PartialEq + 'static> NodePadding<T> {
    pub fn attach<P: PaddingTarget + 'static>(node: Rc<TreeNode<T>>, target: Rc<RefCell<P>>) -> Self {
        let state = Rc::new(RefCell::new(PaddingState {
            level: None,
            indent: Indent::default(),
            direction: TextDirection::default(),
            target,
            applied: None,
        }));
        let weak_node: Weak<TreeNode<T>> = Rc::downgrade(&node);
        let weak_state = Rc::downgrade(&state);
        let watch = node.on_data_changed(move || {
            if let (Some(node), Some(state)) = (weak_node.upgrade(), weak_state.upgrade()) {
                state.borrow_mut().apply(&node);
            }
        });
        state.borrow_mut().apply(&node);
        Self {
            node,
            state,
            _watch: watch,
        }
    }

    /// Use `level` instead of the row's own level; `None` restores it.
    pub fn set_level(&self, level: Option<usize>) {
        self.update(|state| state.level = level);
    }

    pub fn set_indent(&self, indent: Indent) {
        self.update(|state| state.indent = indent);
    }

    /// Parse and set the indent from a CSS length.
    pub fn set_indent_str(&self, indent: &str) -> Result<(), TreeError> {
        let indent: Indent = indent.parse()?;
        self.set_indent(indent);
        Ok(())
    }

    pub fn set_direction(&self, direction: TextDirection) {
        self.update(|state| state.direction = direction);
    }

    /// Recompute and write the padding if it changed.
    pub fn refresh(&self) {
        self.update(|_| {});
    }

    /// Padding value most recently written to the leading edge.
    pub fn applied(&self) -> Option<String> {
        self.state
            .borrow()
            .applied
            .as_ref()
            .and_then(|(value, _)| value.clone())
    }

    fn update(&self, change: impl FnOnce(&mut PaddingState)) {
        let mut state = self.state.borrow_mut();
        change(&mut state);
        state.apply(&self.node);
    }
}
