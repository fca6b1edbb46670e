//! Node definitions.
//!
//! A tree may render different kinds of items with different templates.
//! Definitions are tried in registration order; the first whose `when`
//! predicate accepts the item wins, and the definition without a predicate
//! (at most one) catches everything else.

use std::fmt;
use std::rc::Rc;

use crate::error::TreeError;

type Predicate<T> = Rc<dyn Fn(usize, &T) -> bool>;

/// How one kind of item is rendered.
pub struct NodeDef<T> {
    name: String,
    when: Option<Predicate<T>>,
    nested: bool,
}

impl<T> NodeDef<T> {
    /// A definition that matches every item.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            when: None,
            nested: false,
        }
    }

    /// Only match items accepted by `predicate(index, item)`.
    pub fn when(mut self, predicate: impl Fn(usize, &T) -> bool + 'static) -> Self {
        self.when = Some(Rc::new(predicate));
        self
    }

    /// Rows of this definition render their own children into a child outlet.
    pub fn nested(mut self) -> Self {
        self.nested = true;
        self
    }

    /// Template name handed to the outlet.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_default(&self) -> bool {
        self.when.is_none()
    }

    pub fn is_nested(&self) -> bool {
        self.nested
    }

    fn matches(&self, index: usize, item: &T) -> bool {
        self.when.as_ref().is_some_and(|when| when(index, item))
    }
}

impl<T> fmt::Debug for NodeDef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeDef")
            .field("name", &self.name)
            .field("default", &self.is_default())
            .field("nested", &self.nested)
            .finish()
    }
}

/// Validated, ordered set of node definitions.
pub(crate) struct NodeDefs<T> {
    defs: Vec<Rc<NodeDef<T>>>,
    default: Option<Rc<NodeDef<T>>>,
}

impl<T> NodeDefs<T> {
    pub fn new(defs: Vec<NodeDef<T>>) -> Result<Self, TreeError> {
        let defs: Vec<Rc<NodeDef<T>>> = defs.into_iter().map(Rc::new).collect();
        let defaults: Vec<&Rc<NodeDef<T>>> = defs.iter().filter(|d| d.is_default()).collect();
        if defaults.len() > 1 {
            return Err(TreeError::MultipleDefaults {
                count: defaults.len(),
            });
        }
        let default = defaults.first().map(|d| Rc::clone(d));
        Ok(Self { defs, default })
    }

    /// Pick the definition for `item` at `index`.
    pub fn select(&self, index: usize, item: &T) -> Result<Rc<NodeDef<T>>, TreeError> {
        if let [only] = self.defs.as_slice() {
            return Ok(only.clone());
        }
        self.defs
            .iter()
            .find(|def| def.matches(index, item))
            .or(self.default.as_ref())
            .cloned()
            .ok_or(TreeError::NoMatchingDef { index })
    }

    pub fn any_nested(&self) -> bool {
        self.defs.iter().any(|def| def.is_nested())
    }
}
