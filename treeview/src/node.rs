//! Rendered rows.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::def::NodeDef;
use crate::error::TreeError;
use crate::key::Key;
use crate::nested::NestedChildren;
use crate::signal::{Listeners, Subscription};
use crate::source::{Emission, Source};
use crate::tree::TreeCore;

/// Unique identifier of a rendered row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(u64);

impl RowId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "__row_{}", self.0)
    }
}

/// Accessibility role of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    /// A row without children.
    #[default]
    TreeItem,
    /// A row that has, or can have, children.
    Group,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::TreeItem => "treeitem",
            Role::Group => "group",
        }
    }

    fn from_expandable(expandable: bool) -> Self {
        if expandable { Role::Group } else { Role::TreeItem }
    }
}

/// One item bound to one view at one position.
///
/// The row is created by the tree, handed its item directly, and lives
/// until the item leaves the tree. Moves reuse the same row.
pub struct TreeNode<T> {
    id: RowId,
    key: Key,
    def: Rc<NodeDef<T>>,
    core: Weak<TreeCore<T>>,
    data: RefCell<T>,
    role: Cell<Role>,
    changed: Listeners<()>,
    role_watch: RefCell<Option<Subscription>>,
    children: RefCell<Option<Rc<NestedChildren<T>>>>,
    destroyed: Cell<bool>,
}

impl<T> fmt::Debug for TreeNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeNode")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("template", &self.def.name())
            .field("role", &self.role.get())
            .field("destroyed", &self.destroyed.get())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> TreeNode<T> {
    pub(crate) fn new(core: &Rc<TreeCore<T>>, key: Key, item: T, def: Rc<NodeDef<T>>) -> Rc<Self> {
        Rc::new(Self {
            id: RowId::new(),
            key,
            def,
            core: Rc::downgrade(core),
            data: RefCell::new(item),
            role: Cell::new(Role::TreeItem),
            changed: Listeners::new(),
            role_watch: RefCell::new(None),
            children: RefCell::new(None),
            destroyed: Cell::new(false),
        })
    }

    pub fn id(&self) -> RowId {
        self.id
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn data(&self) -> T {
        self.data.borrow().clone()
    }

    pub fn template(&self) -> &str {
        self.def.name()
    }

    pub fn role(&self) -> Role {
        self.role.get()
    }

    pub(crate) fn is_nested(&self) -> bool {
        self.def.is_nested()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    pub fn is_expanded(&self) -> bool {
        let item = self.data();
        self.core
            .upgrade()
            .is_some_and(|core| core.control.is_expanded(&item))
    }

    /// Depth of this row.
    ///
    /// Flat trees ask the control every time. Nested trees read the level
    /// recorded when the row was inserted.
    pub fn level(&self) -> usize {
        let Some(core) = self.core.upgrade() else {
            return 0;
        };
        if core.caps.level {
            let item = self.data();
            core.control.level(&item).unwrap_or(0)
        } else {
            core.recorded_level(&self.key).unwrap_or(0)
        }
    }

    /// Rows rendered for this row's own children.
    pub fn children(&self) -> Vec<Rc<TreeNode<T>>> {
        self.children
            .borrow()
            .as_ref()
            .map(|nested| nested.rows())
            .unwrap_or_default()
    }

    /// Be told whenever [`TreeNode::set_data`] assigns a different item.
    pub fn on_data_changed(&self, callback: impl Fn() + 'static) -> Subscription {
        self.changed.add(Rc::new(move |_: &()| callback()))
    }

    /// Assign a new item to this row.
    ///
    /// Returns `Ok(false)` when the row already holds `item`. Otherwise the
    /// role is derived again, nested rows re-resolve their children and
    /// data-changed listeners are notified.
    pub fn set_data(self: &Rc<Self>, item: T) -> Result<bool, TreeError> {
        if self.destroyed.get() {
            return Ok(false);
        }
        let core = self.core.upgrade();
        let same = {
            let current = self.data.borrow();
            match &core {
                Some(core) => core.is_same_item(&current, &item),
                None => *current == item,
            }
        };
        if same {
            return Ok(false);
        }
        *self.data.borrow_mut() = item.clone();
        self.derive_role()?;
        let nested = self.children.borrow().clone();
        if let (Some(nested), Some(core)) = (nested, core) {
            nested.watch_children(&core, &item)?;
        }
        self.changed.notify(&());
        Ok(true)
    }

    /// Finish setting up a freshly created row.
    pub(crate) fn init(self: &Rc<Self>) -> Result<(), TreeError> {
        self.derive_role()?;
        if !self.def.is_nested() {
            return Ok(());
        }
        let Some(core) = self.core.upgrade() else {
            return Ok(());
        };
        let nested = NestedChildren::new(&core, self.id, self.key.clone(), self.def.name());
        *self.children.borrow_mut() = Some(nested.clone());
        nested.init(&core, &self.data())
    }

    fn derive_role(self: &Rc<Self>) -> Result<(), TreeError> {
        let Some(core) = self.core.upgrade() else {
            return Ok(());
        };
        let item = self.data();
        let previous = self.role_watch.take();
        drop(previous);

        if core.caps.expandable {
            let expandable = core.control.is_expandable(&item).unwrap_or(false);
            self.role.set(Role::from_expandable(expandable));
            return Ok(());
        }
        let children = core
            .control
            .children(&item)
            .filter(|_| core.caps.children)
            .ok_or_else(|| TreeError::MissingCapability {
                template: self.def.name().to_string(),
                capability: "is_expandable or children",
            })?;
        match children {
            Source::Static(items) => self.role.set(Role::from_expandable(!items.is_empty())),
            Source::Stream(stream) => {
                let weak = Rc::downgrade(self);
                let watch = stream.subscribe(Rc::new(move |emission: &Emission<T>| {
                    if let Some(node) = weak.upgrade()
                        && !node.destroyed.get()
                    {
                        let has_children = matches!(emission, Ok(items) if !items.is_empty());
                        node.role.set(Role::from_expandable(has_children));
                    }
                }));
                *self.role_watch.borrow_mut() = Some(watch);
            }
        }
        Ok(())
    }

    /// Tear the row down: cancel subscriptions and clear nested children.
    pub(crate) fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }
        drop(self.role_watch.take());
        let nested = self.children.take();
        if let Some(nested) = nested {
            nested.teardown();
        }
        self.changed.clear();
        log::trace!("row {} ({}) destroyed", self.id, self.key);
    }
}
