//! Outlets: ordered insertion points rows are rendered into.

mod memory;

pub use memory::{MemoryOutlet, OutletOp, View};

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::def::NodeDef;
use crate::node::RowId;
use crate::signal::{Listeners, Subscription};

/// Values handed to a view when it is created or refreshed.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeContext<T> {
    pub item: T,
    pub level: usize,
    pub index: usize,
    /// The row this view belongs to.
    pub row: RowId,
}

/// An ordered container of views.
///
/// Implementations own the concrete views; the tree only tells them where
/// views go.
pub trait ViewOutlet<T> {
    fn create_at(&mut self, def: &NodeDef<T>, context: NodeContext<T>, index: usize);

    fn remove_at(&mut self, index: usize);

    fn move_to(&mut self, from: usize, to: usize);

    /// Row bound to the view at `index`.
    fn get(&self, index: usize) -> Option<RowId>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self);

    /// A retained view's index or item changed.
    fn update_context(&mut self, _index: usize, _context: NodeContext<T>) {}
}

/// Shared handle to an outlet.
pub type OutletRef<T> = Rc<RefCell<dyn ViewOutlet<T>>>;

struct Registered<T> {
    owner: RowId,
    outlet: OutletRef<T>,
}

/// Child outlets currently available, keyed by the row that owns them.
///
/// Views register the outlet they project their children into once it
/// exists. A nested row only ever renders into the outlet registered under
/// its own [`RowId`].
pub struct OutletRegistry<T> {
    table: Rc<RefCell<Vec<Registered<T>>>>,
    changed: Listeners<()>,
}

impl<T> Clone for OutletRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            changed: self.changed.clone(),
        }
    }
}

impl<T> fmt::Debug for OutletRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let owners: Vec<RowId> = self.table.borrow().iter().map(|r| r.owner).collect();
        f.debug_struct("OutletRegistry").field("owners", &owners).finish()
    }
}

impl<T: 'static> Default for OutletRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> OutletRegistry<T> {
    pub fn new() -> Self {
        Self {
            table: Rc::new(RefCell::new(Vec::new())),
            changed: Listeners::new(),
        }
    }

    /// Make `outlet` available to the row `owner`, replacing any outlet it had.
    pub fn register(&self, owner: RowId, outlet: OutletRef<T>) {
        {
            let mut table = self.table.borrow_mut();
            table.retain(|entry| entry.owner != owner);
            table.push(Registered { owner, outlet });
        }
        log::trace!("outlet registered for {owner}");
        self.changed.notify(&());
    }

    /// Withdraw the outlet of `owner`. Returns whether one was registered.
    pub fn unregister(&self, owner: RowId) -> bool {
        let removed = {
            let mut table = self.table.borrow_mut();
            let before = table.len();
            table.retain(|entry| entry.owner != owner);
            table.len() != before
        };
        if removed {
            log::trace!("outlet withdrawn for {owner}");
            self.changed.notify(&());
        }
        removed
    }

    pub fn lookup(&self, owner: RowId) -> Option<OutletRef<T>> {
        self.table
            .borrow()
            .iter()
            .find(|entry| entry.owner == owner)
            .map(|entry| entry.outlet.clone())
    }

    pub fn len(&self) -> usize {
        self.table.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn on_change(&self, callback: impl Fn() + 'static) -> Subscription {
        self.changed.add(Rc::new(move |_: &()| callback()))
    }
}
