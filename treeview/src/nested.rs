//! Children synchronizer for nested rows.
//!
//! A nested row renders its own children into the child outlet registered
//! under its row id, using a private [`Reconciler`]. The children source is
//! resolved through the tree control; stream sources re-render on every
//! emission. The row also re-checks its outlet whenever the set of
//! registered outlets changes, since a child outlet may only appear after
//! the row itself has been initialised.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::error::TreeError;
use crate::key::Key;
use crate::node::{RowId, TreeNode};
use crate::outlet::OutletRef;
use crate::reconciler::Reconciler;
use crate::signal::Subscription;
use crate::source::{Emission, Source};
use crate::tree::TreeCore;

pub(crate) struct NestedChildren<T> {
    owner: RowId,
    owner_key: Key,
    template: String,
    core: Weak<TreeCore<T>>,
    latest: RefCell<Vec<T>>,
    reconciler: RefCell<Option<Reconciler<T>>>,
    source_watch: RefCell<Option<Subscription>>,
    outlet_watch: RefCell<Option<Subscription>>,
    active: Cell<bool>,
    rerun: Cell<bool>,
}

fn same_outlet<T>(a: &OutletRef<T>, b: &OutletRef<T>) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

impl<T: Clone + PartialEq + 'static> NestedChildren<T> {
    pub fn new(core: &Rc<TreeCore<T>>, owner: RowId, owner_key: Key, template: &str) -> Rc<Self> {
        Rc::new(Self {
            owner,
            owner_key,
            template: template.to_string(),
            core: Rc::downgrade(core),
            latest: RefCell::new(Vec::new()),
            reconciler: RefCell::new(None),
            source_watch: RefCell::new(None),
            outlet_watch: RefCell::new(None),
            active: Cell::new(true),
            rerun: Cell::new(false),
        })
    }

    pub fn init(self: &Rc<Self>, core: &Rc<TreeCore<T>>, item: &T) -> Result<(), TreeError> {
        let weak = Rc::downgrade(self);
        let watch = core.on_outlets_changed(move || {
            if let Some(this) = weak.upgrade() {
                this.sync_outlet();
            }
        });
        *self.outlet_watch.borrow_mut() = Some(watch);
        self.watch_children(core, item)
    }

    /// Resolve the children of `item` and start rendering them.
    pub fn watch_children(self: &Rc<Self>, core: &Rc<TreeCore<T>>, item: &T) -> Result<(), TreeError> {
        drop(self.source_watch.take());
        let children = core
            .control
            .children(item)
            .filter(|_| core.caps.children)
            .ok_or_else(|| TreeError::MissingCapability {
                template: self.template.clone(),
                capability: "children",
            })?;
        match children {
            Source::Static(items) => {
                *self.latest.borrow_mut() = items;
                self.render(core)
            }
            Source::Stream(stream) => {
                let weak: Weak<Self> = Rc::downgrade(self);
                let watch = stream.subscribe(Rc::new(move |emission: &Emission<T>| {
                    if let Some(this) = weak.upgrade() {
                        this.on_emission(emission);
                    }
                }));
                if self.active.get() {
                    *self.source_watch.borrow_mut() = Some(watch);
                }
                Ok(())
            }
        }
    }

    fn on_emission(&self, emission: &Emission<T>) {
        if !self.active.get() {
            return;
        }
        let Some(core) = self.core.upgrade() else {
            return;
        };
        let items = match emission {
            Ok(items) => items.clone(),
            Err(error) => {
                log::warn!(
                    "children of row {} failed: {error}; rendering it without children",
                    self.owner
                );
                Vec::new()
            }
        };
        *self.latest.borrow_mut() = items;
        if let Err(error) = core.run_pass(|| self.render(&core)) {
            core.fail(error);
        }
    }

    /// Diff the latest children into the current child outlet.
    fn render(&self, core: &Rc<TreeCore<T>>) -> Result<(), TreeError> {
        let Ok(mut slot) = self.reconciler.try_borrow_mut() else {
            self.rerun.set(true);
            return Ok(());
        };
        loop {
            self.rerun.set(false);
            if slot.is_none()
                && let Some(outlet) = core.registry.lookup(self.owner)
            {
                *slot = Some(Reconciler::new(outlet, Some(self.owner_key.clone())));
            }
            let Some(reconciler) = slot.as_mut() else {
                log::trace!("row {} has no child outlet yet", self.owner);
                return Ok(());
            };
            let items = self.latest.borrow().clone();
            reconciler.render(core, &items)?;
            if !self.rerun.get() {
                return Ok(());
            }
        }
    }

    /// Follow the outlet registered for this row after the registry changed.
    ///
    /// If the outlet is no longer the one the children were rendered into,
    /// the old outlet is emptied first. Rows whose outlet did not change are
    /// left alone.
    fn sync_outlet(&self) {
        if !self.active.get() {
            return;
        }
        let Some(core) = self.core.upgrade() else {
            return;
        };
        let current = core.registry.lookup(self.owner);
        let (stale, unrendered) = match (self.reconciler.try_borrow(), current.as_ref()) {
            (Ok(slot), Some(outlet)) => match slot.as_ref() {
                Some(reconciler) => (!same_outlet(reconciler.outlet(), outlet), false),
                None => (false, true),
            },
            (Ok(slot), None) => (slot.is_some(), false),
            (Err(_), _) => (false, false),
        };
        if stale {
            let previous = self.reconciler.take();
            if let Some(mut previous) = previous {
                previous.clear(&core);
            }
        }
        if (stale || unrendered)
            && let Err(error) = self.render(&core)
        {
            core.fail(error);
        }
    }

    pub fn rows(&self) -> Vec<Rc<TreeNode<T>>> {
        self.reconciler
            .try_borrow()
            .ok()
            .and_then(|slot| slot.as_ref().map(|reconciler| reconciler.rows().to_vec()))
            .unwrap_or_default()
    }

    /// Stop watching and clear every row rendered for these children.
    pub fn teardown(&self) {
        self.active.set(false);
        drop(self.source_watch.take());
        drop(self.outlet_watch.take());
        let reconciler = self
            .reconciler
            .try_borrow_mut()
            .ok()
            .and_then(|mut slot| slot.take());
        if let (Some(mut reconciler), Some(core)) = (reconciler, self.core.upgrade()) {
            reconciler.clear(&core);
        }
        self.latest.borrow_mut().clear();
    }
}
