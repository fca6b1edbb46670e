//! The tree: owns the level map and drives the top-level reconciler.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::control::{Capabilities, TreeControl};
use crate::def::{NodeDef, NodeDefs};
use crate::differ::{Changes, keys_of};
use crate::error::TreeError;
use crate::key::{Identity, Key, TrackBy};
use crate::levels::LevelMap;
use crate::node::TreeNode;
use crate::outlet::{MemoryOutlet, OutletRef, OutletRegistry, ViewOutlet};
use crate::reconciler::Reconciler;
use crate::signal::{Listeners, Subscription};
use crate::source::{Connectable, DataSource, Emission, Observable, Source, ViewerId};

type SameItem<T> = Rc<dyn Fn(&T, &T) -> bool>;

/// State shared by the tree, its rows and their nested children.
pub(crate) struct TreeCore<T> {
    pub control: Rc<dyn TreeControl<T>>,
    pub caps: Capabilities,
    pub defs: NodeDefs<T>,
    pub track_by: TrackBy<T>,
    pub registry: OutletRegistry<T>,
    same_item: SameItem<T>,
    levels: RefCell<LevelMap<T>>,
    _registry_watch: Subscription,
    outlets_dirty: Cell<bool>,
    outlet_changes: Listeners<()>,
    depth: Cell<usize>,
    commits: Cell<u64>,
    committed: Listeners<u64>,
    fault: RefCell<Option<TreeError>>,
}

impl<T: Clone + PartialEq + 'static> TreeCore<T> {
    /// Level of a row about to be inserted under `parent`.
    pub fn compute_level(&self, item: &T, parent: Option<&Key>) -> usize {
        if self.caps.level {
            return self.control.level(item).unwrap_or(0);
        }
        match parent {
            None => 0,
            Some(parent) => match self.levels.borrow().level(parent) {
                Some(level) => level + 1,
                None => {
                    log::warn!("parent {parent} has no recorded level, treating child as a root");
                    0
                }
            },
        }
    }

    /// Whether a retained row already holds `next`.
    pub fn is_same_item(&self, current: &T, next: &T) -> bool {
        (self.same_item)(current, next)
    }

    pub fn record_level(&self, key: Key, level: usize, node: &Rc<TreeNode<T>>) {
        self.levels.borrow_mut().insert(key, level, node);
    }

    pub fn forget_level(&self, key: &Key, node: &Rc<TreeNode<T>>) {
        self.levels.borrow_mut().remove(key, node);
    }

    pub fn recorded_level(&self, key: &Key) -> Option<usize> {
        self.levels.borrow().level(key)
    }

    pub fn node(&self, key: &Key) -> Option<Rc<TreeNode<T>>> {
        self.levels.borrow().node(key)
    }

    /// Reject definitions whose rows could not be set up with this control.
    pub fn check_capabilities(&self, def: &NodeDef<T>) -> Result<(), TreeError> {
        if def.is_nested() && !self.caps.children {
            return Err(TreeError::MissingCapability {
                template: def.name().to_string(),
                capability: "children",
            });
        }
        if !self.caps.expandable && !self.caps.children {
            return Err(TreeError::MissingCapability {
                template: def.name().to_string(),
                capability: "is_expandable or children",
            });
        }
        Ok(())
    }

    /// Check that `def` can render `item`, including its static children,
    /// without touching any outlet.
    pub fn validate(&self, def: &NodeDef<T>, item: &T) -> Result<(), TreeError> {
        self.check_capabilities(def)?;
        if def.is_nested() {
            self.validate_children(item)?;
        }
        Ok(())
    }

    /// Validate the children of `item` when they are available now.
    ///
    /// Streamed children are checked when they arrive.
    pub fn validate_children(&self, item: &T) -> Result<(), TreeError> {
        match self.control.children(item).filter(|_| self.caps.children) {
            Some(Source::Static(children)) => self.validate_items(&children),
            _ => Ok(()),
        }
    }

    fn validate_items(&self, items: &[T]) -> Result<(), TreeError> {
        keys_of(items, &self.track_by)?;
        for (index, item) in items.iter().enumerate() {
            let def = self.defs.select(index, item)?;
            self.validate(&def, item)?;
        }
        Ok(())
    }

    /// Run one structural pass.
    ///
    /// Passes nest: only the outermost one delivers pending outlet changes
    /// and emits the commit notification.
    pub fn run_pass<R>(&self, pass: impl FnOnce() -> R) -> R {
        self.depth.set(self.depth.get() + 1);
        let out = pass();
        if self.depth.get() > 1 {
            self.depth.set(self.depth.get() - 1);
            return out;
        }
        while self.outlets_dirty.replace(false) {
            self.outlet_changes.notify(&());
        }
        self.depth.set(0);
        let commit = self.commits.get() + 1;
        self.commits.set(commit);
        log::debug!("render pass {commit} committed ({} rows)", self.levels.borrow().len());
        self.committed.notify(&commit);
        out
    }

    fn outlets_changed(&self) {
        self.outlets_dirty.set(true);
        if self.depth.get() == 0 {
            self.run_pass(|| ());
        }
    }

    pub fn on_outlets_changed(&self, callback: impl Fn() + 'static) -> Subscription {
        self.outlet_changes.add(Rc::new(move |_: &()| callback()))
    }

    /// Record a failure that surfaced where it could not be returned.
    pub fn fail(&self, error: TreeError) {
        log::error!("tree rendering failed: {error}");
        let mut fault = self.fault.borrow_mut();
        if fault.is_none() {
            *fault = Some(error);
        }
    }

    fn is_faulted(&self) -> bool {
        self.fault.borrow().is_some()
    }
}

/// Top-level rendering state.
struct Root<T> {
    viewer: ViewerId,
    reconciler: RefCell<Reconciler<T>>,
    subscription: RefCell<Option<Subscription>>,
    connected: RefCell<Option<Rc<dyn Connectable<T>>>>,
    /// Bumped on every disconnect; emissions from older subscriptions are dropped.
    generation: Cell<u64>,
    busy: Cell<bool>,
    queued: RefCell<Option<Vec<T>>>,
}

/// Renders a data source into an outlet as a tree of rows.
///
/// # Example
///
/// ```ignore
/// let control = Rc::new(NestedTreeControl::new(|dir: &Rc<Dir>| dir.children().into()));
/// let tree = TreeView::builder()
///     .control(control)
///     .def(NodeDef::new("dir").nested())
///     .build()?;
/// tree.set_data_source(vec![root])?;
/// ```
pub struct TreeView<T: Clone + PartialEq + 'static> {
    core: Rc<TreeCore<T>>,
    root: Rc<Root<T>>,
    outlet: OutletRef<T>,
}

impl<T: Clone + PartialEq + Identity + 'static> TreeView<T> {
    /// Builder tracking items by their [`Identity`].
    ///
    /// A retained row counts as unchanged only when the new item has the
    /// same identity and compares equal, so a shared pointer replaced by an
    /// equal copy is still handed to the row.
    pub fn builder() -> TreeBuilder<T> {
        TreeBuilder::new(
            TrackBy::identity(),
            Rc::new(|current: &T, next: &T| current.identity() == next.identity() && current == next),
        )
    }
}

impl<T: Clone + PartialEq + 'static> TreeView<T> {
    /// Builder with an explicit track-by function.
    pub fn builder_with(track_by: impl Fn(usize, &T) -> Key + 'static) -> TreeBuilder<T> {
        TreeBuilder::new(TrackBy::new(track_by), Rc::new(|current: &T, next: &T| current == next))
    }

    /// Replace the data source.
    ///
    /// The previous source is disconnected first, which clears every row.
    /// For stream sources, a failure raised by an emission delivered during
    /// subscription is returned here.
    pub fn set_data_source(&self, source: impl Into<DataSource<T>>) -> Result<(), TreeError> {
        self.disconnect();
        self.core.fault.borrow_mut().take();
        match source.into() {
            DataSource::Static(items) => self.render(&items).map(|_| ()),
            DataSource::Stream(stream) => self.subscribe(stream),
            DataSource::Connectable(connectable) => {
                log::debug!("connecting {}", self.root.viewer);
                let source = connectable.connect(self.root.viewer);
                *self.root.connected.borrow_mut() = Some(connectable);
                match source {
                    Source::Static(items) => self.render(&items).map(|_| ()),
                    Source::Stream(stream) => self.subscribe(stream),
                }
            }
        }
    }

    fn subscribe(&self, stream: Rc<dyn Observable<T>>) -> Result<(), TreeError> {
        let generation = self.root.generation.get();
        let core: Weak<TreeCore<T>> = Rc::downgrade(&self.core);
        let root: Weak<Root<T>> = Rc::downgrade(&self.root);
        let subscription = stream.subscribe(Rc::new(move |emission: &Emission<T>| {
            let (Some(core), Some(root)) = (core.upgrade(), root.upgrade()) else {
                return;
            };
            if root.generation.get() != generation {
                log::trace!("dropping emission for disconnected {}", root.viewer);
                return;
            }
            if core.is_faulted() {
                return;
            }
            match emission {
                Ok(items) => {
                    if let Err(error) = apply(&core, &root, items) {
                        core.fail(error);
                    }
                }
                Err(error) => log::error!("data source of {} failed: {error}", root.viewer),
            }
        }));
        *self.root.subscription.borrow_mut() = Some(subscription);
        match self.fault() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Apply one emission directly.
    ///
    /// Emissions arriving while another is being applied are queued and
    /// applied right after it; in that case the returned changes are empty.
    pub fn render(&self, items: &[T]) -> Result<Changes<T>, TreeError> {
        apply(&self.core, &self.root, items)
    }

    /// Stop listening to the data source and tear down every row.
    ///
    /// Emissions still in flight for the old source have no effect.
    pub fn disconnect(&self) {
        let root = &self.root;
        root.generation.set(root.generation.get() + 1);
        drop(root.subscription.take());
        root.queued.borrow_mut().take();

        match root.reconciler.try_borrow_mut() {
            Ok(mut reconciler) => {
                if !reconciler.rows().is_empty() {
                    self.core.run_pass(|| reconciler.clear(&self.core));
                }
            }
            Err(_) => log::warn!("{} disconnected while rendering", root.viewer),
        }

        let connected = root.connected.borrow_mut().take();
        if let Some(connectable) = connected {
            log::debug!("disconnecting {}", root.viewer);
            connectable.disconnect(root.viewer);
        }
    }

    /// Top-level rows, in order.
    pub fn rows(&self) -> Vec<Rc<TreeNode<T>>> {
        self.root
            .reconciler
            .try_borrow()
            .map(|reconciler| reconciler.rows().to_vec())
            .unwrap_or_default()
    }

    /// Rendered row for `key`, at any depth.
    pub fn node(&self, key: &Key) -> Option<Rc<TreeNode<T>>> {
        self.core.node(key)
    }

    /// Level of the rendered item with `key`.
    pub fn level(&self, key: &Key) -> Option<usize> {
        if self.core.caps.level {
            self.core.node(key).map(|node| node.level())
        } else {
            self.core.recorded_level(key)
        }
    }

    /// Every level map entry.
    pub fn level_entries(&self) -> Vec<(Key, usize)> {
        self.core.levels.borrow().snapshot()
    }

    pub fn control(&self) -> Rc<dyn TreeControl<T>> {
        self.core.control.clone()
    }

    pub fn outlet(&self) -> OutletRef<T> {
        self.outlet.clone()
    }

    pub fn outlets(&self) -> OutletRegistry<T> {
        self.core.registry.clone()
    }

    pub fn viewer(&self) -> ViewerId {
        self.root.viewer
    }

    /// Whether the tree renders in flat mode (levels come from the control).
    pub fn is_flat(&self) -> bool {
        self.core.caps.level
    }

    /// Number of committed render passes.
    pub fn commits(&self) -> u64 {
        self.core.commits.get()
    }

    /// Be told after every committed render pass.
    pub fn on_commit(&self, callback: impl Fn(u64) + 'static) -> Subscription {
        self.core.committed.add(Rc::new(move |commit: &u64| callback(*commit)))
    }

    /// Failure recorded while applying an asynchronous emission.
    pub fn fault(&self) -> Option<TreeError> {
        self.core.fault.borrow().clone()
    }
}

impl<T: Clone + PartialEq + 'static> Drop for TreeView<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn apply<T: Clone + PartialEq + 'static>(
    core: &Rc<TreeCore<T>>,
    root: &Rc<Root<T>>,
    items: &[T],
) -> Result<Changes<T>, TreeError> {
    if root.busy.get() {
        *root.queued.borrow_mut() = Some(items.to_vec());
        return Ok(Changes::default());
    }
    root.busy.set(true);
    let result = core.run_pass(|| root.reconciler.borrow_mut().render(core, items));
    root.busy.set(false);
    let queued = root.queued.borrow_mut().take();
    let changes = match result {
        Ok(changes) => changes,
        Err(error) => {
            if queued.is_some() {
                log::debug!("{}: dropping emission queued behind a failed pass", root.viewer);
            }
            return Err(error);
        }
    };
    log::debug!(
        "{}: {} inserted, {} removed, {} moved",
        root.viewer,
        changes.inserts(),
        changes.removals(),
        changes.moves()
    );
    if let Some(next) = queued {
        apply(core, root, &next)?;
    }
    Ok(changes)
}

/// Configures and builds a [`TreeView`].
pub struct TreeBuilder<T> {
    control: Option<Rc<dyn TreeControl<T>>>,
    defs: Vec<NodeDef<T>>,
    track_by: TrackBy<T>,
    same_item: SameItem<T>,
    outlet: Option<OutletRef<T>>,
    registry: Option<OutletRegistry<T>>,
}

impl<T: Clone + PartialEq + 'static> TreeBuilder<T> {
    fn new(track_by: TrackBy<T>, same_item: SameItem<T>) -> Self {
        Self {
            control: None,
            defs: Vec::new(),
            track_by,
            same_item,
            outlet: None,
            registry: None,
        }
    }

    pub fn control<C: TreeControl<T> + 'static>(mut self, control: Rc<C>) -> Self {
        self.control = Some(control);
        self
    }

    pub fn def(mut self, def: NodeDef<T>) -> Self {
        self.defs.push(def);
        self
    }

    pub fn track_by(mut self, track_by: impl Fn(usize, &T) -> Key + 'static) -> Self {
        self.track_by = TrackBy::new(track_by);
        self
    }

    /// Decide when a retained row already holds the new item.
    pub fn same_item(mut self, same: impl Fn(&T, &T) -> bool + 'static) -> Self {
        self.same_item = Rc::new(same);
        self
    }

    /// Outlet for top-level rows. Defaults to a projecting [`MemoryOutlet`].
    pub fn outlet<O: ViewOutlet<T> + 'static>(mut self, outlet: Rc<RefCell<O>>) -> Self {
        self.outlet = Some(outlet);
        self
    }

    /// Registry nested rows look up their child outlets in.
    pub fn outlets(mut self, registry: OutletRegistry<T>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<TreeView<T>, TreeError> {
        let control = self.control.ok_or(TreeError::MissingControl)?;
        let defs = NodeDefs::new(self.defs)?;
        let caps = control.capabilities();
        if defs.any_nested() && !caps.children {
            log::warn!("nested node definitions registered but the control has no children");
        }
        let registry = self.registry.unwrap_or_default();
        let outlet = match self.outlet {
            Some(outlet) => outlet,
            None => {
                let memory: OutletRef<T> = MemoryOutlet::projecting(registry.clone()).shared();
                memory
            }
        };

        let core = Rc::new_cyclic(|weak: &Weak<TreeCore<T>>| {
            let weak = weak.clone();
            let registry_watch = registry.on_change(move || {
                if let Some(core) = weak.upgrade() {
                    core.outlets_changed();
                }
            });
            TreeCore {
                control,
                caps,
                defs,
                track_by: self.track_by,
                same_item: self.same_item,
                registry: registry.clone(),
                levels: RefCell::new(LevelMap::new()),
                _registry_watch: registry_watch,
                outlets_dirty: Cell::new(false),
                outlet_changes: Listeners::new(),
                depth: Cell::new(0),
                commits: Cell::new(0),
                committed: Listeners::new(),
                fault: RefCell::new(None),
            }
        });

        let root = Rc::new(Root {
            viewer: ViewerId::new(),
            reconciler: RefCell::new(Reconciler::new(outlet.clone(), None)),
            subscription: RefCell::new(None),
            connected: RefCell::new(None),
            generation: Cell::new(0),
            busy: Cell::new(false),
            queued: RefCell::new(None),
        });
        log::debug!(
            "tree {} built ({} mode)",
            root.viewer,
            if caps.level { "flat" } else { "nested" }
        );
        Ok(TreeView { core, root, outlet })
    }
}
