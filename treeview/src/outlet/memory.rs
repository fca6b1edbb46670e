//! Headless outlet that keeps views in memory.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{NodeContext, OutletRegistry, ViewOutlet};
use crate::def::NodeDef;
use crate::node::RowId;

/// Structural call received by a [`MemoryOutlet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutletOp {
    Create { index: usize },
    Remove { index: usize },
    Move { from: usize, to: usize },
    Update { index: usize },
    Clear,
}

/// A view held by a [`MemoryOutlet`].
#[derive(Debug)]
pub struct View<T> {
    pub row: RowId,
    pub template: String,
    pub item: T,
    pub level: usize,
    pub index: usize,
    /// Creation serial, unique across all memory outlets.
    pub serial: u64,
    /// Outlet projected for this view's children, if its definition is nested.
    pub children: Option<Rc<RefCell<MemoryOutlet<T>>>>,
}

/// An in-memory [`ViewOutlet`] with an operation journal.
#[derive(Debug)]
pub struct MemoryOutlet<T> {
    views: Vec<View<T>>,
    journal: Vec<OutletOp>,
    registry: Option<OutletRegistry<T>>,
}

impl<T> Default for MemoryOutlet<T> {
    fn default() -> Self {
        Self {
            views: Vec::new(),
            journal: Vec::new(),
            registry: None,
        }
    }
}

fn next_serial() -> u64 {
    static SERIAL: AtomicU64 = AtomicU64::new(0);
    SERIAL.fetch_add(1, Ordering::Relaxed)
}

impl<T: Clone + 'static> MemoryOutlet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give every nested view its own child outlet, registered in `registry`.
    pub fn projecting(registry: OutletRegistry<T>) -> Self {
        Self {
            registry: Some(registry),
            ..Self::default()
        }
    }

    /// Wrap in a shared handle usable as an [`OutletRef`](super::OutletRef).
    pub fn shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    pub fn views(&self) -> &[View<T>] {
        &self.views
    }

    pub fn view(&self, index: usize) -> Option<&View<T>> {
        self.views.get(index)
    }

    pub fn items(&self) -> Vec<T> {
        self.views.iter().map(|view| view.item.clone()).collect()
    }

    pub fn journal(&self) -> &[OutletOp] {
        &self.journal
    }

    pub fn take_journal(&mut self) -> Vec<OutletOp> {
        std::mem::take(&mut self.journal)
    }

    /// Child outlet projected for the view at `index`.
    pub fn children_of(&self, index: usize) -> Option<Rc<RefCell<MemoryOutlet<T>>>> {
        self.views.get(index).and_then(|view| view.children.clone())
    }

    /// Indented text of this outlet and every projected child outlet.
    pub fn lines(&self, label: &impl Fn(&T) -> String) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_lines(label, &mut out);
        out
    }

    fn collect_lines(&self, label: &impl Fn(&T) -> String, out: &mut Vec<String>) {
        for view in &self.views {
            out.push(format!("{}{}", "  ".repeat(view.level), label(&view.item)));
            if let Some(children) = &view.children {
                children.borrow().collect_lines(label, out);
            }
        }
    }

    fn release(&self, view: &View<T>) {
        if view.children.is_some()
            && let Some(registry) = &self.registry
        {
            registry.unregister(view.row);
        }
    }
}

impl<T: Clone + 'static> ViewOutlet<T> for MemoryOutlet<T> {
    fn create_at(&mut self, def: &NodeDef<T>, context: NodeContext<T>, index: usize) {
        let children = match &self.registry {
            Some(registry) if def.is_nested() => {
                let child = MemoryOutlet::projecting(registry.clone()).shared();
                Some(child)
            }
            _ => None,
        };
        let row = context.row;
        self.views.insert(
            index,
            View {
                row,
                template: def.name().to_string(),
                item: context.item,
                level: context.level,
                index: context.index,
                serial: next_serial(),
                children: children.clone(),
            },
        );
        self.journal.push(OutletOp::Create { index });
        if let (Some(registry), Some(child)) = (&self.registry, children) {
            registry.register(row, child);
        }
    }

    fn remove_at(&mut self, index: usize) {
        if index < self.views.len() {
            let view = self.views.remove(index);
            self.release(&view);
        }
        self.journal.push(OutletOp::Remove { index });
    }

    fn move_to(&mut self, from: usize, to: usize) {
        if from < self.views.len() && to < self.views.len() {
            let view = self.views.remove(from);
            self.views.insert(to, view);
        }
        self.journal.push(OutletOp::Move { from, to });
    }

    fn get(&self, index: usize) -> Option<RowId> {
        self.views.get(index).map(|view| view.row)
    }

    fn len(&self) -> usize {
        self.views.len()
    }

    fn clear(&mut self) {
        let views = std::mem::take(&mut self.views);
        for view in &views {
            self.release(view);
        }
        self.journal.push(OutletOp::Clear);
    }

    fn update_context(&mut self, index: usize, context: NodeContext<T>) {
        if let Some(view) = self.views.get_mut(index) {
            view.item = context.item;
            view.level = context.level;
            view.index = context.index;
        }
        self.journal.push(OutletOp::Update { index });
    }
}
