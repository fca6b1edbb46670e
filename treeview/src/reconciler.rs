//! Applies diffs to one outlet.

use std::collections::HashMap;
use std::rc::Rc;

use crate::def::NodeDef;
use crate::differ::{Changes, Operation, diff};
use crate::error::TreeError;
use crate::key::Key;
use crate::node::TreeNode;
use crate::outlet::{NodeContext, OutletRef};
use crate::tree::TreeCore;

/// Keeps the rows of one outlet in step with a sequence of items.
///
/// `rows[i]` is always the row of the view at index `i` of the outlet.
pub(crate) struct Reconciler<T> {
    outlet: OutletRef<T>,
    /// Key of the item whose children this reconciler renders.
    parent: Option<Key>,
    rows: Vec<Rc<TreeNode<T>>>,
}

impl<T: Clone + PartialEq + 'static> Reconciler<T> {
    pub fn new(outlet: OutletRef<T>, parent: Option<Key>) -> Self {
        Self {
            outlet,
            parent,
            rows: Vec::new(),
        }
    }

    pub fn outlet(&self) -> &OutletRef<T> {
        &self.outlet
    }

    pub fn rows(&self) -> &[Rc<TreeNode<T>>] {
        &self.rows
    }

    /// Bring the outlet in line with `items`.
    ///
    /// Definition lookups, capability checks and the static children of new
    /// or changed nested rows are all checked before the outlet is touched,
    /// so a rejected emission leaves the rows as they were.
    pub fn render(&mut self, core: &Rc<TreeCore<T>>, items: &[T]) -> Result<Changes<T>, TreeError> {
        let previous: Vec<Key> = self.rows.iter().map(|row| row.key().clone()).collect();
        let changes = diff(&previous, items, &core.track_by)?;

        let mut plan: Vec<(&Operation<T>, Option<Rc<NodeDef<T>>>)> =
            Vec::with_capacity(changes.operations.len());
        for op in &changes.operations {
            let def = match op {
                Operation::Insert { item, index, .. } => {
                    let def = core.defs.select(*index, item)?;
                    core.validate(&def, item)?;
                    Some(def)
                }
                _ => None,
            };
            plan.push((op, def));
        }
        self.validate_retained(core, &changes.keys, items)?;

        for (op, def) in plan {
            match (op, def) {
                (Operation::Remove { index, .. }, _) => self.remove(core, *index),
                (Operation::Insert { key, item, index }, Some(def)) => {
                    self.insert(core, key.clone(), item.clone(), *index, def)?
                }
                (Operation::Move { key, to, .. }, _) => self.relocate(key, *to),
                (Operation::Insert { .. }, None) => {}
            }
        }

        self.refresh_retained(core, &previous, items)?;
        Ok(changes)
    }

    fn insert(
        &mut self,
        core: &Rc<TreeCore<T>>,
        key: Key,
        item: T,
        index: usize,
        def: Rc<NodeDef<T>>,
    ) -> Result<(), TreeError> {
        let level = core.compute_level(&item, self.parent.as_ref());
        let node = TreeNode::new(core, key.clone(), item.clone(), def.clone());
        self.rows.insert(index, node.clone());
        core.record_level(key, level, &node);
        let context = NodeContext {
            item,
            level,
            index,
            row: node.id(),
        };
        self.outlet.borrow_mut().create_at(&def, context, index);
        log::trace!("insert {} at {index} (level {level})", node.key());
        node.init()
    }

    fn remove(&mut self, core: &Rc<TreeCore<T>>, index: usize) {
        if index >= self.rows.len() {
            return;
        }
        let node = self.rows.remove(index);
        node.destroy();
        core.forget_level(node.key(), &node);
        self.outlet.borrow_mut().remove_at(index);
        log::trace!("remove {} from {index}", node.key());
    }

    fn relocate(&mut self, key: &Key, to: usize) {
        let Some(from) = self.rows.iter().position(|row| row.key() == key) else {
            return;
        };
        if from == to {
            return;
        }
        let node = self.rows.remove(from);
        self.rows.insert(to, node);
        self.outlet.borrow_mut().move_to(from, to);
        log::trace!("move {key} from {from} to {to}");
    }

    /// Nested rows handed a different item re-render their children; check
    /// those children before anything is mutated.
    fn validate_retained(
        &self,
        core: &Rc<TreeCore<T>>,
        keys: &[Key],
        items: &[T],
    ) -> Result<(), TreeError> {
        let rows: HashMap<&Key, &Rc<TreeNode<T>>> =
            self.rows.iter().map(|row| (row.key(), row)).collect();
        for (key, item) in keys.iter().zip(items) {
            if let Some(row) = rows.get(key)
                && row.is_nested()
                && !core.is_same_item(&row.data(), item)
            {
                core.validate_children(item)?;
            }
        }
        Ok(())
    }

    /// Hand retained rows their current item and refresh their view context.
    fn refresh_retained(
        &mut self,
        core: &Rc<TreeCore<T>>,
        previous: &[Key],
        items: &[T],
    ) -> Result<(), TreeError> {
        let old_index: HashMap<&Key, usize> =
            previous.iter().enumerate().map(|(i, k)| (k, i)).collect();
        for (index, item) in items.iter().enumerate() {
            let Some(node) = self.rows.get(index).cloned() else {
                break;
            };
            let Some(&was) = old_index.get(node.key()) else {
                continue;
            };
            let data_changed = node.set_data(item.clone())?;
            if data_changed || was != index {
                let level = node.level();
                if data_changed && core.caps.level {
                    core.record_level(node.key().clone(), level, &node);
                }
                let context = NodeContext {
                    item: item.clone(),
                    level,
                    index,
                    row: node.id(),
                };
                self.outlet.borrow_mut().update_context(index, context);
            }
        }
        Ok(())
    }

    /// Destroy every row and empty the outlet.
    pub fn clear(&mut self, core: &Rc<TreeCore<T>>) {
        for node in self.rows.drain(..) {
            node.destroy();
            core.forget_level(node.key(), &node);
        }
        self.outlet.borrow_mut().clear();
    }
}
