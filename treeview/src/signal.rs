//! Listener lists and subscription handles.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Handle to a registered callback.
///
/// Dropping the handle (or calling [`Subscription::unsubscribe`]) removes
/// the callback. Once cancelled, the callback is never invoked again, even
/// if a notification is already in flight.
#[must_use = "dropping a Subscription cancels it"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to cancel.
    pub fn empty() -> Self {
        Self { cancel: None }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

type Callback<A> = Rc<dyn Fn(&A)>;

struct Slots<A: ?Sized> {
    next_id: u64,
    entries: Vec<(u64, Callback<A>)>,
}

/// An ordered list of callbacks sharing one argument type.
pub(crate) struct Listeners<A: ?Sized> {
    inner: Rc<RefCell<Slots<A>>>,
}

impl<A: ?Sized> Clone for Listeners<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: ?Sized + 'static> Listeners<A> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Slots {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    pub fn add(&self, callback: Callback<A>) -> Subscription {
        let id = {
            let mut slots = self.inner.borrow_mut();
            let id = slots.next_id;
            slots.next_id += 1;
            slots.entries.push((id, callback));
            id
        };
        let weak: Weak<RefCell<Slots<A>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().entries.retain(|(entry, _)| *entry != id);
            }
        })
    }

    /// Invoke every callback registered at the time of the call.
    ///
    /// Callbacks may subscribe or unsubscribe while being notified; a
    /// callback removed mid-notification is skipped.
    pub fn notify(&self, arg: &A) {
        let snapshot: Vec<(u64, Callback<A>)> = self.inner.borrow().entries.clone();
        for (id, callback) in snapshot {
            let live = self
                .inner
                .borrow()
                .entries
                .iter()
                .any(|(entry, _)| *entry == id);
            if live {
                callback(arg);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn clear(&self) {
        let drained = std::mem::take(&mut self.inner.borrow_mut().entries);
        drop(drained);
    }
}
