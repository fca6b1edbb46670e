//! Data and children sources.
//!
//! Whatever shape the caller hands in (a plain vector, a push stream, a
//! connectable data source, a `futures` stream), the engine only ever sees
//! one of two things: a static sequence, or something it can subscribe to
//! that emits whole sequences.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future;
use futures::stream::{Stream, StreamExt};
use futures::task::{LocalSpawnExt, SpawnError};

use crate::error::StreamError;
use crate::signal::{Listeners, Subscription};

/// One emission of a streaming source.
pub type Emission<T> = Result<Vec<T>, StreamError>;

/// Callback receiving emissions.
pub type Listener<T> = Rc<dyn Fn(&Emission<T>)>;

/// Something that emits whole sequences over time.
pub trait Observable<T> {
    /// Register `listener`. Emissions stop once the returned handle is dropped.
    fn subscribe(&self, listener: Listener<T>) -> Subscription;
}

/// A push stream of sequences.
///
/// Emissions are delivered synchronously, in subscription order, from the
/// call to [`Subject::next`] or [`Subject::fail`].
pub struct Subject<T> {
    listeners: Listeners<Emission<T>>,
    latest: Rc<RefCell<Option<Emission<T>>>>,
    replay: bool,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
            latest: self.latest.clone(),
            replay: self.replay,
        }
    }
}

impl<T: Clone + 'static> Subject<T> {
    /// A subject that only delivers emissions made after subscribing.
    pub fn new() -> Self {
        Self {
            listeners: Listeners::new(),
            latest: Rc::new(RefCell::new(None)),
            replay: false,
        }
    }

    /// A subject that immediately hands its latest emission to new subscribers.
    pub fn replaying(initial: Vec<T>) -> Self {
        Self {
            listeners: Listeners::new(),
            latest: Rc::new(RefCell::new(Some(Ok(initial)))),
            replay: true,
        }
    }

    pub fn next(&self, items: Vec<T>) {
        self.emit(Ok(items));
    }

    pub fn fail(&self, error: impl Into<StreamError>) {
        self.emit(Err(error.into()));
    }

    fn emit(&self, emission: Emission<T>) {
        if self.replay {
            *self.latest.borrow_mut() = Some(emission.clone());
        }
        self.listeners.notify(&emission);
    }

    /// Number of live subscriptions.
    pub fn observer_count(&self) -> usize {
        self.listeners.len()
    }

    /// Wrap this subject as a [`Source`].
    pub fn source(&self) -> Source<T> {
        Source::Stream(Rc::new(self.clone()))
    }
}

impl<T: Clone + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Observable<T> for Subject<T> {
    fn subscribe(&self, listener: Listener<T>) -> Subscription {
        let subscription = self.listeners.add(listener.clone());
        if self.replay {
            let latest = self.latest.borrow().clone();
            if let Some(emission) = latest {
                listener(&emission);
            }
        }
        subscription
    }
}

/// A sequence that is either available now or arrives over time.
pub enum Source<T> {
    Static(Vec<T>),
    Stream(Rc<dyn Observable<T>>),
}

impl<T> Clone for Source<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Source::Static(items) => Source::Static(items.clone()),
            Source::Stream(stream) => Source::Stream(stream.clone()),
        }
    }
}

impl<T> fmt::Debug for Source<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Static(items) => write!(f, "Source::Static({} items)", items.len()),
            Source::Stream(_) => f.write_str("Source::Stream(..)"),
        }
    }
}

impl<T> From<Vec<T>> for Source<T> {
    fn from(items: Vec<T>) -> Self {
        Source::Static(items)
    }
}

impl<T: Clone + 'static> From<Subject<T>> for Source<T> {
    fn from(subject: Subject<T>) -> Self {
        Source::Stream(Rc::new(subject))
    }
}

impl<T: Clone + 'static> Source<T> {
    /// Adapt a `futures` stream, polled on `spawner`.
    ///
    /// Every item the stream yields is pushed to subscribers when the local
    /// executor runs the forwarding task.
    pub fn from_stream<S>(stream: S, spawner: &impl LocalSpawnExt) -> Result<Self, SpawnError>
    where
        S: Stream<Item = Vec<T>> + 'static,
    {
        let subject = Subject::new();
        let forward = subject.clone();
        spawner.spawn_local(stream.for_each(move |items| {
            forward.next(items);
            future::ready(())
        }))?;
        Ok(subject.source())
    }

    /// Take whatever the source can provide without waiting.
    ///
    /// Static sources return their items; streams return the emission they
    /// replay on subscription, if any.
    pub fn snapshot(&self) -> Option<Vec<T>> {
        match self {
            Source::Static(items) => Some(items.clone()),
            Source::Stream(stream) => {
                let captured: Rc<RefCell<Option<Vec<T>>>> = Rc::new(RefCell::new(None));
                let sink = captured.clone();
                let subscription = stream.subscribe(Rc::new(move |emission: &Emission<T>| {
                    let mut slot = sink.borrow_mut();
                    if let (None, Ok(items)) = (slot.as_ref(), emission) {
                        *slot = Some(items.clone());
                    }
                }));
                subscription.unsubscribe();
                captured.take()
            }
        }
    }
}

/// Identifies the tree a [`Connectable`] source is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewerId(u64);

impl ViewerId {
    pub(crate) fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "__viewer_{}", self.0)
    }
}

/// A stateful source that is told when a tree starts and stops using it.
pub trait Connectable<T> {
    fn connect(&self, viewer: ViewerId) -> Source<T>;
    fn disconnect(&self, viewer: ViewerId);
}

/// Top-level data for a tree.
pub enum DataSource<T> {
    Static(Vec<T>),
    Stream(Rc<dyn Observable<T>>),
    Connectable(Rc<dyn Connectable<T>>),
}

impl<T> From<Vec<T>> for DataSource<T> {
    fn from(items: Vec<T>) -> Self {
        DataSource::Static(items)
    }
}

impl<T: Clone + 'static> From<Subject<T>> for DataSource<T> {
    fn from(subject: Subject<T>) -> Self {
        DataSource::Stream(Rc::new(subject))
    }
}

impl<T> From<Source<T>> for DataSource<T> {
    fn from(source: Source<T>) -> Self {
        match source {
            Source::Static(items) => DataSource::Static(items),
            Source::Stream(stream) => DataSource::Stream(stream),
        }
    }
}
