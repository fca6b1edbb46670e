use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::mpsc;
use futures::executor::LocalPool;
use futures::stream;

use treeview::{Emission, Key, NestedTreeControl, NodeDef, Observable, Source, StreamError, Subject, TreeView};

fn collector<T: Clone + 'static>() -> (Rc<RefCell<Vec<Emission<T>>>>, Rc<dyn Fn(&Emission<T>)>) {
    let seen: Rc<RefCell<Vec<Emission<T>>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    (seen, Rc::new(move |emission: &Emission<T>| sink.borrow_mut().push(emission.clone())))
}

fn leaf_tree() -> TreeView<String> {
    let control = Rc::new(NestedTreeControl::new(|_: &String| Source::Static(Vec::new())));
    TreeView::builder()
        .control(control)
        .def(NodeDef::new("node"))
        .build()
        .unwrap()
}

fn row_keys(tree: &TreeView<String>) -> Vec<Key> {
    tree.rows().iter().map(|row| row.key().clone()).collect()
}

// ============================================================================
// Subject
// ============================================================================

#[test]
fn test_subject_delivers_to_subscribers() {
    let subject: Subject<u32> = Subject::new();
    let (seen, listener) = collector();
    let _subscription = subject.subscribe(listener);

    subject.next(vec![1, 2]);
    subject.fail("gone");

    assert_eq!(
        *seen.borrow(),
        vec![Ok(vec![1, 2]), Err(StreamError::new("gone"))]
    );
}

#[test]
fn test_subject_without_replay_skips_earlier_emissions() {
    let subject: Subject<u32> = Subject::new();
    subject.next(vec![1]);

    let (seen, listener) = collector();
    let _subscription = subject.subscribe(listener);
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_replaying_subject_hands_latest_to_new_subscribers() {
    let subject = Subject::replaying(vec![1u32]);
    subject.next(vec![2, 3]);

    let (seen, listener) = collector();
    let _subscription = subject.subscribe(listener);
    assert_eq!(*seen.borrow(), vec![Ok(vec![2, 3])]);
}

#[test]
fn test_dropped_subscription_stops_delivery() {
    let subject: Subject<u32> = Subject::new();
    let (seen, listener) = collector();
    let subscription = subject.subscribe(listener);
    assert_eq!(subject.observer_count(), 1);

    drop(subscription);
    subject.next(vec![1]);

    assert_eq!(subject.observer_count(), 0);
    assert!(seen.borrow().is_empty());
}

#[test]
fn test_unsubscribe_during_notification() {
    let subject: Subject<u32> = Subject::new();
    let second_calls = Rc::new(Cell::new(0));
    let slot: Rc<RefCell<Option<treeview::Subscription>>> = Rc::new(RefCell::new(None));

    let cancel = slot.clone();
    let _first = subject.subscribe(Rc::new(move |_: &Emission<u32>| {
        drop(cancel.borrow_mut().take());
    }));
    let counter = second_calls.clone();
    *slot.borrow_mut() = Some(subject.subscribe(Rc::new(move |_: &Emission<u32>| {
        counter.set(counter.get() + 1);
    })));

    subject.next(vec![1]);
    assert_eq!(second_calls.get(), 0);
}

// ============================================================================
// Source
// ============================================================================

#[test]
fn test_snapshot_of_static_source() {
    let source = Source::from(vec!["a", "b"]);
    assert_eq!(source.snapshot(), Some(vec!["a", "b"]));
}

#[test]
fn test_snapshot_of_streams() {
    let replaying = Subject::replaying(vec![7u32]);
    assert_eq!(replaying.source().snapshot(), Some(vec![7]));
    assert_eq!(replaying.observer_count(), 0);

    let live: Subject<u32> = Subject::new();
    assert_eq!(live.source().snapshot(), None);
}

#[test]
fn test_source_debug_output() {
    let source: Source<u32> = vec![1, 2, 3].into();
    assert_eq!(format!("{source:?}"), "Source::Static(3 items)");
}

#[test]
fn test_from_stream_forwards_items() {
    let mut pool = LocalPool::new();
    let source = Source::from_stream(
        stream::iter(vec![vec![1u32], vec![1, 2]]),
        &pool.spawner(),
    )
    .unwrap();

    let Source::Stream(stream) = source else {
        panic!("expected a stream source");
    };
    let (seen, listener) = collector();
    let _subscription = stream.subscribe(listener);

    pool.run_until_stalled();
    assert_eq!(*seen.borrow(), vec![Ok(vec![1]), Ok(vec![1, 2])]);
}

#[test]
fn test_tree_renders_channel_emissions() {
    let mut pool = LocalPool::new();
    let (tx, rx) = mpsc::unbounded::<Vec<String>>();
    let source = Source::from_stream(rx, &pool.spawner()).unwrap();
    let tree = leaf_tree();
    tree.set_data_source(source).unwrap();
    assert!(tree.rows().is_empty());

    tx.unbounded_send(vec!["a".into(), "b".into()]).unwrap();
    pool.run_until_stalled();
    assert_eq!(row_keys(&tree), vec![Key::from("a"), Key::from("b")]);

    tx.unbounded_send(vec!["b".into()]).unwrap();
    pool.run_until_stalled();
    assert_eq!(row_keys(&tree), vec![Key::from("b")]);
}

#[test]
fn test_stream_error_keeps_rows() {
    let subject: Subject<String> = Subject::new();
    let tree = leaf_tree();
    tree.set_data_source(subject.clone()).unwrap();
    subject.next(vec!["a".into()]);

    subject.fail("connection reset");

    assert_eq!(row_keys(&tree), vec![Key::from("a")]);
    assert!(tree.fault().is_none());
}
