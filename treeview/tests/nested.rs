use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use treeview::{
    Key, MemoryOutlet, NestedTreeControl, NodeDef, OutletRegistry, Role, Source, Subject, TrackBy,
    TreeView,
};

#[derive(Debug, Clone, PartialEq)]
struct Dir {
    name: &'static str,
    kids: Vec<Dir>,
}

fn dir(name: &'static str, kids: Vec<Dir>) -> Dir {
    Dir { name, kids }
}

fn leaf(name: &'static str) -> Dir {
    dir(name, Vec::new())
}

fn track(_: usize, dir: &Dir) -> Key {
    Key::from(dir.name)
}

fn label(dir: &Dir) -> String {
    dir.name.to_string()
}

fn dir_tree() -> (TreeView<Dir>, Rc<RefCell<MemoryOutlet<Dir>>>) {
    let control = Rc::new(NestedTreeControl::with_track_by(
        |d: &Dir| Source::Static(d.kids.clone()),
        TrackBy::new(track),
    ));
    let registry = OutletRegistry::new();
    let outlet = MemoryOutlet::projecting(registry.clone()).shared();
    let tree = TreeView::builder_with(track)
        .control(control)
        .def(NodeDef::new("dir").nested())
        .outlet(outlet.clone())
        .outlets(registry)
        .build()
        .unwrap();
    (tree, outlet)
}

/// Tree of strings whose children come from per-item subjects.
fn streamed_tree(
    streams: &[&str],
) -> (
    TreeView<String>,
    Rc<RefCell<MemoryOutlet<String>>>,
    HashMap<String, Subject<String>>,
) {
    let subjects: HashMap<String, Subject<String>> = streams
        .iter()
        .map(|name| (name.to_string(), Subject::new()))
        .collect();
    let lookup = subjects.clone();
    let control = Rc::new(NestedTreeControl::new(move |item: &String| {
        lookup
            .get(item)
            .map(|subject| subject.source())
            .unwrap_or_else(|| Source::Static(Vec::new()))
    }));
    let registry = OutletRegistry::new();
    let outlet = MemoryOutlet::projecting(registry.clone()).shared();
    let tree = TreeView::builder()
        .control(control)
        .def(NodeDef::new("node").nested())
        .outlet(outlet.clone())
        .outlets(registry)
        .build()
        .unwrap();
    (tree, outlet, subjects)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

// ============================================================================
// Recursive Rendering
// ============================================================================

#[test]
fn test_nested_children_render_recursively() {
    let (tree, outlet) = dir_tree();
    tree.render(&[
        dir("src", vec![leaf("lib.rs"), dir("bin", vec![leaf("main.rs")])]),
        leaf("Cargo.toml"),
    ])
    .unwrap();

    assert_eq!(
        outlet.borrow().lines(&label),
        vec!["src", "  lib.rs", "  bin", "    main.rs", "Cargo.toml"]
    );
    assert_eq!(outlet.borrow().views().len(), 2);
}

#[test]
fn test_children_levels_are_parent_plus_one() {
    let (tree, _outlet) = dir_tree();
    tree.render(&[dir("p", vec![leaf("c1"), dir("c2", vec![leaf("g")])])])
        .unwrap();

    let p = tree.level(&Key::from("p")).unwrap();
    assert_eq!(p, 0);
    assert_eq!(tree.level(&Key::from("c1")), Some(p + 1));
    assert_eq!(tree.level(&Key::from("c2")), Some(p + 1));
    assert_eq!(tree.level(&Key::from("g")), Some(p + 2));
    assert_eq!(tree.node(&Key::from("g")).unwrap().level(), 2);
}

#[test]
fn test_row_children_accessor() {
    let (tree, _outlet) = dir_tree();
    tree.render(&[dir("p", vec![leaf("a"), leaf("b")])]).unwrap();

    let p = tree.node(&Key::from("p")).unwrap();
    let children: Vec<Key> = p.children().iter().map(|row| row.key().clone()).collect();
    assert_eq!(children, vec![Key::from("a"), Key::from("b")]);
    assert_eq!(p.role(), Role::Group);
}

#[test]
fn test_changed_item_re_resolves_children() {
    let (tree, outlet) = dir_tree();
    tree.render(&[dir("p", vec![leaf("a")])]).unwrap();
    let a = tree.node(&Key::from("a")).unwrap();

    tree.render(&[dir("p", vec![leaf("b"), leaf("a")])]).unwrap();

    assert_eq!(outlet.borrow().lines(&label), vec!["p", "  b", "  a"]);
    assert!(Rc::ptr_eq(&a, &tree.node(&Key::from("a")).unwrap()));

    tree.render(&[leaf("p")]).unwrap();
    assert_eq!(outlet.borrow().lines(&label), vec!["p"]);
    assert!(a.is_destroyed());
    assert_eq!(tree.node(&Key::from("p")).unwrap().role(), Role::TreeItem);
}

#[test]
fn test_removing_parent_clears_subtree() {
    let (tree, outlet) = dir_tree();
    tree.render(&[dir("p", vec![dir("c", vec![leaf("g")])]), leaf("q")])
        .unwrap();
    let g = tree.node(&Key::from("g")).unwrap();

    tree.render(&[leaf("q")]).unwrap();

    assert!(g.is_destroyed());
    assert!(tree.node(&Key::from("c")).is_none());
    assert!(tree.node(&Key::from("g")).is_none());
    assert_eq!(tree.level_entries().len(), 1);
    assert_eq!(outlet.borrow().lines(&label), vec!["q"]);
    assert_eq!(tree.outlets().len(), 1);
}

// ============================================================================
// Streamed Children
// ============================================================================

#[test]
fn test_streamed_children_follow_emissions() {
    let (tree, outlet, subjects) = streamed_tree(&["p"]);
    tree.render(&strings(&["p"])).unwrap();
    assert_eq!(outlet.borrow().lines(&|s: &String| s.clone()), vec!["p"]);

    subjects["p"].next(strings(&["x", "y"]));
    assert_eq!(
        outlet.borrow().lines(&|s: &String| s.clone()),
        vec!["p", "  x", "  y"]
    );

    subjects["p"].next(strings(&["y"]));
    assert_eq!(
        outlet.borrow().lines(&|s: &String| s.clone()),
        vec!["p", "  y"]
    );
}

#[test]
fn test_one_commit_per_children_emission() {
    let (tree, _outlet, subjects) = streamed_tree(&["p"]);
    tree.render(&strings(&["p"])).unwrap();
    let commits = Rc::new(Cell::new(0));
    let counter = commits.clone();
    let _watch = tree.on_commit(move |_| counter.set(counter.get() + 1));

    subjects["p"].next(strings(&["a", "b", "c"]));
    assert_eq!(commits.get(), 1);

    subjects["p"].next(strings(&["c", "b"]));
    assert_eq!(commits.get(), 2);
}

#[test]
fn test_destroyed_row_stops_listening() {
    let (tree, _outlet, subjects) = streamed_tree(&["p"]);
    tree.render(&strings(&["p"])).unwrap();
    let stream = &subjects["p"];
    assert_eq!(stream.observer_count(), 2);

    stream.next(strings(&["c1", "c2"]));
    assert!(tree.node(&Key::from("c1")).is_some());

    tree.render(&[]).unwrap();
    assert_eq!(stream.observer_count(), 0);
    let commits = tree.commits();

    stream.next(strings(&["c3"]));
    assert!(tree.node(&Key::from("c3")).is_none());
    assert_eq!(tree.commits(), commits);
    assert!(tree.level_entries().is_empty());
}

#[test]
fn test_children_failure_is_isolated() {
    let (tree, outlet, subjects) = streamed_tree(&["p", "q"]);
    tree.render(&strings(&["p", "q"])).unwrap();
    subjects["p"].next(strings(&["a"]));
    subjects["q"].next(strings(&["b"]));

    subjects["p"].fail("disk unavailable");

    assert_eq!(
        outlet.borrow().lines(&|s: &String| s.clone()),
        vec!["p", "q", "  b"]
    );
    assert_eq!(tree.node(&Key::from("p")).unwrap().role(), Role::TreeItem);
    assert_eq!(tree.node(&Key::from("q")).unwrap().role(), Role::Group);
    assert!(tree.fault().is_none());

    subjects["p"].next(strings(&["a"]));
    assert_eq!(
        outlet.borrow().lines(&|s: &String| s.clone()),
        vec!["p", "  a", "q", "  b"]
    );
}

#[test]
fn test_replaying_children_render_immediately() {
    let children = Subject::replaying(strings(&["x"]));
    let source = children.clone();
    let control = Rc::new(NestedTreeControl::new(move |item: &String| {
        if item == "p" {
            source.source()
        } else {
            Source::Static(Vec::new())
        }
    }));
    let tree = TreeView::builder()
        .control(control)
        .def(NodeDef::new("node").nested())
        .build()
        .unwrap();

    tree.render(&strings(&["p"])).unwrap();

    assert_eq!(tree.level(&Key::from("x")), Some(1));
    assert_eq!(tree.commits(), 1);
}

// ============================================================================
// Child Outlets
// ============================================================================

#[test]
fn test_children_wait_for_their_outlet() {
    let control = Rc::new(NestedTreeControl::with_track_by(
        |d: &Dir| Source::Static(d.kids.clone()),
        TrackBy::new(track),
    ));
    let registry = OutletRegistry::new();
    let outlet = MemoryOutlet::new().shared();
    let tree = TreeView::builder_with(track)
        .control(control)
        .def(NodeDef::new("dir").nested())
        .outlet(outlet.clone())
        .outlets(registry.clone())
        .build()
        .unwrap();

    tree.render(&[dir("p", vec![leaf("x")])]).unwrap();
    assert!(tree.node(&Key::from("x")).is_none());

    let p = tree.node(&Key::from("p")).unwrap();
    let child = MemoryOutlet::new().shared();
    registry.register(p.id(), child.clone());

    assert_eq!(child.borrow().items(), vec![leaf("x")]);
    assert_eq!(tree.level(&Key::from("x")), Some(1));

    assert!(registry.unregister(p.id()));
    assert!(tree.node(&Key::from("x")).is_none());
    assert!(child.borrow().items().is_empty());
}

#[test]
fn test_replaced_outlet_receives_children() {
    let (tree, outlet) = dir_tree();
    tree.render(&[dir("p", vec![leaf("x"), leaf("y")])]).unwrap();
    let p = tree.node(&Key::from("p")).unwrap();
    let original = outlet.borrow().children_of(0).unwrap();

    let replacement = MemoryOutlet::new().shared();
    tree.outlets().register(p.id(), replacement.clone());

    assert!(original.borrow().items().is_empty());
    assert_eq!(replacement.borrow().items(), vec![leaf("x"), leaf("y")]);
}
