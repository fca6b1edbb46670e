//! Outline Example
//!
//! Renders a small project outline into an in-memory outlet and prints it
//! after each update:
//! - nested rows with static and streamed children
//! - keyed moves that reuse rows
//! - indentation padding and the toggle command
//!
//! Debug output goes to `outline.log`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::rc::Rc;

use log::LevelFilter;
use simplelog::{Config, WriteLogger};
use treeview::{
    Edge, InlineStyle, Key, MemoryOutlet, NestedTreeControl, NodeDef, NodePadding, OutletRegistry,
    Source, Subject, ToggleCommand, ToggleEvent, TreeError, TreeView,
};

// ============================================================================
// Data
// ============================================================================

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn print(title: &str, outlet: &Rc<RefCell<MemoryOutlet<String>>>) {
    println!("== {title}");
    for line in outlet.borrow().lines(&|name: &String| name.clone()) {
        println!("{line}");
    }
    println!();
}

fn run() -> Result<(), TreeError> {
    let tests = Subject::replaying(names(&["differ.rs", "rendering.rs"]));
    let mut folders: HashMap<String, Source<String>> = HashMap::new();
    folders.insert("src".into(), Source::Static(names(&["lib.rs", "tree.rs"])));
    folders.insert("tests".into(), tests.source());

    let control = Rc::new(NestedTreeControl::new(move |name: &String| {
        folders
            .get(name)
            .cloned()
            .unwrap_or_else(|| Source::Static(Vec::new()))
    }));
    let registry = OutletRegistry::new();
    let outlet = MemoryOutlet::projecting(registry.clone()).shared();
    let tree = TreeView::builder()
        .control(control.clone())
        .def(NodeDef::new("entry").nested())
        .outlet(outlet.clone())
        .outlets(registry)
        .build()?;

    let root = Subject::new();
    tree.set_data_source(root.clone())?;

    root.next(names(&["Cargo.toml", "src", "tests"]));
    print("initial", &outlet);

    tests.next(names(&["differ.rs", "nested.rs", "rendering.rs"]));
    print("tests changed", &outlet);

    root.next(names(&["tests", "src", "Cargo.toml"]));
    print("reordered", &outlet);

    let Some(lib) = tree.node(&Key::from("lib.rs")) else {
        return Ok(());
    };
    let style = Rc::new(RefCell::new(InlineStyle::new()));
    let _padding = NodePadding::attach(lib.clone(), style.clone());
    println!(
        "lib.rs is at level {} with padding-left {}",
        lib.level(),
        style.borrow().padding(Edge::Left).unwrap_or("none")
    );

    let command = ToggleCommand::new(tree.control()).recursive(true);
    if let Some(src) = tree.node(&Key::from("src")) {
        command.activate_node(&src, &mut ToggleEvent::click());
    }
    println!("expanded: {:?}", control.expanded_keys());
    println!("{} render passes committed", tree.commits());
    Ok(())
}

fn main() {
    // Initialize file logging
    if let Ok(log_file) = File::create("outline.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, Config::default(), log_file);
    }

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
    }
}
