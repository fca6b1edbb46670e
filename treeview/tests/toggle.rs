use std::cell::RefCell;
use std::rc::Rc;

use treeview::{
    Capabilities, Key, NestedTreeControl, NodeDef, Source, ToggleCommand, ToggleEvent, TreeControl,
    TreeView, Trigger,
};

/// Control that records what it was asked to do.
#[derive(Default)]
struct Recorder {
    calls: RefCell<Vec<String>>,
}

impl Recorder {
    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl TreeControl<String> for Recorder {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            expandable: true,
            ..Capabilities::default()
        }
    }

    fn is_expandable(&self, _item: &String) -> Option<bool> {
        Some(true)
    }

    fn is_expanded(&self, _item: &String) -> bool {
        false
    }

    fn toggle(&self, item: &String) {
        self.calls.borrow_mut().push(format!("toggle {item}"));
    }

    fn toggle_descendants(&self, item: &String) {
        self.calls.borrow_mut().push(format!("toggle_descendants {item}"));
    }
}

// ============================================================================
// Toggle Command
// ============================================================================

#[test]
fn test_toggle_single_item() {
    let control = Rc::new(Recorder::default());
    let command = ToggleCommand::<String>::new(control.clone());
    let mut event = ToggleEvent::click();

    command.activate(&"x".to_string(), &mut event);

    assert_eq!(control.calls(), vec!["toggle x"]);
    assert!(event.is_propagation_stopped());
}

#[test]
fn test_toggle_recursive() {
    let control = Rc::new(Recorder::default());
    let command = ToggleCommand::<String>::new(control.clone()).recursive(true);
    let mut event = ToggleEvent::key();

    command.activate(&"x".to_string(), &mut event);

    assert_eq!(control.calls(), vec!["toggle_descendants x"]);
    assert!(event.is_propagation_stopped());
    assert!(command.is_recursive());
}

#[test]
fn test_each_activation_toggles_once() {
    let control = Rc::new(Recorder::default());
    let command = ToggleCommand::<String>::new(control.clone());

    for _ in 0..3 {
        let mut event = ToggleEvent::click();
        command.activate(&"x".to_string(), &mut event);
    }
    assert_eq!(control.calls().len(), 3);
}

#[test]
fn test_fresh_event_propagates() {
    let event = ToggleEvent::new(Trigger::Key);
    assert!(!event.is_propagation_stopped());
    assert_eq!(event.trigger, Trigger::Key);
}

#[test]
fn test_activate_node_uses_current_item() {
    let control = Rc::new(Recorder::default());
    let tree = TreeView::builder()
        .control(control.clone())
        .def(NodeDef::new("node"))
        .build()
        .unwrap();
    tree.render(&["x".to_string()]).unwrap();
    let node = tree.node(&Key::from("x")).unwrap();

    let command = ToggleCommand::new(tree.control());
    let mut event = ToggleEvent::click();
    command.activate_node(&node, &mut event);

    assert_eq!(control.calls(), vec!["toggle x"]);
}

#[test]
fn test_toggle_drives_expansion_state() {
    let control = Rc::new(NestedTreeControl::new(|item: &String| {
        if item == "p" {
            Source::Static(vec!["c".to_string()])
        } else {
            Source::Static(Vec::new())
        }
    }));
    let tree = TreeView::builder()
        .control(control.clone())
        .def(NodeDef::new("node"))
        .build()
        .unwrap();
    tree.render(&["p".to_string()]).unwrap();
    let p = tree.node(&Key::from("p")).unwrap();

    let command = ToggleCommand::new(tree.control()).recursive(true);
    command.activate_node(&p, &mut ToggleEvent::click());

    assert!(p.is_expanded());
    assert!(control.is_expanded(&"c".to_string()));

    command.activate_node(&p, &mut ToggleEvent::click());
    assert!(!p.is_expanded());
}
