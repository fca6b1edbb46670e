use treeview::{Changes, Key, Operation, TrackBy, TreeError, diff};

fn keys(items: &[&str]) -> Vec<Key> {
    items.iter().map(|item| Key::from(*item)).collect()
}

fn track() -> TrackBy<&'static str> {
    TrackBy::identity()
}

fn replayed(previous: &[&'static str], next: &[&'static str]) -> Vec<Key> {
    let changes = diff(&keys(previous), next, &track()).unwrap();
    let mut container = keys(previous);
    changes.replay(&mut container);
    container
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn test_diff_against_itself_is_empty() {
    let data = ["a", "b", "c", "d"];
    let changes = diff(&keys(&data), &data, &track()).unwrap();
    assert!(changes.is_empty());
    assert_eq!(changes.keys, keys(&data));
}

#[test]
fn test_diff_empty_against_empty() {
    let changes: Changes<&str> = diff(&[], &[], &track()).unwrap();
    assert!(changes.is_empty());
    assert!(changes.keys.is_empty());
}

// ============================================================================
// Operation Lists
// ============================================================================

#[test]
fn test_diff_swap_remove_and_insert() {
    let changes = diff(&keys(&["a", "b", "c"]), &["b", "a", "d"], &track()).unwrap();

    assert_eq!(changes.moves(), 2);
    assert_eq!(changes.removals(), 1);
    assert_eq!(changes.inserts(), 1);

    assert!(changes.operations.contains(&Operation::Move {
        key: Key::from("a"),
        from: 0,
        to: 1,
    }));
    assert!(changes.operations.contains(&Operation::Move {
        key: Key::from("b"),
        from: 1,
        to: 0,
    }));
    assert!(changes.operations.contains(&Operation::Remove {
        key: Key::from("c"),
        index: 2,
    }));
    assert!(changes.operations.contains(&Operation::Insert {
        key: Key::from("d"),
        item: "d",
        index: 2,
    }));
}

#[test]
fn test_diff_removals_come_first_in_descending_order() {
    let changes = diff(&keys(&["a", "b", "c", "d"]), &["x", "c"], &track()).unwrap();

    let removals: Vec<usize> = changes
        .operations
        .iter()
        .take_while(|op| matches!(op, Operation::Remove { .. }))
        .map(|op| match op {
            Operation::Remove { index, .. } => *index,
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(removals, vec![3, 1, 0]);
    assert_eq!(changes.removals(), 3);
}

#[test]
fn test_diff_inserts_in_ascending_index() {
    let changes = diff(&[], &["a", "b", "c"], &track()).unwrap();
    let indexes: Vec<usize> = changes
        .operations
        .iter()
        .map(|op| match op {
            Operation::Insert { index, .. } => *index,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(indexes, vec![0, 1, 2]);
}

#[test]
fn test_diff_everything_removed() {
    let changes: Changes<&str> = diff(&keys(&["a", "b"]), &[], &track()).unwrap();
    assert_eq!(changes.removals(), 2);
    assert_eq!(changes.inserts(), 0);
    assert!(changes.keys.is_empty());
}

#[test]
fn test_diff_moves_item_displaced_by_earlier_moves() {
    let changes = diff(&keys(&["a", "b", "c"]), &["c", "b", "a"], &track()).unwrap();

    assert!(changes.operations.contains(&Operation::Move {
        key: Key::from("b"),
        from: 1,
        to: 1,
    }));
    assert_eq!(changes.moves(), 3);
}

#[test]
fn test_operation_key() {
    let op: Operation<&str> = Operation::Move {
        key: Key::from("a"),
        from: 0,
        to: 3,
    };
    assert_eq!(op.key(), &Key::from("a"));
}

// ============================================================================
// Completeness
// ============================================================================

#[test]
fn test_replay_reaches_target_order() {
    let cases: &[(&[&str], &[&str])] = &[
        (&["a", "b", "c"], &["b", "a", "d"]),
        (&["a", "b", "c", "d", "e"], &["e", "d", "c", "b", "a"]),
        (&["a", "b", "c"], &["c", "x", "a", "y"]),
        (&[], &["a", "b"]),
        (&["a", "b"], &[]),
        (&["a", "b", "c", "d"], &["d", "a", "b", "c"]),
        (&["a", "b", "c", "d"], &["b", "c", "d", "a"]),
        (&["a"], &["b"]),
    ];
    for (previous, next) in cases {
        assert_eq!(replayed(previous, next), keys(next), "{previous:?} -> {next:?}");
    }
}

#[test]
fn test_replay_with_custom_track_by() {
    let track_by = TrackBy::new(|_, item: &(u32, &'static str)| Key::Num(item.0 as i128));
    let previous = vec![Key::Num(1), Key::Num(2), Key::Num(3)];
    let next = [(3, "three"), (1, "one, renamed"), (4, "four")];

    let changes = diff(&previous, &next, &track_by).unwrap();
    let mut container = previous.clone();
    changes.replay(&mut container);
    assert_eq!(container, vec![Key::Num(3), Key::Num(1), Key::Num(4)]);
}

#[test]
fn test_index_track_by_never_moves() {
    let track_by = TrackBy::new(|index, _: &&'static str| Key::Num(index as i128));
    let previous = vec![Key::Num(0), Key::Num(1)];
    let changes = diff(&previous, &["z", "y", "x"], &track_by).unwrap();
    assert_eq!(changes.moves(), 0);
    assert_eq!(changes.inserts(), 1);
}

// ============================================================================
// Duplicate Keys
// ============================================================================

#[test]
fn test_duplicate_key_is_rejected() {
    let result = diff(&[], &["a", "b", "a"], &track());
    assert_eq!(
        result,
        Err(TreeError::DuplicateKey {
            key: Key::from("a"),
            first: 0,
            second: 2,
        })
    );
}
