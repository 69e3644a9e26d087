use crate::label::{ShortcutKey, WindowLabel};
use crate::shortcuts::{Shortcut, ShortcutSnapshot};

fn shortcut(bound: &[&str]) -> Shortcut {
    Shortcut::new(
        ShortcutKey::new(WindowLabel::main("clock"), "toggle"),
        "Toggle",
        "Toggle the clock overlay",
        bound.iter().map(|k| k.to_string()),
    )
}

#[test]
fn bind_key_appends_in_order() {
    let mut s = shortcut(&["Alt+X"]);
    s.bind_key("Ctrl+Y");
    assert_eq!(s.bound_keys(), ["Alt+X", "Ctrl+Y"]);
}

#[test]
fn unbind_at_returns_the_removed_key() {
    let mut s = shortcut(&["Alt+X", "Ctrl+Y"]);
    assert_eq!(s.unbind_at(0).as_deref(), Some("Alt+X"));
    assert_eq!(s.bound_keys(), ["Ctrl+Y"]);
}

#[test]
fn unbind_at_out_of_range_is_none() {
    let mut s = shortcut(&["Alt+X"]);
    assert_eq!(s.unbind_at(5), None);
    assert_eq!(s.bound_keys(), ["Alt+X"]);
}

#[test]
fn rebind_replaces_in_place() {
    let mut s = shortcut(&["Alt+X", "Ctrl+Y"]);
    assert_eq!(s.rebind_at(1, "Alt+Z").as_deref(), Some("Ctrl+Y"));
    assert_eq!(s.bound_keys(), ["Alt+X", "Alt+Z"]);
}

#[test]
fn rebind_collapses_on_self_duplicate() {
    let mut s = shortcut(&["Alt+X", "Ctrl+Y"]);
    // Rebinding position 0 to a key already held at position 1 removes
    // position 0 instead of producing ["Ctrl+Y", "Ctrl+Y"].
    assert_eq!(s.rebind_at(0, "Ctrl+Y").as_deref(), Some("Alt+X"));
    assert_eq!(s.bound_keys(), ["Ctrl+Y"]);
}

#[test]
fn rebind_to_the_same_key_at_the_same_position_keeps_it() {
    let mut s = shortcut(&["Alt+X"]);
    assert_eq!(s.rebind_at(0, "Alt+X").as_deref(), Some("Alt+X"));
    assert_eq!(s.bound_keys(), ["Alt+X"]);
}

#[test]
fn rebind_out_of_range_is_none() {
    let mut s = shortcut(&["Alt+X"]);
    assert_eq!(s.rebind_at(3, "Ctrl+Y"), None);
    assert_eq!(s.bound_keys(), ["Alt+X"]);
}

#[test]
fn unbind_all_keeps_the_shortcut_alive() {
    let mut s = shortcut(&["Alt+X", "Ctrl+Y"]);
    s.unbind_all();
    assert!(s.bound_keys().is_empty());
    assert_eq!(s.id(), "toggle");
}

#[test]
fn snapshot_carries_the_local_id_and_bindings() {
    let s = shortcut(&["Alt+X", "Ctrl+Y"]);
    assert_eq!(
        s.snapshot(),
        ShortcutSnapshot {
            id: "toggle".into(),
            keybinds: vec!["Alt+X".into(), "Ctrl+Y".into()],
        }
    );
}

#[test]
fn snapshot_round_trips_through_json() {
    let snapshot = shortcut(&["Alt+X"]).snapshot();
    let json = serde_json::to_string(&snapshot).unwrap();
    let back: ShortcutSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back, snapshot);
}
