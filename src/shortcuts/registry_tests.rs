use std::sync::Arc;

use crate::bus::EventBus;
use crate::label::{ShortcutKey, WindowLabel};
use crate::modules::{ModuleRegistry, StartOptions};
use crate::platform::HeadlessWindows;
use crate::shortcuts::{KeybindRegistry, ShortcutSnapshot};
use crate::store::MemoryStore;

fn setup(module_names: &[&str]) -> (ModuleRegistry, KeybindRegistry) {
    let bus = EventBus::new();
    let service = Arc::new(HeadlessWindows::new(bus));
    let store = Arc::new(MemoryStore::new());
    let modules = ModuleRegistry::new(
        service,
        store,
        module_names.iter().map(|n| n.to_string()).collect(),
    );
    for name in module_names {
        modules.start_module(name, StartOptions::default());
    }
    (modules, KeybindRegistry::new())
}

fn keys(keybinds: &[&str]) -> Vec<String> {
    keybinds.iter().map(|k| k.to_string()).collect()
}

#[test]
fn add_shortcut_indexes_each_distinct_key_once() {
    let (modules, keybinds) = setup(&["clock"]);
    let window = WindowLabel::main("clock");

    keybinds.add_shortcut(
        &modules,
        &window,
        "toggle",
        "Toggle",
        "Toggle the overlay",
        &keys(&["Alt+X", "Alt+X", "Ctrl+Y"]),
        false,
    );

    let key = ShortcutKey::new(window.clone(), "toggle");
    assert_eq!(keybinds.lookup("Alt+X"), vec![key.clone()]);
    assert_eq!(keybinds.lookup("Ctrl+Y"), vec![key]);
    // The shortcut itself keeps the raw default list.
    let shortcut = modules.window_shortcut(&window, "toggle").unwrap();
    assert_eq!(shortcut.bound_keys(), ["Alt+X", "Alt+X", "Ctrl+Y"]);
}

#[test]
fn duplicate_shortcut_id_is_rejected_and_existing_untouched() {
    let (modules, keybinds) = setup(&["clock"]);
    let window = WindowLabel::main("clock");

    keybinds.add_shortcut(
        &modules,
        &window,
        "toggle",
        "Toggle",
        "first",
        &keys(&["Alt+X"]),
        false,
    );
    keybinds.add_shortcut(
        &modules,
        &window,
        "toggle",
        "Other",
        "second",
        &keys(&["Alt+Z"]),
        false,
    );

    let shortcut = modules.window_shortcut(&window, "toggle").unwrap();
    assert_eq!(shortcut.name(), "Toggle");
    assert_eq!(shortcut.bound_keys(), ["Alt+X"]);
    assert!(keybinds.lookup("Alt+Z").is_empty());
}

#[test]
fn add_shortcut_for_inactive_module_is_a_noop() {
    let (modules, keybinds) = setup(&["clock"]);
    let window = WindowLabel::main("ghost");

    keybinds.add_shortcut(&modules, &window, "x", "X", "", &keys(&["Alt+X"]), false);
    assert!(keybinds.lookup("Alt+X").is_empty());
}

#[test]
fn saved_keybinds_win_over_registration_defaults() {
    let (modules, keybinds) = setup(&[]);
    let bus_saved = vec![ShortcutSnapshot {
        id: "toggle".into(),
        keybinds: vec!["Ctrl+S".into()],
    }];
    modules.set_all_modules(vec!["clock".into()]);
    modules.start_module(
        "clock",
        StartOptions {
            saved_shortcuts: bus_saved,
            ..Default::default()
        },
    );
    let window = WindowLabel::main("clock");

    keybinds.add_shortcut(
        &modules,
        &window,
        "toggle",
        "Toggle",
        "",
        &keys(&["Alt+X"]),
        false,
    );

    let shortcut = modules.window_shortcut(&window, "toggle").unwrap();
    assert_eq!(shortcut.bound_keys(), ["Ctrl+S"]);
    assert!(keybinds.lookup("Alt+X").is_empty());
    assert!(!keybinds.lookup("Ctrl+S").is_empty());
}

#[test]
fn add_keybind_rejects_a_key_already_bound_to_the_shortcut() {
    let (modules, keybinds) = setup(&["clock"]);
    let window = WindowLabel::main("clock");
    keybinds.add_shortcut(
        &modules,
        &window,
        "toggle",
        "Toggle",
        "",
        &keys(&["Alt+X"]),
        false,
    );

    keybinds.add_keybind(&modules, &window, "toggle", "Alt+X", false);

    let shortcut = modules.window_shortcut(&window, "toggle").unwrap();
    assert_eq!(shortcut.bound_keys(), ["Alt+X"]);
}

#[test]
fn add_keybind_indexes_the_new_key() {
    let (modules, keybinds) = setup(&["clock"]);
    let window = WindowLabel::main("clock");
    keybinds.add_shortcut(
        &modules,
        &window,
        "toggle",
        "Toggle",
        "",
        &keys(&["Alt+X"]),
        false,
    );

    keybinds.add_keybind(&modules, &window, "toggle", "Ctrl+Y", false);

    let key = ShortcutKey::new(window.clone(), "toggle");
    assert!(keybinds.is_indexed("Ctrl+Y", &key));
    let shortcut = modules.window_shortcut(&window, "toggle").unwrap();
    assert_eq!(shortcut.bound_keys(), ["Alt+X", "Ctrl+Y"]);
}

#[test]
fn remove_keybind_unindexes_the_removed_key() {
    let (modules, keybinds) = setup(&["clock"]);
    let window = WindowLabel::main("clock");
    keybinds.add_shortcut(
        &modules,
        &window,
        "toggle",
        "Toggle",
        "",
        &keys(&["Alt+X", "Ctrl+Y"]),
        false,
    );

    keybinds.remove_keybind(&modules, &window, "toggle", 0, false);

    let key = ShortcutKey::new(window.clone(), "toggle");
    assert!(!keybinds.is_indexed("Alt+X", &key));
    assert!(keybinds.is_indexed("Ctrl+Y", &key));
}

#[test]
fn remove_keybind_out_of_range_changes_nothing() {
    let (modules, keybinds) = setup(&["clock"]);
    let window = WindowLabel::main("clock");
    keybinds.add_shortcut(
        &modules,
        &window,
        "toggle",
        "Toggle",
        "",
        &keys(&["Alt+X"]),
        false,
    );

    keybinds.remove_keybind(&modules, &window, "toggle", 7, false);

    let key = ShortcutKey::new(window.clone(), "toggle");
    assert!(keybinds.is_indexed("Alt+X", &key));
}

#[test]
fn remove_all_keybinds_clears_index_and_shortcut() {
    let (modules, keybinds) = setup(&["clock"]);
    let window = WindowLabel::main("clock");
    keybinds.add_shortcut(
        &modules,
        &window,
        "toggle",
        "Toggle",
        "",
        &keys(&["Alt+X", "Ctrl+Y"]),
        false,
    );

    keybinds.remove_all_keybinds(&modules, &window, "toggle", false);

    assert!(keybinds.lookup("Alt+X").is_empty());
    assert!(keybinds.lookup("Ctrl+Y").is_empty());
    let shortcut = modules.window_shortcut(&window, "toggle").unwrap();
    assert!(shortcut.bound_keys().is_empty());
}

#[test]
fn remove_shortcut_cleans_every_bucket_and_the_window() {
    let (modules, keybinds) = setup(&["clock"]);
    let window = WindowLabel::main("clock");
    keybinds.add_shortcut(
        &modules,
        &window,
        "toggle",
        "Toggle",
        "",
        &keys(&["Alt+X", "Ctrl+Y"]),
        false,
    );

    keybinds.remove_shortcut(&modules, &window, "toggle", false);

    assert!(keybinds.lookup("Alt+X").is_empty());
    assert!(keybinds.lookup("Ctrl+Y").is_empty());
    assert!(modules.window_shortcut(&window, "toggle").is_none());
}

#[test]
fn change_keybind_moves_the_index_entry() {
    let (modules, keybinds) = setup(&["clock"]);
    let window = WindowLabel::main("clock");
    keybinds.add_shortcut(
        &modules,
        &window,
        "toggle",
        "Toggle",
        "",
        &keys(&["Alt+X"]),
        false,
    );

    keybinds.change_keybind(&modules, &window, "toggle", 0, "Ctrl+Q", false);

    let key = ShortcutKey::new(window.clone(), "toggle");
    assert!(!keybinds.is_indexed("Alt+X", &key));
    assert!(keybinds.is_indexed("Ctrl+Q", &key));
    let shortcut = modules.window_shortcut(&window, "toggle").unwrap();
    assert_eq!(shortcut.bound_keys(), ["Ctrl+Q"]);
}

#[test]
fn change_keybind_collapses_a_self_duplicate() {
    let (modules, keybinds) = setup(&["clock"]);
    let window = WindowLabel::main("clock");
    keybinds.add_shortcut(
        &modules,
        &window,
        "toggle",
        "Toggle",
        "",
        &keys(&["Alt+X", "Ctrl+Y"]),
        false,
    );

    keybinds.change_keybind(&modules, &window, "toggle", 0, "Ctrl+Y", false);

    let shortcut = modules.window_shortcut(&window, "toggle").unwrap();
    assert_eq!(shortcut.bound_keys(), ["Ctrl+Y"]);
    let key = ShortcutKey::new(window.clone(), "toggle");
    assert!(!keybinds.is_indexed("Alt+X", &key));
    assert!(keybinds.is_indexed("Ctrl+Y", &key));
}

#[test]
fn shortcuts_on_different_windows_share_a_key() {
    let (modules, keybinds) = setup(&["clock", "notes"]);
    let clock = WindowLabel::main("clock");
    let notes = WindowLabel::main("notes");
    keybinds.add_shortcut(&modules, &clock, "a", "A", "", &keys(&["Alt+X"]), false);
    keybinds.add_shortcut(&modules, &notes, "b", "B", "", &keys(&["Alt+X"]), false);

    assert_eq!(keybinds.lookup("Alt+X").len(), 2);

    keybinds.remove_shortcut(&modules, &clock, "a", false);
    assert_eq!(
        keybinds.lookup("Alt+X"),
        vec![ShortcutKey::new(notes, "b")]
    );
}

#[test]
fn index_stays_consistent_across_a_mixed_sequence() {
    let (modules, keybinds) = setup(&["clock"]);
    let window = WindowLabel::main("clock");
    keybinds.add_shortcut(
        &modules,
        &window,
        "toggle",
        "Toggle",
        "",
        &keys(&["Alt+X"]),
        false,
    );
    keybinds.add_keybind(&modules, &window, "toggle", "Ctrl+Y", false);
    keybinds.change_keybind(&modules, &window, "toggle", 0, "Alt+Z", false);
    keybinds.remove_keybind(&modules, &window, "toggle", 1, false);
    keybinds.add_keybind(&modules, &window, "toggle", "Alt+W", false);

    let shortcut = modules.window_shortcut(&window, "toggle").unwrap();
    assert_eq!(shortcut.bound_keys(), ["Alt+Z", "Alt+W"]);

    let key = ShortcutKey::new(window.clone(), "toggle");
    for bound in shortcut.bound_keys() {
        assert!(keybinds.is_indexed(bound, &key), "missing index for {bound}");
    }
    for gone in ["Alt+X", "Ctrl+Y"] {
        assert!(!keybinds.is_indexed(gone, &key), "stale index for {gone}");
    }
}
