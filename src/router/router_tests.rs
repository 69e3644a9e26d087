use std::sync::Arc;

use crate::bus::{
    AddShortcutRequest, EventBus, ShellEvent, SubwindowOpenRequest, WindowAction, WindowSettings,
};
use crate::label::WindowLabel;
use crate::modules::{ModuleRegistry, StartOptions};
use crate::platform::{HeadlessWindows, LaunchParams, WindowLifecycleEvent, WindowService};
use crate::router::{KeypressRouter, WindowEventRouter};
use crate::shortcuts::KeybindRegistry;
use crate::store::MemoryStore;

struct Harness {
    bus: EventBus,
    service: Arc<HeadlessWindows>,
    modules: ModuleRegistry,
    keybinds: KeybindRegistry,
    keypress: Arc<KeypressRouter>,
}

fn harness(catalog: &[&str]) -> Harness {
    let bus = EventBus::new();
    let service = Arc::new(HeadlessWindows::new(bus.clone()));
    let window_service: Arc<dyn WindowService> = service.clone();
    let modules = ModuleRegistry::new(
        Arc::clone(&window_service),
        Arc::new(MemoryStore::new()),
        catalog.iter().map(|n| n.to_string()).collect(),
    );
    let keybinds = KeybindRegistry::new();
    let keypress = Arc::new(KeypressRouter::new(
        bus.clone(),
        modules.clone(),
        keybinds.clone(),
        window_service,
    ));
    let windows = Arc::new(WindowEventRouter::new(
        bus.clone(),
        modules.clone(),
        keybinds.clone(),
    ));
    WindowEventRouter::spawn(windows);
    tokio::spawn(Arc::clone(&keypress).run());
    Harness {
        bus,
        service,
        modules,
        keybinds,
        keypress,
    }
}

async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

fn add_shortcut_event(source: WindowLabel, id: &str, default_keybinds: &[&str]) -> ShellEvent {
    ShellEvent::AddShortcut {
        source,
        request: AddShortcutRequest {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            default_keybinds: default_keybinds.iter().map(|k| k.to_string()).collect(),
        },
    }
}

#[tokio::test]
async fn keypress_fires_exactly_the_bound_shortcut() {
    let h = harness(&["FSWatch_Tester", "clock"]);
    h.modules
        .start_module("FSWatch_Tester", StartOptions::default());
    h.modules.start_module("clock", StartOptions::default());
    let watcher = WindowLabel::main("FSWatch_Tester");
    let clock = WindowLabel::main("clock");

    h.bus
        .publish(add_shortcut_event(watcher.clone(), "watch_toggle", &["Alt+W"]));
    h.bus
        .publish(add_shortcut_event(clock.clone(), "clock_toggle", &["Alt+C"]));
    settle().await;

    h.bus.publish(ShellEvent::Keypress { key: "Alt+W".into() });
    settle().await;

    assert_eq!(
        h.service.fired(),
        vec![(watcher, "watch_toggle".to_string())]
    );
}

#[tokio::test]
async fn keypress_with_no_binding_fires_nothing() {
    let h = harness(&["clock"]);
    h.modules.start_module("clock", StartOptions::default());
    h.bus.publish(ShellEvent::Keypress { key: "Alt+Q".into() });
    settle().await;
    assert!(h.service.fired().is_empty());
}

#[tokio::test]
async fn suspended_router_drops_keypresses_until_resumed() {
    let h = harness(&["clock"]);
    h.modules.start_module("clock", StartOptions::default());
    let main = WindowLabel::main("clock");
    h.bus
        .publish(add_shortcut_event(main.clone(), "toggle", &["Alt+T"]));
    settle().await;

    h.bus.publish(ShellEvent::Keypress { key: "Alt+T".into() });
    settle().await;
    assert_eq!(h.service.fired().len(), 1);

    h.keypress.suspend();
    assert!(!h.keypress.is_listening());
    h.bus.publish(ShellEvent::Keypress { key: "Alt+T".into() });
    settle().await;
    assert_eq!(h.service.fired().len(), 1, "suspended keypress must not fire");

    h.keypress.resume();
    assert!(h.keypress.is_listening());
    settle().await;
    h.bus.publish(ShellEvent::Keypress { key: "Alt+T".into() });
    settle().await;
    assert_eq!(h.service.fired().len(), 2);
}

#[tokio::test]
async fn structural_events_still_flow_while_suspended() {
    let h = harness(&["clock"]);
    h.modules.start_module("clock", StartOptions::default());
    let main = WindowLabel::main("clock");

    h.keypress.suspend();
    h.bus
        .publish(add_shortcut_event(main.clone(), "toggle", &["Alt+T"]));
    settle().await;

    assert!(h.modules.window_shortcut(&main, "toggle").is_some());
    assert!(!h.keybinds.lookup("Alt+T").is_empty());
}

#[tokio::test]
async fn remove_shortcut_event_unbinds_the_key() {
    let h = harness(&["clock"]);
    h.modules.start_module("clock", StartOptions::default());
    let main = WindowLabel::main("clock");
    h.bus
        .publish(add_shortcut_event(main.clone(), "toggle", &["Alt+T"]));
    settle().await;

    h.bus.publish(ShellEvent::RemoveShortcut {
        source: main.clone(),
        id: "toggle".into(),
    });
    settle().await;

    assert!(h.modules.window_shortcut(&main, "toggle").is_none());
    h.bus.publish(ShellEvent::Keypress { key: "Alt+T".into() });
    settle().await;
    assert!(h.service.fired().is_empty());
}

#[tokio::test]
async fn main_window_commands_drive_visibility() {
    let h = harness(&["clock"]);
    h.modules.start_module("clock", StartOptions::default());
    let main = WindowLabel::main("clock");

    h.bus.publish(ShellEvent::MainWindow {
        source: main.clone(),
        action: WindowAction::Hide,
    });
    settle().await;
    assert_eq!(h.service.is_visible(&main), Some(false));
    assert_eq!(h.modules.window_visible(&main), Some(false));

    h.bus.publish(ShellEvent::MainWindow {
        source: main.clone(),
        action: WindowAction::Show,
    });
    settle().await;
    assert_eq!(h.service.is_visible(&main), Some(true));
}

#[tokio::test]
async fn subwindow_open_and_close_commands_round_trip() {
    let h = harness(&["clock"]);
    h.modules.start_module("clock", StartOptions::default());
    let main = WindowLabel::main("clock");

    h.bus.publish(ShellEvent::SubwindowOpen {
        source: main.clone(),
        request: SubwindowOpenRequest {
            component: "face".into(),
            title: Some("Clock Face".into()),
            params: LaunchParams::from([("zone".to_string(), "UTC".into())]),
            settings: WindowSettings {
                visible: Some(false),
                ..Default::default()
            },
        },
    });
    settle().await;

    let face = WindowLabel::sub("clock", "face", 0);
    assert!(h.service.is_open(&face));
    assert_eq!(h.service.is_visible(&face), Some(false));
    assert_eq!(h.service.title(&face).as_deref(), Some("Clock Face"));

    h.bus.publish(ShellEvent::Subwindow {
        source: main.clone(),
        target: face.clone(),
        action: WindowAction::Close,
    });
    settle().await;
    assert!(!h.service.is_open(&face));
    assert!(h.modules.subwindow_labels("clock").is_empty());
}

#[tokio::test]
async fn subwindow_commands_from_another_module_are_ignored() {
    let h = harness(&["clock", "notes"]);
    h.modules.start_module("clock", StartOptions::default());
    h.modules.start_module("notes", StartOptions::default());
    let face = h
        .modules
        .open_subwindow(
            "clock",
            &SubwindowOpenRequest {
                component: "face".into(),
                title: None,
                params: LaunchParams::new(),
                settings: WindowSettings::default(),
            },
            false,
        )
        .await
        .unwrap();

    // The command's source names a different module than the target.
    h.bus.publish(ShellEvent::Subwindow {
        source: WindowLabel::main("notes"),
        target: face.clone(),
        action: WindowAction::Close,
    });
    settle().await;

    assert!(h.service.is_open(&face));
}

#[tokio::test]
async fn close_requested_on_main_window_closes_the_module() {
    let h = harness(&["clock"]);
    h.modules.start_module("clock", StartOptions::default());
    h.modules
        .open_subwindow(
            "clock",
            &SubwindowOpenRequest {
                component: "face".into(),
                title: None,
                params: LaunchParams::new(),
                settings: WindowSettings::default(),
            },
            false,
        )
        .await
        .unwrap();

    h.bus.publish(ShellEvent::WindowLifecycle {
        label: WindowLabel::main("clock"),
        event: WindowLifecycleEvent::CloseRequested,
    });
    settle().await;

    assert!(h.modules.active_modules().is_empty());
    assert_eq!(h.service.window_count(), 0);
}

#[tokio::test]
async fn close_requested_on_subwindow_closes_only_that_window() {
    let h = harness(&["clock"]);
    h.modules.start_module("clock", StartOptions::default());
    let face = h
        .modules
        .open_subwindow(
            "clock",
            &SubwindowOpenRequest {
                component: "face".into(),
                title: None,
                params: LaunchParams::new(),
                settings: WindowSettings::default(),
            },
            false,
        )
        .await
        .unwrap();

    h.bus.publish(ShellEvent::WindowLifecycle {
        label: face.clone(),
        event: WindowLifecycleEvent::CloseRequested,
    });
    settle().await;

    assert!(!h.service.is_open(&face));
    assert!(h.modules.is_active("clock"));
    assert_eq!(h.service.window_count(), 1);
}
