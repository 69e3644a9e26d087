//! Keypress router.
//!
//! Consumes global-keypress notifications from the hotkey capture service
//! and the structural add/remove-shortcut notifications from module code,
//! and drives the keybind registry. Two states:
//!
//! - **Listening** (default): every keypress is looked up in the keybind
//!   index and a shortcut-fired message is emitted to each bound
//!   shortcut's owning window.
//! - **Suspended**: the keypress subscription is torn down so nothing
//!   fires while a user is interactively capturing a new key combination.
//!   Transitions are explicit — the caller resumes, including on cancel.
//!
//! The run loop owns the keypress subscription; suspend/resume reach it as
//! control messages so there is exactly one consumer and a resume cannot
//! replay or double-deliver anything.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::bus::{EventBus, ShellEvent, Subscription, Topic};
use crate::modules::ModuleRegistry;
use crate::platform::{WindowMessage, WindowService};
use crate::shortcuts::KeybindRegistry;

enum Control {
    Suspend,
    /// Carries the re-established subscription, created at resume time so
    /// keypresses published right after resuming are not lost.
    Resume(Subscription),
}

enum Step {
    Control(Control),
    Structural(ShellEvent),
    Key(ShellEvent),
    Idle,
    Stop,
}

pub struct KeypressRouter {
    bus: EventBus,
    modules: ModuleRegistry,
    keybinds: KeybindRegistry,
    service: Arc<dyn WindowService>,
    listening: AtomicBool,
    control_tx: async_channel::Sender<Control>,
    control_rx: async_channel::Receiver<Control>,
    initial: Mutex<Option<Subscription>>,
    add_initial: Mutex<Option<Subscription>>,
    remove_initial: Mutex<Option<Subscription>>,
}

impl KeypressRouter {
    pub fn new(
        bus: EventBus,
        modules: ModuleRegistry,
        keybinds: KeybindRegistry,
        service: Arc<dyn WindowService>,
    ) -> Self {
        let (control_tx, control_rx) = async_channel::unbounded();
        let initial = Mutex::new(Some(bus.subscribe(Topic::Keypress)));
        let add_initial = Mutex::new(Some(bus.subscribe(Topic::AddShortcut)));
        let remove_initial = Mutex::new(Some(bus.subscribe(Topic::RemoveShortcut)));
        KeypressRouter {
            bus,
            modules,
            keybinds,
            service,
            listening: AtomicBool::new(true),
            control_tx,
            control_rx,
            initial,
            add_initial,
            remove_initial,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Stop consuming keypresses while a keybind is being edited. Takes
    /// effect immediately; keypresses already in flight are dropped.
    pub fn suspend(&self) {
        if !self.listening.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.control_tx.try_send(Control::Suspend);
        debug!(
            event_type = "keypress_router",
            state = "suspended",
            "keypress routing suspended"
        );
    }

    /// Re-establish the keypress subscription. Keypresses published while
    /// suspended are not replayed.
    pub fn resume(&self) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }
        let subscription = self.bus.subscribe(Topic::Keypress);
        let _ = self.control_tx.try_send(Control::Resume(subscription));
        debug!(
            event_type = "keypress_router",
            state = "listening",
            "keypress routing resumed"
        );
    }

    /// Fire every shortcut bound to the pressed key combination.
    pub fn handle_keypress(&self, key: &str) {
        for shortcut in self.keybinds.lookup(key) {
            debug!(
                event_type = "shortcut_fired",
                key = key,
                shortcut = %shortcut,
                "shortcut fired"
            );
            self.service.emit(
                &shortcut.window,
                WindowMessage::ShortcutFired {
                    id: shortcut.id.clone(),
                },
            );
        }
    }

    /// Translate a structural notification into keybind registry calls.
    /// The owning module is carried by the structured source label.
    pub fn handle_structural(&self, event: ShellEvent) {
        match event {
            ShellEvent::AddShortcut { source, request } => {
                self.keybinds.add_shortcut(
                    &self.modules,
                    &source,
                    &request.id,
                    &request.name,
                    &request.description,
                    &request.default_keybinds,
                    false,
                );
            }
            ShellEvent::RemoveShortcut { source, id } => {
                self.keybinds
                    .remove_shortcut(&self.modules, &source, &id, false);
            }
            _ => {}
        }
    }

    pub async fn run(self: Arc<Self>) {
        let add_sub = self
            .add_initial
            .lock()
            .take()
            .unwrap_or_else(|| self.bus.subscribe(Topic::AddShortcut));
        let remove_sub = self
            .remove_initial
            .lock()
            .take()
            .unwrap_or_else(|| self.bus.subscribe(Topic::RemoveShortcut));
        let mut keypress = self.initial.lock().take();

        loop {
            // Biased polling: control transitions and structural changes
            // land before any pending keypress is routed.
            let step = match &keypress {
                Some(subscription) => {
                    tokio::select! {
                        biased;
                        control = self.control_rx.recv() => match control {
                            Ok(control) => Step::Control(control),
                            Err(_) => Step::Stop,
                        },
                        event = add_sub.recv() => match event {
                            Some(event) => Step::Structural(event),
                            None => Step::Stop,
                        },
                        event = remove_sub.recv() => match event {
                            Some(event) => Step::Structural(event),
                            None => Step::Stop,
                        },
                        event = subscription.recv() => match event {
                            Some(event) => Step::Key(event),
                            None => Step::Idle,
                        },
                    }
                }
                None => {
                    tokio::select! {
                        biased;
                        control = self.control_rx.recv() => match control {
                            Ok(control) => Step::Control(control),
                            Err(_) => Step::Stop,
                        },
                        event = add_sub.recv() => match event {
                            Some(event) => Step::Structural(event),
                            None => Step::Stop,
                        },
                        event = remove_sub.recv() => match event {
                            Some(event) => Step::Structural(event),
                            None => Step::Stop,
                        },
                    }
                }
            };

            match step {
                Step::Control(Control::Suspend) => keypress = None,
                Step::Control(Control::Resume(subscription)) => keypress = Some(subscription),
                Step::Structural(event) => self.handle_structural(event),
                Step::Key(ShellEvent::Keypress { key }) => {
                    if self.is_listening() {
                        self.handle_keypress(&key);
                    }
                }
                Step::Key(_) | Step::Idle => {}
                Step::Stop => break,
            }
        }
    }
}
