//! Global event bus.
//!
//! All command and notification traffic between module UI code, the window
//! runtime, the hotkey capture service and the core flows through here as
//! typed [`ShellEvent`]s. Subscriptions are per topic; every subscriber of
//! a topic receives every event published to it, and dropping the
//! [`Subscription`] tears the subscription down (closed endpoints are
//! pruned lazily on the next publish).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::label::WindowLabel;
use crate::platform::{LaunchParams, WindowLifecycleEvent};

/// Topics events are published under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    MainWindow,
    SubwindowOpen,
    Subwindow,
    AddShortcut,
    RemoveShortcut,
    Keypress,
    WindowLifecycle,
}

/// Show/hide/close commands addressed at a window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowAction {
    Show,
    Hide,
    Close,
}

/// Optional creation settings carried by a subwindow-open request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WindowSettings {
    pub visible: Option<bool>,
    pub transparent: Option<bool>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub height: Option<f64>,
    pub width: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct SubwindowOpenRequest {
    pub component: String,
    pub title: Option<String>,
    pub params: LaunchParams,
    pub settings: WindowSettings,
}

#[derive(Clone, Debug)]
pub struct AddShortcutRequest {
    pub id: String,
    pub name: String,
    pub description: String,
    pub default_keybinds: Vec<String>,
}

/// Every event that can cross the bus. `source` is always the label of the
/// window whose module code published the event.
#[derive(Clone, Debug)]
pub enum ShellEvent {
    MainWindow {
        source: WindowLabel,
        action: WindowAction,
    },
    SubwindowOpen {
        source: WindowLabel,
        request: SubwindowOpenRequest,
    },
    Subwindow {
        source: WindowLabel,
        target: WindowLabel,
        action: WindowAction,
    },
    AddShortcut {
        source: WindowLabel,
        request: AddShortcutRequest,
    },
    RemoveShortcut {
        source: WindowLabel,
        id: String,
    },
    Keypress {
        key: String,
    },
    WindowLifecycle {
        label: WindowLabel,
        event: WindowLifecycleEvent,
    },
}

impl ShellEvent {
    pub fn topic(&self) -> Topic {
        match self {
            ShellEvent::MainWindow { .. } => Topic::MainWindow,
            ShellEvent::SubwindowOpen { .. } => Topic::SubwindowOpen,
            ShellEvent::Subwindow { .. } => Topic::Subwindow,
            ShellEvent::AddShortcut { .. } => Topic::AddShortcut,
            ShellEvent::RemoveShortcut { .. } => Topic::RemoveShortcut,
            ShellEvent::Keypress { .. } => Topic::Keypress,
            ShellEvent::WindowLifecycle { .. } => Topic::WindowLifecycle,
        }
    }
}

#[derive(Default)]
struct BusState {
    topics: HashMap<Topic, Vec<async_channel::Sender<ShellEvent>>>,
}

/// Cheap-to-clone handle to the process-wide bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusState>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, topic: Topic) -> Subscription {
        let (tx, rx) = async_channel::unbounded();
        self.inner.lock().topics.entry(topic).or_default().push(tx);
        Subscription { rx }
    }

    pub fn publish(&self, event: ShellEvent) {
        let topic = event.topic();
        let mut state = self.inner.lock();
        if let Some(senders) = state.topics.get_mut(&topic) {
            senders.retain(|tx| tx.try_send(event.clone()).is_ok());
        }
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.inner
            .lock()
            .topics
            .get(&topic)
            .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
    }
}

/// One topic subscription. Dropping it unsubscribes.
pub struct Subscription {
    rx: async_channel::Receiver<ShellEvent>,
}

impl Subscription {
    pub async fn recv(&self) -> Option<ShellEvent> {
        self.rx.recv().await.ok()
    }

    pub fn try_recv(&self) -> Option<ShellEvent> {
        self.rx.try_recv().ok()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Clone of the underlying receiver, for select loops that must not
    /// hold a lock across an await.
    pub(crate) fn receiver(&self) -> async_channel::Receiver<ShellEvent> {
        self.rx.clone()
    }
}
