//! Window service boundary.
//!
//! The shell never talks to a native window runtime directly. Everything it
//! needs from one is captured by [`WindowService`]: create a window from a
//! spec, show/hide it, query its live title and outer geometry, and emit
//! messages to the module code running inside it. Lifecycle notifications
//! (created / close-requested / destroyed) flow back through the event bus
//! as [`crate::bus::ShellEvent::WindowLifecycle`] events.
//!
//! [`HeadlessWindows`] is the in-process implementation used by tests and
//! the demo binary: windows are plain records, creation and destruction
//! complete immediately, and emitted messages are captured for inspection.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bus::{EventBus, ShellEvent};
use crate::config::{
    DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH, DEFAULT_WINDOW_X, DEFAULT_WINDOW_Y,
};
use crate::error::{Result, ShellError};
use crate::label::WindowLabel;

/// Window geometry in logical (DPI-independent) units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub height: f64,
    pub width: f64,
}

impl Geometry {
    pub fn new(x: f64, y: f64, height: f64, width: f64) -> Self {
        Geometry {
            x,
            y,
            height,
            width,
        }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry {
            x: DEFAULT_WINDOW_X,
            y: DEFAULT_WINDOW_Y,
            height: DEFAULT_WINDOW_HEIGHT,
            width: DEFAULT_WINDOW_WIDTH,
        }
    }
}

/// A single launch parameter value passed to a subwindow component.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Number(f64),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

/// Name-value pairs handed to a subwindow component at launch.
pub type LaunchParams = BTreeMap<String, ParamValue>;

/// Everything the window service needs to create a window.
#[derive(Clone, Debug)]
pub struct WindowSpec {
    pub label: WindowLabel,
    pub title: String,
    pub visible: bool,
    pub transparent: bool,
    pub geometry: Geometry,
    pub params: LaunchParams,
}

/// Messages the core emits to the module code hosted in a window.
#[derive(Clone, Debug, PartialEq)]
pub enum WindowMessage {
    /// Ask the window to tear itself down; the runtime reports back with a
    /// destroyed lifecycle notification once it is gone.
    Close,
    /// A shortcut registered by this window was triggered.
    ShortcutFired { id: String },
}

/// Lifecycle notifications reported by the window runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowLifecycleEvent {
    Created,
    CloseRequested,
    Destroyed,
}

/// Narrow interface over the native window runtime.
pub trait WindowService: Send + Sync {
    fn create_window(&self, spec: &WindowSpec) -> Result<()>;
    fn show(&self, label: &WindowLabel);
    fn hide(&self, label: &WindowLabel);
    fn title(&self, label: &WindowLabel) -> Option<String>;
    fn is_visible(&self, label: &WindowLabel) -> Option<bool>;
    /// Outer position in physical pixels.
    fn outer_position(&self, label: &WindowLabel) -> Option<(f64, f64)>;
    /// Outer size in physical pixels.
    fn outer_size(&self, label: &WindowLabel) -> Option<(f64, f64)>;
    fn scale_factor(&self) -> f64;
    fn emit(&self, label: &WindowLabel, message: WindowMessage);
}

struct HeadlessWindow {
    title: String,
    visible: bool,
    geometry: Geometry,
}

#[derive(Default)]
struct HeadlessState {
    windows: BTreeMap<WindowLabel, HeadlessWindow>,
    created_count: usize,
    fired: Vec<(WindowLabel, String)>,
}

/// In-process window runtime: windows exist only as records, lifecycle
/// notifications are published synchronously, and messages emitted to a
/// window are captured so callers can assert on them.
pub struct HeadlessWindows {
    bus: EventBus,
    scale_factor: f64,
    state: Mutex<HeadlessState>,
}

impl HeadlessWindows {
    pub fn new(bus: EventBus) -> Self {
        Self::with_scale_factor(bus, 1.0)
    }

    pub fn with_scale_factor(bus: EventBus, scale_factor: f64) -> Self {
        HeadlessWindows {
            bus,
            scale_factor,
            state: Mutex::new(HeadlessState::default()),
        }
    }

    pub fn is_open(&self, label: &WindowLabel) -> bool {
        self.state.lock().windows.contains_key(label)
    }

    pub fn window_count(&self) -> usize {
        self.state.lock().windows.len()
    }

    /// Total number of windows ever created, including since-closed ones.
    pub fn created_count(&self) -> usize {
        self.state.lock().created_count
    }

    /// Shortcut-fired messages captured so far, in emission order.
    pub fn fired(&self) -> Vec<(WindowLabel, String)> {
        self.state.lock().fired.clone()
    }

    /// Reposition/resize a window, as a user dragging it would.
    pub fn move_window(&self, label: &WindowLabel, geometry: Geometry) {
        if let Some(window) = self.state.lock().windows.get_mut(label) {
            window.geometry = geometry;
        }
    }
}

impl WindowService for HeadlessWindows {
    fn create_window(&self, spec: &WindowSpec) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.windows.contains_key(&spec.label) {
                return Err(ShellError::Window(format!(
                    "window '{}' already exists",
                    spec.label
                )));
            }
            state.windows.insert(
                spec.label.clone(),
                HeadlessWindow {
                    title: spec.title.clone(),
                    visible: spec.visible,
                    geometry: spec.geometry,
                },
            );
            state.created_count += 1;
        }
        debug!(label = %spec.label, "headless window created");
        self.bus.publish(ShellEvent::WindowLifecycle {
            label: spec.label.clone(),
            event: WindowLifecycleEvent::Created,
        });
        Ok(())
    }

    fn show(&self, label: &WindowLabel) {
        if let Some(window) = self.state.lock().windows.get_mut(label) {
            window.visible = true;
        }
    }

    fn hide(&self, label: &WindowLabel) {
        if let Some(window) = self.state.lock().windows.get_mut(label) {
            window.visible = false;
        }
    }

    fn title(&self, label: &WindowLabel) -> Option<String> {
        self.state.lock().windows.get(label).map(|w| w.title.clone())
    }

    fn is_visible(&self, label: &WindowLabel) -> Option<bool> {
        self.state.lock().windows.get(label).map(|w| w.visible)
    }

    fn outer_position(&self, label: &WindowLabel) -> Option<(f64, f64)> {
        self.state.lock().windows.get(label).map(|w| {
            (
                w.geometry.x * self.scale_factor,
                w.geometry.y * self.scale_factor,
            )
        })
    }

    fn outer_size(&self, label: &WindowLabel) -> Option<(f64, f64)> {
        self.state.lock().windows.get(label).map(|w| {
            (
                w.geometry.width * self.scale_factor,
                w.geometry.height * self.scale_factor,
            )
        })
    }

    fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    fn emit(&self, label: &WindowLabel, message: WindowMessage) {
        match message {
            WindowMessage::Close => {
                let existed = self.state.lock().windows.remove(label).is_some();
                if existed {
                    debug!(label = %label, "headless window destroyed");
                    self.bus.publish(ShellEvent::WindowLifecycle {
                        label: label.clone(),
                        event: WindowLifecycleEvent::Destroyed,
                    });
                }
            }
            WindowMessage::ShortcutFired { id } => {
                self.state.lock().fired.push((label.clone(), id));
            }
        }
    }
}
