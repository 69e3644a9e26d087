//! Shortcut system.
//!
//! This module provides:
//! - The [`Shortcut`] value type scoped to one window
//! - The global [`KeybindRegistry`] mapping key combinations to shortcuts
//! - Snapshot types for profile persistence
//!
//! # Architecture
//!
//! Shortcuts are owned exclusively by their window's entry in the module
//! registry; the keybind registry only holds [`crate::label::ShortcutKey`]
//! references in its derived index. Every binding mutation goes through the
//! keybind registry so the index and the per-window shortcut maps can never
//! disagree.

mod registry;
mod types;

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;

#[cfg(test)]
#[path = "registry_tests.rs"]
mod registry_tests;

pub use registry::KeybindRegistry;
pub use types::{BoundKeys, Shortcut, ShortcutSnapshot};
