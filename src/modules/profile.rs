//! Profile snapshot types.
//!
//! A profile is a named snapshot of every active module: the main window
//! and each subwindow with title, visibility, transparency, logical
//! geometry, shortcut bindings, and (for subwindows) the component name and
//! launch parameters needed to recreate them. Profiles round-trip through
//! the store as a single JSON document with a format version and save
//! timestamp.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShellError};
use crate::platform::LaunchParams;
use crate::shortcuts::ShortcutSnapshot;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    pub title: String,
    pub is_visible: bool,
    pub is_transparent: bool,
    pub x: f64,
    pub y: f64,
    pub height: f64,
    pub width: f64,
    #[serde(default)]
    pub shortcuts: Vec<ShortcutSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<LaunchParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,
}

impl WindowSnapshot {
    /// Shortcut-id -> keybinds lookup consulted when a shortcut
    /// re-registers itself after this snapshot is loaded.
    pub fn saved_keybinds(&self) -> HashMap<String, Vec<String>> {
        self.shortcuts
            .iter()
            .map(|s| (s.id.clone(), s.keybinds.clone()))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSnapshot {
    pub module_name: String,
    pub main_window: WindowSnapshot,
    #[serde(default)]
    pub subwindows: Vec<WindowSnapshot>,
}

fn default_version() -> u32 {
    1
}

fn default_saved_at() -> DateTime<Utc> {
    Utc::now()
}

/// The persisted profiles document.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilesFile {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_saved_at")]
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub profiles: BTreeMap<String, Vec<ModuleSnapshot>>,
}

impl Default for ProfilesFile {
    fn default() -> Self {
        ProfilesFile {
            version: default_version(),
            saved_at: default_saved_at(),
            profiles: BTreeMap::new(),
        }
    }
}

impl ProfilesFile {
    /// Parse a persisted blob; `None` means malformed, and the caller
    /// falls back to an empty document and re-saves it.
    pub fn from_json(blob: &str) -> Option<Self> {
        serde_json::from_str(blob).ok()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(ShellError::from)
    }
}
