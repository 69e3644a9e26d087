//! Process-wide shell configuration.
//!
//! The config is a small key-value blob persisted through the profile
//! store. The only key the core itself reads is the active profile name;
//! anything else round-trips untouched so older or newer builds can share
//! the same file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShellError};

/// Default geometry for a window created without saved state.
pub const DEFAULT_WINDOW_X: f64 = 0.0;
pub const DEFAULT_WINDOW_Y: f64 = 0.0;
pub const DEFAULT_WINDOW_HEIGHT: f64 = 300.0;
pub const DEFAULT_WINDOW_WIDTH: f64 = 500.0;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellConfig {
    #[serde(default, rename = "activeProfile")]
    pub active_profile: String,
    /// Unknown keys are preserved verbatim across load/save cycles.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl ShellConfig {
    /// Parse a persisted config blob. `None` means the blob was malformed
    /// and the caller should fall back to the default and re-save it.
    pub fn from_json(blob: &str) -> Option<Self> {
        serde_json::from_str(blob).ok()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(ShellError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_active_profile() {
        assert_eq!(ShellConfig::default().active_profile, "");
    }

    #[test]
    fn unknown_keys_round_trip() {
        let blob = r#"{ "activeProfile": "work", "theme": "dark" }"#;
        let config = ShellConfig::from_json(blob).unwrap();
        assert_eq!(config.active_profile, "work");
        assert_eq!(config.extra.get("theme").map(String::as_str), Some("dark"));

        let reparsed = ShellConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn malformed_blob_yields_none() {
        assert!(ShellConfig::from_json("not json").is_none());
    }
}
