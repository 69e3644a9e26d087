//! Structured window and shortcut identities.
//!
//! Every window in the shell is addressed by a [`WindowLabel`] and every
//! shortcut by a [`ShortcutKey`]. The `module/<name>[/<component>/<seq>]`
//! string form exists only at the wire boundary (event payloads, window
//! service labels); inside the core the structured values are carried
//! end-to-end so nothing ever has to parse a path back out of a string.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

const LABEL_PREFIX: &str = "module";

/// Identity of one native window: either a module's main window or one of
/// its subwindows. Subwindows carry the component name plus a per-component
/// sequence id, so "ReadTester" opened three times yields seq 0, 1, 2.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WindowLabel {
    Main {
        module: String,
    },
    Sub {
        module: String,
        component: String,
        seq: u32,
    },
}

impl WindowLabel {
    pub fn main(module: impl Into<String>) -> Self {
        WindowLabel::Main {
            module: module.into(),
        }
    }

    pub fn sub(module: impl Into<String>, component: impl Into<String>, seq: u32) -> Self {
        WindowLabel::Sub {
            module: module.into(),
            component: component.into(),
            seq,
        }
    }

    /// Name of the module this window belongs to.
    pub fn module(&self) -> &str {
        match self {
            WindowLabel::Main { module } => module,
            WindowLabel::Sub { module, .. } => module,
        }
    }

    pub fn is_main(&self) -> bool {
        matches!(self, WindowLabel::Main { .. })
    }

    /// Component name for subwindows, `None` for main windows.
    pub fn component(&self) -> Option<&str> {
        match self {
            WindowLabel::Main { .. } => None,
            WindowLabel::Sub { component, .. } => Some(component),
        }
    }
}

impl fmt::Display for WindowLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowLabel::Main { module } => write!(f, "{}/{}", LABEL_PREFIX, module),
            WindowLabel::Sub {
                module,
                component,
                seq,
            } => write!(f, "{}/{}/{}/{}", LABEL_PREFIX, module, component, seq),
        }
    }
}

/// Errors produced when parsing a wire-format window label.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelParseError {
    #[error("label '{0}' does not start with the 'module/' prefix")]
    MissingPrefix(String),
    #[error("label '{0}' does not have a module/name or module/name/component/seq shape")]
    Malformed(String),
    #[error("label '{0}' has a non-numeric sequence id")]
    BadSequence(String),
}

impl FromStr for WindowLabel {
    type Err = LabelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.first() != Some(&LABEL_PREFIX) {
            return Err(LabelParseError::MissingPrefix(s.to_string()));
        }
        match parts.as_slice() {
            [_, module] if !module.is_empty() => Ok(WindowLabel::main(*module)),
            [_, module, component, seq] if !module.is_empty() && !component.is_empty() => {
                let seq = seq
                    .parse::<u32>()
                    .map_err(|_| LabelParseError::BadSequence(s.to_string()))?;
                Ok(WindowLabel::sub(*module, *component, seq))
            }
            _ => Err(LabelParseError::Malformed(s.to_string())),
        }
    }
}

/// Composite identity of a shortcut: the window it belongs to plus the
/// window-local shortcut id. The owning module is implied by the label.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShortcutKey {
    pub window: WindowLabel,
    pub id: String,
}

impl ShortcutKey {
    pub fn new(window: WindowLabel, id: impl Into<String>) -> Self {
        ShortcutKey {
            window,
            id: id.into(),
        }
    }

    pub fn module(&self) -> &str {
        self.window.module()
    }
}

impl fmt::Display for ShortcutKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.window, self.id)
    }
}
