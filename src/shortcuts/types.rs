//! Core shortcut value type.
//!
//! A [`Shortcut`] is one named, described action scoped to a single window,
//! bound to an ordered list of key-combination strings. Key combinations
//! are opaque literals (e.g. `"Alt+X"`); the core matches them exactly and
//! never parses them. Duplicate-binding prevention across shortcuts lives
//! in the keybind registry, not here — the one rule the value type itself
//! owns is the rebind collapse: replacing a binding with a key the shortcut
//! already holds elsewhere removes the replaced position instead of
//! producing a duplicate.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::label::{ShortcutKey, WindowLabel};

/// Most shortcuts carry one or two bindings.
pub type BoundKeys = SmallVec<[String; 2]>;

#[derive(Clone, Debug, PartialEq)]
pub struct Shortcut {
    key: ShortcutKey,
    name: String,
    description: String,
    bound_keys: BoundKeys,
}

impl Shortcut {
    pub fn new(
        key: ShortcutKey,
        name: impl Into<String>,
        description: impl Into<String>,
        bound_keys: impl IntoIterator<Item = String>,
    ) -> Self {
        Shortcut {
            key,
            name: name.into(),
            description: description.into(),
            bound_keys: bound_keys.into_iter().collect(),
        }
    }

    pub fn key(&self) -> &ShortcutKey {
        &self.key
    }

    /// Window-local shortcut id.
    pub fn id(&self) -> &str {
        &self.key.id
    }

    pub fn window(&self) -> &WindowLabel {
        &self.key.window
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn bound_keys(&self) -> &[String] {
        &self.bound_keys
    }

    pub fn is_bound_to(&self, key: &str) -> bool {
        self.bound_keys.iter().any(|k| k == key)
    }

    /// Append a key. Callers check for duplicates first; the keybind
    /// registry is the only mutation path that enforces that.
    pub fn bind_key(&mut self, key: impl Into<String>) {
        self.bound_keys.push(key.into());
    }

    /// Remove and return the key at `position`; `None` when out of range.
    /// UI-driven races (double-click remove) make out-of-range ordinary.
    pub fn unbind_at(&mut self, position: usize) -> Option<String> {
        if position >= self.bound_keys.len() {
            return None;
        }
        Some(self.bound_keys.remove(position))
    }

    /// Replace the key at `position`, returning the old key. When the new
    /// key already occurs at another position of this shortcut, the
    /// replaced position is removed instead of duplicating the binding.
    pub fn rebind_at(&mut self, position: usize, new_key: impl Into<String>) -> Option<String> {
        if position >= self.bound_keys.len() {
            return None;
        }
        let new_key = new_key.into();
        let duplicate = self
            .bound_keys
            .iter()
            .enumerate()
            .any(|(i, k)| i != position && *k == new_key);
        if duplicate {
            return Some(self.bound_keys.remove(position));
        }
        Some(std::mem::replace(&mut self.bound_keys[position], new_key))
    }

    /// Clear every binding without destroying the shortcut.
    pub fn unbind_all(&mut self) {
        self.bound_keys.clear();
    }

    pub fn snapshot(&self) -> ShortcutSnapshot {
        ShortcutSnapshot {
            id: self.key.id.clone(),
            keybinds: self.bound_keys.to_vec(),
        }
    }
}

/// Persisted form of a shortcut: the window-local id plus its bindings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutSnapshot {
    pub id: String,
    pub keybinds: Vec<String>,
}
