//! Global keybind registry.
//!
//! Single source of truth for which shortcuts are bound to which literal
//! key-combination string, across every active module. The registry owns a
//! derived index (key string -> shortcut keys) and mediates every binding
//! mutation against the per-module shortcut maps so the index never drifts:
//! a shortcut appears in the bucket of every key it is bound to and only
//! those, and no bucket outlives its shortcut.
//!
//! Buckets use Vec storage for deterministic iteration order.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::label::{ShortcutKey, WindowLabel};
use crate::modules::ModuleRegistry;
use crate::observer::{SubscriptionId, Subscribers};
use crate::shortcuts::Shortcut;

#[derive(Default)]
struct KeybindIndex {
    buckets: HashMap<String, Vec<ShortcutKey>>,
}

impl KeybindIndex {
    fn insert(&mut self, key: &str, shortcut: &ShortcutKey) {
        let bucket = self.buckets.entry(key.to_string()).or_default();
        if !bucket.contains(shortcut) {
            bucket.push(shortcut.clone());
        }
    }

    fn remove(&mut self, key: &str, shortcut: &ShortcutKey) {
        if let Some(bucket) = self.buckets.get_mut(key) {
            bucket.retain(|entry| entry != shortcut);
            if bucket.is_empty() {
                self.buckets.remove(key);
            }
        }
    }

    fn lookup(&self, key: &str) -> Vec<ShortcutKey> {
        self.buckets.get(key).cloned().unwrap_or_default()
    }

    fn contains(&self, key: &str, shortcut: &ShortcutKey) -> bool {
        self.buckets
            .get(key)
            .is_some_and(|bucket| bucket.contains(shortcut))
    }
}

/// Keybind registry service handle.
#[derive(Clone, Default)]
pub struct KeybindRegistry {
    index: Arc<Mutex<KeybindIndex>>,
    subscribers: Subscribers,
}

impl KeybindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.unsubscribe(id);
    }

    /// Register a shortcut on a window and index its bindings. Input keys
    /// are de-duplicated before indexing. A rejected registration (unknown
    /// window, duplicate id) leaves the index untouched.
    #[allow(clippy::too_many_arguments)]
    pub fn add_shortcut(
        &self,
        modules: &ModuleRegistry,
        window: &WindowLabel,
        id: &str,
        name: &str,
        description: &str,
        default_keybinds: &[String],
        skip_notify: bool,
    ) {
        let Some(shortcut) = modules.add_shortcut(window, id, name, description, default_keybinds)
        else {
            return;
        };

        {
            let mut index = self.index.lock();
            let mut seen: Vec<&str> = Vec::new();
            for key in shortcut.bound_keys() {
                if seen.contains(&key.as_str()) {
                    continue;
                }
                seen.push(key.as_str());
                index.insert(key, shortcut.key());
            }
        }

        if !skip_notify {
            self.subscribers.notify();
        }
    }

    /// Drop a shortcut's index entries, then remove it from its window.
    pub fn remove_shortcut(
        &self,
        modules: &ModuleRegistry,
        window: &WindowLabel,
        id: &str,
        skip_notify: bool,
    ) {
        if let Some(shortcut) = modules.window_shortcut(window, id) {
            let mut index = self.index.lock();
            for key in shortcut.bound_keys() {
                index.remove(key, shortcut.key());
            }
        }
        modules.remove_shortcut(window, id, true);

        if !skip_notify {
            self.subscribers.notify();
        }
    }

    /// Index cleanup for a shortcut whose window is being torn down.
    pub(crate) fn unindex_shortcut(&self, shortcut: &Shortcut) {
        let mut index = self.index.lock();
        for key in shortcut.bound_keys() {
            index.remove(key, shortcut.key());
        }
    }

    /// Bind an additional key; a key already bound to this shortcut is
    /// rejected as a no-op.
    pub fn add_keybind(
        &self,
        modules: &ModuleRegistry,
        window: &WindowLabel,
        id: &str,
        keybind: &str,
        skip_notify: bool,
    ) {
        let Some(shortcut) = modules.window_shortcut(window, id) else {
            return;
        };
        if shortcut.is_bound_to(keybind) {
            return;
        }

        let Some(shortcut) = modules.add_keybind(window, id, keybind, true) else {
            return;
        };
        self.index.lock().insert(keybind, shortcut.key());

        if !skip_notify {
            self.subscribers.notify();
        }
    }

    /// Unbind the key at an ordinal position.
    pub fn remove_keybind(
        &self,
        modules: &ModuleRegistry,
        window: &WindowLabel,
        id: &str,
        position: usize,
        skip_notify: bool,
    ) {
        let Some(removed) = modules.remove_keybind(window, id, position, true) else {
            return;
        };
        let shortcut = ShortcutKey::new(window.clone(), id);
        self.index.lock().remove(&removed, &shortcut);

        if !skip_notify {
            self.subscribers.notify();
        }
    }

    /// Unbind every key of a shortcut without destroying it.
    pub fn remove_all_keybinds(
        &self,
        modules: &ModuleRegistry,
        window: &WindowLabel,
        id: &str,
        skip_notify: bool,
    ) {
        let Some(shortcut) = modules.window_shortcut(window, id) else {
            return;
        };
        {
            let mut index = self.index.lock();
            for key in shortcut.bound_keys() {
                index.remove(key, shortcut.key());
            }
        }
        modules.clear_keybinds(window, id, true);

        if !skip_notify {
            self.subscribers.notify();
        }
    }

    /// Replace the key at an ordinal position. A replacement that
    /// duplicates another of the shortcut's own bindings collapses inside
    /// the shortcut; re-indexing the surviving key is idempotent.
    #[allow(clippy::too_many_arguments)]
    pub fn change_keybind(
        &self,
        modules: &ModuleRegistry,
        window: &WindowLabel,
        id: &str,
        position: usize,
        keybind: &str,
        skip_notify: bool,
    ) {
        let Some(replaced) = modules.rebind_keybind(window, id, position, keybind, true) else {
            return;
        };
        let shortcut = ShortcutKey::new(window.clone(), id);
        {
            let mut index = self.index.lock();
            index.remove(&replaced, &shortcut);
            index.insert(keybind, &shortcut);
        }

        if !skip_notify {
            self.subscribers.notify();
        }
    }

    /// Shortcut keys currently bound to a key combination.
    pub fn lookup(&self, key: &str) -> Vec<ShortcutKey> {
        self.index.lock().lookup(key)
    }

    pub fn is_indexed(&self, key: &str, shortcut: &ShortcutKey) -> bool {
        self.index.lock().contains(key, shortcut)
    }

    /// Full index snapshot, sorted by key for stable display.
    pub fn keybinds(&self) -> BTreeMap<String, Vec<ShortcutKey>> {
        self.index
            .lock()
            .buckets
            .iter()
            .map(|(key, bucket)| (key.clone(), bucket.clone()))
            .collect()
    }
}
