//! Module registry: the catalog of known modules, the set of running
//! instances, and profile/config persistence.
//!
//! All module state lives behind a single mutex; no lock is ever held
//! across an await point. The async operations (closing, profile loading)
//! snapshot what they need under the lock, release it, drive the window
//! service, and then await the relevant lifecycle signals — so a module is
//! only reported inactive after every one of its windows has confirmed
//! destruction, and a loaded profile only shows windows once all of them
//! exist.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{error, info};

use crate::bus::SubwindowOpenRequest;
use crate::config::ShellConfig;
use crate::error::ResultExt;
use crate::label::WindowLabel;
use crate::lifecycle::LifecycleSignal;
use crate::modules::module::OverlayModule;
use crate::modules::profile::{ModuleSnapshot, ProfilesFile};
use crate::modules::window::WindowResolvers;
use crate::observer::{SubscriptionId, Subscribers};
use crate::platform::{Geometry, WindowLifecycleEvent, WindowMessage, WindowService};
use crate::shortcuts::{KeybindRegistry, Shortcut, ShortcutSnapshot};
use crate::store::{ProfileStore, StoreReceipt};

/// Options for [`ModuleRegistry::start_module`].
pub struct StartOptions {
    pub title: Option<String>,
    pub visible: bool,
    pub geometry: Geometry,
    pub saved_shortcuts: Vec<ShortcutSnapshot>,
    pub skip_notify: bool,
}

impl Default for StartOptions {
    fn default() -> Self {
        StartOptions {
            title: None,
            visible: true,
            geometry: Geometry::default(),
            saved_shortcuts: Vec::new(),
            skip_notify: false,
        }
    }
}

struct RegistryState {
    all_modules: Vec<String>,
    active: BTreeMap<String, OverlayModule>,
    profiles: BTreeMap<String, Vec<ModuleSnapshot>>,
    config: ShellConfig,
    /// Resolver halves for every window whose destruction has not been
    /// confirmed yet. Entries outlive their window's module map entry.
    lifecycle: HashMap<WindowLabel, WindowResolvers>,
}

/// Module registry service handle.
#[derive(Clone)]
pub struct ModuleRegistry {
    state: Arc<Mutex<RegistryState>>,
    service: Arc<dyn WindowService>,
    store: Arc<dyn ProfileStore>,
    subscribers: Subscribers,
}

impl ModuleRegistry {
    pub fn new(
        service: Arc<dyn WindowService>,
        store: Arc<dyn ProfileStore>,
        all_modules: Vec<String>,
    ) -> Self {
        ModuleRegistry {
            state: Arc::new(Mutex::new(RegistryState {
                all_modules,
                active: BTreeMap::new(),
                profiles: BTreeMap::new(),
                config: ShellConfig::default(),
                lifecycle: HashMap::new(),
            })),
            service,
            store,
            subscribers: Subscribers::new(),
        }
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.unsubscribe(id);
    }

    /// Subscribe to one module's change notifications; `None` when the
    /// module is not active.
    pub fn subscribe_module(
        &self,
        name: &str,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Option<SubscriptionId> {
        let subscribers = {
            let state = self.state.lock();
            state.active.get(name).map(|m| m.subscribers().clone())
        };
        subscribers.map(|subs| subs.subscribe(callback))
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    pub fn all_modules(&self) -> Vec<String> {
        self.state.lock().all_modules.clone()
    }

    pub fn set_all_modules(&self, modules: Vec<String>) {
        self.state.lock().all_modules = modules;
        self.subscribers.notify();
    }

    pub fn active_modules(&self) -> Vec<String> {
        self.state.lock().active.keys().cloned().collect()
    }

    pub fn inactive_modules(&self) -> Vec<String> {
        let state = self.state.lock();
        state
            .all_modules
            .iter()
            .filter(|name| !state.active.contains_key(*name))
            .cloned()
            .collect()
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.state.lock().active.contains_key(name)
    }

    pub fn has_shortcuts(&self, name: &str) -> bool {
        self.state
            .lock()
            .active
            .get(name)
            .is_some_and(OverlayModule::has_shortcuts)
    }

    /// Visibility flag of a tracked window; `None` for unknown labels.
    pub fn window_visible(&self, label: &WindowLabel) -> Option<bool> {
        let state = self.state.lock();
        state
            .active
            .get(label.module())
            .and_then(|m| m.window(label))
            .map(|w| w.visible)
    }

    pub fn subwindow_labels(&self, name: &str) -> Vec<WindowLabel> {
        self.state
            .lock()
            .active
            .get(name)
            .map(OverlayModule::subwindow_labels)
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Module lifecycle
    // ------------------------------------------------------------------

    /// Start a module. Idempotent: a module that is already active is left
    /// untouched and no second main window is opened.
    pub fn start_module(&self, name: &str, options: StartOptions) -> bool {
        {
            let mut state = self.state.lock();
            if state.active.contains_key(name) {
                return false;
            }
            let title = options.title.clone().unwrap_or_else(|| name.to_string());
            let (module, label, resolvers) = OverlayModule::open_main(
                name,
                &title,
                options.visible,
                options.geometry,
                &options.saved_shortcuts,
                self.service.as_ref(),
            );
            state.lifecycle.insert(label, resolvers);
            state.active.insert(name.to_string(), module);
        }
        info!(event_type = "module", module = name, "module started");

        if !options.skip_notify {
            self.subscribers.notify();
        }
        true
    }

    /// Close a module: every subwindow first, then the main window, then —
    /// only after every destroyed signal has resolved — drop it from the
    /// active set. Unknown names are a no-op.
    pub async fn close_module(&self, keybinds: &KeybindRegistry, name: &str, skip_notify: bool) {
        let plan = {
            let mut state = self.state.lock();
            state
                .active
                .get_mut(name)
                .map(|m| (m.begin_close(), m.subscribers().clone()))
        };
        let Some((close, module_subscribers)) = plan else {
            return;
        };

        let mut pending: Vec<LifecycleSignal> = Vec::new();
        for subwindow in &close.subwindows {
            for shortcut in &subwindow.shortcuts {
                keybinds.unindex_shortcut(shortcut);
            }
            pending.push(subwindow.destroyed.clone());
            self.service.emit(&subwindow.label, WindowMessage::Close);
        }
        for shortcut in &close.main_shortcuts {
            keybinds.unindex_shortcut(shortcut);
        }
        pending.push(close.main_destroyed.clone());
        self.service.emit(&close.main_label, WindowMessage::Close);

        for signal in pending {
            signal.wait().await;
        }

        self.state.lock().active.remove(name);
        info!(event_type = "module", module = name, "module closed");
        self.subscribers.notify();

        if !skip_notify {
            module_subscribers.notify();
        }
    }

    /// Close every active module and wait for all of their windows to
    /// confirm destruction.
    pub async fn close_all_modules(&self, keybinds: &KeybindRegistry, skip_notify: bool) {
        let names: Vec<String> = self.state.lock().active.keys().cloned().collect();
        for name in names {
            self.close_module(keybinds, &name, true).await;
        }
        if !skip_notify {
            self.subscribers.notify();
        }
    }

    /// Resolve lifecycle signals from window-service notifications.
    pub fn handle_window_lifecycle(&self, label: &WindowLabel, event: WindowLifecycleEvent) {
        match event {
            WindowLifecycleEvent::Created => {
                let state = self.state.lock();
                if let Some(resolvers) = state.lifecycle.get(label) {
                    resolvers.created.resolve();
                }
            }
            WindowLifecycleEvent::Destroyed => {
                let module_subscribers = {
                    let mut state = self.state.lock();
                    if let Some(resolvers) = state.lifecycle.remove(label) {
                        resolvers.destroyed.resolve();
                    }
                    if label.is_main() {
                        None
                    } else {
                        state
                            .active
                            .get(label.module())
                            .map(|m| m.subscribers().clone())
                    }
                };
                if let Some(subscribers) = module_subscribers {
                    subscribers.notify();
                }
            }
            WindowLifecycleEvent::CloseRequested => {}
        }
    }

    // ------------------------------------------------------------------
    // Windows
    // ------------------------------------------------------------------

    pub fn show_main_window(&self, module: &str, skip_notify: bool) {
        self.set_main_visibility(module, true, skip_notify);
    }

    pub fn hide_main_window(&self, module: &str, skip_notify: bool) {
        self.set_main_visibility(module, false, skip_notify);
    }

    fn set_main_visibility(&self, module: &str, visible: bool, skip_notify: bool) {
        let found = {
            let mut state = self.state.lock();
            state.active.get_mut(module).map(|m| {
                m.set_main_visible(visible);
                (m.main_label(), m.subscribers().clone())
            })
        };
        let Some((label, subscribers)) = found else {
            return;
        };
        if visible {
            self.service.show(&label);
        } else {
            self.service.hide(&label);
        }
        if !skip_notify {
            subscribers.notify();
        }
    }

    pub fn show_subwindow(&self, module: &str, label: &WindowLabel, skip_notify: bool) {
        self.set_subwindow_visibility(module, label, true, skip_notify);
    }

    pub fn hide_subwindow(&self, module: &str, label: &WindowLabel, skip_notify: bool) {
        self.set_subwindow_visibility(module, label, false, skip_notify);
    }

    fn set_subwindow_visibility(
        &self,
        module: &str,
        label: &WindowLabel,
        visible: bool,
        skip_notify: bool,
    ) {
        let subscribers = {
            let mut state = self.state.lock();
            state.active.get_mut(module).and_then(|m| {
                m.set_subwindow_visible(label, visible)
                    .then(|| m.subscribers().clone())
            })
        };
        let Some(subscribers) = subscribers else {
            return;
        };
        if visible {
            self.service.show(label);
        } else {
            self.service.hide(label);
        }
        if !skip_notify {
            subscribers.notify();
        }
    }

    /// Open a subwindow and register its lifecycle signals, without
    /// waiting for the window to exist. Profile loading uses this to fan
    /// out many creations before a single barrier.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn begin_open_subwindow(
        &self,
        module: &str,
        component: &str,
        title: Option<&str>,
        params: crate::platform::LaunchParams,
        visible: bool,
        transparent: bool,
        geometry: Geometry,
        saved_keybinds: HashMap<String, Vec<String>>,
    ) -> Option<(WindowLabel, LifecycleSignal, Subscribers)> {
        let mut state = self.state.lock();
        let module = state.active.get_mut(module)?;
        let (label, created, resolvers) = module.open_subwindow(
            self.service.as_ref(),
            component,
            title,
            params,
            visible,
            transparent,
            geometry,
            saved_keybinds,
        );
        let subscribers = module.subscribers().clone();
        state.lifecycle.insert(label.clone(), resolvers);
        Some((label, created, subscribers))
    }

    /// Open a subwindow from a module's open request and wait for the
    /// underlying window to report creation. Tolerates concurrent opens of
    /// the same component: each gets its own sequence id.
    pub async fn open_subwindow(
        &self,
        module: &str,
        request: &SubwindowOpenRequest,
        skip_notify: bool,
    ) -> Option<WindowLabel> {
        let settings = &request.settings;
        let geometry = Geometry::new(
            settings.x.unwrap_or(Geometry::default().x),
            settings.y.unwrap_or(Geometry::default().y),
            settings.height.unwrap_or(Geometry::default().height),
            settings.width.unwrap_or(Geometry::default().width),
        );
        let (label, created, subscribers) = self.begin_open_subwindow(
            module,
            &request.component,
            request.title.as_deref(),
            request.params.clone(),
            settings.visible.unwrap_or(true),
            settings.transparent.unwrap_or(false),
            geometry,
            HashMap::new(),
        )?;

        created.wait().await;
        if !skip_notify {
            subscribers.notify();
        }
        Some(label)
    }

    /// Close one subwindow: unregister its shortcuts, detach it, tell the
    /// window to close, and wait for the destroyed signal so a duplicate
    /// close can never leave a dangling entry. Unknown labels are a no-op.
    pub async fn close_subwindow(
        &self,
        keybinds: &KeybindRegistry,
        module: &str,
        label: &WindowLabel,
        skip_notify: bool,
    ) {
        let plan = {
            let mut state = self.state.lock();
            state.active.get_mut(module).and_then(|m| {
                m.begin_close_subwindow(label)
                    .map(|close| (close, m.subscribers().clone()))
            })
        };
        let Some((close, subscribers)) = plan else {
            return;
        };

        for shortcut in &close.shortcuts {
            keybinds.unindex_shortcut(shortcut);
        }
        self.service.emit(label, WindowMessage::Close);
        close.destroyed.wait().await;

        if !skip_notify {
            subscribers.notify();
        }
    }

    // ------------------------------------------------------------------
    // Shortcuts (delegations used by the keybind registry)
    // ------------------------------------------------------------------

    pub fn add_shortcut(
        &self,
        window: &WindowLabel,
        id: &str,
        name: &str,
        description: &str,
        default_keybinds: &[String],
    ) -> Option<Shortcut> {
        let result = {
            let mut state = self.state.lock();
            state.active.get_mut(window.module()).and_then(|m| {
                m.add_shortcut(window, id, name, description, default_keybinds)
                    .map(|s| (s, m.subscribers().clone()))
            })
        };
        let (shortcut, subscribers) = result?;
        subscribers.notify();
        Some(shortcut)
    }

    pub fn remove_shortcut(&self, window: &WindowLabel, id: &str, skip_notify: bool) {
        let subscribers = {
            let mut state = self.state.lock();
            state.active.get_mut(window.module()).map(|m| {
                m.remove_shortcut(window, id);
                m.subscribers().clone()
            })
        };
        if let Some(subscribers) = subscribers {
            if !skip_notify {
                subscribers.notify();
            }
        }
    }

    pub fn window_shortcut(&self, window: &WindowLabel, id: &str) -> Option<Shortcut> {
        let state = self.state.lock();
        state
            .active
            .get(window.module())?
            .shortcut(window, id)
            .cloned()
    }

    pub fn window_shortcuts(&self, window: &WindowLabel) -> Option<Vec<Shortcut>> {
        let state = self.state.lock();
        state.active.get(window.module())?.window_shortcuts(window)
    }

    pub fn add_keybind(
        &self,
        window: &WindowLabel,
        id: &str,
        keybind: &str,
        skip_notify: bool,
    ) -> Option<Shortcut> {
        let result = {
            let mut state = self.state.lock();
            state.active.get_mut(window.module()).and_then(|m| {
                m.add_keybind(window, id, keybind)
                    .map(|s| (s, m.subscribers().clone()))
            })
        };
        let (shortcut, subscribers) = result?;
        if !skip_notify {
            subscribers.notify();
        }
        Some(shortcut)
    }

    pub fn remove_keybind(
        &self,
        window: &WindowLabel,
        id: &str,
        position: usize,
        skip_notify: bool,
    ) -> Option<String> {
        let result = {
            let mut state = self.state.lock();
            state.active.get_mut(window.module()).map(|m| {
                (
                    m.remove_keybind(window, id, position),
                    m.subscribers().clone(),
                )
            })
        };
        let (removed, subscribers) = result?;
        if !skip_notify {
            subscribers.notify();
        }
        removed
    }

    pub fn rebind_keybind(
        &self,
        window: &WindowLabel,
        id: &str,
        position: usize,
        new_key: &str,
        skip_notify: bool,
    ) -> Option<String> {
        let result = {
            let mut state = self.state.lock();
            state.active.get_mut(window.module()).map(|m| {
                (
                    m.rebind_keybind(window, id, position, new_key),
                    m.subscribers().clone(),
                )
            })
        };
        let (replaced, subscribers) = result?;
        if !skip_notify {
            subscribers.notify();
        }
        replaced
    }

    pub fn clear_keybinds(&self, window: &WindowLabel, id: &str, skip_notify: bool) {
        let subscribers = {
            let mut state = self.state.lock();
            state.active.get_mut(window.module()).map(|m| {
                m.clear_keybinds(window, id);
                m.subscribers().clone()
            })
        };
        if let Some(subscribers) = subscribers {
            if !skip_notify {
                subscribers.notify();
            }
        }
    }

    // ------------------------------------------------------------------
    // Profiles and config
    // ------------------------------------------------------------------

    pub fn profiles(&self) -> Vec<String> {
        self.state.lock().profiles.keys().cloned().collect()
    }

    pub fn active_profile(&self) -> String {
        self.state.lock().config.active_profile.clone()
    }

    pub fn set_active_profile(&self, name: &str) {
        self.state.lock().config.active_profile = name.to_string();
    }

    pub fn serialize_active_modules(&self) -> Vec<ModuleSnapshot> {
        let state = self.state.lock();
        state
            .active
            .values()
            .map(|m| m.snapshot(self.service.as_ref()))
            .collect()
    }

    /// Serialize all active modules into the named profile slot and make
    /// it the active profile.
    pub fn save_profile(&self, name: &str) -> StoreReceipt {
        let snapshot = self.serialize_active_modules();
        {
            let mut state = self.state.lock();
            state.profiles.insert(name.to_string(), snapshot);
            state.config.active_profile = name.to_string();
        }
        self.persist_config();
        let receipt = self.persist_profiles();
        info!(event_type = "profile", profile = name, "profile saved");
        receipt
    }

    /// Save under a new name. An empty name is a no-op.
    pub fn add_profile(&self, name: &str) -> Option<StoreReceipt> {
        if name.is_empty() {
            return None;
        }
        let receipt = self.save_profile(name);
        self.subscribers.notify();
        Some(receipt)
    }

    /// Delete a profile; deleting the active one clears the active-profile
    /// config entry. Unknown names are a no-op.
    pub fn delete_profile(&self, name: &str) {
        {
            let mut state = self.state.lock();
            if state.profiles.remove(name).is_none() {
                return;
            }
            if state.config.active_profile == name {
                state.config.active_profile.clear();
            }
        }
        self.persist_config();
        self.persist_profiles();
        self.subscribers.notify();
    }

    /// Load the named profile: close everything, restart the modules the
    /// catalog still knows (invisible, with their saved shortcuts), recreate
    /// their subwindows, wait for every window to exist, then show exactly
    /// the ones that were saved visible. Unknown names are a no-op.
    pub async fn load_profile(&self, keybinds: &KeybindRegistry, name: &str) {
        {
            let state = self.state.lock();
            if !state.profiles.contains_key(name) {
                return;
            }
        }

        self.close_all_modules(keybinds, false).await;

        let (records, known) = {
            let state = self.state.lock();
            (
                state.profiles.get(name).cloned().unwrap_or_default(),
                state.all_modules.clone(),
            )
        };

        let mut to_show: Vec<WindowLabel> = Vec::new();
        for record in &records {
            if !known.contains(&record.module_name) {
                continue;
            }
            let main = &record.main_window;
            self.start_module(
                &record.module_name,
                StartOptions {
                    title: Some(main.title.clone()),
                    visible: false,
                    geometry: Geometry::new(main.x, main.y, main.height, main.width),
                    saved_shortcuts: main.shortcuts.clone(),
                    skip_notify: true,
                },
            );
            if main.is_visible {
                to_show.push(WindowLabel::main(&record.module_name));
            }

            for sub in &record.subwindows {
                let Some(component) = &sub.component_name else {
                    continue;
                };
                let opened = self.begin_open_subwindow(
                    &record.module_name,
                    component,
                    Some(&sub.title),
                    sub.params.clone().unwrap_or_default(),
                    false,
                    sub.is_transparent,
                    Geometry::new(sub.x, sub.y, sub.height, sub.width),
                    sub.saved_keybinds(),
                );
                if let Some((label, _created, _subscribers)) = opened {
                    if sub.is_visible {
                        to_show.push(label);
                    }
                }
            }
        }

        self.state.lock().config.active_profile = name.to_string();
        self.persist_config();

        // Barrier: every window of every restarted module must exist
        // before anything becomes visible.
        let created: Vec<LifecycleSignal> = {
            let state = self.state.lock();
            state
                .active
                .values()
                .flat_map(OverlayModule::created_signals)
                .collect()
        };
        for signal in created {
            signal.wait().await;
        }

        let module_subscribers: Vec<Subscribers> = {
            let mut state = self.state.lock();
            for label in &to_show {
                if let Some(module) = state.active.get_mut(label.module()) {
                    if label.is_main() {
                        module.set_main_visible(true);
                    } else {
                        module.set_subwindow_visible(label, true);
                    }
                }
            }
            state
                .active
                .values()
                .map(|m| m.subscribers().clone())
                .collect()
        };
        for label in &to_show {
            self.service.show(label);
        }
        for subscribers in module_subscribers {
            subscribers.notify();
        }
        self.subscribers.notify();
        info!(event_type = "profile", profile = name, "profile loaded");
    }

    /// Startup sequence: profiles, then config, then whatever profile the
    /// config says is active.
    pub async fn initial_load(&self, keybinds: &KeybindRegistry) {
        self.load_profiles_from_store();
        self.load_config_from_store();
        let active = self.active_profile();
        self.load_profile(keybinds, &active).await;
        self.subscribers.notify();
    }

    /// Load the config blob; anything missing or malformed becomes the
    /// default and is immediately re-saved.
    pub fn load_config_from_store(&self) {
        match self
            .store
            .load_config()
            .and_then(|blob| ShellConfig::from_json(&blob))
        {
            Some(config) => {
                self.state.lock().config = config;
            }
            None => {
                self.state.lock().config = ShellConfig::default();
                self.persist_config();
            }
        }
    }

    /// Load the profiles blob; anything missing or malformed becomes an
    /// empty document and is immediately re-saved.
    pub fn load_profiles_from_store(&self) {
        match self
            .store
            .load_profiles()
            .and_then(|blob| ProfilesFile::from_json(&blob))
        {
            Some(file) => {
                self.state.lock().profiles = file.profiles;
            }
            None => {
                self.state.lock().profiles = BTreeMap::new();
                self.persist_profiles();
            }
        }
    }

    fn persist_config(&self) -> Option<StoreReceipt> {
        let blob = {
            let state = self.state.lock();
            state.config.to_json()
        }
        .log_err()?;
        let receipt = self.store.save_config(&blob);
        if !receipt.successful {
            error!(
                event_type = "store",
                path = %receipt.path,
                message = %receipt.message,
                "config save failed"
            );
        }
        Some(receipt)
    }

    fn persist_profiles(&self) -> StoreReceipt {
        let file = {
            let state = self.state.lock();
            ProfilesFile {
                version: 1,
                saved_at: Utc::now(),
                profiles: state.profiles.clone(),
            }
        };
        let blob = match file.to_json() {
            Ok(blob) => blob,
            Err(e) => {
                error!(error = %e, "profiles serialization failed");
                return StoreReceipt {
                    successful: false,
                    path: String::new(),
                    message: e.to_string(),
                };
            }
        };
        let receipt = self.store.save_profiles(&blob);
        if !receipt.successful {
            error!(
                event_type = "store",
                path = %receipt.path,
                message = %receipt.message,
                "profiles save failed"
            );
        }
        receipt
    }
}
