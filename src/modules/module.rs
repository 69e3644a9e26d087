//! One running module: its main window, subwindows and their shortcuts.
//!
//! `OverlayModule` owns all per-module window state. Operations that only
//! touch that state live here; the async orchestration around them (close
//! barriers, creation waits, keybind index cleanup) belongs to
//! [`crate::modules::ModuleRegistry`], which owns the modules and the
//! collaborating services.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::ResultExt;
use crate::label::{ShortcutKey, WindowLabel};
use crate::lifecycle::{lifecycle, LifecycleSignal};
use crate::modules::profile::ModuleSnapshot;
use crate::modules::window::{ModuleWindow, WindowResolvers};
use crate::observer::Subscribers;
use crate::platform::{Geometry, LaunchParams, WindowService, WindowSpec};
use crate::shortcuts::{Shortcut, ShortcutSnapshot};

/// Everything needed to finish closing one subwindow after it has been
/// detached from its module.
pub(crate) struct SubwindowClose {
    pub label: WindowLabel,
    pub shortcuts: Vec<Shortcut>,
    pub destroyed: LifecycleSignal,
}

/// Everything needed to finish closing a whole module. Subwindows come
/// first so their close handlers never see a torn-down module.
pub(crate) struct ModuleClose {
    pub subwindows: Vec<SubwindowClose>,
    pub main_label: WindowLabel,
    pub main_shortcuts: Vec<Shortcut>,
    pub main_destroyed: LifecycleSignal,
}

pub(crate) struct OverlayModule {
    name: String,
    main_window: ModuleWindow,
    subwindows: BTreeMap<WindowLabel, ModuleWindow>,
    subwindow_seqs: HashMap<String, u32>,
    subscribers: Subscribers,
}

impl OverlayModule {
    /// Construct the module and open its main window. A failed window
    /// creation is logged and leaves the lifecycle signals pending; the
    /// module still exists and can be closed normally.
    pub fn open_main(
        name: &str,
        title: &str,
        visible: bool,
        geometry: Geometry,
        saved_shortcuts: &[ShortcutSnapshot],
        service: &dyn WindowService,
    ) -> (Self, WindowLabel, WindowResolvers) {
        let label = WindowLabel::main(name);
        let (created_resolver, created) = lifecycle();
        let (destroyed_resolver, destroyed) = lifecycle();

        let saved_keybinds = saved_shortcuts
            .iter()
            .map(|s| (s.id.clone(), s.keybinds.clone()))
            .collect();

        service
            .create_window(&WindowSpec {
                label: label.clone(),
                title: title.to_string(),
                visible,
                transparent: false,
                geometry,
                params: LaunchParams::new(),
            })
            .log_err();

        let module = OverlayModule {
            name: name.to_string(),
            main_window: ModuleWindow::new(
                label.clone(),
                title.to_string(),
                visible,
                false,
                geometry,
                created,
                destroyed,
                saved_keybinds,
                LaunchParams::new(),
                None,
            ),
            subwindows: BTreeMap::new(),
            subwindow_seqs: HashMap::new(),
            subscribers: Subscribers::new(),
        };

        (
            module,
            label,
            WindowResolvers {
                created: created_resolver,
                destroyed: destroyed_resolver,
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn main_label(&self) -> WindowLabel {
        self.main_window.label.clone()
    }

    pub fn subscribers(&self) -> &Subscribers {
        &self.subscribers
    }

    pub fn subwindow_labels(&self) -> Vec<WindowLabel> {
        self.subwindows.keys().cloned().collect()
    }

    pub fn window(&self, label: &WindowLabel) -> Option<&ModuleWindow> {
        if *label == self.main_window.label {
            Some(&self.main_window)
        } else {
            self.subwindows.get(label)
        }
    }

    fn window_mut(&mut self, label: &WindowLabel) -> Option<&mut ModuleWindow> {
        if *label == self.main_window.label {
            Some(&mut self.main_window)
        } else {
            self.subwindows.get_mut(label)
        }
    }

    /// Open a subwindow for `component`, allocating the next sequence id
    /// for that component. Returns the new label, the created signal for
    /// callers that need the window to exist, and the resolver halves for
    /// the registry's lifecycle table.
    #[allow(clippy::too_many_arguments)]
    pub fn open_subwindow(
        &mut self,
        service: &dyn WindowService,
        component: &str,
        title: Option<&str>,
        params: LaunchParams,
        visible: bool,
        transparent: bool,
        geometry: Geometry,
        saved_keybinds: HashMap<String, Vec<String>>,
    ) -> (WindowLabel, LifecycleSignal, WindowResolvers) {
        let seq = self
            .subwindow_seqs
            .get(component)
            .map_or(0, |last| last + 1);
        self.subwindow_seqs.insert(component.to_string(), seq);

        let label = WindowLabel::sub(&self.name, component, seq);
        let title = title
            .map(str::to_string)
            .unwrap_or_else(|| label.to_string());

        let (created_resolver, created) = lifecycle();
        let (destroyed_resolver, destroyed) = lifecycle();

        service
            .create_window(&WindowSpec {
                label: label.clone(),
                title: title.clone(),
                visible,
                transparent,
                geometry,
                params: params.clone(),
            })
            .log_err();

        debug!(label = %label, module = %self.name, "subwindow opened");
        self.subwindows.insert(
            label.clone(),
            ModuleWindow::new(
                label.clone(),
                title,
                visible,
                transparent,
                geometry,
                created.clone(),
                destroyed,
                saved_keybinds,
                params,
                Some(component.to_string()),
            ),
        );

        (
            label,
            created,
            WindowResolvers {
                created: created_resolver,
                destroyed: destroyed_resolver,
            },
        )
    }

    pub fn set_main_visible(&mut self, visible: bool) {
        self.main_window.visible = visible;
    }

    /// Flip a subwindow's visibility flag; `false` when the label is
    /// unknown to this module.
    pub fn set_subwindow_visible(&mut self, label: &WindowLabel, visible: bool) -> bool {
        match self.subwindows.get_mut(label) {
            Some(window) => {
                window.visible = visible;
                true
            }
            None => false,
        }
    }

    /// Detach one subwindow for closing.
    pub fn begin_close_subwindow(&mut self, label: &WindowLabel) -> Option<SubwindowClose> {
        let window = self.subwindows.remove(label)?;
        Some(SubwindowClose {
            label: label.clone(),
            shortcuts: window.shortcuts.values().cloned().collect(),
            destroyed: window.destroyed.clone(),
        })
    }

    /// Detach every subwindow and snapshot the main window's teardown
    /// state. The module itself stays registered until the caller has
    /// collected every destroyed signal.
    pub fn begin_close(&mut self) -> ModuleClose {
        let labels = self.subwindow_labels();
        let subwindows = labels
            .iter()
            .filter_map(|label| self.begin_close_subwindow(label))
            .collect();

        ModuleClose {
            subwindows,
            main_label: self.main_window.label.clone(),
            main_shortcuts: self.main_window.shortcuts.values().cloned().collect(),
            main_destroyed: self.main_window.destroyed.clone(),
        }
    }

    /// Register a shortcut on one of this module's windows. Saved keybinds
    /// recorded for the id win over the provided defaults; a duplicate id
    /// is rejected, first registration wins.
    pub fn add_shortcut(
        &mut self,
        window: &WindowLabel,
        id: &str,
        name: &str,
        description: &str,
        default_keybinds: &[String],
    ) -> Option<Shortcut> {
        let entry = self.window_mut(window)?;
        if entry.shortcuts.contains_key(id) {
            return None;
        }
        let bound = entry
            .saved_keybinds
            .get(id)
            .cloned()
            .unwrap_or_else(|| default_keybinds.to_vec());
        let shortcut = Shortcut::new(
            ShortcutKey::new(window.clone(), id),
            name,
            description,
            bound,
        );
        entry.shortcuts.insert(id.to_string(), shortcut.clone());
        Some(shortcut)
    }

    pub fn remove_shortcut(&mut self, window: &WindowLabel, id: &str) {
        if let Some(entry) = self.window_mut(window) {
            entry.shortcuts.remove(id);
        }
    }

    pub fn shortcut(&self, window: &WindowLabel, id: &str) -> Option<&Shortcut> {
        self.window(window)?.shortcuts.get(id)
    }

    pub fn window_shortcuts(&self, window: &WindowLabel) -> Option<Vec<Shortcut>> {
        Some(self.window(window)?.shortcuts.values().cloned().collect())
    }

    pub fn add_keybind(
        &mut self,
        window: &WindowLabel,
        id: &str,
        keybind: &str,
    ) -> Option<Shortcut> {
        let shortcut = self.window_mut(window)?.shortcuts.get_mut(id)?;
        shortcut.bind_key(keybind);
        Some(shortcut.clone())
    }

    pub fn remove_keybind(
        &mut self,
        window: &WindowLabel,
        id: &str,
        position: usize,
    ) -> Option<String> {
        self.window_mut(window)?
            .shortcuts
            .get_mut(id)?
            .unbind_at(position)
    }

    pub fn rebind_keybind(
        &mut self,
        window: &WindowLabel,
        id: &str,
        position: usize,
        new_key: &str,
    ) -> Option<String> {
        self.window_mut(window)?
            .shortcuts
            .get_mut(id)?
            .rebind_at(position, new_key)
    }

    pub fn clear_keybinds(&mut self, window: &WindowLabel, id: &str) {
        if let Some(shortcut) = self.window_mut(window).and_then(|w| w.shortcuts.get_mut(id)) {
            shortcut.unbind_all();
        }
    }

    pub fn has_shortcuts(&self) -> bool {
        !self.main_window.shortcuts.is_empty()
            || self.subwindows.values().any(|w| !w.shortcuts.is_empty())
    }

    pub fn created_signals(&self) -> Vec<LifecycleSignal> {
        let mut signals = vec![self.main_window.created.clone()];
        signals.extend(self.subwindows.values().map(|w| w.created.clone()));
        signals
    }

    pub fn snapshot(&self, service: &dyn WindowService) -> ModuleSnapshot {
        ModuleSnapshot {
            module_name: self.name.clone(),
            main_window: self.main_window.snapshot(service),
            subwindows: self
                .subwindows
                .values()
                .map(|w| w.snapshot(service))
                .collect(),
        }
    }
}
