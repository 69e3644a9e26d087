//! Per-window state tracked by a module.

use std::collections::{BTreeMap, HashMap};

use crate::label::WindowLabel;
use crate::lifecycle::{LifecycleResolver, LifecycleSignal};
use crate::modules::profile::WindowSnapshot;
use crate::platform::{Geometry, LaunchParams, WindowService};
use crate::shortcuts::Shortcut;

/// Resolver halves of a window's lifecycle signals. Held by the module
/// registry until the destroyed notification arrives, so a window removed
/// from its module's map can still complete the waiters that observed it.
pub(crate) struct WindowResolvers {
    pub created: LifecycleResolver,
    pub destroyed: LifecycleResolver,
}

/// One native window owned by a module: its flags, geometry at creation,
/// shortcut map, lifecycle signals, and the holdover keybinds restored when
/// shortcuts re-register after a profile load.
pub(crate) struct ModuleWindow {
    pub label: WindowLabel,
    pub title: String,
    pub visible: bool,
    pub transparent: bool,
    pub geometry: Geometry,
    pub shortcuts: BTreeMap<String, Shortcut>,
    pub created: LifecycleSignal,
    pub destroyed: LifecycleSignal,
    pub saved_keybinds: HashMap<String, Vec<String>>,
    pub params: LaunchParams,
    pub component: Option<String>,
}

impl ModuleWindow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        label: WindowLabel,
        title: String,
        visible: bool,
        transparent: bool,
        geometry: Geometry,
        created: LifecycleSignal,
        destroyed: LifecycleSignal,
        saved_keybinds: HashMap<String, Vec<String>>,
        params: LaunchParams,
        component: Option<String>,
    ) -> Self {
        ModuleWindow {
            label,
            title,
            visible,
            transparent,
            geometry,
            shortcuts: BTreeMap::new(),
            created,
            destroyed,
            saved_keybinds,
            params,
            component,
        }
    }

    /// Capture the live window state. Title, visibility and outer geometry
    /// are read back from the window service (geometry converted to
    /// logical units); the tracked values are the fallback for a window
    /// the runtime no longer reports.
    pub fn snapshot(&self, service: &dyn WindowService) -> WindowSnapshot {
        let scale = service.scale_factor();
        let title = service
            .title(&self.label)
            .unwrap_or_else(|| self.title.clone());
        let is_visible = service.is_visible(&self.label).unwrap_or(self.visible);
        let (x, y) = service
            .outer_position(&self.label)
            .map(|(x, y)| (x / scale, y / scale))
            .unwrap_or((self.geometry.x, self.geometry.y));
        let (width, height) = service
            .outer_size(&self.label)
            .map(|(w, h)| (w / scale, h / scale))
            .unwrap_or((self.geometry.width, self.geometry.height));

        WindowSnapshot {
            title,
            is_visible,
            is_transparent: self.transparent,
            x,
            y,
            height,
            width,
            shortcuts: self.shortcuts.values().map(Shortcut::snapshot).collect(),
            params: self.component.as_ref().map(|_| self.params.clone()),
            component_name: self.component.clone(),
        }
    }
}
