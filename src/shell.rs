//! Shell composition root.
//!
//! Builds the single instances of every registry and router, wires them to
//! the event bus and the boundary services, and owns the startup sequence.
//! Nothing here is a global: each service object is constructed once and
//! handed by handle to everything that needs it.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::bus::EventBus;
use crate::modules::ModuleRegistry;
use crate::platform::WindowService;
use crate::router::{KeypressRouter, WindowEventRouter};
use crate::shortcuts::KeybindRegistry;
use crate::store::ProfileStore;

pub struct Shell {
    bus: EventBus,
    service: Arc<dyn WindowService>,
    modules: ModuleRegistry,
    keybinds: KeybindRegistry,
    keypress: Arc<KeypressRouter>,
    windows: Arc<WindowEventRouter>,
}

impl Shell {
    pub fn new(
        bus: EventBus,
        service: Arc<dyn WindowService>,
        store: Arc<dyn ProfileStore>,
        catalog: Vec<String>,
    ) -> Self {
        let modules = ModuleRegistry::new(Arc::clone(&service), store, catalog);
        let keybinds = KeybindRegistry::new();
        let keypress = Arc::new(KeypressRouter::new(
            bus.clone(),
            modules.clone(),
            keybinds.clone(),
            Arc::clone(&service),
        ));
        let windows = Arc::new(WindowEventRouter::new(
            bus.clone(),
            modules.clone(),
            keybinds.clone(),
        ));
        Shell {
            bus,
            service,
            modules,
            keybinds,
            keypress,
            windows,
        }
    }

    /// Spawn the router consumer tasks onto the current runtime.
    pub fn spawn_routers(&self) -> Vec<JoinHandle<()>> {
        let mut tasks = WindowEventRouter::spawn(Arc::clone(&self.windows));
        tasks.push(tokio::spawn(Arc::clone(&self.keypress).run()));
        tasks
    }

    /// Startup: load profiles and config, then the active profile.
    pub async fn initial_load(&self) {
        self.modules.initial_load(&self.keybinds).await;
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn service(&self) -> &Arc<dyn WindowService> {
        &self.service
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    pub fn keybinds(&self) -> &KeybindRegistry {
        &self.keybinds
    }

    pub fn keypress(&self) -> &KeypressRouter {
        &self.keypress
    }

    pub fn window_router(&self) -> &WindowEventRouter {
        &self.windows
    }
}
