//! Window event router.
//!
//! Consumes the window commands emitted by module code (show/hide/close
//! the main window, open/show/hide/close subwindows) plus the lifecycle
//! notifications reported by the window runtime, and drives the module
//! registry. Commands run as their own tasks so a close that is awaiting
//! destruction never stalls lifecycle processing — which is what resolves
//! that destruction in the first place.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::bus::{EventBus, ShellEvent, Subscription, Topic, WindowAction};
use crate::label::WindowLabel;
use crate::modules::ModuleRegistry;
use crate::platform::WindowLifecycleEvent;
use crate::shortcuts::KeybindRegistry;

pub struct WindowEventRouter {
    bus: EventBus,
    modules: ModuleRegistry,
    keybinds: KeybindRegistry,
}

impl WindowEventRouter {
    pub fn new(bus: EventBus, modules: ModuleRegistry, keybinds: KeybindRegistry) -> Self {
        WindowEventRouter {
            bus,
            modules,
            keybinds,
        }
    }

    /// Apply one window command. The owning module is derived from the
    /// structured source label; commands that name a window of some other
    /// module are no-ops.
    pub async fn handle_command(&self, event: ShellEvent) {
        match event {
            ShellEvent::MainWindow { source, action } => {
                let module = source.module();
                match action {
                    WindowAction::Show => self.modules.show_main_window(module, false),
                    WindowAction::Hide => self.modules.hide_main_window(module, false),
                    WindowAction::Close => {
                        self.modules
                            .close_module(&self.keybinds, module, false)
                            .await;
                    }
                }
            }
            ShellEvent::SubwindowOpen { source, request } => {
                debug!(
                    event_type = "window_command",
                    module = source.module(),
                    component = %request.component,
                    "subwindow open requested"
                );
                self.modules
                    .open_subwindow(source.module(), &request, false)
                    .await;
            }
            ShellEvent::Subwindow {
                source,
                target,
                action,
            } => {
                let module = source.module();
                match action {
                    WindowAction::Show => self.modules.show_subwindow(module, &target, false),
                    WindowAction::Hide => self.modules.hide_subwindow(module, &target, false),
                    WindowAction::Close => {
                        self.modules
                            .close_subwindow(&self.keybinds, module, &target, false)
                            .await;
                    }
                }
            }
            _ => {}
        }
    }

    /// Apply one lifecycle notification. A close request on a main window
    /// closes the whole module; on a subwindow, just that subwindow.
    pub async fn handle_lifecycle(&self, label: WindowLabel, event: WindowLifecycleEvent) {
        match event {
            WindowLifecycleEvent::CloseRequested => {
                if label.is_main() {
                    self.modules
                        .close_module(&self.keybinds, label.module(), false)
                        .await;
                } else {
                    self.modules
                        .close_subwindow(&self.keybinds, label.module(), &label, false)
                        .await;
                }
            }
            other => self.modules.handle_window_lifecycle(&label, other),
        }
    }

    /// Spawn the command and lifecycle consumer tasks. Subscriptions are
    /// taken synchronously here, before the tasks are scheduled, so no
    /// event published after `spawn` returns can slip past them.
    pub fn spawn(router: Arc<Self>) -> Vec<JoinHandle<()>> {
        let main_sub = router.bus.subscribe(Topic::MainWindow);
        let open_sub = router.bus.subscribe(Topic::SubwindowOpen);
        let sub_sub = router.bus.subscribe(Topic::Subwindow);
        let lifecycle_sub = router.bus.subscribe(Topic::WindowLifecycle);
        vec![
            tokio::spawn(Arc::clone(&router).run_commands(main_sub, open_sub, sub_sub)),
            tokio::spawn(router.run_lifecycle(lifecycle_sub)),
        ]
    }

    async fn run_commands(
        self: Arc<Self>,
        main_sub: Subscription,
        open_sub: Subscription,
        sub_sub: Subscription,
    ) {
        loop {
            let event = tokio::select! {
                event = main_sub.recv() => event,
                event = open_sub.recv() => event,
                event = sub_sub.recv() => event,
            };
            let Some(event) = event else { break };
            let router = Arc::clone(&self);
            tokio::spawn(async move {
                router.handle_command(event).await;
            });
        }
    }

    async fn run_lifecycle(self: Arc<Self>, lifecycle_sub: Subscription) {
        while let Some(event) = lifecycle_sub.recv().await {
            let ShellEvent::WindowLifecycle { label, event } = event else {
                continue;
            };
            match event {
                WindowLifecycleEvent::CloseRequested => {
                    let router = Arc::clone(&self);
                    tokio::spawn(async move {
                        router
                            .handle_lifecycle(label, WindowLifecycleEvent::CloseRequested)
                            .await;
                    });
                }
                // Created/destroyed resolutions stay inline: they must
                // never queue behind an awaiting close.
                other => self.modules.handle_window_lifecycle(&label, other),
            }
        }
    }
}
