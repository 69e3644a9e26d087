use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use overdeck::bus::EventBus;
use overdeck::catalog::{self, CatalogWatcher};
use overdeck::logging;
use overdeck::platform::{HeadlessWindows, WindowService};
use overdeck::shell::Shell;
use overdeck::store::FileStore;

/// Overlay shell: module windows, profiles, and global shortcut routing.
#[derive(Parser)]
#[command(name = "overdeck", version, about)]
struct Cli {
    /// Directory containing installed modules
    #[arg(long)]
    modules_dir: Option<PathBuf>,

    /// Data directory for config and profiles
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init();

    let data_dir = cli.data_dir.unwrap_or_else(FileStore::default_dir);
    let modules_dir = cli
        .modules_dir
        .unwrap_or_else(|| FileStore::default_dir().join("modules"));

    let bus = EventBus::new();
    let service: Arc<dyn WindowService> = Arc::new(HeadlessWindows::new(bus.clone()));
    let store = Arc::new(FileStore::new(data_dir));
    let shell = Shell::new(bus, service, store, catalog::discover(&modules_dir));

    let _router_tasks = shell.spawn_routers();
    shell.initial_load().await;

    // Keep the catalog fresh while running.
    let (mut watcher, reload_rx) = CatalogWatcher::new();
    if let Err(e) = watcher.start(modules_dir.clone()) {
        warn!(error = %e, "catalog watcher unavailable");
    }
    {
        let modules = shell.modules().clone();
        let dir = modules_dir.clone();
        std::thread::spawn(move || {
            for _event in reload_rx {
                modules.set_all_modules(catalog::discover(&dir));
            }
        });
    }

    info!(
        event_type = "app_lifecycle",
        modules_dir = %modules_dir.display(),
        "overdeck running; Ctrl-C to exit"
    );
    tokio::signal::ctrl_c().await?;
    info!(event_type = "app_lifecycle", action = "shutdown", "shutting down");
    Ok(())
}
