//! Module catalog.
//!
//! Known modules are the subdirectories of the modules directory; the
//! catalog is resolved once at startup and treated as read-only input by
//! the module registry. [`CatalogWatcher`] keeps it fresh by emitting a
//! reload event whenever the directory changes.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread;

use notify::{recommended_watcher, EventKind, RecursiveMode, Result as NotifyResult, Watcher};
use tracing::{info, warn};

/// List the module identifiers found under `dir`, sorted by name.
/// A missing or unreadable directory yields an empty catalog.
pub fn discover(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "module directory not readable");
            return Vec::new();
        }
    };

    let mut modules: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !name.starts_with('.'))
        .collect();
    modules.sort();

    info!(
        event_type = "catalog",
        dir = %dir.display(),
        count = modules.len(),
        "module catalog discovered"
    );
    modules
}

/// Event emitted when the modules directory changed and the catalog should
/// be re-discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogReloadEvent {
    Changed,
}

/// Watches the modules directory and emits reload events
pub struct CatalogWatcher {
    tx: Option<Sender<CatalogReloadEvent>>,
    watcher_thread: Option<thread::JoinHandle<()>>,
}

impl CatalogWatcher {
    /// Returns a tuple of (watcher, receiver) where the receiver emits a
    /// [`CatalogReloadEvent`] when the directory contents change.
    pub fn new() -> (Self, Receiver<CatalogReloadEvent>) {
        let (tx, rx) = channel();
        let watcher = CatalogWatcher {
            tx: Some(tx),
            watcher_thread: None,
        };
        (watcher, rx)
    }

    /// Start watching `dir` on a background thread.
    pub fn start(&mut self, dir: PathBuf) -> NotifyResult<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| std::io::Error::other("watcher already started"))?;

        let handle = thread::spawn(move || {
            if let Err(e) = Self::watch_loop(tx, dir) {
                warn!(error = %e, watcher = "catalog", "catalog watcher error");
            }
        });
        self.watcher_thread = Some(handle);
        Ok(())
    }

    fn watch_loop(tx: Sender<CatalogReloadEvent>, dir: PathBuf) -> NotifyResult<()> {
        let (raw_tx, raw_rx) = channel();
        let mut watcher = recommended_watcher(move |res| {
            let _ = raw_tx.send(res);
        })?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        for res in raw_rx {
            match res {
                Ok(event) => {
                    let relevant = matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(_)
                    );
                    if relevant && tx.send(CatalogReloadEvent::Changed).is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, watcher = "catalog", "watch event error"),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn discover_lists_module_directories_sorted() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("FSWatch_Tester")).unwrap();
        std::fs::create_dir(dir.path().join("Clock")).unwrap();
        std::fs::write(dir.path().join("README.md"), "not a module").unwrap();

        assert_eq!(discover(dir.path()), vec!["Clock", "FSWatch_Tester"]);
    }

    #[test]
    fn discover_skips_hidden_directories() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::create_dir(dir.path().join("Clock")).unwrap();

        assert_eq!(discover(dir.path()), vec!["Clock"]);
    }

    #[test]
    fn discover_on_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        assert!(discover(&dir.path().join("nope")).is_empty());
    }
}
