//! Persistence boundary for config and profiles.
//!
//! The store traffics in opaque string blobs; JSON encoding and decoding
//! happens in the module registry. Write operations report back with a
//! [`StoreReceipt`] (success flag, path, message) that travels all the way
//! to the UI layer, mirroring how every other file operation in the shell
//! is surfaced. Reads return `None` for anything unreadable; the registry
//! treats that the same as a malformed blob and re-saves a default.

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

/// Outcome of a store write, surfaced to the UI layer for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreReceipt {
    pub successful: bool,
    pub path: String,
    pub message: String,
}

impl StoreReceipt {
    fn ok(path: impl Into<String>) -> Self {
        StoreReceipt {
            successful: true,
            path: path.into(),
            message: String::new(),
        }
    }

    fn err(path: impl Into<String>, message: impl Into<String>) -> Self {
        StoreReceipt {
            successful: false,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// External persistence service for the config and profiles blobs.
pub trait ProfileStore: Send + Sync {
    fn load_config(&self) -> Option<String>;
    fn save_config(&self, blob: &str) -> StoreReceipt;
    fn load_profiles(&self) -> Option<String>;
    fn save_profiles(&self, blob: &str) -> StoreReceipt;
}

const CONFIG_FILE: &str = "config.json";
const PROFILES_FILE: &str = "profiles.json";

/// File-backed store rooted at a data directory (~/.overdeck by default).
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        FileStore { dir }
    }

    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".overdeck"))
            .unwrap_or_else(|| std::env::temp_dir().join("overdeck"))
    }

    fn read(&self, name: &str) -> Option<String> {
        let path = self.dir.join(name);
        match fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "store read failed");
                None
            }
        }
    }

    /// Atomic write: temp file then rename.
    fn write(&self, name: &str, contents: &str) -> StoreReceipt {
        let path = self.dir.join(name);
        let shown = path.display().to_string();

        if let Err(e) = fs::create_dir_all(&self.dir) {
            return StoreReceipt::err(shown, e.to_string());
        }
        let tmp_path = path.with_extension("json.tmp");
        if let Err(e) = fs::write(&tmp_path, contents) {
            return StoreReceipt::err(shown, e.to_string());
        }
        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return StoreReceipt::err(shown, e.to_string());
        }
        info!(event_type = "store", path = %shown, "store write completed");
        StoreReceipt::ok(shown)
    }
}

impl ProfileStore for FileStore {
    fn load_config(&self) -> Option<String> {
        self.read(CONFIG_FILE)
    }

    fn save_config(&self, blob: &str) -> StoreReceipt {
        self.write(CONFIG_FILE, blob)
    }

    fn load_profiles(&self) -> Option<String> {
        self.read(PROFILES_FILE)
    }

    fn save_profiles(&self, blob: &str) -> StoreReceipt {
        self.write(PROFILES_FILE, blob)
    }
}

/// In-memory store used by tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    config: parking_lot::Mutex<Option<String>>,
    profiles: parking_lot::Mutex<Option<String>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(blob: impl Into<String>) -> Self {
        let store = Self::default();
        *store.profiles.lock() = Some(blob.into());
        store
    }

    pub fn config_blob(&self) -> Option<String> {
        self.config.lock().clone()
    }

    pub fn profiles_blob(&self) -> Option<String> {
        self.profiles.lock().clone()
    }
}

#[cfg(test)]
impl ProfileStore for MemoryStore {
    fn load_config(&self) -> Option<String> {
        self.config.lock().clone()
    }

    fn save_config(&self, blob: &str) -> StoreReceipt {
        *self.config.lock() = Some(blob.to_string());
        StoreReceipt::ok("memory://config")
    }

    fn load_profiles(&self) -> Option<String> {
        self.profiles.lock().clone()
    }

    fn save_profiles(&self, blob: &str) -> StoreReceipt {
        *self.profiles.lock() = Some(blob.to_string());
        StoreReceipt::ok("memory://profiles")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_files_load_as_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("data"));
        assert!(store.load_config().is_none());
        assert!(store.load_profiles().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf());

        let receipt = store.save_config(r#"{"activeProfile":"work"}"#);
        assert!(receipt.successful, "{}", receipt.message);
        assert_eq!(
            store.load_config().as_deref(),
            Some(r#"{"activeProfile":"work"}"#)
        );
    }

    #[test]
    fn save_creates_the_data_directory() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested").join("deep"));
        let receipt = store.save_profiles("{}");
        assert!(receipt.successful, "{}", receipt.message);
        assert_eq!(store.load_profiles().as_deref(), Some("{}"));
    }

    #[cfg(unix)]
    #[test]
    fn failed_write_reports_path_and_message() {
        // A file where the directory should be makes create_dir_all fail.
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, "not a directory").unwrap();

        let store = FileStore::new(blocker);
        let receipt = store.save_config("{}");
        assert!(!receipt.successful);
        assert!(receipt.path.contains("blocked"));
        assert!(!receipt.message.is_empty());
    }
}
