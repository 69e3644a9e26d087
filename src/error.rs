use thiserror::Error;
use tracing::{error, warn};

/// Error severity for UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,     // informational
    Warning,  // recoverable
    Error,    // operation failed
    Critical, // requires user action
}

/// Domain-specific errors for the overlay shell.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Window operation failed: {0}")]
    Window(String),

    #[error("Failed to parse persisted state: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Store failure for '{path}': {source}")]
    Store {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Module catalog error: {0}")]
    Catalog(String),

    #[error("Invalid window label: {0}")]
    Label(#[from] crate::label::LabelParseError),
}

impl ShellError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Window(_) => ErrorSeverity::Error,
            Self::Parse(_) => ErrorSeverity::Warning,
            Self::Store { .. } => ErrorSeverity::Error,
            Self::Config(_) => ErrorSeverity::Warning,
            Self::Catalog(_) => ErrorSeverity::Warning,
            Self::Label(_) => ErrorSeverity::Warning,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Window(msg) => msg.clone(),
            Self::Parse(e) => format!("Saved state could not be read: {}", e),
            Self::Store { path, source } => format!("Could not access {}: {}", path, source),
            Self::Config(msg) => format!("Configuration issue: {}", msg),
            Self::Catalog(msg) => format!("Module catalog issue: {}", msg),
            Self::Label(e) => e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ShellError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?err,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?err,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}
