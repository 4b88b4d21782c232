//! lustre-bench - Lustre scratch filesystem benchmarks
//!
//! Cold-cache `dd` throughput passes, stripe policy comparison and
//! large filler-file generation for a parallel filesystem mount.

use std::fmt;
use std::time::Duration;

// Public re-exports
pub mod bench;
pub mod config;
pub mod exec;
pub mod io;
pub mod logging;
pub mod models;
pub mod report;
pub mod util;

// Common error types
#[derive(Debug)]
pub enum LustreBenchError {
    /// External command exited with a nonzero status or could not be spawned
    CommandExecution {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
    /// External command did not finish within the configured timeout
    CommandTimeout { command: String, timeout: Duration },
    /// A required input artifact is missing
    Precondition(String),
    /// Disk full, permission denied or similar OS-level failure
    Resource(String),
    /// I/O operation failed
    IoError(std::io::Error),
    /// A measured duration cannot be used as a throughput denominator
    ZeroDuration(String),
    /// Configuration validation or parsing error
    ConfigError(String),
    /// Results persistence error
    PersistenceError(String),
    /// Chart rendering error
    ChartError(String),
    /// A large-file batch stopped at the first failed generation
    GenerationAborted {
        file: String,
        source: Box<LustreBenchError>,
    },
}

impl fmt::Display for LustreBenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LustreBenchError::CommandExecution {
                command,
                exit_code,
                stderr,
            } => {
                let code = exit_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "none".to_string());
                write!(
                    f,
                    "Command failed (exit code {}): {}: {}",
                    code,
                    command,
                    stderr.trim()
                )
            }
            LustreBenchError::CommandTimeout { command, timeout } => write!(
                f,
                "Command timed out after {}: {}",
                humantime::format_duration(*timeout),
                command
            ),
            LustreBenchError::Precondition(msg) => write!(f, "Precondition failed: {}", msg),
            LustreBenchError::Resource(msg) => write!(f, "Resource error: {}", msg),
            LustreBenchError::IoError(err) => write!(f, "I/O error: {}", err),
            LustreBenchError::ZeroDuration(msg) => write!(f, "Invalid duration: {}", msg),
            LustreBenchError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            LustreBenchError::PersistenceError(msg) => {
                write!(f, "Results persistence error: {}", msg)
            }
            LustreBenchError::ChartError(msg) => write!(f, "Chart error: {}", msg),
            LustreBenchError::GenerationAborted { file, source } => {
                write!(f, "Generation of {} failed, batch aborted: {}", file, source)
            }
        }
    }
}

impl std::error::Error for LustreBenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LustreBenchError::IoError(err) => Some(err),
            LustreBenchError::GenerationAborted { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LustreBenchError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                LustreBenchError::Resource(format!("Access denied: {}", err))
            }
            std::io::ErrorKind::StorageFull | std::io::ErrorKind::OutOfMemory => {
                LustreBenchError::Resource(format!("Out of space: {}", err))
            }
            _ => LustreBenchError::IoError(err),
        }
    }
}

impl From<serde_json::Error> for LustreBenchError {
    fn from(err: serde_json::Error) -> Self {
        LustreBenchError::PersistenceError(format!("JSON serialization error: {}", err))
    }
}

impl From<toml::de::Error> for LustreBenchError {
    fn from(err: toml::de::Error) -> Self {
        LustreBenchError::ConfigError(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for LustreBenchError {
    fn from(err: toml::ser::Error) -> Self {
        LustreBenchError::ConfigError(format!("TOML serialization error: {}", err))
    }
}

/// Result type alias for lustre-bench operations
pub type Result<T> = std::result::Result<T, LustreBenchError>;

/// Error handling utilities
pub mod error {
    use super::LustreBenchError;

    /// Convert error to user-friendly message with suggestions
    pub fn user_friendly_message(error: &LustreBenchError) -> String {
        match error {
            LustreBenchError::CommandExecution { command, .. } if command.starts_with("lfs") => {
                format!(
                    "{}. Is the path on a Lustre mount and the lfs client installed?",
                    error
                )
            }
            LustreBenchError::CommandExecution { command, .. } if command.starts_with("tee") => {
                format!(
                    "{}. Dropping the page cache needs root; run privileged or disable drop_caches.",
                    error
                )
            }
            LustreBenchError::CommandTimeout { .. } => {
                format!("{}. Raise command_timeout or check the filesystem.", error)
            }
            LustreBenchError::Precondition(_) => {
                format!("{}. Run the write test for this size first.", error)
            }
            LustreBenchError::Resource(_) => {
                format!("{}. Check free space and permissions on the target.", error)
            }
            LustreBenchError::ConfigError(msg) => {
                format!("Configuration error: {}. Check your settings.", msg)
            }
            _ => error.to_string(),
        }
    }
}

// Common types and constants
pub const APP_NAME: &str = "lustre-bench";
pub const CONFIG_FILE: &str = "lustre-bench.toml";
pub const RESULTS_DIR: &str = "performance_results";
pub const TEMP_FILE_PREFIX: &str = "LBENCH_TMP_";
pub const DEFAULT_MOUNT: &str = "/scratch";
pub const PAGE_CACHE_CONTROL: &str = "/proc/sys/vm/drop_caches";
