use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration from tasks.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TasksConfig {
    #[serde(default)]
    pub cloud: CloudConfig,
    #[serde(default)]
    pub undo: UndoConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Directory that stands in for the cloud namespace
    #[serde(default)]
    pub container: Option<PathBuf>,
    /// Track documents by extension (mutually exclusive with `last_path_component`)
    #[serde(default)]
    pub path_extension: Option<String>,
    /// Track a single document by exact file name
    #[serde(default)]
    pub last_path_component: Option<String>,
    /// Fold several queued batches into one notification
    #[serde(default = "default_true")]
    pub coalesce_batches: bool,
    /// How often the CLI drains the query session
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        CloudConfig {
            container: None,
            path_extension: None,
            last_path_component: None,
            coalesce_batches: true,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoConfig {
    /// Maximum number of undo steps kept per presenter
    #[serde(default = "default_undo_limit")]
    pub limit: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        UndoConfig {
            limit: default_undo_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: default_log_filter(),
        }
    }
}

/// Extension used when neither predicate is configured
pub const DEFAULT_PATH_EXTENSION: &str = "task";

fn default_true() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_undo_limit() -> usize {
    500
}

fn default_log_filter() -> String {
    "tasks=info".to_string()
}
