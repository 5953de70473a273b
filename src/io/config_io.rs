use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::cloud::QueryPredicate;
use crate::model::config::{CloudConfig, DEFAULT_PATH_EXTENSION, TasksConfig};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "tasks.toml";

/// Error type for config I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("cloud.path_extension and cloud.last_path_component are mutually exclusive")]
    ConflictingPredicate,
}

/// Read the config file. A missing file yields the defaults.
pub fn read_config(path: &Path) -> Result<TasksConfig, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(TasksConfig::default()),
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    parse_config(&text)
}

pub fn parse_config(text: &str) -> Result<TasksConfig, ConfigError> {
    let config: TasksConfig = toml::from_str(text)?;
    query_predicate(&config.cloud)?;
    Ok(config)
}

/// The query predicate a cloud section describes. Neither key set means the
/// default extension.
pub fn query_predicate(cloud: &CloudConfig) -> Result<QueryPredicate, ConfigError> {
    match (&cloud.path_extension, &cloud.last_path_component) {
        (Some(_), Some(_)) => Err(ConfigError::ConflictingPredicate),
        (Some(ext), None) => Ok(QueryPredicate::path_extension(ext)),
        (None, Some(name)) => Ok(QueryPredicate::last_path_component(name)),
        (None, None) => Ok(QueryPredicate::path_extension(DEFAULT_PATH_EXTENSION)),
    }
}
