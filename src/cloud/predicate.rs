use std::path::Path;

/// Which documents a query tracks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPredicate {
    /// Every document whose extension matches, e.g. `task`
    PathExtension(String),
    /// The single document with exactly this file name
    LastPathComponent(String),
}

impl QueryPredicate {
    /// Extension predicate; a leading `.` is ignored
    pub fn path_extension(extension: &str) -> Self {
        QueryPredicate::PathExtension(extension.trim_start_matches('.').to_string())
    }

    pub fn last_path_component(name: &str) -> Self {
        QueryPredicate::LastPathComponent(name.to_string())
    }

    pub fn matches(&self, path: &Path) -> bool {
        match self {
            QueryPredicate::PathExtension(ext) => {
                path.extension().and_then(|e| e.to_str()) == Some(ext.as_str())
            }
            QueryPredicate::LastPathComponent(name) => {
                path.file_name().and_then(|n| n.to_str()) == Some(name.as_str())
            }
        }
    }
}
