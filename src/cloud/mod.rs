//! Cloud document discovery: a long-lived query over a namespace, and the
//! coordinator that turns its batches into change notifications.

pub mod coordinator;
pub mod predicate;
pub mod provider;
pub mod session;

use std::path::PathBuf;

pub use coordinator::{CoordinatorState, ListenerId, TaskCoordinator};
pub use predicate::QueryPredicate;
pub use provider::{
    BatchSink, DirectoryProvider, DocumentProvider, MemoryProvider, MemoryProviderHandle, ProviderBatch,
};
pub use session::CloudQuerySession;

/// Error type for cloud query operations
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("cloud namespace unavailable: {0}")]
    Unavailable(String),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}
