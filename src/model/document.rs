use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last-known metadata revision of a cloud document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentRevision {
    pub modified: DateTime<Utc>,
    pub size: u64,
}

/// Reference to a document in the cloud namespace. Identity is the path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocRef {
    /// Final path component, e.g. `Groceries.task`
    pub name: String,
    pub path: PathBuf,
    pub revision: DocumentRevision,
}

impl DocRef {
    pub fn new(path: impl Into<PathBuf>, revision: DocumentRevision) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        DocRef {
            name,
            path,
            revision,
        }
    }

    /// Display name without the extension
    pub fn display_name(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}

/// Whether a result is the first full gather or a later update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryPhase {
    Initial,
    Update,
}

/// One delivered batch: the full matching listing plus deltas against the
/// previous listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudQueryResult {
    pub phase: QueryPhase,
    /// Every currently matching document, sorted by path
    pub documents: Vec<DocRef>,
    pub added: Vec<DocRef>,
    pub removed: Vec<DocRef>,
    pub updated: Vec<DocRef>,
}

impl CloudQueryResult {
    /// Build a result by diffing `current` against `previous`.
    /// Documents are keyed by path; a changed revision counts as an update.
    pub fn diff(phase: QueryPhase, previous: &[DocRef], current: Vec<DocRef>) -> Self {
        let changes = DocumentChanges::between(previous, &current);
        let mut documents = current;
        documents.sort_by(|a, b| a.path.cmp(&b.path));
        documents.dedup_by(|a, b| a.path == b.path);
        CloudQueryResult {
            phase,
            documents,
            added: changes.added,
            removed: changes.removed,
            updated: changes.updated,
        }
    }

    /// True when nothing was added, removed, or updated
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

/// Added/removed/updated sets between two listings, each sorted by path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChanges {
    pub added: Vec<DocRef>,
    pub removed: Vec<DocRef>,
    pub updated: Vec<DocRef>,
}

impl DocumentChanges {
    pub fn between(previous: &[DocRef], current: &[DocRef]) -> Self {
        let before: BTreeMap<&Path, &DocRef> =
            previous.iter().map(|d| (d.path.as_path(), d)).collect();
        let after: BTreeMap<&Path, &DocRef> =
            current.iter().map(|d| (d.path.as_path(), d)).collect();

        let mut changes = DocumentChanges::default();
        for (path, doc) in &after {
            match before.get(path) {
                None => changes.added.push((*doc).clone()),
                Some(old) if old.revision != doc.revision => changes.updated.push((*doc).clone()),
                Some(_) => {}
            }
        }
        for (path, doc) in &before {
            if !after.contains_key(path) {
                changes.removed.push((*doc).clone());
            }
        }
        changes
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}
