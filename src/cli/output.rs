use serde::Serialize;

use crate::model::document::DocRef;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct DocumentJson {
    pub name: String,
    pub title: String,
    pub path: String,
    pub modified: String,
    pub size: u64,
}

#[derive(Serialize)]
pub struct ChangesJson {
    pub added: Vec<DocumentJson>,
    pub removed: Vec<DocumentJson>,
    pub updated: Vec<DocumentJson>,
}

impl From<&DocRef> for DocumentJson {
    fn from(doc: &DocRef) -> Self {
        DocumentJson {
            name: doc.name.clone(),
            title: doc.display_name().to_string(),
            path: doc.path.display().to_string(),
            modified: doc.revision.modified.to_rfc3339(),
            size: doc.revision.size,
        }
    }
}

pub fn documents_json(docs: &[DocRef]) -> Vec<DocumentJson> {
    docs.iter().map(DocumentJson::from).collect()
}

pub fn changes_json(added: &[DocRef], removed: &[DocRef], updated: &[DocRef]) -> ChangesJson {
    ChangesJson {
        added: documents_json(added),
        removed: documents_json(removed),
        updated: documents_json(updated),
    }
}

// ---------------------------------------------------------------------------
// Text output
// ---------------------------------------------------------------------------

/// One line per document: name, size, modification time
pub fn format_documents(docs: &[DocRef]) -> String {
    docs.iter()
        .map(|d| {
            format!(
                "{}  {} bytes  {}",
                d.name,
                d.revision.size,
                d.revision.modified.format("%Y-%m-%d %H:%M")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `+` added, `-` removed, `~` updated; one document per line
pub fn format_changes(added: &[DocRef], removed: &[DocRef], updated: &[DocRef]) -> String {
    let marked = [("+", added), ("-", removed), ("~", updated)];
    marked
        .iter()
        .flat_map(|(mark, docs)| docs.iter().map(move |d| format!("{} {}", mark, d.name)))
        .collect::<Vec<_>>()
        .join("\n")
}
