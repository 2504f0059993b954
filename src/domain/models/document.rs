use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-facing document: text plus optional opaque metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// The persisted shape of a document inside a search index.
///
/// `vectors` must have exactly the index's configured dimensionality; the
/// remote service enforces this, not this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub vectors: Vec<f32>,
}

impl DocumentRecord {
    pub fn new(id: impl Into<String>, document: Document, vectors: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            content: document.content,
            metadata: document.metadata,
            vectors,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.vectors.len()
    }

    pub fn into_document(self) -> Document {
        Document {
            content: self.content,
            metadata: self.metadata,
        }
    }
}
