use std::path::Path;

use clap::{Args, Subcommand};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{
    parse_dimensions, ConnectionConfig, Document, DomainError, Filter, StoreConfig,
    DEFAULT_DIMENSIONS, DEFAULT_INDEX_NAME, DIMENSIONS_VAR, INDEX_VAR,
};

/// Store settings given on the command line.
///
/// A flag that is set wins over its `VECDOC_*` variable, so a malformed
/// variable behind it is never an error.
#[derive(Args, Debug, Default, Clone)]
pub struct ConfigOverrides {
    /// Search service URL (default: $VECDOC_SERVER_URL or http://localhost:8081)
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    /// Project holding the index (default: $VECDOC_PROJECT or "default")
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Index name (default: $VECDOC_INDEX or "documents")
    #[arg(short, long, global = true)]
    pub index: Option<String>,

    /// Vector dimensionality (default: $VECDOC_DIMENSIONS or 1536)
    #[arg(short, long, global = true)]
    pub dimensions: Option<usize>,

    #[arg(long, global = true)]
    pub client_id: Option<String>,

    #[arg(long, global = true)]
    pub client_secret: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

impl ConfigOverrides {
    pub fn resolve_from_env(&self) -> Result<StoreConfig, DomainError> {
        self.resolve(|key| std::env::var(key).ok())
    }

    /// Merge the flags over the variables returned by `lookup`, then validate once.
    pub fn resolve(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<StoreConfig, DomainError> {
        let index_name = match &self.index {
            Some(index) => index.clone(),
            None => lookup(INDEX_VAR).unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string()),
        };
        let num_dimensions = match self.dimensions {
            Some(dimensions) => dimensions,
            None => match lookup(DIMENSIONS_VAR) {
                Some(raw) => parse_dimensions(&raw)?,
                None => DEFAULT_DIMENSIONS,
            },
        };

        let mut connection = ConnectionConfig::from_lookup(&lookup);
        if let Some(url) = &self.server_url {
            connection.server_url = url.clone();
        }
        if let Some(project) = &self.project {
            connection.project = project.clone();
        }
        if let Some(id) = &self.client_id {
            connection.client_id = Some(id.clone());
        }
        if let Some(secret) = &self.client_secret {
            connection.client_secret = Some(secret.clone());
        }
        if let Some(secs) = self.timeout {
            connection.timeout_secs = secs;
        }

        Ok(StoreConfig::new(index_name, num_dimensions)?.with_connection(connection))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Provision the index if it does not exist yet
    EnsureIndex,

    /// Delete the index and every document in it
    DeleteIndex,

    /// Upsert documents from a JSON file (array of {id?, content, metadata?, vectors})
    Add {
        #[arg(short, long)]
        file: String,
    },

    /// Delete documents by id
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Delete every document matching a JSON filter
    DeleteWhere { filter: String },

    /// Fetch documents by id
    Get {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Nearest-neighbor search with a precomputed query vector
    Search {
        /// Query vector as a JSON array, e.g. "[0.1, 0.2, 0.3]"
        #[arg(long)]
        vector: String,

        #[arg(short, default_value = "10")]
        k: usize,

        /// Metadata filter as JSON, passed to the search service as-is
        #[arg(long)]
        filter: Option<String>,

        /// Include the vector distance of every hit
        #[arg(long)]
        scores: bool,
    },
}

#[derive(Deserialize)]
struct BatchEntry {
    #[serde(default)]
    id: Option<String>,
    content: String,
    #[serde(default)]
    metadata: Option<Value>,
    vectors: Vec<f32>,
}

/// Positionally correlated ids, embeddings and documents read from a batch file.
#[derive(Debug, Default)]
pub struct DocumentBatch {
    pub ids: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
    pub documents: Vec<Document>,
}

impl DocumentBatch {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Parse a batch file. Entries without an id get a random UUID.
pub fn load_batch(path: &Path) -> Result<DocumentBatch, DomainError> {
    let raw = std::fs::read_to_string(path)?;
    parse_batch(&raw)
}

pub fn parse_batch(raw: &str) -> Result<DocumentBatch, DomainError> {
    let entries: Vec<BatchEntry> = serde_json::from_str(raw)
        .map_err(|e| DomainError::invalid_input(format!("Invalid batch file: {}", e)))?;

    let mut batch = DocumentBatch::default();
    for entry in entries {
        batch
            .ids
            .push(entry.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()));
        batch.embeddings.push(entry.vectors);
        batch.documents.push(Document {
            content: entry.content,
            metadata: entry.metadata,
        });
    }
    Ok(batch)
}

pub fn parse_vector(raw: &str) -> Result<Vec<f32>, DomainError> {
    serde_json::from_str(raw)
        .map_err(|e| DomainError::invalid_input(format!("Invalid query vector: {}", e)))
}

pub fn parse_filter(raw: &str) -> Result<Filter, DomainError> {
    serde_json::from_str::<Value>(raw)
        .map(Filter::new)
        .map_err(|e| DomainError::invalid_input(format!("Invalid filter: {}", e)))
}
