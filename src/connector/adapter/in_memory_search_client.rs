use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::{SearchClient, SearchIndex};
use crate::domain::{
    DocumentRecord, DomainError, Filter, IndexSchema, SearchHit, SearchResponse,
    VectorSearchRequest,
};

/// Process-local search service: exact L2 search over every stored record.
///
/// Filters are objects of `path: value` equality terms, where a path is
/// `id`, `content` or `metadata.<key>[.<key>...]`, optionally combined with
/// `$and` / `$or` arrays.
pub struct InMemorySearchClient {
    indexes: Mutex<HashMap<String, Arc<InMemoryIndex>>>,
}

impl InMemorySearchClient {
    pub fn new() -> Self {
        Self {
            indexes: Mutex::new(HashMap::new()),
        }
    }

    pub async fn index_names(&self) -> Vec<String> {
        let indexes = self.indexes.lock().await;
        let mut names: Vec<String> = indexes.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for InMemorySearchClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchClient for InMemorySearchClient {
    async fn create_or_update_index(
        &self,
        name: &str,
        schema: &IndexSchema,
    ) -> Result<Arc<dyn SearchIndex>, DomainError> {
        let dimensions = schema
            .vector_dimensions()
            .filter(|d| *d > 0)
            .ok_or_else(|| DomainError::schema_violation("vectors field needs dimensions"))?;

        let mut indexes = self.indexes.lock().await;
        if let Some(existing) = indexes.get(name) {
            let mut state = existing.state.lock().await;
            if state.dimensions != dimensions {
                if !state.records.is_empty() {
                    return Err(DomainError::schema_violation(format!(
                        "index {} holds {}-dimensional vectors, cannot change to {}",
                        name, state.dimensions, dimensions
                    )));
                }
                state.dimensions = dimensions;
            }
            return Ok(Arc::clone(existing) as Arc<dyn SearchIndex>);
        }

        let index = Arc::new(InMemoryIndex {
            name: name.to_string(),
            state: Mutex::new(IndexState {
                dimensions,
                records: BTreeMap::new(),
                dropped: false,
            }),
        });
        indexes.insert(name.to_string(), Arc::clone(&index));
        debug!("Created in-memory index {} ({} dimensions)", name, dimensions);

        Ok(index as Arc<dyn SearchIndex>)
    }

    async fn delete_index(&self, name: &str) -> Result<(), DomainError> {
        let mut indexes = self.indexes.lock().await;
        let index = indexes
            .remove(name)
            .ok_or_else(|| DomainError::not_found(format!("index {}", name)))?;
        index.state.lock().await.dropped = true;
        Ok(())
    }
}

struct IndexState {
    dimensions: usize,
    records: BTreeMap<String, DocumentRecord>,
    dropped: bool,
}

pub struct InMemoryIndex {
    name: String,
    state: Mutex<IndexState>,
}

impl InMemoryIndex {
    fn live<'a>(&self, state: &'a mut IndexState) -> Result<&'a mut IndexState, DomainError> {
        if state.dropped {
            return Err(DomainError::not_found(format!("index {}", self.name)));
        }
        Ok(state)
    }
}

#[async_trait]
impl SearchIndex for InMemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_or_replace_many(&self, records: &[DocumentRecord]) -> Result<(), DomainError> {
        let mut guard = self.state.lock().await;
        let state = self.live(&mut guard)?;

        for record in records {
            if record.id.is_empty() {
                return Err(DomainError::schema_violation("document id must not be empty"));
            }
            if record.dimensions() != state.dimensions {
                return Err(DomainError::schema_violation(format!(
                    "document {} has {} dimensions, index {} expects {}",
                    record.id,
                    record.dimensions(),
                    self.name,
                    state.dimensions
                )));
            }
        }

        for record in records {
            state.records.insert(record.id.clone(), record.clone());
        }
        debug!("Saved {} documents to in-memory index {}", records.len(), self.name);
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<(), DomainError> {
        let mut guard = self.state.lock().await;
        let state = self.live(&mut guard)?;
        for id in ids {
            state.records.remove(id);
        }
        Ok(())
    }

    async fn delete_by_query(&self, filter: &Filter) -> Result<(), DomainError> {
        let mut guard = self.state.lock().await;
        let state = self.live(&mut guard)?;

        let mut doomed = Vec::new();
        for record in state.records.values() {
            if matches_filter(record, filter.as_value())? {
                doomed.push(record.id.clone());
            }
        }
        for id in &doomed {
            state.records.remove(id);
        }
        debug!("Deleted {} documents from in-memory index {}", doomed.len(), self.name);
        Ok(())
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<DocumentRecord>, DomainError> {
        let mut guard = self.state.lock().await;
        let state = self.live(&mut guard)?;
        Ok(ids
            .iter()
            .filter_map(|id| state.records.get(id).cloned())
            .collect())
    }

    async fn search(
        &self,
        request: &VectorSearchRequest,
        page: u32,
    ) -> Result<SearchResponse, DomainError> {
        if page == 0 {
            return Err(DomainError::invalid_input("pages are numbered from 1"));
        }

        let mut guard = self.state.lock().await;
        let state = self.live(&mut guard)?;

        let query = &request.vector_query.vectors;
        if query.len() != state.dimensions {
            return Err(DomainError::schema_violation(format!(
                "query has {} dimensions, index {} expects {}",
                query.len(),
                self.name,
                state.dimensions
            )));
        }

        let mut scored: Vec<(f64, &DocumentRecord)> = Vec::new();
        for record in state.records.values() {
            if let Some(filter) = &request.filter {
                if !matches_filter(record, filter.as_value())? {
                    continue;
                }
            }
            scored.push((l2_distance(query, &record.vectors), record));
        }

        scored.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.id.cmp(&b.1.id))
        });

        let skip = (page as usize - 1).saturating_mul(request.hits_per_page);
        let hits = scored
            .into_iter()
            .skip(skip)
            .take(request.hits_per_page)
            .map(|(distance, record)| SearchHit::new(record.clone(), distance))
            .collect();

        Ok(SearchResponse { hits })
    }
}

fn l2_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = f64::from(*x) - f64::from(*y);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

fn matches_filter(record: &DocumentRecord, filter: &Value) -> Result<bool, DomainError> {
    let terms = filter
        .as_object()
        .ok_or_else(|| DomainError::schema_violation(format!("unsupported filter: {}", filter)))?;

    for (key, expected) in terms {
        let matched = match key.as_str() {
            "$and" => all_of(record, expected, true)?,
            "$or" => all_of(record, expected, false)?,
            "id" => expected.as_str() == Some(record.id.as_str()),
            "content" => expected.as_str() == Some(record.content.as_str()),
            path => lookup_metadata(record, path) == Some(expected),
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

/// `$and` when `all` is true, `$or` otherwise.
fn all_of(record: &DocumentRecord, clauses: &Value, all: bool) -> Result<bool, DomainError> {
    let clauses = clauses
        .as_array()
        .ok_or_else(|| DomainError::schema_violation("$and/$or expects an array"))?;

    for clause in clauses {
        let matched = matches_filter(record, clause)?;
        if matched != all {
            return Ok(matched);
        }
    }
    Ok(all)
}

fn lookup_metadata<'a>(record: &'a DocumentRecord, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    if parts.next()? != "metadata" {
        return None;
    }

    let mut current = record.metadata.as_ref()?;
    for part in parts {
        current = current.get(part)?;
    }
    Some(current)
}
