//! Recording fake of the search service ports.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use vecdoc::{
    DocumentRecord, DocumentVectorStore, DomainError, Filter, IndexSchema, SearchClient,
    SearchHit, SearchIndex, SearchResponse, StoreConfig, VectorSearchRequest,
};

#[derive(Default)]
pub struct CallLog {
    pub created: Vec<(String, IndexSchema)>,
    pub deleted_indexes: Vec<String>,
    pub upserts: Vec<Vec<DocumentRecord>>,
    pub deletes: Vec<Vec<String>>,
    pub deletes_by_query: Vec<Filter>,
    pub gets: Vec<Vec<String>>,
    pub searches: Vec<(VectorSearchRequest, u32)>,
}

#[derive(Default)]
struct Shared {
    log: Mutex<CallLog>,
    hits: Mutex<Vec<SearchHit>>,
    records: Mutex<Vec<DocumentRecord>>,
    next_error: Mutex<Option<DomainError>>,
    provision_delay: Mutex<Option<Duration>>,
}

impl Shared {
    fn take_error(&self) -> Result<(), DomainError> {
        match self.next_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Default)]
pub struct RecordingSearchClient {
    shared: Arc<Shared>,
}

impl RecordingSearchClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hits every search returns, in this order.
    pub fn with_hits(self, hits: Vec<SearchHit>) -> Self {
        *self.shared.hits.lock().unwrap() = hits;
        self
    }

    /// Records `get_many` can find.
    pub fn with_records(self, records: Vec<DocumentRecord>) -> Self {
        *self.shared.records.lock().unwrap() = records;
        self
    }

    pub fn with_provision_delay(self, delay: Duration) -> Self {
        *self.shared.provision_delay.lock().unwrap() = Some(delay);
        self
    }

    /// Make the next call of any kind fail with `err`.
    pub fn fail_next(&self, err: DomainError) {
        *self.shared.next_error.lock().unwrap() = Some(err);
    }

    pub fn log<T>(&self, f: impl FnOnce(&CallLog) -> T) -> T {
        f(&self.shared.log.lock().unwrap())
    }

    pub fn create_calls(&self) -> usize {
        self.log(|log| log.created.len())
    }
}

#[async_trait]
impl SearchClient for RecordingSearchClient {
    async fn create_or_update_index(
        &self,
        name: &str,
        schema: &IndexSchema,
    ) -> Result<Arc<dyn SearchIndex>, DomainError> {
        self.shared
            .log
            .lock()
            .unwrap()
            .created
            .push((name.to_string(), schema.clone()));

        let delay = *self.shared.provision_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.shared.take_error()?;

        let index = RecordingIndex {
            name: name.to_string(),
            shared: Arc::clone(&self.shared),
        };
        Ok(Arc::new(index) as Arc<dyn SearchIndex>)
    }

    async fn delete_index(&self, name: &str) -> Result<(), DomainError> {
        self.shared.take_error()?;
        self.shared
            .log
            .lock()
            .unwrap()
            .deleted_indexes
            .push(name.to_string());
        Ok(())
    }
}

struct RecordingIndex {
    name: String,
    shared: Arc<Shared>,
}

#[async_trait]
impl SearchIndex for RecordingIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_or_replace_many(&self, records: &[DocumentRecord]) -> Result<(), DomainError> {
        self.shared.take_error()?;
        self.shared.log.lock().unwrap().upserts.push(records.to_vec());
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<(), DomainError> {
        self.shared.take_error()?;
        self.shared.log.lock().unwrap().deletes.push(ids.to_vec());
        Ok(())
    }

    async fn delete_by_query(&self, filter: &Filter) -> Result<(), DomainError> {
        self.shared.take_error()?;
        self.shared
            .log
            .lock()
            .unwrap()
            .deletes_by_query
            .push(filter.clone());
        Ok(())
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<DocumentRecord>, DomainError> {
        self.shared.take_error()?;
        self.shared.log.lock().unwrap().gets.push(ids.to_vec());
        let records = self.shared.records.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| records.iter().find(|r| &r.id == id).cloned())
            .collect())
    }

    async fn search(
        &self,
        request: &VectorSearchRequest,
        page: u32,
    ) -> Result<SearchResponse, DomainError> {
        self.shared.take_error()?;
        self.shared
            .log
            .lock()
            .unwrap()
            .searches
            .push((request.clone(), page));
        Ok(SearchResponse {
            hits: self.shared.hits.lock().unwrap().clone(),
        })
    }
}

pub fn test_config(num_dimensions: usize) -> StoreConfig {
    StoreConfig::new("testIndex", num_dimensions).expect("valid config")
}

pub fn store_with(client: &RecordingSearchClient, num_dimensions: usize) -> DocumentVectorStore {
    DocumentVectorStore::with_client(test_config(num_dimensions), Arc::new(client.clone()))
}
