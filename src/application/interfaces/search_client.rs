use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    DocumentRecord, DomainError, Filter, IndexSchema, SearchResponse, VectorSearchRequest,
};

/// Connection to a search service that hosts named indexes.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Provision `name` with `schema`, creating it or updating it in place.
    /// Calling this for an existing, compatible index is a no-op remotely.
    async fn create_or_update_index(
        &self,
        name: &str,
        schema: &IndexSchema,
    ) -> Result<Arc<dyn SearchIndex>, DomainError>;

    async fn delete_index(&self, name: &str) -> Result<(), DomainError>;
}

/// Handle to one provisioned index.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    fn name(&self) -> &str;

    /// Upsert: existing ids are fully replaced, new ids inserted.
    async fn create_or_replace_many(&self, records: &[DocumentRecord]) -> Result<(), DomainError>;

    async fn delete_many(&self, ids: &[String]) -> Result<(), DomainError>;

    async fn delete_by_query(&self, filter: &Filter) -> Result<(), DomainError>;

    /// Fetch records by id. Ids the service does not know are left out.
    async fn get_many(&self, ids: &[String]) -> Result<Vec<DocumentRecord>, DomainError>;

    /// Run one page (1-based) of a vector search.
    async fn search(
        &self,
        request: &VectorSearchRequest,
        page: u32,
    ) -> Result<SearchResponse, DomainError>;
}

impl std::fmt::Debug for dyn SearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndex").field("name", &self.name()).finish()
    }
}
