use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::application::{SearchClient, SearchIndex};
use crate::domain::{
    Document, DocumentRecord, DomainError, Filter, IndexSchema, SearchResponse, StoreConfig,
    VectorSearchRequest,
};

/// Results beyond the first page are never fetched.
const FIRST_PAGE: u32 = 1;

/// Stores documents with their embeddings in one named index of a search
/// service and answers nearest-neighbor queries against it.
///
/// The index is provisioned lazily on first use. Once a handle has been
/// obtained it is kept for the lifetime of the store, including after
/// [`delete_index`](Self::delete_index).
pub struct DocumentVectorStore {
    config: StoreConfig,
    search_client: Arc<dyn SearchClient>,
    index: OnceCell<Arc<dyn SearchIndex>>,
}

impl DocumentVectorStore {
    /// No request is sent until an operation needs the index.
    pub fn with_client(config: StoreConfig, search_client: Arc<dyn SearchClient>) -> Self {
        Self {
            config,
            search_client,
            index: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn search_client(&self) -> &Arc<dyn SearchClient> {
        &self.search_client
    }

    /// The index handle, or `None` while the index has not been provisioned.
    pub fn index(&self) -> Option<Arc<dyn SearchIndex>> {
        self.index.get().cloned()
    }

    /// Make sure the index exists and return its handle.
    ///
    /// Only the first successful call reaches the search service; concurrent
    /// first calls wait on the same provisioning request. A failed attempt
    /// leaves the store unprovisioned.
    pub async fn ensure_index(&self) -> Result<Arc<dyn SearchIndex>, DomainError> {
        let index = self
            .index
            .get_or_try_init(|| async {
                let schema = IndexSchema::for_dimensions(self.config.num_dimensions());
                let index = self
                    .search_client
                    .create_or_update_index(self.config.index_name(), &schema)
                    .await?;
                info!(
                    "Provisioned index {} with {} dimensions",
                    self.config.index_name(),
                    self.config.num_dimensions()
                );
                Ok::<_, DomainError>(index)
            })
            .await?;

        Ok(Arc::clone(index))
    }

    /// Delete the index from the search service.
    ///
    /// The local handle is not cleared, so a later [`ensure_index`](Self::ensure_index)
    /// does not re-provision.
    pub async fn delete_index(&self) -> Result<(), DomainError> {
        self.search_client
            .delete_index(self.config.index_name())
            .await?;
        info!("Deleted index {}", self.config.index_name());
        Ok(())
    }

    /// Upsert one record per position of `ids`, `embeddings` and `documents`.
    pub async fn add_documents_with_vectors(
        &self,
        ids: &[String],
        embeddings: &[Vec<f32>],
        documents: &[Document],
    ) -> Result<(), DomainError> {
        if ids.len() != documents.len() || embeddings.len() != documents.len() {
            return Err(DomainError::invalid_input(format!(
                "ids ({}), embeddings ({}) and documents ({}) must have the same length",
                ids.len(),
                embeddings.len(),
                documents.len()
            )));
        }

        let index = self.ensure_index().await?;

        let records: Vec<DocumentRecord> = ids
            .iter()
            .zip(embeddings.iter())
            .zip(documents.iter())
            .map(|((id, vectors), document)| {
                DocumentRecord::new(id.clone(), document.clone(), vectors.clone())
            })
            .collect();

        index.create_or_replace_many(&records).await?;

        debug!(
            "Upserted {} documents into {}",
            records.len(),
            self.config.index_name()
        );
        Ok(())
    }

    pub async fn delete_documents(&self, ids: &[String]) -> Result<(), DomainError> {
        let index = self.ensure_index().await?;
        index.delete_many(ids).await?;
        debug!("Deleted {} documents from {}", ids.len(), self.config.index_name());
        Ok(())
    }

    pub async fn delete_documents_by_filter(&self, filter: &Filter) -> Result<(), DomainError> {
        let index = self.ensure_index().await?;
        index.delete_by_query(filter).await?;
        debug!("Deleted documents matching filter from {}", self.config.index_name());
        Ok(())
    }

    pub async fn get_documents(&self, ids: &[String]) -> Result<Vec<DocumentRecord>, DomainError> {
        let index = self.ensure_index().await?;
        index.get_many(ids).await
    }

    /// Return up to `k` documents nearest to `query`, in the order the
    /// service ranked them.
    pub async fn similarity_search_vector(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<Filter>,
    ) -> Result<Vec<Document>, DomainError> {
        let response = self.search(query, k, filter).await?;

        Ok(response
            .hits
            .into_iter()
            .map(|hit| hit.document.into_document())
            .collect())
    }

    /// Like [`similarity_search_vector`](Self::similarity_search_vector), with
    /// each document paired with its vector distance.
    pub async fn similarity_search_vector_with_score(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<Filter>,
    ) -> Result<Vec<(Document, f64)>, DomainError> {
        let response = self.search(query, k, filter).await?;

        response
            .hits
            .into_iter()
            .map(|hit| {
                let score = hit.score().ok_or_else(|| {
                    DomainError::malformed(format!(
                        "search hit {} has no vector distance",
                        hit.document.id
                    ))
                })?;
                Ok((hit.document.into_document(), score))
            })
            .collect()
    }

    async fn search(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<Filter>,
    ) -> Result<SearchResponse, DomainError> {
        if k == 0 {
            return Err(DomainError::invalid_input("k must be at least 1"));
        }

        let index = self.ensure_index().await?;
        let request = VectorSearchRequest::new(query.to_vec(), k).with_filter(filter);

        let response = index.search(&request, FIRST_PAGE).await?;
        debug!(
            "Vector search on {} returned {} hits (k={})",
            self.config.index_name(),
            response.hits.len(),
            k
        );
        Ok(response)
    }
}
