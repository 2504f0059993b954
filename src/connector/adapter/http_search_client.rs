use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::{DocumentVectorStore, SearchClient, SearchIndex};
use crate::domain::{
    ConnectionConfig, DocumentRecord, DomainError, Filter, IndexSchema, SearchResponse,
    StoreConfig, VectorSearchRequest,
};

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    schema: &'a IndexSchema,
}

#[derive(Serialize)]
struct DocumentsRequest<'a> {
    documents: &'a [DocumentRecord],
}

#[derive(Serialize)]
struct IdsRequest<'a> {
    ids: &'a [String],
}

#[derive(Serialize)]
struct DeleteByQueryRequest<'a> {
    filter: &'a Filter,
}

#[derive(Serialize)]
struct PagedSearchRequest<'a> {
    #[serde(flatten)]
    request: &'a VectorSearchRequest,
    page: u32,
}

#[derive(Deserialize, Default)]
struct WriteResponse {
    #[serde(default)]
    status: Vec<DocumentStatus>,
}

#[derive(Deserialize)]
struct DocumentStatus {
    id: String,
    #[serde(default)]
    error: Option<DocumentError>,
}

#[derive(Deserialize)]
struct DocumentError {
    message: String,
}

#[derive(Deserialize, Default)]
struct GetResponse {
    #[serde(default)]
    documents: Vec<Option<DocumentRecord>>,
}

/// Shared HTTP plumbing for the client and its index handles.
struct Transport {
    client: reqwest::Client,
    base_url: Url,
    project: String,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl Transport {
    /// `{server}/v1/projects/{project}/search/indexes/{segments...}`
    fn endpoint(&self, segments: &[&str]) -> Result<Url, DomainError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                DomainError::invalid_input(format!("Unusable server URL: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(["v1", "projects", self.project.as_str(), "search", "indexes"])
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, DomainError> {
        let request = match &self.client_id {
            Some(id) => request.basic_auth(id, self.client_secret.as_ref()),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                DomainError::connection(format!("search service not reachable: {e}"))
            } else {
                DomainError::connection(format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("Search service returned {status}: {body}");
        Err(error_for_status(status, body))
    }

    async fn decode<T: DeserializeOwned + Default>(response: Response) -> Result<T, DomainError> {
        let body = response
            .text()
            .await
            .map_err(|e| DomainError::connection(format!("failed to read response: {e}")))?;
        decode_body(&body)
    }
}

/// An empty body stands for the default value, e.g. a `204 No Content`.
fn decode_body<T: DeserializeOwned + Default>(body: &str) -> Result<T, DomainError> {
    if body.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(body)
        .map_err(|e| DomainError::malformed(format!("failed to parse response: {e}")))
}

/// Per-document rejections in an accepted write become one `SchemaViolation`.
fn check_write(response: WriteResponse) -> Result<(), DomainError> {
    let failures: Vec<String> = response
        .status
        .into_iter()
        .filter_map(|s| s.error.map(|e| format!("{}: {}", s.id, e.message)))
        .collect();
    if failures.is_empty() {
        Ok(())
    } else {
        Err(DomainError::schema_violation(failures.join("; ")))
    }
}

/// Map a non-success status to the error taxonomy callers match on.
fn error_for_status(status: StatusCode, body: String) -> DomainError {
    let message = if body.is_empty() {
        status.to_string()
    } else {
        body
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DomainError::connection(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            DomainError::schema_violation(message)
        }
        StatusCode::NOT_FOUND => DomainError::not_found(message),
        _ => DomainError::service(status.as_u16(), message),
    }
}

/// Client for the search service's JSON REST API.
///
/// Timeouts come from [`ConnectionConfig::timeout`]. Requests are never
/// retried here.
pub struct HttpSearchClient {
    transport: Arc<Transport>,
}

impl HttpSearchClient {
    /// Build the client. Sends nothing over the network.
    pub fn new(config: &ConnectionConfig) -> Result<Self, DomainError> {
        let base_url = Url::parse(&config.server_url).map_err(|e| {
            DomainError::invalid_input(format!("Invalid server URL {}: {e}", config.server_url))
        })?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DomainError::connection(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            transport: Arc::new(Transport {
                client,
                base_url,
                project: config.project.clone(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
            }),
        })
    }

    pub fn index_url(&self, name: &str) -> Result<Url, DomainError> {
        self.transport.endpoint(&[name])
    }
}

/// A store backed by the HTTP search service in `config.connection()`.
pub fn http_store(config: StoreConfig) -> Result<DocumentVectorStore, DomainError> {
    let client = HttpSearchClient::new(config.connection())?;
    Ok(DocumentVectorStore::with_client(config, Arc::new(client)))
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn create_or_update_index(
        &self,
        name: &str,
        schema: &IndexSchema,
    ) -> Result<Arc<dyn SearchIndex>, DomainError> {
        let url = self.transport.endpoint(&[name])?;
        self.transport
            .send(
                self.transport
                    .client
                    .put(url)
                    .json(&CreateIndexRequest { schema }),
            )
            .await?;

        debug!("Created or updated index {}", name);
        let index = HttpSearchIndex {
            name: name.to_string(),
            transport: Arc::clone(&self.transport),
        };
        Ok(Arc::new(index) as Arc<dyn SearchIndex>)
    }

    async fn delete_index(&self, name: &str) -> Result<(), DomainError> {
        let url = self.transport.endpoint(&[name])?;
        self.transport
            .send(self.transport.client.delete(url))
            .await?;
        debug!("Deleted index {}", name);
        Ok(())
    }
}

pub struct HttpSearchIndex {
    name: String,
    transport: Arc<Transport>,
}

impl HttpSearchIndex {
    fn documents_url(&self, suffix: Option<&str>) -> Result<Url, DomainError> {
        match suffix {
            Some(suffix) => self.transport.endpoint(&[&self.name, "documents", suffix]),
            None => self.transport.endpoint(&[&self.name, "documents"]),
        }
    }
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn create_or_replace_many(&self, records: &[DocumentRecord]) -> Result<(), DomainError> {
        let url = self.documents_url(None)?;
        let response = self
            .transport
            .send(
                self.transport
                    .client
                    .put(url)
                    .json(&DocumentsRequest { documents: records }),
            )
            .await?;

        check_write(Transport::decode(response).await?)?;

        debug!("Wrote {} documents to {}", records.len(), self.name);
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<(), DomainError> {
        let url = self.documents_url(None)?;
        self.transport
            .send(self.transport.client.delete(url).json(&IdsRequest { ids }))
            .await?;
        Ok(())
    }

    async fn delete_by_query(&self, filter: &Filter) -> Result<(), DomainError> {
        let url = self.documents_url(Some("query"))?;
        self.transport
            .send(
                self.transport
                    .client
                    .delete(url)
                    .json(&DeleteByQueryRequest { filter }),
            )
            .await?;
        Ok(())
    }

    async fn get_many(&self, ids: &[String]) -> Result<Vec<DocumentRecord>, DomainError> {
        let url = self.documents_url(Some("get"))?;
        let response = self
            .transport
            .send(self.transport.client.post(url).json(&IdsRequest { ids }))
            .await?;

        let result: GetResponse = Transport::decode(response).await?;
        Ok(result.documents.into_iter().flatten().collect())
    }

    async fn search(
        &self,
        request: &VectorSearchRequest,
        page: u32,
    ) -> Result<SearchResponse, DomainError> {
        let url = self.documents_url(Some("search"))?;
        let response = self
            .transport
            .send(
                self.transport
                    .client
                    .post(url)
                    .json(&PagedSearchRequest { request, page }),
            )
            .await?;

        Transport::decode(response).await
    }
}
