pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{DocumentVectorStore, SearchClient, SearchIndex};

pub use connector::{
    http_store, HttpSearchClient, HttpSearchIndex, InMemoryIndex, InMemorySearchClient,
};

pub use domain::{
    ConnectionConfig, Document, DocumentRecord, DomainError, FieldSpec, FieldType, Filter,
    HitMeta, IndexSchema, SearchHit, SearchResponse, StoreConfig, TextMatch, VectorQuery,
    VectorSearchRequest,
};
