mod document_vector_store;

pub use document_vector_store::*;
