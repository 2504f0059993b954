//! # Domain Layer
//!
//! Documents, index schema, search request/response shapes and configuration.
//! This layer is independent of any particular search service.

mod error;
pub mod models;

pub use error::*;
pub use models::*;
