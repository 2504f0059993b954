//! # Application Layer
//!
//! The document vector store and the search-service ports it depends on.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
