//! # Connector Layer
//!
//! Search service adapters implementing the application ports:
//! - HTTP client for a remote search service
//! - In-memory search service for local runs and tests

pub mod adapter;

pub use adapter::*;
