mod config;
mod document;
mod schema;
mod search;

pub use config::*;
pub use document::*;
pub use schema::*;
pub use search::*;
