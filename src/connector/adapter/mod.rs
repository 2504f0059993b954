mod http_search_client;
mod in_memory_search_client;

pub use http_search_client::*;
pub use in_memory_search_client::*;
