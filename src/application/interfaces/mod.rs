mod search_client;

pub use search_client::*;
