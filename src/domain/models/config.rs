use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8081";
pub const DEFAULT_PROJECT: &str = "default";
pub const DEFAULT_INDEX_NAME: &str = "documents";
pub const DEFAULT_DIMENSIONS: usize = 1536;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const SERVER_URL_VAR: &str = "VECDOC_SERVER_URL";
pub const PROJECT_VAR: &str = "VECDOC_PROJECT";
pub const CLIENT_ID_VAR: &str = "VECDOC_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "VECDOC_CLIENT_SECRET";
pub const TIMEOUT_VAR: &str = "VECDOC_TIMEOUT_SECS";
pub const INDEX_VAR: &str = "VECDOC_INDEX";
pub const DIMENSIONS_VAR: &str = "VECDOC_DIMENSIONS";

fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Parse a `VECDOC_DIMENSIONS` value. Zero is left to [`StoreConfig::new`].
pub fn parse_dimensions(raw: &str) -> Result<usize, DomainError> {
    raw.trim().parse().map_err(|_| {
        DomainError::invalid_input(format!("{} is not a number: {}", DIMENSIONS_VAR, raw))
    })
}

/// Parameters for reaching the search service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub server_url: String,
    pub project: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub timeout_secs: u64,
}

impl ConnectionConfig {
    pub fn new(server_url: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            project: project.into(),
            client_id: None,
            client_secret: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.client_secret = Some(client_secret.into());
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Construct from environment variables with local-first defaults:
    ///
    /// | Variable               | Default                 |
    /// |------------------------|-------------------------|
    /// | `VECDOC_SERVER_URL`    | `http://localhost:8081` |
    /// | `VECDOC_PROJECT`       | `default`               |
    /// | `VECDOC_CLIENT_ID`     | unset                   |
    /// | `VECDOC_CLIENT_SECRET` | unset                   |
    /// | `VECDOC_TIMEOUT_SECS`  | `30`                    |
    pub fn from_env() -> Self {
        Self::from_lookup(process_env)
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let timeout_secs = lookup(TIMEOUT_VAR)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            server_url: lookup(SERVER_URL_VAR).unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            project: lookup(PROJECT_VAR).unwrap_or_else(|| DEFAULT_PROJECT.to_string()),
            client_id: lookup(CLIENT_ID_VAR),
            client_secret: lookup(CLIENT_SECRET_VAR),
            timeout_secs,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL, DEFAULT_PROJECT)
    }
}

/// Immutable configuration of a document vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    index_name: String,
    num_dimensions: usize,
    connection: ConnectionConfig,
}

impl StoreConfig {
    pub fn new(index_name: impl Into<String>, num_dimensions: usize) -> Result<Self, DomainError> {
        let index_name = index_name.into();
        if index_name.trim().is_empty() {
            return Err(DomainError::invalid_input("Index name must not be empty"));
        }
        if num_dimensions == 0 {
            return Err(DomainError::invalid_input(
                "Number of dimensions must be positive",
            ));
        }

        Ok(Self {
            index_name,
            num_dimensions,
            connection: ConnectionConfig::default(),
        })
    }

    pub fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = connection;
        self
    }

    /// Construct from `VECDOC_INDEX`, `VECDOC_DIMENSIONS` and the connection
    /// variables read by [`ConnectionConfig::from_env`].
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, DomainError> {
        let index_name = lookup(INDEX_VAR).unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string());
        let num_dimensions = match lookup(DIMENSIONS_VAR) {
            Some(raw) => parse_dimensions(&raw)?,
            None => DEFAULT_DIMENSIONS,
        };

        Ok(Self::new(index_name, num_dimensions)?
            .with_connection(ConnectionConfig::from_lookup(lookup)))
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn num_dimensions(&self) -> usize {
        self.num_dimensions
    }

    pub fn connection(&self) -> &ConnectionConfig {
        &self.connection
    }
}
