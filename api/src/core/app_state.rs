use std::env;

use base_text_store::BaseTextStore;
use graph_store::{GraphConfig, GraphStore};
use services::SearchIndexer;
use thiserror::Error;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: GraphStore,
    pub texts: BaseTextStore,
    /// Absent when no indexer endpoint is configured; background
    /// notifications are then disabled.
    pub indexer: Option<SearchIndexer>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),
}

/// Environment-derived settings, read once at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub graph: GraphConfig,
    pub base_text_root: String,
    pub indexer_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned()),
            graph: GraphConfig {
                uri: require("NEO4J_URI")?,
                user: env::var("NEO4J_USERNAME").unwrap_or_else(|_| "neo4j".to_owned()),
                password: require("NEO4J_PASSWORD")?,
            },
            base_text_root: env::var("BASE_TEXT_ROOT").unwrap_or_else(|_| "data".to_owned()),
            indexer_url: env::var("SEARCH_INDEXER_URL").ok().filter(|url| !url.is_empty()),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingEnv(name))
}
