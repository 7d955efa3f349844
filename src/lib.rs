//! Codegraph Impact
//!
//! A static-analysis code graph for Python sources with:
//! - Tree-sitter extraction of functions, methods, classes and their
//!   CALLS / INHERITS / BELONGS_TO relations
//! - Neo4j persistence with idempotent upserts
//! - Bidirectional impact queries ("what does X call, what calls X")

pub mod error;
pub mod ingest;
pub mod neo4j;
pub mod parser;
pub mod query;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use error::{GraphError, Result};
pub use ingest::{BatchReport, FailedFile, IngestStats, Ingestor};
pub use parser::IdentityMode;
pub use query::{ImpactOutcome, ImpactQueryEngine, ImpactReport};

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Upper bound for downstream traversal depth
pub const MAX_QUERY_DEPTH: u32 = 5;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub neo4j: Neo4jYamlConfig,
    pub extractor: ExtractorYamlConfig,
    pub query: QueryYamlConfig,
}

/// Neo4j configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jYamlConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for Neo4jYamlConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".into(),
            user: "neo4j".into(),
            password: "neo4j".into(),
        }
    }
}

/// Extractor configuration section
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ExtractorYamlConfig {
    pub identity: IdentityMode,
    /// Root that module paths are relative to in qualified mode
    pub source_root: Option<String>,
}

/// Query configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryYamlConfig {
    pub default_depth: u32,
    pub max_depth: u32,
}

impl Default for QueryYamlConfig {
    fn default() -> Self {
        Self {
            default_depth: 1,
            max_depth: 3,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub identity: IdentityMode,
    pub source_root: Option<PathBuf>,
    pub default_depth: u32,
    pub max_depth: u32,
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. If the file doesn't
    /// exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let mut yaml = Self::load_yaml(yaml_path);

        if let Ok(uri) = std::env::var("NEO4J_URI") {
            yaml.neo4j.uri = uri;
        }
        if let Ok(user) = std::env::var("NEO4J_USER") {
            yaml.neo4j.user = user;
        }
        if let Ok(password) = std::env::var("NEO4J_PASSWORD") {
            yaml.neo4j.password = password;
        }
        if let Ok(identity) = std::env::var("CODEGRAPH_IDENTITY") {
            yaml.extractor.identity = identity.parse()?;
        }
        if let Ok(root) = std::env::var("CODEGRAPH_SOURCE_ROOT") {
            yaml.extractor.source_root = Some(root);
        }
        if let Ok(depth) = std::env::var("CODEGRAPH_MAX_DEPTH") {
            yaml.query.max_depth = depth.parse().map_err(|_| {
                GraphError::Config(format!("CODEGRAPH_MAX_DEPTH must be a number, got '{depth}'"))
            })?;
        }

        Self::from_yaml(yaml)
    }

    /// Validate a YAML config and convert it into the runtime config
    pub fn from_yaml(yaml: YamlConfig) -> Result<Self> {
        let max_depth = yaml.query.max_depth;
        if !(1..=MAX_QUERY_DEPTH).contains(&max_depth) {
            return Err(GraphError::Config(format!(
                "query.max_depth must be between 1 and {MAX_QUERY_DEPTH}, got {max_depth}"
            )));
        }
        if yaml.query.default_depth == 0 || yaml.query.default_depth > max_depth {
            return Err(GraphError::Config(format!(
                "query.default_depth must be between 1 and {max_depth}, got {}",
                yaml.query.default_depth
            )));
        }

        Ok(Self {
            neo4j_uri: yaml.neo4j.uri,
            neo4j_user: yaml.neo4j.user,
            neo4j_password: yaml.neo4j.password,
            identity: yaml.extractor.identity,
            source_root: yaml.extractor.source_root.map(PathBuf::from),
            default_depth: yaml.query.default_depth,
            max_depth,
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn neo4j::GraphStore>,
    pub config: Arc<Config>,
    /// Held for writing by each ingestion unit, for reading by each query
    pub graph_lock: Arc<RwLock<()>>,
}

impl AppState {
    /// Connect to Neo4j and build the application state
    pub async fn new(config: Config) -> Result<Self> {
        let store = Arc::new(
            neo4j::client::Neo4jClient::new(
                &config.neo4j_uri,
                &config.neo4j_user,
                &config.neo4j_password,
            )
            .await?,
        );

        Ok(Self::with_store(store, config))
    }

    /// Build the application state around an existing store
    pub fn with_store(store: Arc<dyn neo4j::GraphStore>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
            graph_lock: Arc::new(RwLock::new(())),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
