//! Error taxonomy shared by the extractor, the graph store and the orchestrator.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    /// Source text is not valid Python (or not a Python file at all)
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Connection, auth or driver failure talking to the graph backend
    #[error("graph store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("unexpected response from graph store: {0}")]
    StoreResponse(String),

    #[error("failed to initialise parser: {0}")]
    ParserInit(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl GraphError {
    /// Per-file failures that batch ingestion records and skips past.
    pub fn is_file_local(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Io { .. })
    }

    pub(crate) fn parse(path: &str, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl From<neo4rs::Error> for GraphError {
    fn from(e: neo4rs::Error) -> Self {
        Self::StoreUnavailable(e.to_string())
    }
}

impl From<neo4rs::DeError> for GraphError {
    fn from(e: neo4rs::DeError) -> Self {
        Self::StoreResponse(e.to_string())
    }
}
