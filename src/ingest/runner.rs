//! Ingestion runner

use crate::error::{GraphError, Result};
use crate::neo4j::GraphStore;
use crate::parser::{CodeParser, ParsedFile};
use crate::AppState;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use walkdir::{DirEntry, WalkDir};

/// Directory names never descended into when collecting sources
const SKIPPED_DIRS: &[&str] = &[
    "__pycache__",
    ".git",
    ".venv",
    "venv",
    "node_modules",
    "site-packages",
];

/// Counts for one ingested file (or a single-file ingestion)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Entities extracted from the file
    pub entities: usize,
    /// Relations extracted from the file, before endpoint filtering and dedup
    pub relations: usize,
    /// Relations the store dropped because an endpoint was missing
    pub dropped_relations: usize,
}

/// A file that batch ingestion skipped because it could not be read or parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub path: String,
    pub reason: String,
}

/// Cumulative result of a batch ingestion
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub entities: usize,
    pub relations: usize,
    pub dropped_relations: usize,
    pub files_ingested: usize,
    /// Whitespace-only files
    pub skipped: Vec<String>,
    pub failed: Vec<FailedFile>,
}

impl BatchReport {
    fn record(&mut self, stats: IngestStats) {
        self.entities += stats.entities;
        self.relations += stats.relations;
        self.dropped_relations += stats.dropped_relations;
        self.files_ingested += 1;
    }

    pub fn failed_paths(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.path.as_str()).collect()
    }
}

/// Loads Python sources into the graph store.
///
/// Every ingestion unit holds the application's graph lock for writing from
/// the initial clear to the last upsert, so queries never see a half-built
/// graph produced by this process.
pub struct Ingestor {
    state: AppState,
    parser: Mutex<CodeParser>,
}

impl Ingestor {
    /// Create a new ingestor
    pub fn new(state: AppState) -> Result<Self> {
        let parser = CodeParser::new(state.config.identity)?
            .with_source_root(state.config.source_root.clone());

        Ok(Self {
            state,
            parser: Mutex::new(parser),
        })
    }

    /// Get the graph store
    pub fn store(&self) -> &dyn GraphStore {
        self.state.store.as_ref()
    }

    // ========================================================================
    // Ingestion entry points
    // ========================================================================

    /// Replace the whole graph with the contents of one file.
    ///
    /// The file is read and parsed before the clear, so a read or parse
    /// failure leaves the previous graph untouched.
    pub async fn ingest_single(&self, path: &Path) -> Result<IngestStats> {
        let _guard = self.state.graph_lock.write().await;

        let content = read_source(path).await?;
        let parsed = self.parse(path, &content, None).await?;

        self.store().clear().await?;
        let stats = self.load(&parsed).await?;

        tracing::info!(
            "Graph built from {}: {} entities, {} relations",
            path.display(),
            stats.entities,
            stats.relations
        );
        Ok(stats)
    }

    /// Clear the graph once, then load every file in order. Unreadable and
    /// unparseable files are recorded in the report and skipped; store
    /// failures abort the batch.
    pub async fn ingest_batch(&self, paths: &[PathBuf]) -> Result<BatchReport> {
        self.ingest_batch_under(paths, None).await
    }

    /// Batch-ingest every Python file under `dir`, in path order. In qualified
    /// identity mode module paths are computed relative to `dir`.
    pub async fn ingest_directory(&self, dir: &Path) -> Result<BatchReport> {
        if !dir.is_dir() {
            return Err(GraphError::Io {
                path: dir.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            });
        }

        let files = collect_python_files(dir);
        tracing::info!("Found {} Python files under {}", files.len(), dir.display());
        self.ingest_batch_under(&files, Some(dir)).await
    }

    async fn ingest_batch_under(
        &self,
        paths: &[PathBuf],
        root: Option<&Path>,
    ) -> Result<BatchReport> {
        let _guard = self.state.graph_lock.write().await;

        tracing::info!("Cleaning graph for batch import of {} files", paths.len());
        self.store().clear().await?;

        let mut report = BatchReport::default();
        for path in paths {
            tracing::debug!("Analyzing {}", path.display());

            match self.ingest_one(path, root).await {
                Ok(Some(stats)) => report.record(stats),
                Ok(None) => {
                    tracing::debug!("Skipping empty file {}", path.display());
                    report.skipped.push(path.display().to_string());
                }
                Err(e) if e.is_file_local() => {
                    tracing::warn!("Failed to ingest {}: {}", path.display(), e);
                    report.failed.push(FailedFile {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            "Batch complete: {} files ingested, {} skipped, {} failed ({} entities, {} relations)",
            report.files_ingested,
            report.skipped.len(),
            report.failed.len(),
            report.entities,
            report.relations
        );
        Ok(report)
    }

    /// Read, parse and load one file of a batch; `None` for whitespace-only files
    async fn ingest_one(&self, path: &Path, root: Option<&Path>) -> Result<Option<IngestStats>> {
        let content = read_source(path).await?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let parsed = self.parse(path, &content, root).await?;
        self.load(&parsed).await.map(Some)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn parse(&self, path: &Path, content: &str, root: Option<&Path>) -> Result<ParsedFile> {
        let mut parser = self.parser.lock().await;
        match root {
            Some(root) => parser.parse_file_under(path, content, Some(root)),
            None => parser.parse_file(path, content),
        }
    }

    /// Entities first: relation upserts only link nodes that already exist
    async fn load(&self, parsed: &ParsedFile) -> Result<IngestStats> {
        let written = self.store().upsert_entities(&parsed.entities).await?;
        let summary = self.store().upsert_relations(&parsed.relations).await?;

        tracing::debug!(
            "{}: {} entities, {} edges linked, {} dropped",
            parsed.path,
            written,
            summary.linked,
            summary.dropped
        );

        Ok(IngestStats {
            entities: parsed.entities.len(),
            relations: parsed.relations.len(),
            dropped_relations: summary.dropped,
        })
    }
}

async fn read_source(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| GraphError::Io {
            path: path.display().to_string(),
            source,
        })
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

/// All `.py` files under `dir`, sorted by path, skipping caches, VCS
/// metadata and virtualenvs
pub fn collect_python_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|ext| ext.to_str()) == Some("py"))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}
