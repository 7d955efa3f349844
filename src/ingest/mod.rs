//! Ingestion orchestrator
//!
//! Drives extraction into the graph store: clear-then-load for one file,
//! clear-once-then-load-each for a batch.

mod runner;

pub use runner::{collect_python_files, BatchReport, FailedFile, IngestStats, Ingestor};
