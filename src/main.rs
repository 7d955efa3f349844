//! Codegraph - command line front-end
//!
//! Builds the Python code graph in Neo4j and answers impact queries.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codegraph_impact::{
    ingest::collect_python_files, AppState, BatchReport, Config, ImpactQueryEngine, Ingestor,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "codegraph")]
#[command(about = "Python code graph builder and impact analyzer")]
struct Cli {
    /// Path to a YAML config file (defaults to ./config.yaml when present)
    #[arg(short, long, global = true, env = "CODEGRAPH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the graph with the contents of one Python file
    Ingest {
        /// Python source file
        file: PathBuf,
    },

    /// Replace the graph with a set of files and directories
    Batch {
        /// Python files or directories to walk
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Show what an entity calls and what calls it
    Impact {
        /// Entity name (`func`, `Class` or `Class.method`)
        name: String,

        /// Downstream traversal depth
        #[arg(short, long)]
        depth: Option<u32>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print node and edge counts
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Logs go to stderr so `impact --json` output stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,codegraph_impact=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config =
        Config::from_yaml_and_env(cli.config.as_deref()).context("Failed to load configuration")?;

    let state = AppState::new(config)
        .await
        .context("Failed to connect to Neo4j")?;
    tracing::debug!("Connected to graph store");

    match cli.command {
        Commands::Ingest { file } => run_ingest(state, &file).await,
        Commands::Batch { paths } => run_batch(state, &paths).await,
        Commands::Impact { name, depth, json } => run_impact(state, &name, depth, json).await,
        Commands::Stats => run_stats(state).await,
    }
}

async fn run_ingest(state: AppState, file: &Path) -> Result<()> {
    let ingestor = Ingestor::new(state)?;
    let stats = ingestor
        .ingest_single(file)
        .await
        .with_context(|| format!("Failed to ingest {}", file.display()))?;

    println!(
        "Ingested {}: {} entities, {} relations ({} unresolved)",
        file.display(),
        stats.entities,
        stats.relations,
        stats.dropped_relations
    );
    Ok(())
}

async fn run_batch(state: AppState, paths: &[PathBuf]) -> Result<()> {
    let ingestor = Ingestor::new(state)?;

    // A single directory keeps module paths relative to it
    let report = match paths {
        [dir] if dir.is_dir() => ingestor.ingest_directory(dir).await?,
        _ => {
            let mut files = Vec::new();
            for path in paths {
                if path.is_dir() {
                    files.extend(collect_python_files(path));
                } else {
                    files.push(path.clone());
                }
            }
            ingestor.ingest_batch(&files).await?
        }
    };

    print_batch_report(&report);
    Ok(())
}

fn print_batch_report(report: &BatchReport) {
    println!(
        "Batch complete: {} files ingested, {} entities, {} relations ({} unresolved)",
        report.files_ingested, report.entities, report.relations, report.dropped_relations
    );
    if !report.skipped.is_empty() {
        println!("Skipped {} empty files", report.skipped.len());
    }
    for failed in &report.failed {
        println!("  failed: {} ({})", failed.path, failed.reason);
    }
}

async fn run_impact(state: AppState, name: &str, depth: Option<u32>, json: bool) -> Result<()> {
    let engine = ImpactQueryEngine::new(state);
    let outcome = engine
        .query_impact(name, depth)
        .await
        .with_context(|| format!("Impact query for '{name}' failed"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.render());
    }
    Ok(())
}

async fn run_stats(state: AppState) -> Result<()> {
    let stats = state.store.graph_stats().await?;
    println!("Entities:   {}", stats.entities);
    println!("CALLS:      {}", stats.calls);
    println!("INHERITS:   {}", stats.inherits);
    println!("BELONGS_TO: {}", stats.belongs_to);
    Ok(())
}
