//! Integration tests for codegraph-impact
//!
//! These tests require Neo4j to be running and will wipe every
//! `CodeEntity` node in it.
//! Run with: cargo test --test integration_tests

use codegraph_impact::neo4j::models::*;
use codegraph_impact::{AppState, Config, IdentityMode, ImpactQueryEngine, Ingestor};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Tests share one database, so they run one at a time
static DB_LOCK: Mutex<()> = Mutex::const_new(());

/// Get test configuration from environment or use defaults
fn test_config() -> Config {
    Config {
        neo4j_uri: std::env::var("NEO4J_URI").unwrap_or_else(|_| "bolt://localhost:7687".into()),
        neo4j_user: std::env::var("NEO4J_USER").unwrap_or_else(|_| "neo4j".into()),
        neo4j_password: std::env::var("NEO4J_PASSWORD").unwrap_or_else(|_| "neo4j".into()),
        identity: IdentityMode::Bare,
        source_root: None,
        default_depth: 1,
        max_depth: 3,
    }
}

/// Check if Neo4j is available
async fn backend_available() -> bool {
    let config = test_config();
    let graph = match neo4rs::Graph::new(
        &config.neo4j_uri,
        &config.neo4j_user,
        &config.neo4j_password,
    )
    .await
    {
        Ok(graph) => graph,
        Err(_) => {
            eprintln!("Neo4j not available at {}", config.neo4j_uri);
            return false;
        }
    };

    // The driver connects lazily; run a trivial query to be sure
    graph.run(neo4rs::query("RETURN 1")).await.is_ok()
}

fn write_source(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_ingest_and_query_roundtrip() {
    if !backend_available().await {
        eprintln!("Skipping test: Neo4j not available");
        return;
    }
    let _db = DB_LOCK.lock().await;

    let state = AppState::new(test_config()).await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        dir.path(),
        "orders.py",
        r#"
class Base:
    pass

class Order(Base):
    def submit(self):
        self.validate()
        notify()

    def validate(self):
        check()

def notify():
    print("sent")

def check():
    pass
"#,
    );

    let ingestor = Ingestor::new(state.clone()).unwrap();
    let stats = ingestor.ingest_single(&path).await.unwrap();
    assert_eq!(stats.entities, 6);

    let graph = state.store.graph_stats().await.unwrap();
    assert_eq!(graph.entities, 6);
    assert_eq!(graph.calls, 3);
    assert_eq!(graph.inherits, 1);
    assert_eq!(graph.belongs_to, 2);

    let engine = ImpactQueryEngine::new(state.clone());
    let outcome = engine.query_impact("Order.submit", Some(2)).await.unwrap();
    let report = outcome.report().unwrap();
    assert_eq!(report.kind, EntityKind::Method);
    let downstream: Vec<&str> = report.downstream.iter().map(|s| s.as_str()).collect();
    assert_eq!(downstream, vec!["Order.validate", "check", "notify"]);

    let check = engine.query_impact("check", None).await.unwrap();
    let upstream: Vec<&str> = check
        .report()
        .unwrap()
        .upstream
        .iter()
        .map(|s| s.as_str())
        .collect();
    assert_eq!(upstream, vec!["Order.validate"]);

    assert!(!engine.query_impact("print", None).await.unwrap().is_found());
}

#[tokio::test]
async fn test_reingest_is_idempotent() {
    if !backend_available().await {
        eprintln!("Skipping test: Neo4j not available");
        return;
    }
    let _db = DB_LOCK.lock().await;

    let state = AppState::new(test_config()).await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(
        dir.path(),
        "loop.py",
        "def a():\n    b()\n    b()\n\ndef b():\n    a()\n",
    );

    let ingestor = Ingestor::new(state.clone()).unwrap();
    ingestor.ingest_single(&path).await.unwrap();
    let first = state.store.graph_stats().await.unwrap();
    ingestor.ingest_single(&path).await.unwrap();
    let second = state.store.graph_stats().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(second.calls, 2);

    // Cycles reach the start entity again
    let callees = state.store.get_callees("a", 2).await.unwrap();
    assert_eq!(callees, vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn test_batch_with_invalid_file() {
    if !backend_available().await {
        eprintln!("Skipping test: Neo4j not available");
        return;
    }
    let _db = DB_LOCK.lock().await;

    let state = AppState::new(test_config()).await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let files = vec![
        write_source(dir.path(), "one.py", "def one():\n    pass\n"),
        write_source(dir.path(), "two.py", "def two(:\n"),
        write_source(dir.path(), "three.py", "def three():\n    one()\n"),
    ];

    let ingestor = Ingestor::new(state.clone()).unwrap();
    let report = ingestor.ingest_batch(&files).await.unwrap();

    assert_eq!(report.files_ingested, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(
        state.store.get_callers("one").await.unwrap(),
        vec!["three".to_string()]
    );
    assert!(state.store.find_entity("two").await.unwrap().is_none());
}
