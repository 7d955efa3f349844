//! Test helper factories and mock state builders
//!
//! Provides a mock-backed AppState with sensible defaults and small helpers
//! for laying out Python sources in temporary directories.
#![allow(dead_code)]

use crate::neo4j::mock::MockGraphStore;
use crate::parser::IdentityMode;
use crate::{AppState, Config};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Two classes, one inheriting, with a method calling a sibling via `self`
pub const SHAPES_SOURCE: &str = r#"
class Shape:
    def area(self):
        return 0

class Square(Shape):
    def __init__(self, side):
        self.side = side

    def area(self):
        return self.scale(self.side)

    def scale(self, value):
        return value * value

def total(shapes):
    return sum(s.area() for s in shapes)
"#;

// ============================================================================
// Mock state builders
// ============================================================================

/// Runtime config pointing at a fake backend
pub fn test_config(identity: IdentityMode) -> Config {
    Config {
        neo4j_uri: "bolt://mock:7687".to_string(),
        neo4j_user: "neo4j".to_string(),
        neo4j_password: "mock".to_string(),
        identity,
        source_root: None,
        default_depth: 1,
        max_depth: 3,
    }
}

/// Create a mock AppState with an empty in-memory store, returning the store
/// as well so tests can inspect it
pub fn mock_app_state() -> (AppState, Arc<MockGraphStore>) {
    mock_app_state_with_config(test_config(IdentityMode::Bare))
}

/// Create a mock AppState with the given config
pub fn mock_app_state_with_config(config: Config) -> (AppState, Arc<MockGraphStore>) {
    let store = Arc::new(MockGraphStore::new());
    let state = AppState::with_store(store.clone(), config);
    (state, store)
}

// ============================================================================
// Source fixtures
// ============================================================================

/// Write `content` to `dir/relative`, creating parent directories
pub fn write_source(dir: &Path, relative: &str, content: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}
