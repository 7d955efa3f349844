//! Impact queries
//!
//! Answers "what does X call, and what calls X" against the stored graph.

use crate::error::Result;
use crate::neo4j::models::EntityKind;
use crate::AppState;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write as _;

/// Downstream and upstream neighbourhood of one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpactReport {
    pub name: String,
    pub kind: EntityKind,
    pub filepath: String,
    pub line: u32,
    /// Depth actually used for the downstream traversal
    pub depth: u32,
    /// Names reachable over 1..=depth CALLS hops
    pub downstream: BTreeSet<String>,
    /// Direct callers
    pub upstream: BTreeSet<String>,
}

/// Result of an impact query. A missing entity is distinct from one that
/// exists but has no neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImpactOutcome {
    Found(ImpactReport),
    NotFound { name: String },
}

impl ImpactOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn report(&self) -> Option<&ImpactReport> {
        match self {
            Self::Found(report) => Some(report),
            Self::NotFound { .. } => None,
        }
    }

    /// Human-readable impact summary
    pub fn render(&self) -> String {
        match self {
            Self::Found(report) => report.render(),
            Self::NotFound { name } => format!(
                "Entity '{name}' was not found in the code graph. \
                 Names are exact and case-sensitive; methods are written as Class.method."
            ),
        }
    }
}

impl ImpactReport {
    fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[Target]: {} ({})", self.name, self.kind);
        let _ = writeln!(out, "[Location]: {} (line {})", self.filepath, self.line);
        let _ = writeln!(out);
        let _ = writeln!(out, "[Dependency Graph Analysis]");
        let _ = writeln!(
            out,
            "1. Downstream (calls, depth {}): {}",
            self.depth,
            join_or_none(&self.downstream)
        );
        let _ = write!(
            out,
            "2. Upstream (called by): {}",
            join_or_none(&self.upstream)
        );
        out
    }
}

fn join_or_none(names: &BTreeSet<String>) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Runs impact queries under the graph read lock
#[derive(Clone)]
pub struct ImpactQueryEngine {
    state: AppState,
}

impl ImpactQueryEngine {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Clamp a requested depth into `1..=max_depth`, using the configured
    /// default when none is given
    pub fn effective_depth(&self, depth: Option<u32>) -> u32 {
        let config = &self.state.config;
        depth
            .unwrap_or(config.default_depth)
            .clamp(1, config.max_depth.max(1))
    }

    /// Look up `name` and collect its callees (up to `depth` hops) and direct
    /// callers. Store failures propagate as errors, never as an empty report.
    pub async fn query_impact(&self, name: &str, depth: Option<u32>) -> Result<ImpactOutcome> {
        let depth = self.effective_depth(depth);
        let _guard = self.state.graph_lock.read().await;
        let store = self.state.store.as_ref();

        let Some(entity) = store.find_entity(name).await? else {
            tracing::debug!("Impact query for unknown entity '{}'", name);
            return Ok(ImpactOutcome::NotFound {
                name: name.to_string(),
            });
        };

        let downstream = store.get_callees(&entity.name, depth).await?;
        let upstream = store.get_callers(&entity.name).await?;

        tracing::debug!(
            "Impact of {}: {} downstream (depth {}), {} upstream",
            entity.name,
            downstream.len(),
            depth,
            upstream.len()
        );

        Ok(ImpactOutcome::Found(ImpactReport {
            name: entity.name,
            kind: entity.kind,
            filepath: entity.filepath,
            line: entity.line,
            depth,
            downstream: downstream.into_iter().collect(),
            upstream: upstream.into_iter().collect(),
        }))
    }
}
