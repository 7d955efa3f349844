//! GraphStore trait definition
//!
//! Defines the abstract interface for all graph operations used by ingestion
//! and impact queries. `Neo4jClient` is the production backend; the in-memory
//! `MockGraphStore` backs unit tests.

use crate::error::Result;
use crate::neo4j::models::*;
use async_trait::async_trait;

/// Abstract interface for code-graph persistence.
#[async_trait]
pub trait GraphStore: Send + Sync {
    // ========================================================================
    // Mutations
    // ========================================================================

    /// Remove every code entity and every relation between them
    async fn clear(&self) -> Result<()>;

    /// Create-or-update nodes keyed by (kind, name); `filepath` and `line`
    /// are overwritten when the node already exists. Returns the number of
    /// entities written.
    async fn upsert_entities(&self, entities: &[Entity]) -> Result<usize>;

    /// Create edges whose endpoints both exist, deduplicated by
    /// (src, dst, kind). Edges with a missing endpoint are dropped and
    /// counted, never reported as errors.
    async fn upsert_relations(&self, relations: &[Relation]) -> Result<RelationWriteSummary>;

    // ========================================================================
    // Queries
    // ========================================================================

    /// Exact, case-sensitive lookup. When several kinds share the name,
    /// Function wins over Method, Method over Class.
    async fn find_entity(&self, name: &str) -> Result<Option<Entity>>;

    /// Distinct names reachable over outbound CALLS within `depth` hops, sorted
    async fn get_callees(&self, name: &str, depth: u32) -> Result<Vec<String>>;

    /// Distinct names with a direct CALLS edge into `name`, sorted
    async fn get_callers(&self, name: &str) -> Result<Vec<String>>;

    /// Entity count and relation counts per kind
    async fn graph_stats(&self) -> Result<GraphStats>;
}
