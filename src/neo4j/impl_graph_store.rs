//! `GraphStore` implementation for `Neo4jClient`.
//!
//! Every method simply delegates to the corresponding inherent method on `Neo4jClient`.

use async_trait::async_trait;

use super::client::Neo4jClient;
use super::models::*;
use super::traits::GraphStore;
use crate::error::Result;

#[async_trait]
impl GraphStore for Neo4jClient {
    async fn clear(&self) -> Result<()> {
        self.clear().await
    }

    async fn upsert_entities(&self, entities: &[Entity]) -> Result<usize> {
        self.upsert_entities(entities).await
    }

    async fn upsert_relations(&self, relations: &[Relation]) -> Result<RelationWriteSummary> {
        self.upsert_relations(relations).await
    }

    async fn find_entity(&self, name: &str) -> Result<Option<Entity>> {
        self.find_entity(name).await
    }

    async fn get_callees(&self, name: &str, depth: u32) -> Result<Vec<String>> {
        self.get_callees(name, depth).await
    }

    async fn get_callers(&self, name: &str) -> Result<Vec<String>> {
        self.get_callers(name).await
    }

    async fn graph_stats(&self) -> Result<GraphStats> {
        self.graph_stats().await
    }
}
