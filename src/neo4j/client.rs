//! Neo4j client for interacting with the code graph

use super::models::*;
use crate::error::{GraphError, Result};
use neo4rs::{query, Graph, Query};
use std::sync::Arc;

/// Label shared by every node this crate writes; scopes `clear()` and lookups
pub const ENTITY_LABEL: &str = "CodeEntity";

/// Client for Neo4j operations
pub struct Neo4jClient {
    graph: Arc<Graph>,
}

impl Neo4jClient {
    /// Create a new Neo4j client
    pub async fn new(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password)
            .await
            .map_err(|e| GraphError::StoreUnavailable(format!("connect to {uri}: {e}")))?;

        let client = Self {
            graph: Arc::new(graph),
        };

        client.init_schema().await;

        Ok(client)
    }

    /// Create the name index used by every lookup
    async fn init_schema(&self) {
        let indexes = [
            "CREATE INDEX code_entity_name IF NOT EXISTS FOR (e:CodeEntity) ON (e.name)",
            "CREATE INDEX code_entity_kind IF NOT EXISTS FOR (e:CodeEntity) ON (e.kind)",
        ];

        for index in indexes {
            if let Err(e) = self.graph.run(query(index)).await {
                tracing::warn!("Index may already exist: {}", e);
            }
        }
    }

    /// Execute a parameterized Cypher query and collect its rows
    async fn execute_with_params(&self, q: Query) -> Result<Vec<neo4rs::Row>> {
        let mut result = self.graph.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = result.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Collect the `name` column of every row
    async fn collect_names(&self, q: Query) -> Result<Vec<String>> {
        let rows = self.execute_with_params(q).await?;
        let mut names = Vec::with_capacity(rows.len());
        for row in rows {
            names.push(row.get::<String>("name")?);
        }
        Ok(names)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Delete every code entity together with its relationships
    pub async fn clear(&self) -> Result<()> {
        let q = query(&format!("MATCH (n:{ENTITY_LABEL}) DETACH DELETE n"));
        self.graph.run(q).await?;
        Ok(())
    }

    /// Create or update one node per entity, keyed by (kind label, name)
    pub async fn upsert_entities(&self, entities: &[Entity]) -> Result<usize> {
        for entity in entities {
            // Labels cannot be parameters; they come from the closed EntityKind set.
            let q = query(&format!(
                r#"
                MERGE (e:{ENTITY_LABEL}:{label} {{name: $name}})
                SET e.kind = $kind,
                    e.filepath = $filepath,
                    e.line = $line
                "#,
                label = entity.kind.label()
            ))
            .param("name", entity.name.clone())
            .param("kind", entity.kind.label())
            .param("filepath", entity.filepath.clone())
            .param("line", entity.line as i64);

            self.graph.run(q).await?;
        }
        Ok(entities.len())
    }

    /// Create relationships between existing nodes; dangling ones are counted
    /// as dropped
    pub async fn upsert_relations(&self, relations: &[Relation]) -> Result<RelationWriteSummary> {
        let mut summary = RelationWriteSummary::default();

        for rel in relations {
            let q = query(&format!(
                r#"
                MATCH (src:{ENTITY_LABEL} {{name: $src}})
                MATCH (dst:{ENTITY_LABEL} {{name: $dst}})
                MERGE (src)-[:{rel_type}]->(dst)
                RETURN count(*) AS linked
                "#,
                rel_type = rel.kind.rel_type()
            ))
            .param("src", rel.src.clone())
            .param("dst", rel.dst.clone());

            let rows = self.execute_with_params(q).await?;
            let linked = match rows.first() {
                Some(row) => row.get::<i64>("linked")?,
                None => 0,
            };

            if linked > 0 {
                summary.linked += 1;
            } else {
                tracing::debug!(
                    "Dropping {} edge {} -> {}: endpoint not in graph",
                    rel.kind,
                    rel.src,
                    rel.dst
                );
                summary.dropped += 1;
            }
        }

        Ok(summary)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Look up an entity by exact name
    pub async fn find_entity(&self, name: &str) -> Result<Option<Entity>> {
        let q = query(&format!(
            r#"
            MATCH (e:{ENTITY_LABEL} {{name: $name}})
            RETURN e.name AS name, e.kind AS kind, e.filepath AS filepath, e.line AS line
            ORDER BY CASE e.kind WHEN 'Function' THEN 0 WHEN 'Method' THEN 1 ELSE 2 END
            LIMIT 1
            "#
        ))
        .param("name", name);

        let rows = self.execute_with_params(q).await?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };

        let kind_label: String = row.get("kind")?;
        let kind = EntityKind::from_label(&kind_label).ok_or_else(|| {
            GraphError::StoreResponse(format!("unknown entity kind '{kind_label}' for {name}"))
        })?;

        Ok(Some(Entity {
            name: row.get("name")?,
            kind,
            filepath: row.get("filepath")?,
            line: row.get::<i64>("line")? as u32,
        }))
    }

    /// Get callees of a function name, up to `depth` hops
    pub async fn get_callees(&self, name: &str, depth: u32) -> Result<Vec<String>> {
        let q = query(&format!(
            r#"
            MATCH (f:{ENTITY_LABEL} {{name: $name}})-[:CALLS*1..{depth}]->(callee:{ENTITY_LABEL})
            RETURN DISTINCT callee.name AS name
            ORDER BY name
            "#,
            depth = depth.max(1)
        ))
        .param("name", name);

        self.collect_names(q).await
    }

    /// Get direct callers of a function name
    pub async fn get_callers(&self, name: &str) -> Result<Vec<String>> {
        let q = query(&format!(
            r#"
            MATCH (caller:{ENTITY_LABEL})-[:CALLS]->(f:{ENTITY_LABEL} {{name: $name}})
            RETURN DISTINCT caller.name AS name
            ORDER BY name
            "#
        ))
        .param("name", name);

        self.collect_names(q).await
    }

    /// Count entities and relationships by type
    pub async fn graph_stats(&self) -> Result<GraphStats> {
        let mut stats = GraphStats::default();

        let rows = self
            .execute_with_params(query(&format!(
                "MATCH (n:{ENTITY_LABEL}) RETURN count(n) AS count"
            )))
            .await?;
        if let Some(row) = rows.first() {
            stats.entities = row.get::<i64>("count")? as usize;
        }

        let rows = self
            .execute_with_params(query(&format!(
                r#"
                MATCH (:{ENTITY_LABEL})-[r]->(:{ENTITY_LABEL})
                RETURN type(r) AS rel_type, count(r) AS count
                "#
            )))
            .await?;
        for row in rows {
            let rel_type: String = row.get("rel_type")?;
            let count = row.get::<i64>("count")? as usize;
            match RelationKind::from_rel_type(&rel_type) {
                Some(kind) => stats.add_relations(kind, count),
                None => tracing::debug!("Ignoring foreign relationship type {}", rel_type),
            }
        }

        Ok(stats)
    }
}
