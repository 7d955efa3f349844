//! In-memory mock implementation of GraphStore for testing.
//!
//! Mirrors the Neo4j semantics (MERGE keyed by kind + name, endpoint guard on
//! edges, set-based dedup) using `tokio::sync::RwLock` collections.
//! Conditionally compiled with `#[cfg(test)]`.

use crate::error::{GraphError, Result};
use crate::neo4j::models::*;
use crate::neo4j::traits::GraphStore;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// In-memory mock implementation of GraphStore for testing.
#[derive(Default)]
pub struct MockGraphStore {
    pub entities: RwLock<HashMap<(EntityKind, String), Entity>>,
    pub relations: RwLock<HashSet<Relation>>,
    /// When set, every call fails with `StoreUnavailable`
    pub unavailable: AtomicBool,
    /// Number of `clear()` calls observed
    pub clear_calls: RwLock<usize>,
}

impl MockGraphStore {
    /// Create a new empty MockGraphStore.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a lost connection.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GraphError::StoreUnavailable("mock store offline".into()));
        }
        Ok(())
    }

    /// All stored edges of one kind, sorted as (src, dst)
    pub async fn edges(&self, kind: RelationKind) -> Vec<(String, String)> {
        let mut edges: Vec<(String, String)> = self
            .relations
            .read()
            .await
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| (r.src.clone(), r.dst.clone()))
            .collect();
        edges.sort();
        edges
    }

    /// Whether any stored edge touches `name`
    pub async fn references(&self, name: &str) -> bool {
        self.relations
            .read()
            .await
            .iter()
            .any(|r| r.src == name || r.dst == name)
    }

    async fn name_exists(&self, name: &str) -> bool {
        self.entities.read().await.keys().any(|(_, n)| n == name)
    }
}

#[async_trait]
impl GraphStore for MockGraphStore {
    async fn clear(&self) -> Result<()> {
        self.check_available()?;
        self.entities.write().await.clear();
        self.relations.write().await.clear();
        *self.clear_calls.write().await += 1;
        Ok(())
    }

    async fn upsert_entities(&self, entities: &[Entity]) -> Result<usize> {
        self.check_available()?;
        let mut store = self.entities.write().await;
        for entity in entities {
            store.insert((entity.kind, entity.name.clone()), entity.clone());
        }
        Ok(entities.len())
    }

    async fn upsert_relations(&self, relations: &[Relation]) -> Result<RelationWriteSummary> {
        self.check_available()?;
        let mut summary = RelationWriteSummary::default();
        for rel in relations {
            if self.name_exists(&rel.src).await && self.name_exists(&rel.dst).await {
                self.relations.write().await.insert(rel.clone());
                summary.linked += 1;
            } else {
                summary.dropped += 1;
            }
        }
        Ok(summary)
    }

    async fn find_entity(&self, name: &str) -> Result<Option<Entity>> {
        self.check_available()?;
        Ok(self
            .entities
            .read()
            .await
            .values()
            .filter(|e| e.name == name)
            .min_by_key(|e| e.kind.lookup_rank())
            .cloned())
    }

    async fn get_callees(&self, name: &str, depth: u32) -> Result<Vec<String>> {
        self.check_available()?;
        let relations = self.relations.read().await;
        let mut outbound: HashMap<&str, Vec<&str>> = HashMap::new();
        for rel in relations.iter().filter(|r| r.kind == RelationKind::Calls) {
            outbound.entry(rel.src.as_str()).or_default().push(rel.dst.as_str());
        }

        let mut reached = BTreeSet::new();
        let mut visited = HashSet::from([name]);
        let mut queue = VecDeque::from([(name, 0u32)]);
        while let Some((current, hops)) = queue.pop_front() {
            if hops >= depth.max(1) {
                continue;
            }
            for &next in outbound.get(current).into_iter().flatten() {
                reached.insert(next.to_string());
                if visited.insert(next) {
                    queue.push_back((next, hops + 1));
                }
            }
        }
        Ok(reached.into_iter().collect())
    }

    async fn get_callers(&self, name: &str) -> Result<Vec<String>> {
        self.check_available()?;
        let callers: BTreeSet<String> = self
            .relations
            .read()
            .await
            .iter()
            .filter(|r| r.kind == RelationKind::Calls && r.dst == name)
            .map(|r| r.src.clone())
            .collect();
        Ok(callers.into_iter().collect())
    }

    async fn graph_stats(&self) -> Result<GraphStats> {
        self.check_available()?;
        let mut stats = GraphStats {
            entities: self.entities.read().await.len(),
            ..Default::default()
        };
        for rel in self.relations.read().await.iter() {
            stats.add_relations(rel.kind, 1);
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str, kind: EntityKind, filepath: &str, line: u32) -> Entity {
        Entity {
            name: name.into(),
            kind,
            filepath: filepath.into(),
            line,
        }
    }

    #[tokio::test]
    async fn test_upsert_overwrites_location() {
        let store = MockGraphStore::new();
        store
            .upsert_entities(&[entity("run", EntityKind::Function, "a.py", 1)])
            .await
            .unwrap();
        store
            .upsert_entities(&[entity("run", EntityKind::Function, "b.py", 9)])
            .await
            .unwrap();

        let found = store.find_entity("run").await.unwrap().unwrap();
        assert_eq!(found.filepath, "b.py");
        assert_eq!(found.line, 9);
        assert_eq!(store.graph_stats().await.unwrap().entities, 1);
    }

    #[tokio::test]
    async fn test_relation_guard_and_dedup() {
        let store = MockGraphStore::new();
        store
            .upsert_entities(&[
                entity("a", EntityKind::Function, "m.py", 1),
                entity("b", EntityKind::Function, "m.py", 2),
            ])
            .await
            .unwrap();

        let summary = store
            .upsert_relations(&[
                Relation::new("a", "b", RelationKind::Calls),
                Relation::new("a", "b", RelationKind::Calls),
                Relation::new("a", "print", RelationKind::Calls),
            ])
            .await
            .unwrap();

        assert_eq!(summary.linked, 2);
        assert_eq!(summary.dropped, 1);
        assert_eq!(store.edges(RelationKind::Calls).await.len(), 1);
        assert!(!store.references("print").await);
    }

    #[tokio::test]
    async fn test_callees_respect_depth() {
        let store = MockGraphStore::new();
        store
            .upsert_entities(&[
                entity("a", EntityKind::Function, "m.py", 1),
                entity("b", EntityKind::Function, "m.py", 2),
                entity("c", EntityKind::Function, "m.py", 3),
            ])
            .await
            .unwrap();
        store
            .upsert_relations(&[
                Relation::new("a", "b", RelationKind::Calls),
                Relation::new("b", "c", RelationKind::Calls),
            ])
            .await
            .unwrap();

        assert_eq!(store.get_callees("a", 1).await.unwrap(), vec!["b"]);
        assert_eq!(store.get_callees("a", 2).await.unwrap(), vec!["b", "c"]);
        assert_eq!(store.get_callers("c").await.unwrap(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_unavailable_store_errors() {
        let store = MockGraphStore::new();
        store.set_unavailable(true);
        let err = store.clear().await.unwrap_err();
        assert!(matches!(err, GraphError::StoreUnavailable(_)));
    }
}
