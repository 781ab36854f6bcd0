//! In-process graph store with the same MERGE semantics as Neo4j.
//!
//! Used for `--dry-run` loads and by the test-suite. A session works on a
//! private copy of the graph taken when it opens and publishes that copy on
//! commit; phases run one at a time, so there is no concurrent writer to
//! reconcile with.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use jobgraph_core::{EdgeRow, EdgeSpec, NodeLabel, NodeRow, Properties, RelType};

use crate::error::StoreError;
use crate::store::{GraphStore, GraphSummary, StoreSession};

#[derive(Debug, Clone, Default)]
struct GraphState {
    constraints: BTreeSet<NodeLabel>,
    /// Constraints created outside the loader under another name.
    foreign_constraints: BTreeSet<NodeLabel>,
    nodes: BTreeMap<(NodeLabel, i64), Properties>,
    edges: BTreeMap<(RelType, i64, i64), Properties>,
}

/// Shared handle to an in-memory graph. Clones see the same graph.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    state: Arc<Mutex<GraphState>>,
    outages: Arc<AtomicU32>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` constraint requests or session acquisitions
    /// fail as if the store were unreachable.
    pub fn fail_next_requests(&self, count: u32) {
        self.outages.store(count, Ordering::SeqCst);
    }

    /// Install a uniqueness constraint on `label` the way another tool
    /// would: later requests for it are refused as an equivalent rule.
    pub fn add_foreign_constraint(&self, label: NodeLabel) {
        let mut state = self.lock();
        state.constraints.insert(label);
        state.foreign_constraints.insert(label);
    }

    /// Properties of the `label` node with identity `id`.
    pub fn node(&self, label: NodeLabel, id: i64) -> Option<Properties> {
        self.lock().nodes.get(&(label, id)).cloned()
    }

    /// Properties of the `rel` relationship between two identities.
    pub fn relationship(&self, rel: RelType, from: i64, to: i64) -> Option<Properties> {
        self.lock().edges.get(&(rel, from, to)).cloned()
    }

    pub fn node_count(&self, label: NodeLabel) -> usize {
        self.lock().nodes.keys().filter(|(l, _)| *l == label).count()
    }

    pub fn relationship_count(&self, rel: RelType) -> usize {
        self.lock().edges.keys().filter(|(r, _, _)| *r == rel).count()
    }

    /// Number of uniqueness constraints on `label` (0 or 1).
    pub fn constraint_count(&self, label: NodeLabel) -> usize {
        usize::from(self.lock().constraints.contains(&label))
    }

    fn lock(&self) -> MutexGuard<'_, GraphState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        let outage = self
            .outages
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if outage {
            return Err(StoreError::Unavailable(
                "in-memory graph: simulated outage".to_string(),
            ));
        }
        Ok(())
    }
}

/// A session over a private working copy of the graph.
pub struct MemorySession {
    graph: MemoryGraph,
    working: GraphState,
}

#[async_trait]
impl GraphStore for MemoryGraph {
    type Session = MemorySession;

    async fn ensure_unique_constraint(&self, label: NodeLabel) -> Result<(), StoreError> {
        self.check_available()?;
        let mut state = self.lock();
        if state.foreign_constraints.contains(&label) {
            return Err(StoreError::ConstraintExists(format!(
                "equivalent uniqueness constraint on {label}.id"
            )));
        }
        state.constraints.insert(label);
        Ok(())
    }

    async fn open_session(&self) -> Result<MemorySession, StoreError> {
        self.check_available()?;
        Ok(MemorySession {
            graph: self.clone(),
            working: self.lock().clone(),
        })
    }

    async fn summary(&self) -> Result<GraphSummary, StoreError> {
        let state = self.lock();
        let mut summary = GraphSummary::default();
        for label in NodeLabel::ALL {
            summary.nodes.insert(label, 0);
        }
        for rel in RelType::ALL {
            summary.relationships.insert(rel, 0);
        }
        for (label, _) in state.nodes.keys() {
            *summary.nodes.entry(*label).or_default() += 1;
        }
        for (rel, _, _) in state.edges.keys() {
            *summary.relationships.entry(*rel).or_default() += 1;
        }
        Ok(summary)
    }
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn upsert_nodes(
        &mut self,
        label: NodeLabel,
        rows: &[NodeRow],
    ) -> Result<(), StoreError> {
        if !self.working.constraints.contains(&label) {
            return Err(StoreError::Rejected(format!(
                "no uniqueness constraint on {label}.id"
            )));
        }
        for row in rows {
            let node = self.working.nodes.entry((label, row.id)).or_default();
            apply(node, &row.properties);
        }
        Ok(())
    }

    async fn upsert_edges(
        &mut self,
        spec: &EdgeSpec,
        rows: &[EdgeRow],
    ) -> Result<u64, StoreError> {
        let mut matched = 0;
        for row in rows {
            let from_exists = self.working.nodes.contains_key(&(spec.from.label, row.from));
            let to_exists = self.working.nodes.contains_key(&(spec.to.label, row.to));
            if !(from_exists && to_exists) {
                continue;
            }
            matched += 1;
            self.working
                .edges
                .entry((spec.rel, row.from, row.to))
                .or_insert_with(|| {
                    let mut props = Properties::new();
                    apply(&mut props, &row.on_create);
                    props
                });
        }
        Ok(matched)
    }

    async fn commit(self) -> Result<(), StoreError> {
        *self.graph.lock() = self.working;
        Ok(())
    }
}

/// `SET target += patch`: nulls remove, everything else overwrites.
fn apply(target: &mut Properties, patch: &Properties) {
    for (key, value) in patch {
        if value.is_null() {
            target.remove(key);
        } else {
            target.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobgraph_core::{Value, EDGE_SPECS};

    fn props(pairs: &[(&str, Value)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn spec(rel: RelType) -> &'static EdgeSpec {
        EDGE_SPECS.iter().find(|s| s.rel == rel).unwrap()
    }

    fn company(id: i64) -> NodeRow {
        NodeRow {
            id,
            properties: Properties::new(),
        }
    }

    #[tokio::test]
    async fn test_nodes_require_constraint() {
        let graph = MemoryGraph::new();
        let mut session = graph.open_session().await.unwrap();
        let err = session
            .upsert_nodes(NodeLabel::Company, &[company(1)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_uncommitted_session_is_discarded() {
        let graph = MemoryGraph::new();
        graph
            .ensure_unique_constraint(NodeLabel::Company)
            .await
            .unwrap();
        {
            let mut session = graph.open_session().await.unwrap();
            session
                .upsert_nodes(NodeLabel::Company, &[company(1)])
                .await
                .unwrap();
        }
        assert_eq!(graph.constraint_count(NodeLabel::Company), 1);
        assert_eq!(graph.node_count(NodeLabel::Company), 0);
    }

    #[tokio::test]
    async fn test_foreign_constraint_is_reported_as_existing() {
        let graph = MemoryGraph::new();
        graph.add_foreign_constraint(NodeLabel::Company);

        let err = graph
            .ensure_unique_constraint(NodeLabel::Company)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintExists(_)));
        assert_eq!(graph.constraint_count(NodeLabel::Company), 1);
        graph
            .ensure_unique_constraint(NodeLabel::Employee)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_null_removes_property_on_overwrite() {
        let graph = MemoryGraph::new();
        graph
            .ensure_unique_constraint(NodeLabel::Company)
            .await
            .unwrap();
        let mut session = graph.open_session().await.unwrap();
        for url in [Value::from("acme.example"), Value::Null] {
            session
                .upsert_nodes(
                    NodeLabel::Company,
                    &[NodeRow {
                        id: 1,
                        properties: props(&[("name", Value::from("Acme")), ("url", url)]),
                    }],
                )
                .await
                .unwrap();
        }
        session.commit().await.unwrap();

        let node = graph.node(NodeLabel::Company, 1).unwrap();
        assert_eq!(node.get("name"), Some(&Value::from("Acme")));
        assert!(!node.contains_key("url"));
    }

    #[tokio::test]
    async fn test_edges_need_both_endpoints() {
        let graph = MemoryGraph::new();
        graph
            .ensure_unique_constraint(NodeLabel::Company)
            .await
            .unwrap();
        let mut session = graph.open_session().await.unwrap();
        session
            .upsert_nodes(NodeLabel::Company, &[company(1)])
            .await
            .unwrap();
        let matched = session
            .upsert_edges(
                spec(RelType::Hires),
                &[EdgeRow {
                    from: 1,
                    to: 2,
                    on_create: Properties::new(),
                }],
            )
            .await
            .unwrap();
        session.commit().await.unwrap();

        assert_eq!(matched, 0);
        assert_eq!(graph.relationship_count(RelType::Hires), 0);
    }

    #[tokio::test]
    async fn test_simulated_outage_is_consumed() {
        let graph = MemoryGraph::new();
        graph.fail_next_requests(2);
        assert!(matches!(
            graph.ensure_unique_constraint(NodeLabel::Company).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            graph.open_session().await.err(),
            Some(StoreError::Unavailable(_))
        ));
        assert!(graph.open_session().await.is_ok());
        assert_eq!(graph.constraint_count(NodeLabel::Company), 0);
    }

    #[tokio::test]
    async fn test_summary_lists_every_label() {
        let graph = MemoryGraph::new();
        let summary = graph.summary().await.unwrap();
        assert_eq!(summary.nodes.len(), 5);
        assert_eq!(summary.relationships.len(), 4);
        assert!(summary.nodes.values().all(|n| *n == 0));
    }
}
