//! Neo4j-backed graph store.

use async_trait::async_trait;

use jobgraph_core::{EdgeRow, EdgeSpec, NodeLabel, NodeRow, RelType};
use jobgraph_graph::{GraphClient, GraphSession};

use crate::error::StoreError;
use crate::store::{GraphStore, GraphSummary, StoreSession};

/// Graph store writing through a pooled Neo4j client.
#[derive(Clone)]
pub struct Neo4jStore {
    client: GraphClient,
}

impl Neo4jStore {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }
}

/// One Neo4j transaction spanning a load phase.
pub struct Neo4jSession {
    inner: GraphSession,
}

#[async_trait]
impl GraphStore for Neo4jStore {
    type Session = Neo4jSession;

    async fn ensure_unique_constraint(&self, label: NodeLabel) -> Result<(), StoreError> {
        Ok(self.client.ensure_unique_constraint(label).await?)
    }

    async fn open_session(&self) -> Result<Neo4jSession, StoreError> {
        let inner = self.client.open_session().await?;
        Ok(Neo4jSession { inner })
    }

    async fn summary(&self) -> Result<GraphSummary, StoreError> {
        let mut summary = GraphSummary::default();
        for label in NodeLabel::ALL {
            let count = self.client.count_nodes(label).await?;
            summary.nodes.insert(label, count.max(0) as u64);
        }
        for rel in RelType::ALL {
            let count = self.client.count_relationships(rel).await?;
            summary.relationships.insert(rel, count.max(0) as u64);
        }
        Ok(summary)
    }
}

#[async_trait]
impl StoreSession for Neo4jSession {
    async fn upsert_nodes(
        &mut self,
        label: NodeLabel,
        rows: &[NodeRow],
    ) -> Result<(), StoreError> {
        Ok(self.inner.merge_nodes(label, rows).await?)
    }

    async fn upsert_edges(
        &mut self,
        spec: &EdgeSpec,
        rows: &[EdgeRow],
    ) -> Result<u64, StoreError> {
        let matched = self.inner.merge_edges(spec, rows).await?;
        Ok(matched.max(0) as u64)
    }

    async fn commit(self) -> Result<(), StoreError> {
        Ok(self.inner.commit().await?)
    }
}
