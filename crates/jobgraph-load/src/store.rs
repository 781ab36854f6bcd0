//! The narrow graph-store interface the loader is written against.
//!
//! A store hands out phase-scoped sessions. Everything a session writes
//! becomes visible on `commit`; a session dropped without committing
//! leaves the store untouched.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use jobgraph_core::{EdgeRow, EdgeSpec, NodeLabel, NodeRow, RelType};

use crate::error::StoreError;

#[async_trait]
pub trait GraphStore: Send + Sync {
    type Session: StoreSession;

    /// Create the identity uniqueness constraint for `label` unless present.
    ///
    /// Applied immediately, outside any session. Fails with
    /// [`StoreError::ConstraintExists`] when the store reports an equivalent
    /// rule instead of treating the request as a no-op.
    async fn ensure_unique_constraint(&self, label: NodeLabel) -> Result<(), StoreError>;

    /// Acquire a session for one load phase.
    async fn open_session(&self) -> Result<Self::Session, StoreError>;

    /// Node and relationship counts currently in the store.
    async fn summary(&self) -> Result<GraphSummary, StoreError>;
}

#[async_trait]
pub trait StoreSession: Send {
    /// Upsert nodes by identity, overwriting their descriptive attributes.
    async fn upsert_nodes(
        &mut self,
        label: NodeLabel,
        rows: &[NodeRow],
    ) -> Result<(), StoreError>;

    /// Upsert relationships between existing endpoints, applying the rows'
    /// attributes only on creation. Returns how many rows matched both
    /// endpoints.
    async fn upsert_edges(
        &mut self,
        spec: &EdgeSpec,
        rows: &[EdgeRow],
    ) -> Result<u64, StoreError>;

    /// Make the session's writes visible and release it.
    async fn commit(self) -> Result<(), StoreError>;
}

/// Per-label and per-type counts of a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub nodes: BTreeMap<NodeLabel, u64>,
    pub relationships: BTreeMap<RelType, u64>,
}
