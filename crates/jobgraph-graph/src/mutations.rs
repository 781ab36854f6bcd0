//! Write operations for the job-market graph.
//!
//! All mutations use MERGE (upsert) semantics so a load can be re-run from
//! the start at any time. Nodes are identified by (label, id); a
//! relationship by its type and both endpoints.

use neo4rs::{query, BoltList, BoltMap, BoltNull, BoltString, BoltType};

use jobgraph_core::schema::{EdgeSpec, ID_PROPERTY};
use jobgraph_core::{EdgeRow, NodeLabel, NodeRow, Properties, Value};

use crate::client::{GraphClient, GraphError, GraphSession};

impl GraphClient {
    // ── Schema ───────────────────────────────────────────────────

    /// Create the uniqueness constraint on `id` for `label`.
    ///
    /// Runs as its own auto-commit statement, outside any session. A no-op
    /// when the constraint already exists; an equivalent rule the server
    /// reports instead is recognised by [`GraphError::is_constraint_conflict`].
    pub async fn ensure_unique_constraint(&self, label: NodeLabel) -> Result<(), GraphError> {
        self.run(query(&unique_constraint_cypher(label))).await?;
        tracing::debug!(%label, "Uniqueness constraint ensured");
        Ok(())
    }
}

impl GraphSession {
    // ── Node Upserts ─────────────────────────────────────────────

    /// Upsert a batch of nodes, overwriting descriptive attributes.
    pub async fn merge_nodes(
        &mut self,
        label: NodeLabel,
        rows: &[NodeRow],
    ) -> Result<(), GraphError> {
        if rows.is_empty() {
            return Ok(());
        }

        let mut batch = BoltList::new();
        for row in rows {
            let mut entry = BoltMap::new();
            entry.put(BoltString::from("id"), BoltType::from(row.id));
            entry.put(BoltString::from("props"), props_to_bolt(&row.properties));
            batch.push(BoltType::Map(entry));
        }

        let q = query(&merge_nodes_cypher(label)).param("rows", BoltType::List(batch));
        self.run(q).await
    }

    // ── Edge Upserts ─────────────────────────────────────────────

    /// Upsert a batch of relationships.
    ///
    /// Rows whose endpoints are not both present are dropped by the MATCH.
    /// Returns how many rows matched both endpoints.
    pub async fn merge_edges(
        &mut self,
        spec: &EdgeSpec,
        rows: &[EdgeRow],
    ) -> Result<i64, GraphError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut batch = BoltList::new();
        for row in rows {
            let mut entry = BoltMap::new();
            entry.put(BoltString::from("from"), BoltType::from(row.from));
            entry.put(BoltString::from("to"), BoltType::from(row.to));
            entry.put(BoltString::from("props"), props_to_bolt(&row.on_create));
            batch.push(BoltType::Map(entry));
        }

        let q = query(&merge_edges_cypher(spec)).param("rows", BoltType::List(batch));
        self.query_sum(q, "matched").await
    }
}

// ── Cypher ───────────────────────────────────────────────────────

fn unique_constraint_cypher(label: NodeLabel) -> String {
    format!("CREATE CONSTRAINT IF NOT EXISTS FOR (n:`{label}`) REQUIRE n.{ID_PROPERTY} IS UNIQUE")
}

fn merge_nodes_cypher(label: NodeLabel) -> String {
    format!(
        "UNWIND $rows AS row
         MERGE (n:`{label}` {{{ID_PROPERTY}: row.id}})
         ON CREATE SET n += row.props
         ON MATCH SET n += row.props"
    )
}

fn merge_edges_cypher(spec: &EdgeSpec) -> String {
    let on_create = if spec.on_create.is_empty() {
        ""
    } else {
        "\n         ON CREATE SET r += row.props"
    };
    format!(
        "UNWIND $rows AS row
         MATCH (a:`{from}` {{{ID_PROPERTY}: row.from}})
         MATCH (b:`{to}` {{{ID_PROPERTY}: row.to}})
         MERGE (a)-[r:`{rel}`]->(b){on_create}
         RETURN count(r) AS matched",
        from = spec.from.label,
        to = spec.to.label,
        rel = spec.rel,
    )
}

// ── Helpers ──────────────────────────────────────────────────────

fn value_to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Integer(i) => BoltType::from(*i),
        Value::Float(f) => BoltType::from(*f),
        Value::Text(s) => BoltType::from(s.as_str()),
    }
}

fn props_to_bolt(props: &Properties) -> BoltType {
    let mut map = BoltMap::new();
    for (key, value) in props {
        map.put(BoltString::from(key.as_str()), value_to_bolt(value));
    }
    BoltType::Map(map)
}
