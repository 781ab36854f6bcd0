//! Read operations used to summarise and verify a load.

use neo4rs::query;

use jobgraph_core::schema::{EdgeSpec, ID_PROPERTY};
use jobgraph_core::{NodeLabel, Properties, RelType, Value};

use crate::client::{GraphClient, GraphError};

impl GraphClient {
    // ── Counts ───────────────────────────────────────────────────

    /// Count nodes carrying `label`.
    pub async fn count_nodes(&self, label: NodeLabel) -> Result<i64, GraphError> {
        let cypher = format!("MATCH (n:`{label}`) RETURN count(n) AS cnt");
        self.count(&cypher).await
    }

    /// Count relationships of type `rel`.
    pub async fn count_relationships(&self, rel: RelType) -> Result<i64, GraphError> {
        let cypher = format!("MATCH ()-[r:`{rel}`]->() RETURN count(r) AS cnt");
        self.count(&cypher).await
    }

    /// Count uniqueness constraints on `label`'s identity property.
    pub async fn constraint_count(&self, label: NodeLabel) -> Result<i64, GraphError> {
        let q = query(
            "SHOW CONSTRAINTS YIELD type, entityType, labelsOrTypes, properties
             WHERE entityType = 'NODE' AND type CONTAINS 'UNIQUENESS'
               AND labelsOrTypes = [$label] AND properties = [$property]
             RETURN count(*) AS cnt",
        )
        .param("label", label.as_str())
        .param("property", ID_PROPERTY);

        match self.query_one(q).await? {
            Some(row) => Ok(row.get::<i64>("cnt").unwrap_or(0)),
            None => Ok(0),
        }
    }

    async fn count(&self, cypher: &str) -> Result<i64, GraphError> {
        match self.query_one(query(cypher)).await? {
            Some(row) => Ok(row.get::<i64>("cnt").unwrap_or(0)),
            None => Ok(0),
        }
    }

    // ── Property Lookups ─────────────────────────────────────────

    /// Properties of the `label` node with identity `id`, if it exists.
    pub async fn node_properties(
        &self,
        label: NodeLabel,
        id: i64,
    ) -> Result<Option<Properties>, GraphError> {
        let cypher = format!("MATCH (n:`{label}` {{{ID_PROPERTY}: $id}}) RETURN n");
        let q = query(&cypher).param("id", id);

        match self.query_one(q).await? {
            Some(row) => {
                let node: neo4rs::Node = row.get("n").map_err(|e| {
                    GraphError::Serialization(format!("Failed to deserialize node: {e}"))
                })?;
                let props = node
                    .keys()
                    .into_iter()
                    .map(|key| (key.to_string(), node_value(&node, key)))
                    .collect();
                Ok(Some(props))
            }
            None => Ok(None),
        }
    }

    /// Properties of the relationship described by `spec` between two
    /// identities, if it exists.
    pub async fn relationship_properties(
        &self,
        spec: &EdgeSpec,
        from: i64,
        to: i64,
    ) -> Result<Option<Properties>, GraphError> {
        let cypher = format!(
            "MATCH (a:`{from_label}` {{{ID_PROPERTY}: $from}})
             MATCH (b:`{to_label}` {{{ID_PROPERTY}: $to}})
             MATCH (a)-[r:`{rel}`]->(b)
             RETURN r LIMIT 1",
            from_label = spec.from.label,
            to_label = spec.to.label,
            rel = spec.rel,
        );
        let q = query(&cypher).param("from", from).param("to", to);

        match self.query_one(q).await? {
            Some(row) => {
                let rel: neo4rs::Relation = row.get("r").map_err(|e| {
                    GraphError::Serialization(format!("Failed to deserialize relation: {e}"))
                })?;
                let props = rel
                    .keys()
                    .into_iter()
                    .map(|key| (key.to_string(), relation_value(&rel, key)))
                    .collect();
                Ok(Some(props))
            }
            None => Ok(None),
        }
    }
}

// Stored properties are only ever integers, floats, or strings.

fn node_value(node: &neo4rs::Node, key: &str) -> Value {
    if let Ok(i) = node.get::<i64>(key) {
        Value::Integer(i)
    } else if let Ok(f) = node.get::<f64>(key) {
        Value::Float(f)
    } else if let Ok(s) = node.get::<String>(key) {
        Value::Text(s)
    } else {
        Value::Null
    }
}

fn relation_value(rel: &neo4rs::Relation, key: &str) -> Value {
    if let Ok(i) = rel.get::<i64>(key) {
        Value::Integer(i)
    } else if let Ok(f) = rel.get::<f64>(key) {
        Value::Float(f)
    } else if let Ok(s) = rel.get::<String>(key) {
        Value::Text(s)
    } else {
        Value::Null
    }
}
