//! Neo4j connection management and phase-scoped sessions.

use neo4rs::{ConfigBuilder, Graph, Query, Txn};

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Fragments of driver/server messages that mean the store could not be
/// reached or asked us to try again later.
const TRANSIENT_MARKERS: &[&str] = &[
    "io error",
    "connection",
    "broken pipe",
    "reset by peer",
    "timed out",
    "unavailable",
    "transienterror",
];

/// Only an equivalent rule counts: an index or a different constraint on the
/// same property also answers "already exists" but leaves `id` unconstrained.
const CONFLICT_MARKERS: &[&str] = &["equivalentschemarulealreadyexists"];

impl GraphError {
    /// Whether the failure is worth retrying the whole load for.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Query(e) => contains_any(&e.to_string(), TRANSIENT_MARKERS),
            Self::Serialization(_) => false,
        }
    }

    /// Whether the server refused a schema rule because an equivalent one
    /// already exists.
    pub fn is_constraint_conflict(&self) -> bool {
        match self {
            Self::Query(e) => contains_any(&e.to_string(), CONFLICT_MARKERS),
            _ => false,
        }
    }
}

fn contains_any(message: &str, markers: &[&str]) -> bool {
    let lower = message.to_lowercase();
    markers.iter().any(|m| lower.contains(m))
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Target database; the server default when `None`.
    pub database: Option<String>,
    pub max_connections: u32,
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "jobgraph-dev".to_string(),
            database: None,
            max_connections: 4,
            fetch_size: 256,
        }
    }
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let mut builder = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size);
        if let Some(db) = &config.database {
            builder = builder.db(db.as_str());
        }
        let neo_config = builder
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Round-trip a trivial query to prove the server is reachable.
    pub async fn ping(&self) -> Result<(), GraphError> {
        self.query_one(neo4rs::query("RETURN 1 AS ok"))
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;
        Ok(())
    }

    /// Execute a write-only query outside any session.
    pub async fn run(&self, query: Query) -> Result<(), GraphError> {
        self.graph.run(query).await?;
        Ok(())
    }

    /// Execute a read query and return the first row, if any.
    pub async fn query_one(&self, query: Query) -> Result<Option<neo4rs::Row>, GraphError> {
        let mut stream = self.graph.execute(query).await?;
        Ok(stream.next().await?)
    }

    /// Open a session for one load phase.
    ///
    /// The session holds one pooled connection and one transaction; its
    /// writes become visible on [`GraphSession::commit`] and are discarded
    /// when it is dropped uncommitted.
    pub async fn open_session(&self) -> Result<GraphSession, GraphError> {
        let txn = self
            .graph
            .start_txn()
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;
        Ok(GraphSession { txn })
    }
}

/// A phase-scoped transaction on a pooled connection.
pub struct GraphSession {
    txn: Txn,
}

impl GraphSession {
    /// Execute a write-only statement.
    pub async fn run(&mut self, query: Query) -> Result<(), GraphError> {
        self.txn.run(query).await?;
        Ok(())
    }

    /// Execute a statement and sum an integer column over its rows.
    pub async fn query_sum(&mut self, query: Query, column: &str) -> Result<i64, GraphError> {
        let mut stream = self.txn.execute(query).await?;
        let mut total = 0;
        while let Some(row) = stream.next(self.txn.handle()).await? {
            total += row
                .get::<i64>(column)
                .map_err(|e| GraphError::Serialization(format!("{column}: {e}")))?;
        }
        Ok(total)
    }

    /// Commit the session's writes and release its connection.
    pub async fn commit(self) -> Result<(), GraphError> {
        self.txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_are_transient() {
        assert!(GraphError::Connection("refused".into()).is_transient());
        assert!(!GraphError::Serialization("bad row".into()).is_transient());
    }

    #[test]
    fn test_marker_matching_ignores_case() {
        assert!(contains_any(
            "Neo.TransientError.General.DatabaseUnavailable",
            TRANSIENT_MARKERS
        ));
        assert!(contains_any(
            "Neo.ClientError.Schema.EquivalentSchemaRuleAlreadyExists",
            CONFLICT_MARKERS
        ));
        assert!(!contains_any(
            "Neo.ClientError.Statement.SyntaxError",
            TRANSIENT_MARKERS
        ));
    }

    #[test]
    fn test_index_on_same_property_is_not_a_benign_conflict() {
        assert!(!contains_any(
            "Neo.ClientError.Schema.IndexAlreadyExists: \
             There already exists an index (:Company {id})",
            CONFLICT_MARKERS
        ));
        assert!(!contains_any(
            "Neo.ClientError.Schema.ConstraintWithNameAlreadyExists",
            CONFLICT_MARKERS
        ));
    }

    #[test]
    fn test_default_config() {
        let config = GraphConfig::default();
        assert_eq!(config.uri, "bolt://localhost:7687");
        assert!(config.database.is_none());
    }
}
