//! Error types for the jobgraph-load crate.

use jobgraph_core::NodeLabel;
use jobgraph_graph::GraphError;
use thiserror::Error;

/// Failures reported by a graph store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached; worth retrying the whole load.
    #[error("Graph store unavailable: {0}")]
    Unavailable(String),

    /// An equivalent uniqueness constraint is already in place.
    #[error("Equivalent constraint already exists: {0}")]
    ConstraintExists(String),

    /// The store refused a statement.
    #[error("Graph store rejected statement: {0}")]
    Rejected(String),
}

impl From<GraphError> for StoreError {
    fn from(e: GraphError) -> Self {
        if e.is_constraint_conflict() {
            Self::ConstraintExists(e.to_string())
        } else if e.is_transient() {
            Self::Unavailable(e.to_string())
        } else {
            Self::Rejected(e.to_string())
        }
    }
}

/// Failures reading a tabular source.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Cannot open source {location}: {source}")]
    Open {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV in {location}: {source}")]
    Csv {
        location: String,
        #[source]
        source: csv::Error,
    },
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("No source configured for {0}")]
    MissingSource(NodeLabel),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Graph store still unavailable after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<LoadError>,
    },
}

impl LoadError {
    /// Whether re-running the whole load may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(StoreError::Unavailable(_)))
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_store_is_transient() {
        assert!(LoadError::Store(StoreError::Unavailable("refused".into())).is_transient());
        assert!(!LoadError::Store(StoreError::Rejected("syntax".into())).is_transient());
        assert!(!LoadError::MissingSource(NodeLabel::Company).is_transient());
    }

    #[test]
    fn test_graph_errors_classified() {
        let err: StoreError = GraphError::Connection("refused".into()).into();
        assert!(matches!(err, StoreError::Unavailable(_)));
        let err: StoreError = GraphError::Serialization("bad".into()).into();
        assert!(matches!(err, StoreError::Rejected(_)));
    }
}
