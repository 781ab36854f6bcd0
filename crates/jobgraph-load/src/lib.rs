//! jobgraph-load: Idempotent loader for the job-market graph.
//!
//! Reads one CSV source per entity type and materializes it into the graph
//! in strictly ordered phases: uniqueness constraints, then nodes, then
//! relationships. Every write is an upsert keyed by identity, so a failed
//! run can simply be started again from the beginning.

pub mod error;
pub mod loader;
pub mod memory;
pub mod neo4j_store;
pub mod report;
pub mod retry;
pub mod source;
pub mod store;

pub use error::{LoadError, SourceError, StoreError};
pub use loader::GraphLoader;
pub use memory::MemoryGraph;
pub use neo4j_store::Neo4jStore;
pub use report::{LoadReport, PhaseReport};
pub use retry::RetryPolicy;
pub use store::{GraphStore, GraphSummary, StoreSession};
