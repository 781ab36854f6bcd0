//! jobgraph-graph: Neo4j client for the job-market graph.
//!
//! All graph reads and writes flow through this crate. Writes are
//! idempotent MERGE statements keyed by the integer `id` property and run
//! inside a phase-scoped [`GraphSession`]; schema statements auto-commit.

pub mod client;
pub mod mutations;
pub mod queries;

pub use client::{GraphClient, GraphConfig, GraphError, GraphSession};
