//! jobgraph-core: Shared types for the job-market graph loader.
//!
//! This crate provides the foundational pieces used across the workspace:
//! - Node labels and relationship types of the job-market graph
//! - The load schema mapping source columns to graph properties
//! - Field coercion from raw tabular text to typed property values
//! - Configuration management
//! - Common error types

pub mod coerce;
pub mod config;
pub mod error;
pub mod schema;
pub mod types;

pub use error::{CoercionError, CoreError};
pub use schema::{EdgeSpec, Field, FieldKind, NodeSpec, EDGE_SPECS, NODE_SPECS};
pub use types::{EdgeRow, NodeLabel, NodeRow, Properties, Record, RelType, Value};
