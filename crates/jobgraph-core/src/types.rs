//! Core domain types for the job-market graph.
//!
//! Node labels and relationship types are closed enums; their graph names
//! are the exact strings used in Cypher, so they double as the identifiers
//! interpolated into queries.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

// ── Labels ────────────────────────────────────────────────────────

/// The label of a node in the job-market graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum NodeLabel {
    Company,
    Employee,
    Location,
    JobPosting,
    SalaryRange,
}

impl NodeLabel {
    /// Every label, in node-materialization order.
    pub const ALL: [NodeLabel; 5] = [
        NodeLabel::Company,
        NodeLabel::Employee,
        NodeLabel::Location,
        NodeLabel::JobPosting,
        NodeLabel::SalaryRange,
    ];

    /// The label as it appears in the graph.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Company => "Company",
            Self::Employee => "Employee",
            Self::Location => "Location",
            Self::JobPosting => "Job_posting",
            Self::SalaryRange => "Salary_range",
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The type of a directed relationship in the job-market graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RelType {
    /// Job_posting → Salary_range
    Has,
    /// Job_posting → Location
    LocatedIn,
    /// Company → Job_posting
    Publishes,
    /// Company → Employee
    Hires,
}

impl RelType {
    /// Every relationship type, in wiring order.
    pub const ALL: [RelType; 4] = [
        RelType::Has,
        RelType::LocatedIn,
        RelType::Publishes,
        RelType::Hires,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Has => "HAS",
            Self::LocatedIn => "LOCATED_IN",
            Self::Publishes => "PUBLISHES",
            Self::Hires => "HIRES",
        }
    }
}

impl fmt::Display for RelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Values ────────────────────────────────────────────────────────

/// A typed property value after coercion.
///
/// `Null` leaves the property unset on create and removes it on overwrite.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Property map of a node or relationship, ordered by key.
pub type Properties = BTreeMap<String, Value>;

// ── Rows ──────────────────────────────────────────────────────────

/// One node to upsert: its identity plus the descriptive attributes to set.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRow {
    pub id: i64,
    pub properties: Properties,
}

/// One relationship to upsert between two identities.
///
/// `on_create` is applied only when the relationship does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRow {
    pub from: i64,
    pub to: i64,
    pub on_create: Properties,
}

// ── Source records ────────────────────────────────────────────────

/// A header-keyed record read from a tabular source.
#[derive(Debug, Clone, Default)]
pub struct Record {
    /// 1-based position among the source's data records, for diagnostics.
    pub line: u64,
    values: HashMap<String, String>,
}

impl Record {
    pub fn new(line: u64, values: HashMap<String, String>) -> Self {
        Self { line, values }
    }

    /// Build a record from column/value pairs.
    pub fn from_pairs<'a>(line: u64, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { line, values }
    }

    /// Raw cell for `column`, `None` when the source has no such column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}
