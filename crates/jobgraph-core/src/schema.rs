//! Load schema: how source columns map onto graph nodes and relationships.
//!
//! Node specs are listed in materialization order, relationship specs in
//! wiring order. Every node is keyed by an integer `id` property.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coerce::{coerce, coerce_identity};
use crate::error::CoercionError;
use crate::types::{EdgeRow, NodeLabel, NodeRow, Properties, Record, RelType};

/// Identity property shared by every label.
pub const ID_PROPERTY: &str = "id";

/// Semantic type a raw cell is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Integer,
    Float,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
        })
    }
}

/// A source column copied onto a graph property of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub column: &'static str,
    pub kind: FieldKind,
}

const fn text(column: &'static str) -> Field {
    Field {
        column,
        kind: FieldKind::Text,
    }
}

const fn integer(column: &'static str) -> Field {
    Field {
        column,
        kind: FieldKind::Integer,
    }
}

const fn float(column: &'static str) -> Field {
    Field {
        column,
        kind: FieldKind::Float,
    }
}

// ── Nodes ─────────────────────────────────────────────────────────

/// How one entity type's source records become nodes.
#[derive(Debug, Clone, Copy)]
pub struct NodeSpec {
    pub label: NodeLabel,
    /// Source column holding the identity.
    pub key_column: &'static str,
    pub fields: &'static [Field],
}

impl NodeSpec {
    /// Coerce a source record into a node row.
    pub fn node_row(&self, record: &Record) -> Result<NodeRow, CoercionError> {
        let raw = record.get(self.key_column);
        let id = coerce_identity(self.key_column, raw)?.ok_or_else(|| {
            CoercionError::new(self.key_column, raw.unwrap_or_default(), FieldKind::Integer)
        })?;
        let properties = coerce_fields(self.fields, record)?;
        Ok(NodeRow { id, properties })
    }
}

pub static NODE_SPECS: [NodeSpec; 5] = [
    NodeSpec {
        label: NodeLabel::Company,
        key_column: "company_id",
        fields: &[
            text("name"),
            text("speciality"),
            text("description"),
            integer("company_size"),
            text("url"),
        ],
    },
    NodeSpec {
        label: NodeLabel::Employee,
        key_column: "id",
        fields: &[integer("employee_count"), integer("follower_count")],
    },
    NodeSpec {
        label: NodeLabel::Location,
        key_column: "id",
        fields: &[text("location"), text("zip_code"), text("industry")],
    },
    NodeSpec {
        label: NodeLabel::JobPosting,
        key_column: "job_id",
        fields: &[
            text("title"),
            text("description"),
            integer("views"),
            text("job_posting_url"),
            text("application_url"),
            text("application_type"),
            text("sponsored"),
            text("skills"),
            text("formatted_experience_level"),
            text("formatted_work_type"),
            text("work_type"),
            text("original_listed_time"),
            text("expiry"),
        ],
    },
    NodeSpec {
        label: NodeLabel::SalaryRange,
        key_column: "salary_id",
        fields: &[
            float("max_salary"),
            float("med_salary"),
            float("min_salary"),
            text("pay_period"),
            text("currency"),
            text("compensation_type"),
            text("benefits"),
        ],
    },
];

/// Look up the node spec for `label`.
pub fn node_spec(label: NodeLabel) -> &'static NodeSpec {
    match label {
        NodeLabel::Company => &NODE_SPECS[0],
        NodeLabel::Employee => &NODE_SPECS[1],
        NodeLabel::Location => &NODE_SPECS[2],
        NodeLabel::JobPosting => &NODE_SPECS[3],
        NodeLabel::SalaryRange => &NODE_SPECS[4],
    }
}

// ── Relationships ─────────────────────────────────────────────────

/// One end of a relationship: the label to match and the driving column
/// holding its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub label: NodeLabel,
    pub column: &'static str,
}

/// How a driving source's records become relationships.
#[derive(Debug, Clone, Copy)]
pub struct EdgeSpec {
    pub rel: RelType,
    /// Entity type whose source drives this relationship.
    pub source: NodeLabel,
    pub from: Endpoint,
    pub to: Endpoint,
    /// Attributes written only when the relationship is created.
    pub on_create: &'static [Field],
}

impl EdgeSpec {
    /// Coerce a driving record into an edge row.
    ///
    /// `Ok(None)` when either endpoint key is blank: there is nothing to
    /// match, which is not an error.
    pub fn edge_row(&self, record: &Record) -> Result<Option<EdgeRow>, CoercionError> {
        let from = coerce_identity(self.from.column, record.get(self.from.column))?;
        let to = coerce_identity(self.to.column, record.get(self.to.column))?;
        let (Some(from), Some(to)) = (from, to) else {
            return Ok(None);
        };
        let on_create = coerce_fields(self.on_create, record)?;
        Ok(Some(EdgeRow {
            from,
            to,
            on_create,
        }))
    }
}

pub static EDGE_SPECS: [EdgeSpec; 4] = [
    EdgeSpec {
        rel: RelType::Has,
        source: NodeLabel::JobPosting,
        from: Endpoint {
            label: NodeLabel::JobPosting,
            column: "job_id",
        },
        to: Endpoint {
            label: NodeLabel::SalaryRange,
            column: "salary_id",
        },
        on_create: &[],
    },
    EdgeSpec {
        rel: RelType::LocatedIn,
        source: NodeLabel::JobPosting,
        from: Endpoint {
            label: NodeLabel::JobPosting,
            column: "job_id",
        },
        to: Endpoint {
            label: NodeLabel::Location,
            column: "location_id",
        },
        on_create: &[],
    },
    EdgeSpec {
        rel: RelType::Publishes,
        source: NodeLabel::JobPosting,
        from: Endpoint {
            label: NodeLabel::Company,
            column: "company_id",
        },
        to: Endpoint {
            label: NodeLabel::JobPosting,
            column: "job_id",
        },
        on_create: &[text("original_listed_time"), text("expiry")],
    },
    EdgeSpec {
        rel: RelType::Hires,
        source: NodeLabel::Employee,
        from: Endpoint {
            label: NodeLabel::Company,
            column: "company_id",
        },
        to: Endpoint {
            label: NodeLabel::Employee,
            column: "id",
        },
        on_create: &[text("time_recorded")],
    },
];

fn coerce_fields(fields: &[Field], record: &Record) -> Result<Properties, CoercionError> {
    fields
        .iter()
        .map(|f| Ok((f.column.to_string(), coerce(f.column, record.get(f.column), f.kind)?)))
        .collect()
}
