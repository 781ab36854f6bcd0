use thiserror::Error;

use crate::schema::FieldKind;

/// Top-level error type for shared loader plumbing.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// A single record field could not be converted to its declared kind.
///
/// Scoped to one record: the loader skips the record and keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("column `{column}`: cannot convert {value:?} to {kind}")]
pub struct CoercionError {
    pub column: String,
    pub value: String,
    pub kind: FieldKind,
}

impl CoercionError {
    pub fn new(column: &str, value: &str, kind: FieldKind) -> Self {
        Self {
            column: column.to_string(),
            value: value.to_string(),
            kind,
        }
    }
}
