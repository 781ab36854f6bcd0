//! Conversion of raw tabular cells into typed property values.
//!
//! Empty cells and absent columns become `Value::Null`. Numeric cells are
//! trimmed first; integers accept a finite decimal and truncate it toward
//! zero, matching Cypher's `toInteger`.

use crate::error::CoercionError;
use crate::schema::FieldKind;
use crate::types::Value;

/// Coerce one raw cell to `kind`.
pub fn coerce(column: &str, raw: Option<&str>, kind: FieldKind) -> Result<Value, CoercionError> {
    let Some(raw) = raw else {
        return Ok(Value::Null);
    };

    match kind {
        FieldKind::Text => {
            if raw.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::Text(raw.to_string()))
            }
        }
        FieldKind::Integer => match parse_integer(raw) {
            Some(Ok(i)) => Ok(Value::Integer(i)),
            Some(Err(())) => Err(CoercionError::new(column, raw, kind)),
            None => Ok(Value::Null),
        },
        FieldKind::Float => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Value::Float(f)),
                _ => Err(CoercionError::new(column, raw, kind)),
            }
        }
    }
}

/// Coerce an identity cell.
///
/// Returns `Ok(None)` for an empty or absent cell so relationship keys can
/// treat it as "no endpoint"; node identities reject that case themselves.
pub fn coerce_identity(column: &str, raw: Option<&str>) -> Result<Option<i64>, CoercionError> {
    match raw.and_then(parse_integer) {
        Some(Ok(id)) => Ok(Some(id)),
        Some(Err(())) => Err(CoercionError::new(
            column,
            raw.unwrap_or_default(),
            FieldKind::Integer,
        )),
        None => Ok(None),
    }
}

/// `None` when the cell is blank.
fn parse_integer(raw: &str) -> Option<Result<i64, ()>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Ok(i));
    }
    let parsed = match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f.abs() < i64::MAX as f64 => Ok(f.trunc() as i64),
        _ => Err(()),
    };
    Some(parsed)
}
