//! Structured-document (JSON) connector.
//!
//! Loads a JSON document whole and optionally extracts a subtree with a
//! restricted path expression. There is no streaming or partial-load mode;
//! documents handled here are assumed to fit in memory.
//!
//! Path grammar, evaluated left to right against the root:
//!
//! | Segment | Meaning |
//! |---------|---------|
//! | `field` | object member access |
//! | `field[2]` | member access, then array index |
//! | `*` | object becomes the ordered array of its values; arrays pass through |
//!
//! A leading `$` or `$.` names the root and is skipped. A segment that
//! misses (absent field, out-of-range index, wrong shape) makes the whole
//! path evaluate to "undefined", never to an error. That silent-miss policy
//! can mask caller typos, and it is preserved on purpose; a strict variant
//! belongs next to this one, not in place of it.

use serde_json::Value;

use crate::error::GatewayError;
use crate::registry::{DataSourceDescriptor, SourceKind};

/// Load the descriptor's document and evaluate an optional path expression.
///
/// With no expression the whole parsed document comes back. A path miss
/// yields `Value::Null` on the wire.
pub fn read_document(
    descriptor: &DataSourceDescriptor,
    path_expr: Option<&str>,
) -> Result<Value, GatewayError> {
    descriptor.expect_kind(SourceKind::StructuredDocument)?;
    let path = descriptor.path()?;

    let content = std::fs::read_to_string(path)
        .map_err(|e| GatewayError::Connector(format!("failed to read {path}: {e}")))?;
    let document: Value = serde_json::from_str(&content)
        .map_err(|e| GatewayError::Connector(format!("invalid JSON in {path}: {e}")))?;

    Ok(match path_expr {
        Some(expr) => eval_path(&document, expr).unwrap_or(Value::Null),
        None => document,
    })
}

/// Evaluate a path expression against a document root.
///
/// Returns `None` when any segment misses.
pub fn eval_path(root: &Value, expr: &str) -> Option<Value> {
    let trimmed = expr.strip_prefix('$').unwrap_or(expr);
    let trimmed = trimmed.strip_prefix('.').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Some(root.clone());
    }

    let mut current = root.clone();
    for segment in trimmed.split('.') {
        current = apply_segment(&current, segment)?;
    }
    Some(current)
}

fn apply_segment(value: &Value, segment: &str) -> Option<Value> {
    if segment == "*" {
        return match value {
            Value::Array(_) => Some(value.clone()),
            Value::Object(map) => Some(Value::Array(map.values().cloned().collect())),
            _ => None,
        };
    }

    match parse_indexed(segment) {
        Some((field, index)) => value.get(field)?.get(index).cloned(),
        None => value.get(segment).cloned(),
    }
}

/// Split `field[3]` into `("field", 3)`. Anything that does not match the
/// bracket form is treated as a plain field name.
fn parse_indexed(segment: &str) -> Option<(&str, usize)> {
    let rest = segment.strip_suffix(']')?;
    let open = rest.find('[')?;
    let index: usize = rest[open + 1..].parse().ok()?;
    Some((&rest[..open], index))
}

// ═══════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc() -> Value {
        json!({
            "a": { "b": [10, 20] },
            "users": [
                { "name": "ada", "tags": ["ops"] },
                { "name": "grace" }
            ],
            "meta": { "version": 3, "active": true }
        })
    }

    #[test]
    fn field_and_index_access() {
        assert_eq!(eval_path(&doc(), "$.a.b[0]"), Some(json!(10)));
        assert_eq!(eval_path(&doc(), "a.b[1]"), Some(json!(20)));
        assert_eq!(eval_path(&doc(), "$.users[1].name"), Some(json!("grace")));
    }

    #[test]
    fn missing_segments_are_silent() {
        assert_eq!(eval_path(&doc(), "$.missing.x"), None);
        assert_eq!(eval_path(&doc(), "$.a.b[7]"), None);
        assert_eq!(eval_path(&doc(), "$.users[0].name.deeper"), None);
    }

    #[test]
    fn root_expressions() {
        assert_eq!(eval_path(&doc(), "$"), Some(doc()));
        assert_eq!(eval_path(&doc(), "$."), Some(doc()));
    }

    #[test]
    fn wildcard_expands_objects_in_document_order() {
        assert_eq!(
            eval_path(&doc(), "$.meta.*"),
            Some(json!([3, true]))
        );
    }

    #[test]
    fn wildcard_passes_arrays_through() {
        assert_eq!(
            eval_path(&doc(), "$.a.b.*"),
            Some(json!([10, 20]))
        );
    }

    #[test]
    fn wildcard_on_scalar_misses() {
        assert_eq!(eval_path(&doc(), "$.meta.version.*"), None);
    }

    #[test]
    fn malformed_bracket_segment_is_a_plain_field() {
        // "b[x]" is not a valid indexed segment, so it is looked up as a
        // literal field name and misses.
        assert_eq!(eval_path(&doc(), "$.a.b[x]"), None);
    }
}
