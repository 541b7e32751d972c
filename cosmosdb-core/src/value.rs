//! Literal rendering of values in the query language.
//!
//! Filter operands are carried as [`Bson`] values. [`render`] turns one into the
//! text the query engine expects for an inline constant. Rendering never fails:
//! a value without a natural literal form degrades to a best-effort quoted text.

use bson::{Bson, ser::serialize_to_bson};
use serde::Serialize;
use serde_json::Value;

/// Literal used for null, undefined and absent values.
pub const NULL_LITERAL: &str = "null";

/// Renders a value as a query-language literal.
///
/// - Integers render as plain decimal text.
/// - Doubles render as the shortest round-trippable decimal; non-finite values render as `null`.
/// - Strings starting with `@` are parameter references and pass through verbatim,
///   other strings are single-quoted without escaping.
/// - Arrays render as `[a,b]`, documents as `{'key': value,...}` in insertion order.
/// - Any other value renders as its JSON form, or its quoted display form if that fails.
pub fn render(value: &Bson) -> String {
    match value {
        Bson::Int32(v) => v.to_string(),
        Bson::Int64(v) => v.to_string(),
        Bson::Double(v) if v.is_finite() => v.to_string(),
        Bson::Double(_) => NULL_LITERAL.to_string(),
        Bson::Boolean(v) => v.to_string(),
        Bson::String(s) => render_str(s),
        Bson::Null | Bson::Undefined => NULL_LITERAL.to_string(),
        Bson::Array(items) => format!(
            "[{}]",
            items.iter().map(render).collect::<Vec<_>>().join(","),
        ),
        Bson::Document(doc) => format!(
            "{{{}}}",
            doc.iter()
                .map(|(k, v)| format!("{}: {}", render_str(k), render(v)))
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => match serde_json::to_string(other) {
            Ok(json) => json,
            Err(_) => format!("'{}'", other),
        },
    }
}

/// Renders any serializable value as a query-language literal.
///
/// The value is converted to BSON first and rendered with [`render`]. Values
/// BSON cannot hold, such as unsigned integers above `i64::MAX`, are rendered
/// from their JSON form with the same rules. If that fails too the quoted type
/// name is used.
pub fn render_serializable<T: Serialize>(value: &T) -> String {
    match serialize_to_bson(value) {
        Ok(bson) => render(&bson),
        Err(_) => match serde_json::to_value(value) {
            Ok(json) => render_json(&json),
            Err(_) => format!("'{}'", std::any::type_name::<T>()),
        },
    }
}

fn render_json(value: &Value) -> String {
    match value {
        Value::Null => NULL_LITERAL.to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => render_str(s),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(render_json).collect::<Vec<_>>().join(","),
        ),
        Value::Object(map) => format!(
            "{{{}}}",
            map.iter()
                .map(|(k, v)| format!("{}: {}", render_str(k), render_json(v)))
                .collect::<Vec<_>>()
                .join(","),
        ),
    }
}

fn render_str(s: &str) -> String {
    if s.starts_with('@') {
        s.to_string()
    } else {
        format!("'{}'", s)
    }
}
