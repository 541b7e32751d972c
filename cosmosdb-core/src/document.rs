//! Document identity and the system properties the service attaches to every resource.
//!
//! Operations that address an existing document (replace, delete, attachments)
//! need its identifier. Rather than inspecting arbitrary values at runtime, a
//! document type opts in through [`HasId`], or is wrapped in [`Identified`]
//! together with an extractor function.

use bson::Bson;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::{CosmosError, CosmosResult};

/// Capability of a value to name the resource it represents.
///
/// # Example
///
/// ```ignore
/// use cosmosdb_core::document::HasId;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct User {
///     pub id: String,
///     pub name: String,
/// }
///
/// impl HasId for User {
///     fn id(&self) -> Option<&str> {
///         Some(&self.id)
///     }
/// }
/// ```
pub trait HasId {
    /// Returns the resource identifier, or `None` if the value carries none.
    fn id(&self) -> Option<&str>;
}

/// Returns the identifier of `document`, failing when it is missing or empty.
///
/// # Errors
///
/// Returns [`CosmosError::NoResourceIdentifier`] before any request is made.
pub fn document_id<D: HasId + ?Sized>(document: &D) -> CosmosResult<&str> {
    match document.id() {
        Some(id) if !id.is_empty() => Ok(id),
        Some(_) => Err(CosmosError::NoResourceIdentifier("document id is empty".into())),
        None => Err(CosmosError::NoResourceIdentifier("document has no id field".into())),
    }
}

impl<D: HasId + ?Sized> HasId for &D {
    fn id(&self) -> Option<&str> {
        (**self).id()
    }
}

impl HasId for Value {
    fn id(&self) -> Option<&str> {
        self.get("id").and_then(Value::as_str)
    }
}

impl HasId for serde_json::Map<String, Value> {
    fn id(&self) -> Option<&str> {
        self.get("id").and_then(Value::as_str)
    }
}

impl HasId for bson::Document {
    fn id(&self) -> Option<&str> {
        match self.get("id") {
            Some(Bson::String(id)) => Some(id),
            _ => None,
        }
    }
}

/// A value paired with the identifier an extractor found in it.
///
/// Serializes exactly like the wrapped value.
///
/// ```ignore
/// let order = Order { number: "A-17".into(), .. };
/// let doc = Identified::new(&order, |o| Some(o.number.as_str()));
/// collection.replace_document(pk, &doc).await?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Identified<'a, T: ?Sized> {
    id: Option<&'a str>,
    value: &'a T,
}

impl<'a, T: ?Sized> Identified<'a, T> {
    /// Wraps `value`, recording the identifier returned by `extractor`.
    pub fn new<F>(value: &'a T, extractor: F) -> Self
    where
        F: FnOnce(&'a T) -> Option<&'a str>,
    {
        Identified { id: extractor(value), value }
    }

    /// Wraps `value` with an identifier supplied by the caller.
    pub fn with_id(value: &'a T, id: &'a str) -> Self {
        Identified { id: Some(id), value }
    }

    pub fn value(&self) -> &'a T {
        self.value
    }
}

impl<T: ?Sized> HasId for Identified<'_, T> {
    fn id(&self) -> Option<&str> {
        self.id
    }
}

impl<T: Serialize + ?Sized> Serialize for Identified<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

/// System properties maintained by the service on every resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemProperties {
    /// Resource id assigned by the service.
    #[serde(rename = "_rid", default, skip_serializing_if = "String::is_empty")]
    pub rid: String,
    /// Entity tag used for optimistic concurrency.
    #[serde(rename = "_etag", default, skip_serializing_if = "String::is_empty")]
    pub etag: String,
    /// Last modification time.
    #[serde(
        rename = "_ts",
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub ts: Option<DateTime<Utc>>,
    /// Addressable path of the resource.
    #[serde(rename = "_self", default, skip_serializing_if = "String::is_empty")]
    pub self_link: String,
}

/// The minimal shape of a stored document: its id plus system properties.
///
/// Useful for listing documents without decoding their bodies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(flatten)]
    pub system: SystemProperties,
}

impl HasId for Document {
    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Order {
        number: String,
        total: u32,
    }

    #[test]
    fn test_json_and_bson_ids() {
        assert_eq!(document_id(&json!({ "id": "a1", "n": 1 })).unwrap(), "a1");
        assert_eq!(document_id(&bson::doc! { "id": "b2" }).unwrap(), "b2");
    }

    #[test]
    fn test_missing_or_empty_id() {
        let err = document_id(&json!({ "name": "x" })).unwrap_err();
        assert!(matches!(err, CosmosError::NoResourceIdentifier(_)));

        let err = document_id(&json!({ "id": 42 })).unwrap_err();
        assert!(matches!(err, CosmosError::NoResourceIdentifier(_)));

        let err = document_id(&Document::default()).unwrap_err();
        assert!(matches!(err, CosmosError::NoResourceIdentifier(_)));
    }

    #[test]
    fn test_identified_uses_extractor_and_serializes_transparently() {
        let order = Order { number: "A-17".to_string(), total: 3 };
        let doc = Identified::new(&order, |o| Some(o.number.as_str()));

        assert_eq!(document_id(&doc).unwrap(), "A-17");
        assert_eq!(serde_json::to_value(&doc).unwrap(), json!({ "number": "A-17", "total": 3 }));
    }

    #[test]
    fn test_document_system_properties() {
        let doc: Document = serde_json::from_value(json!({
            "id": "x",
            "_rid": "abc==",
            "_etag": "\"0000\"",
            "_ts": 1_500_000_000,
            "_self": "dbs/abc/colls/def/docs/ghi/",
            "other": true,
        }))
        .unwrap();

        assert_eq!(doc.id, "x");
        assert_eq!(doc.system.rid, "abc==");
        assert_eq!(doc.system.ts.map(|ts| ts.timestamp()), Some(1_500_000_000));
    }
}
