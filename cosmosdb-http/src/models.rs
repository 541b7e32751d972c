//! Wire models of the REST API.
//!
//! Field names follow the service's JSON casing through `serde` renames; system
//! properties (`_rid`, `_etag`, `_ts`, `_self`) are carried by
//! [`SystemProperties`].

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use cosmosdb_core::{
    document::{HasId, SystemProperties},
    error::CosmosResult,
};

/// Partition key version sent when creating collections.
pub const PARTITION_KEY_VERSION: u32 = 2;
/// Partition key path used when a collection is created without one.
pub const DEFAULT_PARTITION_KEY_PATH: &str = "/id";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Database {
    pub id: String,
    #[serde(flatten)]
    pub system: SystemProperties,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    #[serde(default)]
    pub indexing_policy: IndexingPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<PartitionKeyDefinition>,
    #[serde(flatten)]
    pub system: SystemProperties,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexingMode {
    #[default]
    Consistent,
    Lazy,
    None,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Hash,
    Range,
    Spatial,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexDataType {
    String,
    Number,
    Point,
    Polygon,
    LineString,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub data_type: IndexDataType,
    pub kind: IndexKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<i32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IncludedPath {
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Index>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExcludedPath {
    pub path: String,
}

/// How the service indexes the documents of a collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IndexingPolicy {
    pub automatic: bool,
    pub indexing_mode: IndexingMode,
    #[serde(default)]
    pub included_paths: Vec<IncludedPath>,
    #[serde(default)]
    pub excluded_paths: Vec<ExcludedPath>,
}

impl Default for IndexingPolicy {
    fn default() -> Self {
        Self {
            automatic: true,
            indexing_mode: IndexingMode::Consistent,
            included_paths: Vec::new(),
            excluded_paths: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionKind {
    #[default]
    Hash,
    Range,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PartitionKeyDefinition {
    pub paths: Vec<String>,
    pub kind: PartitionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
}

impl PartitionKeyDefinition {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            paths: vec![path.into()],
            kind: PartitionKind::Hash,
            version: Some(PARTITION_KEY_VERSION),
        }
    }
}

impl Default for PartitionKeyDefinition {
    fn default() -> Self {
        Self::new(DEFAULT_PARTITION_KEY_PATH)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AutopilotSettings {
    pub max_throughput: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectionRequest {
    pub id: String,
    pub indexing_policy: IndexingPolicy,
    pub partition_key: PartitionKeyDefinition,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceCollectionRequest {
    pub id: String,
    pub indexing_policy: IndexingPolicy,
}

/// An attachment's metadata. The content itself lives at `media`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(flatten)]
    pub system: SystemProperties,
}

impl HasId for Attachment {
    fn id(&self) -> Option<&str> {
        Some(self.id.as_str())
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ListDatabasesResponse {
    #[serde(rename = "Databases", alias = "databases", default)]
    pub databases: Vec<Database>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ListCollectionsResponse {
    #[serde(rename = "DocumentCollections", default)]
    pub collections: Vec<Collection>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ListAttachmentsResponse {
    #[serde(rename = "Attachments", alias = "attachments", default)]
    pub attachments: Vec<Attachment>,
}

/// One page of a document feed or query. Items stay undecoded until read.
#[derive(Deserialize, Debug, Default)]
pub struct ListDocumentsResponse {
    #[serde(rename = "_count", default)]
    pub count: usize,
    #[serde(rename = "Documents", default)]
    pub documents: Vec<Box<RawValue>>,
}

/// A named value bound into query text by the service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QueryParameter {
    pub name: String,
    pub value: String,
}

impl QueryParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }
}

/// The body posted for a document query.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QueryBody {
    pub query: String,
    pub parameters: Vec<QueryParameter>,
}

impl QueryBody {
    /// Pairs `query` with the parameters it actually references.
    pub fn new(query: impl Into<String>, parameters: impl IntoIterator<Item = QueryParameter>) -> Self {
        let query = query.into();
        let parameters = parameters
            .into_iter()
            .filter(|p| query.contains(p.name.as_str()))
            .collect();

        Self { query, parameters }
    }
}

/// A partition key value, sent as a one-element JSON array header.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionKey(serde_json::Value);

impl PartitionKey {
    pub fn new<T: Serialize>(value: T) -> CosmosResult<Self> {
        Ok(PartitionKey(serde_json::to_value(value)?))
    }

    pub fn header_value(&self) -> String {
        serde_json::Value::Array(vec![self.0.clone()]).to_string()
    }
}

impl From<&str> for PartitionKey {
    fn from(value: &str) -> Self {
        PartitionKey(serde_json::Value::String(value.to_string()))
    }
}

impl From<String> for PartitionKey {
    fn from(value: String) -> Self {
        PartitionKey(serde_json::Value::String(value))
    }
}

impl From<i64> for PartitionKey {
    fn from(value: i64) -> Self {
        PartitionKey(serde_json::Value::from(value))
    }
}

impl From<bool> for PartitionKey {
    fn from(value: bool) -> Self {
        PartitionKey(serde_json::Value::Bool(value))
    }
}

impl From<serde_json::Value> for PartitionKey {
    fn from(value: serde_json::Value) -> Self {
        PartitionKey(value)
    }
}
