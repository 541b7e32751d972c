//! Header names and fixed values of the REST protocol.

pub const API_VERSION: &str = "2018-12-31";

pub const AUTHORIZATION: &str = "authorization";
pub const CONSISTENCY_LEVEL: &str = "x-ms-consistency-level";
pub const CONTENT_TYPE: &str = "content-type";
pub const CONTINUATION: &str = "x-ms-continuation";
pub const DATE: &str = "x-ms-date";
pub const IS_QUERY: &str = "x-ms-documentdb-isquery";
pub const IS_UPSERT: &str = "x-ms-documentdb-is-upsert";
pub const MAX_ITEM_COUNT: &str = "x-ms-max-item-count";
pub const PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
pub const QUERY_CROSS_PARTITION: &str = "x-ms-documentdb-query-enablecrosspartition";
pub const QUERY_METRICS: &str = "x-ms-documentdb-populatequerymetrics";
pub const OFFER_AUTOPILOT: &str = "x-ms-cosmos-offer-autopilot-settings";
pub const OFFER_THROUGHPUT: &str = "x-ms-offer-throughput";
pub const REQUEST_CHARGE: &str = "x-ms-request-charge";
pub const RESOURCE_QUOTA: &str = "x-ms-resource-quota";
pub const RESOURCE_USAGE: &str = "x-ms-resource-usage";
pub const RETRY_AFTER: &str = "retry-after-ms";
pub const SESSION_TOKEN: &str = "x-ms-session-token";
pub const SLUG: &str = "slug";
pub const VERSION: &str = "x-ms-version";

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_QUERY: &str = "application/query+json";
/// Sentinel asking the service for its default page size.
pub const MAX_ITEM_COUNT_DEFAULT: &str = "-1";
/// Boolean flag value as the protocol spells it.
pub const TRUE: &str = "True";

/// RFC 1123 layout of `x-ms-date`, always in GMT.
pub const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";
