//! Error types and result types for REST API operations.
//!
//! Every fallible operation in the workspace returns [`CosmosResult<T>`]. Errors
//! raised by the service are classified from the response status code with
//! [`CosmosError::from_status`], carrying the most specific message that could be
//! extracted from the response body.

use bson::error::Error as BsonError;
use serde::Deserialize;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when talking to the database service.
///
/// Variants map one-to-one onto the failure kinds a caller can act on. Only
/// [`CosmosError::Throttled`] is ever retried, and only by the request pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CosmosError {
    /// The client was configured with a malformed key or endpoint.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// A document value did not carry an extractable identifier.
    #[error("No resource identifier: {0}")]
    NoResourceIdentifier(String),
    /// A query expression was constructed with an invalid operand.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// The service rejected the request as malformed (400).
    #[error("Bad request: {0}")]
    BadRequest(String),
    /// Authentication was rejected (401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// The credentials lack permission for the resource (403).
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// The addressed resource does not exist (404).
    #[error("Resource not found: {0}")]
    NotFound(String),
    /// The request did not complete in time (408, or an HTTP client timeout).
    #[error("Request timed out: {0}")]
    Timeout(String),
    /// The resource already exists (409).
    #[error("Resource already exists: {0}")]
    Conflict(String),
    /// A precondition such as an etag check failed (412).
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),
    /// The payload exceeds the service's size limit (413).
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
    /// The request rate limit was exceeded and the retry budget is spent (429, 449).
    #[error("Throttled: {0}")]
    Throttled(String),
    /// The server could not be reached or the connection failed.
    #[error("Transport error: {0}")]
    Transient(String),
    /// Any failure status without a more specific mapping.
    #[error("Internal service error: {0}")]
    InternalServiceError(String),
    /// The caller's deadline expired before the call completed.
    #[error("Cancelled: {0}")]
    Cancelled(String),
    /// Encoding or decoding a payload failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A specialized `Result` type for REST API operations.
pub type CosmosResult<T> = Result<T, CosmosError>;

impl CosmosError {
    /// Classifies a failed response by its status code.
    ///
    /// `body` is the raw response body; the message is extracted with
    /// [`error_message_from_body`], falling back to `reason` when the body is empty.
    pub fn from_status(status: u16, body: &[u8], reason: &str) -> Self {
        let message = error_message_from_body(body).unwrap_or_else(|| reason.to_string());

        match status {
            400 => CosmosError::BadRequest(message),
            401 => CosmosError::Unauthorized(message),
            403 => CosmosError::Forbidden(message),
            404 => CosmosError::NotFound(message),
            408 => CosmosError::Timeout(message),
            409 => CosmosError::Conflict(message),
            412 => CosmosError::ConcurrencyConflict(message),
            413 => CosmosError::PayloadTooLarge(message),
            429 | 449 => CosmosError::Throttled(message),
            _ => CosmosError::InternalServiceError(message),
        }
    }

    /// Returns the message carried by this error.
    pub fn message(&self) -> &str {
        match self {
            CosmosError::InvalidConfiguration(m)
            | CosmosError::NoResourceIdentifier(m)
            | CosmosError::InvalidQuery(m)
            | CosmosError::BadRequest(m)
            | CosmosError::Unauthorized(m)
            | CosmosError::Forbidden(m)
            | CosmosError::NotFound(m)
            | CosmosError::Timeout(m)
            | CosmosError::Conflict(m)
            | CosmosError::ConcurrencyConflict(m)
            | CosmosError::PayloadTooLarge(m)
            | CosmosError::Throttled(m)
            | CosmosError::Transient(m)
            | CosmosError::InternalServiceError(m)
            | CosmosError::Cancelled(m)
            | CosmosError::Serialization(m) => m,
        }
    }
}

impl From<BsonError> for CosmosError {
    fn from(err: BsonError) -> Self {
        CosmosError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for CosmosError {
    fn from(err: SerdeJsonError) -> Self {
        CosmosError::Serialization(err.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Deserialize)]
struct NestedErrors {
    #[serde(rename = "Errors", default)]
    errors: Vec<String>,
}

/// Extracts a human-readable message from a service error body.
///
/// The service wraps its detail as `Message: {"Errors":[...]}` inside the outer
/// `message` field. The first nested error wins, then the outer message, then the
/// raw body. Returns `None` only for an empty body.
pub fn error_message_from_body(body: &[u8]) -> Option<String> {
    let raw = String::from_utf8_lossy(body);
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let Ok(ErrorBody { message: Some(message) }) = serde_json::from_str::<ErrorBody>(raw) else {
        return Some(raw.to_string());
    };

    nested_error(&message).or(Some(message))
}

fn nested_error(message: &str) -> Option<String> {
    let start = message.find('{')?;
    let end = message.rfind('}')?;
    if end < start {
        return None;
    }

    serde_json::from_str::<NestedErrors>(&message[start..=end])
        .ok()?
        .errors
        .into_iter()
        .next()
}
