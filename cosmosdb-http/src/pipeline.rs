//! The request pipeline: build, sign, send, retry and classify one API call.
//!
//! ```text
//! Built -> Signed -> Sent -> Succeeded
//!                         -> Retrying -> Signed -> Sent ...
//!                         -> Failed
//! ```
//!
//! Every attempt is signed against a fresh `x-ms-date`. Transport failures are
//! surfaced immediately; only completed responses are subject to the
//! [`RetryPolicy`].

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{
    Method, StatusCode,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use std::{fmt, future::Future, sync::Arc, time::Duration};
use tokio::time::Instant;
use tracing::{Instrument, debug, field, info_span, warn};
use url::Url;

use cosmosdb_core::{
    error::{CosmosError, CosmosResult},
    link::ResourceLink,
};

use crate::{
    auth::{self, MasterKey},
    headers,
    retry::RetryPolicy,
};

/// A fully signed request, ready for the wire.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// A completed response with its body read to the end.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self { status, ..Default::default() }
    }

    /// Adds a header. Invalid names and values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The continuation token, `None` when absent or empty.
    pub fn continuation(&self) -> Option<String> {
        self.header(headers::CONTINUATION)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    }

    pub fn request_charge(&self) -> Option<f64> {
        self.header(headers::REQUEST_CHARGE)?.parse().ok()
    }

    /// Decodes the JSON body. A 204 or an empty body decodes to `None`.
    pub fn json<T: DeserializeOwned>(&self) -> CosmosResult<Option<T>> {
        if self.status == StatusCode::NO_CONTENT.as_u16() || self.body.is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_slice(&self.body)?))
    }

    /// Decodes a JSON body that must be present.
    pub fn json_required<T: DeserializeOwned>(&self) -> CosmosResult<T> {
        self.json()?
            .ok_or_else(|| CosmosError::Serialization("expected a response body".into()))
    }
}

/// Sends signed requests to the service.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> CosmosResult<HttpResponse>;
}

/// The default [`Transport`], backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> CosmosResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CosmosError::InvalidConfiguration(e.to_string()))?;

        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn transport_error(error: reqwest::Error) -> CosmosError {
    if error.is_timeout() {
        CosmosError::Timeout(error.to_string())
    } else {
        CosmosError::Transient(error.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> CosmosResult<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(transport_error)?;

        Ok(HttpResponse { status, headers, body: body.to_vec() })
    }
}

/// An unsigned request: method, resource link, caller headers and body.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    link: ResourceLink,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: Method, link: ResourceLink) -> Self {
        Self { method, link, headers: HeaderMap::new(), body: None }
    }

    pub fn get(link: ResourceLink) -> Self {
        Self::new(Method::GET, link)
    }

    pub fn post(link: ResourceLink) -> Self {
        Self::new(Method::POST, link)
    }

    pub fn put(link: ResourceLink) -> Self {
        Self::new(Method::PUT, link)
    }

    pub fn delete(link: ResourceLink) -> Self {
        Self::new(Method::DELETE, link)
    }

    /// Sets a caller header. Caller headers are never overwritten by defaults.
    ///
    /// Names are case-insensitive and stored lowercase.
    pub fn header(mut self, name: &str, value: impl AsRef<str>) -> CosmosResult<Self> {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| CosmosError::BadRequest(format!("invalid header name {}: {}", name, e)))?;
        let value = HeaderValue::from_str(value.as_ref()).map_err(|e| {
            CosmosError::BadRequest(format!("invalid value for header {}: {}", name, e))
        })?;
        self.headers.insert(header, value);

        Ok(self)
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn without_header(mut self, name: &str) -> Self {
        self.headers.remove(name);
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> CosmosResult<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    pub fn bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn link(&self) -> &ResourceLink {
        &self.link
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// Executes [`Request`]s against one account endpoint.
///
/// Cloning is cheap; clones share the transport.
#[derive(Clone)]
pub struct Pipeline {
    endpoint: Url,
    key: MasterKey,
    retry: RetryPolicy,
    transport: Arc<dyn Transport>,
    deadline: Option<Instant>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("endpoint", &self.endpoint.as_str())
            .field("retry", &self.retry)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(endpoint: Url, key: MasterKey, retry: RetryPolicy, transport: Arc<dyn Transport>) -> Self {
        Self { endpoint, key, retry, transport, deadline: None }
    }

    /// Returns a pipeline whose calls, retries included, end by `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self { deadline: Some(deadline), ..self.clone() }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Sends `request` until it succeeds, fails terminally or the retry budget is spent.
    pub async fn execute(&self, request: &Request) -> CosmosResult<HttpResponse> {
        let span = info_span!(
            "cosmosdb.request",
            method = %request.method,
            link = %request.link,
            status = field::Empty,
            request_charge = field::Empty,
        );

        self.execute_inner(request).instrument(span).await
    }

    async fn execute_inner(&self, request: &Request) -> CosmosResult<HttpResponse> {
        let span = tracing::Span::current();
        let mut retries = 0;

        loop {
            self.check_deadline()?;

            let signed = self.sign(request)?;
            debug!(url = %signed.url, attempt = retries + 1, "sending request");

            let response = self.within(self.transport.send(signed)).await??;

            span.record("status", response.status);
            if let Some(charge) = response.request_charge() {
                span.record("request_charge", charge);
            }
            if let Some(quota) = response.header(headers::RESOURCE_QUOTA) {
                debug!(quota, "resource quota");
            }
            if let Some(usage) = response.header(headers::RESOURCE_USAGE) {
                debug!(usage, "resource usage");
            }

            if response.is_success() {
                return Ok(response);
            }

            let decision = self.retry.decide(retries, response.status, &response.headers);
            if !decision.should_retry {
                return Err(classify(&response));
            }

            warn!(
                status = response.status,
                delay_ms = decision.delay.as_millis() as u64,
                retry = retries + 1,
                max_retries = self.retry.max_retries(),
                "retrying request",
            );

            self.within(tokio::time::sleep(decision.delay)).await?;
            retries += 1;
        }
    }

    /// Applies default headers, then dates and signs the request.
    fn sign(&self, request: &Request) -> CosmosResult<HttpRequest> {
        let mut headers = request.headers.clone();

        if matches!(request.method, Method::POST | Method::PUT) && request.body.is_some() {
            headers
                .entry(headers::CONTENT_TYPE)
                .or_insert(HeaderValue::from_static(headers::CONTENT_TYPE_JSON));
        }
        headers
            .entry(headers::VERSION)
            .or_insert(HeaderValue::from_static(headers::API_VERSION));
        headers
            .entry(headers::MAX_ITEM_COUNT)
            .or_insert(HeaderValue::from_static(headers::MAX_ITEM_COUNT_DEFAULT));

        let date = Utc::now().format(headers::DATE_FORMAT).to_string();
        let authorization = auth::authorization(
            &self.key,
            request.method.as_str(),
            request.link.as_str(),
            &date,
        )?;

        headers.insert(HeaderName::from_static(headers::DATE), header_value(&date)?);
        headers.insert(
            HeaderName::from_static(headers::AUTHORIZATION),
            header_value(&authorization)?,
        );

        let mut url = self.endpoint.clone();
        url.set_path(request.link.as_str());

        Ok(HttpRequest {
            method: request.method.clone(),
            url,
            headers,
            body: request.body.clone(),
        })
    }

    fn check_deadline(&self) -> CosmosResult<()> {
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Err(cancelled()),
            _ => Ok(()),
        }
    }

    async fn within<F: Future>(&self, future: F) -> CosmosResult<F::Output> {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, future)
                .await
                .map_err(|_| cancelled()),
            None => Ok(future.await),
        }
    }
}

fn header_value(value: &str) -> CosmosResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| CosmosError::InvalidConfiguration(e.to_string()))
}

fn cancelled() -> CosmosError {
    CosmosError::Cancelled("deadline exceeded".into())
}

/// Maps a failed response onto an error kind.
fn classify(response: &HttpResponse) -> CosmosError {
    let reason = StatusCode::from_u16(response.status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("unknown status");

    CosmosError::from_status(response.status, &response.body, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{retry::DEFAULT_RETRY_DELAY, testing::{ScriptedTransport, TEST_KEY, pipeline}};
    use serde_json::json;

    fn link() -> ResourceLink {
        ResourceLink::collection("d1", "c1")
    }

    #[tokio::test]
    async fn test_defaults_and_signature() {
        let transport = ScriptedTransport::new([Ok(HttpResponse::new(200).with_body(r#"{"id":"c1"}"#))]);
        let pipeline = pipeline(&transport);

        let request = Request::post(ResourceLink::document("d1", "c1", ""))
            .json(&json!({"id": "x"}))
            .unwrap();
        let response = pipeline.execute(&request).await.unwrap();
        assert_eq!(response.json_required::<serde_json::Value>().unwrap(), json!({"id": "c1"}));

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        let sent = &sent[0];
        assert_eq!(sent.url.as_str(), "https://localhost:8081/dbs/d1/colls/c1/docs");
        assert_eq!(sent.headers[headers::CONTENT_TYPE], headers::CONTENT_TYPE_JSON);
        assert_eq!(sent.headers[headers::VERSION], headers::API_VERSION);
        assert_eq!(sent.headers[headers::MAX_ITEM_COUNT], "-1");

        let date = sent.headers[headers::DATE].to_str().unwrap();
        let key = MasterKey::parse(TEST_KEY).unwrap();
        assert_eq!(
            sent.headers[headers::AUTHORIZATION].to_str().unwrap(),
            auth::authorization(&key, "POST", "dbs/d1/colls/c1/docs", date).unwrap(),
        );
    }

    #[tokio::test]
    async fn test_caller_headers_are_not_overwritten() {
        let transport = ScriptedTransport::new([Ok(HttpResponse::new(201))]);
        let pipeline = pipeline(&transport);

        let request = Request::post(link())
            .header(headers::CONTENT_TYPE, headers::CONTENT_TYPE_QUERY)
            .unwrap()
            .header(headers::MAX_ITEM_COUNT, "10")
            .unwrap()
            .bytes(b"{}".to_vec());
        pipeline.execute(&request).await.unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.headers[headers::CONTENT_TYPE], headers::CONTENT_TYPE_QUERY);
        assert_eq!(sent.headers[headers::MAX_ITEM_COUNT], "10");
    }

    #[tokio::test]
    async fn test_get_has_no_content_type() {
        let transport = ScriptedTransport::new([Ok(HttpResponse::new(204))]);
        let response = pipeline(&transport).execute(&Request::get(link())).await.unwrap();

        assert!(response.json::<serde_json::Value>().unwrap().is_none());
        assert!(!transport.requests()[0].headers.contains_key(headers::CONTENT_TYPE));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttled_request_is_retried_then_succeeds() {
        let transport = ScriptedTransport::new([
            Ok(HttpResponse::new(429)),
            Ok(HttpResponse::new(449).with_header(headers::RETRY_AFTER, "250")),
            Ok(HttpResponse::new(200)),
        ]);
        let pipeline = pipeline(&transport);

        let start = Instant::now();
        pipeline.execute(&Request::get(link())).await.unwrap();

        assert_eq!(transport.requests().len(), 3);
        assert_eq!(start.elapsed(), DEFAULT_RETRY_DELAY + Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exhaustion_surfaces_throttled() {
        let transport = ScriptedTransport::repeat(HttpResponse::new(429).with_body(r#"{"message":"slow down"}"#));
        let pipeline = pipeline(&transport);

        let err = pipeline.execute(&Request::get(link())).await.unwrap_err();

        assert_eq!(err, CosmosError::Throttled("slow down".into()));
        assert_eq!(transport.requests().len(), 6);
    }

    #[tokio::test]
    async fn test_failure_status_is_classified_without_retry() {
        let transport = ScriptedTransport::new([Ok(HttpResponse::new(404))]);
        let err = pipeline(&transport).execute(&Request::get(link())).await.unwrap_err();

        assert_eq!(err, CosmosError::NotFound("Not Found".into()));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let transport = ScriptedTransport::new([
            Err(CosmosError::Transient("connection refused".into())),
            Ok(HttpResponse::new(200)),
        ]);
        let err = pipeline(&transport).execute(&Request::get(link())).await.unwrap_err();

        assert_eq!(err, CosmosError::Transient("connection refused".into()));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_aborts_retry_sleep() {
        let transport = ScriptedTransport::repeat(HttpResponse::new(429).with_header(headers::RETRY_AFTER, "1000"));
        let pipeline = pipeline(&transport).with_deadline(Instant::now() + Duration::from_millis(500));

        let err = pipeline.execute(&Request::get(link())).await.unwrap_err();

        assert!(matches!(err, CosmosError::Cancelled(_)));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_deadline_sends_nothing() {
        let transport = ScriptedTransport::new([Ok(HttpResponse::new(200))]);
        let deadline = Instant::now();
        tokio::time::advance(Duration::from_millis(1)).await;

        let err = pipeline(&transport)
            .with_deadline(deadline)
            .execute(&Request::get(link()))
            .await
            .unwrap_err();

        assert!(matches!(err, CosmosError::Cancelled(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_aborts_slow_send() {
        let transport = ScriptedTransport::new([Ok(HttpResponse::new(200))]).with_latency(Duration::from_secs(5));
        let pipeline = pipeline(&transport).with_deadline(Instant::now() + Duration::from_secs(1));

        let err = pipeline.execute(&Request::get(link())).await.unwrap_err();
        assert!(matches!(err, CosmosError::Cancelled(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_attempt_signature_matches_its_date_header() {
        let transport = ScriptedTransport::new([
            Ok(HttpResponse::new(429).with_header(headers::RETRY_AFTER, "2000")),
            Ok(HttpResponse::new(200)),
        ]);
        pipeline(&transport).execute(&Request::get(link())).await.unwrap();

        let key = MasterKey::parse(TEST_KEY).unwrap();
        let sent = transport.requests();
        assert_eq!(sent.len(), 2);
        for sent in sent {
            let date = sent.headers[headers::DATE].to_str().unwrap();
            assert_eq!(
                sent.headers[headers::AUTHORIZATION].to_str().unwrap(),
                auth::authorization(&key, "GET", "dbs/d1/colls/c1", date).unwrap(),
            );
        }
    }

    #[test]
    fn test_response_helpers() {
        let response = HttpResponse::new(200)
            .with_header(headers::CONTINUATION, "")
            .with_header(headers::REQUEST_CHARGE, "2.5");

        assert_eq!(response.continuation(), None);
        assert_eq!(response.request_charge(), Some(2.5));
        assert_eq!(
            HttpResponse::new(200).with_header(headers::CONTINUATION, "T1").continuation().as_deref(),
            Some("T1"),
        );
    }

    #[test]
    fn test_mixed_case_header_names() {
        let request = Request::get(link()).header("Content-Type", "text/plain").unwrap();
        assert_eq!(request.headers()[headers::CONTENT_TYPE], "text/plain");

        let err = Request::get(link()).header("bad header", "x").unwrap_err();
        assert!(matches!(err, CosmosError::BadRequest(_)));

        let response = HttpResponse::new(200)
            .with_header("X-Ms-Continuation", "T1")
            .with_header("bad header", "x");
        assert_eq!(response.continuation().as_deref(), Some("T1"));
        assert_eq!(response.headers.len(), 1);
    }
}
