//! Retry decisions for completed responses.
//!
//! The policy is pure: it looks at the status code, the response headers and
//! the number of retries already spent, and never performs I/O. The request
//! pipeline owns the sleeping and resending.

use reqwest::header::HeaderMap;
use std::{collections::HashSet, time::Duration};

use crate::headers;

/// Retries allowed per call unless configured otherwise.
pub const DEFAULT_MAX_RETRIES: u32 = 5;
/// Delay used when the server gives no retry hint.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);
/// Status code the protocol uses to ask for a retry.
pub const STATUS_RETRY_WITH: u16 = 449;
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Outcome of consulting the [`RetryPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    pub should_retry: bool,
    pub delay: Duration,
}

impl RetryDecision {
    pub const STOP: RetryDecision = RetryDecision { should_retry: false, delay: Duration::ZERO };

    pub fn after(delay: Duration) -> Self {
        RetryDecision { should_retry: true, delay }
    }
}

/// Decides whether a failed response is replayed, and after what delay.
///
/// In order of precedence:
///
/// 1. a non-negative integer `retry-after-ms` header is authoritative;
/// 2. 429 and 449 retry after [`DEFAULT_RETRY_DELAY`];
/// 3. statuses in the configured retry set retry after [`DEFAULT_RETRY_DELAY`];
/// 4. anything else is final.
///
/// Once `max_retries` retries have been spent no rule applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    retry_on_status: HashSet<u16>,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        RetryPolicy { max_retries, retry_on_status: HashSet::new() }
    }

    /// Also retries responses with any of the given status codes.
    pub fn with_retry_on_status(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.retry_on_status.extend(statuses);
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Decides for a response after `retries` retries have already been made.
    pub fn decide(&self, retries: u32, status: u16, headers: &HeaderMap) -> RetryDecision {
        if retries >= self.max_retries {
            return RetryDecision::STOP;
        }

        if let Some(delay) = retry_after(headers) {
            return RetryDecision::after(delay);
        }

        if status == STATUS_TOO_MANY_REQUESTS
            || status == STATUS_RETRY_WITH
            || self.retry_on_status.contains(&status)
        {
            return RetryDecision::after(DEFAULT_RETRY_DELAY);
        }

        RetryDecision::STOP
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(DEFAULT_MAX_RETRIES)
    }
}

/// Parses the server's `retry-after-ms` hint.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(headers::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn hint(ms: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(headers::RETRY_AFTER, HeaderValue::from_str(ms).unwrap());
        headers
    }

    #[test]
    fn test_server_hint_overrides_status() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.decide(0, 503, &hint("250")), RetryDecision::after(Duration::from_millis(250)));
        assert_eq!(policy.decide(4, 429, &hint("250")), RetryDecision::after(Duration::from_millis(250)));
        assert_eq!(policy.decide(0, 200, &hint("0")), RetryDecision::after(Duration::ZERO));
    }

    #[test]
    fn test_exhausted_budget_stops_even_with_hint() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.decide(5, 429, &hint("250")), RetryDecision::STOP);
        assert_eq!(RetryDecision::STOP.delay, Duration::ZERO);
        assert_eq!(RetryPolicy::new(0).decide(0, 449, &HeaderMap::new()), RetryDecision::STOP);
    }

    #[test]
    fn test_throttling_statuses_use_default_delay() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.decide(0, 429, &HeaderMap::new()), RetryDecision::after(DEFAULT_RETRY_DELAY));
        assert_eq!(policy.decide(0, 449, &HeaderMap::new()), RetryDecision::after(DEFAULT_RETRY_DELAY));
        assert_eq!(policy.decide(0, 503, &HeaderMap::new()), RetryDecision::STOP);
    }

    #[test]
    fn test_malformed_hint_falls_through() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.decide(0, 404, &hint("-5")), RetryDecision::STOP);
        assert_eq!(policy.decide(0, 429, &hint("soon")), RetryDecision::after(DEFAULT_RETRY_DELAY));
    }

    #[test]
    fn test_configured_statuses() {
        let policy = RetryPolicy::default().with_retry_on_status([503, 500]);

        assert_eq!(policy.decide(0, 503, &HeaderMap::new()), RetryDecision::after(DEFAULT_RETRY_DELAY));
        assert_eq!(policy.decide(0, 404, &HeaderMap::new()), RetryDecision::STOP);
    }
}
