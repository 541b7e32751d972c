//! In-memory transport used by the unit tests.

use async_trait::async_trait;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};
use url::Url;

use cosmosdb_core::error::{CosmosError, CosmosResult};

use crate::{
    auth::MasterKey,
    client::Client,
    pipeline::{HttpRequest, HttpResponse, Pipeline, Transport},
    retry::RetryPolicy,
};

pub const TEST_KEY: &str =
    "C2y6yDjf5/R+ob0N8A7Cgv30VRDJIWEHLM+4QDU5DE2nQ9nDuVTqobD4b8mGGyPMbIZnqyMsEcaGQy67XIw/Jw==";
pub const TEST_ENDPOINT: &str = "https://localhost:8081/";

/// Replays a fixed script of responses and records every request it receives.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<CosmosResult<HttpResponse>>>>,
    fallback: Option<HttpResponse>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    latency: Duration,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = CosmosResult<HttpResponse>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            ..Default::default()
        }
    }

    /// Answers every request with `response`.
    pub fn repeat(response: HttpResponse) -> Self {
        Self { fallback: Some(response), ..Default::default() }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> CosmosResult<HttpResponse> {
        self.requests.lock().unwrap().push(request);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match (next, &self.fallback) {
            (Some(result), _) => result,
            (None, Some(response)) => Ok(response.clone()),
            (None, None) => Err(CosmosError::Transient("script exhausted".into())),
        }
    }
}

pub fn pipeline(transport: &ScriptedTransport) -> Pipeline {
    Pipeline::new(
        Url::parse(TEST_ENDPOINT).unwrap(),
        MasterKey::parse(TEST_KEY).unwrap(),
        RetryPolicy::default(),
        Arc::new(transport.clone()),
    )
}

pub fn json_response(status: u16, body: serde_json::Value) -> CosmosResult<HttpResponse> {
    Ok(HttpResponse::new(status).with_body(body.to_string()))
}

pub fn client(transport: &ScriptedTransport) -> Client {
    Client::builder()
        .endpoint(TEST_ENDPOINT)
        .key(TEST_KEY)
        .transport(transport.clone())
        .build()
        .unwrap()
}
