//! Client configuration and per-operation options.

use std::{fmt, sync::Arc, time::Duration};
use url::Url;

use cosmosdb_core::error::{CosmosError, CosmosResult};

use crate::{
    auth::MasterKey,
    cache,
    client::Client,
    models::{AutopilotSettings, IndexingPolicy, PARTITION_KEY_VERSION, PartitionKeyDefinition},
    pipeline::{Pipeline, ReqwestTransport, Transport},
    retry::{DEFAULT_MAX_RETRIES, RetryPolicy},
};

/// HTTP timeout applied by the default transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables shared by every handle derived from a [`Client`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub max_retries: u32,
    pub retry_on_status: Vec<u16>,
    pub timeout: Duration,
    pub collection_cache_ttl: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_on_status: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            collection_cache_ttl: cache::DEFAULT_TTL,
        }
    }
}

impl ClientOptions {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries).with_retry_on_status(self.retry_on_status.iter().copied())
    }
}

/// Builder for [`Client`].
///
/// The endpoint and key may come from [`endpoint`](Self::endpoint) and
/// [`key`](Self::key), from an account name, or from a connection string of the
/// form `AccountEndpoint=https://...;AccountKey=...`. Later calls override
/// earlier ones. Nothing is validated until [`build`](Self::build).
///
/// ```ignore
/// let client = Client::builder()
///     .connection_string(&std::env::var("COSMOS_CONNECTION_STRING")?)
///     .max_retries(3)
///     .retry_on_status([503])
///     .timeout(Duration::from_secs(30))
///     .build()?;
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    endpoint: Option<String>,
    key: Option<String>,
    options: ClientOptions,
    transport: Option<Arc<dyn Transport>>,
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("endpoint", &self.endpoint)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    /// Targets `https://{account_name}.documents.azure.com:443/`.
    pub fn account_name(mut self, account_name: &str) -> Self {
        self.endpoint = Some(format!("https://{}.documents.azure.com:443/", account_name));
        self
    }

    /// The base64 master key of the account.
    pub fn key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    /// Takes the endpoint and key from a connection string.
    ///
    /// Unknown and malformed segments are ignored.
    pub fn connection_string(mut self, connection_string: &str) -> Self {
        for part in connection_string.split(';') {
            let Some((name, value)) = part.split_once('=') else {
                continue;
            };

            match name.trim().to_uppercase().as_str() {
                "ACCOUNTENDPOINT" => self.endpoint = Some(value.trim().to_string()),
                "ACCOUNTKEY" => self.key = Some(value.trim().to_string()),
                _ => {}
            }
        }
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.options.max_retries = max_retries;
        self
    }

    /// Also retries responses with these status codes.
    pub fn retry_on_status(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.options.retry_on_status.extend(statuses);
        self
    }

    /// HTTP timeout of the default transport. Ignored with a custom transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    pub fn collection_cache_ttl(mut self, ttl: Duration) -> Self {
        self.options.collection_cache_ttl = ttl;
        self
    }

    /// Sends requests through `transport` instead of the default HTTP client.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Validates the configuration and builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`CosmosError::InvalidConfiguration`] when the endpoint or key is
    /// missing or malformed.
    pub fn build(self) -> CosmosResult<Client> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| CosmosError::InvalidConfiguration("missing endpoint".into()))?;
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| CosmosError::InvalidConfiguration(format!("invalid endpoint: {}", e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(CosmosError::InvalidConfiguration(format!(
                "invalid endpoint: {}",
                endpoint
            )));
        }

        let key = self
            .key
            .ok_or_else(|| CosmosError::InvalidConfiguration("missing key".into()))?;
        let key = MasterKey::parse(&key)?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(self.options.timeout)?),
        };

        let pipeline = Pipeline::new(endpoint, key, self.options.retry_policy(), transport);

        Ok(Client::from_parts(pipeline, self.options))
    }
}

/// Throughput provisioning for a new collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// Fixed request units per second.
    Throughput(u32),
    /// Autoscaled up to a maximum.
    Autopilot(AutopilotSettings),
}

/// Options for creating a collection.
///
/// Throughput and autopilot settings are mutually exclusive; the last one set wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateCollectionOptions {
    pub partition_key: Option<PartitionKeyDefinition>,
    pub indexing_policy: Option<IndexingPolicy>,
    pub offer: Option<Offer>,
}

impl CreateCollectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn partition_key(mut self, mut partition_key: PartitionKeyDefinition) -> Self {
        partition_key.version = Some(PARTITION_KEY_VERSION);
        self.partition_key = Some(partition_key);
        self
    }

    pub fn indexing_policy(mut self, indexing_policy: IndexingPolicy) -> Self {
        self.indexing_policy = Some(indexing_policy);
        self
    }

    pub fn throughput(mut self, throughput: u32) -> Self {
        self.offer = Some(Offer::Throughput(throughput));
        self
    }

    pub fn autopilot(mut self, settings: AutopilotSettings) -> Self {
        self.offer = Some(Offer::Autopilot(settings));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedTransport, TEST_KEY};

    #[test]
    fn test_defaults() {
        let options = ClientOptions::default();

        assert_eq!(options.max_retries, 5);
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.collection_cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_connection_string() {
        let client = ClientBuilder::new()
            .connection_string(&format!(
                "AccountEndpoint=https://acct.documents.azure.com:443/;AccountKey={};Extra",
                TEST_KEY
            ))
            .transport(ScriptedTransport::default())
            .build()
            .unwrap();

        assert_eq!(client.endpoint().host_str(), Some("acct.documents.azure.com"));
    }

    #[test]
    fn test_account_name() {
        let client = ClientBuilder::new()
            .account_name("acct")
            .key(TEST_KEY)
            .transport(ScriptedTransport::default())
            .build()
            .unwrap();

        assert_eq!(client.endpoint().as_str(), "https://acct.documents.azure.com/");
    }

    #[test]
    fn test_invalid_configuration() {
        let missing_key = ClientBuilder::new().endpoint("https://localhost:8081/").build();
        assert!(matches!(missing_key, Err(CosmosError::InvalidConfiguration(_))));

        let bad_key = ClientBuilder::new()
            .endpoint("https://localhost:8081/")
            .key("%%%")
            .build();
        assert!(matches!(bad_key, Err(CosmosError::InvalidConfiguration(_))));

        let bad_endpoint = ClientBuilder::new().endpoint("not a url").key(TEST_KEY).build();
        assert!(matches!(bad_endpoint, Err(CosmosError::InvalidConfiguration(_))));

        let missing_endpoint = ClientBuilder::new().key(TEST_KEY).build();
        assert!(matches!(missing_endpoint, Err(CosmosError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_offer_last_wins() {
        let options = CreateCollectionOptions::new()
            .throughput(400)
            .autopilot(AutopilotSettings { max_throughput: 4000 });
        assert_eq!(options.offer, Some(Offer::Autopilot(AutopilotSettings { max_throughput: 4000 })));

        let options = options.throughput(1000);
        assert_eq!(options.offer, Some(Offer::Throughput(1000)));
    }

    #[test]
    fn test_partition_key_version_is_forced() {
        let mut definition = PartitionKeyDefinition::new("/tenant");
        definition.version = None;

        let options = CreateCollectionOptions::new().partition_key(definition);
        assert_eq!(options.partition_key.unwrap().version, Some(PARTITION_KEY_VERSION));
    }
}
