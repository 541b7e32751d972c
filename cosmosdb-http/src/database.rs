//! Database handles and collection management.

use tracing::{debug, instrument};

use cosmosdb_core::{error::CosmosResult, link::ResourceLink};

use crate::{
    cache::ResourceCache,
    client::Client,
    collection::Collection,
    headers,
    models::{
        self, CreateCollectionRequest, IndexingPolicy, ListCollectionsResponse,
        PARTITION_KEY_VERSION, PartitionKeyDefinition, ReplaceCollectionRequest,
    },
    options::{CreateCollectionOptions, Offer},
    pipeline::Request,
};

/// A handle to one database.
///
/// Collection metadata fetched through the handle is cached for the client's
/// `collection_cache_ttl`; clones share the cache.
#[derive(Debug, Clone)]
pub struct Database {
    client: Client,
    model: models::Database,
    collections: ResourceCache<models::Collection>,
}

impl Database {
    pub(crate) fn new(client: Client, model: models::Database) -> Self {
        let collections = ResourceCache::new(client.options().collection_cache_ttl);
        Self { client, model, collections }
    }

    pub fn id(&self) -> &str {
        &self.model.id
    }

    pub fn properties(&self) -> &models::Database {
        &self.model
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn handle(&self, model: models::Collection) -> Collection {
        Collection::new(self.client.clone(), self.id().to_string(), model)
    }

    async fn remember(&self, model: models::Collection) -> Collection {
        self.collections.insert(model.id.clone(), model.clone()).await;
        self.handle(model)
    }

    #[instrument(skip(self), fields(database = %self.id()))]
    pub async fn list_collections(&self) -> CosmosResult<Vec<Collection>> {
        let list: ListCollectionsResponse = self
            .client
            .pipeline()
            .execute(&Request::get(ResourceLink::collection(self.id(), "")))
            .await?
            .json()?
            .unwrap_or_default();

        let mut collections = Vec::with_capacity(list.collections.len());
        for model in list.collections {
            collections.push(self.remember(model).await);
        }

        Ok(collections)
    }

    /// Fetches a collection, answering from the cache while the entry is live.
    #[instrument(skip(self), fields(database = %self.id()))]
    pub async fn collection(&self, id: &str) -> CosmosResult<Collection> {
        if let Some(model) = self.collections.get(id).await {
            debug!(collection = id, "collection cache hit");
            return Ok(self.handle(model));
        }

        let model: models::Collection = self
            .client
            .pipeline()
            .execute(&Request::get(ResourceLink::collection(self.id(), id)))
            .await?
            .json_required()?;

        Ok(self.remember(model).await)
    }

    /// Creates a collection.
    ///
    /// Without an explicit partition key the collection is partitioned on `/id`
    /// with a hash partition key, version 2.
    #[instrument(skip(self, options), fields(database = %self.id()))]
    pub async fn create_collection(
        &self,
        id: &str,
        options: CreateCollectionOptions,
    ) -> CosmosResult<Collection> {
        let mut partition_key = options.partition_key.unwrap_or_default();
        if partition_key.paths.is_empty() {
            partition_key.paths = PartitionKeyDefinition::default().paths;
        }
        partition_key.version = Some(PARTITION_KEY_VERSION);

        let body = CreateCollectionRequest {
            id: id.to_string(),
            indexing_policy: options.indexing_policy.unwrap_or_default(),
            partition_key,
        };

        let mut request = Request::post(ResourceLink::collection(self.id(), "")).json(&body)?;
        request = match options.offer {
            Some(Offer::Throughput(throughput)) => {
                request.header(headers::OFFER_THROUGHPUT, throughput.to_string())?
            }
            Some(Offer::Autopilot(settings)) => {
                request.header(headers::OFFER_AUTOPILOT, serde_json::to_string(&settings)?)?
            }
            None => request,
        };

        let model: models::Collection = self
            .client
            .pipeline()
            .execute(&request)
            .await?
            .json_required()?;

        Ok(self.remember(model).await)
    }

    /// Replaces a collection's indexing policy.
    #[instrument(skip(self, indexing_policy), fields(database = %self.id()))]
    pub async fn replace_collection(
        &self,
        id: &str,
        indexing_policy: IndexingPolicy,
    ) -> CosmosResult<Collection> {
        let body = ReplaceCollectionRequest { id: id.to_string(), indexing_policy };
        let request = Request::put(ResourceLink::collection(self.id(), id)).json(&body)?;

        let model: models::Collection = self
            .client
            .pipeline()
            .execute(&request)
            .await?
            .json_required()?;

        Ok(self.remember(model).await)
    }

    #[instrument(skip(self), fields(database = %self.id()))]
    pub async fn delete_collection(&self, id: &str) -> CosmosResult<()> {
        self.client
            .pipeline()
            .execute(&Request::delete(ResourceLink::collection(self.id(), id)))
            .await?;
        self.collections.invalidate(id).await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{AutopilotSettings, IndexingMode, PartitionKind},
        pipeline::HttpResponse,
        testing::{ScriptedTransport, client, json_response},
    };
    use reqwest::Method;
    use serde_json::{Value, json};
    use std::time::Duration;

    fn database(transport: &ScriptedTransport) -> Database {
        Database::new(client(transport), models::Database { id: "d1".into(), ..Default::default() })
    }

    fn body(request: &crate::pipeline::HttpRequest) -> Value {
        serde_json::from_slice(request.body.as_deref().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_collection_is_cached() {
        let transport = ScriptedTransport::new([json_response(200, json!({"id": "c1"}))]);
        let db = database(&transport);

        assert_eq!(db.collection("c1").await.unwrap().id(), "c1");
        assert_eq!(db.collection("c1").await.unwrap().id(), "c1");
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(transport.requests()[0].url.path(), "/dbs/d1/colls/c1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_collection_expires() {
        let transport = ScriptedTransport::repeat(HttpResponse::new(200).with_body(r#"{"id":"c1"}"#));
        let db = database(&transport);

        db.collection("c1").await.unwrap();
        tokio::time::advance(Duration::from_secs(301)).await;
        db.collection("c1").await.unwrap();

        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_listing_fills_cache() {
        let transport = ScriptedTransport::new([json_response(
            200,
            json!({"DocumentCollections": [{"id": "c1"}, {"id": "c2"}], "_count": 2}),
        )]);
        let db = database(&transport);

        assert_eq!(db.list_collections().await.unwrap().len(), 2);
        assert_eq!(db.collection("c2").await.unwrap().id(), "c2");
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(transport.requests()[0].url.path(), "/dbs/d1/colls");
    }

    #[tokio::test]
    async fn test_create_collection_defaults() {
        let transport = ScriptedTransport::new([json_response(201, json!({"id": "c1"}))]);
        let db = database(&transport);

        db.create_collection("c1", CreateCollectionOptions::new()).await.unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.method, Method::POST);
        assert_eq!(sent.url.path(), "/dbs/d1/colls");
        assert_eq!(body(sent)["partitionKey"], json!({"paths": ["/id"], "kind": "Hash", "version": 2}));
        assert!(!sent.headers.contains_key(headers::OFFER_THROUGHPUT));
        assert!(!sent.headers.contains_key(headers::OFFER_AUTOPILOT));
    }

    #[tokio::test]
    async fn test_create_collection_with_options() {
        let transport = ScriptedTransport::new([
            json_response(201, json!({"id": "c1"})),
            json_response(201, json!({"id": "c2"})),
        ]);
        let db = database(&transport);

        let options = CreateCollectionOptions::new()
            .partition_key(PartitionKeyDefinition {
                paths: vec!["/tenant".into()],
                kind: PartitionKind::Range,
                version: None,
            })
            .throughput(400);
        db.create_collection("c1", options).await.unwrap();

        let options = CreateCollectionOptions::new()
            .throughput(400)
            .autopilot(AutopilotSettings { max_throughput: 4000 });
        db.create_collection("c2", options).await.unwrap();

        let sent = transport.requests();
        assert_eq!(body(&sent[0])["partitionKey"], json!({"paths": ["/tenant"], "kind": "Range", "version": 2}));
        assert_eq!(sent[0].headers[headers::OFFER_THROUGHPUT], "400");
        assert!(!sent[1].headers.contains_key(headers::OFFER_THROUGHPUT));
        assert_eq!(sent[1].headers[headers::OFFER_AUTOPILOT], r#"{"maxThroughput":4000}"#);
    }

    #[tokio::test]
    async fn test_replace_and_delete_collection() {
        let transport = ScriptedTransport::new([
            json_response(200, json!({"id": "c1", "indexingPolicy": {"automatic": false, "indexingMode": "Lazy"}})),
            Ok(HttpResponse::new(204)),
            json_response(200, json!({"id": "c1"})),
        ]);
        let db = database(&transport);

        let policy = IndexingPolicy {
            automatic: false,
            indexing_mode: IndexingMode::Lazy,
            ..Default::default()
        };
        let replaced = db.replace_collection("c1", policy).await.unwrap();
        assert_eq!(replaced.properties().indexing_policy.indexing_mode, IndexingMode::Lazy);

        db.delete_collection("c1").await.unwrap();
        db.collection("c1").await.unwrap();

        let sent = transport.requests();
        assert_eq!(sent[0].method, Method::PUT);
        assert_eq!(body(&sent[0]), json!({"id": "c1", "indexingPolicy": {
            "automatic": false, "indexingMode": "Lazy", "includedPaths": [], "excludedPaths": []
        }}));
        assert_eq!(sent[1].method, Method::DELETE);
        assert_eq!(sent.len(), 3);
    }
}
