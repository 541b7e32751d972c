//! The account-level entry point.

use serde_json::json;
use tokio::time::Instant;
use tracing::instrument;
use url::Url;

use cosmosdb_core::{error::CosmosResult, link::ResourceLink};

use crate::{
    database::Database,
    models::{self, ListDatabasesResponse},
    options::{ClientBuilder, ClientOptions},
    pipeline::{Pipeline, Request},
};

/// A client for one database account.
///
/// Cheap to clone. Every handle it hands out shares its pipeline.
///
/// ```ignore
/// let client = Client::new("https://localhost:8081/", &key)?;
/// let db = client.database("app").await?;
/// let users = db.collection("users").await?;
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    pipeline: Pipeline,
    options: ClientOptions,
}

impl Client {
    /// Connects to `endpoint` with a base64 master key and default options.
    pub fn new(endpoint: &str, key: &str) -> CosmosResult<Self> {
        ClientBuilder::new().endpoint(endpoint).key(key).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn from_parts(pipeline: Pipeline, options: ClientOptions) -> Self {
        Self { pipeline, options }
    }

    /// Returns a client whose calls, retries included, must finish by `deadline`.
    ///
    /// Calls still running at the deadline fail with `Cancelled`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        Self {
            pipeline: self.pipeline.with_deadline(deadline),
            options: self.options.clone(),
        }
    }

    pub fn endpoint(&self) -> &Url {
        self.pipeline.endpoint()
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Fetches a database by id.
    #[instrument(skip(self))]
    pub async fn database(&self, id: &str) -> CosmosResult<Database> {
        let model: models::Database = self
            .pipeline
            .execute(&Request::get(ResourceLink::database(id)))
            .await?
            .json_required()?;

        Ok(Database::new(self.clone(), model))
    }

    #[instrument(skip(self))]
    pub async fn list_databases(&self) -> CosmosResult<Vec<Database>> {
        let list: ListDatabasesResponse = self
            .pipeline
            .execute(&Request::get(ResourceLink::database("")))
            .await?
            .json()?
            .unwrap_or_default();

        Ok(list
            .databases
            .into_iter()
            .map(|model| Database::new(self.clone(), model))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn create_database(&self, id: &str) -> CosmosResult<Database> {
        let request = Request::post(ResourceLink::database("")).json(&json!({ "id": id }))?;
        let model: models::Database = self.pipeline.execute(&request).await?.json_required()?;

        Ok(Database::new(self.clone(), model))
    }

    #[instrument(skip(self))]
    pub async fn delete_database(&self, id: &str) -> CosmosResult<()> {
        self.pipeline
            .execute(&Request::delete(ResourceLink::database(id)))
            .await?;

        Ok(())
    }
}
