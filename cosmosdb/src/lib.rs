//! A typed client for a document database's resource-oriented REST API.
//!
//! This crate is the primary entry point. It re-exports the transport-independent
//! model from `cosmosdb-core` and the HTTP client from `cosmosdb-http`.
//!
//! # Features
//!
//! - **Hierarchical resources** - Databases, collections, documents and attachments addressed by id
//! - **Request signing** - Master-key authentication computed for every attempt
//! - **Throttling recovery** - Server retry hints honoured within a retry budget
//! - **Lazy pagination** - Feeds and queries streamed page by page with continuation tokens
//! - **Composable queries** - Immutable query values rendered to the service's SQL dialect
//!
//! # Quick Start
//!
//! ```ignore
//! use cosmosdb::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! pub struct User {
//!     pub id: String,
//!     pub tenant: String,
//!     pub name: String,
//! }
//!
//! impl HasId for User {
//!     fn id(&self) -> Option<&str> { Some(&self.id) }
//! }
//!
//! #[tokio::main]
//! async fn main() -> CosmosResult<()> {
//!     let client = Client::new("https://localhost:8081/", "<base64 key>")?;
//!
//!     let db = client.create_database("app").await?;
//!     let users = db
//!         .create_collection(
//!             "users",
//!             CreateCollectionOptions::new()
//!                 .partition_key(PartitionKeyDefinition::new("/tenant"))
//!                 .throughput(400),
//!         )
//!         .await?;
//!
//!     let user = User { id: "u1".into(), tenant: "acme".into(), name: "Alice".into() };
//!     users.create_document("acme", &user, false).await?;
//!
//!     let query = Query::select(["c.id", "c.name"])
//!         .filter(Filter::and([Filter::eq("c.tenant", "@tenant"), Filter::is_defined("c.name")]))
//!         .order_by("c.name", SortDirection::Asc);
//!
//!     let mut results = users
//!         .query_documents(Some("acme".into()), &query, [QueryParameter::new("@tenant", "acme")])
//!         .await?;
//!     while let Some(row) = results.next::<serde_json::Value>().await {
//!         println!("{}", row);
//!     }
//!
//!     users.delete_document("acme", &user).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Deadlines
//!
//! A client derived with [`Client::with_deadline`] bounds every call, retries
//! included. Calls that cannot finish in time fail with
//! [`CosmosError::Cancelled`](error::CosmosError::Cancelled).

pub mod prelude;

pub use cosmosdb_core::{document, error, link, page, query, sql, value};
pub use cosmosdb_http::{
    Client, ClientBuilder, ClientOptions, Collection, CreateCollectionOptions, Database,
    DocumentIterator, ReqwestTransport, Transport, auth, cache, headers, models, options,
    pipeline, retry,
};

// Re-export value types for convenience
pub use bson;
pub use serde_json;
