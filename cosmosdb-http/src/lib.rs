//! HTTP client for the document database REST API.
//!
//! This crate sends the requests described by `cosmosdb-core` to a database
//! account. It owns everything that touches the wire:
//!
//! - **Authentication** ([`auth`]) - Master-key HMAC signing of every request
//! - **Retries** ([`retry`]) - Server retry hints and throttling back-off
//! - **Request pipeline** ([`pipeline`]) - Default headers, signing, sending and error classification
//! - **Pagination** ([`iterator`]) - Continuation-token iteration over feeds and queries
//! - **Resources** ([`Client`], [`Database`], [`Collection`]) - Database, collection, document and attachment operations
//!
//! # Example
//!
//! ```ignore
//! use cosmosdb_http::{Client, models::QueryParameter};
//! use cosmosdb_core::query::{Filter, Query};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::builder()
//!         .connection_string(&std::env::var("COSMOS_CONNECTION_STRING")?)
//!         .build()?;
//!
//!     let users = client.database("app").await?.collection("users").await?;
//!     let query = Query::all().filter(Filter::eq("c.email", "@email"));
//!
//!     let mut found = users
//!         .query_documents(None, &query, [QueryParameter::new("@email", "ann@example.com")])
//!         .await?;
//!     while let Some(user) = found.next::<serde_json::Value>().await {
//!         println!("{}", user);
//!     }
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as cosmosdb_http;

pub mod auth;
pub mod cache;
pub mod client;
pub mod collection;
pub mod database;
pub mod headers;
pub mod iterator;
pub mod models;
pub mod options;
pub mod pipeline;
pub mod retry;

#[cfg(test)]
mod testing;

pub use client::Client;
pub use collection::Collection;
pub use database::Database;
pub use iterator::DocumentIterator;
pub use options::{ClientBuilder, ClientOptions, CreateCollectionOptions};
pub use pipeline::{ReqwestTransport, Transport};
