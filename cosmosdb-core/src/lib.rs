//! Transport-independent building blocks of the document database client.
//!
//! This crate is the core of the cosmosdb workspace and provides:
//!
//! - **Query and filtering API** ([`query`]) - Immutable query values and a closed filter expression tree
//! - **Query rendering** ([`sql`], [`value`]) - Translation of expressions and literals into query text
//! - **Resource links** ([`link`]) - Addressing of databases, collections, documents and attachments
//! - **Document identity** ([`document`]) - The [`document::HasId`] capability and system properties
//! - **Pages** ([`page`]) - One page of a feed or query result
//! - **Error handling** ([`error`]) - Error kinds and the crate result type
//!
//! # Example
//!
//! ```ignore
//! use cosmosdb_core::query::{Filter, Query, SortDirection};
//!
//! let query = Query::select(["c.id", "c.name"])
//!     .filter(Filter::and([
//!         Filter::eq("c.kind", "user"),
//!         Filter::is_not_null("c.email"),
//!     ]))
//!     .order_by("c.name", SortDirection::Asc);
//!
//! assert_eq!(
//!     query.to_string(),
//!     "SELECT c.id,c.name FROM c WHERE (c.kind = 'user' AND IS_NULL(c.email) = false) ORDER BY c.name ASC",
//! );
//! ```

#[allow(unused_extern_crates)]
extern crate self as cosmosdb_core;

pub mod document;
pub mod error;
pub mod link;
pub mod page;
pub mod query;
pub mod sql;
pub mod value;
