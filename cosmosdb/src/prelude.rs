//! Convenient re-exports of commonly used types from cosmosdb.
//!
//! ```ignore
//! use cosmosdb::prelude::*;
//! ```
//!
//! This provides access to:
//! - The client and its resource handles
//! - Query construction and filtering
//! - Document identity and wire models
//! - Error types

pub use cosmosdb_core::{
    document::{Document, HasId, Identified, SystemProperties},
    error::{CosmosError, CosmosResult},
    link::ResourceLink,
    page::Page,
    query::{CompareOp, Expr, Filter, Operand, Query, QueryVisitor, Sort, SortDirection},
    sql::SqlRenderer,
};
pub use cosmosdb_http::{
    Client, ClientBuilder, ClientOptions, Collection, CreateCollectionOptions, Database,
    DocumentIterator,
    models::{
        Attachment, AutopilotSettings, IndexingPolicy, PartitionKey, PartitionKeyDefinition,
        QueryParameter,
    },
};
