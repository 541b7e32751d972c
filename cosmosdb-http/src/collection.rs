//! Collection handles: documents, queries and attachments.

use reqwest::Method;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use tracing::{debug, instrument};

use cosmosdb_core::{
    document::{Document, HasId, document_id},
    error::CosmosResult,
    link::ResourceLink,
};

use crate::{
    client::Client,
    headers,
    iterator::DocumentIterator,
    models::{self, Attachment, ListAttachmentsResponse, PartitionKey, QueryBody, QueryParameter},
    pipeline::Request,
};

/// A handle to one collection.
///
/// Per-document operations take the document's partition key, sent as the
/// `x-ms-documentdb-partitionkey` header.
#[derive(Debug, Clone)]
pub struct Collection {
    client: Client,
    database_id: String,
    model: models::Collection,
}

impl Collection {
    pub(crate) fn new(client: Client, database_id: String, model: models::Collection) -> Self {
        Self { client, database_id, model }
    }

    pub fn id(&self) -> &str {
        &self.model.id
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    pub fn properties(&self) -> &models::Collection {
        &self.model
    }

    fn document_link(&self, document_id: &str) -> ResourceLink {
        ResourceLink::document(&self.database_id, self.id(), document_id)
    }

    fn attachment_link(&self, document_id: &str, attachment_id: &str) -> ResourceLink {
        ResourceLink::attachment(&self.database_id, self.id(), document_id, attachment_id)
    }

    fn partitioned(&self, request: Request, partition_key: &PartitionKey) -> CosmosResult<Request> {
        request.header(headers::PARTITION_KEY, partition_key.header_value())
    }

    /// Lists every document in the collection.
    #[instrument(skip(self), fields(database = %self.database_id, collection = %self.id()))]
    pub async fn list_documents(&self) -> CosmosResult<DocumentIterator> {
        let request = Request::get(self.document_link(""));
        DocumentIterator::start(self.client.pipeline().clone(), request).await
    }

    #[instrument(skip(self, partition_key), fields(database = %self.database_id, collection = %self.id()))]
    pub async fn get_document<T: DeserializeOwned>(
        &self,
        partition_key: impl Into<PartitionKey>,
        id: &str,
    ) -> CosmosResult<T> {
        let request = self.partitioned(Request::get(self.document_link(id)), &partition_key.into())?;

        self.client.pipeline().execute(&request).await?.json_required()
    }

    /// Creates a document, or replaces it when `upsert` is set.
    #[instrument(skip(self, partition_key, document), fields(database = %self.database_id, collection = %self.id()))]
    pub async fn create_document<D: Serialize + ?Sized>(
        &self,
        partition_key: impl Into<PartitionKey>,
        document: &D,
        upsert: bool,
    ) -> CosmosResult<Document> {
        let mut request = self.partitioned(
            Request::post(self.document_link("")).json(document)?,
            &partition_key.into(),
        )?;
        if upsert {
            request = request.header(headers::IS_UPSERT, headers::TRUE)?;
        }

        self.client.pipeline().execute(&request).await?.json_required()
    }

    /// Replaces the document identified by `document`'s id.
    #[instrument(
        skip(self, partition_key, document),
        fields(database = %self.database_id, collection = %self.id(), document = document.id().unwrap_or_default())
    )]
    pub async fn replace_document<D: Serialize + HasId + ?Sized>(
        &self,
        partition_key: impl Into<PartitionKey>,
        document: &D,
    ) -> CosmosResult<Document> {
        let id = document_id(document)?;
        let request = self.partitioned(
            Request::put(self.document_link(id)).json(document)?,
            &partition_key.into(),
        )?;

        self.client.pipeline().execute(&request).await?.json_required()
    }

    #[instrument(
        skip(self, partition_key, document),
        fields(database = %self.database_id, collection = %self.id(), document = document.id().unwrap_or_default())
    )]
    pub async fn delete_document<D: HasId + ?Sized>(
        &self,
        partition_key: impl Into<PartitionKey>,
        document: &D,
    ) -> CosmosResult<()> {
        let id = document_id(document)?;
        let request = self.partitioned(Request::delete(self.document_link(id)), &partition_key.into())?;

        self.client.pipeline().execute(&request).await?;
        Ok(())
    }

    /// Runs a query and returns an iterator over its results.
    ///
    /// Without a partition key the query fans out across partitions. Parameters
    /// whose name does not appear in the query text are not sent.
    #[instrument(skip(self, partition_key, query, parameters), fields(database = %self.database_id, collection = %self.id()))]
    pub async fn query_documents(
        &self,
        partition_key: Option<PartitionKey>,
        query: impl fmt::Display,
        parameters: impl IntoIterator<Item = QueryParameter>,
    ) -> CosmosResult<DocumentIterator> {
        let body = QueryBody::new(query.to_string(), parameters);
        debug!(statement = %body.query, parameters = body.parameters.len(), "query");

        let mut request = Request::post(self.document_link(""))
            .header(headers::CONTENT_TYPE, headers::CONTENT_TYPE_QUERY)?
            .header(headers::IS_QUERY, headers::TRUE)?
            .json(&body)?;
        request = match &partition_key {
            Some(partition_key) => self.partitioned(request, partition_key)?,
            None => request.header(headers::QUERY_CROSS_PARTITION, headers::TRUE)?,
        };

        DocumentIterator::start(self.client.pipeline().clone(), request).await
    }

    #[instrument(
        skip(self, partition_key, document),
        fields(database = %self.database_id, collection = %self.id(), document = document.id().unwrap_or_default())
    )]
    pub async fn list_attachments<D: HasId + ?Sized>(
        &self,
        partition_key: impl Into<PartitionKey>,
        document: &D,
    ) -> CosmosResult<Vec<Attachment>> {
        let link = self.attachment_link(document_id(document)?, "");
        let request = self.partitioned(Request::get(link), &partition_key.into())?;

        let list: ListAttachmentsResponse = self
            .client
            .pipeline()
            .execute(&request)
            .await?
            .json()?
            .unwrap_or_default();

        Ok(list.attachments)
    }

    #[instrument(
        skip(self, partition_key, document),
        fields(database = %self.database_id, collection = %self.id(), document = document.id().unwrap_or_default())
    )]
    pub async fn get_attachment<D: HasId + ?Sized>(
        &self,
        partition_key: impl Into<PartitionKey>,
        document: &D,
        id: &str,
    ) -> CosmosResult<Attachment> {
        let link = self.attachment_link(document_id(document)?, id);
        let request = self.partitioned(Request::get(link), &partition_key.into())?;

        self.client.pipeline().execute(&request).await?.json_required()
    }

    /// Uploads raw attachment content.
    #[instrument(
        skip(self, partition_key, document, content),
        fields(database = %self.database_id, collection = %self.id(), document = document.id().unwrap_or_default())
    )]
    pub async fn create_attachment_from_bytes<D: HasId + ?Sized>(
        &self,
        partition_key: impl Into<PartitionKey>,
        document: &D,
        id: &str,
        content_type: &str,
        content: impl Into<Vec<u8>>,
    ) -> CosmosResult<Attachment> {
        let link = self.attachment_link(document_id(document)?, "");
        self.send_content(Method::POST, link, &partition_key.into(), id, content_type, content.into())
            .await
    }

    /// Creates an attachment that points at externally hosted media.
    #[instrument(
        skip(self, partition_key, document),
        fields(database = %self.database_id, collection = %self.id(), document = document.id().unwrap_or_default())
    )]
    pub async fn create_attachment_from_media<D: HasId + ?Sized>(
        &self,
        partition_key: impl Into<PartitionKey>,
        document: &D,
        id: &str,
        content_type: &str,
        media: &str,
    ) -> CosmosResult<Attachment> {
        let link = self.attachment_link(document_id(document)?, "");
        self.send_media(Method::POST, link, &partition_key.into(), id, content_type, media)
            .await
    }

    #[instrument(
        skip(self, partition_key, document, content),
        fields(database = %self.database_id, collection = %self.id(), document = document.id().unwrap_or_default())
    )]
    pub async fn replace_attachment_from_bytes<D: HasId + ?Sized>(
        &self,
        partition_key: impl Into<PartitionKey>,
        document: &D,
        id: &str,
        content_type: &str,
        content: impl Into<Vec<u8>>,
    ) -> CosmosResult<Attachment> {
        let link = self.attachment_link(document_id(document)?, id);
        self.send_content(Method::PUT, link, &partition_key.into(), id, content_type, content.into())
            .await
    }

    #[instrument(
        skip(self, partition_key, document),
        fields(database = %self.database_id, collection = %self.id(), document = document.id().unwrap_or_default())
    )]
    pub async fn replace_attachment_from_media<D: HasId + ?Sized>(
        &self,
        partition_key: impl Into<PartitionKey>,
        document: &D,
        id: &str,
        content_type: &str,
        media: &str,
    ) -> CosmosResult<Attachment> {
        let link = self.attachment_link(document_id(document)?, id);
        self.send_media(Method::PUT, link, &partition_key.into(), id, content_type, media)
            .await
    }

    #[instrument(
        skip(self, partition_key, document),
        fields(database = %self.database_id, collection = %self.id(), document = document.id().unwrap_or_default())
    )]
    pub async fn delete_attachment<D: HasId + ?Sized>(
        &self,
        partition_key: impl Into<PartitionKey>,
        document: &D,
        id: &str,
    ) -> CosmosResult<()> {
        let link = self.attachment_link(document_id(document)?, id);
        let request = self.partitioned(Request::delete(link), &partition_key.into())?;

        self.client.pipeline().execute(&request).await?;
        Ok(())
    }

    async fn send_content(
        &self,
        method: Method,
        link: ResourceLink,
        partition_key: &PartitionKey,
        id: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> CosmosResult<Attachment> {
        let request = self
            .partitioned(Request::new(method, link), partition_key)?
            .header(headers::CONTENT_TYPE, content_type)?
            .header(headers::SLUG, id)?
            .bytes(content);

        self.client.pipeline().execute(&request).await?.json_required()
    }

    async fn send_media(
        &self,
        method: Method,
        link: ResourceLink,
        partition_key: &PartitionKey,
        id: &str,
        content_type: &str,
        media: &str,
    ) -> CosmosResult<Attachment> {
        let attachment = Attachment {
            id: id.to_string(),
            content_type: content_type.to_string(),
            media: Some(media.to_string()),
            ..Default::default()
        };
        let request = self
            .partitioned(Request::new(method, link), partition_key)?
            .json(&attachment)?;

        self.client.pipeline().execute(&request).await?.json_required()
    }
}
