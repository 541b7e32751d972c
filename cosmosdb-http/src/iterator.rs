//! Lazy iteration over paged document feeds and query results.

use futures::{Stream, stream};
use serde::de::DeserializeOwned;
use serde_json::value::RawValue;

use cosmosdb_core::{
    error::{CosmosError, CosmosResult},
    page::Page,
};

use crate::{
    headers,
    models::ListDocumentsResponse,
    pipeline::{HttpResponse, Pipeline, Request},
};

/// Streams the documents of a listing or query, one page at a time.
///
/// Buffered items are decoded on demand. Once the buffer is drained the next
/// page is fetched with the stored continuation token, replaying the original
/// request: a `GET` for a listing, a `POST` of the same query body for a query.
/// Iteration stops once the declared total is reached, even if the service
/// returned a token. An empty token ends the sequence even if the service
/// declared more items.
///
/// A failed fetch or decode is sticky: [`next`](Self::next) keeps returning
/// `None` and [`err`](Self::err) reports the failure until [`reset`](Self::reset).
///
/// ```ignore
/// let mut docs = collection.query_documents(None, &query, []).await?;
///
/// while let Some(user) = docs.next::<User>().await {
///     println!("{}", user.name);
/// }
/// if let Some(err) = docs.err() {
///     return Err(err.clone());
/// }
/// ```
pub struct DocumentIterator {
    pipeline: Pipeline,
    request: Request,
    continuation: Option<String>,
    documents: Vec<Box<RawValue>>,
    total: usize,
    cursor: usize,
    error: Option<CosmosError>,
}

impl DocumentIterator {
    /// Builds an iterator from the first page of a response to `request`.
    pub fn new(pipeline: Pipeline, request: Request, first: &HttpResponse) -> CosmosResult<Self> {
        let page: ListDocumentsResponse = first.json()?.unwrap_or_default();

        Ok(Self {
            pipeline,
            request: request
                .without_header(headers::AUTHORIZATION)
                .without_header(headers::DATE)
                .without_header(headers::CONTINUATION),
            continuation: first.continuation(),
            total: page.count,
            documents: page.documents,
            cursor: 0,
            error: None,
        })
    }

    /// Sends `request` and wraps its first page.
    pub(crate) async fn start(pipeline: Pipeline, request: Request) -> CosmosResult<Self> {
        let first = pipeline.execute(&request).await?;
        Self::new(pipeline, request, &first)
    }

    /// Decodes the next document, fetching the next page when needed.
    ///
    /// Returns `None` when the sequence is exhausted or the iterator has failed.
    pub async fn next<T: DeserializeOwned>(&mut self) -> Option<T> {
        if self.error.is_some() {
            return None;
        }

        loop {
            if let Some(raw) = self.documents.get(self.cursor) {
                self.cursor += 1;

                return match serde_json::from_str(raw.get()) {
                    Ok(item) => Some(item),
                    Err(e) => {
                        self.error = Some(e.into());
                        None
                    }
                };
            }

            if self.cursor >= self.total {
                return None;
            }
            let token = self.continuation.clone()?;
            if let Err(e) = self.fetch_next(&token).await {
                self.error = Some(e);
                return None;
            }
        }
    }

    async fn fetch_next(&mut self, token: &str) -> CosmosResult<()> {
        let request = self.request.clone().header(headers::CONTINUATION, token)?;
        let response = self.pipeline.execute(&request).await?;
        let page: ListDocumentsResponse = response.json()?.unwrap_or_default();

        self.continuation = response.continuation();
        self.documents.extend(page.documents);

        Ok(())
    }

    /// The failure that stopped iteration, if any.
    pub fn err(&self) -> Option<&CosmosError> {
        self.error.as_ref()
    }

    /// Rewinds over the buffered documents and clears the error. No I/O.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.error = None;
    }

    /// The declared total, never less than what is already buffered.
    pub fn count(&self) -> usize {
        self.total.max(self.documents.len())
    }

    pub fn is_query(&self) -> bool {
        self.request.body().is_some()
    }

    /// Whether the service reported a further page.
    pub fn has_more_pages(&self) -> bool {
        self.continuation.is_some()
    }

    /// Drains the remaining documents into a vector.
    pub async fn all<T: DeserializeOwned>(&mut self) -> CosmosResult<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await {
            items.push(item);
        }

        match &self.error {
            Some(e) => Err(e.clone()),
            None => Ok(items),
        }
    }

    /// Decodes the buffered documents as a [`Page`] without fetching.
    pub fn buffered_page<T: DeserializeOwned>(&self) -> CosmosResult<Page<T>> {
        let items = self
            .documents
            .iter()
            .map(|raw| serde_json::from_str(raw.get()).map_err(CosmosError::from))
            .collect::<CosmosResult<Vec<T>>>()?;

        Ok(Page::builder(items)
            .with_count(self.count())
            .with_continuation(self.continuation.clone())
            .build())
    }

    /// Converts the iterator into a stream that ends after the first error.
    pub fn into_stream<T: DeserializeOwned>(self) -> impl Stream<Item = CosmosResult<T>> {
        stream::unfold(Some(self), |state| async move {
            let mut iterator = state?;

            match iterator.next::<T>().await {
                Some(item) => Some((Ok(item), Some(iterator))),
                None => iterator.error.take().map(|e| (Err(e), None)),
            }
        })
    }
}
