//! A single page of a feed or query result.
//!
//! The service returns large result sets one page at a time. Each page carries
//! the items it holds, the item count the service declared, and an opaque
//! continuation token that fetches the next page.

use serde::{Deserialize, Serialize};

/// A single page of results.
///
/// # Example
///
/// ```ignore
/// use cosmosdb_core::page::Page;
///
/// let page: Page<String> = Page::builder(vec!["item1".to_string()])
///     .with_count(100)
///     .with_continuation(Some("token".to_string()))
///     .build();
///
/// assert!(page.has_more());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The items contained in this page.
    pub items: Vec<T>,
    /// Item count declared by the service. Advisory: for cross-partition queries
    /// it may not match the number of items eventually returned.
    pub count: usize,
    /// Token for the next page, `None` on the last page.
    pub continuation: Option<String>,
}

impl<T> Page<T> {
    /// Creates a new builder for constructing a page.
    pub fn builder(items: Vec<T>) -> PageBuilder<T> {
        PageBuilder::new(items)
    }

    /// Returns true if the service reported a further page.
    pub fn has_more(&self) -> bool {
        self.continuation.as_deref().is_some_and(|token| !token.is_empty())
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            count: 0,
            continuation: None,
        }
    }
}

/// Builder for constructing [`Page`] instances.
pub struct PageBuilder<T> {
    items: Vec<T>,
    count: Option<usize>,
    continuation: Option<String>,
}

impl<T> PageBuilder<T> {
    /// Creates a new builder with the given items.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            count: None,
            continuation: None,
        }
    }

    /// Sets the declared item count. Defaults to the number of items.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Sets the continuation token. Empty tokens are normalized to `None`.
    pub fn with_continuation(mut self, continuation: Option<String>) -> Self {
        self.continuation = continuation.filter(|token| !token.is_empty());
        self
    }

    /// Builds and returns the final [`Page`] instance.
    pub fn build(self) -> Page<T> {
        Page {
            count: self.count.unwrap_or(self.items.len()),
            items: self.items,
            continuation: self.continuation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let page = Page::builder(vec![1, 2, 3]).build();
        assert_eq!(page.count, 3);
        assert!(!page.has_more());
    }

    #[test]
    fn test_empty_continuation_is_last_page() {
        let page = Page::builder(vec![1])
            .with_count(10)
            .with_continuation(Some(String::new()))
            .build();

        assert_eq!(page.continuation, None);
        assert!(!page.has_more());

        let page = Page::builder(vec![1]).with_continuation(Some("T1".into())).build();
        assert!(page.has_more());
    }
}
