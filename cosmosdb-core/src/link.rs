//! Resource links addressing the database → collection → document → attachment hierarchy.
//!
//! A link alternates `{type}/{id}` segments. An empty trailing id addresses the
//! parent's feed (list and create operations), e.g. `dbs/d1/colls`.

use std::fmt;

/// A slash-delimited path identifying a resource or a resource feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceLink(String);

impl ResourceLink {
    /// Link to a database, or to the database feed when `database_id` is empty.
    pub fn database(database_id: &str) -> Self {
        ResourceLink(segment("dbs".to_string(), database_id))
    }

    /// Link to a collection, or to the collection feed when `collection_id` is empty.
    pub fn collection(database_id: &str, collection_id: &str) -> Self {
        ResourceLink(segment(
            Self::database(database_id).0 + "/colls",
            collection_id,
        ))
    }

    /// Link to a document, or to the document feed when `document_id` is empty.
    pub fn document(database_id: &str, collection_id: &str, document_id: &str) -> Self {
        ResourceLink(segment(
            Self::collection(database_id, collection_id).0 + "/docs",
            document_id,
        ))
    }

    /// Link to an attachment, or to the attachment feed when `attachment_id` is empty.
    pub fn attachment(
        database_id: &str,
        collection_id: &str,
        document_id: &str,
        attachment_id: &str,
    ) -> Self {
        ResourceLink(segment(
            Self::document(database_id, collection_id, document_id).0 + "/attachments",
            attachment_id,
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derives the `(resource type, resource id)` pair used when signing a request.
    ///
    /// The path is padded with leading and trailing slashes and split into
    /// segments. With an even segment count the link ends in `{type}/{id}`, so the
    /// type is the third-from-last segment and the id is everything but the padding.
    /// With an odd count the link ends in a bare `{type}` feed, so the type is the
    /// second-from-last segment and the id is the parent path.
    pub fn resource_type_and_id(&self) -> (String, String) {
        resource_type_and_id(&self.0)
    }
}

impl fmt::Display for ResourceLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceLink {
    fn from(link: &str) -> Self {
        ResourceLink(link.to_string())
    }
}

impl AsRef<str> for ResourceLink {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn segment(parent: String, id: &str) -> String {
    if id.is_empty() { parent } else { format!("{}/{}", parent, id) }
}

/// See [`ResourceLink::resource_type_and_id`]. Accepts any path, with or without
/// surrounding slashes.
pub fn resource_type_and_id(path: &str) -> (String, String) {
    let mut padded = String::with_capacity(path.len() + 2);
    if !path.starts_with('/') {
        padded.push('/');
    }
    padded.push_str(path);
    if !padded.ends_with('/') {
        padded.push('/');
    }

    let parts = padded.split('/').collect::<Vec<_>>();
    let len = parts.len();
    if len < 3 {
        return (String::new(), String::new());
    }

    if len % 2 == 0 {
        (parts[len - 3].to_string(), parts[1..len - 1].join("/"))
    } else {
        (parts[len - 2].to_string(), parts[1..len - 2].join("/"))
    }
}
