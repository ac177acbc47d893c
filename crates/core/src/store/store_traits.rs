use async_trait::async_trait;

use crate::errors::Result;

/// A document: flat map of field name to JSON value.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Per-user document storage, keyed by collection and document id.
///
/// Shaped after the hosted store the client talks to: whole-document reads,
/// merge writes and single-field deletes. Nothing here is transactional.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document, `None` when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Merge `fields` into the document, creating it when missing.
    /// Fields not named in `fields` are left untouched.
    async fn set_merge(&self, collection: &str, id: &str, fields: Document) -> Result<()>;

    /// Remove one field. Returns whether the field existed.
    async fn delete_field(&self, collection: &str, id: &str, field: &str) -> Result<bool>;

    /// Every document in a collection, as `(id, document)` pairs.
    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>>;
}
