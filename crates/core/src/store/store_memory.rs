use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;

use super::store_traits::{Document, DocumentStore};
use crate::errors::Result;

/// Process-local [`DocumentStore`]. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: DashMap<String, DashMap<String, Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id).map(|doc| doc.value().clone())))
    }

    async fn set_merge(&self, collection: &str, id: &str, fields: Document) -> Result<()> {
        let docs = self
            .collections
            .entry(collection.to_string())
            .or_default();
        let mut doc = docs.entry(id.to_string()).or_default();
        debug!("Merging {} field(s) into {}/{}", fields.len(), collection, id);
        doc.extend(fields);
        Ok(())
    }

    async fn delete_field(&self, collection: &str, id: &str, field: &str) -> Result<bool> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(false);
        };
        let removed = docs
            .get_mut(id)
            .map(|mut doc| doc.remove(field).is_some())
            .unwrap_or(false);
        Ok(removed)
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>> {
        Ok(self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|entry| (entry.key().clone(), entry.value().clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}
