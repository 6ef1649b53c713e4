use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    Document, DocumentId, DocumentQuery, DocumentStoreError, Filter, Result,
    store::{DocumentStore, DocumentStream},
};

/// In-memory document store implementation for testing and local runs.
///
/// Collections keep documents in insertion order and provide the same
/// query semantics as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Vec<Document>>>>,
}

impl InMemoryDocumentStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of documents in a collection.
    pub async fn document_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Clears all collections.
    pub async fn clear(&self) {
        self.collections.write().await.clear();
    }

    fn run_query(documents: &[Document], query: &DocumentQuery) -> Vec<Document> {
        let mut matched: Vec<&Document> = documents
            .iter()
            .filter(|d| query.filter.matches(d))
            .collect();

        // Stable sort keeps insertion order among equal keys
        if !query.sort.is_empty() {
            matched.sort_by(|a, b| query.compare(a, b));
        }

        matched
            .into_iter()
            .skip(query.skip.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, collection: &str, mut document: Document) -> Result<DocumentId> {
        let id = document.id().unwrap_or_else(DocumentId::generate);
        document.set_id(&id);

        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();

        if documents.iter().any(|d| d.id().as_ref() == Some(&id)) {
            return Err(DocumentStoreError::DuplicateId {
                collection: collection.to_string(),
                id,
            });
        }

        documents.push(document);
        Ok(id)
    }

    async fn find(&self, collection: &str, query: DocumentQuery) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|documents| Self::run_query(documents, &query))
            .unwrap_or_default())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map_or(0, |documents| {
            documents.iter().filter(|d| filter.matches(d)).count() as u64
        }))
    }

    async fn delete_by_id(&self, collection: &str, id: &DocumentId) -> Result<bool> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(false);
        };

        let before = documents.len();
        documents.retain(|d| d.id().as_ref() != Some(id));
        Ok(documents.len() < before)
    }

    async fn stream(&self, collection: &str, query: DocumentQuery) -> Result<DocumentStream> {
        let documents = self.find(collection, query).await?;
        Ok(Box::pin(futures_util::stream::iter(
            documents.into_iter().map(Ok),
        )))
    }
}
