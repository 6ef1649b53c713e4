use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{Document, DocumentId, DocumentQuery, Filter, Result};

/// A stream of documents.
pub type DocumentStream = Pin<Box<dyn Stream<Item = Result<Document>> + Send>>;

/// Core trait for document store implementations.
///
/// A store holds named collections of schemaless documents keyed by
/// `_id`. All implementations must be thread-safe (Send + Sync) and hold
/// their connection explicitly.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a document into a collection.
    ///
    /// A document without an `_id` is assigned a generated one. Fails with
    /// `DuplicateId` if the id is already taken in the collection.
    async fn insert(&self, collection: &str, document: Document) -> Result<DocumentId>;

    /// Retrieves documents matching a query.
    ///
    /// Without sort keys, documents are returned in insertion order.
    async fn find(&self, collection: &str, query: DocumentQuery) -> Result<Vec<Document>>;

    /// Counts documents matching a filter.
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64>;

    /// Deletes the document with the given id.
    ///
    /// Returns whether a document was removed.
    async fn delete_by_id(&self, collection: &str, id: &DocumentId) -> Result<bool>;

    /// Streams documents matching a query.
    async fn stream(&self, collection: &str, query: DocumentQuery) -> Result<DocumentStream>;
}

/// Extension trait providing convenience methods for document stores.
#[async_trait]
pub trait DocumentStoreExt: DocumentStore {
    /// Returns the first document matching the query, honoring its sort keys.
    async fn find_one(&self, collection: &str, query: DocumentQuery) -> Result<Option<Document>> {
        Ok(self
            .find(collection, query.limit(1))
            .await?
            .into_iter()
            .next())
    }

    /// Looks a document up by id.
    async fn find_by_id(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>> {
        let filter = Filter::eq(crate::ID_FIELD, id.as_str());
        self.find_one(collection, DocumentQuery::matching(filter))
            .await
    }

    /// Inserts several documents, stopping at the first failure.
    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<Vec<DocumentId>> {
        let mut ids = Vec::with_capacity(documents.len());
        for document in documents {
            ids.push(self.insert(collection, document).await?);
        }
        Ok(ids)
    }
}

// Blanket implementation for all DocumentStore implementations
impl<T: DocumentStore + ?Sized> DocumentStoreExt for T {}
