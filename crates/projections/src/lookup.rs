//! Lookup services over the order and customer profile collections.

use chrono::NaiveDate;
use common::{DocumentId, OrderCode};
use document_store::{DocumentQuery, DocumentStore, DocumentStoreExt, Filter};
use serde_json::Value;

use crate::Result;
use crate::profile::CustomerProfile;
use crate::projector::{ProjectedOrderView, RecordProjector};
use crate::rfm::RfmSummary;

/// Collection holding marketplace orders.
pub const ORDERS_COLLECTION: &str = "btw_orders";

/// Collection holding consolidated customer profiles.
pub const CUSTOMER_PROFILES_COLLECTION: &str = "crm_customer_profiles";

/// Finds single orders by code and returns their flattened view.
#[derive(Clone)]
pub struct OrderLookup<S: DocumentStore> {
    store: S,
    projector: RecordProjector,
    collection: String,
}

impl<S: DocumentStore> OrderLookup<S> {
    /// Creates a lookup over `btw_orders` using the order projection.
    pub fn new(store: S) -> Self {
        Self::with_projector(store, RecordProjector::for_orders())
    }

    /// Creates a lookup with a custom projector.
    pub fn with_projector(store: S, projector: RecordProjector) -> Self {
        Self {
            store,
            projector,
            collection: ORDERS_COLLECTION.to_string(),
        }
    }

    /// Reads from a different collection.
    pub fn in_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn projector(&self) -> &RecordProjector {
        &self.projector
    }

    /// Returns the newest order with this `full_order_code`, projected.
    #[tracing::instrument(skip(self), fields(collection = %self.collection))]
    pub async fn find_by_order_code(&self, code: &OrderCode) -> Result<Option<ProjectedOrderView>> {
        metrics::counter!("order_lookups_total").increment(1);

        let query = DocumentQuery::matching(Filter::eq("full_order_code", code.as_str()))
            .sort_desc("created_date");
        let record = self.store.find_one(&self.collection, query).await?;

        match record {
            Some(record) => Ok(Some(self.projector.project(&record))),
            None => {
                metrics::counter!("order_lookup_misses_total").increment(1);
                tracing::debug!(%code, "order not found");
                Ok(None)
            }
        }
    }
}

/// Finds and removes customer profiles.
#[derive(Clone)]
pub struct CustomerLookup<S: DocumentStore> {
    store: S,
    collection: String,
}

impl<S: DocumentStore> CustomerLookup<S> {
    /// Creates a lookup over `crm_customer_profiles`.
    pub fn new(store: S) -> Self {
        Self {
            store,
            collection: CUSTOMER_PROFILES_COLLECTION.to_string(),
        }
    }

    /// Reads from a different collection.
    pub fn in_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Returns the profile whose `orders` contain an entry with this `order_id`.
    ///
    /// The id is matched with its JSON type: `1001` and `"1001"` differ.
    #[tracing::instrument(skip(self), fields(collection = %self.collection))]
    pub async fn find_by_order_id(&self, order_id: &Value) -> Result<Option<CustomerProfile>> {
        metrics::counter!("customer_lookups_total").increment(1);

        let query = DocumentQuery::matching(Filter::elem_match(
            "orders",
            "order_id",
            order_id.clone(),
        ));
        self.load(query).await
    }

    /// Returns the profile with this id.
    #[tracing::instrument(skip(self), fields(collection = %self.collection))]
    pub async fn find_by_id(&self, id: &DocumentId) -> Result<Option<CustomerProfile>> {
        metrics::counter!("customer_lookups_total").increment(1);

        let query = DocumentQuery::matching(Filter::eq(document_store::ID_FIELD, id.as_str()));
        self.load(query).await
    }

    /// Scores the order history of the profile with this id as of `snapshot`.
    ///
    /// The outer `None` means no such profile; the inner one means none of
    /// its orders carries a readable date.
    #[tracing::instrument(skip(self), fields(collection = %self.collection))]
    pub async fn rfm_by_id(
        &self,
        id: &DocumentId,
        snapshot: NaiveDate,
    ) -> Result<Option<Option<RfmSummary>>> {
        let profile = self.find_by_id(id).await?;
        Ok(profile.map(|p| p.rfm_summary(snapshot)))
    }

    /// Deletes the profile with this id, returning whether it existed.
    #[tracing::instrument(skip(self), fields(collection = %self.collection))]
    pub async fn delete_by_id(&self, id: &DocumentId) -> Result<bool> {
        let deleted = self.store.delete_by_id(&self.collection, id).await?;
        if deleted {
            metrics::counter!("customer_deletes_total").increment(1);
            tracing::info!(%id, "customer profile deleted");
        }
        Ok(deleted)
    }

    async fn load(&self, query: DocumentQuery) -> Result<Option<CustomerProfile>> {
        match self.store.find_one(&self.collection, query).await? {
            Some(document) => Ok(Some(CustomerProfile::from_document(document)?)),
            None => Ok(None),
        }
    }
}
