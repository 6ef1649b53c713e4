//! HTTP route handlers.

pub mod customers;
pub mod health;
pub mod metrics;
pub mod orders;

use document_store::DocumentStore;
use projections::{CustomerLookup, OrderExport, OrderLookup};

/// Shared application state accessible from all handlers.
pub struct AppState<S: DocumentStore> {
    /// Name of the storage backend, reported by `/health`.
    pub backend: &'static str,
    pub orders: OrderLookup<S>,
    pub customers: CustomerLookup<S>,
    pub export: OrderExport<S>,
}
