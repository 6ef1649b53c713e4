//! Document store for schemaless marketplace records.
//!
//! - [`Document`] with dotted-path and optional-head access
//! - [`Filter`] / [`DocumentQuery`] describing selection, ordering and paging
//! - [`DocumentStore`] trait with in-memory and PostgreSQL implementations

pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::DocumentId;
pub use document::{Document, ID_FIELD};
pub use error::{DocumentStoreError, Result};
pub use memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use query::{DocumentQuery, Filter, SortDirection, SortKey, values_equal};
pub use store::{DocumentStore, DocumentStoreExt, DocumentStream};
