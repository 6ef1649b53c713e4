//! Record projection and lookup services.
//!
//! This crate provides the query side over the document store:
//! - [`RecordProjector`] flattening raw order records per a [`ProjectionSpec`]
//! - [`OrderLookup`] and [`CustomerLookup`] for single-record queries
//! - [`OrderExport`] for batched exports over a [`DateWindow`]
//! - [`RfmSummary`] scoring and [`Segment`] classification of a profile's orders

pub mod error;
pub mod export;
pub mod lookup;
pub mod profile;
pub mod projector;
pub mod rfm;
pub mod spec;

pub use error::{ProjectionError, Result};
pub use export::{DateWindow, ExportOptions, OrderExport};
pub use lookup::{CUSTOMER_PROFILES_COLLECTION, CustomerLookup, ORDERS_COLLECTION, OrderLookup};
pub use profile::{CustomerOrder, CustomerProfile, CustomerSource};
pub use projector::{ProjectedOrderView, RecordProjector, project};
pub use rfm::{RfmSummary, Segment};
pub use spec::{ExtractionRule, ProjectionSpec};
