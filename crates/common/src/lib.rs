//! Shared identifier types for the order lookup service.

pub mod types;

pub use types::{DocumentId, OrderCode};
