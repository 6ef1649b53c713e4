//! Batched export of projected orders over a date window.

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use document_store::{DocumentQuery, DocumentStore, Filter};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;

use crate::lookup::ORDERS_COLLECTION;
use crate::projector::{ProjectedOrderView, RecordProjector};
use crate::{ProjectionError, Result};

/// `order_status_id` of cancelled orders, which are never exported.
pub const CANCELLED_STATUS_ID: i64 = 4;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive range of calendar days matched against `date_created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Creates a window, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ProjectionError::InvalidWindow(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parses `YYYY-MM-DD` bounds.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map_err(|e| ProjectionError::InvalidWindow(format!("{s:?}: {e}")))
        };
        Self::new(parse(start)?, parse(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Orders created inside the window that were not cancelled.
    ///
    /// `date_created` is stored as `YYYY-MM-DD HH:MM:SS` text, so the bounds
    /// are compared as strings.
    pub fn filter(&self) -> Filter {
        Filter::gte("date_created", format!("{} 00:00:00", self.start))
            .and(Filter::lte("date_created", format!("{} 23:59:59", self.end)))
            .and(Filter::ne("order_status_id", CANCELLED_STATUS_ID))
    }
}

/// Batch size and pacing for exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Documents fetched per query.
    pub batch_size: usize,
    /// Pause between batches to keep load off the database.
    pub batch_delay: Duration,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            batch_delay: Duration::ZERO,
        }
    }
}

/// Exports every order in a date window, oldest first, in batches.
#[derive(Clone)]
pub struct OrderExport<S: DocumentStore> {
    store: S,
    projector: RecordProjector,
    collection: String,
    options: ExportOptions,
}

impl<S: DocumentStore> OrderExport<S> {
    pub fn new(store: S, options: ExportOptions) -> Self {
        Self {
            store,
            projector: RecordProjector::for_orders(),
            collection: ORDERS_COLLECTION.to_string(),
            options,
        }
    }

    /// Reads from a different collection.
    pub fn in_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn options(&self) -> ExportOptions {
        self.options
    }

    fn query(window: &DateWindow) -> DocumentQuery {
        DocumentQuery::matching(window.filter()).sort_asc("created_date")
    }

    /// Fetches and projects all matching orders.
    ///
    /// Counts first and returns early when nothing matches; otherwise pages
    /// with skip/limit until the counted total has been fetched.
    #[tracing::instrument(skip(self), fields(collection = %self.collection))]
    pub async fn export(&self, window: &DateWindow) -> Result<Vec<ProjectedOrderView>> {
        let started = Instant::now();
        let filter = window.filter();

        let total = self.store.count(&self.collection, &filter).await?;
        if total == 0 {
            tracing::info!("no orders to export");
            return Ok(Vec::new());
        }
        tracing::info!(total, "exporting orders");

        let batch_size = self.options.batch_size.max(1);
        let mut views = Vec::with_capacity(total as usize);
        let mut skip = 0usize;

        loop {
            let batch = self
                .store
                .find(
                    &self.collection,
                    Self::query(window).skip(skip).limit(batch_size),
                )
                .await?;
            if batch.is_empty() {
                break;
            }

            tracing::debug!(skip, fetched = batch.len(), "processing batch");
            skip += batch.len();
            views.extend(batch.iter().map(|record| self.projector.project(record)));

            if skip as u64 >= total {
                break;
            }
            if !self.options.batch_delay.is_zero() {
                tokio::time::sleep(self.options.batch_delay).await;
            }
        }

        metrics::counter!("orders_exported_total").increment(views.len() as u64);
        metrics::histogram!("order_export_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(exported = views.len(), "export complete");

        Ok(views)
    }

    /// Streams matching orders, projected, without batching delays.
    pub async fn stream(
        &self,
        window: &DateWindow,
    ) -> Result<BoxStream<'static, Result<ProjectedOrderView>>> {
        let projector = self.projector.clone();
        let documents = self
            .store
            .stream(&self.collection, Self::query(window))
            .await?;

        Ok(documents
            .map(move |result| {
                result
                    .map(|record| projector.project(&record))
                    .map_err(ProjectionError::from)
            })
            .boxed())
    }
}
