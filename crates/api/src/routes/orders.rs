//! Order lookup and export endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::OrderCode;
use document_store::DocumentStore;
use projections::{DateWindow, ProjectedOrderView};
use serde::Deserialize;

use super::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub start: String,
    pub end: String,
}

/// GET /orders/:order_code: newest order with this code, flattened.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_code): Path<String>,
) -> Result<Json<ProjectedOrderView>, ApiError> {
    let code = OrderCode::new(&order_code);
    if code.is_empty() {
        return Err(ApiError::BadRequest("Order code must not be empty".to_string()));
    }

    let view = state
        .orders
        .find_by_order_code(&code)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {code} not found")))?;

    Ok(Json(view))
}

/// GET /orders/export?start=YYYY-MM-DD&end=YYYY-MM-DD: non-cancelled orders
/// created in the window, oldest first.
#[tracing::instrument(skip(state))]
pub async fn export<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ExportParams>,
) -> Result<Json<Vec<ProjectedOrderView>>, ApiError> {
    let window = DateWindow::parse(&params.start, &params.end)?;
    let views = state.export.export(&window).await?;
    Ok(Json(views))
}
