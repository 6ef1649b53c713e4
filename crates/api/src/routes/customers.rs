//! Customer profile lookup and deletion endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::DocumentId;
use document_store::DocumentStore;
use projections::rfm::snapshot_date;
use projections::{CustomerProfile, RfmSummary};
use serde::Deserialize;
use serde_json::Value;

use super::AppState;
use crate::error::ApiError;

/// GET /customers/by-order/:order_id: profile owning this order.
#[tracing::instrument(skip(state))]
pub async fn by_order<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(order_id): Path<String>,
) -> Result<Json<CustomerProfile>, ApiError> {
    let order_id = parse_order_id(&order_id)?;

    let profile = state
        .customers
        .find_by_order_id(&order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No customer for order {order_id}")))?;

    Ok(Json(profile))
}

/// GET /customers/:id: profile by id.
#[tracing::instrument(skip(state))]
pub async fn get<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<CustomerProfile>, ApiError> {
    let id = DocumentId::new(id);

    let profile = state
        .customers
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Customer {id} not found")))?;

    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
pub struct RfmParams {
    /// `YYYY-MM-DD`; today when omitted.
    pub snapshot: Option<String>,
}

/// GET /customers/:id/rfm: recency, frequency and monetary scores with segment.
#[tracing::instrument(skip(state))]
pub async fn rfm_summary<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Query(params): Query<RfmParams>,
) -> Result<Json<RfmSummary>, ApiError> {
    let snapshot = snapshot_date(params.snapshot.as_deref())?;
    let id = DocumentId::new(id);

    let summary = state
        .customers
        .rfm_by_id(&id, snapshot)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Customer {id} not found")))?
        .ok_or_else(|| ApiError::NotFound(format!("Customer {id} has no dated orders")))?;

    Ok(Json(summary))
}

/// DELETE /customers/:id: remove a profile.
#[tracing::instrument(skip(state))]
pub async fn delete<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = DocumentId::new(id);

    if state.customers.delete_by_id(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Customer {id} not found")))
    }
}

/// Order ids arrive as path text; all-digit ids are stored as numbers.
fn parse_order_id(raw: &str) -> Result<Value, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::BadRequest("Order id must not be empty".to_string()));
    }
    Ok(raw
        .parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_order_ids_become_numbers() {
        assert_eq!(parse_order_id("1001").unwrap(), json!(1001));
        assert_eq!(parse_order_id(" 42 ").unwrap(), json!(42));
    }

    #[test]
    fn other_order_ids_stay_strings() {
        assert_eq!(parse_order_id("LS-77").unwrap(), json!("LS-77"));
    }

    #[test]
    fn blank_order_id_is_rejected() {
        assert!(matches!(parse_order_id("  "), Err(ApiError::BadRequest(_))));
    }
}
