//! Axum REST handlers for the campaign API.

use crate::lifecycle::CampaignLifecycle;
use crate::models::*;
use crate::store::MemoryStore;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use campaign_core::error::CampaignError;
use campaign_core::types::{Campaign, CampaignDraft, Customer, DeliveryLog, Order};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

/// Shared API state.
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: CampaignLifecycle,
    pub store: Arc<MemoryStore>,
}

/// Maps domain errors onto status codes with an `ErrorResponse` body.
pub struct ApiError(CampaignError);

impl From<CampaignError> for ApiError {
    fn from(err: CampaignError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            CampaignError::InvalidRule(_) | CampaignError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            CampaignError::NotFound(_) => StatusCode::NOT_FOUND,
            CampaignError::InvalidTransition { .. } => StatusCode::CONFLICT,
            CampaignError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self.0 {
            CampaignError::InvalidRule(_) => "invalid_rule",
            CampaignError::Validation(_) => "validation_failed",
            CampaignError::NotFound(_) => "not_found",
            CampaignError::InvalidTransition { .. } => "invalid_transition",
            CampaignError::StoreUnavailable(_) => "store_unavailable",
            _ => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        let body = ErrorResponse {
            error: self.kind().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn requesting_user(headers: &HeaderMap) -> String {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("admin")
        .to_string()
}

// ─── Health ────────────────────────────────────────────────────────────────

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ─── Segments ──────────────────────────────────────────────────────────────

pub async fn preview_segment(
    State(state): State<AppState>,
    Json(req): Json<PreviewRequest>,
) -> ApiResult<Json<PreviewResponse>> {
    let count = state.lifecycle.preview(&req.rules).await?;
    Ok(Json(PreviewResponse { count }))
}

// ─── Campaigns ─────────────────────────────────────────────────────────────

pub async fn list_campaigns(State(state): State<AppState>) -> ApiResult<Json<Vec<Campaign>>> {
    Ok(Json(state.lifecycle.list().await?))
}

pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Campaign>> {
    Ok(Json(state.lifecycle.get(id).await?))
}

pub async fn campaign_logs(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<DeliveryLog>>> {
    Ok(Json(state.lifecycle.logs_for(id).await?))
}

pub async fn launch_campaign(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LaunchCampaignRequest>,
) -> ApiResult<(StatusCode, Json<Campaign>)> {
    let draft = CampaignDraft {
        name: req.name,
        description: req.description,
        rules: req.rules,
        message_template: req.message,
        created_by: requesting_user(&headers),
    };
    let campaign = state.lifecycle.launch(draft).await?;
    Ok((StatusCode::CREATED, Json(campaign)))
}

// ─── Customers ─────────────────────────────────────────────────────────────

pub async fn list_customers(State(state): State<AppState>) -> ApiResult<Json<Vec<Customer>>> {
    Ok(Json(state.store.list_customers()?))
}

pub async fn upsert_customers(
    State(state): State<AppState>,
    Json(payload): Json<CustomerPayload>,
) -> ApiResult<(StatusCode, Json<CustomersSaved>)> {
    let (inputs, single) = match payload {
        CustomerPayload::Many(inputs) => (inputs, false),
        CustomerPayload::One(input) => (vec![input], true),
    };
    let mut saved = state.store.upsert_customers(inputs)?;
    metrics::counter!("customers.upserted").increment(saved.len() as u64);

    let body = if single && saved.len() == 1 {
        CustomersSaved::One(saved.remove(0))
    } else {
        CustomersSaved::Many(saved)
    };
    Ok((StatusCode::CREATED, Json(body)))
}

// ─── Orders ────────────────────────────────────────────────────────────────

pub async fn list_orders(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<OrdersPage>> {
    Ok(Json(state.store.list_orders(&page)?))
}

pub async fn create_orders(
    State(state): State<AppState>,
    Json(inputs): Json<Vec<OrderInput>>,
) -> ApiResult<(StatusCode, Json<OrdersCreated>)> {
    let orders = state.store.create_orders(inputs)?;
    metrics::counter!("orders.created").increment(orders.len() as u64);
    Ok((
        StatusCode::CREATED,
        Json(OrdersCreated {
            message: format!("{} orders created successfully", orders.len()),
            orders,
        }),
    ))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.store.update_order_status(&req.order_id, req.status)?))
}

// ─── Receipts ──────────────────────────────────────────────────────────────

pub async fn delivery_receipt(
    State(state): State<AppState>,
    Json(req): Json<ReceiptRequest>,
) -> ApiResult<Json<DeliveryLog>> {
    let log = state
        .lifecycle
        .record_receipt(req.message_id, req.status)
        .await?;
    metrics::counter!("delivery.receipts", "status" => req.status.as_str()).increment(1);
    Ok(Json(log))
}

// ─── Dashboard ─────────────────────────────────────────────────────────────

pub async fn dashboard_stats(State(state): State<AppState>) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(state.store.dashboard_stats()?))
}
