//! API router — mounts every campaign endpoint under /api/v1.

use crate::handlers::{self, AppState};
use crate::lifecycle::CampaignLifecycle;
use crate::store::MemoryStore;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the full application router over the given store and lifecycle.
pub fn api_router(store: Arc<MemoryStore>, lifecycle: CampaignLifecycle) -> Router {
    let state = AppState { lifecycle, store };

    Router::new()
        .route("/health", get(handlers::health))
        // Segments
        .route("/api/v1/segments/preview", post(handlers::preview_segment))
        // Campaigns
        .route("/api/v1/campaigns", get(handlers::list_campaigns).post(handlers::launch_campaign))
        .route("/api/v1/campaigns/:id", get(handlers::get_campaign))
        .route("/api/v1/campaigns/:id/logs", get(handlers::campaign_logs))
        // Customers
        .route("/api/v1/customers", get(handlers::list_customers).post(handlers::upsert_customers))
        // Orders
        .route(
            "/api/v1/orders",
            get(handlers::list_orders)
                .post(handlers::create_orders)
                .patch(handlers::update_order_status),
        )
        // Receipts
        .route("/api/v1/receipts", post(handlers::delivery_receipt))
        // Dashboard
        .route("/api/v1/dashboard/stats", get(handlers::dashboard_stats))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
