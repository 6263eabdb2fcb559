#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use campaign_core::config::{DeliveryConfig, StoreConfig};
use campaign_delivery::SeededOutcomes;
use campaign_management::{api_router, CampaignLifecycle, MemoryStore};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Fresh store seeded with the demo customers, zero latency and every
/// attempt classified `SENT`.
pub fn test_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::with_config(&StoreConfig {
        seed_demo_data: true,
        ..Default::default()
    }));
    let delivery = DeliveryConfig {
        max_latency_ms: 0,
        ..Default::default()
    };
    let lifecycle = CampaignLifecycle::new(store.clone(), &delivery)
        .with_outcomes(Arc::new(SeededOutcomes::new(1.0, 11)));
    (api_router(store.clone(), lifecycle), store)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

pub async fn post_json(app: &Router, uri: &str, json: Value) -> (StatusCode, Value) {
    with_json(app, "POST", uri, json).await
}

pub async fn patch_json(app: &Router, uri: &str, json: Value) -> (StatusCode, Value) {
    with_json(app, "PATCH", uri, json).await
}

async fn with_json(app: &Router, method: &str, uri: &str, json: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
    )
    .await
}
