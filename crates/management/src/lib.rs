//! Campaign backend — in-memory store, store registry, campaign lifecycle
//! and the REST API over them.
//!
//! Data lives in DashMap; a database-backed implementation of the
//! `campaign_core::store` traits replaces it in production.

pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod registry;
pub mod router;
pub mod store;

pub use handlers::AppState;
pub use lifecycle::CampaignLifecycle;
pub use router::api_router;
pub use store::MemoryStore;
