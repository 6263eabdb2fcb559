//! Shared domain types, error taxonomy, configuration and store interfaces
//! for campaign segmentation and delivery.

pub mod config;
pub mod error;
pub mod query;
pub mod store;
pub mod templates;
pub mod types;

pub use config::AppConfig;
pub use error::{CampaignError, CampaignResult};
pub use query::{QueryComparison, QueryDescriptor, QueryValue};
pub use store::{CampaignStore, CustomerStore, DeliveryLogStore};
pub use templates::MessageTemplate;
