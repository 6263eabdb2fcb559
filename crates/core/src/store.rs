//! Collaborator interfaces for the record stores the core reads and writes.
//!
//! Implementations own connection handling and any retry policy; the core
//! propagates their `StoreUnavailable` failures unmodified.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::CampaignResult;
use crate::query::QueryDescriptor;
use crate::types::{Campaign, CampaignPatch, CustomerSnapshot, DeliveryLog, DeliveryStatus};

/// Read-only access to customer snapshots.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Whether the store evaluates [`QueryDescriptor`]s itself. Stores that
    /// cannot filter only need to implement [`scan`](CustomerStore::scan).
    fn supports_filtering(&self) -> bool {
        true
    }

    async fn find(&self, query: &QueryDescriptor) -> CampaignResult<Vec<CustomerSnapshot>>;

    async fn count(&self, query: &QueryDescriptor) -> CampaignResult<u64>;

    /// Every customer, unfiltered.
    async fn scan(&self) -> CampaignResult<Vec<CustomerSnapshot>>;
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn create(&self, campaign: &Campaign) -> CampaignResult<Uuid>;

    /// Atomic single-document partial update. Returns the updated record.
    async fn update(&self, id: Uuid, patch: CampaignPatch) -> CampaignResult<Campaign>;

    async fn get(&self, id: Uuid) -> CampaignResult<Option<Campaign>>;

    /// Newest first.
    async fn list(&self) -> CampaignResult<Vec<Campaign>>;
}

#[async_trait]
pub trait DeliveryLogStore: Send + Sync {
    async fn create(&self, log: &DeliveryLog) -> CampaignResult<Uuid>;

    /// Delivery-receipt update keyed by the log id handed to the vendor.
    /// Returns `None` when no such log exists.
    async fn update_by_external_reference(
        &self,
        reference: Uuid,
        status: DeliveryStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> CampaignResult<Option<DeliveryLog>>;

    async fn list_for_campaign(&self, campaign_id: Uuid) -> CampaignResult<Vec<DeliveryLog>>;
}
