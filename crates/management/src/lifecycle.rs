//! Campaign lifecycle — preview, validate, resolve and launch campaigns, and
//! apply delivery receipts afterwards.

use campaign_core::config::DeliveryConfig;
use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::store::{CampaignStore, CustomerStore, DeliveryLogStore};
use campaign_core::types::{Campaign, CampaignDraft, DeliveryLog, DeliveryStatus, RuleDraft};
use campaign_delivery::{DeliverySimulator, OutcomeSource};
use campaign_segmentation::SegmentationService;
use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::store::MemoryStore;

/// Orchestrates segmentation and delivery for the REST layer.
#[derive(Clone)]
pub struct CampaignLifecycle {
    segmentation: SegmentationService,
    simulator: Arc<DeliverySimulator>,
    campaigns: Arc<dyn CampaignStore>,
    logs: Arc<dyn DeliveryLogStore>,
    delivery: DeliveryConfig,
}

impl CampaignLifecycle {
    pub fn from_stores(
        customers: Arc<dyn CustomerStore>,
        campaigns: Arc<dyn CampaignStore>,
        logs: Arc<dyn DeliveryLogStore>,
        delivery: DeliveryConfig,
    ) -> Self {
        Self {
            segmentation: SegmentationService::new(customers),
            simulator: Arc::new(DeliverySimulator::new(
                campaigns.clone(),
                logs.clone(),
                delivery.clone(),
            )),
            campaigns,
            logs,
            delivery,
        }
    }

    /// Everything backed by one in-memory store.
    pub fn new(store: Arc<MemoryStore>, delivery: &DeliveryConfig) -> Self {
        Self::from_stores(store.clone(), store.clone(), store, delivery.clone())
    }

    /// Swap the randomness behind simulated sends.
    pub fn with_outcomes(mut self, outcomes: Arc<dyn OutcomeSource>) -> Self {
        let simulator = DeliverySimulator::new(
            self.campaigns.clone(),
            self.logs.clone(),
            self.delivery.clone(),
        )
        .with_outcomes(outcomes);
        self.simulator = Arc::new(simulator);
        self
    }

    pub async fn preview(&self, rules: &[RuleDraft]) -> CampaignResult<u64> {
        if rules.is_empty() {
            return Ok(0);
        }
        self.segmentation.preview(rules).await
    }

    pub async fn launch(&self, draft: CampaignDraft) -> CampaignResult<Campaign> {
        self.launch_with_cancel(draft, CancellationToken::new())
            .await
    }

    /// Validate the draft, resolve its audience once and run the delivery
    /// fan-out. Returns the completed campaign.
    pub async fn launch_with_cancel(
        &self,
        draft: CampaignDraft,
        cancel: CancellationToken,
    ) -> CampaignResult<Campaign> {
        validate_draft(&draft)?;

        let compiled = self.segmentation.compiler().compile(&draft.rules)?;
        let matched = self.segmentation.resolve_compiled(&compiled).await?;
        debug!(name = %draft.name, matched = matched.len(), "Audience resolved");

        self.simulator
            .launch_with_cancel(draft, matched, cancel)
            .await
    }

    pub async fn list(&self) -> CampaignResult<Vec<Campaign>> {
        self.campaigns.list().await
    }

    pub async fn get(&self, id: Uuid) -> CampaignResult<Campaign> {
        self.campaigns
            .get(id)
            .await?
            .ok_or_else(|| CampaignError::NotFound(format!("campaign {id}")))
    }

    pub async fn logs_for(&self, campaign_id: Uuid) -> CampaignResult<Vec<DeliveryLog>> {
        self.get(campaign_id).await?;
        self.logs.list_for_campaign(campaign_id).await
    }

    /// Apply a vendor delivery receipt to the log it references.
    pub async fn record_receipt(
        &self,
        message_id: Uuid,
        status: DeliveryStatus,
    ) -> CampaignResult<DeliveryLog> {
        let delivered_at = (status == DeliveryStatus::Delivered).then(Utc::now);
        let log = self
            .logs
            .update_by_external_reference(message_id, status, delivered_at)
            .await?
            .ok_or_else(|| CampaignError::NotFound(format!("delivery log {message_id}")))?;
        info!(log_id = %message_id, status = status.as_str(), "Delivery receipt applied");
        Ok(log)
    }
}

fn validate_draft(draft: &CampaignDraft) -> CampaignResult<()> {
    if draft.name.trim().is_empty() {
        return Err(CampaignError::Validation("campaign name is required".to_string()));
    }
    if draft.message_template.trim().is_empty() {
        return Err(CampaignError::Validation("message is required".to_string()));
    }
    if draft.rules.is_empty() {
        return Err(CampaignError::InvalidRule(
            "at least one segment rule is required".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::types::CampaignStatus;
    use campaign_delivery::SeededOutcomes;

    fn draft(rules: Vec<RuleDraft>) -> CampaignDraft {
        CampaignDraft {
            name: "Loyal shoppers".to_string(),
            description: String::new(),
            rules,
            message_template: "Thanks {name}!".to_string(),
            created_by: "admin".to_string(),
        }
    }

    fn lifecycle() -> CampaignLifecycle {
        let store = Arc::new(MemoryStore::with_config(&campaign_core::config::StoreConfig {
            seed_demo_data: true,
            ..Default::default()
        }));
        let delivery = DeliveryConfig {
            max_latency_ms: 0,
            ..Default::default()
        };
        CampaignLifecycle::new(store, &delivery)
            .with_outcomes(Arc::new(SeededOutcomes::new(1.0, 7)))
    }

    #[tokio::test]
    async fn test_preview_empty_rules_is_zero() {
        assert_eq!(lifecycle().preview(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_launch_requires_name_message_and_rules() {
        let lc = lifecycle();
        let mut d = draft(vec![RuleDraft::new("visitCount", ">", "0")]);
        d.name = "  ".to_string();
        assert!(matches!(lc.launch(d).await, Err(CampaignError::Validation(_))));

        let mut d = draft(vec![RuleDraft::new("visitCount", ">", "0")]);
        d.message_template.clear();
        assert!(matches!(lc.launch(d).await, Err(CampaignError::Validation(_))));

        assert!(matches!(
            lc.launch(draft(vec![])).await,
            Err(CampaignError::InvalidRule(_))
        ));
        assert!(lc.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_launch_and_receipt() {
        let lc = lifecycle();
        let campaign = lc
            .launch(draft(vec![RuleDraft::new("visitCount", ">=", "7")]))
            .await
            .unwrap();
        assert_eq!(campaign.status, CampaignStatus::Completed);
        assert_eq!(campaign.target_count, 2);
        assert_eq!(campaign.sent_count, 2);

        let logs = lc.logs_for(campaign.id).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.rendered_message.starts_with("Thanks ")));

        let updated = lc
            .record_receipt(logs[0].id, DeliveryStatus::Delivered)
            .await
            .unwrap();
        assert!(updated.delivered_at.is_some());

        let failed = lc
            .record_receipt(logs[1].id, DeliveryStatus::Failed)
            .await
            .unwrap();
        assert!(failed.delivered_at.is_none());
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_found() {
        let lc = lifecycle();
        assert!(matches!(lc.get(Uuid::new_v4()).await, Err(CampaignError::NotFound(_))));
        assert!(matches!(
            lc.record_receipt(Uuid::new_v4(), DeliveryStatus::Delivered).await,
            Err(CampaignError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_bad_rule_rejected_before_campaign_is_created() {
        let lc = lifecycle();
        let err = lc
            .launch(draft(vec![RuleDraft::new("age", ">", "30")]))
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignError::InvalidRule(_)));
        assert!(lc.list().await.unwrap().is_empty());
    }
}
