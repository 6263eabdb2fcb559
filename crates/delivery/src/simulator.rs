//! Delivery simulator — launches a campaign by fanning out one simulated send
//! per matched customer and reconciling the outcomes onto the campaign record.
//!
//! Log rows and campaign counters live in different stores and are not
//! written atomically together: while a launch is running, readers can see
//! an `active` campaign with zero counters next to logs that already exist.
//! The campaign becomes authoritative once the reconciliation write lands.

use campaign_core::config::DeliveryConfig;
use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::store::{CampaignStore, DeliveryLogStore};
use campaign_core::templates::MessageTemplate;
use campaign_core::types::{
    Campaign, CampaignDraft, CampaignPatch, CampaignStatus, CustomerSnapshot, DeliveryLog,
    DeliveryStatus,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::outcome::{OutcomeSource, RandomOutcomes};
use crate::throttle::SendThrottle;

/// Aggregated outcome of one launch's fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryTally {
    pub delivered: u64,
    pub failed: u64,
    /// Attempts whose log write failed; excluded from every counter.
    pub write_failures: u64,
    /// Recipients never attempted because the launch was cancelled.
    pub skipped: u64,
}

impl DeliveryTally {
    fn record(&mut self, status: DeliveryStatus) {
        match status {
            DeliveryStatus::Failed => self.failed += 1,
            DeliveryStatus::Sent | DeliveryStatus::Delivered => self.delivered += 1,
        }
    }

    pub fn sent(&self) -> u64 {
        self.delivered + self.failed
    }

    fn reconciliation(&self) -> CampaignPatch {
        CampaignPatch {
            status: Some(CampaignStatus::Completed),
            sent_count: Some(self.sent()),
            delivered_count: Some(self.delivered),
            failed_count: Some(self.failed),
        }
    }
}

pub struct DeliverySimulator {
    campaigns: Arc<dyn CampaignStore>,
    logs: Arc<dyn DeliveryLogStore>,
    outcomes: Arc<dyn OutcomeSource>,
    config: DeliveryConfig,
}

impl DeliverySimulator {
    pub fn new(
        campaigns: Arc<dyn CampaignStore>,
        logs: Arc<dyn DeliveryLogStore>,
        config: DeliveryConfig,
    ) -> Self {
        let outcomes = Arc::new(RandomOutcomes::new(config.success_rate));
        Self {
            campaigns,
            logs,
            outcomes,
            config,
        }
    }

    /// Replace the randomness source (seeded or scripted in tests).
    pub fn with_outcomes(mut self, outcomes: Arc<dyn OutcomeSource>) -> Self {
        self.outcomes = outcomes;
        self
    }

    pub async fn launch(
        &self,
        draft: CampaignDraft,
        matched: Vec<CustomerSnapshot>,
    ) -> CampaignResult<Campaign> {
        self.launch_with_cancel(draft, matched, CancellationToken::new())
            .await
    }

    /// Launch, stopping new attempts once `cancel` fires. Attempts already
    /// issued run to completion and the campaign still completes.
    pub async fn launch_with_cancel(
        &self,
        draft: CampaignDraft,
        matched: Vec<CustomerSnapshot>,
        cancel: CancellationToken,
    ) -> CampaignResult<Campaign> {
        let campaign = Campaign::launch(draft, matched.len() as u64);
        let campaign_id = self.campaigns.create(&campaign).await?;
        metrics::counter!("campaigns.launched").increment(1);
        info!(
            campaign_id = %campaign_id,
            name = %campaign.name,
            target = campaign.target_count,
            "Campaign launched"
        );

        let template = MessageTemplate::new(campaign.message_template.as_str());
        let tally = self.fan_out(campaign_id, &template, matched, &cancel).await;

        if tally.write_failures > 0 {
            let err = CampaignError::PartialDeliveryFailure {
                failed: tally.write_failures as usize,
                total: campaign.target_count as usize,
            };
            warn!(campaign_id = %campaign_id, error = %err, "Recipients excluded from campaign counters");
        }
        if tally.skipped > 0 {
            warn!(campaign_id = %campaign_id, skipped = tally.skipped, "Launch cancelled before all recipients were attempted");
        }

        let completed = self
            .campaigns
            .update(campaign_id, tally.reconciliation())
            .await?;
        metrics::counter!("campaigns.completed").increment(1);
        info!(
            campaign_id = %campaign_id,
            sent = completed.sent_count,
            delivered = completed.delivered_count,
            failed = completed.failed_count,
            "Campaign completed"
        );
        Ok(completed)
    }

    async fn fan_out(
        &self,
        campaign_id: Uuid,
        template: &MessageTemplate,
        matched: Vec<CustomerSnapshot>,
        cancel: &CancellationToken,
    ) -> DeliveryTally {
        let throttle = SendThrottle::new(self.config.max_in_flight);
        let max_latency = Duration::from_millis(self.config.max_latency_ms);
        let total = matched.len();
        let mut tally = DeliveryTally::default();
        let mut tasks = JoinSet::new();

        for (issued, customer) in matched.into_iter().enumerate() {
            let Some(permit) = throttle.acquire(cancel).await else {
                tally.skipped = (total - issued) as u64;
                break;
            };
            let attempt = Attempt {
                campaign_id,
                message: template.render_for(&customer),
                customer_id: customer.customer_id,
                max_latency,
            };
            let logs = self.logs.clone();
            let outcomes = self.outcomes.clone();
            tasks.spawn(async move {
                let _permit = permit;
                attempt.run(logs.as_ref(), outcomes.as_ref()).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(status)) => tally.record(status),
                Ok(Err(e)) => {
                    tally.write_failures += 1;
                    metrics::counter!("delivery.log_write_failed").increment(1);
                    warn!(campaign_id = %campaign_id, error = %e, "Delivery log write failed");
                }
                Err(e) => {
                    tally.write_failures += 1;
                    error!(campaign_id = %campaign_id, error = %e, "Delivery attempt task aborted");
                }
            }
        }

        debug!(
            campaign_id = %campaign_id,
            peak_in_flight = throttle.peak_in_flight(),
            max_in_flight = throttle.max_in_flight(),
            "Delivery fan-out finished"
        );
        tally
    }
}

struct Attempt {
    campaign_id: Uuid,
    customer_id: String,
    message: String,
    max_latency: Duration,
}

impl Attempt {
    async fn run(
        self,
        logs: &dyn DeliveryLogStore,
        outcomes: &dyn OutcomeSource,
    ) -> CampaignResult<DeliveryStatus> {
        let status = outcomes.draw_outcome();
        let log = DeliveryLog {
            id: Uuid::new_v4(),
            campaign_id: self.campaign_id,
            customer_id: self.customer_id,
            rendered_message: self.message,
            status,
            sent_at: Utc::now(),
            delivered_at: None,
        };
        logs.create(&log).await?;

        // downstream rate-limit stand-in
        let latency = outcomes.draw_latency(self.max_latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        metrics::counter!("delivery.attempts", "outcome" => status.as_str()).increment(1);
        Ok(status)
    }
}
