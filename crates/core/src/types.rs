use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CampaignError, CampaignResult};

// ─── Customers ──────────────────────────────────────────────────────────────

/// Customer attributes addressable by segmentation rules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum CustomerField {
    VisitCount,
    LastActive,
    TotalSpend,
}

impl CustomerField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomerField::VisitCount => "visitCount",
            CustomerField::LastActive => "lastActive",
            CustomerField::TotalSpend => "totalSpend",
        }
    }
}

impl std::fmt::Display for CustomerField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Customer record as held by the customer store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub customer_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub visit_count: u64,
    pub last_active: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Read-only view used by segmentation, with spend rolled up from orders.
    pub fn snapshot(&self, total_spend: f64) -> CustomerSnapshot {
        CustomerSnapshot {
            customer_id: self.customer_id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            visit_count: self.visit_count,
            last_active: self.last_active,
            total_spend,
        }
    }
}

/// Point-in-time view of a customer. Never written back by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSnapshot {
    pub customer_id: String,
    pub name: String,
    pub email: String,
    pub visit_count: u64,
    pub last_active: DateTime<Utc>,
    pub total_spend: f64,
}

// ─── Orders ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Completed
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub amount: f64,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

// ─── Rules ──────────────────────────────────────────────────────────────────

/// A segmentation rule exactly as authored (by the form UI or the external
/// rule-generation collaborator). Validated and typed by the rule compiler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub field: String,
    pub operator: String,
    pub value: String,
    #[serde(default, alias = "logic", skip_serializing_if = "Option::is_none")]
    pub connective: Option<String>,
}

impl RuleDraft {
    pub fn new(field: &str, operator: &str, value: &str) -> Self {
        Self {
            id: None,
            field: field.to_string(),
            operator: operator.to_string(),
            value: value.to_string(),
            connective: None,
        }
    }

    pub fn with_connective(mut self, connective: &str) -> Self {
        self.connective = Some(connective.to_string());
        self
    }
}

// ─── Campaigns ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Active,
    Completed,
}

impl CampaignStatus {
    /// Draft → Active → Completed. Nothing leaves Completed.
    pub fn can_transition_to(self, next: CampaignStatus) -> bool {
        matches!(
            (self, next),
            (CampaignStatus::Draft, CampaignStatus::Active)
                | (CampaignStatus::Active, CampaignStatus::Completed)
        )
    }

    pub fn transition(self, next: CampaignStatus) -> CampaignResult<CampaignStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CampaignError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

/// Everything the operator supplies before launch. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rules: Vec<RuleDraft>,
    pub message_template: String,
    pub created_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub rules: Vec<RuleDraft>,
    pub message_template: String,
    pub status: CampaignStatus,
    pub target_count: u64,
    pub sent_count: u64,
    pub delivered_count: u64,
    pub failed_count: u64,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Materialize a draft at launch time: active, counters at zero.
    pub fn launch(draft: CampaignDraft, target_count: u64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: draft.name,
            description: draft.description,
            rules: draft.rules,
            message_template: draft.message_template,
            status: CampaignStatus::Active,
            target_count,
            sent_count: 0,
            delivered_count: 0,
            failed_count: 0,
            created_by: draft.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update, enforcing the status state machine.
    pub fn apply(&mut self, patch: &CampaignPatch) -> CampaignResult<()> {
        if let Some(status) = patch.status {
            if status != self.status {
                self.status = self.status.transition(status)?;
            }
        }
        if let Some(sent) = patch.sent_count {
            self.sent_count = sent;
        }
        if let Some(delivered) = patch.delivered_count {
            self.delivered_count = delivered;
        }
        if let Some(failed) = patch.failed_count {
            self.failed_count = failed;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Partial campaign update (the reconciliation write).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPatch {
    pub status: Option<CampaignStatus>,
    pub sent_count: Option<u64>,
    pub delivered_count: Option<u64>,
    pub failed_count: Option<u64>,
}

// ─── Delivery logs ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Sent,
    Delivered,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "SENT",
            DeliveryStatus::Delivered => "DELIVERED",
            DeliveryStatus::Failed => "FAILED",
        }
    }
}

/// One row per matched customer per launch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLog {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub customer_id: String,
    pub rendered_message: String,
    pub status: DeliveryStatus,
    pub sent_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
}
