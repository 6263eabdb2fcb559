use thiserror::Error;

use crate::types::CampaignStatus;

pub type CampaignResult<T> = Result<T, CampaignError>;

#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid campaign transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: CampaignStatus,
        to: CampaignStatus,
    },

    #[error("Partial delivery failure: {failed} of {total} delivery logs could not be written")]
    PartialDeliveryFailure { failed: usize, total: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl CampaignError {
    /// Whether the caller supplied bad input (as opposed to an infrastructure fault).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CampaignError::InvalidRule(_)
                | CampaignError::Validation(_)
                | CampaignError::NotFound(_)
                | CampaignError::InvalidTransition { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = CampaignError::InvalidRule("unknown field 'age'".to_string());
        assert_eq!(err.to_string(), "Invalid rule: unknown field 'age'");

        let err = CampaignError::PartialDeliveryFailure { failed: 2, total: 10 };
        assert!(err.to_string().contains("2 of 10"));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(CampaignError::InvalidRule("x".into()).is_client_error());
        assert!(CampaignError::InvalidTransition {
            from: CampaignStatus::Completed,
            to: CampaignStatus::Active,
        }
        .is_client_error());
        assert!(!CampaignError::StoreUnavailable("down".into()).is_client_error());
    }
}
