//! Segmentation service — resolves compiled rules against the customer store.

use campaign_core::error::CampaignResult;
use campaign_core::store::CustomerStore;
use campaign_core::types::{CustomerSnapshot, RuleDraft};
use std::sync::Arc;
use tracing::{debug, info};

use crate::compiler::{CompiledRule, RuleCompiler};

/// Preview and resolve segments. Holds no mutable state.
#[derive(Clone)]
pub struct SegmentationService {
    store: Arc<dyn CustomerStore>,
    compiler: RuleCompiler,
}

impl SegmentationService {
    pub fn new(store: Arc<dyn CustomerStore>) -> Self {
        Self {
            store,
            compiler: RuleCompiler::new(),
        }
    }

    pub fn compiler(&self) -> &RuleCompiler {
        &self.compiler
    }

    /// Number of customers the rules select.
    pub async fn preview(&self, rules: &[RuleDraft]) -> CampaignResult<u64> {
        let compiled = self.compiler.compile(rules)?;
        let count = self.count_compiled(&compiled).await?;
        metrics::counter!("segmentation.previews").increment(1);
        info!(rules = rules.len(), count, "Segment preview");
        Ok(count)
    }

    /// The customers the rules select.
    pub async fn resolve(&self, rules: &[RuleDraft]) -> CampaignResult<Vec<CustomerSnapshot>> {
        let compiled = self.compiler.compile(rules)?;
        self.resolve_compiled(&compiled).await
    }

    pub async fn count_compiled(&self, compiled: &CompiledRule) -> CampaignResult<u64> {
        if compiled.matches_nothing() {
            return Ok(0);
        }
        if self.store.supports_filtering() {
            self.store.count(&compiled.query).await
        } else {
            Ok(self.scan_matching(compiled).await?.len() as u64)
        }
    }

    pub async fn resolve_compiled(
        &self,
        compiled: &CompiledRule,
    ) -> CampaignResult<Vec<CustomerSnapshot>> {
        if compiled.matches_nothing() {
            return Ok(Vec::new());
        }
        let matched = if self.store.supports_filtering() {
            self.store.find(&compiled.query).await?
        } else {
            self.scan_matching(compiled).await?
        };
        metrics::counter!("segmentation.resolves").increment(1);
        debug!(matched = matched.len(), "Segment resolved");
        Ok(matched)
    }

    async fn scan_matching(&self, compiled: &CompiledRule) -> CampaignResult<Vec<CustomerSnapshot>> {
        let all = self.store.scan().await?;
        Ok(compiled.predicate.filter(all))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SegmentRuleBuilder;
    use async_trait::async_trait;
    use campaign_core::error::CampaignError;
    use campaign_core::query::QueryDescriptor;
    use chrono::{Duration, Utc};
    use proptest::prelude::*;

    struct FixtureStore {
        customers: Vec<CustomerSnapshot>,
        filtering: bool,
    }

    #[async_trait]
    impl CustomerStore for FixtureStore {
        fn supports_filtering(&self) -> bool {
            self.filtering
        }

        async fn find(&self, query: &QueryDescriptor) -> CampaignResult<Vec<CustomerSnapshot>> {
            Ok(self
                .customers
                .iter()
                .filter(|c| query.matches(c))
                .cloned()
                .collect())
        }

        async fn count(&self, query: &QueryDescriptor) -> CampaignResult<u64> {
            Ok(self.customers.iter().filter(|c| query.matches(c)).count() as u64)
        }

        async fn scan(&self) -> CampaignResult<Vec<CustomerSnapshot>> {
            Ok(self.customers.clone())
        }
    }

    struct DownStore;

    #[async_trait]
    impl CustomerStore for DownStore {
        async fn find(&self, _: &QueryDescriptor) -> CampaignResult<Vec<CustomerSnapshot>> {
            Err(CampaignError::StoreUnavailable("connection refused".to_string()))
        }

        async fn count(&self, _: &QueryDescriptor) -> CampaignResult<u64> {
            Err(CampaignError::StoreUnavailable("connection refused".to_string()))
        }

        async fn scan(&self) -> CampaignResult<Vec<CustomerSnapshot>> {
            Err(CampaignError::StoreUnavailable("connection refused".to_string()))
        }
    }

    fn customer(id: &str, visits: u64, days_idle: i64, spend: f64) -> CustomerSnapshot {
        CustomerSnapshot {
            customer_id: id.to_string(),
            name: id.to_string(),
            email: format!("{id}@example.com"),
            visit_count: visits,
            last_active: Utc::now() - Duration::days(days_idle),
            total_spend: spend,
        }
    }

    fn service(customers: Vec<CustomerSnapshot>, filtering: bool) -> SegmentationService {
        SegmentationService::new(Arc::new(FixtureStore {
            customers,
            filtering,
        }))
    }

    fn spenders() -> Vec<CustomerSnapshot> {
        vec![
            customer("a", 1, 5, 1000.0),
            customer("b", 3, 40, 6000.0),
            customer("c", 9, 200, 10000.0),
        ]
    }

    #[tokio::test]
    async fn test_preview_total_spend() {
        for filtering in [true, false] {
            let svc = service(spenders(), filtering);
            let rules = SegmentRuleBuilder::new().spend_above(5000.0).build();
            assert_eq!(svc.preview(&rules).await.unwrap(), 2);
            assert_eq!(svc.resolve(&rules).await.unwrap().len(), 2);
        }
    }

    #[tokio::test]
    async fn test_empty_rules_select_nobody() {
        let svc = service(spenders(), true);
        assert_eq!(svc.preview(&[]).await.unwrap(), 0);
        assert!(svc.resolve(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_rule_surfaces() {
        let svc = service(spenders(), true);
        let err = svc
            .preview(&[RuleDraft::new("favoriteColor", "=", "blue")])
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignError::InvalidRule(_)));
    }

    #[tokio::test]
    async fn test_store_unavailable_propagates() {
        let svc = SegmentationService::new(Arc::new(DownStore));
        let rules = SegmentRuleBuilder::new().visits_at_least(1).build();
        assert!(matches!(
            svc.preview(&rules).await,
            Err(CampaignError::StoreUnavailable(_))
        ));
        assert!(matches!(
            svc.resolve(&rules).await,
            Err(CampaignError::StoreUnavailable(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_preview_equals_resolved_len(
            visits in 0u64..20,
            spend in 0u32..8000,
            days in 0u32..300,
            use_or in any::<bool>(),
            filtering in any::<bool>(),
        ) {
            let fixture: Vec<CustomerSnapshot> = (0..25)
                .map(|i: u64| customer(&format!("c{i}"), i % 13, (i * 17 % 300) as i64, (i * 311) as f64))
                .collect();
            let svc = service(fixture, filtering);
            let builder = SegmentRuleBuilder::new().visits_at_least(visits);
            let builder = if use_or { builder.or() } else { builder.and() };
            let rules = builder
                .spend_above(f64::from(spend))
                .inactive_for_more_than(days)
                .build();

            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let (count, resolved) = rt.block_on(async {
                (svc.preview(&rules).await.unwrap(), svc.resolve(&rules).await.unwrap())
            });
            prop_assert_eq!(count, resolved.len() as u64);
        }
    }
}
