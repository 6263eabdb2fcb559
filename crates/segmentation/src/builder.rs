//! Segment rule builder — fluent API for constructing rule lists in the
//! same serial shape the authoring form produces.

use campaign_core::types::RuleDraft;

use crate::predicates::Connective;

pub struct SegmentRuleBuilder {
    rules: Vec<RuleDraft>,
    next_connective: Connective,
}

impl SegmentRuleBuilder {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            next_connective: Connective::And,
        }
    }

    /// Combine the next condition with everything so far using AND.
    pub fn and(mut self) -> Self {
        self.next_connective = Connective::And;
        self
    }

    /// Combine the next condition with everything so far using OR.
    pub fn or(mut self) -> Self {
        self.next_connective = Connective::Or;
        self
    }

    pub fn condition(mut self, field: &str, operator: &str, value: impl ToString) -> Self {
        let mut rule = RuleDraft::new(field, operator, &value.to_string());
        rule.id = Some(format!("rule-{}", self.rules.len() + 1));
        if !self.rules.is_empty() {
            rule.connective = Some(
                match self.next_connective {
                    Connective::And => "AND",
                    Connective::Or => "OR",
                }
                .to_string(),
            );
        }
        self.rules.push(rule);
        self.next_connective = Connective::And;
        self
    }

    pub fn visits_at_least(self, visits: u64) -> Self {
        self.condition("visitCount", ">=", visits)
    }

    pub fn spend_above(self, amount: f64) -> Self {
        self.condition("totalSpend", ">", amount)
    }

    pub fn inactive_for_more_than(self, days: u32) -> Self {
        self.condition("lastActive", ">", days)
    }

    pub fn active_within(self, days: u32) -> Self {
        self.condition("lastActive", "<", days)
    }

    pub fn build(self) -> Vec<RuleDraft> {
        self.rules
    }
}

impl Default for SegmentRuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates::ConditionList;

    #[test]
    fn test_builder_shapes_serial_rules() {
        let rules = SegmentRuleBuilder::new()
            .visits_at_least(5)
            .or()
            .spend_above(1000.0)
            .inactive_for_more_than(60)
            .build();

        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].connective, None);
        assert_eq!(rules[1].connective.as_deref(), Some("OR"));
        assert_eq!(rules[2].connective.as_deref(), Some("AND"));
        assert_eq!(rules[2].value, "60");
        assert!(ConditionList::parse(&rules).is_ok());
    }
}
