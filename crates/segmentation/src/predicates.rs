//! Predicate types and validation for segment rules.

use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::query::QueryComparison;
use campaign_core::types::{CustomerField, RuleDraft};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Equals,
}

impl ComparisonOperator {
    pub fn parse(symbol: &str) -> CampaignResult<Self> {
        match symbol.trim() {
            ">" => Ok(ComparisonOperator::GreaterThan),
            "<" => Ok(ComparisonOperator::LessThan),
            ">=" => Ok(ComparisonOperator::GreaterThanOrEqual),
            "<=" => Ok(ComparisonOperator::LessThanOrEqual),
            "=" => Ok(ComparisonOperator::Equals),
            other => Err(CampaignError::InvalidRule(format!(
                "unrecognized operator '{other}'"
            ))),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::GreaterThanOrEqual => ">=",
            ComparisonOperator::LessThanOrEqual => "<=",
            ComparisonOperator::Equals => "=",
        }
    }

    /// The operator with its operands swapped (`a > b` ⇔ `b < a`).
    pub fn mirrored(&self) -> Self {
        match self {
            ComparisonOperator::GreaterThan => ComparisonOperator::LessThan,
            ComparisonOperator::LessThan => ComparisonOperator::GreaterThan,
            ComparisonOperator::GreaterThanOrEqual => ComparisonOperator::LessThanOrEqual,
            ComparisonOperator::LessThanOrEqual => ComparisonOperator::GreaterThanOrEqual,
            ComparisonOperator::Equals => ComparisonOperator::Equals,
        }
    }

    pub fn compare<T: PartialOrd>(&self, actual: T, expected: T) -> bool {
        match actual.partial_cmp(&expected) {
            Some(Ordering::Greater) => matches!(
                self,
                ComparisonOperator::GreaterThan | ComparisonOperator::GreaterThanOrEqual
            ),
            Some(Ordering::Less) => matches!(
                self,
                ComparisonOperator::LessThan | ComparisonOperator::LessThanOrEqual
            ),
            Some(Ordering::Equal) => matches!(
                self,
                ComparisonOperator::Equals
                    | ComparisonOperator::GreaterThanOrEqual
                    | ComparisonOperator::LessThanOrEqual
            ),
            None => false,
        }
    }
}

impl From<ComparisonOperator> for QueryComparison {
    fn from(op: ComparisonOperator) -> Self {
        match op {
            ComparisonOperator::GreaterThan => QueryComparison::Gt,
            ComparisonOperator::LessThan => QueryComparison::Lt,
            ComparisonOperator::GreaterThanOrEqual => QueryComparison::Gte,
            ComparisonOperator::LessThanOrEqual => QueryComparison::Lte,
            ComparisonOperator::Equals => QueryComparison::Eq,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connective {
    #[default]
    And,
    Or,
}

impl Connective {
    pub fn parse(raw: &str) -> CampaignResult<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Connective::And),
            "OR" => Ok(Connective::Or),
            other => Err(CampaignError::InvalidRule(format!(
                "unrecognized connective '{other}'"
            ))),
        }
    }
}

/// A rule value after per-field interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleValue {
    Number(f64),
    /// Whole days before "now" (for `lastActive`).
    Days(u32),
    /// Non-numeric literal on a numeric field; only valid with `=`.
    Text(String),
}

/// A single validated condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: CustomerField,
    pub operator: ComparisonOperator,
    pub value: RuleValue,
    /// How this condition folds into everything before it. Ignored on the
    /// first condition of a list.
    pub connective: Connective,
}

impl Condition {
    pub fn parse(draft: &RuleDraft) -> CampaignResult<Self> {
        let field = parse_field(&draft.field)?;
        let operator = ComparisonOperator::parse(&draft.operator)?;
        let connective = match draft.connective.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Connective::parse(raw)?,
            _ => Connective::And,
        };
        let value = parse_value(field, operator, &draft.value)?;

        Ok(Self {
            field,
            operator,
            value,
            connective,
        })
    }
}

pub fn parse_field(raw: &str) -> CampaignResult<CustomerField> {
    match raw.trim() {
        "visitCount" => Ok(CustomerField::VisitCount),
        "lastActive" => Ok(CustomerField::LastActive),
        "totalSpend" => Ok(CustomerField::TotalSpend),
        other => Err(CampaignError::InvalidRule(format!(
            "unrecognized field '{other}'"
        ))),
    }
}

fn parse_value(
    field: CustomerField,
    operator: ComparisonOperator,
    raw: &str,
) -> CampaignResult<RuleValue> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(CampaignError::InvalidRule(format!(
            "missing value for '{field}'"
        )));
    }

    match field {
        CustomerField::LastActive => raw.parse::<u32>().map(RuleValue::Days).map_err(|_| {
            CampaignError::InvalidRule(format!(
                "'{field}' expects a whole number of days, got '{raw}'"
            ))
        }),
        CustomerField::VisitCount | CustomerField::TotalSpend => match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(RuleValue::Number(n)),
            _ if operator == ComparisonOperator::Equals => Ok(RuleValue::Text(raw.to_string())),
            _ => Err(CampaignError::InvalidRule(format!(
                "operator '{}' on '{field}' needs a numeric value, got '{raw}'",
                operator.symbol()
            ))),
        },
    }
}

/// Ordered, validated conditions. Combined strictly left to right.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionList {
    conditions: Vec<Condition>,
}

impl ConditionList {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self { conditions }
    }

    /// Validate every draft; the first malformed one rejects the whole list.
    pub fn parse(drafts: &[RuleDraft]) -> CampaignResult<Self> {
        drafts
            .iter()
            .enumerate()
            .map(|(i, draft)| {
                Condition::parse(draft).map_err(|e| match e {
                    CampaignError::InvalidRule(msg) => {
                        CampaignError::InvalidRule(format!("rule {}: {msg}", i + 1))
                    }
                    other => other,
                })
            })
            .collect::<CampaignResult<Vec<_>>>()
            .map(Self::new)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Condition> {
        self.conditions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operators() {
        for symbol in [">", "<", ">=", "<=", "="] {
            assert_eq!(ComparisonOperator::parse(symbol).unwrap().symbol(), symbol);
        }
        assert!(matches!(
            ComparisonOperator::parse("!="),
            Err(CampaignError::InvalidRule(_))
        ));
    }

    #[test]
    fn test_compare() {
        assert!(ComparisonOperator::GreaterThan.compare(6000.0, 5000.0));
        assert!(!ComparisonOperator::GreaterThan.compare(5000.0, 5000.0));
        assert!(ComparisonOperator::GreaterThanOrEqual.compare(5000.0, 5000.0));
        assert!(ComparisonOperator::LessThanOrEqual.compare(3, 4));
        assert!(ComparisonOperator::Equals.compare(4, 4));
        assert!(!ComparisonOperator::Equals.compare(f64::NAN, f64::NAN));
    }

    #[test]
    fn test_mirrored_is_consistent() {
        for op in [
            ComparisonOperator::GreaterThan,
            ComparisonOperator::LessThan,
            ComparisonOperator::GreaterThanOrEqual,
            ComparisonOperator::LessThanOrEqual,
            ComparisonOperator::Equals,
        ] {
            for (a, b) in [(1, 2), (2, 2), (3, 2)] {
                assert_eq!(op.compare(a, b), op.mirrored().compare(b, a));
            }
        }
    }

    #[test]
    fn test_parse_condition() {
        let cond = Condition::parse(&RuleDraft::new("totalSpend", ">", "5000")).unwrap();
        assert_eq!(cond.field, CustomerField::TotalSpend);
        assert_eq!(cond.value, RuleValue::Number(5000.0));
        assert_eq!(cond.connective, Connective::And);

        let cond = Condition::parse(&RuleDraft::new("lastActive", ">", "180").with_connective("or"))
            .unwrap();
        assert_eq!(cond.value, RuleValue::Days(180));
        assert_eq!(cond.connective, Connective::Or);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = Condition::parse(&RuleDraft::new("age", ">", "30")).unwrap_err();
        assert!(err.to_string().contains("age"));
    }

    #[test]
    fn test_non_numeric_value_only_with_equals() {
        let cond = Condition::parse(&RuleDraft::new("visitCount", "=", "lots")).unwrap();
        assert_eq!(cond.value, RuleValue::Text("lots".to_string()));

        assert!(Condition::parse(&RuleDraft::new("visitCount", ">", "lots")).is_err());
        assert!(Condition::parse(&RuleDraft::new("totalSpend", "<", "NaN")).is_err());
    }

    #[test]
    fn test_last_active_requires_whole_days() {
        assert!(Condition::parse(&RuleDraft::new("lastActive", ">", "-3")).is_err());
        assert!(Condition::parse(&RuleDraft::new("lastActive", ">", "1.5")).is_err());
        assert!(Condition::parse(&RuleDraft::new("lastActive", ">", "")).is_err());
    }

    #[test]
    fn test_bad_connective_rejected() {
        let draft = RuleDraft::new("visitCount", ">", "1").with_connective("XOR");
        assert!(Condition::parse(&draft).is_err());
    }

    #[test]
    fn test_list_error_names_rule_position() {
        let drafts = vec![
            RuleDraft::new("visitCount", ">", "1"),
            RuleDraft::new("visitCount", "~", "1"),
        ];
        let err = ConditionList::parse(&drafts).unwrap_err();
        assert!(err.to_string().contains("rule 2"));
    }
}
