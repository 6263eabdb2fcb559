//! Store-query descriptor — the filter structure handed to customer stores
//! that can evaluate segment rules server-side.
//!
//! Descriptors are plain data. A store either translates them into its own
//! query syntax or, for in-process stores, interprets them with
//! [`QueryDescriptor::matches`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::types::{CustomerField, CustomerSnapshot};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueryComparison {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
}

impl QueryComparison {
    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            QueryComparison::Gt => ordering == Ordering::Greater,
            QueryComparison::Gte => ordering != Ordering::Less,
            QueryComparison::Lt => ordering == Ordering::Less,
            QueryComparison::Lte => ordering != Ordering::Greater,
            QueryComparison::Eq => ordering == Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum QueryValue {
    Number(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl QueryValue {
    fn compare(&self, other: &QueryValue) -> Option<Ordering> {
        match (self, other) {
            (QueryValue::Number(a), QueryValue::Number(b)) => a.partial_cmp(b),
            (QueryValue::Timestamp(a), QueryValue::Timestamp(b)) => Some(a.cmp(b)),
            (QueryValue::Text(a), QueryValue::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryDescriptor {
    /// Matches no customer. Produced for an empty rule list.
    MatchNone,
    Compare {
        field: CustomerField,
        comparison: QueryComparison,
        value: QueryValue,
    },
    And(Vec<QueryDescriptor>),
    Or(Vec<QueryDescriptor>),
}

impl QueryDescriptor {
    pub fn compare(field: CustomerField, comparison: QueryComparison, value: QueryValue) -> Self {
        QueryDescriptor::Compare {
            field,
            comparison,
            value,
        }
    }

    /// `self AND other`, flattening into an existing conjunction.
    pub fn and(self, other: QueryDescriptor) -> Self {
        match self {
            QueryDescriptor::And(mut clauses) => {
                clauses.push(other);
                QueryDescriptor::And(clauses)
            }
            lhs => QueryDescriptor::And(vec![lhs, other]),
        }
    }

    /// `self OR other`, flattening into an existing disjunction.
    pub fn or(self, other: QueryDescriptor) -> Self {
        match self {
            QueryDescriptor::Or(mut clauses) => {
                clauses.push(other);
                QueryDescriptor::Or(clauses)
            }
            lhs => QueryDescriptor::Or(vec![lhs, other]),
        }
    }

    /// Reference interpretation for stores that filter in-process.
    pub fn matches(&self, customer: &CustomerSnapshot) -> bool {
        match self {
            QueryDescriptor::MatchNone => false,
            QueryDescriptor::Compare {
                field,
                comparison,
                value,
            } => field_value(customer, *field)
                .compare(value)
                .is_some_and(|ordering| comparison.accepts(ordering)),
            QueryDescriptor::And(clauses) => clauses.iter().all(|c| c.matches(customer)),
            QueryDescriptor::Or(clauses) => clauses.iter().any(|c| c.matches(customer)),
        }
    }
}

fn field_value(customer: &CustomerSnapshot, field: CustomerField) -> QueryValue {
    match field {
        CustomerField::VisitCount => QueryValue::Number(customer.visit_count as f64),
        CustomerField::LastActive => QueryValue::Timestamp(customer.last_active),
        CustomerField::TotalSpend => QueryValue::Number(customer.total_spend),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn customer(visits: u64, days_idle: i64, spend: f64) -> CustomerSnapshot {
        CustomerSnapshot {
            customer_id: "CUST-1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            visit_count: visits,
            last_active: Utc::now() - Duration::days(days_idle),
            total_spend: spend,
        }
    }

    #[test]
    fn test_match_none() {
        assert!(!QueryDescriptor::MatchNone.matches(&customer(5, 1, 10.0)));
    }

    #[test]
    fn test_numeric_compare() {
        let q = QueryDescriptor::compare(
            CustomerField::TotalSpend,
            QueryComparison::Gt,
            QueryValue::Number(5000.0),
        );
        assert!(q.matches(&customer(1, 1, 6000.0)));
        assert!(!q.matches(&customer(1, 1, 5000.0)));
    }

    #[test]
    fn test_text_never_matches_numeric_field() {
        let q = QueryDescriptor::compare(
            CustomerField::VisitCount,
            QueryComparison::Eq,
            QueryValue::Text("many".to_string()),
        );
        assert!(!q.matches(&customer(3, 1, 0.0)));
    }

    #[test]
    fn test_and_or_flatten() {
        let a = QueryDescriptor::compare(
            CustomerField::VisitCount,
            QueryComparison::Gte,
            QueryValue::Number(1.0),
        );
        let b = QueryDescriptor::compare(
            CustomerField::VisitCount,
            QueryComparison::Gte,
            QueryValue::Number(2.0),
        );
        let c = QueryDescriptor::compare(
            CustomerField::VisitCount,
            QueryComparison::Gte,
            QueryValue::Number(3.0),
        );

        let q = a.clone().and(b.clone()).and(c.clone());
        assert_eq!(q, QueryDescriptor::And(vec![a.clone(), b.clone(), c.clone()]));

        let q = a.clone().or(b.clone()).and(c.clone());
        assert_eq!(
            q,
            QueryDescriptor::And(vec![QueryDescriptor::Or(vec![a, b]), c])
        );
    }

    #[test]
    fn test_descriptor_serializes() {
        let q = QueryDescriptor::compare(
            CustomerField::VisitCount,
            QueryComparison::Lt,
            QueryValue::Number(2.0),
        );
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["compare"]["field"], "visitCount");
        assert_eq!(json["compare"]["comparison"], "lt");
        let back: QueryDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back, q);
    }
}
