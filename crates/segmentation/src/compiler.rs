//! Rule compiler — lowers a condition list into an in-memory predicate and an
//! equivalent store-query descriptor.
//!
//! Conditions combine strictly left to right with no precedence:
//! `[A, B(OR), C(AND)]` means `(A OR B) AND C`.

use campaign_core::error::{CampaignError, CampaignResult};
use campaign_core::query::{QueryComparison, QueryDescriptor, QueryValue};
use campaign_core::types::{CustomerField, CustomerSnapshot, RuleDraft};
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::predicates::{ComparisonOperator, Condition, ConditionList, Connective, RuleValue};

type Test = Box<dyn Fn(&CustomerSnapshot) -> bool + Send + Sync>;

struct Term {
    connective: Connective,
    test: Test,
}

/// Boolean function over a customer snapshot.
pub struct CompiledPredicate {
    terms: Vec<Term>,
}

impl CompiledPredicate {
    pub fn matches(&self, customer: &CustomerSnapshot) -> bool {
        let Some((first, rest)) = self.terms.split_first() else {
            return false;
        };
        rest.iter()
            .fold((first.test)(customer), |acc, term| match term.connective {
                Connective::Or => acc || (term.test)(customer),
                Connective::And => acc && (term.test)(customer),
            })
    }

    pub fn filter(&self, customers: Vec<CustomerSnapshot>) -> Vec<CustomerSnapshot> {
        customers.into_iter().filter(|c| self.matches(c)).collect()
    }
}

impl std::fmt::Debug for CompiledPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledPredicate")
            .field("terms", &self.terms.len())
            .finish()
    }
}

/// Output of one compile call. Both representations carry the same semantics.
#[derive(Debug)]
pub struct CompiledRule {
    pub predicate: CompiledPredicate,
    pub query: QueryDescriptor,
    pub compiled_at: DateTime<Utc>,
}

impl CompiledRule {
    pub fn matches_nothing(&self) -> bool {
        self.query == QueryDescriptor::MatchNone
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleCompiler;

impl RuleCompiler {
    pub fn new() -> Self {
        Self
    }

    pub fn compile(&self, drafts: &[RuleDraft]) -> CampaignResult<CompiledRule> {
        self.compile_at(drafts, Utc::now())
    }

    /// Compile with an explicit "now" anchoring `lastActive` cutoffs.
    pub fn compile_at(
        &self,
        drafts: &[RuleDraft],
        now: DateTime<Utc>,
    ) -> CampaignResult<CompiledRule> {
        let conditions = ConditionList::parse(drafts)?;
        self.compile_conditions(&conditions, now)
    }

    pub fn compile_conditions(
        &self,
        conditions: &ConditionList,
        now: DateTime<Utc>,
    ) -> CampaignResult<CompiledRule> {
        let mut terms = Vec::with_capacity(conditions.len());
        let mut query: Option<QueryDescriptor> = None;

        for condition in conditions.iter() {
            let (test, clause) = lower(condition, now)?;
            query = Some(match query {
                None => clause,
                Some(acc) => match condition.connective {
                    Connective::Or => acc.or(clause),
                    Connective::And => acc.and(clause),
                },
            });
            terms.push(Term {
                connective: condition.connective,
                test,
            });
        }

        debug!(conditions = conditions.len(), "Compiled segment rules");

        Ok(CompiledRule {
            predicate: CompiledPredicate { terms },
            query: query.unwrap_or(QueryDescriptor::MatchNone),
            compiled_at: now,
        })
    }
}

fn lower(condition: &Condition, now: DateTime<Utc>) -> CampaignResult<(Test, QueryDescriptor)> {
    let field = condition.field;
    let op = condition.operator;

    match (&condition.value, field) {
        (RuleValue::Days(days), CustomerField::LastActive) => {
            let cutoff = cutoff(now, *days)?;
            Ok(lower_inactivity(op, cutoff))
        }
        (RuleValue::Number(threshold), CustomerField::VisitCount | CustomerField::TotalSpend) => {
            let threshold = *threshold;
            let test: Test = match field {
                CustomerField::VisitCount => {
                    Box::new(move |c| op.compare(c.visit_count as f64, threshold))
                }
                _ => Box::new(move |c| op.compare(c.total_spend, threshold)),
            };
            let clause = QueryDescriptor::compare(field, op.into(), QueryValue::Number(threshold));
            Ok((test, clause))
        }
        (RuleValue::Text(literal), CustomerField::VisitCount | CustomerField::TotalSpend)
            if op == ComparisonOperator::Equals =>
        {
            let clause =
                QueryDescriptor::compare(field, QueryComparison::Eq, QueryValue::Text(literal.clone()));
            Ok((Box::new(|_| false), clause))
        }
        (value, field) => Err(CampaignError::InvalidRule(format!(
            "value {value:?} cannot be used with '{field}' and operator '{}'",
            op.symbol()
        ))),
    }
}

fn cutoff(now: DateTime<Utc>, days: u32) -> CampaignResult<DateTime<Utc>> {
    let days_back = |n: i64| Duration::try_days(n).and_then(|span| now.checked_sub_signed(span));
    // one spare day so the `=` window floor stays representable
    match (days_back(i64::from(days)), days_back(i64::from(days) + 1)) {
        (Some(cutoff), Some(_)) => Ok(cutoff),
        _ => Err(CampaignError::InvalidRule(format!(
            "'{days}' days is out of range"
        ))),
    }
}

/// `lastActive <op> N` reads as "inactive for <op> N days", so the timestamp
/// comparison against the cutoff is the mirrored operator. `=` selects the
/// one-day window of customers idle exactly N whole days.
fn lower_inactivity(op: ComparisonOperator, cutoff: DateTime<Utc>) -> (Test, QueryDescriptor) {
    let field = CustomerField::LastActive;
    if op == ComparisonOperator::Equals {
        let floor = cutoff - Duration::days(1);
        let test: Test = Box::new(move |c| c.last_active > floor && c.last_active <= cutoff);
        let clause = QueryDescriptor::And(vec![
            QueryDescriptor::compare(field, QueryComparison::Gt, QueryValue::Timestamp(floor)),
            QueryDescriptor::compare(field, QueryComparison::Lte, QueryValue::Timestamp(cutoff)),
        ]);
        return (test, clause);
    }

    let timestamp_op = op.mirrored();
    let test: Test = Box::new(move |c| timestamp_op.compare(c.last_active, cutoff));
    let clause =
        QueryDescriptor::compare(field, timestamp_op.into(), QueryValue::Timestamp(cutoff));
    (test, clause)
}
