//! Segmentation rule engine — predicate model, rule compiler, computed
//! properties and the segment preview/resolve service.

pub mod builder;
pub mod compiler;
pub mod computed;
pub mod engine;
pub mod predicates;

pub use builder::SegmentRuleBuilder;
pub use compiler::{CompiledPredicate, CompiledRule, RuleCompiler};
pub use computed::SpendRollup;
pub use engine::SegmentationService;
pub use predicates::{ComparisonOperator, Condition, ConditionList, Connective, RuleValue};
