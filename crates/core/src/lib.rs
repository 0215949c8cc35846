pub mod error;
pub mod model;
pub mod predicate;
pub mod resolver;
pub mod store;

pub use error::{CoreError, Result};
pub use model::{Rule, Setting, DEFAULT_RULE_ID, WILDCARD};
pub use predicate::ValuePredicate;
pub use resolver::context::{ContextFilter, FeatureFilter};
pub use resolver::engine::{potential_rules, PotentialRule};
pub use resolver::matches::{compare_matches, compare_rules, ContextMatch, MatchOrdering};
pub use resolver::tree::{RuleNode, RuleTree};
pub use store::RuleSet;
