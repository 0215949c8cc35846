// Rule model - a single context-dependent override for a setting

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier reserved for the synthetic fallback rule that wraps a
/// setting's default value. The backend never assigns it to a real rule.
pub const DEFAULT_RULE_ID: i64 = -1;

/// Key under which unconstrained features are stored in the rule tree,
/// and the value reported for presumed-wildcard assumptions.
pub const WILDCARD: &str = "*";

/// One override rule. A feature missing from `context_features` is a
/// wildcard: the rule places no condition on it. The value payload is
/// opaque to the engine; rendering and validation live elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rule<V> {
    pub rule_id: i64,
    pub value: V,
    #[serde(default = "HashMap::new")]
    pub context_features: HashMap<String, String>,
    #[serde(default = "HashMap::new")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl<V> Rule<V> {
    pub fn new(rule_id: i64, value: V, context_features: HashMap<String, String>) -> Self {
        Self {
            rule_id,
            value,
            context_features,
            metadata: HashMap::new(),
        }
    }

    /// The constraint-free, lowest-priority fallback carrying the
    /// setting's default value.
    pub fn default_rule(value: V) -> Self {
        Self::new(DEFAULT_RULE_ID, value, HashMap::new())
    }

    pub fn is_default(&self) -> bool {
        self.rule_id == DEFAULT_RULE_ID
    }

    /// The concrete value this rule requires at `feature`, if any.
    pub fn constraint(&self, feature: &str) -> Option<&str> {
        self.context_features.get(feature).map(String::as_str)
    }
}
