// Setting model - the unit a rule set attaches to

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A configurable setting: its name, the ordered list of context
/// features its rules may constrain, and its default value. Feature
/// order is load-bearing: it fixes trie depth and tie-break priority.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Setting<V> {
    pub name: String,
    pub configurable_features: Vec<String>,
    pub default_value: V,
    #[serde(default = "HashMap::new")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl<V> Setting<V> {
    pub fn new(
        name: impl Into<String>,
        configurable_features: Vec<String>,
        default_value: V,
    ) -> Self {
        Self {
            name: name.into(),
            configurable_features,
            default_value,
            metadata: HashMap::new(),
        }
    }
}
