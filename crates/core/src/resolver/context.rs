// Partial context filter - per feature: pinned, wildcard-only, or open

use std::collections::HashMap;

/// Filter state for a single context feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureFilter {
    /// The live context is known to carry exactly this value.
    Value(String),
    /// No exact-match condition can apply at this feature; only
    /// wildcard conditions remain eligible. On the wire this is the
    /// empty string, which never equals a real condition value.
    WildcardOnly,
}

/// A partial context: features with an entry are pinned (or forced to
/// wildcard), features without one are unknown and any value is still
/// possible for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextFilter {
    entries: HashMap<String, FeatureFilter>,
}

impl ContextFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a filter from wire-form pairs, where an empty value is
    /// the wildcard-only sentinel.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut filter = Self::new();
        for (feature, value) in entries {
            let value = value.into();
            let entry = if value.is_empty() {
                FeatureFilter::WildcardOnly
            } else {
                FeatureFilter::Value(value)
            };
            filter.entries.insert(feature.into(), entry);
        }
        filter
    }

    /// Pins `feature` to a concrete value.
    pub fn pin(mut self, feature: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries
            .insert(feature.into(), FeatureFilter::Value(value.into()));
        self
    }

    /// Rules out every exact match at `feature`.
    pub fn wildcard_only(mut self, feature: impl Into<String>) -> Self {
        self.entries
            .insert(feature.into(), FeatureFilter::WildcardOnly);
        self
    }

    /// Returns `feature` to the unknown state.
    pub fn clear(&mut self, feature: &str) {
        self.entries.remove(feature);
    }

    pub fn get(&self, feature: &str) -> Option<&FeatureFilter> {
        self.entries.get(feature)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_wire_value_is_the_wildcard_only_sentinel() {
        let filter = ContextFilter::from_entries([("env", "prod"), ("service", "")]);
        assert_eq!(
            filter.get("env"),
            Some(&FeatureFilter::Value("prod".to_string()))
        );
        assert_eq!(filter.get("service"), Some(&FeatureFilter::WildcardOnly));
        assert_eq!(filter.get("region"), None);
    }

    #[test]
    fn clear_makes_a_feature_unknown_again() {
        let mut filter = ContextFilter::new().pin("env", "prod");
        filter.clear("env");
        assert!(filter.is_empty());
    }
}
