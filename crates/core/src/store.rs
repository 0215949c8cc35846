// Rule set - per-setting façade over the tree, the resolve entry point
// and the editing workflows.
//
// Mutations are expected to run only after the corresponding backend
// persistence call succeeded; they swap in a new tree reference
// (copy-on-write) so readers holding a shallow copy are never torn.

use crate::error::{CoreError, Result};
use crate::model::{Rule, Setting};
use crate::resolver::context::ContextFilter;
use crate::resolver::engine::{potential_rules, PotentialRule};
use crate::resolver::tree::RuleTree;
use tracing::debug;

/// The rules of one setting, indexed for resolution. Always contains
/// the synthetic default rule wrapping the setting's default value.
#[derive(Debug, Clone)]
pub struct RuleSet<V> {
    setting: Setting<V>,
    tree: RuleTree<V>,
}

impl<V: Clone> RuleSet<V> {
    /// Builds the tree from the flat rule list loaded for `setting`,
    /// appending the synthetic default. Rules constraining a feature
    /// outside the setting's configurable list are rejected.
    pub fn new(setting: Setting<V>, rules: Vec<Rule<V>>) -> Result<Self> {
        for rule in &rules {
            validate_features(rule, &setting.configurable_features)?;
        }
        let mut all = rules;
        all.push(Rule::default_rule(setting.default_value.clone()));
        let tree = RuleTree::build(&all, &setting.configurable_features);
        Ok(Self { setting, tree })
    }

    pub fn setting(&self) -> &Setting<V> {
        &self.setting
    }

    pub fn features(&self) -> &[String] {
        &self.setting.configurable_features
    }

    /// The current tree reference. A caller may keep a shallow copy
    /// across later mutations; it will keep resolving the old contents.
    pub fn tree(&self) -> &RuleTree<V> {
        &self.tree
    }

    /// All rules, unordered, including the synthetic default.
    pub fn rules(&self) -> Vec<&Rule<V>> {
        self.tree.flatten()
    }

    pub fn get(&self, rule_id: i64) -> Option<&Rule<V>> {
        self.tree.flatten().into_iter().find(|r| r.rule_id == rule_id)
    }

    /// Pure resolution pass; see `resolver::engine::potential_rules`.
    pub fn resolve<F>(&self, filter: &ContextFilter, value_filter: F) -> Vec<PotentialRule<'_, V>>
    where
        F: Fn(&V) -> bool,
    {
        potential_rules(
            &self.tree,
            &self.setting.configurable_features,
            filter,
            value_filter,
        )
    }

    /// Inserts a newly persisted rule. If the exact context is already
    /// occupied this is a conflict carrying the occupant's id, so the
    /// operator can be redirected to edit that rule instead.
    pub fn insert(&mut self, rule: Rule<V>) -> Result<()> {
        validate_features(&rule, &self.setting.configurable_features)?;
        if let Some(existing) =
            self.tree.lookup_exact(&rule.context_features, self.setting.configurable_features.as_slice())
        {
            return Err(CoreError::Conflict {
                existing_id: existing.rule_id,
            });
        }
        debug!(rule_id = rule.rule_id, setting = %self.setting.name, "inserting rule");
        self.tree = self.tree.add(&rule, &self.setting.configurable_features);
        Ok(())
    }

    /// Replaces the value (and metadata) of an existing rule in place.
    pub fn update_value(
        &mut self,
        rule_id: i64,
        value: V,
        metadata: Option<std::collections::HashMap<String, serde_json::Value>>,
    ) -> Result<()> {
        if rule_id == crate::model::DEFAULT_RULE_ID {
            return Err(CoreError::ImmutableDefault { rule_id });
        }
        let updated = {
            let existing = self
                .get(rule_id)
                .ok_or(CoreError::UnknownRule { rule_id })?;
            let mut updated = existing.clone();
            updated.value = value;
            if let Some(metadata) = metadata {
                updated.metadata = metadata;
            }
            updated
        };
        debug!(rule_id, setting = %self.setting.name, "updating rule value");
        self.tree = self
            .tree
            .replace(&updated, &self.setting.configurable_features)?;
        Ok(())
    }

    /// Removes a deleted rule's leaf.
    pub fn delete(&mut self, rule_id: i64) -> Result<()> {
        if rule_id == crate::model::DEFAULT_RULE_ID {
            return Err(CoreError::ImmutableDefault { rule_id });
        }
        let target = self
            .get(rule_id)
            .ok_or(CoreError::UnknownRule { rule_id })?
            .clone();
        debug!(rule_id, setting = %self.setting.name, "deleting rule");
        self.tree = self.tree.remove(&target, &self.setting.configurable_features);
        Ok(())
    }
}

fn validate_features<V>(rule: &Rule<V>, features: &[String]) -> Result<()> {
    for feature in rule.context_features.keys() {
        if !features.contains(feature) {
            return Err(CoreError::UnknownFeature {
                feature: feature.clone(),
                rule_id: rule.rule_id,
            });
        }
    }
    Ok(())
}
