// Rule tree - a trie over context-feature values, one level per
// configured feature, "*" keys for unconstrained features.
//
// The tree is copy-on-write: mutations return a new tree that shares
// every unaffected subtree with the original through `Arc`, so a
// resolver call holding an older reference stays valid while an edit
// lands.

use crate::error::{CoreError, Result};
use crate::model::{Rule, WILDCARD};
use std::collections::HashMap;
use std::sync::Arc;

/// A node one level below a branch: either the single rule occupying a
/// full key-path, or the next level of the trie. Leaves only ever sit
/// at the final feature's depth.
#[derive(Debug, PartialEq)]
pub enum RuleNode<V> {
    Leaf(Rule<V>),
    Branch(RuleTree<V>),
}

/// One level of the trie. The root `RuleTree` of a setting has exactly
/// `configurable_features.len()` levels below it.
#[derive(Debug, Default, PartialEq)]
pub struct RuleTree<V> {
    children: HashMap<String, Arc<RuleNode<V>>>,
}

// Hand-written so cloning never requires `V: Clone`: children are
// shared, not duplicated. This is the shallow copy of the lifecycle
// contract.
impl<V> Clone for RuleTree<V> {
    fn clone(&self) -> Self {
        Self {
            children: self.children.clone(),
        }
    }
}

impl<V> RuleTree<V> {
    pub fn new() -> Self {
        Self {
            children: HashMap::new(),
        }
    }

    /// Copies only the top level; child subtrees remain shared. Callers
    /// must never mutate a shared child in place, only replace
    /// references (which the mutation methods below do).
    pub fn shallow_copy(&self) -> Self {
        self.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub(crate) fn child(&self, key: &str) -> Option<&RuleNode<V>> {
        self.children.get(key).map(Arc::as_ref)
    }

    pub(crate) fn children(&self) -> impl Iterator<Item = (&str, &RuleNode<V>)> {
        self.children
            .iter()
            .map(|(key, node)| (key.as_str(), node.as_ref()))
    }

    /// Follows, for each feature in order, the child keyed by the
    /// context's value (wildcard if absent). `None` if any step is
    /// missing. This is how the creation workflow detects that a rule
    /// already exists for an exact context.
    pub fn lookup_exact(
        &self,
        context: &HashMap<String, String>,
        features: &[String],
    ) -> Option<&Rule<V>> {
        let (feature, rest) = features.split_first()?;
        let key = context.get(feature).map(String::as_str).unwrap_or(WILDCARD);
        match self.child(key)? {
            RuleNode::Leaf(rule) if rest.is_empty() => Some(rule),
            RuleNode::Branch(branch) if !rest.is_empty() => branch.lookup_exact(context, rest),
            _ => None,
        }
    }

    /// Unordered depth-first collection of every rule in the tree.
    pub fn flatten(&self) -> Vec<&Rule<V>> {
        let mut rules = Vec::new();
        self.collect(&mut rules);
        rules
    }

    fn collect<'a>(&'a self, rules: &mut Vec<&'a Rule<V>>) {
        for node in self.children.values() {
            match node.as_ref() {
                RuleNode::Leaf(rule) => rules.push(rule),
                RuleNode::Branch(branch) => branch.collect(rules),
            }
        }
    }
}

impl<V: Clone> RuleTree<V> {
    /// Collates a flat rule list into a tree, grouping recursively by
    /// each feature's constrained value (or wildcard) in `features`
    /// order. Every rule's constrained features must be a subset of
    /// `features`; see `RuleSet::new` for the validated entry point.
    pub fn build(rules: &[Rule<V>], features: &[String]) -> Self {
        let Some((feature, rest)) = features.split_first() else {
            return Self::new();
        };
        let mut tree = Self::new();
        if rest.is_empty() {
            for rule in rules {
                let key = rule.constraint(feature).unwrap_or(WILDCARD).to_string();
                tree.children.insert(key, Arc::new(RuleNode::Leaf(rule.clone())));
            }
            return tree;
        }
        let mut groups: HashMap<&str, Vec<&Rule<V>>> = HashMap::new();
        for rule in rules {
            groups
                .entry(rule.constraint(feature).unwrap_or(WILDCARD))
                .or_default()
                .push(rule);
        }
        for (key, group) in groups {
            let group: Vec<Rule<V>> = group.into_iter().cloned().collect();
            tree.children.insert(
                key.to_string(),
                Arc::new(RuleNode::Branch(Self::build(&group, rest))),
            );
        }
        tree
    }

    /// Inserts `rule` at the path derived from its own constraints,
    /// creating intermediate levels as needed. An occupant at the same
    /// path is replaced. Returns a new tree sharing unaffected
    /// subtrees.
    pub fn add(&self, rule: &Rule<V>, features: &[String]) -> Self {
        let mut copy = self.shallow_copy();
        copy.add_in_place(rule, features);
        copy
    }

    fn add_in_place(&mut self, rule: &Rule<V>, features: &[String]) {
        let Some((feature, rest)) = features.split_first() else {
            return;
        };
        let key = rule.constraint(feature).unwrap_or(WILDCARD).to_string();
        if rest.is_empty() {
            self.children
                .insert(key, Arc::new(RuleNode::Leaf(rule.clone())));
            return;
        }
        let mut child = match self.child(&key) {
            Some(RuleNode::Branch(branch)) => branch.shallow_copy(),
            _ => Self::new(),
        };
        child.add_in_place(rule, rest);
        self.children.insert(key, Arc::new(RuleNode::Branch(child)));
    }

    /// Overwrites the leaf at `rule`'s path, assuming the path already
    /// exists. A missing path is a structured error, not a fault.
    pub fn replace(&self, rule: &Rule<V>, features: &[String]) -> Result<Self> {
        let mut copy = self.shallow_copy();
        copy.replace_in_place(rule, features)?;
        Ok(copy)
    }

    fn replace_in_place(&mut self, rule: &Rule<V>, features: &[String]) -> Result<()> {
        let missing = || CoreError::MissingRulePath {
            rule_id: rule.rule_id,
        };
        let (feature, rest) = features.split_first().ok_or_else(missing)?;
        let key = rule.constraint(feature).unwrap_or(WILDCARD).to_string();
        if rest.is_empty() {
            match self.child(&key) {
                Some(RuleNode::Leaf(_)) => {
                    self.children
                        .insert(key, Arc::new(RuleNode::Leaf(rule.clone())));
                    Ok(())
                }
                _ => Err(missing()),
            }
        } else {
            let mut child = match self.child(&key) {
                Some(RuleNode::Branch(branch)) => branch.shallow_copy(),
                _ => return Err(missing()),
            };
            child.replace_in_place(rule, rest)?;
            self.children.insert(key, Arc::new(RuleNode::Branch(child)));
            Ok(())
        }
    }

    /// Deletes the leaf at `rule`'s own path; no-op if absent.
    pub fn remove(&self, rule: &Rule<V>, features: &[String]) -> Self {
        let mut copy = self.shallow_copy();
        copy.remove_in_place(rule, features);
        copy
    }

    fn remove_in_place(&mut self, rule: &Rule<V>, features: &[String]) {
        let Some((feature, rest)) = features.split_first() else {
            return;
        };
        let key = rule.constraint(feature).unwrap_or(WILDCARD);
        if rest.is_empty() {
            if matches!(self.child(key), Some(RuleNode::Leaf(_))) {
                self.children.remove(key);
            }
            return;
        }
        let mut child = match self.child(key) {
            Some(RuleNode::Branch(branch)) => branch.shallow_copy(),
            _ => return,
        };
        child.remove_in_place(rule, rest);
        self.children
            .insert(key.to_string(), Arc::new(RuleNode::Branch(child)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> Vec<String> {
        vec!["env".to_string(), "service".to_string()]
    }

    fn rule(id: i64, constraints: &[(&str, &str)]) -> Rule<&'static str> {
        let context_features = constraints
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Rule::new(id, "value", context_features)
    }

    fn context(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn build_places_every_rule_at_its_own_path() {
        let rules = vec![
            rule(1, &[("env", "prod"), ("service", "api")]),
            rule(2, &[("env", "prod")]),
            rule(3, &[]),
        ];
        let tree = RuleTree::build(&rules, &features());

        assert_eq!(
            tree.lookup_exact(&context(&[("env", "prod"), ("service", "api")]), &features())
                .map(|r| r.rule_id),
            Some(1)
        );
        assert_eq!(
            tree.lookup_exact(&context(&[("env", "prod")]), &features())
                .map(|r| r.rule_id),
            Some(2)
        );
        assert_eq!(
            tree.lookup_exact(&context(&[]), &features()).map(|r| r.rule_id),
            Some(3)
        );
    }

    #[test]
    fn lookup_returns_none_for_unoccupied_path() {
        let tree = RuleTree::build(&[rule(1, &[("env", "prod")])], &features());
        assert!(tree
            .lookup_exact(&context(&[("env", "staging")]), &features())
            .is_none());
    }

    #[test]
    fn add_then_lookup_round_trips() {
        let tree: RuleTree<&str> = RuleTree::new();
        let new_rule = rule(9, &[("env", "dev"), ("service", "web")]);
        let tree = tree.add(&new_rule, &features());
        assert_eq!(
            tree.lookup_exact(&new_rule.context_features, &features())
                .map(|r| r.rule_id),
            Some(9)
        );
    }

    #[test]
    fn remove_then_lookup_returns_none() {
        let target = rule(4, &[("env", "dev")]);
        let tree = RuleTree::build(&[target.clone(), rule(5, &[])], &features());
        let tree = tree.remove(&target, &features());
        assert!(tree
            .lookup_exact(&target.context_features, &features())
            .is_none());
        // sibling is untouched
        assert_eq!(tree.flatten().len(), 1);
    }

    #[test]
    fn remove_of_absent_rule_is_a_no_op() {
        let tree = RuleTree::build(&[rule(5, &[])], &features());
        let tree = tree.remove(&rule(6, &[("env", "qa")]), &features());
        assert_eq!(tree.flatten().len(), 1);
    }

    #[test]
    fn replace_overwrites_the_occupant() {
        let original = rule(7, &[("env", "prod")]);
        let tree = RuleTree::build(&[original.clone()], &features());
        let mut updated = original.clone();
        updated.value = "changed";
        let tree = tree.replace(&updated, &features()).unwrap();
        assert_eq!(
            tree.lookup_exact(&original.context_features, &features())
                .map(|r| r.value),
            Some("changed")
        );
    }

    #[test]
    fn replace_on_missing_path_is_a_structured_error() {
        let tree: RuleTree<&str> = RuleTree::build(&[], &features());
        let err = tree
            .replace(&rule(8, &[("env", "prod")]), &features())
            .unwrap_err();
        assert_eq!(err, CoreError::MissingRulePath { rule_id: 8 });
    }

    #[test]
    fn add_at_occupied_path_replaces_the_occupant() {
        let first = rule(1, &[("env", "prod")]);
        let mut second = rule(2, &[("env", "prod")]);
        second.value = "other";
        let tree = RuleTree::build(&[first], &features());
        let tree = tree.add(&second, &features());
        let found = tree
            .lookup_exact(&second.context_features, &features())
            .unwrap();
        assert_eq!(found.rule_id, 2);
        assert_eq!(tree.flatten().len(), 1);
    }

    #[test]
    fn mutation_shares_unaffected_subtrees() {
        let rules = vec![
            rule(1, &[("env", "prod"), ("service", "api")]),
            rule(2, &[("env", "dev"), ("service", "api")]),
        ];
        let before = RuleTree::build(&rules, &features());
        let after = before.add(&rule(3, &[("env", "prod"), ("service", "web")]), &features());

        // the untouched "dev" subtree is the same allocation
        let before_dev = match before.child("dev") {
            Some(node) => node as *const RuleNode<&str>,
            None => panic!("missing dev subtree"),
        };
        let after_dev = match after.child("dev") {
            Some(node) => node as *const RuleNode<&str>,
            None => panic!("missing dev subtree"),
        };
        assert_eq!(before_dev, after_dev);

        // the old reference still resolves the old contents
        assert_eq!(before.flatten().len(), 2);
        assert_eq!(after.flatten().len(), 3);
    }

    #[test]
    fn flatten_collects_all_leaves() {
        let rules = vec![
            rule(1, &[("env", "prod"), ("service", "api")]),
            rule(2, &[("env", "prod")]),
            rule(3, &[]),
        ];
        let tree = RuleTree::build(&rules, &features());
        let mut ids: Vec<i64> = tree.flatten().iter().map(|r| r.rule_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
