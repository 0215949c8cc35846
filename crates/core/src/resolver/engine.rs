// Resolver engine - enumerates candidate matches against a partial
// context, prunes provably superseded ones, and ranks the survivors.
//
// The whole pass is a pure function of (tree, features, filter,
// predicate): identical inputs always produce the identical ordered
// output, in time bounded by rule count times feature count.

use crate::model::{Rule, WILDCARD};
use crate::resolver::context::{ContextFilter, FeatureFilter};
use crate::resolver::matches::{compare_matches, compare_rules, ContextMatch, MatchOrdering};
use crate::resolver::tree::{RuleNode, RuleTree};

/// A raw enumeration candidate: a leaf rule plus how its condition met
/// each feature of the filter, in feature order.
#[derive(Debug, Clone)]
struct RuleMatch<'a, V> {
    rule: &'a Rule<V>,
    context_matches: Vec<ContextMatch>,
}

/// A rule that some completion of the partial context can still make
/// the winning match, together with the minimal assumptions that
/// completion must satisfy.
#[derive(Debug, Clone)]
pub struct PotentialRule<'a, V> {
    pub rule: &'a Rule<V>,
    /// `(feature, value)` pairs in configured-feature order; `"*"`
    /// means the feature must end up matching no other rule's exact
    /// condition. Features the filter already pins contribute nothing.
    pub assumptions: Vec<(String, String)>,
}

impl<'a, V> PotentialRule<'a, V> {
    fn from_match(candidate: RuleMatch<'a, V>, features: &[String]) -> Self {
        let mut assumptions = Vec::new();
        for (feature, tag) in features.iter().zip(candidate.context_matches.iter()) {
            match tag {
                ContextMatch::Presume(value) => {
                    assumptions.push((feature.clone(), value.clone()));
                }
                ContextMatch::PresumeWildcard => {
                    assumptions.push((feature.clone(), WILDCARD.to_string()));
                }
                ContextMatch::Exact | ContextMatch::Wildcard => {}
            }
        }
        Self {
            rule: candidate.rule,
            assumptions,
        }
    }

    /// Human-readable `feature: value, feature: *` listing.
    pub fn assumptions_string(&self) -> String {
        self.assumptions
            .iter()
            .map(|(feature, value)| format!("{feature}: {value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Resolves the ordered potential rules for a partial context.
///
/// Rules failing `value_filter` are dropped during enumeration, before
/// reachability analysis, so a filtered-out rule cannot shadow another.
/// Survivors are sorted descending by specificity under the cosmetic
/// tie-break order.
pub fn potential_rules<'a, V, F>(
    tree: &'a RuleTree<V>,
    features: &[String],
    filter: &ContextFilter,
    value_filter: F,
) -> Vec<PotentialRule<'a, V>>
where
    F: Fn(&V) -> bool,
{
    let mut candidates = Vec::new();
    enumerate(tree, features, filter, &[], &value_filter, &mut candidates);
    let survivors = prune_superseded(candidates);

    let mut ranked: Vec<PotentialRule<'a, V>> = survivors
        .into_iter()
        .map(|candidate| PotentialRule::from_match(candidate, features))
        .collect();
    ranked.sort_by(|a, b| compare_rules(b.rule, a.rule, features));
    ranked
}

/// Depth-first walk, one step per feature. A pinned feature explores
/// the pinned child and the wildcard child independently; a
/// wildcard-only feature explores just the wildcard child; an open
/// feature explores every child under a presume tag.
fn enumerate<'a, V, F>(
    tree: &'a RuleTree<V>,
    features: &[String],
    filter: &ContextFilter,
    prefix: &[ContextMatch],
    value_filter: &F,
    out: &mut Vec<RuleMatch<'a, V>>,
) where
    F: Fn(&V) -> bool,
{
    let Some(feature) = features.get(prefix.len()) else {
        return;
    };
    match filter.get(feature) {
        Some(FeatureFilter::Value(value)) => {
            if let Some(node) = tree.child(value) {
                step(node, ContextMatch::Exact, features, filter, prefix, value_filter, out);
            }
            if let Some(node) = tree.child(WILDCARD) {
                step(node, ContextMatch::Wildcard, features, filter, prefix, value_filter, out);
            }
        }
        Some(FeatureFilter::WildcardOnly) => {
            // no real condition value can match the sentinel
            if let Some(node) = tree.child(WILDCARD) {
                step(node, ContextMatch::Wildcard, features, filter, prefix, value_filter, out);
            }
        }
        None => {
            for (key, node) in tree.children() {
                let tag = if key == WILDCARD {
                    ContextMatch::PresumeWildcard
                } else {
                    ContextMatch::Presume(key.to_string())
                };
                step(node, tag, features, filter, prefix, value_filter, out);
            }
        }
    }
}

fn step<'a, V, F>(
    node: &'a RuleNode<V>,
    tag: ContextMatch,
    features: &[String],
    filter: &ContextFilter,
    prefix: &[ContextMatch],
    value_filter: &F,
    out: &mut Vec<RuleMatch<'a, V>>,
) where
    F: Fn(&V) -> bool,
{
    let mut context_matches = Vec::with_capacity(prefix.len() + 1);
    context_matches.extend_from_slice(prefix);
    context_matches.push(tag);

    let at_leaf_depth = context_matches.len() == features.len();
    match node {
        RuleNode::Leaf(rule) if at_leaf_depth => {
            if value_filter(&rule.value) {
                out.push(RuleMatch {
                    rule,
                    context_matches,
                });
            }
        }
        RuleNode::Branch(branch) if !at_leaf_depth => {
            enumerate(branch, features, filter, &context_matches, value_filter, out);
        }
        // depth mismatch: the tree was built against a different
        // feature list; nothing here can be a complete match
        _ => {}
    }
}

/// Drops every candidate that some other candidate strictly supersedes.
/// A dropped candidate takes no further part in comparisons: whatever
/// it would have eliminated, its superseder eliminates too.
fn prune_superseded<V>(candidates: Vec<RuleMatch<'_, V>>) -> Vec<RuleMatch<'_, V>> {
    let mut superseded = vec![false; candidates.len()];
    for i in 0..candidates.len() {
        if superseded[i] {
            continue;
        }
        for j in (i + 1)..candidates.len() {
            if superseded[j] {
                continue;
            }
            match compare_matches(
                &candidates[i].context_matches,
                &candidates[j].context_matches,
            ) {
                MatchOrdering::LeftSupersedes => superseded[j] = true,
                MatchOrdering::RightSupersedes => {
                    superseded[i] = true;
                    break;
                }
                MatchOrdering::Incomparable => {}
            }
        }
    }
    candidates
        .into_iter()
        .zip(superseded)
        .filter_map(|(candidate, dropped)| (!dropped).then_some(candidate))
        .collect()
}
