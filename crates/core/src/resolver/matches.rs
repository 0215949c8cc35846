// Match tags and the supersession partial order.
//
// A match records, per feature, how a rule's condition fared against
// the partial context: Exact and Wildcard can only arise where the
// filter pins the feature, Presume(..) and PresumeWildcard only where
// it is still open. Rule A supersedes rule B when, for every completion
// of the partial context that B matches, A also matches and wins. That
// relation is a strict partial order; `compare_matches` decides one
// pair of it.

use crate::model::{Rule, WILDCARD};
use std::cmp::Ordering;

/// How one rule condition met one feature of the partial context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextMatch {
    /// Pinned feature, condition value equals the pinned value.
    Exact,
    /// Pinned (or wildcard-only) feature, no condition on it.
    Wildcard,
    /// Open feature; the rule applies only if the feature eventually
    /// takes this value.
    Presume(String),
    /// Open feature, no condition on it; the rule applies under every
    /// completion but never as an exact match here.
    PresumeWildcard,
}

/// Outcome of comparing two matches under the supersession order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOrdering {
    LeftSupersedes,
    RightSupersedes,
    Incomparable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    fn supersedes(self) -> MatchOrdering {
        match self {
            Side::Left => MatchOrdering::LeftSupersedes,
            Side::Right => MatchOrdering::RightSupersedes,
        }
    }
}

/// Decides whether either side of a pair of equal-length matches (same
/// feature order, same filter) strictly supersedes the other.
///
/// Two accumulators scan the features left to right. `advantage` holds
/// the side that last won a pinned-feature comparison (Exact beats
/// Wildcard); it accumulates freely because pinned features are fixed
/// and consistent across both sides. `guard` holds a side that can no
/// longer be superseded at all: a PresumeWildcard opposite a
/// Presume(v) matches completions the presuming side cannot, so the
/// wildcard side becomes immune and any earlier advantage is void (the
/// presuming side's win is now conditional on its presumption). The
/// guard slot is single; an attempt to protect the other side as well
/// means each side owns completions the other misses, which is
/// immediately incomparable.
///
/// # Panics
///
/// A pinned-feature tag opposite an open-feature tag cannot arise from
/// one filter; such a pair is an enumeration bug and panics.
pub fn compare_matches(left: &[ContextMatch], right: &[ContextMatch]) -> MatchOrdering {
    debug_assert_eq!(left.len(), right.len());
    let mut guard: Option<Side> = None;
    let mut advantage: Option<Side> = None;

    for (a, b) in left.iter().zip(right.iter()) {
        match (a, b) {
            (ContextMatch::Exact, ContextMatch::Exact)
            | (ContextMatch::Wildcard, ContextMatch::Wildcard)
            | (ContextMatch::PresumeWildcard, ContextMatch::PresumeWildcard) => {}
            (ContextMatch::Exact, ContextMatch::Wildcard) => advantage = Some(Side::Left),
            (ContextMatch::Wildcard, ContextMatch::Exact) => advantage = Some(Side::Right),
            (ContextMatch::Presume(v1), ContextMatch::Presume(v2)) => {
                if v1 != v2 {
                    // one completion matches only the left, another
                    // only the right
                    return MatchOrdering::Incomparable;
                }
            }
            (ContextMatch::Presume(_), ContextMatch::PresumeWildcard) => {
                if guard == Some(Side::Left) {
                    return MatchOrdering::Incomparable;
                }
                guard = Some(Side::Right);
                advantage = None;
            }
            (ContextMatch::PresumeWildcard, ContextMatch::Presume(_)) => {
                if guard == Some(Side::Right) {
                    return MatchOrdering::Incomparable;
                }
                guard = Some(Side::Left);
                advantage = None;
            }
            (a, b) => unreachable!("mixed pinned/open match tags in one comparison: {a:?} vs {b:?}"),
        }
    }

    match advantage {
        Some(side) if guard != Some(side.other()) => side.supersedes(),
        _ => MatchOrdering::Incomparable,
    }
}

/// Display-order comparison of two rules, scanning the configured
/// features from last to first: a wildcard sorts below any concrete
/// value, concrete values compare lexicographically, and the first
/// feature (in this reverse scan) that differs decides. Purely
/// cosmetic; reachability never depends on it.
pub fn compare_rules<V>(a: &Rule<V>, b: &Rule<V>, features: &[String]) -> Ordering {
    for feature in features.iter().rev() {
        let a_val = a.constraint(feature).unwrap_or(WILDCARD);
        let b_val = b.constraint(feature).unwrap_or(WILDCARD);
        if a_val == b_val {
            continue;
        }
        return if a_val == WILDCARD {
            Ordering::Less
        } else if b_val == WILDCARD {
            Ordering::Greater
        } else {
            a_val.cmp(b_val)
        };
    }
    Ordering::Equal
}
