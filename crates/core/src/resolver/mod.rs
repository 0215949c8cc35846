//! Potential-rule resolution engine.
//!
//! Given a trie of override rules and a possibly-partial context, this
//! module enumerates every rule that could still win, prunes the ones
//! provably superseded under every completion of the context, and
//! returns the survivors ranked by specificity, each annotated with the
//! assumptions it needs to hold.
//!
//! # Example
//!
//! ```ignore
//! use rulecast_core::resolver::engine::potential_rules;
//!
//! let ranked = potential_rules(&tree, &features, &filter, |_| true);
//! assert!(!ranked.is_empty());
//! ```
pub mod context;
pub mod engine;
pub mod matches;
pub mod tree;
