use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A rule already occupies the exact context the caller is trying
    /// to insert at. The caller is expected to redirect the operator to
    /// edit rule `existing_id` instead.
    #[error("context already covered by rule #{existing_id}")]
    Conflict { existing_id: i64 },

    #[error("no rule with id {rule_id}")]
    UnknownRule { rule_id: i64 },

    #[error("rule {rule_id} has no path in the tree")]
    MissingRulePath { rule_id: i64 },

    #[error("rule {rule_id} constrains '{feature}', which is not configurable for this setting")]
    UnknownFeature { feature: String, rule_id: i64 },

    #[error("rule {rule_id} is the synthetic default and cannot be edited or deleted")]
    ImmutableDefault { rule_id: i64 },
}
