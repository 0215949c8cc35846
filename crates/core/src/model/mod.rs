pub mod rule;
pub mod setting;

pub use rule::{Rule, DEFAULT_RULE_ID, WILDCARD};
pub use setting::Setting;
