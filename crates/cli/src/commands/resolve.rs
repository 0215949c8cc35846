use anyhow::{bail, Result};
use clap::Parser;
use rulecast_core::predicate::render_value;
use rulecast_core::{ContextFilter, PotentialRule, RuleSet, ValuePredicate};
use serde_json::Value;
use std::path::PathBuf;

use crate::loader::{find_setting, load_document};

/// Resolve the potential rules for a partial context
#[derive(Debug, Parser)]
pub struct ResolveCommand {
    /// Path to the rules document (JSON or YAML)
    #[arg(long, value_name = "FILE")]
    pub file: PathBuf,

    /// Name of the setting to resolve
    #[arg(long, value_name = "NAME")]
    pub setting: String,

    /// Pin a context feature, as `feature=value`. An empty value
    /// (`feature=`) rules out exact matches for that feature; an
    /// omitted feature stays unknown.
    #[arg(long = "context", value_name = "FEATURE=VALUE")]
    pub context: Vec<String>,

    /// Keep only rules whose value satisfies this expression,
    /// e.g. "value == 'enabled'"
    #[arg(long = "where", value_name = "EXPR")]
    pub where_expr: Option<String>,

    /// Output format (human, json)
    #[arg(long, value_name = "FORMAT", default_value = "human")]
    pub output: String,
}

impl ResolveCommand {
    pub fn execute(&self) -> Result<i32> {
        let document = load_document(&self.file)?;
        let entry = find_setting(&document, &self.setting)?;

        let filter = self.context_filter(&entry.configurable_features)?;
        let predicate = match &self.where_expr {
            Some(expr) => Some(ValuePredicate::compile(expr).map_err(anyhow::Error::msg)?),
            None => None,
        };

        let rule_set = RuleSet::new(entry.setting(), entry.rules.clone())?;
        let ranked = rule_set.resolve(&filter, |value| {
            predicate.as_ref().map_or(true, |p| p.eval(value))
        });

        match self.output.as_str() {
            "human" => print_human(&self.setting, rule_set.features(), &ranked),
            "json" => print_json(&ranked)?,
            other => bail!("Unknown output format '{}' (expected human or json)", other),
        }

        Ok(if ranked.is_empty() { 1 } else { 0 })
    }

    fn context_filter(&self, features: &[String]) -> Result<ContextFilter> {
        let mut entries = Vec::new();
        for pair in &self.context {
            let Some((feature, value)) = pair.split_once('=') else {
                bail!("Invalid --context '{}', expected feature=value", pair);
            };
            if !features.iter().any(|f| f == feature) {
                bail!(
                    "Unknown context feature '{}' (configurable: {})",
                    feature,
                    features.join(", ")
                );
            }
            entries.push((feature.to_string(), value.to_string()));
        }
        Ok(ContextFilter::from_entries(entries))
    }
}

fn print_human(setting: &str, features: &[String], ranked: &[PotentialRule<'_, Value>]) {
    println!("{} (features: {})", setting, features.join(", "));
    if ranked.is_empty() {
        println!("  no rule can match this context");
        return;
    }
    for potential in ranked {
        let rule = potential.rule;
        let label = if rule.is_default() {
            "default".to_string()
        } else {
            format!("#{}", rule.rule_id)
        };
        let mut conditions: Vec<String> = features
            .iter()
            .filter_map(|feature| {
                rule.constraint(feature)
                    .map(|value| format!("{feature}: {value}"))
            })
            .collect();
        if conditions.is_empty() {
            conditions.push("*".to_string());
        }
        let mut line = format!(
            "  {:<8} [{}]  value: {}",
            label,
            conditions.join(", "),
            render_value(&rule.value)
        );
        if !potential.assumptions.is_empty() {
            line.push_str(&format!("  assumes {}", potential.assumptions_string()));
        }
        println!("{line}");
    }
}

fn print_json(ranked: &[PotentialRule<'_, Value>]) -> Result<()> {
    let rows: Vec<Value> = ranked
        .iter()
        .map(|potential| {
            let assumptions: Vec<Value> = potential
                .assumptions
                .iter()
                .map(|(feature, value)| serde_json::json!({ "feature": feature, "value": value }))
                .collect();
            serde_json::json!({
                "rule_id": potential.rule.rule_id,
                "value": potential.rule.value,
                "context_features": potential.rule.context_features,
                "metadata": potential.rule.metadata,
                "assumptions": assumptions,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}
