use anyhow::Result;
use clap::Parser;
use rulecast_core::{CoreError, RuleSet, DEFAULT_RULE_ID};
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::loader::{load_document, SettingEntry};

/// Validate a rules document
#[derive(Debug, Parser)]
pub struct CheckCommand {
    /// Path to the rules document (JSON or YAML)
    #[arg(long, value_name = "FILE")]
    pub file: PathBuf,
}

impl CheckCommand {
    pub fn execute(&self) -> Result<i32> {
        let document = load_document(&self.file)?;

        let mut problems = Vec::new();
        for entry in &document.settings {
            check_setting(entry, &mut problems);
        }

        if problems.is_empty() {
            println!(
                "OK: {} setting(s), {} rule(s)",
                document.settings.len(),
                document
                    .settings
                    .iter()
                    .map(|entry| entry.rules.len())
                    .sum::<usize>()
            );
            return Ok(0);
        }

        for problem in &problems {
            eprintln!("error: {problem}");
        }
        eprintln!("{} problem(s) found", problems.len());
        Ok(1)
    }
}

fn check_setting(entry: &SettingEntry, problems: &mut Vec<String>) {
    let setting = &entry.name;

    if entry.configurable_features.is_empty() {
        problems.push(format!("setting '{setting}': no configurable features"));
        return;
    }
    let mut seen_features = HashSet::new();
    for feature in &entry.configurable_features {
        if !seen_features.insert(feature.as_str()) {
            problems.push(format!(
                "setting '{setting}': duplicate configurable feature '{feature}'"
            ));
        }
    }

    let mut seen_ids = HashSet::new();
    for rule in &entry.rules {
        if rule.rule_id == DEFAULT_RULE_ID {
            problems.push(format!(
                "setting '{setting}': rule id {DEFAULT_RULE_ID} is reserved for the synthetic default"
            ));
        }
        if !seen_ids.insert(rule.rule_id) {
            problems.push(format!(
                "setting '{setting}': duplicate rule id {}",
                rule.rule_id
            ));
        }
    }

    // replaying the rules through the editing workflow surfaces
    // unknown features and context collisions with the occupant's id
    let mut rule_set: RuleSet<Value> = match RuleSet::new(entry.setting(), Vec::new()) {
        Ok(rule_set) => rule_set,
        Err(error) => {
            problems.push(format!("setting '{setting}': {error}"));
            return;
        }
    };
    for rule in &entry.rules {
        match rule_set.insert(rule.clone()) {
            Ok(()) => {}
            Err(CoreError::Conflict { existing_id }) if existing_id == DEFAULT_RULE_ID => {
                problems.push(format!(
                    "setting '{setting}': rule {} has no conditions and collides with the default",
                    rule.rule_id
                ));
            }
            Err(CoreError::Conflict { existing_id }) => {
                problems.push(format!(
                    "setting '{setting}': rule {} covers the same context as rule #{existing_id}",
                    rule.rule_id
                ));
            }
            Err(error) => {
                problems.push(format!("setting '{setting}': {error}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulecast_core::Rule;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn entry(features: &[&str], rules: Vec<Rule<Value>>) -> SettingEntry {
        SettingEntry {
            name: "cache_ttl".to_string(),
            configurable_features: features.iter().map(|f| f.to_string()).collect(),
            default_value: Value::from(60),
            metadata: HashMap::new(),
            rules,
        }
    }

    fn rule(id: i64, constraints: &[(&str, &str)]) -> Rule<Value> {
        let context_features: HashMap<String, String> = constraints
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Rule::new(id, Value::from(30), context_features)
    }

    #[test]
    fn clean_setting_reports_no_problems() {
        let entry = entry(
            &["env", "service"],
            vec![rule(1, &[("env", "prod")]), rule(2, &[("env", "dev")])],
        );
        let mut problems = Vec::new();
        check_setting(&entry, &mut problems);
        assert!(problems.is_empty(), "{problems:?}");
    }

    #[test]
    fn empty_feature_list_is_reported() {
        let entry = entry(&[], vec![]);
        let mut problems = Vec::new();
        check_setting(&entry, &mut problems);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("no configurable features"));
    }

    #[test]
    fn duplicate_features_and_ids_are_reported() {
        let entry = entry(
            &["env", "env"],
            vec![rule(1, &[("env", "prod")]), rule(1, &[("env", "dev")])],
        );
        let mut problems = Vec::new();
        check_setting(&entry, &mut problems);
        assert!(problems.iter().any(|p| p.contains("duplicate configurable feature 'env'")));
        assert!(problems.iter().any(|p| p.contains("duplicate rule id 1")));
    }

    #[test]
    fn reserved_id_is_reported() {
        let entry = entry(&["env"], vec![rule(-1, &[("env", "prod")])]);
        let mut problems = Vec::new();
        check_setting(&entry, &mut problems);
        assert!(problems.iter().any(|p| p.contains("reserved")));
    }

    #[test]
    fn colliding_contexts_name_the_occupant() {
        let entry = entry(
            &["env"],
            vec![rule(1, &[("env", "prod")]), rule(2, &[("env", "prod")])],
        );
        let mut problems = Vec::new();
        check_setting(&entry, &mut problems);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("rule 2 covers the same context as rule #1"));
    }

    #[test]
    fn unconstrained_rule_collides_with_the_default() {
        let entry = entry(&["env"], vec![rule(1, &[])]);
        let mut problems = Vec::new();
        check_setting(&entry, &mut problems);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("collides with the default"));
    }

    #[test]
    fn unknown_constraint_feature_is_reported() {
        let entry = entry(&["env"], vec![rule(1, &[("region", "eu")])]);
        let mut problems = Vec::new();
        check_setting(&entry, &mut problems);
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("region"));
    }

    #[test]
    fn exit_code_reflects_document_health() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.yaml");
        fs::write(
            &good,
            "settings:\n  - name: flag\n    configurable_features: [env]\n    default_value: false\n",
        )
        .unwrap();
        let bad = dir.path().join("bad.yaml");
        fs::write(
            &bad,
            "settings:\n  - name: flag\n    configurable_features: [env]\n    default_value: false\n    rules:\n      - rule_id: 1\n        value: true\n        context_features: {env: prod}\n      - rule_id: 2\n        value: true\n        context_features: {env: prod}\n",
        )
        .unwrap();

        assert_eq!(CheckCommand { file: good }.execute().unwrap(), 0);
        assert_eq!(CheckCommand { file: bad }.execute().unwrap(), 1);
    }
}
