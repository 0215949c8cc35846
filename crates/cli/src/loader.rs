use anyhow::{Context, Result};
use rulecast_core::{Rule, Setting};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// On-disk form of a rules document: every setting with its feature
/// order, default value, and flat rule list.
#[derive(Debug, Deserialize)]
pub struct RuleDocument {
    pub settings: Vec<SettingEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SettingEntry {
    pub name: String,
    pub configurable_features: Vec<String>,
    pub default_value: Value,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    #[serde(default)]
    pub rules: Vec<Rule<Value>>,
}

impl SettingEntry {
    pub fn setting(&self) -> Setting<Value> {
        let mut setting = Setting::new(
            self.name.clone(),
            self.configurable_features.clone(),
            self.default_value.clone(),
        );
        setting.metadata = self.metadata.clone();
        setting
    }
}

/// Parse a rules document from a JSON or YAML file, chosen by
/// extension (`.json` is JSON, anything else is read as YAML).
pub fn load_document(path: &Path) -> Result<RuleDocument> {
    if !path.exists() {
        anyhow::bail!("Rules document not found: {}", path.display());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rules document: {}", path.display()))?;

    let document = if path.extension().is_some_and(|ext| ext == "json") {
        let mut deserializer = serde_json::Deserializer::from_str(&content);
        serde_path_to_error::deserialize(&mut deserializer).with_context(|| {
            format!(
                "Failed to parse JSON from: {}\n\
                 This usually means a syntax error or a missing required field.",
                path.display()
            )
        })?
    } else {
        let deserializer = serde_yaml::Deserializer::from_str(&content);
        serde_path_to_error::deserialize(deserializer).with_context(|| {
            format!(
                "Failed to parse YAML from: {}\n\
                 This usually means a syntax error or a missing required field.",
                path.display()
            )
        })?
    };

    Ok(document)
}

/// Find one setting by name.
pub fn find_setting<'a>(document: &'a RuleDocument, name: &str) -> Result<&'a SettingEntry> {
    document
        .settings
        .iter()
        .find(|entry| entry.name == name)
        .ok_or_else(|| {
            let known: Vec<&str> = document
                .settings
                .iter()
                .map(|entry| entry.name.as_str())
                .collect();
            anyhow::anyhow!(
                "No setting named '{}' in the document (known settings: {})",
                name,
                known.join(", ")
            )
        })
}
