//! `ferry config` commands.

use super::{Output, json};
use crate::config::{self, FerryConfig, ResolvedConfig, ValueSource};
use crate::storage::Storage;
use crate::Result;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    /// `None` when the key is unset and has no default
    pub value: Option<String>,
    pub source: ValueSource,
}

#[derive(Debug, Serialize)]
pub struct ConfigShowResult {
    pub entries: Vec<ConfigEntry>,
}

impl Output for ConfigShowResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let width = self.entries.iter().map(|e| e.key.len()).max().unwrap_or(0);
        self.entries
            .iter()
            .map(|e| {
                let value = e.value.as_deref().unwrap_or("(built-in)");
                format!("{:width$}  {}  ({})", e.key, value, e.source, width = width)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn entry(key: &str, value: Option<String>, source: ValueSource) -> ConfigEntry {
    ConfigEntry {
        key: key.to_string(),
        value,
        source,
    }
}

/// Every configuration key with its resolved value and where it came from.
pub fn config_show(resolved: &ResolvedConfig) -> ConfigShowResult {
    let path_entry = |key: &str, r: &Option<config::Resolved<std::path::PathBuf>>| match r {
        Some(r) => entry(key, Some(r.value.display().to_string()), r.source.clone()),
        None => entry(key, None, ValueSource::Default),
    };

    ConfigShowResult {
        entries: vec![
            entry(
                "output-format",
                Some(resolved.output_format.value.to_string()),
                resolved.output_format.source.clone(),
            ),
            path_entry("prompt", &resolved.prompt),
            path_entry("library-data", &resolved.library_data),
            entry(
                "target-language",
                Some(resolved.target_language.value.clone()),
                resolved.target_language.source.clone(),
            ),
            entry(
                "include-unsafe",
                Some(resolved.include_unsafe.value.to_string()),
                resolved.include_unsafe.source.clone(),
            ),
        ],
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigSetResult {
    pub key: String,
    pub value: String,
    #[serde(skip)]
    pub config: FerryConfig,
}

impl Output for ConfigSetResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Set {} = {}", self.key, self.value)
    }
}

/// Validate and persist one key in the project config.
pub fn config_set(storage: &Storage, key: &str, value: &str) -> Result<ConfigSetResult> {
    let config = config::set_project_value(storage, key, value)?;
    Ok(ConfigSetResult {
        key: key.to_string(),
        value: value.to_string(),
        config,
    })
}
