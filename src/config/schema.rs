//! KDL schema for config.kdl.
//!
//! ```kdl
//! output-format "human"          // or "json"
//! prompt "docs/migration.md"      // replaces the built-in migration prompt
//! library-data "libraries.json"  // replaces the built-in library data
//! target-language "rust"
//! include-unsafe #false
//! ```
//!
//! Unknown nodes are ignored so older binaries can read newer files.

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration keys understood by ferry.
pub const KEYS: &[&str] = &[
    "output-format",
    "prompt",
    "library-data",
    "target-language",
    "include-unsafe",
];

/// Preferences stored in config.kdl. Every field is optional; unset fields
/// fall through to the next layer during resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FerryConfig {
    pub output_format: Option<OutputFormat>,

    /// Path of a custom migration prompt document
    pub prompt: Option<String>,

    /// Path of a custom library data file
    pub library_data: Option<String>,

    /// Language equivalents are looked up in
    pub target_language: Option<String>,

    /// Whether libraries flagged as unsafe are offered
    pub include_unsafe: Option<bool>,
}

impl FerryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref lang) = self.target_language
            && (lang.is_empty() || !lang.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            return Err(format!(
                "target-language must be a non-empty alphanumeric name, got '{}'",
                lang
            ));
        }
        for (key, value) in [("prompt", &self.prompt), ("library-data", &self.library_data)] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(format!("{} must not be empty", key));
            }
        }
        Ok(())
    }

    /// Set a single key from its string form, as given on the command line.
    ///
    /// Leaves the config untouched when the value is rejected.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        let mut next = self.clone();
        match key {
            "output-format" => {
                let format = OutputFormat::parse(value).ok_or_else(|| {
                    format!("output-format must be 'human' or 'json', got '{}'", value)
                })?;
                next.output_format = Some(format);
            }
            "prompt" => next.prompt = Some(value.to_string()),
            "library-data" => next.library_data = Some(value.to_string()),
            "target-language" => next.target_language = Some(value.to_lowercase()),
            "include-unsafe" => {
                let flag = match value.to_lowercase().as_str() {
                    "true" | "yes" | "1" => true,
                    "false" | "no" | "0" => false,
                    _ => return Err(format!("include-unsafe must be true or false, got '{}'", value)),
                };
                next.include_unsafe = Some(flag);
            }
            _ => {
                return Err(format!(
                    "unknown key '{}' (expected one of: {})",
                    key,
                    KEYS.join(", ")
                ));
            }
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Parse config from a KDL document. Values of the wrong type are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let first = |name: &str| {
            doc.get(name)
                .and_then(|node| node.entries().first())
                .map(|entry| entry.value())
        };
        let string = |name: &str| first(name).and_then(|v| v.as_string()).map(str::to_string);

        let mut config = Self::new();
        config.output_format = string("output-format").and_then(|s| OutputFormat::parse(&s));
        config.prompt = string("prompt");
        config.library_data = string("library-data");
        config.target_language = string("target-language").map(|s| s.to_lowercase());
        config.include_unsafe = first("include-unsafe").and_then(|v| v.as_bool());
        config
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();
        let mut push = |name: &str, value: KdlValue| {
            let mut node = KdlNode::new(name);
            node.push(KdlEntry::new(value));
            doc.nodes_mut().push(node);
        };

        if let Some(format) = self.output_format {
            push("output-format", KdlValue::String(format.as_str().to_string()));
        }
        if let Some(ref prompt) = self.prompt {
            push("prompt", KdlValue::String(prompt.clone()));
        }
        if let Some(ref data) = self.library_data {
            push("library-data", KdlValue::String(data.clone()));
        }
        if let Some(ref lang) = self.target_language {
            push("target-language", KdlValue::String(lang.clone()));
        }
        if let Some(flag) = self.include_unsafe {
            push("include-unsafe", KdlValue::Bool(flag));
        }

        doc.autoformat();
        doc
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &FerryConfig) {
        if other.output_format.is_some() {
            self.output_format = other.output_format;
        }
        if other.prompt.is_some() {
            self.prompt = other.prompt.clone();
        }
        if other.library_data.is_some() {
            self.library_data = other.library_data.clone();
        }
        if other.target_language.is_some() {
            self.target_language = other.target_language.clone();
        }
        if other.include_unsafe.is_some() {
            self.include_unsafe = other.include_unsafe;
        }
    }
}
