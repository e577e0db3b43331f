//! Precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Project config.kdl (`<root>/.ferry/config.kdl`)
//! 3. System config.kdl (`~/.config/ferry/config.kdl`)
//! 4. Built-in defaults

use super::{ConfigPaths, FerryConfig, OutputFormat, read_config};
use crate::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Language looked up when nothing else is configured.
pub const DEFAULT_TARGET_LANGUAGE: &str = "rust";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from CLI flag
    CliFlag,
    /// Value from the project's config.kdl
    Project,
    /// Value from the system config.kdl
    System,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Project => write!(f, "project"),
            ValueSource::System => write!(f, "system"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

impl Serialize for ValueSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    pub output_format: Resolved<OutputFormat>,
    /// Custom migration prompt; the built-in one is used when unset
    pub prompt: Option<Resolved<PathBuf>>,
    /// Custom library data; the built-in data is used when unset
    pub library_data: Option<Resolved<PathBuf>>,
    pub target_language: Resolved<String>,
    pub include_unsafe: Resolved<bool>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            output_format: Resolved::new(OutputFormat::default(), ValueSource::Default),
            prompt: None,
            library_data: None,
            target_language: Resolved::new(
                DEFAULT_TARGET_LANGUAGE.to_string(),
                ValueSource::Default,
            ),
            include_unsafe: Resolved::new(false, ValueSource::Default),
        }
    }
}

impl ResolvedConfig {
    pub fn output_format(&self) -> OutputFormat {
        self.output_format.value
    }

    pub fn prompt(&self) -> Option<&Path> {
        self.prompt.as_ref().map(|r| r.value.as_path())
    }

    pub fn library_data(&self) -> Option<&Path> {
        self.library_data.as_ref().map(|r| r.value.as_path())
    }

    pub fn target_language(&self) -> &str {
        &self.target_language.value
    }

    pub fn include_unsafe(&self) -> bool {
        self.include_unsafe.value
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub output_format: Option<OutputFormat>,
    pub prompt: Option<PathBuf>,
    pub library_data: Option<PathBuf>,
    pub target_language: Option<String>,
    pub include_unsafe: Option<bool>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn with_prompt(mut self, path: impl Into<PathBuf>) -> Self {
        self.prompt = Some(path.into());
        self
    }

    pub fn with_library_data(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_data = Some(path.into());
        self
    }

    pub fn with_target_language(mut self, lang: impl Into<String>) -> Self {
        self.target_language = Some(lang.into());
        self
    }

    pub fn with_include_unsafe(mut self, include: bool) -> Self {
        self.include_unsafe = Some(include);
        self
    }
}

/// Pick the highest-precedence value among CLI, project and system layers.
fn pick<T: Clone>(
    cli: Option<&T>,
    project: Option<&T>,
    system: Option<&T>,
) -> Option<Resolved<T>> {
    if let Some(v) = cli {
        Some(Resolved::new(v.clone(), ValueSource::CliFlag))
    } else if let Some(v) = project {
        Some(Resolved::new(v.clone(), ValueSource::Project))
    } else {
        system.map(|v| Resolved::new(v.clone(), ValueSource::System))
    }
}

/// Resolve configuration with full precedence chain.
///
/// Relative `prompt` and `library-data` paths from either config file are
/// taken relative to `project_root`. CLI paths are used as given.
pub fn resolve_config(
    paths: &ConfigPaths,
    project_root: &Path,
    overrides: &ConfigOverrides,
) -> Result<ResolvedConfig> {
    let system = match paths.system {
        Some(ref path) => read_config(path)?,
        None => FerryConfig::default(),
    };
    let project = read_config(&paths.project)?;
    let mut result = ResolvedConfig::default();

    if let Some(r) = pick(
        overrides.output_format.as_ref(),
        project.output_format.as_ref(),
        system.output_format.as_ref(),
    ) {
        result.output_format = r;
    }

    let from_file = |p: &String| project_root.join(p);
    result.prompt = pick(
        overrides.prompt.as_ref(),
        project.prompt.as_ref().map(from_file).as_ref(),
        system.prompt.as_ref().map(from_file).as_ref(),
    );
    result.library_data = pick(
        overrides.library_data.as_ref(),
        project.library_data.as_ref().map(from_file).as_ref(),
        system.library_data.as_ref().map(from_file).as_ref(),
    );

    if let Some(r) = pick(
        overrides.target_language.as_ref(),
        project.target_language.as_ref(),
        system.target_language.as_ref(),
    ) {
        result.target_language = r;
    }

    if let Some(r) = pick(
        overrides.include_unsafe.as_ref(),
        project.include_unsafe.as_ref(),
        system.include_unsafe.as_ref(),
    ) {
        result.include_unsafe = r;
    }

    tracing::debug!(
        output_format = %result.output_format.value,
        target_language = %result.target_language.value,
        "resolved config"
    );
    Ok(result)
}
