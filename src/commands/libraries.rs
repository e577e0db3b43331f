//! Library lookup and go.mod conversion commands.

use super::{Output, json};
use crate::libraries::{LibraryIndex, Lookup, RequiredDep};
use crate::manifest::{self, generate_cargo_toml, gomod, map_dependencies, module_path_to_github_url};
use crate::storage::write_atomic;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Serialize)]
pub struct LookupResult {
    pub url: String,
    pub language: String,
    pub matches: Vec<String>,
}

impl Output for LookupResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.matches.is_empty() {
            return format!("No {} equivalent found for {}", self.language, self.url);
        }
        self.matches.join("\n")
    }
}

/// Look up equivalents of a single library URL.
///
/// Mappings are directional; when `url` is itself a target (a Rust crate
/// looked up in Go, say) the libraries it replaces are returned instead.
pub fn lookup(
    index: &LibraryIndex,
    url: &str,
    language: &str,
    include_unsafe: bool,
) -> Result<LookupResult> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(Error::InvalidInput(
            "invalid URL: must start with http:// or https://".to_string(),
        ));
    }

    let mut matches = index.lookup(url, language, include_unsafe);
    if matches.is_empty() {
        matches = index.reverse_lookup(url, language, include_unsafe);
    }

    Ok(LookupResult {
        url: url.to_string(),
        language: language.to_lowercase(),
        matches,
    })
}

#[derive(Debug, Serialize)]
pub struct CrateMatch {
    #[serde(rename = "crate")]
    pub krate: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ScanEntry {
    pub path: String,
    pub version: String,
    pub matches: Vec<CrateMatch>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<RequiredDep>,
}

#[derive(Debug, Serialize)]
pub struct ScanResult {
    pub module: String,
    pub go_version: String,
    pub dependencies: Vec<ScanEntry>,
    pub mapped: usize,
}

impl Output for ScanResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Module: {}", self.module),
            format!("Go version: {}", self.go_version),
            format!("Direct dependencies: {}", self.dependencies.len()),
            String::new(),
        ];

        for dep in &self.dependencies {
            lines.push(dep.path.clone());
            if dep.matches.is_empty() {
                lines.push("  -> (no mapping found)".to_string());
            }
            for m in &dep.matches {
                lines.push(format!("  -> {} ({})", m.krate, m.url));
            }
            for req in &dep.requires {
                let mut line = format!("  requires {}", req.krate);
                if !req.features.is_empty() {
                    line.push_str(&format!(" [{}]", req.features.join(", ")));
                }
                if !req.reason.is_empty() {
                    line.push_str(&format!(" - {}", req.reason));
                }
                lines.push(line);
            }
        }

        lines.push(String::new());
        lines.push(format!(
            "Mapped {}/{} direct dependencies",
            self.mapped,
            self.dependencies.len()
        ));
        lines.join("\n")
    }
}

/// Show equivalents for every direct dependency in a go.mod.
pub fn scan(
    index: &LibraryIndex,
    gomod_path: &Path,
    language: &str,
    include_unsafe: bool,
) -> Result<ScanResult> {
    let parsed = gomod::parse_file(gomod_path)?;

    let mut dependencies = Vec::new();
    for dep in parsed.direct_dependencies() {
        let url = module_path_to_github_url(&dep.path);
        let matches = index
            .lookup(&url, language, include_unsafe)
            .into_iter()
            .map(|target| CrateMatch {
                krate: manifest::resolve_crate_name(index, &target),
                url: target,
            })
            .collect();
        dependencies.push(ScanEntry {
            path: dep.path.clone(),
            version: dep.version.clone(),
            matches,
            requires: index.required_deps(&url, language).to_vec(),
        });
    }

    let mapped = dependencies.iter().filter(|d| !d.matches.is_empty()).count();
    Ok(ScanResult {
        module: parsed.module,
        go_version: parsed.go_version,
        dependencies,
        mapped,
    })
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResult {
    pub tags: Vec<String>,
}

impl Output for AnalyzeResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.tags.is_empty() {
            return "No tags detected.".to_string();
        }
        self.tags.join("\n")
    }
}

/// Sorted, de-duplicated tags of the direct dependencies in a go.mod.
pub fn analyze(index: &LibraryIndex, gomod_path: &Path) -> Result<AnalyzeResult> {
    let parsed = gomod::parse_file(gomod_path)?;
    Ok(AnalyzeResult {
        tags: project_tags(index, &parsed),
    })
}

pub(crate) fn project_tags(index: &LibraryIndex, parsed: &gomod::GoMod) -> Vec<String> {
    let tags: BTreeSet<String> = parsed
        .direct_dependencies()
        .iter()
        .flat_map(|dep| index.tags(&module_path_to_github_url(&dep.path)).to_vec())
        .collect();
    tags.into_iter().collect()
}

#[derive(Debug, Serialize)]
pub struct ConvertResult {
    pub module: String,
    /// Where the manifest was written, if not printed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    pub content: String,
    pub total: usize,
    pub mapped: usize,
    pub unmapped: usize,
}

impl Output for ConvertResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        match self.output {
            Some(ref path) => format!(
                "Generated {} with {} dependencies ({} mapped, {} unmapped)",
                path.display(),
                self.total,
                self.mapped,
                self.unmapped
            ),
            None => self.content.trim_end().to_string(),
        }
    }
}

/// Generate a Cargo.toml from a go.mod.
///
/// With `output`, the manifest is written atomically to `base_dir/output`;
/// the output path must be relative and stay inside `base_dir`.
pub fn convert<L: Lookup + ?Sized>(
    index: &L,
    gomod_path: &Path,
    output: Option<&Path>,
    base_dir: &Path,
    include_unsafe: bool,
) -> Result<ConvertResult> {
    let target = output.map(validate_output_path).transpose()?;

    let parsed = gomod::parse_file(gomod_path)?;
    let direct = parsed.direct_dependencies();
    let deps = map_dependencies(&direct, index, include_unsafe);
    let content = generate_cargo_toml(&parsed.module, &deps);

    if let Some(ref rel) = target {
        write_atomic(&base_dir.join(rel), content.as_bytes())?;
        tracing::info!(output = %rel.display(), "wrote Cargo.toml");
    }

    Ok(ConvertResult {
        module: parsed.module.clone(),
        output: target,
        content,
        total: direct.len(),
        mapped: deps.mapped.len(),
        unmapped: deps.unmapped.len(),
    })
}

/// Reject absolute output paths and paths that climb out of the working directory.
fn validate_output_path(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(Error::InvalidInput("output path must not be empty".to_string()));
    }
    if path.is_absolute() || path.has_root() {
        return Err(Error::InvalidInput(format!(
            "absolute paths not allowed: {}",
            path.display()
        )));
    }

    let mut depth: usize = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    Error::InvalidInput(format!("path traversal not allowed: {}", path.display()))
                })?;
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::InvalidInput(format!(
                    "absolute paths not allowed: {}",
                    path.display()
                )));
            }
        }
    }
    Ok(path.to_path_buf())
}
