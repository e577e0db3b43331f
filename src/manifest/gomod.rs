//! `go.mod` parsing.
//!
//! Only the directives needed to find dependencies are understood: `module`,
//! `go` and `require` in both its single-line and block forms. Everything
//! else (`replace`, `exclude`, `toolchain`, ...) is skipped.

use crate::{Error, Result};
use regex::Regex;
use serde::Serialize;
use std::path::Path;

/// Upper bound on dependencies in a single go.mod.
pub const MAX_DEPENDENCIES: usize = 10_000;

const INDIRECT_MARKER: &str = "// indirect";

/// One `require` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub path: String,
    pub version: String,
    pub indirect: bool,
}

/// Parsed contents of a go.mod file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GoMod {
    pub module: String,
    pub go_version: String,
    pub dependencies: Vec<Dependency>,
}

impl GoMod {
    /// Dependencies not marked `// indirect`, in file order.
    pub fn direct_dependencies(&self) -> Vec<&Dependency> {
        self.dependencies.iter().filter(|d| !d.indirect).collect()
    }
}

struct Patterns {
    module: Regex,
    go_version: Regex,
    require_single: Regex,
    require_block: Regex,
    dep_line: Regex,
}

impl Patterns {
    fn compile() -> Result<Self> {
        let re = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::Manifest(format!("bad pattern: {}", e)))
        };
        Ok(Self {
            module: re(r"^module\s+(\S+)")?,
            go_version: re(r"^go\s+(\S+)")?,
            require_single: re(r"^require\s+(\S+)\s+(\S+)(.*)")?,
            require_block: re(r"^require\s*\(")?,
            dep_line: re(r"^\s*(\S+)\s+(\S+)(.*)")?,
        })
    }
}

/// Read and parse a go.mod file.
pub fn parse_file(path: &Path) -> Result<GoMod> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Storage {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}

/// Parse go.mod content.
pub fn parse(content: &str) -> Result<GoMod> {
    let patterns = Patterns::compile()?;
    let mut result = GoMod::default();
    let mut in_block = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        if in_block && line == ")" {
            in_block = false;
            continue;
        }

        if let Some(caps) = patterns.module.captures(line) {
            result.module = caps[1].to_string();
            continue;
        }

        if let Some(caps) = patterns.go_version.captures(line) {
            result.go_version = caps[1].to_string();
            continue;
        }

        if patterns.require_block.is_match(line) {
            in_block = true;
            continue;
        }

        let caps = patterns
            .require_single
            .captures(line)
            .or_else(|| in_block.then(|| patterns.dep_line.captures(line)).flatten());

        if let Some(caps) = caps {
            result.dependencies.push(Dependency {
                path: caps[1].to_string(),
                version: caps[2].to_string(),
                indirect: caps[3].contains(INDIRECT_MARKER),
            });
            if result.dependencies.len() >= MAX_DEPENDENCIES {
                return Err(Error::Manifest(format!(
                    "too many dependencies (limit: {})",
                    MAX_DEPENDENCIES
                )));
            }
        }
    }

    if in_block {
        return Err(Error::Manifest("unclosed require block".to_string()));
    }

    tracing::debug!(
        module = %result.module,
        dependencies = result.dependencies.len(),
        "parsed go.mod"
    );
    Ok(result)
}
