//! Cargo.toml generation from parsed Go dependencies.

use super::gomod::Dependency;
use crate::libraries::{Lookup, normalize_url};
use serde::Serialize;
use std::fmt::Write;

/// A Go dependency with at least one equivalent in the target language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappedDependency {
    pub go_path: String,
    /// Repository URLs of the equivalents
    pub targets: Vec<String>,
    /// Crate name for each entry in `targets`
    pub crate_names: Vec<String>,
}

/// Dependencies split by whether an equivalent was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyMap {
    pub mapped: Vec<MappedDependency>,
    pub unmapped: Vec<String>,
}

/// Look up Rust equivalents for each Go dependency.
pub fn map_dependencies<L: Lookup + ?Sized>(
    deps: &[&Dependency],
    lookup: &L,
    include_unsafe: bool,
) -> DependencyMap {
    let mut result = DependencyMap::default();

    for dep in deps {
        let url = module_path_to_github_url(&dep.path);
        let targets = lookup.lookup(&url, "rust", include_unsafe);
        if targets.is_empty() {
            result.unmapped.push(dep.path.clone());
            continue;
        }

        let crate_names = targets
            .iter()
            .map(|target| resolve_crate_name(lookup, target))
            .collect();
        result.mapped.push(MappedDependency {
            go_path: dep.path.clone(),
            targets,
            crate_names,
        });
    }

    result
}

/// Crate name for a Rust repository URL, preferring what the index records.
pub fn resolve_crate_name<L: Lookup + ?Sized>(lookup: &L, rust_url: &str) -> String {
    lookup
        .crate_name(rust_url)
        .unwrap_or_else(|| extract_crate_name(rust_url))
}

/// Convert a Go module path to the URL of its source repository.
///
/// `golang.org/x/NAME/...` maps to `github.com/golang/NAME`. GitHub paths
/// lose a trailing major version suffix (`/v2`, `/v3`, ...).
pub fn module_path_to_github_url(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("golang.org/x/") {
        let name = rest.split('/').next().unwrap_or(rest);
        return format!("https://github.com/golang/{}", name);
    }
    if path.starts_with("github.com/") {
        return format!("https://{}", strip_version_suffix(path));
    }
    format!("https://{}", path)
}

fn strip_version_suffix(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((head, tail))
            if tail.len() > 1
                && tail.starts_with('v')
                && tail[1..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            head
        }
        _ => path,
    }
}

/// Guess a crate name from a GitHub repository URL.
///
/// Known repositories come from a fixed table; otherwise the repository name
/// is used with a `-rs` suffix dropped and `-` turned into `_`. For
/// `github.com/owner/repo/tree/<branch>/<crate>` the last segment is used.
/// Returns an empty string for anything that isn't a GitHub URL.
pub fn extract_crate_name(github_url: &str) -> String {
    let normalized = normalize_url(github_url);
    if let Some(name) = known_crate_name(&normalized) {
        return name.to_string();
    }

    let parts: Vec<&str> = normalized.split('/').collect();
    if parts.len() < 3 || parts[0] != "github.com" {
        return String::new();
    }

    let mut repo = parts[2];
    if parts.len() >= 5 && parts[3] == "tree" {
        repo = parts[parts.len() - 1];
    }

    repo.strip_suffix("-rs").unwrap_or(repo).replace('-', "_")
}

fn known_crate_name(normalized_url: &str) -> Option<&'static str> {
    let name = match normalized_url {
        "github.com/serde-rs/json" => "serde_json",
        "github.com/serde-rs/serde" => "serde",
        "github.com/dtolnay/serde-yaml" => "serde_yaml",
        "github.com/dtolnay/anyhow" => "anyhow",
        "github.com/tokio-rs/tokio" => "tokio",
        "github.com/tokio-rs/axum" => "axum",
        "github.com/tokio-rs/tracing" => "tracing",
        "github.com/tokio-rs/prost" => "prost",
        "github.com/clap-rs/clap" => "clap",
        "github.com/hyperium/hyper" => "hyper",
        "github.com/hyperium/tonic" => "tonic",
        "github.com/rust-lang/regex" => "regex",
        "github.com/rust-lang/log" => "log",
        "github.com/rust-lang/hashbrown" => "hashbrown",
        "github.com/chronotope/chrono" => "chrono",
        "github.com/uuid-rs/uuid" => "uuid",
        "github.com/rayon-rs/rayon" => "rayon",
        "github.com/crossbeam-rs/crossbeam" => "crossbeam",
        "github.com/rusqlite/rusqlite" => "rusqlite",
        "github.com/launchbadge/sqlx" => "sqlx",
        "github.com/actix/actix-web" => "actix_web",
        "github.com/rustls/rustls" => "rustls",
        "github.com/burntsushi/toml" | "github.com/toml-rs/toml" => "toml",
        "github.com/seaorm/sea-orm" => "sea_orm",
        "github.com/sfackler/rust-postgres" => "postgres",
        "github.com/tower-rs/tower" => "tower",
        "github.com/tower-rs/tower-http" => "tower_http",
        "github.com/rust-random/rand" => "rand",
        "github.com/rust-rocksdb/rust-rocksdb" => "rocksdb",
        "github.com/redis-rs/redis-rs" => "redis",
        "github.com/mongodb/mongo-rust-driver" => "mongodb",
        _ => return None,
    };
    Some(name)
}

/// Render a Cargo.toml for the mapped dependencies.
///
/// Mapped crates are listed with a `"*"` version and sorted by crate name.
/// Unmapped Go modules become `# TODO` comments.
pub fn generate_cargo_toml(module: &str, deps: &DependencyMap) -> String {
    let mut out = String::new();
    out.push_str("# Generated by ferry\n");
    let _ = writeln!(out, "# Original Go module: {}", module);
    out.push('\n');
    out.push_str("[package]\n");
    out.push_str("name = \"converted_project\"\n");
    out.push_str("version = \"0.1.0\"\n");
    out.push_str("edition = \"2021\"\n");
    out.push('\n');
    out.push_str("[dependencies]\n");

    let mut entries: Vec<(&str, &str, &str)> = deps
        .mapped
        .iter()
        .flat_map(|m| {
            m.crate_names
                .iter()
                .zip(&m.targets)
                .map(move |(name, target)| (name.as_str(), m.go_path.as_str(), target.as_str()))
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    for (name, go_path, target) in entries {
        if name.is_empty() {
            let _ = writeln!(out, "# TODO: no crate name for {} (from {})", target, go_path);
        } else {
            let _ = writeln!(out, "{} = \"*\"  # from {} -> {}", name, go_path, target);
        }
    }

    if !deps.unmapped.is_empty() {
        out.push('\n');
        out.push_str("# TODO: Find equivalents for these Go dependencies:\n");
        for path in &deps.unmapped {
            let _ = writeln!(out, "# TODO: find equivalent for {}", path);
        }
    }

    out
}
