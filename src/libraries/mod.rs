//! Cross-language library equivalence lookups.
//!
//! The index is built once from a data file listing libraries and the
//! mappings between them, then handed to whoever needs lookups. Nothing here
//! is global; tests build their own indexes from fixture data.

pub mod data;

pub use data::{Library, LibraryData, Mapping, RequiredDep};

use crate::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// Placeholder target meaning "no equivalent exists".
pub const NO_TARGET: &str = "<None>";

/// Library data that ships with ferry.
pub const EMBEDDED_DATA: &str = include_str!("libraries.json");

/// Looks up equivalents of a library in another language.
pub trait Lookup {
    /// Equivalent library URLs in `target_lang` for `source_url`.
    fn lookup(&self, source_url: &str, target_lang: &str, include_unsafe: bool) -> Vec<String>;

    /// Crate name recorded for a Rust library URL, if any.
    fn crate_name(&self, _rust_url: &str) -> Option<String> {
        None
    }
}

/// Normalize a URL for use as an index key.
///
/// Lowercases, strips an `https://` or `http://` scheme and one trailing slash.
pub fn normalize_url(url: &str) -> String {
    let url = url.to_lowercase();
    let url = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(&url);
    url.strip_suffix('/').unwrap_or(url).to_string()
}

fn index_key(lang: &str, url: &str) -> String {
    format!("{}:{}", lang.to_lowercase(), normalize_url(url))
}

/// Bidirectional library index.
#[derive(Debug, Clone, Default)]
pub struct LibraryIndex {
    /// target_lang:source_url -> target urls, both sides safe
    forward: HashMap<String, Vec<String>>,
    /// target_lang:source_url -> target urls, including unsafe libraries
    forward_all: HashMap<String, Vec<String>>,
    /// source_lang:target_url -> source urls, both sides safe
    reverse: HashMap<String, Vec<String>>,
    /// source_lang:target_url -> source urls, including unsafe libraries
    reverse_all: HashMap<String, Vec<String>>,
    /// normalized url -> crate name
    crate_names: HashMap<String, String>,
    /// normalized url -> tags
    tags: HashMap<String, Vec<String>>,
    /// target_lang:source_url -> companion dependencies
    required_deps: HashMap<String, Vec<RequiredDep>>,
    library_count: usize,
    mapping_count: usize,
    unsafe_count: usize,
}

impl LibraryIndex {
    /// Build the index from parsed library data.
    pub fn build(data: &LibraryData) -> Self {
        let mut index = Self {
            library_count: data.libs.len(),
            mapping_count: data.mappings.len(),
            ..Self::default()
        };

        for lib in data.libs.values() {
            if lib.is_unsafe() {
                index.unsafe_count += 1;
            }
            let url = normalize_url(&lib.url);
            if lib.lang.eq_ignore_ascii_case("rust")
                && let Some(name) = lib.crate_name.as_ref().filter(|n| !n.is_empty())
            {
                index.crate_names.insert(url.clone(), name.clone());
            }
            if !lib.tags.is_empty() {
                index.tags.insert(url, lib.tags.clone());
            }
        }

        for mapping in &data.mappings {
            let Some(source) = data.libs.get(&mapping.source) else {
                tracing::debug!(source = %mapping.source, "mapping source not in library list");
                continue;
            };

            for target_id in &mapping.targets {
                if target_id == NO_TARGET {
                    continue;
                }
                let Some(target) = data.libs.get(target_id) else {
                    tracing::debug!(target = %target_id, "mapping target not in library list");
                    continue;
                };

                let safe = !source.is_unsafe() && !target.is_unsafe();

                let forward_key = index_key(&target.lang, &source.url);
                push(&mut index.forward_all, &forward_key, &target.url);
                if safe {
                    push(&mut index.forward, &forward_key, &target.url);
                }

                let reverse_key = index_key(&source.lang, &target.url);
                push(&mut index.reverse_all, &reverse_key, &source.url);
                if safe {
                    push(&mut index.reverse, &reverse_key, &source.url);
                }

                let deps = index.required_deps.entry(forward_key).or_default();
                for req in &mapping.requires {
                    if !deps.iter().any(|d| d.krate == req.krate) {
                        deps.push(req.clone());
                    }
                }
            }
        }

        index
    }

    /// Parse library data JSON and build the index.
    pub fn from_json(json: &str) -> Result<Self> {
        let data: LibraryData = serde_json::from_str(json)?;
        Ok(Self::build(&data))
    }

    /// Read a library data file and build the index.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| Error::Storage {
            path: path.to_path_buf(),
            source,
        })?;
        let data: LibraryData = serde_json::from_str(&json).map_err(|source| Error::Corrupt {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::build(&data))
    }

    /// The index built from the data that ships with ferry.
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_DATA)
    }

    /// Source-language libraries that `target_url` is an equivalent of.
    pub fn reverse_lookup(
        &self,
        target_url: &str,
        source_lang: &str,
        include_unsafe: bool,
    ) -> Vec<String> {
        let key = index_key(source_lang, target_url);
        let map = if include_unsafe {
            &self.reverse_all
        } else {
            &self.reverse
        };
        map.get(&key).cloned().unwrap_or_default()
    }

    /// Tags for a library URL.
    pub fn tags(&self, url: &str) -> &[String] {
        self.tags
            .get(&normalize_url(url))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Companion dependencies needed when replacing `source_url` in `target_lang`.
    pub fn required_deps(&self, source_url: &str, target_lang: &str) -> &[RequiredDep] {
        self.required_deps
            .get(&index_key(target_lang, source_url))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn library_count(&self) -> usize {
        self.library_count
    }

    pub fn mapping_count(&self) -> usize {
        self.mapping_count
    }

    pub fn unsafe_count(&self) -> usize {
        self.unsafe_count
    }
}

impl Lookup for LibraryIndex {
    fn lookup(&self, source_url: &str, target_lang: &str, include_unsafe: bool) -> Vec<String> {
        let key = index_key(target_lang, source_url);
        let map = if include_unsafe {
            &self.forward_all
        } else {
            &self.forward
        };
        map.get(&key).cloned().unwrap_or_default()
    }

    fn crate_name(&self, rust_url: &str) -> Option<String> {
        self.crate_names.get(&normalize_url(rust_url)).cloned()
    }
}

fn push(map: &mut HashMap<String, Vec<String>>, key: &str, url: &str) {
    map.entry(key.to_string()).or_default().push(url.to_string());
}
