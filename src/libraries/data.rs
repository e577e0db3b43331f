//! On-disk format of the library equivalence data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Library data file: every known library plus the mappings between them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryData {
    /// Libraries keyed by an id that mappings refer to
    #[serde(default)]
    pub libs: BTreeMap<String, Library>,
    #[serde(default)]
    pub mappings: Vec<Mapping>,
}

/// A library in some language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    pub url: String,
    pub lang: String,
    /// Reason the library is flagged, usually an advisory id
    #[serde(rename = "unsafe", default, skip_serializing_if = "Option::is_none")]
    pub unsafe_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crate_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Library {
    pub fn is_unsafe(&self) -> bool {
        self.unsafe_reason.as_deref().is_some_and(|r| !r.is_empty())
    }
}

/// Equivalence from one source library to any number of targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub source: String,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<RequiredDep>,
}

/// A companion dependency that has to come along with a mapped library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredDep {
    #[serde(rename = "crate")]
    pub krate: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
}
