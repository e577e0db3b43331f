//! `ferry verify`: how far requirement capture and implementation have come.

use super::libraries::project_tags;
use super::{Output, json};
use crate::libraries::LibraryIndex;
use crate::manifest::gomod;
use crate::storage::Storage;
use crate::verify::{self, CategoryStatus};
use crate::Result;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct CoverageEntry {
    #[serde(flatten)]
    pub status: CategoryStatus,
    /// Concrete areas the pattern resolved to, e.g. `server/cli`
    pub areas: Vec<String>,
    pub all_done: bool,
}

#[derive(Debug, Serialize)]
pub struct VerifyResult {
    pub done: Vec<String>,
    pub pending: Vec<String>,
    /// Only present when a go.mod was analyzed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub coverage: Vec<CoverageEntry>,
    pub complete: bool,
}

impl Output for VerifyResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let total = self.done.len() + self.pending.len();
        let mut lines = vec![format!(
            "Requirements: {}/{} done",
            self.done.len(),
            total
        )];
        for path in &self.pending {
            lines.push(format!("  [ ] {}", path));
        }

        if let Some(ref tags) = self.tags {
            lines.push(String::new());
            if tags.is_empty() {
                lines.push("Coverage: no tagged dependencies".to_string());
            } else {
                lines.push(format!("Coverage ({}):", tags.join(", ")));
            }
            for entry in &self.coverage {
                let s = &entry.status;
                if !s.has_requirements() {
                    lines.push(format!("  [!] {} ({}): no requirements", s.category, s.pattern));
                    continue;
                }
                let mark = if entry.all_done { "[x]" } else { "[ ]" };
                lines.push(format!(
                    "  {} {} ({}): {}/{} done in {}",
                    mark,
                    s.category,
                    s.pattern,
                    s.done_count,
                    s.count,
                    entry.areas.join(", ")
                ));
            }
        }

        lines.push(String::new());
        lines.push(if self.complete {
            "All requirements implemented.".to_string()
        } else {
            "Migration not yet complete.".to_string()
        });
        lines.join("\n")
    }
}

/// Report done/pending requirements and, given a go.mod, whether every area
/// its dependencies imply has requirements.
pub fn verify(storage: &Storage, index: &LibraryIndex, manifest: Option<&Path>) -> Result<VerifyResult> {
    let implementation = verify::check_implementation(storage)?;

    let mut tags = None;
    let mut coverage = Vec::new();
    if let Some(path) = manifest {
        let parsed = gomod::parse_file(path)?;
        let project = project_tags(index, &parsed);
        for status in verify::check_coverage(storage, &project)? {
            let areas = verify::expand_wildcard_pattern(storage, &status.pattern)?;
            let all_done = verify::requirement_status(storage, &status.pattern)?.all_done;
            coverage.push(CoverageEntry {
                status,
                areas,
                all_done,
            });
        }
        tags = Some(project);
    }

    let complete = implementation.pending.is_empty()
        && coverage.iter().all(|c| c.status.has_requirements());

    Ok(VerifyResult {
        done: implementation.done,
        pending: implementation.pending,
        tags,
        coverage,
        complete,
    })
}
