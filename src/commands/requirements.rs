//! `ferry req` commands.

use super::{Output, json};
use crate::models::Requirement;
use crate::storage::{PathFilter, Storage};
use crate::{Error, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ReqSetResult {
    pub path: String,
    /// Step that was current when the requirement was written
    pub step: String,
}

impl Output for ReqSetResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Set {}", self.path)
    }
}

/// Create or update a requirement.
pub fn req_set(storage: &Storage, path: &str, content: &str) -> Result<ReqSetResult> {
    let req = storage.set_requirement(path, content)?;
    Ok(ReqSetResult {
        path: req.path,
        step: req.step,
    })
}

#[derive(Debug, Serialize)]
pub struct ReqGetResult {
    pub requirement: Requirement,
}

impl Output for ReqGetResult {
    fn to_json(&self) -> String {
        json(&self.requirement)
    }

    fn to_human(&self) -> String {
        self.requirement.content.clone()
    }
}

/// Fetch a requirement. A missing requirement is an error here.
pub fn req_get(storage: &Storage, path: &str) -> Result<ReqGetResult> {
    let requirement = storage
        .get_requirement(path)?
        .ok_or_else(|| Error::RequirementNotFound(path.to_string()))?;
    Ok(ReqGetResult { requirement })
}

#[derive(Debug, Serialize)]
pub struct ReqListEntry {
    pub path: String,
    pub done: bool,
    pub step: String,
}

#[derive(Debug, Serialize)]
pub struct ReqListResult {
    pub requirements: Vec<ReqListEntry>,
    pub count: usize,
}

impl Output for ReqListResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.requirements.is_empty() {
            return "No requirements found.".to_string();
        }
        self.requirements
            .iter()
            .map(|r| format!("{} {}", if r.done { "[x]" } else { "[ ]" }, r.path))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// List requirements. `filter` may be empty, a literal prefix, or a `*` pattern.
pub fn req_list(storage: &Storage, filter: &str) -> Result<ReqListResult> {
    let paths = storage.list_requirements(&PathFilter::parse(filter))?;

    let mut requirements = Vec::with_capacity(paths.len());
    for path in paths {
        let req = match storage.get_requirement(&path) {
            Ok(Some(req)) => req,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "skipping unreadable requirement");
                continue;
            }
        };
        requirements.push(ReqListEntry {
            done: req.is_done(),
            step: req.step,
            path,
        });
    }

    Ok(ReqListResult {
        count: requirements.len(),
        requirements,
    })
}

#[derive(Debug, Serialize)]
pub struct ReqDoneResult {
    pub path: String,
    pub done: bool,
}

impl Output for ReqDoneResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Marked {} as done", self.path)
    }
}

/// Mark a requirement done.
pub fn req_done(storage: &Storage, path: &str) -> Result<ReqDoneResult> {
    let req = storage.mark_requirement_done(path)?;
    Ok(ReqDoneResult {
        done: req.is_done(),
        path: req.path,
    })
}

#[derive(Debug, Serialize)]
pub struct ReqDeleteResult {
    pub path: String,
    pub deleted: bool,
}

impl Output for ReqDeleteResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        if self.deleted {
            format!("Deleted {}", self.path)
        } else {
            format!("No requirement at {}", self.path)
        }
    }
}

/// Delete a requirement. Deleting a missing one reports `deleted: false`.
pub fn req_delete(storage: &Storage, path: &str) -> Result<ReqDeleteResult> {
    let existed = storage.get_requirement(path)?.is_some();
    storage.delete_requirement(path)?;
    Ok(ReqDeleteResult {
        path: path.to_string(),
        deleted: existed,
    })
}
