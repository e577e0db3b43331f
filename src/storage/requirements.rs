//! Requirement documents.
//!
//! Requirements are addressed by `/`-separated logical paths (`api/web/routes`)
//! that map onto nested directories under `.ferry/requirements/`. Paths form a
//! flat namespace: deleting `api` never touches `api/cli`.

use super::{Storage, read_json, remove_if_exists, write_json_atomic};
use crate::models::Requirement;
use crate::storage::safe_path::{REQUIREMENT_EXT, SafeReqPath};
use crate::{Error, Result};
use std::path::Path;
use walkdir::WalkDir;

/// Wildcard segment in list patterns.
pub const WILDCARD: &str = "*";

/// Filter applied by [`Storage::list_requirements`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathFilter {
    /// Every path.
    All,
    /// Paths that begin with the literal string.
    Prefix(String),
    /// Segment-wise match where `*` matches any single segment.
    Pattern(Vec<String>),
}

impl PathFilter {
    /// Build a filter from user input. A `*` segment turns it into a pattern.
    pub fn parse(input: &str) -> Self {
        if input.is_empty() {
            return PathFilter::All;
        }
        let segments: Vec<&str> = input.split('/').collect();
        if segments.contains(&WILDCARD) {
            PathFilter::Pattern(segments.into_iter().map(String::from).collect())
        } else {
            PathFilter::Prefix(input.to_string())
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathFilter::All => true,
            PathFilter::Prefix(prefix) => path.starts_with(prefix.as_str()),
            PathFilter::Pattern(pattern) => match_pattern(pattern, path),
        }
    }
}

/// Segment-wise pattern match.
///
/// The pattern may not be longer than the path; its segments must match the
/// leading segments of the path, with `*` matching any one segment.
pub fn match_pattern<S: AsRef<str>>(pattern: &[S], path: &str) -> bool {
    let path_parts: Vec<&str> = path.split('/').collect();
    if pattern.len() > path_parts.len() {
        return false;
    }

    pattern
        .iter()
        .zip(path_parts)
        .all(|(pp, part)| pp.as_ref() == WILDCARD || pp.as_ref() == part)
}

impl Storage {
    fn safe_req_path(&self, req_path: &str) -> Result<SafeReqPath> {
        SafeReqPath::new(&self.requirements_dir(), req_path)
    }

    /// Create or update a requirement.
    ///
    /// The document is stamped with the current step from progress. An
    /// existing document keeps its `created_at`.
    pub fn set_requirement(&self, req_path: &str, content: &str) -> Result<Requirement> {
        let safe = self.safe_req_path(req_path)?;
        if content.trim().is_empty() {
            return Err(Error::InvalidInput(
                "requirement content must not be empty".to_string(),
            ));
        }

        let step = self.current_step()?;
        let req = match read_json::<Requirement>(safe.path())? {
            Some(mut existing) => {
                existing.path = safe.logical().to_string();
                existing.rewrite(content, step);
                existing
            }
            None => Requirement::new(safe.logical(), content, step),
        };

        write_json_atomic(safe.path(), &req)?;
        tracing::info!(path = %req.path, step = %req.step, "set requirement");
        Ok(req)
    }

    /// Get a requirement. Returns `None` if it doesn't exist.
    pub fn get_requirement(&self, req_path: &str) -> Result<Option<Requirement>> {
        let safe = self.safe_req_path(req_path)?;
        read_json(safe.path())
    }

    /// List requirement paths matching `filter`, sorted.
    pub fn list_requirements(&self, filter: &PathFilter) -> Result<Vec<String>> {
        let base = self.requirements_dir();
        if !base.is_dir() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(&base).follow_links(false) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&base).to_path_buf();
                Error::Storage {
                    path,
                    source: e.into(),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(logical) = logical_path(&base, entry.path()) else {
                continue;
            };
            if filter.matches(&logical) {
                paths.push(logical);
            }
        }

        paths.sort();
        Ok(paths)
    }

    /// Mark a requirement as done.
    pub fn mark_requirement_done(&self, req_path: &str) -> Result<Requirement> {
        let safe = self.safe_req_path(req_path)?;
        let mut req = read_json::<Requirement>(safe.path())?
            .ok_or_else(|| Error::RequirementNotFound(req_path.to_string()))?;

        req.mark_done();
        write_json_atomic(safe.path(), &req)?;
        tracing::info!(path = %req.path, "requirement done");
        Ok(req)
    }

    /// Delete a requirement. Deleting a missing requirement is not an error.
    pub fn delete_requirement(&self, req_path: &str) -> Result<()> {
        let safe = self.safe_req_path(req_path)?;
        remove_if_exists(safe.path())
    }
}

/// Logical path of a requirement file, or `None` for anything that isn't one.
fn logical_path(base: &Path, file: &Path) -> Option<String> {
    if file.extension()? != REQUIREMENT_EXT {
        return None;
    }
    let rel = file.strip_prefix(base).ok()?.with_extension("");
    let segments: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
    Some(segments?.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Migration;
    use crate::test_utils::TestEnv;
    use std::fs;
    use std::thread::sleep;
    use std::time::Duration;

    fn list(storage: &Storage, filter: &str) -> Vec<String> {
        storage.list_requirements(&PathFilter::parse(filter)).unwrap()
    }

    #[test]
    fn test_set_and_get() {
        let env = TestEnv::new();
        let storage = env.storage();

        storage.set_requirement("api/cli", "--port, --config").unwrap();

        let req = storage.get_requirement("api/cli").unwrap().unwrap();
        assert_eq!(req.path, "api/cli");
        assert_eq!(req.content, "--port, --config");
        assert_eq!(req.step, "");
        assert!(!req.is_done());
    }

    #[test]
    fn test_get_not_found() {
        let env = TestEnv::new();
        assert!(env.storage().get_requirement("nonexistent").unwrap().is_none());
    }

    #[test]
    fn test_set_rejects_empty_content() {
        let env = TestEnv::new();
        let storage = env.storage();

        for content in ["", "   ", "\n\t\n"] {
            let err = storage.set_requirement("api/cli", content).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)));
        }
        assert!(list(&storage, "").is_empty());
    }

    #[test]
    fn test_set_preserves_created_at() {
        let env = TestEnv::new();
        let storage = env.storage();

        storage.set_requirement("api/cli", "v1").unwrap();
        let first = storage.get_requirement("api/cli").unwrap().unwrap();

        sleep(Duration::from_millis(10));
        storage.set_requirement("api/cli", "v2").unwrap();
        let second = storage.get_requirement("api/cli").unwrap().unwrap();

        assert_eq!(second.content, "v2");
        assert_eq!(second.created_at(), first.created_at());
        assert!(second.updated_at() > first.updated_at());
        assert!(second.updated_at() > second.created_at());
    }

    #[test]
    fn test_set_stamps_current_step() {
        let env = TestEnv::new();
        let storage = env.storage();

        let mut m = Migration::new("/p", vec!["1".into(), "2a".into(), "2b".into()]);
        m.start_step("2a").unwrap();
        storage.save_progress(&m).unwrap();

        storage.set_requirement("api/cli", "content").unwrap();
        let req = storage.get_requirement("api/cli").unwrap().unwrap();
        assert_eq!(req.step, "2a");
    }

    #[test]
    fn test_set_nested_path_layout() {
        let env = TestEnv::new();
        let storage = env.storage();

        storage
            .set_requirement("api/web/routes/users", "GET /, POST /")
            .unwrap();

        let file = env
            .path()
            .join(".ferry")
            .join("requirements")
            .join("api")
            .join("web")
            .join("routes")
            .join("users.json");
        assert!(file.is_file());

        let req = storage.get_requirement("api/web/routes/users").unwrap().unwrap();
        assert_eq!(req.content, "GET /, POST /");
    }

    #[test]
    fn test_traversal_rejected_before_write() {
        let env = TestEnv::new();
        let storage = env.storage();

        let err = storage.set_requirement("../../etc/passwd", "x").unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
        assert!(!storage.state_dir().exists());

        assert!(storage.get_requirement("../outside").is_err());
        assert!(storage.mark_requirement_done("/etc/passwd").is_err());
        assert!(storage.delete_requirement("a/../../b").is_err());
    }

    #[test]
    fn test_list_sorted() {
        let env = TestEnv::new();
        let storage = env.storage();

        storage.set_requirement("worker/jobs", "jobs").unwrap();
        storage.set_requirement("api/web/routes", "routes").unwrap();
        storage.set_requirement("db/models/user", "user").unwrap();
        storage.set_requirement("api/cli", "cli").unwrap();

        assert_eq!(
            list(&storage, ""),
            vec!["api/cli", "api/web/routes", "db/models/user", "worker/jobs"]
        );
    }

    #[test]
    fn test_list_with_prefix() {
        let env = TestEnv::new();
        let storage = env.storage();

        storage.set_requirement("api/cli", "cli").unwrap();
        storage.set_requirement("api/web/routes", "routes").unwrap();
        storage.set_requirement("apiary", "bees").unwrap();
        storage.set_requirement("worker/jobs", "jobs").unwrap();

        assert_eq!(list(&storage, "api/"), vec!["api/cli", "api/web/routes"]);
        assert_eq!(
            list(&storage, "api"),
            vec!["api/cli", "api/web/routes", "apiary"]
        );
    }

    #[test]
    fn test_list_empty() {
        let env = TestEnv::new();
        assert!(list(&env.storage(), "").is_empty());
    }

    #[test]
    fn test_list_with_wildcard() {
        let env = TestEnv::new();
        let storage = env.storage();

        storage.set_requirement("api/cli", "cli").unwrap();
        storage.set_requirement("api/web/routes", "routes").unwrap();
        storage.set_requirement("worker/cli", "worker cli").unwrap();

        assert_eq!(list(&storage, "*/cli"), vec!["api/cli", "worker/cli"]);
    }

    #[test]
    fn test_list_wildcard_middle() {
        let env = TestEnv::new();
        let storage = env.storage();

        storage.set_requirement("api/v1/users", "v1 users").unwrap();
        storage.set_requirement("api/v2/users", "v2 users").unwrap();
        storage.set_requirement("api/v1/posts", "v1 posts").unwrap();

        assert_eq!(
            list(&storage, "api/*/users"),
            vec!["api/v1/users", "api/v2/users"]
        );
    }

    #[test]
    fn test_list_ignores_foreign_files() {
        let env = TestEnv::new();
        let storage = env.storage();
        storage.set_requirement("api/cli", "cli").unwrap();
        fs::write(storage.requirements_dir().join("notes.txt"), "x").unwrap();

        assert_eq!(list(&storage, ""), vec!["api/cli"]);
    }

    #[test]
    fn test_done_not_found() {
        let env = TestEnv::new();
        let err = env.storage().mark_requirement_done("api/cli").unwrap_err();
        assert!(matches!(err, Error::RequirementNotFound(ref p) if p == "api/cli"));
    }

    #[test]
    fn test_done_after_set() {
        let env = TestEnv::new();
        let storage = env.storage();
        storage.set_requirement("api/cli", "flags").unwrap();

        storage.mark_requirement_done("api/cli").unwrap();

        let req = storage.get_requirement("api/cli").unwrap().unwrap();
        assert!(req.is_done());
        assert!(req.done_at().is_some());
        assert_eq!(req.content, "flags");
    }

    #[test]
    fn test_delete() {
        let env = TestEnv::new();
        let storage = env.storage();
        storage.set_requirement("api/cli", "cli").unwrap();
        storage.set_requirement("api/cli/flags", "child").unwrap();

        storage.delete_requirement("api/cli").unwrap();

        assert!(storage.get_requirement("api/cli").unwrap().is_none());
        assert!(storage.get_requirement("api/cli/flags").unwrap().is_some());
    }

    #[test]
    fn test_delete_not_found() {
        let env = TestEnv::new();
        env.storage().delete_requirement("nonexistent").unwrap();
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!(PathFilter::parse(""), PathFilter::All);
        assert_eq!(
            PathFilter::parse("api/"),
            PathFilter::Prefix("api/".to_string())
        );
        assert_eq!(
            PathFilter::parse("*/cli"),
            PathFilter::Pattern(vec!["*".to_string(), "cli".to_string()])
        );
        // A star inside a segment is literal
        assert_eq!(
            PathFilter::parse("a*/cli"),
            PathFilter::Prefix("a*/cli".to_string())
        );
    }

    #[test]
    fn test_match_pattern() {
        assert!(match_pattern(&["*", "cli"], "api/cli"));
        assert!(match_pattern(&["*", "cli"], "api/cli/flags"));
        assert!(!match_pattern(&["*", "cli"], "api/web/routes"));
        assert!(!match_pattern(&["*", "cli"], "cli"));
        assert!(match_pattern(&["db"], "db/models"));
        assert!(match_pattern(&["*"], "anything"));
    }
}
