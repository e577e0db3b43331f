//! Requirement coverage checks.
//!
//! Project tags (from `ferry analyze`) imply requirement areas that should
//! exist, e.g. a `cli` dependency means every binary needs `<bin>/cli`
//! requirements. These checks compare the implied areas against what has
//! actually been captured and what has been marked done.

use crate::models::Requirement;
use crate::storage::requirements::{WILDCARD, match_pattern};
use crate::storage::{PathFilter, Storage};
use crate::Result;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Requirement path patterns implied by each project tag.
/// `*` stands for any single segment, normally a binary name.
pub const TAG_PATTERNS: &[(&str, &[&str])] = &[
    ("cli", &["*/cli"]),
    ("web", &["*/api"]),
    ("templating", &["*/templates"]),
    ("sql", &["db"]),
    ("orm", &["db"]),
    ("codegen:protobuf", &["codegen/protobuf"]),
    ("codegen:ent", &["codegen/ent"]),
    ("codegen:templ", &["codegen/templ"]),
    ("codegen:wire", &["codegen/wire"]),
    ("codegen:sqlc", &["codegen/sqlc"]),
    ("codegen:gqlgen", &["codegen/gqlgen"]),
];

/// Patterns implied by a single tag.
pub fn patterns_for_tag(tag: &str) -> &'static [&'static str] {
    TAG_PATTERNS
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, patterns)| *patterns)
        .unwrap_or(&[])
}

/// Coverage of one expected requirement area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStatus {
    pub category: String,
    pub pattern: String,
    pub count: usize,
    pub done_count: usize,
    pub paths: Vec<String>,
}

impl CategoryStatus {
    pub fn has_requirements(&self) -> bool {
        self.count > 0
    }
}

/// Requirement paths split by completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Implementation {
    pub done: Vec<String>,
    pub pending: Vec<String>,
}

/// Whether every requirement under a pattern is done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternStatus {
    pub all_done: bool,
    pub pending: Vec<String>,
}

fn split_pattern(pattern: &str) -> Vec<&str> {
    pattern.split('/').collect()
}

/// Load every requirement, keyed by path.
fn load_all(storage: &Storage) -> Result<BTreeMap<String, Requirement>> {
    let mut all = BTreeMap::new();
    for path in storage.list_requirements(&PathFilter::All)? {
        if let Some(req) = storage.get_requirement(&path)? {
            all.insert(path, req);
        }
    }
    Ok(all)
}

/// Compare the areas implied by `tags` against captured requirements.
///
/// Results are ordered by pattern. Unknown tags are ignored. When two tags
/// imply the same pattern the first one names the category.
pub fn check_coverage(storage: &Storage, tags: &[String]) -> Result<Vec<CategoryStatus>> {
    let mut expected: BTreeMap<&str, &str> = BTreeMap::new();
    for tag in tags {
        for pattern in patterns_for_tag(tag) {
            expected.entry(*pattern).or_insert(tag.as_str());
        }
    }

    let all = load_all(storage)?;
    let statuses = expected
        .into_iter()
        .map(|(pattern, tag)| {
            let segments = split_pattern(pattern);
            let paths: Vec<String> = all
                .keys()
                .filter(|path| match_pattern(&segments, path))
                .cloned()
                .collect();
            let done_count = paths.iter().filter(|p| all[p.as_str()].is_done()).count();
            CategoryStatus {
                category: tag.to_string(),
                pattern: pattern.to_string(),
                count: paths.len(),
                done_count,
                paths,
            }
        })
        .collect();
    Ok(statuses)
}

/// Split all requirements into done and pending.
pub fn check_implementation(storage: &Storage) -> Result<Implementation> {
    let mut result = Implementation::default();
    for (path, req) in load_all(storage)? {
        if req.is_done() {
            result.done.push(path);
        } else {
            result.pending.push(path);
        }
    }
    Ok(result)
}

/// Whether all requirements matching `pattern` are done.
///
/// A pattern that matches nothing counts as satisfied.
pub fn requirement_status(storage: &Storage, pattern: &str) -> Result<PatternStatus> {
    let segments = split_pattern(pattern);
    let pending: Vec<String> = load_all(storage)?
        .into_iter()
        .filter(|(path, req)| match_pattern(&segments, path) && !req.is_done())
        .map(|(path, _)| path)
        .collect();

    Ok(PatternStatus {
        all_done: pending.is_empty(),
        pending,
    })
}

/// Concrete prefixes a wildcard pattern resolves to among existing requirements.
///
/// `*/cli` with requirements `server/cli/flags` and `worker/cli` expands to
/// `server/cli` and `worker/cli`. A pattern without a wildcard is returned as is.
pub fn expand_wildcard_pattern(storage: &Storage, pattern: &str) -> Result<Vec<String>> {
    let segments = split_pattern(pattern);
    if !segments.contains(&WILDCARD) {
        return Ok(vec![pattern.to_string()]);
    }

    let mut prefixes = BTreeSet::new();
    for path in storage.list_requirements(&PathFilter::All)? {
        if match_pattern(&segments, &path) {
            let prefix: Vec<&str> = path.split('/').take(segments.len()).collect();
            prefixes.insert(prefix.join("/"));
        }
    }
    Ok(prefixes.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn seed(storage: &Storage) {
        for path in [
            "server/cli/flags",
            "server/api/routes",
            "worker/cli",
            "db/schema",
            "dbx/other",
        ] {
            storage.set_requirement(path, "something").unwrap();
        }
        storage.mark_requirement_done("server/cli/flags").unwrap();
        storage.mark_requirement_done("db/schema").unwrap();
    }

    #[test]
    fn test_patterns_for_tag() {
        assert_eq!(patterns_for_tag("cli"), &["*/cli"]);
        assert_eq!(patterns_for_tag("orm"), &["db"]);
        assert!(patterns_for_tag("logging").is_empty());
    }

    #[test]
    fn test_check_coverage() {
        let env = TestEnv::new();
        let storage = env.storage();
        seed(&storage);

        let statuses = check_coverage(
            &storage,
            &tags(&["cli", "sql", "orm", "templating", "logging"]),
        )
        .unwrap();

        let patterns: Vec<&str> = statuses.iter().map(|s| s.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["*/cli", "*/templates", "db"]);

        let cli = &statuses[0];
        assert_eq!(cli.category, "cli");
        assert_eq!(cli.paths, vec!["server/cli/flags", "worker/cli"]);
        assert_eq!(cli.count, 2);
        assert_eq!(cli.done_count, 1);

        let templates = &statuses[1];
        assert!(!templates.has_requirements());

        let db = &statuses[2];
        assert_eq!(db.category, "sql");
        assert_eq!(db.paths, vec!["db/schema"]);
        assert_eq!(db.done_count, 1);
    }

    #[test]
    fn test_check_coverage_empty_store() {
        let env = TestEnv::new();
        let statuses = check_coverage(&env.storage(), &tags(&["web"])).unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].count, 0);
    }

    #[test]
    fn test_check_implementation() {
        let env = TestEnv::new();
        let storage = env.storage();
        seed(&storage);

        let result = check_implementation(&storage).unwrap();
        assert_eq!(result.done, vec!["db/schema", "server/cli/flags"]);
        assert_eq!(
            result.pending,
            vec!["dbx/other", "server/api/routes", "worker/cli"]
        );
    }

    #[test]
    fn test_requirement_status() {
        let env = TestEnv::new();
        let storage = env.storage();
        seed(&storage);

        let status = requirement_status(&storage, "*/cli").unwrap();
        assert!(!status.all_done);
        assert_eq!(status.pending, vec!["worker/cli"]);

        assert!(requirement_status(&storage, "db").unwrap().all_done);

        let none = requirement_status(&storage, "codegen/wire").unwrap();
        assert!(none.all_done);
        assert!(none.pending.is_empty());
    }

    #[test]
    fn test_expand_wildcard_pattern() {
        let env = TestEnv::new();
        let storage = env.storage();
        seed(&storage);

        assert_eq!(
            expand_wildcard_pattern(&storage, "*/cli").unwrap(),
            vec!["server/cli", "worker/cli"]
        );
        assert_eq!(
            expand_wildcard_pattern(&storage, "db").unwrap(),
            vec!["db"]
        );
        assert!(expand_wildcard_pattern(&storage, "*/templates")
            .unwrap()
            .is_empty());
    }
}
