//! Validated requirement file paths.
//!
//! A [`SafeReqPath`] can only be obtained through [`SafeReqPath::new`], which
//! checks the raw, user-supplied requirement path before anything touches the
//! filesystem. Callers re-validate on every operation instead of holding on
//! to a path across calls.

use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Extension of requirement documents on disk.
pub const REQUIREMENT_EXT: &str = "json";

/// A requirement file path proven to lie strictly inside the requirements directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeReqPath {
    logical: String,
    file: PathBuf,
}

impl SafeReqPath {
    /// Validate `req_path` against `base_dir`.
    ///
    /// The path is normalized lexically: `.` segments are dropped and `..`
    /// may only cancel a segment that came before it. Absolute paths, drive
    /// prefixes, empty paths and anything climbing above `base_dir` are rejected.
    pub fn new(base_dir: &Path, req_path: &str) -> Result<Self> {
        let invalid = || Error::InvalidPath(req_path.to_string());

        if req_path.trim().is_empty() || req_path.contains('\0') || req_path.contains('\\') {
            return Err(invalid());
        }

        let mut segments: Vec<&str> = Vec::new();
        for component in Path::new(req_path).components() {
            match component {
                Component::Normal(segment) => {
                    segments.push(segment.to_str().ok_or_else(invalid)?);
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    segments.pop().ok_or_else(invalid)?;
                }
                Component::RootDir | Component::Prefix(_) => return Err(invalid()),
            }
        }

        let Some((name, parents)) = segments.split_last() else {
            return Err(invalid());
        };

        let mut file = base_dir.to_path_buf();
        for segment in parents {
            file.push(segment);
        }
        file.push(format!("{}.{}", name, REQUIREMENT_EXT));

        // Must stay strictly below base_dir.
        if file.parent().is_none_or(|p| !p.starts_with(base_dir)) || file == base_dir {
            return Err(invalid());
        }

        Ok(Self {
            logical: segments.join("/"),
            file,
        })
    }

    /// Normalized logical path, segments joined with `/`.
    pub fn logical(&self) -> &str {
        &self.logical
    }

    /// Validated file path.
    pub fn path(&self) -> &Path {
        &self.file
    }
}
