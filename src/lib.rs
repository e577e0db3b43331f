//! Ferry - A guided migration tracker for AI agents and humans.
//!
//! This library provides the core functionality for the `ferry` CLI tool:
//! a step-by-step migration workflow with durable progress, a store of
//! hierarchical requirement documents, and library-equivalence lookups
//! for moving a Go project to Rust.

pub mod cli;
pub mod commands;
pub mod config;
pub mod libraries;
pub mod manifest;
pub mod models;
pub mod storage;
pub mod verify;

use std::path::PathBuf;

/// Test utilities for isolated test environments.
#[cfg(test)]
pub(crate) mod test_utils {
    use std::path::Path;
    use tempfile::TempDir;

    use crate::storage::Storage;

    /// Test environment with an isolated project directory.
    pub struct TestEnv {
        /// Simulated project directory
        pub repo_dir: TempDir,
    }

    impl TestEnv {
        /// Create a new test environment with an empty project directory.
        pub fn new() -> Self {
            Self {
                repo_dir: TempDir::new().unwrap(),
            }
        }

        /// Get the path to the simulated project.
        pub fn path(&self) -> &Path {
            self.repo_dir.path()
        }

        /// Open storage rooted at this test environment.
        pub fn storage(&self) -> Storage {
            Storage::new(self.path())
        }
    }

    impl Default for TestEnv {
        fn default() -> Self {
            Self::new()
        }
    }
}

/// Library-level error type for Ferry operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to access {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt document {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No steps found")]
    NoStepsFound,

    #[error("Step '{0}' not found")]
    StepNotFound(String),

    #[error(
        "Requirement '{0}' not found\nHint: Requirements are stored in .ferry/ - are you in the correct project directory?"
    )]
    RequirementNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported progress version {0}: upgrade ferry to continue this migration")]
    UnsupportedVersion(u32),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias for Ferry operations.
pub type Result<T> = std::result::Result<T, Error>;
