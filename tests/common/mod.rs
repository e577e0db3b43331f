//! Common test utilities for ferry integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't read or
//! write the user's `~/.config/ferry/` directory.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// A test environment with an isolated project and config directory.
///
/// Each `TestEnv` creates two temporary directories:
/// - `repo_dir`: Acts as the project root (the command's working directory)
/// - `config_dir`: Holds the system config (via `FERRY_CONFIG_DIR`)
///
/// The `ferry()` method sets both per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub repo_dir: TempDir,
    pub config_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            repo_dir: TempDir::new().unwrap(),
            config_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the ferry binary running inside the project.
    pub fn ferry(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_ferry"));
        cmd.current_dir(self.repo_dir.path());
        cmd.env("FERRY_CONFIG_DIR", self.config_dir.path());
        cmd.env_remove("FERRY_REPO");
        cmd.env_remove("FERRY_LOG");
        cmd
    }

    /// Get the path to the project directory.
    pub fn path(&self) -> &Path {
        self.repo_dir.path()
    }

    /// Get the path to the system config directory.
    pub fn config_path(&self) -> &Path {
        self.config_dir.path()
    }

    /// Write a file relative to the project root, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Read a file relative to the project root.
    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path().join(rel)).unwrap()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a command's stdout as JSON.
pub fn parse_json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}

/// A small go.mod with mapped, unmapped and indirect dependencies.
pub const GO_MOD: &str = "\
module github.com/example/app

go 1.22

require (
\tgithub.com/spf13/cobra v1.8.0
\tgithub.com/gin-gonic/gin v1.9.1
\tgithub.com/example/internal-lib v0.3.0
\tgolang.org/x/sys v0.15.0 // indirect
)
";
