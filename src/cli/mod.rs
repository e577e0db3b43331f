//! CLI argument definitions for Ferry.

use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

/// Ferry - A guided Go to Rust migration tracker for AI agents and humans.
///
/// Start with `ferry migrate` to read the introduction, then work through
/// the steps with `ferry migrate --start <step>` and `--finish <step>`.
#[derive(Parser, Debug)]
#[command(name = "ferry")]
#[command(author, version = crate::cli::VERSION, about = "Guided Go to Rust migration tracker", long_about = None)]
pub struct Cli {
    /// Output JSON instead of human-readable text
    #[arg(long, global = true)]
    pub json: bool,

    /// Run as if ferry was started in <path> instead of the current directory.
    /// Can also be set via FERRY_REPO environment variable.
    #[arg(short = 'C', long = "repo", global = true, env = "FERRY_REPO")]
    pub repo_path: Option<PathBuf>,

    /// Enable debug logging on stderr (FERRY_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use a custom migration prompt document
    #[arg(long, global = true, value_name = "FILE")]
    pub prompt: Option<PathBuf>,

    /// Use a custom library equivalence data file
    #[arg(long = "library-data", global = true, value_name = "FILE")]
    pub library_data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Version string including the commit and build time stamped by build.rs.
pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("FERRY_GIT_COMMIT"),
    " ",
    env!("FERRY_BUILD_TIMESTAMP"),
    ")"
);

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Walk through the migration steps (start here!)
    ///
    /// With no arguments, shows the introduction. With a step ID, shows
    /// that step's instructions without changing progress.
    #[command(group(
        ArgGroup::new("action")
            .args(["start", "finish", "status", "reset", "bootstrap"])
    ))]
    Migrate {
        /// Step to show (e.g., "Step 1")
        #[arg(conflicts_with = "action")]
        step: Option<String>,

        /// Mark a step in progress and show its instructions
        #[arg(long, value_name = "STEP")]
        start: Option<String>,

        /// Mark a step completed
        #[arg(long, value_name = "STEP")]
        finish: Option<String>,

        /// Note to record with --finish
        #[arg(long, requires = "finish")]
        note: Option<String>,

        /// Show progress through all steps
        #[arg(long)]
        status: bool,

        /// Delete all migration progress
        #[arg(long)]
        reset: bool,

        /// Print the one-line instruction that kicks off an agent
        #[arg(long)]
        bootstrap: bool,
    },

    /// Requirement documents captured during the migration
    Req {
        #[command(subcommand)]
        command: ReqCommands,
    },

    /// Find equivalents of a library in another language
    Lookup {
        /// Library repository URL (e.g., https://github.com/spf13/cobra)
        url: String,

        /// Target language (defaults to the configured target-language)
        lang: Option<String>,

        /// Include libraries flagged as unsafe or unmaintained
        #[arg(long = "unsafe")]
        include_unsafe: bool,
    },

    /// Show equivalents for every direct dependency in a go.mod
    Scan {
        /// Path to go.mod
        go_mod: PathBuf,

        /// Include libraries flagged as unsafe or unmaintained
        #[arg(long = "unsafe")]
        include_unsafe: bool,
    },

    /// Generate a Cargo.toml from a go.mod
    Convert {
        /// Path to go.mod
        go_mod: PathBuf,

        /// Write to this file (relative to the current directory) instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Include libraries flagged as unsafe or unmaintained
        #[arg(long = "unsafe")]
        include_unsafe: bool,
    },

    /// List the project tags implied by a go.mod (cli, web, sql, ...)
    Analyze {
        /// Path to go.mod
        go_mod: PathBuf,
    },

    /// Check requirement completion and coverage
    Verify {
        /// go.mod whose dependencies determine the expected requirement areas
        #[arg(long, value_name = "GO_MOD")]
        manifest: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

impl Commands {
    /// Target language given on the command line, if any.
    pub fn target_language(&self) -> Option<&str> {
        match self {
            Commands::Lookup { lang, .. } => lang.as_deref(),
            _ => None,
        }
    }

    /// Whether `--unsafe` was passed.
    pub fn include_unsafe(&self) -> bool {
        match self {
            Commands::Lookup { include_unsafe, .. }
            | Commands::Scan { include_unsafe, .. }
            | Commands::Convert { include_unsafe, .. } => *include_unsafe,
            _ => false,
        }
    }
}

/// Requirement subcommands
#[derive(Subcommand, Debug)]
pub enum ReqCommands {
    /// Create or replace a requirement (re-opens it if it was done)
    Set {
        /// Requirement path (e.g., server/cli/flags)
        path: String,

        /// Requirement text; read from stdin when omitted
        content: Option<String>,
    },

    /// Print a requirement
    Get {
        /// Requirement path
        path: String,
    },

    /// List requirements
    List {
        /// Path prefix or pattern with `*` segments (e.g., "*/cli")
        #[arg(default_value = "")]
        filter: String,
    },

    /// Mark a requirement as implemented
    Done {
        /// Requirement path
        path: String,
    },

    /// Delete a requirement
    #[command(visible_alias = "rm")]
    Delete {
        /// Requirement path
        path: String,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show every setting with its value and source
    Show,

    /// Set a value in the project config (.ferry/config.kdl)
    Set {
        /// Key (output-format, prompt, library-data, target-language, include-unsafe)
        key: String,

        /// Value
        value: String,
    },
}
