//! Configuration for Ferry.
//!
//! Preferences live in `config.kdl` files at two levels:
//!
//! - System: `~/.config/ferry/config.kdl` (or `$FERRY_CONFIG_DIR/config.kdl`)
//! - Project: `<root>/.ferry/config.kdl`
//!
//! Keys:
//! - `output-format` - "human" or "json"
//! - `prompt` - custom migration prompt document
//! - `library-data` - custom library equivalence data
//! - `target-language` - language to look up equivalents in
//! - `include-unsafe` - offer libraries flagged as unsafe
//!
//! For precedence, see the [`resolver`] module.

pub mod resolver;
pub mod schema;

pub use resolver::{
    ConfigOverrides, DEFAULT_TARGET_LANGUAGE, Resolved, ResolvedConfig, ValueSource,
    resolve_config,
};
pub use schema::{FerryConfig, KEYS, OutputFormat};

use crate::storage::{CONFIG_FILE, Storage, write_atomic};
use crate::{Error, Result};
use kdl::KdlDocument;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable overriding the system config directory.
pub const CONFIG_DIR_ENV: &str = "FERRY_CONFIG_DIR";

/// Locations of the config files taking part in resolution.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Project-level config.kdl
    pub project: PathBuf,
    /// System-level config.kdl, if a config directory is known
    pub system: Option<PathBuf>,
}

impl ConfigPaths {
    /// Paths for a project, with the system config located from the environment.
    pub fn for_storage(storage: &Storage) -> Self {
        Self {
            project: storage.config_path(),
            system: system_config_dir().map(|dir| dir.join(CONFIG_FILE)),
        }
    }
}

/// System config directory: `$FERRY_CONFIG_DIR`, else the platform config dir.
pub fn system_config_dir() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::config_dir().map(|d| d.join("ferry")),
    }
}

/// Read a config.kdl. A missing file is an empty config.
pub fn read_config(path: &Path) -> Result<FerryConfig> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(FerryConfig::default()),
        Err(source) => {
            return Err(Error::Storage {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let doc: KdlDocument = text
        .parse()
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    let config = FerryConfig::from_kdl(&doc);
    config
        .validate()
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(config)
}

/// Atomically write a config.kdl.
pub fn write_config(path: &Path, config: &FerryConfig) -> Result<()> {
    write_atomic(path, config.to_kdl().to_string().as_bytes())
}

/// Set one key in the project config and write it back.
pub fn set_project_value(storage: &Storage, key: &str, value: &str) -> Result<FerryConfig> {
    let path = storage.config_path();
    let mut config = read_config(&path)?;
    config.set(key, value).map_err(Error::InvalidInput)?;
    write_config(&path, &config)?;
    tracing::info!(key, value, "updated project config");
    Ok(config)
}
