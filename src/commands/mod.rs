//! Command implementations for the Ferry CLI.
//!
//! Each command returns a result struct that can be rendered as JSON or as
//! human-readable text. Commands are grouped by area:
//! - `workflow` - the migration step workflow (`ferry migrate`)
//! - `requirements` - requirement documents (`ferry req`)
//! - `libraries` - library lookups and go.mod conversion
//! - `verify` - requirement coverage (`ferry verify`)
//! - `config` - configuration (`ferry config`)

pub mod config;
pub mod libraries;
pub mod requirements;
pub mod verify;
pub mod workflow;

pub use config::{ConfigSetResult, ConfigShowResult, config_set, config_show};
pub use libraries::{
    AnalyzeResult, ConvertResult, LookupResult, ScanResult, analyze, convert, lookup, scan,
};
pub use requirements::{
    ReqDeleteResult, ReqDoneResult, ReqGetResult, ReqListResult, ReqSetResult, req_delete,
    req_done, req_get, req_list, req_set,
};
pub use verify::{VerifyResult, verify};
pub use workflow::{
    BootstrapResult, FinishResult, ResetResult, StatusResult, StepContent, Workflow,
};

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

/// Serialize a result struct, falling back to an error object.
pub(crate) fn json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
}
