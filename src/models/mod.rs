//! Data models for Ferry documents.
//!
//! This module defines the core data structures:
//! - `Migration` - Progress of one migration run through the prompt's steps
//! - `StepRecord` - Lifecycle state of a single step
//! - `Requirement` - A captured behavior that the migrated project must reproduce
//!
//! Step and requirement records keep their lifecycle fields private and only
//! change through transition methods. Persisted documents are validated on
//! load, so a record like `completed` without `completed_at` never reaches
//! the rest of the program.

pub mod prompts;

pub use prompts::Prompt;

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Schema tag written into every progress document.
pub const PROGRESS_VERSION: u32 = 1;

/// Step status in the migration workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    /// Terminal alternative to `Completed`; never entered by the workflow itself.
    Skipped,
}

impl StepStatus {
    /// Whether the step counts toward aggregate progress.
    pub fn is_done(self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Skipped)
    }

    /// Checkbox symbol used in status listings.
    pub fn symbol(self) -> &'static str {
        match self {
            StepStatus::Completed => "[x]",
            StepStatus::InProgress => "[>]",
            StepStatus::Skipped => "[-]",
            StepStatus::Pending => "[ ]",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::InProgress => "in_progress",
            StepStatus::Completed => "completed",
            StepStatus::Skipped => "skipped",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of a single step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StepRecordRepr", into = "StepRecordRepr")]
pub struct StepRecord {
    id: String,
    status: StepStatus,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    notes: Option<String>,
}

/// On-disk shape of a `StepRecord`.
#[derive(Serialize, Deserialize)]
struct StepRecordRepr {
    id: String,
    status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl TryFrom<StepRecordRepr> for StepRecord {
    type Error = String;

    fn try_from(repr: StepRecordRepr) -> std::result::Result<Self, Self::Error> {
        match repr.status {
            StepStatus::Pending if repr.started_at.is_some() || repr.completed_at.is_some() => {
                return Err(format!("pending step '{}' carries timestamps", repr.id));
            }
            StepStatus::InProgress if repr.started_at.is_none() => {
                return Err(format!("in-progress step '{}' has no started_at", repr.id));
            }
            StepStatus::Completed if repr.completed_at.is_none() => {
                return Err(format!("completed step '{}' has no completed_at", repr.id));
            }
            _ => {}
        }
        Ok(Self {
            id: repr.id,
            status: repr.status,
            started_at: repr.started_at,
            completed_at: repr.completed_at,
            notes: repr.notes.filter(|n| !n.is_empty()),
        })
    }
}

impl From<StepRecord> for StepRecordRepr {
    fn from(record: StepRecord) -> Self {
        Self {
            id: record.id,
            status: record.status,
            started_at: record.started_at,
            completed_at: record.completed_at,
            notes: record.notes,
        }
    }
}

impl StepRecord {
    /// Create a pending record for the given step.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: StepStatus::Pending,
            started_at: None,
            completed_at: None,
            notes: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> StepStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Move to `in_progress`, resetting the start time.
    ///
    /// A previously completed step keeps its stale `completed_at`.
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.status = StepStatus::InProgress;
        self.started_at = Some(now);
    }

    /// Move to `completed`. An empty note leaves any earlier note in place.
    pub fn complete(&mut self, now: DateTime<Utc>, notes: &str) {
        self.status = StepStatus::Completed;
        self.completed_at = Some(now);
        if !notes.is_empty() {
            self.notes = Some(notes.to_string());
        }
    }

    /// Mark the step as skipped.
    ///
    /// The workflow never calls this; it exists for tooling that edits
    /// progress directly.
    pub fn mark_skipped(&mut self) {
        self.status = StepStatus::Skipped;
    }
}

/// Progress of one migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    version: u32,
    started_at: DateTime<Utc>,
    project_path: String,
    current_step: String,
    steps: BTreeMap<String, StepRecord>,
    step_order: Vec<String>,
}

impl Migration {
    /// Create a migration with every step pending, positioned at the first step.
    pub fn new(project_path: impl Into<String>, step_order: Vec<String>) -> Self {
        let mut steps = BTreeMap::new();
        for id in &step_order {
            steps.insert(id.clone(), StepRecord::new(id.clone()));
        }

        Self {
            version: PROGRESS_VERSION,
            started_at: Utc::now(),
            project_path: project_path.into(),
            current_step: step_order.first().cloned().unwrap_or_default(),
            steps,
            step_order,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn project_path(&self) -> &str {
        &self.project_path
    }

    /// The step the operator is positioned at. Empty only if there are no steps.
    pub fn current_step(&self) -> &str {
        &self.current_step
    }

    pub fn step_order(&self) -> &[String] {
        &self.step_order
    }

    pub fn step(&self, id: &str) -> Option<&StepRecord> {
        self.steps.get(id)
    }

    /// Mutable access for direct manipulation outside the workflow transitions.
    pub fn step_mut(&mut self, id: &str) -> Option<&mut StepRecord> {
        self.steps.get_mut(id)
    }

    /// Step records in `step_order`, skipping ids without a record.
    pub fn ordered_steps(&self) -> impl Iterator<Item = &StepRecord> {
        self.step_order.iter().filter_map(|id| self.steps.get(id))
    }

    /// Mark a step as in progress and make it the current step.
    pub fn start_step(&mut self, id: &str) -> Result<()> {
        let step = self
            .steps
            .get_mut(id)
            .ok_or_else(|| Error::StepNotFound(id.to_string()))?;

        step.start(Utc::now());
        self.current_step = id.to_string();
        Ok(())
    }

    /// Mark a step as completed. Does not touch the current step.
    pub fn complete_step(&mut self, id: &str, notes: &str) -> Result<()> {
        let step = self
            .steps
            .get_mut(id)
            .ok_or_else(|| Error::StepNotFound(id.to_string()))?;

        step.complete(Utc::now(), notes);
        Ok(())
    }

    /// Count of completed-or-skipped steps and total steps.
    pub fn progress(&self) -> (usize, usize) {
        let done = self.steps.values().filter(|s| s.status.is_done()).count();
        (done, self.steps.len())
    }

    /// True if every step is completed or skipped.
    pub fn is_complete(&self) -> bool {
        let (done, total) = self.progress();
        done == total
    }

    /// First step in order that is not done yet.
    pub fn next_pending(&self) -> Option<&str> {
        self.ordered_steps()
            .find(|s| !s.status.is_done())
            .map(|s| s.id.as_str())
    }
}

/// A requirement captured during migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RequirementRepr", into = "RequirementRepr")]
pub struct Requirement {
    /// Logical path, e.g. `api/cli`
    pub path: String,

    /// Free-form description of the behavior to reproduce
    pub content: String,

    /// Step that was current when the requirement was written (may be empty)
    pub step: String,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    done_at: Option<DateTime<Utc>>,
}

/// On-disk shape of a `Requirement`.
#[derive(Serialize, Deserialize)]
struct RequirementRepr {
    path: String,
    content: String,
    #[serde(default)]
    step: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default)]
    done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    done_at: Option<DateTime<Utc>>,
}

impl TryFrom<RequirementRepr> for Requirement {
    type Error = String;

    fn try_from(repr: RequirementRepr) -> std::result::Result<Self, Self::Error> {
        if repr.done && repr.done_at.is_none() {
            return Err(format!("requirement '{}' is done without done_at", repr.path));
        }
        Ok(Self {
            path: repr.path,
            content: repr.content,
            step: repr.step,
            created_at: repr.created_at,
            updated_at: repr.updated_at,
            done_at: if repr.done { repr.done_at } else { None },
        })
    }
}

impl From<Requirement> for RequirementRepr {
    fn from(req: Requirement) -> Self {
        Self {
            done: req.done_at.is_some(),
            path: req.path,
            content: req.content,
            step: req.step,
            created_at: req.created_at,
            updated_at: req.updated_at,
            done_at: req.done_at,
        }
    }
}

impl Requirement {
    /// Create a new open requirement stamped with the current time.
    pub fn new(path: impl Into<String>, content: impl Into<String>, step: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            path: path.into(),
            content: content.into(),
            step: step.into(),
            created_at: now,
            updated_at: now,
            done_at: None,
        }
    }

    /// Replace this requirement with new content, keeping its creation time.
    ///
    /// Rewriting the content re-opens a requirement that was already done.
    pub fn rewrite(&mut self, content: impl Into<String>, step: impl Into<String>) {
        self.content = content.into();
        self.step = step.into();
        self.updated_at = Utc::now();
        self.done_at = None;
    }

    /// Mark as done, stamping `done_at` and `updated_at`.
    pub fn mark_done(&mut self) {
        let now = Utc::now();
        self.done_at = Some(now);
        self.updated_at = now;
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn done_at(&self) -> Option<DateTime<Utc>> {
        self.done_at
    }

    pub fn is_done(&self) -> bool {
        self.done_at.is_some()
    }
}
