//! The migration step workflow.
//!
//! [`Workflow`] ties a parsed [`Prompt`] to the progress stored for a
//! project: it loads (or initializes) progress, applies one transition,
//! persists, and renders the text the operator should act on next.

use super::{Output, json};
use crate::models::prompts::Prompt;
use crate::models::{Migration, StepStatus};
use crate::storage::Storage;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Command used when printing the bootstrap instruction.
pub const MIGRATE_COMMAND: &str = "ferry migrate";

/// Orchestrates one migration action against a project.
pub struct Workflow<'a> {
    storage: &'a Storage,
    prompt: &'a Prompt,
}

impl<'a> Workflow<'a> {
    pub fn new(storage: &'a Storage, prompt: &'a Prompt) -> Self {
        Self { storage, prompt }
    }

    /// Load progress, creating and saving it from the prompt's steps if absent.
    fn load_or_init(&self) -> Result<Migration> {
        if let Some(migration) = self.storage.load_progress()? {
            return Ok(migration);
        }

        let migration = Migration::new(
            self.storage.root().display().to_string(),
            self.prompt.steps(),
        );
        self.storage.save_progress(&migration)?;
        tracing::info!(steps = migration.step_order().len(), "initialized migration progress");
        Ok(migration)
    }

    fn prompt_step(&self, id: &str) -> Result<&'a str> {
        self.prompt
            .step(id)
            .ok_or_else(|| Error::StepNotFound(id.to_string()))
    }

    /// Show a step's content, or the introduction when no step is given.
    ///
    /// Without an introduction the first step is shown instead.
    pub fn show(&self, step: Option<&str>) -> Result<StepContent> {
        self.load_or_init()?;

        let id = match step {
            Some(id) => id,
            None if !self.prompt.introduction().is_empty() => {
                return Ok(StepContent {
                    step: None,
                    content: self.prompt.introduction().to_string(),
                });
            }
            None => self.prompt.first_step(),
        };

        Ok(StepContent {
            step: Some(id.to_string()),
            content: self.prompt_step(id)?.to_string(),
        })
    }

    /// Mark a step in progress and render it wrapped in the Before/After text.
    pub fn start(&self, id: &str) -> Result<StepContent> {
        let mut migration = self.load_or_init()?;
        let content = self.prompt_step(id)?;

        migration.start_step(id)?;
        self.storage.save_progress(&migration)?;
        tracing::info!(step = id, "started step");

        let parts = [self.prompt.before(), content, self.prompt.after()];
        let rendered: Vec<&str> = parts.into_iter().filter(|p| !p.is_empty()).collect();
        Ok(StepContent {
            step: Some(id.to_string()),
            content: rendered.join("\n\n"),
        })
    }

    /// Mark a step completed, optionally recording a note.
    pub fn finish(&self, id: &str, note: &str) -> Result<FinishResult> {
        let mut migration = self.load_or_init()?;
        migration.complete_step(id, note)?;
        self.storage.save_progress(&migration)?;
        tracing::info!(step = id, "completed step");

        let (completed, total) = migration.progress();
        Ok(FinishResult {
            step: id.to_string(),
            completed,
            total,
            next_step: migration.next_pending().map(str::to_string),
        })
    }

    /// Aggregate progress across all steps.
    pub fn status(&self) -> Result<StatusResult> {
        let migration = self.load_or_init()?;
        Ok(StatusResult::from_migration(&migration))
    }

    /// Delete all progress. Nothing else is touched.
    pub fn reset(&self) -> Result<ResetResult> {
        let existed = self.storage.progress_exists();
        self.storage.delete_progress()?;
        tracing::info!(existed, "reset migration progress");
        Ok(ResetResult { existed })
    }

    /// The one-line instruction that starts an agent on this workflow.
    pub fn bootstrap(&self) -> BootstrapResult {
        BootstrapResult {
            instruction: self.prompt.bootstrap(MIGRATE_COMMAND),
        }
    }
}

/// Rendered text of a step or the introduction.
#[derive(Debug, Serialize)]
pub struct StepContent {
    /// Step id, or `None` for the introduction
    pub step: Option<String>,
    pub content: String,
}

impl Output for StepContent {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        self.content.clone()
    }
}

#[derive(Debug, Serialize)]
pub struct FinishResult {
    pub step: String,
    pub completed: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
}

impl Output for FinishResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        format!("Completed step {}", self.step)
    }
}

/// Per-step line in the status report.
#[derive(Debug, Serialize)]
pub struct StepSummary {
    pub id: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResult {
    pub completed: usize,
    pub total: usize,
    pub is_complete: bool,
    pub current_step: String,
    pub started_at: DateTime<Utc>,
    pub steps: Vec<StepSummary>,
}

impl StatusResult {
    fn from_migration(migration: &Migration) -> Self {
        let (completed, total) = migration.progress();
        let steps = migration
            .ordered_steps()
            .map(|record| StepSummary {
                id: record.id().to_string(),
                status: record.status(),
                started_at: record.started_at(),
                completed_at: record.completed_at(),
                notes: record.notes().map(str::to_string),
            })
            .collect();

        Self {
            completed,
            total,
            is_complete: migration.is_complete(),
            current_step: migration.current_step().to_string(),
            started_at: migration.started_at(),
            steps,
        }
    }
}

impl Output for StatusResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Migration Progress: {}/{} steps", self.completed, self.total),
            format!(
                "Current step: {}",
                if self.current_step.is_empty() {
                    "(none)"
                } else {
                    self.current_step.as_str()
                }
            ),
            format!("Started: {}", self.started_at.format("%Y-%m-%d %H:%M:%S")),
            String::new(),
        ];

        for step in &self.steps {
            let mut line = format!("  {} Step {}", step.status.symbol(), step.id);
            if step.status == StepStatus::Completed
                && let Some(at) = step.completed_at
            {
                line.push_str(&format!(" (completed {})", at.format("%b %-d %H:%M")));
            }
            lines.push(line);
            if let Some(ref note) = step.notes {
                lines.push(format!("      Note: {}", note));
            }
        }

        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct ResetResult {
    /// Whether there was any progress to delete
    pub existed: bool,
}

impl Output for ResetResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        "Migration progress reset.".to_string()
    }
}

#[derive(Debug, Serialize)]
pub struct BootstrapResult {
    pub instruction: String,
}

impl Output for BootstrapResult {
    fn to_json(&self) -> String {
        json(self)
    }

    fn to_human(&self) -> String {
        self.instruction.clone()
    }
}
