//! Review command for Lockin.
//!
//! Grades one recall of a concept, reschedules it, and stores the new
//! state together with the review record.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::{format_days, format_timestamp};
use crate::config::Config;
use crate::core::Concept;
use crate::error::{LockinError, Result};
use crate::scheduling::{ReviewOutcome, Scheduler};
use crate::storage::ConceptStore;

/// Options for the review command.
#[derive(Debug, Clone, Default)]
pub struct ReviewOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the review command.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutput {
    /// Whether the review was recorded.
    pub success: bool,
    /// Concept ID.
    pub concept_id: String,
    /// Concept name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Submitted grade.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<u8>,
    /// Mastery before the review.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_mastery: Option<f64>,
    /// Mastery after the review.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mastery_level: Option<f64>,
    /// New interval in days.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_days: Option<f64>,
    /// Next review time (RFC 3339).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_review_at: Option<String>,
    /// Review record ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_id: Option<String>,
    /// Error message if the review failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the failure was caused by the arguments.
    #[serde(skip)]
    pub invalid_input: bool,
}

impl ReviewOutput {
    /// Create a successful output.
    pub fn success(concept: &Concept, outcome: &ReviewOutcome) -> Self {
        Self {
            success: true,
            concept_id: concept.id().to_string(),
            name: concept.name.clone(),
            grade: Some(outcome.record.recall_grade.value()),
            previous_mastery: Some(concept.state.mastery_level),
            mastery_level: Some(outcome.state.mastery_level),
            interval_days: Some(outcome.state.last_interval_days),
            next_review_at: outcome.state.next_review_at.map(format_timestamp),
            review_id: Some(outcome.record.id.clone()),
            error: None,
            invalid_input: false,
        }
    }

    /// Create a failed output.
    pub fn failure(concept_id: impl Into<String>, error: &LockinError) -> Self {
        Self {
            success: false,
            concept_id: concept_id.into(),
            name: String::new(),
            grade: None,
            previous_mastery: None,
            mastery_level: None,
            interval_days: None,
            next_review_at: None,
            review_id: None,
            error: Some(error.to_string()),
            invalid_input: error.is_invalid_input(),
        }
    }
}

/// The review command implementation.
pub struct ReviewCommand<S: ConceptStore> {
    store: S,
    scheduler: Scheduler,
}

impl<S: ConceptStore> ReviewCommand<S> {
    /// Create a new review command with policies tuned by `config`.
    pub fn new(store: S, config: Config) -> Self {
        Self {
            store,
            scheduler: Scheduler::from_config(&config.scheduling),
        }
    }

    /// Run the review command.
    pub fn run(
        &self,
        concept_id: &str,
        grade: i64,
        _options: &ReviewOptions,
        now: DateTime<Utc>,
    ) -> ReviewOutput {
        match self.review(concept_id, grade, now) {
            Ok((concept, outcome)) => ReviewOutput::success(&concept, &outcome),
            Err(e) => ReviewOutput::failure(concept_id, &e),
        }
    }

    fn review(
        &self,
        concept_id: &str,
        grade: i64,
        now: DateTime<Utc>,
    ) -> Result<(Concept, ReviewOutcome)> {
        let concept = self
            .store
            .get(concept_id)?
            .ok_or_else(|| LockinError::concept_not_found(concept_id))?;
        let history = self.store.history(concept_id)?;

        let outcome =
            self.scheduler
                .record_review_with_history(&concept.state, &history, grade, now)?;

        self.store
            .commit_review(&concept.state, &outcome.state, &outcome.record)?;

        Ok((concept, outcome))
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ReviewOutput, options: &ReviewOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    /// Format output as human-readable text.
    fn format_human_readable(&self, output: &ReviewOutput) -> String {
        if !output.success {
            return format!(
                "Review failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut lines = vec![format!(
            "Reviewed {} with grade {}.",
            output.name,
            output.grade.unwrap_or_default()
        )];
        if let (Some(before), Some(after)) = (output.previous_mastery, output.mastery_level) {
            lines.push(format!(
                "Mastery: {:.0}% -> {:.0}%",
                before * 100.0,
                after * 100.0
            ));
        }
        if let Some(days) = output.interval_days {
            lines.push(format!(
                "Next review in {} day(s), at {}.",
                format_days(days),
                output.next_review_at.as_deref().unwrap_or("-")
            ));
        }

        lines.join("\n") + "\n"
    }
}
