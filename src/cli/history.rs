//! History command for Lockin.
//!
//! Shows a concept's reviews in the order they happened.

use serde::Serialize;

use crate::cli::{format_days, ReviewInfo};
use crate::error::{LockinError, Result};
use crate::storage::ConceptStore;

/// Options for the history command.
#[derive(Debug, Clone, Default)]
pub struct HistoryOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Show only the most recent reviews.
    pub limit: Option<usize>,
}

/// Output format for the history command.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryOutput {
    /// Whether the history was loaded.
    pub success: bool,
    /// Concept ID.
    pub concept_id: String,
    /// Concept name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Total number of reviews.
    pub total: usize,
    /// Reviews, oldest first.
    pub reviews: Vec<ReviewInfo>,
    /// Error message if loading failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the failure was caused by the arguments.
    #[serde(skip)]
    pub invalid_input: bool,
}

impl HistoryOutput {
    /// Create a successful output.
    pub fn success(
        concept_id: impl Into<String>,
        name: impl Into<String>,
        total: usize,
        reviews: Vec<ReviewInfo>,
    ) -> Self {
        Self {
            success: true,
            concept_id: concept_id.into(),
            name: name.into(),
            total,
            reviews,
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
            total: 0,
            reviews: Vec::new(),
            error: Some(error.to_string()),
            invalid_input: error.is_invalid_input(),
        }
    }
}

/// The history command implementation.
pub struct HistoryCommand<S: ConceptStore> {
    store: S,
}

impl<S: ConceptStore> HistoryCommand<S> {
    /// Create a new history command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Run the history command.
    pub fn run(&self, concept_id: &str, options: &HistoryOptions) -> HistoryOutput {
        match self.load(concept_id, options) {
            Ok(output) => output,
            Err(e) => HistoryOutput::failure(concept_id, &e),
        }
    }

    fn load(&self, concept_id: &str, options: &HistoryOptions) -> Result<HistoryOutput> {
        let concept = self
            .store
            .get(concept_id)?
            .ok_or_else(|| LockinError::concept_not_found(concept_id))?;
        let history = self.store.history(concept_id)?;

        let skip = options
            .limit
            .map(|limit| history.len().saturating_sub(limit))
            .unwrap_or(0);
        let reviews: Vec<ReviewInfo> = history.iter().skip(skip).map(ReviewInfo::from).collect();

        Ok(HistoryOutput::success(
            concept_id,
            concept.name,
            history.len(),
            reviews,
        ))
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &HistoryOutput, options: &HistoryOptions) -> String {
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
    fn format_human_readable(&self, output: &HistoryOutput) -> String {
        if !output.success {
            return format!(
                "History failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        if output.reviews.is_empty() {
            return format!("{} has not been reviewed yet.\n", output.name);
        }

        let mut lines = vec![format!(
            "{} review(s) of {}:\n",
            output.total, output.name
        )];
        for review in &output.reviews {
            lines.push(format!(
                "{}  grade {} ({})  -> {} day(s)",
                review.reviewed_at,
                review.grade,
                review.grade_name,
                format_days(review.interval_days)
            ));
        }

        lines.join("\n") + "\n"
    }
}
