//! Due command for Lockin.
//!
//! Shows the concepts due for review at the command's clock, and when the
//! next one comes due if nothing is due now.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::{format_timestamp, ConceptInfo};
use crate::error::{LockinError, Result};
use crate::scheduling::{due_concepts, next_due_at};
use crate::storage::ConceptStore;

/// Options for the due command.
#[derive(Debug, Clone, Default)]
pub struct DueOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Maximum number of concepts to show.
    pub limit: Option<usize>,
}

/// Output format for the due command.
#[derive(Debug, Clone, Serialize)]
pub struct DueOutput {
    /// Whether the query succeeded.
    pub success: bool,
    /// Query time (RFC 3339).
    pub as_of: String,
    /// Number of concepts shown.
    pub count: usize,
    /// Number of concepts due, before the limit.
    pub total_due: usize,
    /// The due concepts, newest first.
    pub concepts: Vec<ConceptInfo>,
    /// Earliest future review (RFC 3339), if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_due_at: Option<String>,
    /// Error message if the query failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the failure was caused by the arguments.
    #[serde(skip)]
    pub invalid_input: bool,
}

impl DueOutput {
    /// Create a successful output.
    pub fn success(
        as_of: DateTime<Utc>,
        concepts: Vec<ConceptInfo>,
        total_due: usize,
        next_due_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            success: true,
            as_of: format_timestamp(as_of),
            count: concepts.len(),
            total_due,
            concepts,
            next_due_at: next_due_at.map(format_timestamp),
            error: None,
            invalid_input: false,
        }
    }

    /// Create a failed output.
    pub fn failure(as_of: DateTime<Utc>, error: &LockinError) -> Self {
        Self {
            success: false,
            as_of: format_timestamp(as_of),
            count: 0,
            total_due: 0,
            concepts: Vec::new(),
            next_due_at: None,
            error: Some(error.to_string()),
            invalid_input: error.is_invalid_input(),
        }
    }
}

/// The due command implementation.
pub struct DueCommand<S: ConceptStore> {
    store: S,
}

impl<S: ConceptStore> DueCommand<S> {
    /// Create a new due command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Run the due command.
    pub fn run(&self, options: &DueOptions, now: DateTime<Utc>) -> DueOutput {
        match self.query(options, now) {
            Ok(output) => output,
            Err(e) => DueOutput::failure(now, &e),
        }
    }

    fn query(&self, options: &DueOptions, now: DateTime<Utc>) -> Result<DueOutput> {
        let concepts = self.store.list_all()?;

        let due = due_concepts(&concepts, now);
        let total_due = due.clone().count();
        let shown: Vec<ConceptInfo> = due
            .take(options.limit.unwrap_or(usize::MAX))
            .map(|c| ConceptInfo::from_concept(c, now))
            .collect();

        Ok(DueOutput::success(
            now,
            shown,
            total_due,
            next_due_at(&concepts, now),
        ))
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &DueOutput, options: &DueOptions) -> String {
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
    fn format_human_readable(&self, output: &DueOutput) -> String {
        if !output.success {
            return format!(
                "Due query failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        if output.concepts.is_empty() {
            return match &output.next_due_at {
                Some(next) => format!("Nothing due. Next review at {}.\n", next),
                None => "Nothing due.\n".to_string(),
            };
        }

        let mut lines = Vec::new();
        if output.count < output.total_due {
            lines.push(format!(
                "{} concept(s) due, showing {}:\n",
                output.total_due, output.count
            ));
        } else {
            lines.push(format!("{} concept(s) due:\n", output.total_due));
        }

        for (i, concept) in output.concepts.iter().enumerate() {
            let status = if concept.next_review_at.is_some() {
                format!("mastery {:.0}%", concept.mastery_level * 100.0)
            } else {
                "new".to_string()
            };
            lines.push(format!(
                "{}. {} ({})\n   {}",
                i + 1,
                concept.name,
                status,
                concept.id
            ));
        }

        lines.join("\n") + "\n"
    }
}
