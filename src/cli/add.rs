//! Add command for Lockin.
//!
//! Defines a new concept. It starts unreviewed and is due immediately.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::ConceptInfo;
use crate::core::Concept;
use crate::error::{LockinError, Result};
use crate::storage::ConceptStore;

/// Options for the add command.
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Tags to attach.
    pub tags: Vec<String>,
    /// Parent concept ID.
    pub parent: Option<String>,
}

/// Output format for the add command.
#[derive(Debug, Clone, Serialize)]
pub struct AddOutput {
    /// Whether the concept was added.
    pub success: bool,
    /// The new concept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept: Option<ConceptInfo>,
    /// Error message if adding failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the failure was caused by the arguments.
    #[serde(skip)]
    pub invalid_input: bool,
}

impl AddOutput {
    /// Create a successful output.
    pub fn success(concept: ConceptInfo) -> Self {
        Self {
            success: true,
            concept: Some(concept),
            error: None,
            invalid_input: false,
        }
    }

    /// Create a failed output.
    pub fn failure(error: &LockinError) -> Self {
        Self {
            success: false,
            concept: None,
            error: Some(error.to_string()),
            invalid_input: error.is_invalid_input(),
        }
    }

    /// Create a failed output for rejected arguments.
    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            concept: None,
            error: Some(error.into()),
            invalid_input: true,
        }
    }
}

/// The add command implementation.
pub struct AddCommand<S: ConceptStore> {
    store: S,
}

impl<S: ConceptStore> AddCommand<S> {
    /// Create a new add command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Run the add command.
    pub fn run(
        &self,
        name: &str,
        content: &str,
        options: &AddOptions,
        now: DateTime<Utc>,
    ) -> AddOutput {
        let name = name.trim();
        if name.is_empty() {
            return AddOutput::rejected("concept name must not be empty");
        }

        match self.add(name, content, options, now) {
            Ok(concept) => AddOutput::success(ConceptInfo::from_concept(&concept, now)),
            Err(e) => AddOutput::failure(&e),
        }
    }

    fn add(
        &self,
        name: &str,
        content: &str,
        options: &AddOptions,
        now: DateTime<Utc>,
    ) -> Result<Concept> {
        let mut concept = Concept::new(name, content, now).with_tags(normalize_tags(&options.tags));

        if let Some(parent) = &options.parent {
            if !self.store.exists(parent)? {
                return Err(LockinError::concept_not_found(parent));
            }
            concept = concept.with_parent(parent);
        }

        self.store.put(&concept)?;
        tracing::debug!(concept_id = concept.id(), name, "concept added");

        Ok(concept)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &AddOutput, options: &AddOptions) -> String {
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
    fn format_human_readable(&self, output: &AddOutput) -> String {
        match (&output.concept, output.success) {
            (Some(concept), true) => {
                let mut text = format!("Added concept {} ({}).\n", concept.name, concept.id);
                if !concept.tags.is_empty() {
                    text.push_str(&format!("Tags: {}\n", concept.tags.join(", ")));
                }
                text.push_str("Due for its first review now.\n");
                text
            }
            _ => format!(
                "Add failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// Trim tags, drop empty ones and duplicates, keeping first occurrence order.
fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !result.iter().any(|t| t == tag) {
            result.push(tag.to_string());
        }
    }
    result
}
