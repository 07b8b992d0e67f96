//! List command for Lockin.
//!
//! Lists concepts, most recently created first.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::{format_days, ConceptInfo};
use crate::error::LockinError;
use crate::storage::ConceptStore;

/// Options for the list command.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

/// Output format for the list command.
#[derive(Debug, Clone, Serialize)]
pub struct ListOutput {
    /// Whether the list was successful.
    pub success: bool,
    /// Number of concepts.
    pub count: usize,
    /// Number of listed concepts that are due.
    pub due_count: usize,
    /// The concepts.
    pub concepts: Vec<ConceptInfo>,
    /// Error message if listing failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the failure was caused by the arguments.
    #[serde(skip)]
    pub invalid_input: bool,
}

impl ListOutput {
    /// Create a successful output.
    pub fn success(concepts: Vec<ConceptInfo>) -> Self {
        Self {
            success: true,
            count: concepts.len(),
            due_count: concepts.iter().filter(|c| c.due).count(),
            concepts,
            error: None,
            invalid_input: false,
        }
    }

    /// Create a failed output.
    pub fn failure(error: &LockinError) -> Self {
        Self {
            success: false,
            count: 0,
            due_count: 0,
            concepts: Vec::new(),
            error: Some(error.to_string()),
            invalid_input: error.is_invalid_input(),
        }
    }
}

/// The list command implementation.
pub struct ListCommand<S: ConceptStore> {
    store: S,
}

impl<S: ConceptStore> ListCommand<S> {
    /// Create a new list command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Run the list command.
    pub fn run(&self, options: &ListOptions, now: DateTime<Utc>) -> ListOutput {
        let limit = options.limit.unwrap_or(usize::MAX);
        match self.store.list(limit) {
            Ok(concepts) => ListOutput::success(
                concepts
                    .iter()
                    .map(|c| ConceptInfo::from_concept(c, now))
                    .collect(),
            ),
            Err(e) => ListOutput::failure(&e),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ListOutput, options: &ListOptions) -> String {
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
    fn format_human_readable(&self, output: &ListOutput) -> String {
        if !output.success {
            return format!(
                "List failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        if output.concepts.is_empty() {
            return "No concepts found.\n".to_string();
        }

        let mut lines = vec![format!(
            "Found {} concept(s), {} due:\n",
            output.count, output.due_count
        )];

        for (i, concept) in output.concepts.iter().enumerate() {
            let due_marker = if concept.due { " [due]" } else { "" };
            let tags = if concept.tags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", concept.tags.join(", "))
            };
            let schedule = match &concept.next_review_at {
                Some(next) => format!(
                    "mastery {:.0}%, interval {} day(s), next {}",
                    concept.mastery_level * 100.0,
                    format_days(concept.last_interval_days),
                    next
                ),
                None => "never reviewed".to_string(),
            };

            lines.push(format!(
                "{}. {}{}{}\n   {} | created {} | {}",
                i + 1,
                concept.name,
                tags,
                due_marker,
                concept.id,
                concept.created,
                schedule
            ));
        }

        lines.join("\n") + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Concept, ConceptState};
    use crate::storage::MemoryConceptStore;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn setup() -> Arc<MemoryConceptStore> {
        let store = Arc::new(MemoryConceptStore::new());
        for i in 0..5 {
            let concept = Concept::new(format!("concept-{i}"), "", t0() + Duration::days(i))
                .with_id(format!("c{i}"));
            store.put(&concept).unwrap();
        }
        store
    }

    #[test]
    fn test_list_newest_first() {
        let cmd = ListCommand::new(setup());
        let output = cmd.run(&ListOptions::default(), t0());

        assert!(output.success);
        assert_eq!(output.count, 5);
        let ids: Vec<&str> = output.concepts.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c4", "c3", "c2", "c1", "c0"]);
    }

    #[test]
    fn test_list_limit() {
        let cmd = ListCommand::new(setup());
        let options = ListOptions {
            limit: Some(2),
            ..Default::default()
        };
        let output = cmd.run(&options, t0());
        assert_eq!(output.count, 2);
        assert_eq!(output.concepts[0].id, "c4");
    }

    #[test]
    fn test_list_due_count() {
        let store = setup();
        let reviewed = Concept::new("reviewed", "", t0())
            .with_id("r")
            .with_state(ConceptState {
                last_interval_days: 4.0,
                next_review_at: Some(t0() + Duration::days(4)),
                ..ConceptState::new("r")
            });
        store.put(&reviewed).unwrap();

        let output = ListCommand::new(store).run(&ListOptions::default(), t0());
        assert_eq!(output.count, 6);
        assert_eq!(output.due_count, 5);
    }

    #[test]
    fn test_list_empty() {
        let cmd = ListCommand::new(Arc::new(MemoryConceptStore::new()));
        let output = cmd.run(&ListOptions::default(), t0());

        assert!(output.success);
        assert_eq!(
            cmd.format_output(&output, &ListOptions::default()),
            "No concepts found.\n"
        );
    }

    #[test]
    fn test_format_human_readable() {
        let cmd = ListCommand::new(setup());
        let output = cmd.run(&ListOptions::default(), t0());
        let text = cmd.format_output(&output, &ListOptions::default());

        assert!(text.starts_with("Found 5 concept(s), 5 due:"));
        assert!(text.contains("1. concept-4 [due]"));
        assert!(text.contains("never reviewed"));
    }

    #[test]
    fn test_quiet_and_json() {
        let cmd = ListCommand::new(setup());
        let output = cmd.run(&ListOptions::default(), t0());

        let quiet = ListOptions {
            quiet: true,
            ..Default::default()
        };
        assert!(cmd.format_output(&output, &quiet).is_empty());

        let json = ListOptions {
            json: true,
            ..Default::default()
        };
        let value: serde_json::Value =
            serde_json::from_str(&cmd.format_output(&output, &json)).unwrap();
        assert_eq!(value["count"], 5);
        assert_eq!(value["concepts"].as_array().unwrap().len(), 5);
    }
}
