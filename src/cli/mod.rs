//! CLI commands for Lockin.
//!
//! Each command follows the same shape: a `XCommand` built over a
//! [`ConceptStore`](crate::storage::ConceptStore), a `run` method that takes
//! the injected clock and returns a serializable `XOutput`, and a
//! `format_output` method rendering JSON or human-readable text.
//!
//! - **Study commands**: add, review, due
//! - **Inspection commands**: list, history

pub mod add;
pub mod due;
pub mod history;
pub mod list;
pub mod review;

pub use add::AddCommand;
pub use due::DueCommand;
pub use history::HistoryCommand;
pub use list::ListCommand;
pub use review::ReviewCommand;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Concept, ReviewRecord};
use crate::error::exit_codes;
use crate::scheduling::is_due;

/// Concept summary shared by command outputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConceptInfo {
    /// Concept ID.
    pub id: String,
    /// Concept name.
    pub name: String,
    /// Tags.
    pub tags: Vec<String>,
    /// Parent concept ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Mastery level in [0, 1].
    pub mastery_level: f64,
    /// Interval from the last review, in days.
    pub last_interval_days: f64,
    /// Next review time (RFC 3339), absent for new concepts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_review_at: Option<String>,
    /// Created date.
    pub created: String,
    /// Whether the concept is due at the command's clock.
    pub due: bool,
}

impl ConceptInfo {
    /// Summarize a concept as seen at `now`.
    pub fn from_concept(concept: &Concept, now: DateTime<Utc>) -> Self {
        Self {
            id: concept.id().to_string(),
            name: concept.name.clone(),
            tags: concept.tags.clone(),
            parent_id: concept.parent_id.clone(),
            mastery_level: concept.state.mastery_level,
            last_interval_days: concept.state.last_interval_days,
            next_review_at: concept.state.next_review_at.map(format_timestamp),
            created: concept.created_at.format("%Y-%m-%d").to_string(),
            due: is_due(&concept.state, now),
        }
    }
}

/// Review summary shared by command outputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewInfo {
    /// Review ID.
    pub id: String,
    /// Grade value (1-4).
    pub grade: u8,
    /// Grade label.
    pub grade_name: String,
    /// Review time (RFC 3339).
    pub reviewed_at: String,
    /// Interval computed by the review, in days.
    pub interval_days: f64,
}

impl From<&ReviewRecord> for ReviewInfo {
    fn from(record: &ReviewRecord) -> Self {
        Self {
            id: record.id.clone(),
            grade: record.recall_grade.value(),
            grade_name: record.recall_grade.display_name().to_string(),
            reviewed_at: format_timestamp(record.reviewed_at),
            interval_days: record.resulting_interval_days,
        }
    }
}

/// Format a timestamp as RFC 3339 with second precision.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC 3339 timestamp given on the command line.
pub fn parse_timestamp(value: &str) -> crate::error::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| crate::error::LockinError::invalid_timestamp(format!("{value}: {e}")))
}

/// Format a day count for display, dropping a trailing `.0`.
pub fn format_days(days: f64) -> String {
    if days.fract() == 0.0 && days.abs() < 1e15 {
        format!("{days:.0}")
    } else {
        format!("{days:.2}")
    }
}

/// Exit code for a command outcome.
pub fn outcome_exit_code(success: bool, invalid_input: bool) -> i32 {
    if success {
        exit_codes::SUCCESS
    } else if invalid_input {
        exit_codes::INVALID_INPUT
    } else {
        exit_codes::ERROR
    }
}
