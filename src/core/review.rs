//! Review records and ordered review history.
//!
//! Records are an append-only audit log: one per graded review, never
//! edited. [`ReviewHistory`] keeps them sorted by `reviewed_at` so the
//! most recent review is found by timestamp, not by storage order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::RecallGrade;

/// One graded recall event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewRecord {
    /// Opaque unique identifier.
    pub id: String,
    /// The reviewed concept.
    pub concept_id: String,
    /// The submitted grade.
    pub recall_grade: RecallGrade,
    /// When the review happened.
    pub reviewed_at: DateTime<Utc>,
    /// Interval the scheduler computed for this review.
    pub resulting_interval_days: f64,
}

impl ReviewRecord {
    /// Create a record with a random ID.
    pub fn new(
        concept_id: impl Into<String>,
        recall_grade: RecallGrade,
        reviewed_at: DateTime<Utc>,
        resulting_interval_days: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            concept_id: concept_id.into(),
            recall_grade,
            reviewed_at,
            resulting_interval_days,
        }
    }
}

/// Review records of one concept, ordered by `reviewed_at`.
///
/// Records with equal timestamps keep their insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(from = "Vec<ReviewRecord>", into = "Vec<ReviewRecord>")]
pub struct ReviewHistory {
    records: Vec<ReviewRecord>,
}

impl ReviewHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from records in any order.
    pub fn from_records(mut records: Vec<ReviewRecord>) -> Self {
        records.sort_by_key(|r| r.reviewed_at);
        Self { records }
    }

    /// Insert a record at its chronological position.
    pub fn push(&mut self, record: ReviewRecord) {
        let at = self
            .records
            .partition_point(|r| r.reviewed_at <= record.reviewed_at);
        self.records.insert(at, record);
    }

    /// The most recent record.
    pub fn latest(&self) -> Option<&ReviewRecord> {
        self.records.last()
    }

    /// The oldest record.
    pub fn first(&self) -> Option<&ReviewRecord> {
        self.records.first()
    }

    /// Records in chronological order.
    pub fn iter(&self) -> std::slice::Iter<'_, ReviewRecord> {
        self.records.iter()
    }

    /// Records as a chronologically ordered slice.
    pub fn as_slice(&self) -> &[ReviewRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<ReviewRecord>> for ReviewHistory {
    fn from(records: Vec<ReviewRecord>) -> Self {
        Self::from_records(records)
    }
}

impl From<ReviewHistory> for Vec<ReviewRecord> {
    fn from(history: ReviewHistory) -> Self {
        history.records
    }
}

impl<'a> IntoIterator for &'a ReviewHistory {
    type Item = &'a ReviewRecord;
    type IntoIter = std::slice::Iter<'a, ReviewRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
