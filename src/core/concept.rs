//! Concept entities.
//!
//! [`ConceptState`] is the scheduling state the engine reads and produces.
//! [`Concept`] wraps it with the study material the user entered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SchedulingError;

/// Aggregate scheduling state of a concept.
///
/// Only the scheduler produces new values of this type; it never mutates
/// one in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConceptState {
    /// Opaque unique identifier.
    pub id: String,
    /// Smoothed retention estimate in [0, 1].
    pub mastery_level: f64,
    /// Interval produced by the most recent review; 0 when never reviewed.
    pub last_interval_days: f64,
    /// When the concept is due again. `None` means due immediately.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_review_at: Option<DateTime<Utc>>,
}

impl ConceptState {
    /// Create the state of a freshly defined concept.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            mastery_level: 0.0,
            last_interval_days: 0.0,
            next_review_at: None,
        }
    }

    /// Whether the concept has never been scheduled.
    pub fn is_new(&self) -> bool {
        self.next_review_at.is_none()
    }

    /// Check the state invariants.
    ///
    /// Mastery must be a finite value in [0, 1] and the interval a finite
    /// non-negative value. Bad values are reported, never repaired.
    pub fn validate(&self) -> Result<(), SchedulingError> {
        if !self.mastery_level.is_finite() || !(0.0..=1.0).contains(&self.mastery_level) {
            return Err(SchedulingError::invalid_mastery(self.mastery_level));
        }
        if !self.last_interval_days.is_finite() || self.last_interval_days < 0.0 {
            return Err(SchedulingError::invalid_interval(self.last_interval_days));
        }
        Ok(())
    }
}

impl AsRef<ConceptState> for ConceptState {
    fn as_ref(&self) -> &ConceptState {
        self
    }
}

/// A concept with its study material.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Concept {
    /// Scheduling state (carries the concept ID).
    #[serde(flatten)]
    pub state: ConceptState,
    /// Short name shown in lists.
    pub name: String,
    /// The material to recall.
    pub content: String,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Parent concept, for nested material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// When the concept was defined.
    pub created_at: DateTime<Utc>,
}

impl Concept {
    /// Create a new concept with a random ID and unreviewed state.
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            state: ConceptState::new(Uuid::new_v4().to_string()),
            name: name.into(),
            content: content.into(),
            tags: Vec::new(),
            parent_id: None,
            created_at,
        }
    }

    /// Set the concept ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.state.id = id.into();
        self
    }

    /// Set the tags.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the parent concept.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Replace the scheduling state, keeping the material.
    pub fn with_state(mut self, state: ConceptState) -> Self {
        self.state = state;
        self
    }

    /// The concept ID.
    pub fn id(&self) -> &str {
        &self.state.id
    }
}

impl AsRef<ConceptState> for Concept {
    fn as_ref(&self) -> &ConceptState {
        &self.state
    }
}
