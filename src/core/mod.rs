//! Core types for Lockin.
//!
//! This module contains the data entities the scheduling engine reads and
//! produces: recall grades, concept state, and review records.

pub mod concept;
pub mod grade;
pub mod review;

pub use concept::{Concept, ConceptState};
pub use grade::{RecallGrade, MAX_GRADE, MIN_GRADE};
pub use review::{ReviewHistory, ReviewRecord};
