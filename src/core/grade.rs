//! Recall grade scale.
//!
//! Grades are ordinal self-assessments from 1 (total failure) to 4
//! (perfect recall). Raw integers are validated once at the boundary; the
//! policies only ever see a [`RecallGrade`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchedulingError;

/// Lowest grade on the scale.
pub const MIN_GRADE: u8 = 1;

/// Highest grade on the scale.
pub const MAX_GRADE: u8 = 4;

/// A validated recall grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub enum RecallGrade {
    /// Nothing was recalled.
    Failed = 1,
    /// Recalled with serious errors.
    Poor = 2,
    /// Recalled with some effort.
    Good = 3,
    /// Recalled instantly and completely.
    Perfect = 4,
}

impl RecallGrade {
    /// Get all grades in ascending order.
    pub fn all() -> &'static [RecallGrade] {
        &[
            RecallGrade::Failed,
            RecallGrade::Poor,
            RecallGrade::Good,
            RecallGrade::Perfect,
        ]
    }

    /// The grade's position on the 1..=4 scale.
    pub fn value(self) -> u8 {
        self as u8
    }

    /// The grade scaled to (0, 1]: `value / 4`.
    pub fn normalized(self) -> f64 {
        f64::from(self.value()) / f64::from(MAX_GRADE)
    }

    /// Display name for this grade.
    pub fn display_name(self) -> &'static str {
        match self {
            RecallGrade::Failed => "failed",
            RecallGrade::Poor => "poor",
            RecallGrade::Good => "good",
            RecallGrade::Perfect => "perfect",
        }
    }
}

impl TryFrom<i64> for RecallGrade {
    type Error = SchedulingError;

    fn try_from(grade: i64) -> Result<Self, Self::Error> {
        match grade {
            1 => Ok(RecallGrade::Failed),
            2 => Ok(RecallGrade::Poor),
            3 => Ok(RecallGrade::Good),
            4 => Ok(RecallGrade::Perfect),
            _ => Err(SchedulingError::invalid_grade(grade)),
        }
    }
}

impl TryFrom<u8> for RecallGrade {
    type Error = SchedulingError;

    fn try_from(grade: u8) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(grade))
    }
}

impl From<RecallGrade> for u8 {
    fn from(grade: RecallGrade) -> Self {
        grade.value()
    }
}

impl fmt::Display for RecallGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value(), self.display_name())
    }
}
