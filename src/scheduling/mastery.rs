//! Mastery policies.
//!
//! A mastery policy folds a recall grade into a concept's smoothed
//! retention estimate. The reference policy is an exponential moving
//! average towards `grade / 4`.

use crate::config::SchedulingConfig;
use crate::core::RecallGrade;
use crate::scheduling::ReviewContext;

/// Default learning rate of the moving average.
pub const DEFAULT_MASTERY_WEIGHT: f64 = 0.3;

/// Computes the next mastery estimate.
///
/// Implementations must map any mastery in [0, 1] to a value in [0, 1].
pub trait MasteryPolicy: Send + Sync {
    /// The new mastery level.
    fn next_mastery(&self, context: &ReviewContext<'_>, grade: RecallGrade) -> f64;
}

/// Exponential moving average towards the normalized grade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovingAverageMastery {
    /// Weight of the new grade, in [0, 1].
    pub weight: f64,
}

impl MovingAverageMastery {
    /// Build the policy from scheduling configuration.
    pub fn from_config(config: &SchedulingConfig) -> Self {
        Self {
            weight: config.mastery_weight,
        }
    }

    /// Blend `previous_mastery` with the grade's target.
    pub fn mastery_after(&self, previous_mastery: f64, grade: RecallGrade) -> f64 {
        let target = grade.normalized();
        let next = (1.0 - self.weight) * previous_mastery + self.weight * target;
        // convex combination; clamp absorbs rounding at the bounds
        next.clamp(0.0, 1.0)
    }
}

impl Default for MovingAverageMastery {
    fn default() -> Self {
        Self {
            weight: DEFAULT_MASTERY_WEIGHT,
        }
    }
}

impl MasteryPolicy for MovingAverageMastery {
    fn next_mastery(&self, context: &ReviewContext<'_>, grade: RecallGrade) -> f64 {
        self.mastery_after(context.state.mastery_level, grade)
    }
}

/// Next mastery under the reference policy (weight 0.3).
pub fn next_mastery(previous_mastery: f64, grade: RecallGrade) -> f64 {
    MovingAverageMastery::default().mastery_after(previous_mastery, grade)
}
