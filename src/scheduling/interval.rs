//! Interval policies.
//!
//! An interval policy maps the previous interval and a recall grade to the
//! number of days until the next review. The reference policy is an
//! exponential backoff: good recall doubles the interval, poor recall
//! collapses it to the base interval.

use crate::config::SchedulingConfig;
use crate::core::RecallGrade;
use crate::scheduling::ReviewContext;

/// Default minimum interval, in days.
pub const DEFAULT_BASE_INTERVAL_DAYS: f64 = 1.0;

/// Default growth factor applied on good recall.
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// Default lowest grade that counts as good recall.
pub const DEFAULT_SUCCESS_THRESHOLD: RecallGrade = RecallGrade::Good;

/// Computes the next review interval.
///
/// Implementations must return a finite interval greater than zero for any
/// context whose state passed [`ConceptState::validate`](crate::core::ConceptState::validate).
/// The context carries the full ordered history for policies that need it.
pub trait IntervalPolicy: Send + Sync {
    /// Days until the next review.
    fn next_interval(&self, context: &ReviewContext<'_>, grade: RecallGrade) -> f64;
}

/// Exponential backoff with a grade threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialBackoff {
    /// Minimum interval, and the interval after poor recall.
    pub base_interval_days: f64,
    /// Multiplier applied to the previous interval on good recall.
    pub factor: f64,
    /// Lowest grade treated as good recall.
    pub success_threshold: RecallGrade,
}

impl ExponentialBackoff {
    /// Build the policy from scheduling configuration.
    pub fn from_config(config: &SchedulingConfig) -> Self {
        Self {
            base_interval_days: config.base_interval_days,
            factor: config.backoff_factor,
            success_threshold: config.success_threshold,
        }
    }

    /// Compute the interval following `previous_interval_days`.
    pub fn interval_after(&self, previous_interval_days: f64, grade: RecallGrade) -> f64 {
        if grade >= self.success_threshold {
            // min keeps the result finite once doubling would overflow
            (previous_interval_days * self.factor)
                .min(f64::MAX)
                .max(self.base_interval_days)
        } else {
            self.base_interval_days
        }
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            base_interval_days: DEFAULT_BASE_INTERVAL_DAYS,
            factor: DEFAULT_BACKOFF_FACTOR,
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
        }
    }
}

impl IntervalPolicy for ExponentialBackoff {
    fn next_interval(&self, context: &ReviewContext<'_>, grade: RecallGrade) -> f64 {
        self.interval_after(context.state.last_interval_days, grade)
    }
}

/// Next interval under the reference policy (base 1 day, factor 2).
pub fn next_interval(previous_interval_days: f64, grade: RecallGrade) -> f64 {
    ExponentialBackoff::default().interval_after(previous_interval_days, grade)
}
