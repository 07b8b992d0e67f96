//! Spaced-repetition scheduling engine.
//!
//! Interval and mastery policies are substitutable strategies; the
//! [`Scheduler`] combines them into a pure review step, and the due-set
//! query filters concept snapshots by due time. Nothing here performs I/O
//! or holds shared mutable state.

pub mod due;
pub mod interval;
pub mod mastery;
pub mod scheduler;

pub use due::{due_concepts, due_count, is_due, next_due_at, DueConcepts};
pub use interval::{
    next_interval, ExponentialBackoff, IntervalPolicy, DEFAULT_BACKOFF_FACTOR,
    DEFAULT_BASE_INTERVAL_DAYS, DEFAULT_SUCCESS_THRESHOLD,
};
pub use mastery::{next_mastery, MasteryPolicy, MovingAverageMastery, DEFAULT_MASTERY_WEIGHT};
pub use scheduler::{add_days, ReviewContext, ReviewOutcome, Scheduler};
