//! Lockin - spaced-repetition study scheduler
//!
//! Lockin decides when each study concept should be reviewed next. A graded
//! recall (1-4) feeds an exponential-backoff interval policy and a
//! moving-average mastery estimate; the due-set query picks the concepts
//! whose review time has arrived. The scheduling engine is pure: callers
//! inject the clock and persist the results through a [`ConceptStore`].

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod scheduling;
pub mod storage;

pub use config::{Config, SchedulingConfig, StorageConfig};
pub use core::{Concept, ConceptState, RecallGrade, ReviewHistory, ReviewRecord};
pub use error::{LockinError, Result, SchedulingError};
pub use scheduling::{
    due_concepts, is_due, next_due_at, next_interval, next_mastery, DueConcepts,
    ExponentialBackoff, IntervalPolicy, MasteryPolicy, MovingAverageMastery, ReviewContext,
    ReviewOutcome, Scheduler,
};
pub use storage::{ConceptStore, FileConceptStore, MemoryConceptStore};

// CLI commands
pub use cli::{AddCommand, DueCommand, HistoryCommand, ListCommand, ReviewCommand};
