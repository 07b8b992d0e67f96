//! Error types for Lockin.
//!
//! The scheduling engine reports caller misuse and corrupt input through
//! [`SchedulingError`]. It performs no I/O, so nothing it returns is
//! transient and nothing is retried. The application shell (store, config,
//! CLI) wraps those errors in [`LockinError`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the scheduling engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulingError {
    /// Recall grade outside the closed scale 1..=4.
    #[error("invalid recall grade {grade}: expected a value in 1..=4")]
    InvalidGrade { grade: i64 },

    /// Stored mastery level is not a finite value in [0, 1].
    #[error("invalid mastery level {value}: expected a value in [0, 1]")]
    InvalidMastery { value: f64 },

    /// Stored interval is negative or not finite.
    #[error("invalid interval {value} days: expected a non-negative finite value")]
    InvalidInterval { value: f64 },
}

impl SchedulingError {
    /// Create an invalid grade error.
    pub fn invalid_grade(grade: impl Into<i64>) -> Self {
        Self::InvalidGrade {
            grade: grade.into(),
        }
    }

    /// Create an invalid mastery error.
    pub fn invalid_mastery(value: f64) -> Self {
        Self::InvalidMastery { value }
    }

    /// Create an invalid interval error.
    pub fn invalid_interval(value: f64) -> Self {
        Self::InvalidInterval { value }
    }

    /// Whether the error points at stored data rather than caller input.
    pub fn is_corrupt_state(&self) -> bool {
        matches!(
            self,
            Self::InvalidMastery { .. } | Self::InvalidInterval { .. }
        )
    }
}

/// The main error type for the Lockin application shell.
#[derive(Error, Debug)]
pub enum LockinError {
    /// I/O errors from concept file operations.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON or TOML parsing/serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// Concept not found in storage.
    #[error("concept not found: {concept_id}")]
    ConceptNotFound { concept_id: String },

    /// Stored state changed between read and write.
    #[error("concept {concept_id} was modified concurrently; reload and retry")]
    Conflict { concept_id: String },

    /// A timestamp argument could not be parsed.
    #[error("invalid timestamp: {message}")]
    InvalidTimestamp { message: String },

    /// The scheduling engine rejected the review.
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
}

/// A specialized Result type for Lockin operations.
pub type Result<T> = std::result::Result<T, LockinError>;

impl LockinError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a concept not found error.
    pub fn concept_not_found(concept_id: impl Into<String>) -> Self {
        Self::ConceptNotFound {
            concept_id: concept_id.into(),
        }
    }

    /// Create a concurrent modification error.
    pub fn conflict(concept_id: impl Into<String>) -> Self {
        Self::Conflict {
            concept_id: concept_id.into(),
        }
    }

    /// Create an invalid timestamp error.
    pub fn invalid_timestamp(message: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            message: message.into(),
        }
    }

    /// Whether the error was caused by the caller's input.
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Self::Scheduling(err) => !err.is_corrupt_state(),
            Self::InvalidTimestamp { .. } | Self::ConceptNotFound { .. } => true,
            _ => false,
        }
    }
}

impl From<io::Error> for LockinError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for LockinError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Exit codes for the Lockin CLI.
pub mod exit_codes {
    /// Command completed.
    pub const SUCCESS: i32 = 0;

    /// Command failed (storage, config, conflict).
    pub const ERROR: i32 = 1;

    /// Command rejected its input (bad grade, unknown concept, bad timestamp).
    pub const INVALID_INPUT: i32 = 2;

    /// Process panicked.
    pub const CRASH: i32 = 3;
}
