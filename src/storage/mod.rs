//! Concept storage for Lockin.
//!
//! This module provides persistent storage for concepts and their review
//! histories, supporting file-based and in-memory backends.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileConceptStore;
pub use memory::MemoryConceptStore;
pub use traits::ConceptStore;
