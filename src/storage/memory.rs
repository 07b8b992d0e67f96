//! In-memory concept storage for testing.
//!
//! This module provides a thread-safe in-memory implementation of the
//! ConceptStore trait, primarily for use in unit tests.

use std::collections::HashMap;
use std::io;
use std::sync::{PoisonError, RwLock};

use crate::core::{Concept, ConceptState, ReviewHistory, ReviewRecord};
use crate::error::{LockinError, Result};
use crate::storage::ConceptStore;

/// A stored concept and its history.
#[derive(Debug, Clone)]
struct Entry {
    concept: Concept,
    history: ReviewHistory,
}

/// In-memory concept store for testing.
///
/// Thread-safe implementation using `RwLock<HashMap>`.
/// Concepts are stored in memory and lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryConceptStore {
    entries: RwLock<HashMap<String, Entry>>,
}

fn poisoned<T>(_: PoisonError<T>) -> LockinError {
    LockinError::storage(
        "<memory>",
        io::Error::other("concept store lock poisoned"),
    )
}

impl MemoryConceptStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get the number of concepts in the store.
    pub fn len(&self) -> Result<usize> {
        Ok(self.entries.read().map_err(poisoned)?.len())
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Clear all concepts from the store.
    pub fn clear(&self) -> Result<()> {
        self.entries.write().map_err(poisoned)?.clear();
        Ok(())
    }
}

impl ConceptStore for MemoryConceptStore {
    fn get(&self, id: &str) -> Result<Option<Concept>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(id).map(|e| e.concept.clone()))
    }

    fn put(&self, concept: &Concept) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries
            .entry(concept.id().to_string())
            .and_modify(|e| e.concept = concept.clone())
            .or_insert_with(|| Entry {
                concept: concept.clone(),
                history: ReviewHistory::new(),
            });
        Ok(())
    }

    fn list(&self, limit: usize) -> Result<Vec<Concept>> {
        let entries = self.entries.read().map_err(poisoned)?;
        let mut result: Vec<Concept> = entries.values().map(|e| e.concept.clone()).collect();

        // Newest first; id breaks ties so the order is stable
        result.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id().cmp(b.id()))
        });
        result.truncate(limit);

        Ok(result)
    }

    fn delete(&self, id: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.remove(id);
        Ok(())
    }

    fn history(&self, id: &str) -> Result<ReviewHistory> {
        let entries = self.entries.read().map_err(poisoned)?;
        entries
            .get(id)
            .map(|e| e.history.clone())
            .ok_or_else(|| LockinError::concept_not_found(id))
    }

    fn commit_review(
        &self,
        expected: &ConceptState,
        updated: &ConceptState,
        record: &ReviewRecord,
    ) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        let entry = entries
            .get_mut(&expected.id)
            .ok_or_else(|| LockinError::concept_not_found(&expected.id))?;

        if entry.concept.state != *expected {
            tracing::debug!(concept_id = %expected.id, "stale review rejected");
            return Err(LockinError::conflict(&expected.id));
        }

        entry.concept.state = updated.clone();
        entry.history.push(record.clone());
        Ok(())
    }
}
