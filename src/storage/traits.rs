//! Concept storage traits for Lockin.
//!
//! This module defines the `ConceptStore` trait for concept persistence.

use std::sync::Arc;

use crate::core::{Concept, ConceptState, ReviewHistory, ReviewRecord};
use crate::error::Result;

/// Trait for concept storage backends.
///
/// A store keeps each concept together with its review history. Reviews
/// are written through [`ConceptStore::commit_review`], which updates the
/// state and appends the record as one step.
pub trait ConceptStore: Send + Sync {
    /// Retrieve a concept by ID.
    ///
    /// Returns `Ok(None)` if the concept doesn't exist.
    fn get(&self, id: &str) -> Result<Option<Concept>>;

    /// Save a concept.
    ///
    /// Creates a new concept or replaces an existing one. The review
    /// history of an existing concept is kept.
    fn put(&self, concept: &Concept) -> Result<()>;

    /// List concepts, newest `created_at` first.
    ///
    /// Returns up to `limit` concepts.
    fn list(&self, limit: usize) -> Result<Vec<Concept>>;

    /// Delete a concept and its history.
    ///
    /// Returns `Ok(())` even if the concept doesn't exist.
    fn delete(&self, id: &str) -> Result<()>;

    /// The ordered review history of a concept.
    ///
    /// Empty for a concept that was never reviewed; `ConceptNotFound` if
    /// the concept doesn't exist.
    fn history(&self, id: &str) -> Result<ReviewHistory>;

    /// Store a review outcome.
    ///
    /// Replaces the stored state with `updated` and appends `record`, but
    /// only if the stored state still equals `expected`. Otherwise fails
    /// with `Conflict` and writes nothing.
    fn commit_review(
        &self,
        expected: &ConceptState,
        updated: &ConceptState,
        record: &ReviewRecord,
    ) -> Result<()>;

    /// Check if a concept exists.
    fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.get(id)?.is_some())
    }

    /// List every concept, newest first.
    fn list_all(&self) -> Result<Vec<Concept>> {
        self.list(usize::MAX)
    }
}

/// Blanket implementation of ConceptStore for Arc-wrapped stores.
///
/// This allows using `Arc<T>` where `T: ConceptStore` is expected,
/// which is useful for sharing stores between tests and commands.
impl<T: ConceptStore + ?Sized> ConceptStore for Arc<T> {
    fn get(&self, id: &str) -> Result<Option<Concept>> {
        (**self).get(id)
    }

    fn put(&self, concept: &Concept) -> Result<()> {
        (**self).put(concept)
    }

    fn list(&self, limit: usize) -> Result<Vec<Concept>> {
        (**self).list(limit)
    }

    fn delete(&self, id: &str) -> Result<()> {
        (**self).delete(id)
    }

    fn history(&self, id: &str) -> Result<ReviewHistory> {
        (**self).history(id)
    }

    fn commit_review(
        &self,
        expected: &ConceptState,
        updated: &ConceptState,
        record: &ReviewRecord,
    ) -> Result<()> {
        (**self).commit_review(expected, updated, record)
    }
}

/// Test utilities for ConceptStore implementations.
#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::error::LockinError;
    use crate::scheduling::Scheduler;
    use chrono::{Duration, TimeZone, Utc};

    fn t0() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    /// Test helper to verify ConceptStore CRUD behavior.
    pub fn test_concept_store_crud<S: ConceptStore>(store: &S) {
        let concept = Concept::new("Borrow checker", "One mutable or many shared", t0())
            .with_tags(vec!["rust".to_string()]);

        // Initially should not exist
        assert!(!store.exists(concept.id()).unwrap());
        assert!(store.get(concept.id()).unwrap().is_none());

        store.put(&concept).unwrap();

        assert!(store.exists(concept.id()).unwrap());
        let retrieved = store.get(concept.id()).unwrap().unwrap();
        assert_eq!(retrieved, concept);

        // Fresh concept has an empty history
        assert!(store.history(concept.id()).unwrap().is_empty());

        let concepts = store.list(10).unwrap();
        assert!(concepts.iter().any(|c| c.id() == concept.id()));

        store.delete(concept.id()).unwrap();
        assert!(!store.exists(concept.id()).unwrap());
        assert!(store.get(concept.id()).unwrap().is_none());
        assert!(matches!(
            store.history(concept.id()),
            Err(LockinError::ConceptNotFound { .. })
        ));

        // Delete again should succeed
        store.delete(concept.id()).unwrap();
    }

    /// Test helper to verify list ordering and limits.
    pub fn test_concept_store_list_order<S: ConceptStore>(store: &S) {
        for (i, name) in ["oldest", "middle", "newest"].iter().enumerate() {
            let concept = Concept::new(*name, "", t0() + Duration::minutes(i as i64));
            store.put(&concept).unwrap();
        }

        let names: Vec<String> = store.list(10).unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["newest", "middle", "oldest"]);

        assert_eq!(store.list(2).unwrap().len(), 2);
        assert_eq!(store.list(0).unwrap().len(), 0);
        assert_eq!(store.list_all().unwrap().len(), 3);
    }

    /// Test helper to verify review commits and the conflict check.
    pub fn test_concept_store_commit_review<S: ConceptStore>(store: &S) {
        let scheduler = Scheduler::new();
        let concept = Concept::new("Lifetimes", "Outlives relations", t0());
        store.put(&concept).unwrap();

        // First review
        let first = scheduler
            .record_review(&concept.state, 4, t0())
            .unwrap();
        store
            .commit_review(&concept.state, &first.state, &first.record)
            .unwrap();

        let stored = store.get(concept.id()).unwrap().unwrap();
        assert_eq!(stored.state, first.state);
        assert_eq!(stored.name, concept.name);
        assert_eq!(store.history(concept.id()).unwrap().len(), 1);

        // A second writer still holding the original state loses
        let stale = scheduler
            .record_review(&concept.state, 1, t0() + Duration::hours(1))
            .unwrap();
        let result = store.commit_review(&concept.state, &stale.state, &stale.record);
        assert!(matches!(result, Err(LockinError::Conflict { .. })));
        assert_eq!(store.get(concept.id()).unwrap().unwrap().state, first.state);
        assert_eq!(store.history(concept.id()).unwrap().len(), 1);

        // Re-reading and retrying succeeds
        let second = scheduler
            .record_review(&stored.state, 4, t0() + Duration::days(1))
            .unwrap();
        store
            .commit_review(&stored.state, &second.state, &second.record)
            .unwrap();

        let history = store.history(concept.id()).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.latest().unwrap().resulting_interval_days, 2.0);

        // Metadata updates keep the history
        let renamed = Concept {
            name: "Lifetimes and variance".to_string(),
            ..store.get(concept.id()).unwrap().unwrap()
        };
        store.put(&renamed).unwrap();
        assert_eq!(store.history(concept.id()).unwrap().len(), 2);

        // Committing against a missing concept
        let ghost = ConceptState::new("ghost");
        let outcome = scheduler.record_review(&ghost, 3, t0()).unwrap();
        assert!(matches!(
            store.commit_review(&ghost, &outcome.state, &outcome.record),
            Err(LockinError::ConceptNotFound { .. })
        ));
    }
}
