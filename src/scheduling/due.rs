//! Due-set query.
//!
//! A concept is due when it has never been scheduled or when its
//! `next_review_at` is at or before the query time. The query is a lazy,
//! order-preserving filter over a borrowed snapshot; it never touches the
//! concepts it yields.

use std::iter::FusedIterator;
use std::slice;

use chrono::{DateTime, Utc};

use crate::core::ConceptState;

/// Whether a concept is due at `as_of` (inclusive).
pub fn is_due(state: &ConceptState, as_of: DateTime<Utc>) -> bool {
    match state.next_review_at {
        None => true,
        Some(due) => due <= as_of,
    }
}

/// Lazily filter `concepts` down to those due at `as_of`, preserving order.
///
/// The returned iterator is `Clone`, so the same due set can be walked
/// again without re-running anything.
pub fn due_concepts<T: AsRef<ConceptState>>(
    concepts: &[T],
    as_of: DateTime<Utc>,
) -> DueConcepts<'_, T> {
    DueConcepts {
        inner: concepts.iter(),
        as_of,
    }
}

/// Number of concepts due at `as_of`.
pub fn due_count<T: AsRef<ConceptState>>(concepts: &[T], as_of: DateTime<Utc>) -> usize {
    due_concepts(concepts, as_of).count()
}

/// Earliest scheduled review strictly after `as_of`.
///
/// Returns `None` when nothing is scheduled in the future.
pub fn next_due_at<T: AsRef<ConceptState>>(
    concepts: &[T],
    as_of: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    concepts
        .iter()
        .filter_map(|c| c.as_ref().next_review_at)
        .filter(|due| *due > as_of)
        .min()
}

/// Iterator over the due members of a concept slice.
#[derive(Debug)]
pub struct DueConcepts<'a, T> {
    inner: slice::Iter<'a, T>,
    as_of: DateTime<Utc>,
}

impl<T> DueConcepts<'_, T> {
    /// The query time.
    pub fn as_of(&self) -> DateTime<Utc> {
        self.as_of
    }
}

impl<T> Clone for DueConcepts<'_, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            as_of: self.as_of,
        }
    }
}

impl<'a, T: AsRef<ConceptState>> Iterator for DueConcepts<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let as_of = self.as_of;
        self.inner.find(|c| is_due((*c).as_ref(), as_of))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}

impl<T: AsRef<ConceptState>> DoubleEndedIterator for DueConcepts<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let as_of = self.as_of;
        self.inner.rfind(|c| is_due((*c).as_ref(), as_of))
    }
}

impl<T: AsRef<ConceptState>> FusedIterator for DueConcepts<'_, T> {}
