//! Review scheduler.
//!
//! The scheduler turns a submitted grade into a new [`ConceptState`] and a
//! [`ReviewRecord`]. It is a pure computation: it reads its inputs, returns
//! new values, and leaves persistence to the caller.

use chrono::{DateTime, Duration, Utc};

use crate::config::SchedulingConfig;
use crate::core::{ConceptState, RecallGrade, ReviewHistory, ReviewRecord};
use crate::error::SchedulingError;
use crate::scheduling::{ExponentialBackoff, IntervalPolicy, MasteryPolicy, MovingAverageMastery};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Everything a policy may condition on when a grade is submitted.
#[derive(Debug, Clone, Copy)]
pub struct ReviewContext<'a> {
    /// State before this review.
    pub state: &'a ConceptState,
    /// Earlier reviews of the concept, oldest first.
    pub history: &'a [ReviewRecord],
    /// When the review happens.
    pub now: DateTime<Utc>,
}

impl<'a> ReviewContext<'a> {
    /// Create a context without history.
    pub fn new(state: &'a ConceptState, now: DateTime<Utc>) -> Self {
        Self {
            state,
            history: &[],
            now,
        }
    }

    /// Attach the ordered review history.
    pub fn with_history(mut self, history: &'a [ReviewRecord]) -> Self {
        self.history = history;
        self
    }

    /// The most recent earlier review.
    pub fn last_review(&self) -> Option<&'a ReviewRecord> {
        self.history.last()
    }

    /// Fractional days since the most recent earlier review.
    pub fn days_since_last_review(&self) -> Option<f64> {
        self.last_review()
            .map(|r| days_between(r.reviewed_at, self.now))
    }

    /// Fractional days past the due date; negative when reviewed early.
    pub fn days_overdue(&self) -> Option<f64> {
        self.state
            .next_review_at
            .map(|due| days_between(due, self.now))
    }
}

/// Result of a graded review: the state to store and the record to append.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    /// The concept's new scheduling state.
    pub state: ConceptState,
    /// The audit record for this review.
    pub record: ReviewRecord,
}

impl ReviewOutcome {
    /// Split into state and record.
    pub fn into_parts(self) -> (ConceptState, ReviewRecord) {
        (self.state, self.record)
    }
}

/// Orchestrates an interval policy and a mastery policy.
#[derive(Debug, Clone, Default)]
pub struct Scheduler<I = ExponentialBackoff, M = MovingAverageMastery> {
    interval_policy: I,
    mastery_policy: M,
}

impl Scheduler {
    /// Create a scheduler with the reference policies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scheduler with the reference policies tuned by config.
    pub fn from_config(config: &SchedulingConfig) -> Self {
        Self::with_policies(
            ExponentialBackoff::from_config(config),
            MovingAverageMastery::from_config(config),
        )
    }
}

impl<I: IntervalPolicy, M: MasteryPolicy> Scheduler<I, M> {
    /// Create a scheduler from explicit policies.
    pub fn with_policies(interval_policy: I, mastery_policy: M) -> Self {
        Self {
            interval_policy,
            mastery_policy,
        }
    }

    /// The interval policy in use.
    pub fn interval_policy(&self) -> &I {
        &self.interval_policy
    }

    /// The mastery policy in use.
    pub fn mastery_policy(&self) -> &M {
        &self.mastery_policy
    }

    /// Record a review of a concept given a raw grade.
    ///
    /// Fails with [`SchedulingError::InvalidGrade`] when `grade` is outside
    /// 1..=4, and with `InvalidMastery`/`InvalidInterval` when `concept`
    /// breaks its own invariants. On failure nothing is produced.
    pub fn record_review(
        &self,
        concept: &ConceptState,
        grade: i64,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome, SchedulingError> {
        self.record_review_with_history(concept, &ReviewHistory::new(), grade, now)
    }

    /// Record a review, exposing the concept's ordered history to the policies.
    pub fn record_review_with_history(
        &self,
        concept: &ConceptState,
        history: &ReviewHistory,
        grade: i64,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome, SchedulingError> {
        let grade = RecallGrade::try_from(grade).inspect_err(|err| {
            tracing::warn!(concept_id = %concept.id, error = %err, "rejected review");
        })?;
        self.record_graded(concept, history.as_slice(), grade, now)
    }

    /// Record a review with an already validated grade.
    pub fn record_graded(
        &self,
        concept: &ConceptState,
        history: &[ReviewRecord],
        grade: RecallGrade,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome, SchedulingError> {
        concept.validate().inspect_err(|err| {
            tracing::warn!(concept_id = %concept.id, error = %err, "corrupt concept state");
        })?;

        let context = ReviewContext::new(concept, now).with_history(history);
        let interval = self.interval_policy.next_interval(&context, grade);
        let mastery = self.mastery_policy.next_mastery(&context, grade);

        let record = ReviewRecord::new(&concept.id, grade, now, interval);
        let state = ConceptState {
            mastery_level: mastery,
            last_interval_days: interval,
            next_review_at: Some(add_days(now, interval)),
            ..concept.clone()
        };

        tracing::debug!(
            concept_id = %concept.id,
            grade = grade.value(),
            interval_days = interval,
            mastery,
            "review scheduled"
        );

        Ok(ReviewOutcome { state, record })
    }

    /// Rebuild a concept's state by folding its history through the policies.
    ///
    /// Records belonging to another concept are dropped first, so each
    /// review sees only the earlier reviews of the same concept.
    pub fn replay(
        &self,
        concept_id: &str,
        history: &ReviewHistory,
    ) -> Result<ConceptState, SchedulingError> {
        let mut own: Vec<ReviewRecord> = Vec::with_capacity(history.len());
        for record in history.iter() {
            if record.concept_id == concept_id {
                own.push(record.clone());
            } else {
                tracing::warn!(
                    concept_id,
                    record_id = %record.id,
                    "skipping review of another concept during replay"
                );
            }
        }

        let mut state = ConceptState::new(concept_id);
        for (i, record) in own.iter().enumerate() {
            let outcome =
                self.record_graded(&state, &own[..i], record.recall_grade, record.reviewed_at)?;
            state = outcome.state;
        }

        Ok(state)
    }
}

/// Add fractional days to a timestamp, saturating at the latest representable time.
pub fn add_days(at: DateTime<Utc>, days: f64) -> DateTime<Utc> {
    let millis = (days * MILLIS_PER_DAY).round();
    let shifted = if millis.abs() < i64::MAX as f64 {
        Duration::try_milliseconds(millis as i64).and_then(|d| at.checked_add_signed(d))
    } else {
        None
    };

    shifted.unwrap_or_else(|| {
        tracing::warn!(days, "due date beyond representable range, saturating");
        if days < 0.0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        }
    })
}

fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const EPS: f64 = 1e-9;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn new_concept() -> ConceptState {
        ConceptState::new("c1")
    }

    #[test]
    fn test_scenario_first_perfect_review() {
        let scheduler = Scheduler::new();
        let (state, record) = scheduler
            .record_review(&new_concept(), 4, t0())
            .unwrap()
            .into_parts();

        assert!((state.mastery_level - 0.3).abs() < EPS);
        assert_eq!(state.last_interval_days, 1.0);
        assert_eq!(state.next_review_at, Some(t0() + Duration::days(1)));
        assert_eq!(state.id, "c1");

        assert_eq!(record.concept_id, "c1");
        assert_eq!(record.recall_grade, RecallGrade::Perfect);
        assert_eq!(record.reviewed_at, t0());
        assert_eq!(record.resulting_interval_days, 1.0);
    }

    #[test]
    fn test_scenario_second_perfect_review() {
        let scheduler = Scheduler::new();
        let first = scheduler.record_review(&new_concept(), 4, t0()).unwrap();
        let now = t0() + Duration::days(1);
        let second = scheduler.record_review(&first.state, 4, now).unwrap();

        assert_eq!(second.state.last_interval_days, 2.0);
        assert!((second.state.mastery_level - 0.51).abs() < EPS);
        assert_eq!(second.state.next_review_at, Some(now + Duration::days(2)));
    }

    #[test]
    fn test_scenario_failure_after_long_interval() {
        let scheduler = Scheduler::new();
        let concept = ConceptState {
            id: "c1".to_string(),
            mastery_level: 0.8,
            last_interval_days: 8.0,
            next_review_at: Some(t0()),
        };

        let outcome = scheduler.record_review(&concept, 1, t0()).unwrap();
        assert_eq!(outcome.state.last_interval_days, 1.0);
        assert_eq!(outcome.state.next_review_at, Some(t0() + Duration::days(1)));
    }

    #[test]
    fn test_scenario_invalid_grade() {
        let scheduler = Scheduler::new();
        let concept = new_concept();
        let before = concept.clone();

        let err = scheduler.record_review(&concept, 5, t0()).unwrap_err();
        assert_eq!(err, SchedulingError::InvalidGrade { grade: 5 });
        assert_eq!(concept, before);
    }

    #[test]
    fn test_zero_grade_rejected() {
        let err = Scheduler::new()
            .record_review(&new_concept(), 0, t0())
            .unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidGrade { grade: 0 }));
    }

    #[test]
    fn test_corrupt_mastery_rejected() {
        let mut concept = new_concept();
        concept.mastery_level = 1.2;
        let err = Scheduler::new().record_review(&concept, 3, t0()).unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidMastery { .. }));
    }

    #[test]
    fn test_corrupt_interval_rejected() {
        let mut concept = new_concept();
        concept.last_interval_days = -3.0;
        let err = Scheduler::new().record_review(&concept, 3, t0()).unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidInterval { .. }));
    }

    #[test]
    fn test_input_state_is_not_mutated() {
        let scheduler = Scheduler::new();
        let concept = new_concept();
        let snapshot = concept.clone();
        let _ = scheduler.record_review(&concept, 4, t0()).unwrap();
        assert_eq!(concept, snapshot);
    }

    #[test]
    fn test_each_review_gets_fresh_record_id() {
        let scheduler = Scheduler::new();
        let a = scheduler.record_review(&new_concept(), 3, t0()).unwrap();
        let b = scheduler.record_review(&new_concept(), 3, t0()).unwrap();
        assert_ne!(a.record.id, b.record.id);
    }

    #[test]
    fn test_from_config() {
        let config = SchedulingConfig {
            base_interval_days: 0.5,
            backoff_factor: 3.0,
            success_threshold: RecallGrade::Perfect,
            mastery_weight: 0.5,
        };
        let scheduler = Scheduler::from_config(&config);

        let outcome = scheduler.record_review(&new_concept(), 4, t0()).unwrap();
        assert_eq!(outcome.state.last_interval_days, 0.5);
        assert!((outcome.state.mastery_level - 0.5).abs() < EPS);
        assert_eq!(outcome.state.next_review_at, Some(t0() + Duration::hours(12)));

        let outcome = scheduler.record_review(&outcome.state, 3, t0()).unwrap();
        assert_eq!(outcome.state.last_interval_days, 0.5);
    }

    #[test]
    fn test_policy_accessors() {
        let scheduler = Scheduler::new();
        assert_eq!(*scheduler.interval_policy(), ExponentialBackoff::default());
        assert_eq!(*scheduler.mastery_policy(), MovingAverageMastery::default());
    }

    /// Interval policy that spaces reviews by the number of earlier reviews.
    struct CountingPolicy;

    impl IntervalPolicy for CountingPolicy {
        fn next_interval(&self, context: &ReviewContext<'_>, _grade: RecallGrade) -> f64 {
            (context.history.len() + 1) as f64
        }
    }

    #[test]
    fn test_custom_policy_sees_history() {
        let scheduler = Scheduler::with_policies(CountingPolicy, MovingAverageMastery::default());
        let mut history = ReviewHistory::new();
        let mut state = new_concept();

        for day in 0..3 {
            let outcome = scheduler
                .record_review_with_history(&state, &history, 3, t0() + Duration::days(day))
                .unwrap();
            history.push(outcome.record);
            state = outcome.state;
        }

        assert_eq!(state.last_interval_days, 3.0);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_context_timing() {
        let mut state = new_concept();
        state.next_review_at = Some(t0());
        let record = ReviewRecord::new("c1", RecallGrade::Good, t0() - Duration::days(2), 2.0);
        let history = [record];
        let now = t0() + Duration::hours(12);

        let context = ReviewContext::new(&state, now).with_history(&history);
        assert!((context.days_since_last_review().unwrap() - 2.5).abs() < EPS);
        assert!((context.days_overdue().unwrap() - 0.5).abs() < EPS);

        let fresh = new_concept();
        let empty = ReviewContext::new(&fresh, now);
        assert!(empty.last_review().is_none());
        assert!(empty.days_since_last_review().is_none());
        assert!(empty.days_overdue().is_none());
    }

    #[test]
    fn test_replay_matches_live_scheduling() {
        let scheduler = Scheduler::new();
        let mut history = ReviewHistory::new();
        let mut live = new_concept();

        for (day, grade) in [(0, 4), (1, 3), (3, 1), (4, 4)] {
            let outcome = scheduler
                .record_review(&live, grade, t0() + Duration::days(day))
                .unwrap();
            history.push(outcome.record);
            live = outcome.state;
        }

        let replayed = scheduler.replay("c1", &history).unwrap();
        assert_eq!(replayed, live);
    }

    #[test]
    fn test_replay_empty_history() {
        let state = Scheduler::new()
            .replay("c1", &ReviewHistory::new())
            .unwrap();
        assert_eq!(state, new_concept());
    }

    #[test]
    fn test_replay_skips_foreign_records() {
        let history = ReviewHistory::from_records(vec![
            ReviewRecord::new("c1", RecallGrade::Perfect, t0(), 1.0),
            ReviewRecord::new("other", RecallGrade::Perfect, t0() + Duration::days(1), 2.0),
        ]);
        let state = Scheduler::new().replay("c1", &history).unwrap();
        assert_eq!(state.last_interval_days, 1.0);
        assert_eq!(state.next_review_at, Some(t0() + Duration::days(1)));
    }

    #[test]
    fn test_replay_history_excludes_foreign_records() {
        let history = ReviewHistory::from_records(vec![
            ReviewRecord::new("c1", RecallGrade::Good, t0(), 1.0),
            ReviewRecord::new("other", RecallGrade::Good, t0() + Duration::days(1), 1.0),
            ReviewRecord::new("c1", RecallGrade::Good, t0() + Duration::days(2), 2.0),
        ]);
        let scheduler = Scheduler::with_policies(CountingPolicy, MovingAverageMastery::default());

        let state = scheduler.replay("c1", &history).unwrap();
        assert_eq!(state.last_interval_days, 2.0);
        assert_eq!(state.next_review_at, Some(t0() + Duration::days(4)));
    }

    #[test]
    fn test_add_days_fractional() {
        assert_eq!(add_days(t0(), 0.5), t0() + Duration::hours(12));
        assert_eq!(add_days(t0(), 2.0), t0() + Duration::days(2));
    }

    #[test]
    fn test_add_days_saturates() {
        assert_eq!(add_days(t0(), 1.0e300), DateTime::<Utc>::MAX_UTC);
        assert_eq!(add_days(t0(), 1.0e9), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_concurrent_reviews_of_distinct_concepts() {
        use std::sync::Arc;
        use std::thread;

        let scheduler = Arc::new(Scheduler::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let scheduler = Arc::clone(&scheduler);
                thread::spawn(move || {
                    let concept = ConceptState::new(format!("c{i}"));
                    scheduler.record_review(&concept, 4, t0()).unwrap()
                })
            })
            .collect();

        for handle in handles {
            let outcome = handle.join().unwrap();
            assert_eq!(outcome.state.last_interval_days, 1.0);
        }
    }

    // =========================================================================
    // Property-based tests
    // =========================================================================

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Property: the produced state always satisfies its invariants
            #[test]
            fn prop_output_state_is_valid(
                mastery in 0.0f64..=1.0,
                interval in 0.0f64..1.0e6,
                grade in 1i64..=4,
            ) {
                let concept = ConceptState {
                    id: "c1".to_string(),
                    mastery_level: mastery,
                    last_interval_days: interval,
                    next_review_at: None,
                };
                let outcome = Scheduler::new().record_review(&concept, grade, t0()).unwrap();
                prop_assert!(outcome.state.validate().is_ok());
                prop_assert!(outcome.state.next_review_at.unwrap() > t0());
                prop_assert_eq!(outcome.record.resulting_interval_days, outcome.state.last_interval_days);
            }

            // Property: grades outside the scale never produce a record
            #[test]
            fn prop_out_of_range_grade_rejected(grade in prop_oneof![i64::MIN..1, 5..i64::MAX]) {
                let result = Scheduler::new().record_review(&new_concept(), grade, t0());
                prop_assert_eq!(result, Err(SchedulingError::InvalidGrade { grade }));
            }
        }
    }
}
