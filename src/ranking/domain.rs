use serde::Serialize;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

/// Handle of the acting entity that asks the engine to rank candidates.
///
/// Actors are only looked up, never owned, so any cheap clonable identifier works.
pub trait Actor: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {}

impl<T> Actor for T where T: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {}

/// Handle of an interaction target supplied to a single `process` call.
pub trait Candidate: Actor + Eq + Hash {}

impl<T> Candidate for T where T: Actor + Eq + Hash {}

/// Opaque identifier of a scorer owned by a [`RankingEngine`](super::RankingEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScorerHandle(u64);

static SCORER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

impl ScorerHandle {
    pub(crate) fn next() -> Self {
        Self(SCORER_SEQUENCE.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScorerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scorer-{:06}", self.0)
    }
}

/// Candidate that survived filtering, paired with its final score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate<C> {
    pub candidate: C,
    pub score: f64,
}

impl<C> RankedCandidate<C> {
    pub fn new(candidate: C, score: f64) -> Self {
        Self { candidate, score }
    }
}

/// Identifier returned when registering a link subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_unique_and_formatted() {
        let first = ScorerHandle::next();
        let second = ScorerHandle::next();

        assert_ne!(first, second);
        assert!(second.id() > first.id());
        assert!(first.to_string().starts_with("scorer-"));
        assert_eq!(first.to_string().len(), "scorer-".len() + 6);
    }

    #[test]
    fn ranked_candidates_serialize_for_reports() {
        let value = serde_json::to_value(RankedCandidate::new("lamp", 0.25)).expect("serializes");
        assert_eq!(value, serde_json::json!({ "candidate": "lamp", "score": 0.25 }));
    }
}
