#[cfg(feature = "debug-observer")]
use super::domain::ScorerHandle;
use super::domain::{Actor, Candidate, RankedCandidate};
use super::scorer::Scorer;
use std::collections::HashMap;
use std::sync::Arc;

/// Enabled scorer captured at the start of a ranking pass.
pub(crate) struct ActiveScorer<A, C> {
    #[cfg(feature = "debug-observer")]
    pub(crate) handle: ScorerHandle,
    pub(crate) scorer: Arc<dyn Scorer<A, C>>,
}

/// Scratch buffers of a single `process` call.
///
/// One session lives in each engine and is reused across calls; every buffer is
/// cleared (capacity kept) when a pass ends, whatever the exit path.
pub(crate) struct ProcessingSession<A, C> {
    pub(crate) scorers: Vec<ActiveScorer<A, C>>,
    pub(crate) scored: Vec<RankedCandidate<C>>,
    pub(crate) final_scores: HashMap<C, f64>,
    pub(crate) scorer_scores: HashMap<C, Vec<f64>>,
    spare_score_lists: Vec<Vec<f64>>,
}

impl<A: Actor, C: Candidate> ProcessingSession<A, C> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            scorers: Vec::new(),
            scored: Vec::with_capacity(capacity),
            final_scores: HashMap::new(),
            scorer_scores: HashMap::new(),
            spare_score_lists: Vec::new(),
        }
    }

    /// Empty per-scorer score list, recycled from a previous pass when possible.
    pub(crate) fn take_score_list(&mut self) -> Vec<f64> {
        self.spare_score_lists.pop().unwrap_or_default()
    }

    /// Records the per-scorer scores of `candidate`. A duplicate candidate keeps the last list.
    pub(crate) fn record_scores(&mut self, candidate: &C, scores: Vec<f64>) {
        if let Some(mut previous) = self.scorer_scores.insert(candidate.clone(), scores) {
            previous.clear();
            self.spare_score_lists.push(previous);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.scorers.clear();
        self.scored.clear();
        self.final_scores.clear();
        for (_, mut scores) in self.scorer_scores.drain() {
            scores.clear();
            self.spare_score_lists.push(scores);
        }
    }

    pub(crate) fn is_clear(&self) -> bool {
        self.scorers.is_empty()
            && self.scored.is_empty()
            && self.final_scores.is_empty()
            && self.scorer_scores.is_empty()
    }
}

impl<A: Actor, C: Candidate> Default for ProcessingSession<A, C> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}
