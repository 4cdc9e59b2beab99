//! Introspection hooks for tooling that wants to see how a ranking was produced.
//!
//! Observers are purely informational: they run after the ranked results are written
//! and before `process` returns, while the engine still counts as processing. Any
//! structural change attempted from an observer is subject to the same restrictions
//! as a change attempted from a scorer.

use super::domain::{Actor, Candidate, RankedCandidate, ScorerHandle};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;

/// Enabled scorer as it participated in a ranking pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScorerSummary {
    pub handle: ScorerHandle,
    pub name: String,
}

/// Borrowed view of a completed ranking pass.
///
/// `scorer_scores[candidate][i]` is the score produced by `scorers[i]`; lists are
/// shorter than `scorers` when the evaluation short-circuited. `final_scores` only
/// holds candidates that made it into `results`.
pub struct ProcessingReport<'a, A, C> {
    pub engine: &'a str,
    pub actor: &'a A,
    pub candidates: &'a [C],
    pub results: &'a [RankedCandidate<C>],
    pub scorers: &'a [ScorerSummary],
    pub final_scores: &'a HashMap<C, f64>,
    pub scorer_scores: &'a HashMap<C, Vec<f64>>,
}

impl<A: Actor, C: Candidate> ProcessingReport<'_, A, C> {
    /// Owned copy of the report, with one entry per input candidate in input order.
    pub fn to_breakdown(&self) -> ScoreBreakdown<A, C> {
        let mut ranks: HashMap<&C, usize> = HashMap::with_capacity(self.results.len());
        for (rank, ranked) in self.results.iter().enumerate() {
            ranks.entry(&ranked.candidate).or_insert(rank);
        }

        let entries = self
            .candidates
            .iter()
            .map(|candidate| BreakdownEntry {
                candidate: candidate.clone(),
                scorer_scores: self
                    .scorer_scores
                    .get(candidate)
                    .cloned()
                    .unwrap_or_default(),
                final_score: self.final_scores.get(candidate).copied(),
                rank: ranks.get(candidate).copied(),
            })
            .collect();

        ScoreBreakdown {
            engine: self.engine.to_string(),
            actor: self.actor.clone(),
            recorded_at: Utc::now(),
            scorers: self.scorers.to_vec(),
            entries,
        }
    }
}

/// Passive subscriber notified after every successful ranking pass.
pub trait DebugObserver<A, C>: Send + Sync {
    fn processing_completed(&self, report: &ProcessingReport<'_, A, C>);
}

/// Serializable per-scorer breakdown of one ranking pass.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreBreakdown<A, C> {
    pub engine: String,
    pub actor: A,
    pub recorded_at: DateTime<Utc>,
    pub scorers: Vec<ScorerSummary>,
    pub entries: Vec<BreakdownEntry<C>>,
}

impl<A, C: PartialEq> ScoreBreakdown<A, C> {
    pub fn entry(&self, candidate: &C) -> Option<&BreakdownEntry<C>> {
        self.entries
            .iter()
            .find(|entry| &entry.candidate == candidate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownEntry<C> {
    pub candidate: C,
    pub scorer_scores: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
}

impl<C> BreakdownEntry<C> {
    pub fn included(&self) -> bool {
        self.rank.is_some()
    }
}

/// Observer that keeps an owned breakdown of every pass it sees.
pub struct CapturingObserver<A, C> {
    captured: Mutex<Vec<ScoreBreakdown<A, C>>>,
}

impl<A, C> Default for CapturingObserver<A, C> {
    fn default() -> Self {
        Self {
            captured: Mutex::new(Vec::new()),
        }
    }
}

impl<A: Actor, C: Candidate> CapturingObserver<A, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.captured.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.captured.lock().is_empty()
    }

    pub fn last(&self) -> Option<ScoreBreakdown<A, C>> {
        self.captured.lock().last().cloned()
    }

    pub fn drain(&self) -> Vec<ScoreBreakdown<A, C>> {
        std::mem::take(&mut *self.captured.lock())
    }
}

impl<A: Actor, C: Candidate> DebugObserver<A, C> for CapturingObserver<A, C> {
    fn processing_completed(&self, report: &ProcessingReport<'_, A, C>) {
        let breakdown = report.to_breakdown();
        self.captured.lock().push(breakdown);
    }
}
