use super::domain::{Actor, Candidate};
use std::any::Any;

/// Pluggable scoring strategy evaluated by a [`RankingEngine`](super::RankingEngine).
///
/// The engine multiplies the scores of its enabled scorers, in list order, to get a
/// candidate's final score. A running product of `0` or less stops the evaluation for
/// that candidate, and a negative final score removes the candidate from the results.
///
/// Lifecycle hooks are invoked by the owning engine only:
///
/// * `on_attach` once, when the scorer joins an initialized engine (or the engine initializes);
/// * `on_link` / `on_unlink` for every actor linked while the scorer is attached;
/// * `on_enable` / `on_disable` whenever "scorer enabled and engine active" flips;
/// * `on_detach` once, when the scorer is removed or the engine is dropped.
///
/// Scorers receive `&self` everywhere; state that must change across calls lives behind
/// the scorer's own interior mutability.
pub trait Scorer<A: Actor, C: Candidate>: Any + Send + Sync {
    /// Signed score of `candidate` for `actor`.
    fn score(&self, actor: &A, candidate: &C) -> Result<f64, ScorerError>;

    /// Name used in logs, errors and debug breakdowns.
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }

    fn on_attach(&self) {}

    fn on_enable(&self) {}

    fn on_disable(&self) {}

    fn on_detach(&self) {}

    fn on_link(&self, _actor: &A) {}

    fn on_unlink(&self, _actor: &A) {}
}

/// Failure raised by a scorer while computing a score.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScorerError {
    #[error("no score recorded for candidate {candidate}")]
    MissingScore { candidate: String },
    #[error("{0}")]
    Failed(String),
}

impl ScorerError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Scorer returning the same value for every candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantScorer {
    name: String,
    value: f64,
}

impl ConstantScorer {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl<A: Actor, C: Candidate> Scorer<A, C> for ConstantScorer {
    fn score(&self, _actor: &A, _candidate: &C) -> Result<f64, ScorerError> {
        Ok(self.value)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Scorer backed by a closure, convenient for wiring ad-hoc strategies.
pub struct FnScorer<F> {
    name: String,
    score_fn: F,
}

impl<F> FnScorer<F> {
    pub fn new(name: impl Into<String>, score_fn: F) -> Self {
        Self {
            name: name.into(),
            score_fn,
        }
    }
}

impl<A, C, F> Scorer<A, C> for FnScorer<F>
where
    A: Actor,
    C: Candidate,
    F: Fn(&A, &C) -> Result<f64, ScorerError> + Send + Sync + 'static,
{
    fn score(&self, actor: &A, candidate: &C) -> Result<f64, ScorerError> {
        (self.score_fn)(actor, candidate)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
