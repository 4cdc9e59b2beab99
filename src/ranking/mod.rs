//! Candidate filtering and weighted ranking.
//!
//! A [`RankingEngine`] owns an ordered pipeline of [`Scorer`]s. Every candidate handed to
//! [`RankingEngine::process`] starts at `1.0` and is multiplied by the score of each
//! enabled scorer in turn; candidates whose product ends negative are filtered out and
//! the rest are ranked best first. The pipeline may be reshaped between passes, and the
//! engine rejects the structural changes that would corrupt a pass in flight.

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod link;
#[cfg(feature = "debug-observer")]
pub mod observer;
pub mod scorer;
pub(crate) mod session;
pub mod weight;

#[cfg(test)]
mod tests;

pub use config::EngineConfig;
pub use domain::{Actor, Candidate, RankedCandidate, ScorerHandle, SubscriptionId};
pub use engine::RankingEngine;
pub use error::{Mutation, RankingError};
pub use link::LinkSubscriber;
#[cfg(feature = "debug-observer")]
pub use observer::{
    BreakdownEntry, CapturingObserver, DebugObserver, ProcessingReport, ScoreBreakdown,
    ScorerSummary,
};
pub use scorer::{ConstantScorer, FnScorer, Scorer, ScorerError};
pub use weight::{CurveError, WeightCurve, Weighted};
