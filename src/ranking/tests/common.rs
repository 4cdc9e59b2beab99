use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};

use crate::ranking::{LinkSubscriber, RankedCandidate, RankingEngine, Scorer, ScorerError};

pub(super) type Actor = &'static str;
pub(super) type Target = &'static str;
pub(super) type Engine = RankingEngine<Actor, Target>;

pub(super) fn engine() -> Engine {
    RankingEngine::new("test-engine")
}

pub(super) fn ranked(results: &[RankedCandidate<Target>]) -> Vec<(Target, f64)> {
    results
        .iter()
        .map(|entry| (entry.candidate, entry.score))
        .collect()
}

/// Scorer answering from a fixed table and counting how often it was asked.
pub(super) struct TableScorer {
    name: &'static str,
    scores: HashMap<Target, f64>,
    fallback: f64,
    calls: AtomicUsize,
    evaluated: Mutex<Vec<Target>>,
}

impl TableScorer {
    pub(super) fn new(name: &'static str, scores: &[(Target, f64)]) -> Self {
        Self::with_fallback(name, scores, 1.0)
    }

    pub(super) fn with_fallback(
        name: &'static str,
        scores: &[(Target, f64)],
        fallback: f64,
    ) -> Self {
        Self {
            name,
            scores: scores.iter().copied().collect(),
            fallback,
            calls: AtomicUsize::new(0),
            evaluated: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn evaluated(&self) -> Vec<Target> {
        self.evaluated.lock().expect("evaluated mutex poisoned").clone()
    }
}

impl Scorer<Actor, Target> for TableScorer {
    fn score(&self, _actor: &Actor, candidate: &Target) -> Result<f64, ScorerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.evaluated
            .lock()
            .expect("evaluated mutex poisoned")
            .push(*candidate);
        Ok(self.scores.get(candidate).copied().unwrap_or(self.fallback))
    }

    fn name(&self) -> &str {
        self.name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Callback {
    Attach,
    Enable,
    Disable,
    Detach,
    Link(Actor),
    Unlink(Actor),
}

/// Shared record of lifecycle callbacks, tagged with the scorer that received them.
#[derive(Default, Clone)]
pub(super) struct CallbackLog {
    events: Arc<Mutex<Vec<(&'static str, Callback)>>>,
}

impl CallbackLog {
    pub(super) fn push(&self, scorer: &'static str, callback: Callback) {
        self.events
            .lock()
            .expect("callback mutex poisoned")
            .push((scorer, callback));
    }

    pub(super) fn take(&self) -> Vec<(&'static str, Callback)> {
        std::mem::take(&mut *self.events.lock().expect("callback mutex poisoned"))
    }

    pub(super) fn for_scorer(&self, scorer: &'static str) -> Vec<Callback> {
        self.events
            .lock()
            .expect("callback mutex poisoned")
            .iter()
            .filter(|(name, _)| *name == scorer)
            .map(|(_, callback)| callback.clone())
            .collect()
    }
}

/// Scorer that records every lifecycle hook it receives.
pub(super) struct RecordingScorer {
    name: &'static str,
    value: f64,
    log: CallbackLog,
}

impl RecordingScorer {
    pub(super) fn new(name: &'static str, log: &CallbackLog) -> Self {
        Self {
            name,
            value: 1.0,
            log: log.clone(),
        }
    }
}

impl Scorer<Actor, Target> for RecordingScorer {
    fn score(&self, _actor: &Actor, _candidate: &Target) -> Result<f64, ScorerError> {
        Ok(self.value)
    }

    fn name(&self) -> &str {
        self.name
    }

    fn on_attach(&self) {
        self.log.push(self.name, Callback::Attach);
    }

    fn on_enable(&self) {
        self.log.push(self.name, Callback::Enable);
    }

    fn on_disable(&self) {
        self.log.push(self.name, Callback::Disable);
    }

    fn on_detach(&self) {
        self.log.push(self.name, Callback::Detach);
    }

    fn on_link(&self, actor: &Actor) {
        self.log.push(self.name, Callback::Link(*actor));
    }

    fn on_unlink(&self, actor: &Actor) {
        self.log.push(self.name, Callback::Unlink(*actor));
    }
}

/// Link subscriber keeping the notifications it received.
#[derive(Default)]
pub(super) struct LinkLog {
    events: Mutex<Vec<(bool, Actor)>>,
}

impl LinkLog {
    pub(super) fn events(&self) -> Vec<(bool, Actor)> {
        self.events.lock().expect("link mutex poisoned").clone()
    }
}

impl LinkSubscriber<Actor> for LinkLog {
    fn actor_linked(&self, actor: &Actor) {
        self.events
            .lock()
            .expect("link mutex poisoned")
            .push((true, *actor));
    }

    fn actor_unlinked(&self, actor: &Actor) {
        self.events
            .lock()
            .expect("link mutex poisoned")
            .push((false, *actor));
    }
}

/// Late-bound reference from a scorer back to the engine that owns it.
#[derive(Default)]
pub(super) struct EngineSlot {
    engine: OnceLock<Weak<Engine>>,
}

impl EngineSlot {
    pub(super) fn bind(&self, engine: &Arc<Engine>) {
        self.engine
            .set(Arc::downgrade(engine))
            .expect("engine bound once");
    }

    pub(super) fn engine(&self) -> Arc<Engine> {
        self.engine
            .get()
            .and_then(Weak::upgrade)
            .expect("engine bound and alive")
    }
}
