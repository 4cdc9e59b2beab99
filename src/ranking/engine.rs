use std::any::Any;
use std::cmp::Ordering as ScoreOrdering;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::config::EngineConfig;
use super::domain::{Actor, Candidate, RankedCandidate, ScorerHandle, SubscriptionId};
use super::error::{Mutation, RankingError};
use super::link::LinkSubscriber;
#[cfg(feature = "debug-observer")]
use super::observer::{DebugObserver, ProcessingReport, ScorerSummary};
use super::scorer::{Scorer, ScorerError};
use super::session::{ActiveScorer, ProcessingSession};

struct ScorerSlot<A, C> {
    handle: ScorerHandle,
    scorer: Arc<dyn Scorer<A, C>>,
    any: Arc<dyn Any + Send + Sync>,
    enabled: bool,
    attached: bool,
    hooks_enabled: bool,
}

struct EngineState<A, C> {
    scorers: Vec<ScorerSlot<A, C>>,
    linked: Vec<A>,
    subscribers: Vec<(SubscriptionId, Arc<dyn LinkSubscriber<A>>)>,
    next_subscription: u64,
    initialized: bool,
    active: bool,
}

impl<A: Actor, C: Candidate> EngineState<A, C> {
    fn slot_mut(&mut self, handle: ScorerHandle) -> Option<&mut ScorerSlot<A, C>> {
        self.scorers.iter_mut().find(|slot| slot.handle == handle)
    }

    fn position(&self, handle: ScorerHandle) -> Option<usize> {
        self.scorers.iter().position(|slot| slot.handle == handle)
    }

    fn attached_scorers(&self) -> Vec<Arc<dyn Scorer<A, C>>> {
        self.scorers
            .iter()
            .filter(|slot| slot.attached)
            .map(|slot| Arc::clone(&slot.scorer))
            .collect()
    }

    fn subscribers(&self) -> Vec<Arc<dyn LinkSubscriber<A>>> {
        self.subscribers
            .iter()
            .map(|(_, subscriber)| Arc::clone(subscriber))
            .collect()
    }
}

/// Ordered pipeline of scorers that filters and ranks interaction candidates.
///
/// The engine exclusively owns its scorers and tracks the actors linked to it. All
/// operations take `&self`: state sits behind a lock that is never held while scorer
/// code, subscribers or observers run, so they may call back into the engine. The
/// `processing` flag then decides what they are allowed to do:
///
/// * a second `process` call (recursive or from another thread) is rejected;
/// * removing or disabling a scorer and unlinking an actor are rejected;
/// * adding or moving scorers and linking actors are accepted and only affect later passes.
pub struct RankingEngine<A: Actor, C: Candidate> {
    name: String,
    state: Mutex<EngineState<A, C>>,
    processing: AtomicBool,
    session: Mutex<ProcessingSession<A, C>>,
    #[cfg(feature = "debug-observer")]
    observer: Mutex<Option<Arc<dyn DebugObserver<A, C>>>>,
}

impl<A: Actor, C: Candidate> RankingEngine<A, C> {
    /// Creates an active engine with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, &EngineConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: &EngineConfig) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(EngineState {
                scorers: Vec::new(),
                linked: Vec::new(),
                subscribers: Vec::new(),
                next_subscription: 1,
                initialized: config.start_active,
                active: config.start_active,
            }),
            processing: AtomicBool::new(false),
            session: Mutex::new(ProcessingSession::with_capacity(config.scratch_capacity)),
            #[cfg(feature = "debug-observer")]
            observer: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a ranking pass is currently running on this engine.
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    /// Whether `process` may be called right now without hitting the reentrancy guard.
    pub fn can_process(&self) -> bool {
        !self.is_processing()
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    /// Activates or deactivates the engine.
    ///
    /// The first activation attaches every scorer. Activation enables the scorers whose
    /// own flag is set; deactivation disables them again.
    pub fn set_active(&self, active: bool) {
        let handles = {
            let mut state = self.state.lock();
            if state.active == active {
                return;
            }
            state.active = active;
            if active {
                state.initialized = true;
            }
            state
                .scorers
                .iter()
                .map(|slot| slot.handle)
                .collect::<Vec<_>>()
        };

        debug!(engine = %self.name, active, "engine activation changed");

        if active {
            for handle in &handles {
                self.attach(*handle);
            }
        }
        for handle in handles {
            self.sync_enabled(handle);
        }
    }

    /// Appends `scorer` to the end of the pipeline.
    ///
    /// Always permitted; a scorer added during a ranking pass joins from the next pass.
    pub fn add_scorer<S>(&self, scorer: S) -> ScorerHandle
    where
        S: Scorer<A, C>,
    {
        let scorer = Arc::new(scorer);
        let any: Arc<dyn Any + Send + Sync> = scorer.clone();
        let scorer: Arc<dyn Scorer<A, C>> = scorer;
        let handle = ScorerHandle::next();

        let initialized = {
            let mut state = self.state.lock();
            debug!(
                engine = %self.name,
                scorer = scorer.name(),
                %handle,
                position = state.scorers.len(),
                "scorer added"
            );
            state.scorers.push(ScorerSlot {
                handle,
                scorer,
                any,
                enabled: true,
                attached: false,
                hooks_enabled: false,
            });
            state.initialized
        };

        if initialized {
            self.attach(handle);
            self.sync_enabled(handle);
        }

        handle
    }

    /// Builds a scorer with `factory` and appends it.
    pub fn add_scorer_with<S, F>(&self, factory: F) -> Result<ScorerHandle, RankingError>
    where
        S: Scorer<A, C>,
        F: FnOnce() -> Result<S, ScorerError>,
    {
        let scorer = factory().map_err(RankingError::InvalidFactory)?;
        Ok(self.add_scorer(scorer))
    }

    /// Detaches and drops the scorer identified by `handle`.
    pub fn remove_scorer(&self, handle: ScorerHandle) -> Result<(), RankingError> {
        let (slot, linked) = {
            let mut state = self.state.lock();
            self.ensure_idle(Mutation::RemoveScorer)?;
            let index = state
                .position(handle)
                .ok_or(RankingError::ScorerNotFound(handle))?;
            (state.scorers.remove(index), state.linked.clone())
        };

        self.detach(slot, &linked);
        Ok(())
    }

    /// Detaches and drops the scorer at `index`.
    pub fn remove_scorer_at(&self, index: usize) -> Result<(), RankingError> {
        let (slot, linked) = {
            let mut state = self.state.lock();
            self.ensure_idle(Mutation::RemoveScorer)?;
            let len = state.scorers.len();
            if index >= len {
                return Err(RankingError::IndexOutOfRange { index, len });
            }
            (state.scorers.remove(index), state.linked.clone())
        };

        self.detach(slot, &linked);
        Ok(())
    }

    /// Moves a scorer so that it ends up at `new_index`.
    ///
    /// Changes the evaluation order, and therefore the short-circuit behavior, of every
    /// later pass. A pass already in flight keeps its own snapshot.
    pub fn move_scorer_to(
        &self,
        handle: ScorerHandle,
        new_index: usize,
    ) -> Result<(), RankingError> {
        let mut state = self.state.lock();
        let current = state
            .position(handle)
            .ok_or(RankingError::ScorerNotFound(handle))?;
        let len = state.scorers.len();
        if new_index >= len {
            return Err(RankingError::IndexOutOfRange {
                index: new_index,
                len,
            });
        }
        if current == new_index {
            return Ok(());
        }

        let slot = state.scorers.remove(current);
        state.scorers.insert(new_index, slot);
        debug!(
            engine = %self.name,
            %handle,
            from = current,
            to = new_index,
            "scorer moved"
        );
        Ok(())
    }

    pub fn is_scorer_enabled(&self, handle: ScorerHandle) -> Result<bool, RankingError> {
        self.state
            .lock()
            .slot_mut(handle)
            .map(|slot| slot.enabled)
            .ok_or(RankingError::ScorerNotFound(handle))
    }

    /// Sets a scorer's own enabled flag. Disabling is rejected during a ranking pass.
    pub fn set_scorer_enabled(
        &self,
        handle: ScorerHandle,
        enabled: bool,
    ) -> Result<(), RankingError> {
        {
            let mut state = self.state.lock();
            let current = state
                .slot_mut(handle)
                .map(|slot| slot.enabled)
                .ok_or(RankingError::ScorerNotFound(handle))?;
            if current == enabled {
                return Ok(());
            }
            if !enabled {
                self.ensure_idle(Mutation::DisableScorer)?;
            }
            if let Some(slot) = state.slot_mut(handle) {
                slot.enabled = enabled;
            }
        }

        self.sync_enabled(handle);
        Ok(())
    }

    pub fn scorer_count(&self) -> usize {
        self.state.lock().scorers.len()
    }

    /// Every scorer in evaluation order.
    pub fn scorer_handles(&self) -> Vec<ScorerHandle> {
        self.state.lock().scorers.iter().map(|slot| slot.handle).collect()
    }

    pub fn scorer_at(&self, index: usize) -> Option<ScorerHandle> {
        self.state.lock().scorers.get(index).map(|slot| slot.handle)
    }

    /// Snapshot of the enabled scorers, in evaluation order.
    pub fn enabled_scorers(&self) -> Vec<ScorerHandle> {
        self.state
            .lock()
            .scorers
            .iter()
            .filter(|slot| slot.enabled)
            .map(|slot| slot.handle)
            .collect()
    }

    pub fn scorer_name(&self, handle: ScorerHandle) -> Option<String> {
        self.state
            .lock()
            .slot_mut(handle)
            .map(|slot| slot.scorer.name().to_string())
    }

    /// Typed access to the scorer behind `handle`.
    pub fn scorer<T>(&self, handle: ScorerHandle) -> Option<Arc<T>>
    where
        T: Scorer<A, C>,
    {
        let any = self
            .state
            .lock()
            .slot_mut(handle)
            .map(|slot| Arc::clone(&slot.any))?;
        any.downcast::<T>().ok()
    }

    /// First scorer of type `T` in evaluation order.
    pub fn find_scorer<T>(&self) -> Option<ScorerHandle>
    where
        T: Scorer<A, C>,
    {
        self.state
            .lock()
            .scorers
            .iter()
            .find(|slot| slot.any.is::<T>())
            .map(|slot| slot.handle)
    }

    /// Links `actor`, returning `false` when it was already linked.
    pub fn link(&self, actor: A) -> bool {
        let (scorers, subscribers) = {
            let mut state = self.state.lock();
            if state.linked.contains(&actor) {
                return false;
            }
            state.linked.push(actor.clone());
            (state.attached_scorers(), state.subscribers())
        };

        debug!(engine = %self.name, ?actor, "actor linked");
        for scorer in &scorers {
            scorer.on_link(&actor);
        }
        for subscriber in &subscribers {
            subscriber.actor_linked(&actor);
        }
        true
    }

    /// Unlinks `actor`, returning `false` when it was not linked.
    pub fn unlink(&self, actor: &A) -> Result<bool, RankingError> {
        let (removed, scorers, subscribers) = {
            let mut state = self.state.lock();
            self.ensure_idle(Mutation::Unlink)?;
            let Some(index) = state.linked.iter().position(|linked| linked == actor) else {
                return Ok(false);
            };
            let removed = state.linked.remove(index);
            (removed, state.attached_scorers(), state.subscribers())
        };

        debug!(engine = %self.name, actor = ?removed, "actor unlinked");
        for scorer in &scorers {
            scorer.on_unlink(&removed);
        }
        for subscriber in &subscribers {
            subscriber.actor_unlinked(&removed);
        }
        Ok(true)
    }

    pub fn linked_actors(&self) -> Vec<A> {
        self.state.lock().linked.clone()
    }

    pub fn is_linked(&self, actor: &A) -> bool {
        self.state.lock().linked.contains(actor)
    }

    pub fn subscribe_links(&self, subscriber: Arc<dyn LinkSubscriber<A>>) -> SubscriptionId {
        let mut state = self.state.lock();
        let id = SubscriptionId(state.next_subscription);
        state.next_subscription += 1;
        state.subscribers.push((id, subscriber));
        id
    }

    pub fn unsubscribe_links(&self, id: SubscriptionId) -> bool {
        let mut state = self.state.lock();
        let before = state.subscribers.len();
        state.subscribers.retain(|(existing, _)| *existing != id);
        state.subscribers.len() != before
    }

    #[cfg(feature = "debug-observer")]
    pub fn set_observer(&self, observer: Option<Arc<dyn DebugObserver<A, C>>>) {
        *self.observer.lock() = observer;
    }

    /// Scores `candidates` for `actor` and writes the survivors to `results`, best first.
    ///
    /// Each candidate starts at `1.0` and is multiplied by the score of every enabled
    /// scorer in list order. Evaluation of a candidate stops as soon as the running
    /// product is `0` or less. Candidates whose final score is `0` or more are kept, so
    /// a candidate stopped at exactly `0` is still ranked (last), while a negative one
    /// is dropped. Equal scores keep their input order.
    ///
    /// `results` is only replaced when the whole pass succeeds.
    pub fn process(
        &self,
        actor: &A,
        candidates: &[C],
        results: &mut Vec<RankedCandidate<C>>,
    ) -> Result<(), RankingError> {
        if self
            .processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(engine = %self.name, "rejected ranking pass while another is running");
            return Err(RankingError::AlreadyProcessing {
                engine: self.name.clone(),
            });
        }

        let mut pass = RankingPass::begin(self);
        let session = &mut pass.session;

        {
            let state = self.state.lock();
            session.scorers.extend(
                state
                    .scorers
                    .iter()
                    .filter(|slot| slot.enabled)
                    .map(|slot| ActiveScorer {
                        #[cfg(feature = "debug-observer")]
                        handle: slot.handle,
                        scorer: Arc::clone(&slot.scorer),
                    }),
            );
        }

        #[cfg(feature = "debug-observer")]
        let observer = self.observer.lock().clone();
        #[cfg(feature = "debug-observer")]
        let record_breakdown = observer.is_some();
        #[cfg(not(feature = "debug-observer"))]
        let record_breakdown = false;

        for candidate in candidates {
            let mut recorded = record_breakdown.then(|| session.take_score_list());
            let mut final_score = 1.0_f64;

            for active in &session.scorers {
                let score = active.scorer.score(actor, candidate).map_err(|source| {
                    RankingError::ScorerFailure {
                        scorer: active.scorer.name().to_string(),
                        source,
                    }
                })?;
                if let Some(scores) = recorded.as_mut() {
                    scores.push(score);
                }

                final_score *= score;
                if final_score <= 0.0 {
                    break;
                }
            }

            if let Some(scores) = recorded.take() {
                session.record_scores(candidate, scores);
            }

            if final_score >= 0.0 {
                session
                    .scored
                    .push(RankedCandidate::new(candidate.clone(), final_score));
                if record_breakdown {
                    session.final_scores.insert(candidate.clone(), final_score);
                }
            }
        }

        // Stable sort: ties keep the caller's candidate order.
        session.scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(ScoreOrdering::Equal)
        });

        results.clear();
        results.extend(session.scored.drain(..));

        #[cfg(feature = "debug-observer")]
        if let Some(observer) = observer {
            let summaries: Vec<ScorerSummary> = session
                .scorers
                .iter()
                .map(|active| ScorerSummary {
                    handle: active.handle,
                    name: active.scorer.name().to_string(),
                })
                .collect();
            observer.processing_completed(&ProcessingReport {
                engine: &self.name,
                actor,
                candidates,
                results: results.as_slice(),
                scorers: &summaries,
                final_scores: &session.final_scores,
                scorer_scores: &session.scorer_scores,
            });
        }

        trace!(
            engine = %self.name,
            scorers = session.scorers.len(),
            candidates = candidates.len(),
            ranked = results.len(),
            "ranking pass completed"
        );

        Ok(())
    }

    /// Convenience wrapper around [`process`](Self::process) returning a fresh list.
    pub fn rank(
        &self,
        actor: &A,
        candidates: &[C],
    ) -> Result<Vec<RankedCandidate<C>>, RankingError> {
        let mut results = Vec::with_capacity(candidates.len());
        self.process(actor, candidates, &mut results)?;
        Ok(results)
    }

    fn ensure_idle(&self, operation: Mutation) -> Result<(), RankingError> {
        if self.is_processing() {
            warn!(
                engine = %self.name,
                operation = operation.label(),
                "rejected mutation while processing"
            );
            return Err(RankingError::MutationWhileProcessing {
                engine: self.name.clone(),
                operation,
            });
        }
        Ok(())
    }

    fn attach(&self, handle: ScorerHandle) {
        let (scorer, linked) = {
            let mut state = self.state.lock();
            if !state.initialized {
                return;
            }
            let linked = state.linked.clone();
            let Some(slot) = state.slot_mut(handle) else {
                return;
            };
            if slot.attached {
                return;
            }
            slot.attached = true;
            (Arc::clone(&slot.scorer), linked)
        };

        scorer.on_attach();
        for actor in &linked {
            scorer.on_link(actor);
        }
    }

    fn sync_enabled(&self, handle: ScorerHandle) {
        let (scorer, enable) = {
            let mut state = self.state.lock();
            let active = state.active;
            let Some(slot) = state.slot_mut(handle) else {
                return;
            };
            let wanted = slot.attached && slot.enabled && active;
            if wanted == slot.hooks_enabled {
                return;
            }
            slot.hooks_enabled = wanted;
            (Arc::clone(&slot.scorer), wanted)
        };

        if enable {
            scorer.on_enable();
        } else {
            scorer.on_disable();
        }
    }

    fn detach(&self, slot: ScorerSlot<A, C>, linked: &[A]) {
        debug!(
            engine = %self.name,
            scorer = slot.scorer.name(),
            handle = %slot.handle,
            "scorer removed"
        );
        Self::release(slot, linked);
    }

    fn release(slot: ScorerSlot<A, C>, linked: &[A]) {
        if slot.hooks_enabled {
            slot.scorer.on_disable();
        }
        if slot.attached {
            for actor in linked {
                slot.scorer.on_unlink(actor);
            }
            slot.scorer.on_detach();
        }
    }
}

impl<A: Actor, C: Candidate> Drop for RankingEngine<A, C> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        let slots = std::mem::take(&mut state.scorers);
        let linked = std::mem::take(&mut state.linked);
        for slot in slots {
            Self::release(slot, &linked);
        }
    }
}

/// Owns the pooled scratch state for the duration of one `process` call.
///
/// Dropping it clears the buffers, hands them back to the engine and lowers the
/// `processing` flag, on success, on error and on panic alike.
struct RankingPass<'e, A: Actor, C: Candidate> {
    engine: &'e RankingEngine<A, C>,
    session: ProcessingSession<A, C>,
}

impl<'e, A: Actor, C: Candidate> RankingPass<'e, A, C> {
    fn begin(engine: &'e RankingEngine<A, C>) -> Self {
        let session = std::mem::take(&mut *engine.session.lock());
        debug_assert!(session.is_clear());
        Self { engine, session }
    }
}

impl<A: Actor, C: Candidate> Drop for RankingPass<'_, A, C> {
    fn drop(&mut self) {
        let mut session = std::mem::take(&mut self.session);
        session.clear();
        *self.engine.session.lock() = session;
        self.engine.processing.store(false, Ordering::Release);
    }
}
