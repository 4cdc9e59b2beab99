use super::domain::ScorerHandle;
use super::scorer::ScorerError;

/// Structural operation rejected while a `process` call is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    RemoveScorer,
    DisableScorer,
    Unlink,
}

impl Mutation {
    pub fn label(&self) -> &'static str {
        match self {
            Mutation::RemoveScorer => "remove a scorer",
            Mutation::DisableScorer => "disable a scorer",
            Mutation::Unlink => "unlink an actor",
        }
    }
}

/// Error raised by the ranking engine.
#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    #[error("engine {engine} is already processing, cannot start a new pass")]
    AlreadyProcessing { engine: String },
    #[error("cannot {} while engine {engine} is processing", .operation.label())]
    MutationWhileProcessing { engine: String, operation: Mutation },
    #[error("scorer {0} is not owned by this engine")]
    ScorerNotFound(ScorerHandle),
    #[error("index {index} is out of range for {len} scorer(s)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("scorer factory failed: {0}")]
    InvalidFactory(#[source] ScorerError),
    #[error("scorer {scorer} failed: {source}")]
    ScorerFailure {
        scorer: String,
        #[source]
        source: ScorerError,
    },
}

impl RankingError {
    pub fn is_reentrancy(&self) -> bool {
        matches!(self, RankingError::AlreadyProcessing { .. })
    }

    pub fn is_mutation_while_processing(&self) -> bool {
        matches!(self, RankingError::MutationWhileProcessing { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_engine_and_operation() {
        let err = RankingError::MutationWhileProcessing {
            engine: "left-hand".to_string(),
            operation: Mutation::Unlink,
        };
        assert_eq!(
            err.to_string(),
            "cannot unlink an actor while engine left-hand is processing"
        );
        assert!(err.is_mutation_while_processing());
        assert!(!err.is_reentrancy());
    }

    #[test]
    fn scorer_failure_keeps_its_source() {
        let err = RankingError::ScorerFailure {
            scorer: "proximity".to_string(),
            source: ScorerError::failed("sensor offline"),
        };
        let source = std::error::Error::source(&err).expect("source retained");
        assert_eq!(source.to_string(), "sensor offline");
    }
}
