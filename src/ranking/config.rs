use serde::{Deserialize, Serialize};

/// Construction settings for a [`RankingEngine`](super::RankingEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Candidates the pooled scratch buffers are sized for up front.
    pub scratch_capacity: usize,
    /// Whether the engine starts active (scorers attached and enabled on add).
    pub start_active: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scratch_capacity: 32,
            start_active: true,
        }
    }
}
