//! Tuning knobs for the transcript engine.

use crate::scan::{EXIT_LOOKAHEAD, LOOK_LOOKAHEAD, TITLE_LOOKAHEAD};

/// Configuration for a transcript engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum word-set similarity for two descriptions to count as one room.
    pub similarity_threshold: f64,
    /// Normalised descriptions shorter than this must match exactly.
    pub exact_match_below: usize,
    /// Lines scanned after a room title.
    pub title_lookahead: usize,
    /// Lines scanned for a wrapped exit list.
    pub exit_lookahead: usize,
    /// Lines scanned for `look <direction>` output.
    pub look_lookahead: usize,
    /// Consecutive lost-concentration failures before a room counts as no-magic.
    pub transient_failure_limit: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.98,
            exact_match_below: 50,
            title_lookahead: TITLE_LOOKAHEAD,
            exit_lookahead: EXIT_LOOKAHEAD,
            look_lookahead: LOOK_LOOKAHEAD,
            transient_failure_limit: 3,
        }
    }
}

impl EngineConfig {
    /// Set the similarity threshold (clamped to 0.0-1.0).
    pub fn with_similarity(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the transient failure limit (at least 1).
    pub fn with_failure_limit(mut self, limit: u32) -> Self {
        self.transient_failure_limit = limit.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.similarity_threshold, 0.98);
        assert_eq!(cfg.exact_match_below, 50);
        assert_eq!(cfg.transient_failure_limit, 3);
        assert_eq!(cfg.title_lookahead, 50);
    }

    #[test]
    fn builder_methods_clamp() {
        let cfg = EngineConfig::default()
            .with_similarity(1.5)
            .with_failure_limit(0);
        assert_eq!(cfg.similarity_threshold, 1.0);
        assert_eq!(cfg.transient_failure_limit, 1);
    }
}
