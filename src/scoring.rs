//! Scoring collaborator hooks
//!
//! The engine only reports what happened; point arithmetic belongs to the host.

use serde::{Deserialize, Serialize};

use crate::sim::Tile;

/// Called by the engine at fixed points of every cascade
pub trait ScoreHooks {
    /// Before the first effect of a cascade is queued
    fn start_cascade_sequence(&mut self) {}

    /// The submitted word, before it explodes
    fn score_word(&mut self, _word: &[Tile]) {}

    /// Once per chain wave with the tiles it destroyed
    fn record_chain_reaction(&mut self, _exploded: &[Tile]) {}

    /// When the queue goes idle at the end of the cascade
    fn end_cascade_sequence(&mut self) {}
}

/// Ignores every hook
#[derive(Debug, Clone, Copy, Default)]
pub struct NoScoring;

impl ScoreHooks for NoScoring {}

/// Reference scorer: letter values times multipliers, plus a chain bonus
/// that grows with the number of waves in the cascade.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainTally {
    pub score: u64,
    pub words: u32,
    pub cascades: u32,
    /// Waves in the cascade currently resolving
    pub chain_waves: u32,
    pub chain_tiles: u32,
    /// Longest chain seen
    pub best_chain: u32,
    pending_chain_points: u64,
    in_cascade: bool,
}

impl ChainTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_cascade(&self) -> bool {
        self.in_cascade
    }

    fn chain_bonus_multiplier(waves: u32) -> f64 {
        (1.0 + waves.saturating_sub(1) as f64 * 0.25).min(4.0)
    }
}

impl ScoreHooks for ChainTally {
    fn start_cascade_sequence(&mut self) {
        self.in_cascade = true;
        self.chain_waves = 0;
        self.pending_chain_points = 0;
    }

    fn score_word(&mut self, word: &[Tile]) {
        let base = word
            .iter()
            .fold(0u64, |acc, t| acc.saturating_add(t.value as u64));
        let multiplier = word
            .iter()
            .fold(1u64, |acc, t| acc.saturating_mul(t.multiplier() as u64));
        self.score = self.score.saturating_add(base.saturating_mul(multiplier));
        self.words += 1;
    }

    fn record_chain_reaction(&mut self, exploded: &[Tile]) {
        self.chain_waves += 1;
        self.chain_tiles += exploded.len() as u32;
        self.pending_chain_points += exploded.iter().map(|t| t.value as u64).sum::<u64>();
    }

    fn end_cascade_sequence(&mut self) {
        let bonus = self.pending_chain_points as f64 * Self::chain_bonus_multiplier(self.chain_waves);
        self.score = self.score.saturating_add(bonus.round() as u64);
        self.best_chain = self.best_chain.max(self.chain_waves);
        self.pending_chain_points = 0;
        self.cascades += 1;
        self.in_cascade = false;
    }
}
