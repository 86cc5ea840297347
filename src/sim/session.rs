//! Cascade session: per-cascade bookkeeping and the safety governor
//!
//! One session spans a word submission until the grid is stable again. The
//! governor stops propagation on depth, wall-clock or sustained frame-rate
//! limits; stopping is a normal outcome that sends the cascade to gravity.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::Coord;
use crate::settings::CascadeConfig;

/// Why a cascade stopped propagating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// No further detonations
    Settled,
    DepthLimit,
    TimeLimit,
    /// Visual intensity decayed below the floor
    Performance,
    /// Host called `abort_cascade`
    Aborted,
}

/// Limits snapshotted from the config when a session begins
#[derive(Debug, Clone, Copy, PartialEq)]
struct Limits {
    max_depth: u32,
    max_duration_ms: f64,
    low_fps: f32,
    window: usize,
    decay: f32,
    floor: f32,
}

impl Limits {
    fn from_config(config: &CascadeConfig) -> Self {
        Self {
            max_depth: config.effective_max_depth(),
            max_duration_ms: config.max_duration_ms,
            low_fps: config.low_fps_threshold,
            window: config.perf_window.max(1),
            decay: config.intensity_decay,
            floor: config.intensity_floor,
        }
    }
}

/// Result of one finished cascade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeSummary {
    pub word_len: usize,
    pub tiles_destroyed: u32,
    pub blockers_converted: u32,
    pub chain_reactions: u32,
    /// Ripple passes run
    pub depth: u32,
    pub effects_failed: u32,
    pub stop_reason: StopReason,
    pub elapsed_ms: f64,
    pub final_intensity: f32,
}

#[derive(Debug, Clone)]
pub struct CascadeSession {
    active: bool,
    depth: u32,
    visited: HashSet<Coord>,
    start_ms: f64,
    chain_reaction_count: u32,
    visual_intensity: f32,
    frame_fps: Vec<f32>,
    limits: Limits,
    stop: Option<StopReason>,
    word_len: usize,
    pub(crate) tiles_destroyed: u32,
    pub(crate) blockers_converted: u32,
    pub(crate) effects_failed: u32,
}

impl Default for CascadeSession {
    fn default() -> Self {
        Self {
            active: false,
            depth: 0,
            visited: HashSet::new(),
            start_ms: 0.0,
            chain_reaction_count: 0,
            visual_intensity: 1.0,
            frame_fps: Vec::new(),
            limits: Limits::from_config(&CascadeConfig::default()),
            stop: None,
            word_len: 0,
            tiles_destroyed: 0,
            blockers_converted: 0,
            effects_failed: 0,
        }
    }
}

impl CascadeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh session. Any previous state is discarded first.
    pub fn begin(&mut self, now_ms: f64, config: &CascadeConfig, word_len: usize) {
        self.clear();
        self.active = true;
        self.start_ms = now_ms;
        self.limits = Limits::from_config(config);
        self.word_len = word_len;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn chain_reaction_count(&self) -> u32 {
        self.chain_reaction_count
    }

    pub fn visual_intensity(&self) -> f32 {
        self.visual_intensity
    }

    pub fn elapsed_ms(&self, now_ms: f64) -> f64 {
        (now_ms - self.start_ms).max(0.0)
    }

    /// Limit that stopped propagation, if any
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }

    /// Advance to the next ripple pass
    pub fn next_depth(&mut self) -> u32 {
        self.depth += 1;
        self.depth
    }

    pub fn advance_chain(&mut self) -> u32 {
        self.chain_reaction_count += 1;
        self.chain_reaction_count
    }

    /// Returns false if `pos` was already visited this session
    pub fn visit(&mut self, pos: Coord) -> bool {
        self.visited.insert(pos)
    }

    pub fn is_visited(&self, pos: Coord) -> bool {
        self.visited.contains(&pos)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Governor check. Once a limit trips it stays tripped for the session.
    pub fn can_continue(&mut self, now_ms: f64) -> bool {
        if self.stop.is_some() {
            return false;
        }
        let reason = if self.depth >= self.limits.max_depth {
            Some(StopReason::DepthLimit)
        } else if self.elapsed_ms(now_ms) > self.limits.max_duration_ms {
            Some(StopReason::TimeLimit)
        } else if self.visual_intensity < self.limits.floor {
            Some(StopReason::Performance)
        } else {
            None
        };

        if let Some(reason) = reason {
            log::warn!(
                "Cascade governor stop: {:?} (depth={}, elapsed={:.0}ms, intensity={:.2})",
                reason,
                self.depth,
                self.elapsed_ms(now_ms),
                self.visual_intensity
            );
            self.stop = Some(reason);
            return false;
        }
        true
    }

    /// Feed one frame duration. A full window averaging under the FPS
    /// threshold decays visual intensity.
    pub fn observe_frame(&mut self, frame_ms: f64) {
        if !self.active || frame_ms <= 0.0 {
            return;
        }
        self.frame_fps.push((1000.0 / frame_ms) as f32);
        if self.frame_fps.len() < self.limits.window {
            return;
        }

        let avg = self.frame_fps.iter().sum::<f32>() / self.frame_fps.len() as f32;
        self.frame_fps.clear();
        if avg < self.limits.low_fps {
            self.visual_intensity *= self.limits.decay;
            log::debug!(
                "Sustained {:.1} fps, visual intensity now {:.2}",
                avg,
                self.visual_intensity
            );
        }
    }

    /// Force a stop reason (abort path)
    pub fn halt(&mut self, reason: StopReason) {
        self.stop.get_or_insert(reason);
    }

    /// Close the session and report. Leaves the session cleared.
    pub fn finish(&mut self, now_ms: f64) -> CascadeSummary {
        let summary = CascadeSummary {
            word_len: self.word_len,
            tiles_destroyed: self.tiles_destroyed,
            blockers_converted: self.blockers_converted,
            chain_reactions: self.chain_reaction_count,
            depth: self.depth,
            effects_failed: self.effects_failed,
            stop_reason: self.stop.unwrap_or(StopReason::Settled),
            elapsed_ms: self.elapsed_ms(now_ms),
            final_intensity: self.visual_intensity,
        };
        self.clear();
        summary
    }

    /// Reset every attribute
    pub fn clear(&mut self) {
        self.active = false;
        self.depth = 0;
        self.visited.clear();
        self.start_ms = 0.0;
        self.chain_reaction_count = 0;
        self.visual_intensity = 1.0;
        self.frame_fps.clear();
        self.stop = None;
        self.word_len = 0;
        self.tiles_destroyed = 0;
        self.blockers_converted = 0;
        self.effects_failed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CascadeConfig {
        CascadeConfig {
            max_depth: Some(3),
            max_duration_ms: 1000.0,
            perf_window: 2,
            low_fps_threshold: 30.0,
            intensity_decay: 0.5,
            intensity_floor: 0.3,
            ..CascadeConfig::default()
        }
    }

    fn session() -> CascadeSession {
        let mut s = CascadeSession::new();
        s.begin(0.0, &config(), 3);
        s
    }

    #[test]
    fn test_depth_limit() {
        let mut s = session();
        for _ in 0..3 {
            assert!(s.can_continue(0.0));
            s.next_depth();
        }
        assert!(!s.can_continue(0.0));
        assert_eq!(s.stop_reason(), Some(StopReason::DepthLimit));
    }

    #[test]
    fn test_time_limit() {
        let mut s = session();
        assert!(s.can_continue(1000.0));
        assert!(!s.can_continue(1000.5));
        assert_eq!(s.stop_reason(), Some(StopReason::TimeLimit));
    }

    #[test]
    fn test_performance_decays_before_stopping() {
        let mut s = session();
        // 50ms frames = 20fps, under the 30fps threshold
        s.observe_frame(50.0);
        s.observe_frame(50.0);
        assert_eq!(s.visual_intensity(), 0.5);
        assert!(s.can_continue(0.0));

        s.observe_frame(50.0);
        s.observe_frame(50.0);
        assert_eq!(s.visual_intensity(), 0.25);
        assert!(!s.can_continue(0.0));
        assert_eq!(s.stop_reason(), Some(StopReason::Performance));
    }

    #[test]
    fn test_fast_frames_keep_intensity() {
        let mut s = session();
        for _ in 0..10 {
            s.observe_frame(16.0);
        }
        assert_eq!(s.visual_intensity(), 1.0);
    }

    #[test]
    fn test_stop_is_latched() {
        let mut s = session();
        assert!(!s.can_continue(5000.0));
        assert!(!s.can_continue(0.0));
    }

    #[test]
    fn test_visit_once() {
        let mut s = session();
        assert!(s.visit(Coord::new(1, 1)));
        assert!(!s.visit(Coord::new(1, 1)));
        assert!(s.is_visited(Coord::new(1, 1)));
    }

    #[test]
    fn test_finish_clears_everything() {
        let mut s = session();
        s.visit(Coord::new(0, 0));
        s.next_depth();
        s.advance_chain();
        s.tiles_destroyed = 4;
        s.observe_frame(50.0);
        s.observe_frame(50.0);
        s.can_continue(9999.0);

        let summary = s.finish(250.0);
        assert_eq!(summary.depth, 1);
        assert_eq!(summary.chain_reactions, 1);
        assert_eq!(summary.tiles_destroyed, 4);
        assert_eq!(summary.stop_reason, StopReason::TimeLimit);
        assert_eq!(summary.elapsed_ms, 250.0);

        assert!(!s.is_active());
        assert_eq!(s.depth(), 0);
        assert_eq!(s.visited_count(), 0);
        assert_eq!(s.chain_reaction_count(), 0);
        assert_eq!(s.visual_intensity(), 1.0);
        assert_eq!(s.stop_reason(), None);
    }

    #[test]
    fn test_frames_ignored_when_idle() {
        let mut s = CascadeSession::new();
        s.observe_frame(500.0);
        assert_eq!(s.visual_intensity(), 1.0);
    }
}
