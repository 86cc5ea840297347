//! Cascade engine
//!
//! Turns one word submission into a stable, refilled grid. Every step of the
//! cascade is an effect on the FIFO queue; resolving an effect may queue the
//! next ones (explosion -> ripple -> chain explosions -> ... -> gravity ->
//! spawn), so the queue itself is the work-list and no step recurses.

use std::collections::HashSet;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::effect::{Effect, EffectAction, EffectKind, EffectReport, ExplosionOrigin};
use super::event::CascadeEvent;
use super::grid::{Grid, MovementRecord, TileFactory};
use super::queue::EffectQueue;
use super::ripple::{self, RippleParams};
use super::session::{CascadeSession, CascadeSummary, StopReason};
use super::tile::{DamageOutcome, Tile, TileKind};
use crate::animation::{
    AnimationKind, AnimationRequest, AnimationTarget, Animator, Easing, InstantAnimator,
};
use crate::error::{AnimationError, ConfigError, GridError, SetupError, SubmitError};
use crate::platform::{Clock, SystemClock};
use crate::scoring::{NoScoring, ScoreHooks};
use crate::settings::CascadeConfig;
use crate::{Coord, is_adjacent};

/// Keeps the ripple RNG stream apart from the tile factory's
const RIPPLE_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Where the active cascade is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    /// Explosions and ripples still running
    Propagating,
    /// Gravity queued
    Settling,
    /// Grid refilled, only spawn animation left
    Refilled,
}

/// Tiles touched, animation result
type Resolution = (usize, Result<(), AnimationError>);

pub struct CascadeEngine<A: Animator = InstantAnimator, S: ScoreHooks = NoScoring> {
    grid: Grid,
    factory: TileFactory,
    config: CascadeConfig,
    /// Applied when the next session begins
    staged_config: Option<CascadeConfig>,
    ripple: RippleParams,
    session: CascadeSession,
    queue: EffectQueue,
    animator: A,
    scoring: S,
    clock: Box<dyn Clock>,
    rng: Pcg32,
    phase: Phase,
    last_summary: Option<CascadeSummary>,
}

impl CascadeEngine<InstantAnimator, NoScoring> {
    /// Random grid, instant animations, no scoring
    pub fn headless(
        config: CascadeConfig,
        width: usize,
        height: usize,
        seed: u64,
    ) -> Result<Self, SetupError> {
        let mut factory = TileFactory::from_config(&config, seed);
        let grid = Grid::populated(width, height, &mut factory)?;
        Ok(Self::new(
            config,
            grid,
            factory,
            InstantAnimator::new(),
            NoScoring,
            seed,
        )?)
    }
}

impl<A: Animator, S: ScoreHooks> CascadeEngine<A, S> {
    pub fn new(
        config: CascadeConfig,
        grid: Grid,
        factory: TileFactory,
        animator: A,
        scoring: S,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            grid,
            factory,
            ripple: RippleParams::from_config(&config),
            config,
            staged_config: None,
            session: CascadeSession::new(),
            queue: EffectQueue::new(),
            animator,
            scoring,
            clock: Box::new(SystemClock::new()),
            rng: Pcg32::seed_from_u64(seed ^ RIPPLE_STREAM),
            phase: Phase::Idle,
            last_summary: None,
        })
    }

    /// Replace the wall clock used by the governor
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn session(&self) -> &CascadeSession {
        &self.session
    }

    pub fn queue(&self) -> &EffectQueue {
        &self.queue
    }

    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    pub fn animator(&self) -> &A {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut A {
        &mut self.animator
    }

    pub fn scoring(&self) -> &S {
        &self.scoring
    }

    pub fn scoring_mut(&mut self) -> &mut S {
        &mut self.scoring
    }

    /// Validate and install a config. During a cascade it is held until the
    /// next word so a session never sees its limits change.
    pub fn set_config(&mut self, config: CascadeConfig) -> Result<(), ConfigError> {
        config.validate()?;
        if self.session.is_active() {
            self.staged_config = Some(config);
        } else {
            self.apply_config(config);
        }
        Ok(())
    }

    fn apply_config(&mut self, config: CascadeConfig) {
        self.ripple = RippleParams::from_config(&config);
        self.factory.reconfigure(config.tile_weights, config.letters.clone());
        self.config = config;
    }

    /// True when no cascade is running and nothing is queued
    pub fn accepts_input(&self) -> bool {
        !self.session.is_active() && self.queue.is_idle()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_idle()
    }

    /// Feed one rendered frame's duration to the performance governor.
    /// Only reachable mid-cascade when the host drives `start_word` and
    /// `process_next` itself; `submit_word` holds the engine until idle.
    pub fn record_frame_time(&mut self, frame_ms: f64) {
        self.session.observe_frame(frame_ms);
    }

    pub fn drain_events(&mut self) -> Vec<CascadeEvent> {
        self.queue.drain_events()
    }

    /// Summary of the most recently finished cascade
    pub fn last_summary(&self) -> Option<&CascadeSummary> {
        self.last_summary.as_ref()
    }

    /// Zero every surge counter. Only between cascades.
    pub fn reset_surges(&mut self) -> bool {
        if !self.accepts_input() {
            return false;
        }
        self.grid.reset_surges();
        true
    }

    /// Check a traced word against the grid and return its tiles
    pub fn validate_word(&self, word: &[Coord]) -> Result<Vec<Tile>, SubmitError> {
        let min = self.config.min_word_length;
        if word.len() < min {
            return Err(SubmitError::TooShort {
                len: word.len(),
                min,
            });
        }

        let mut seen = HashSet::with_capacity(word.len());
        let mut tiles = Vec::with_capacity(word.len());
        for (index, &pos) in word.iter().enumerate() {
            if !self.grid.in_bounds(pos) {
                return Err(GridError::OutOfBounds(pos).into());
            }
            let tile = self.grid.tile_at(pos).ok_or(SubmitError::EmptySlot(pos))?;
            if !seen.insert(pos) {
                return Err(SubmitError::Duplicate(pos));
            }
            if !tile.can_be_selected() {
                return Err(SubmitError::NotSelectable(pos));
            }
            if index > 0 && !is_adjacent(word[index - 1], pos) {
                return Err(SubmitError::NotAdjacent { index });
            }
            tiles.push(tile.clone());
        }
        Ok(tiles)
    }

    /// Start a cascade for `word` without driving it. Pair with
    /// `process_next` / `run_until_idle`.
    pub fn start_word(&mut self, word: &[Coord]) -> Result<(), SubmitError> {
        if !self.accepts_input() {
            return Err(SubmitError::CascadeInProgress);
        }
        let tiles = self.validate_word(word)?;
        let effect = Effect::explosion(word.to_vec(), ExplosionOrigin::Word)?;

        self.begin_session(word.len());
        self.scoring.score_word(&tiles);
        self.queue.enqueue(effect);
        Ok(())
    }

    /// Submit a word and resolve the whole cascade. Borrows the engine for
    /// the whole run, so frame samples cannot be fed in meanwhile.
    pub async fn submit_word(&mut self, word: &[Coord]) -> Result<CascadeSummary, SubmitError> {
        self.start_word(word)?;
        self.run_until_idle().await;
        Ok(self
            .last_summary
            .clone()
            .unwrap_or_else(|| self.force_finish(StopReason::Aborted)))
    }

    /// Queue an externally built effect, opening a session if none is active
    pub fn enqueue(&mut self, effect: Effect) {
        if !self.session.is_active() {
            self.begin_session(0);
        }
        self.queue.enqueue(effect);
    }

    pub async fn run_until_idle(&mut self) {
        while self.process_next().await {}
    }

    /// Resolve the head of the queue. Returns false if there was nothing to do.
    pub async fn process_next(&mut self) -> bool {
        let Some(effect) = self.queue.begin_next() else {
            return false;
        };
        let kind = effect.kind();
        let (action, on_complete) = effect.into_parts();
        log::debug!("Resolving {:?}", kind);

        let (affected, result) = match action {
            EffectAction::Explosion { targets, origin } => {
                self.resolve_explosion(targets, origin).await
            }
            EffectAction::Ripple { seeds } => self.resolve_ripple(seeds).await,
            EffectAction::Gravity { moves } => self.resolve_gravity(moves).await,
            EffectAction::Spawn { tiles, stagger_ms } => {
                self.resolve_spawn(tiles, stagger_ms).await
            }
        };
        if result.is_err() {
            self.session.effects_failed += 1;
        }
        self.queue.finish(EffectReport { kind, affected }, result, on_complete);

        if self.queue.is_idle() && self.session.is_active() {
            if self.phase != Phase::Refilled {
                log::warn!("Queue drained before the grid settled, settling now");
                self.settle_now();
            }
            self.finish_cascade();
        }
        true
    }

    /// Drop pending effects and bring the grid to a stable state without
    /// animation. None if no cascade was running.
    pub fn abort_cascade(&mut self) -> Option<CascadeSummary> {
        if !self.session.is_active() {
            return None;
        }
        Some(self.force_finish(StopReason::Aborted))
    }

    fn force_finish(&mut self, reason: StopReason) -> CascadeSummary {
        let dropped = self.queue.clear();
        log::warn!("Cascade cut short ({:?}), {} pending effects dropped", reason, dropped);
        self.session.halt(reason);
        self.settle_now();
        self.queue.push_event(CascadeEvent::QueueIdle);
        self.finish_cascade()
    }

    fn begin_session(&mut self, word_len: usize) {
        if let Some(config) = self.staged_config.take() {
            self.apply_config(config);
        }
        self.session.begin(self.clock.now_ms(), &self.config, word_len);
        self.phase = Phase::Propagating;
        self.last_summary = None;
        self.scoring.start_cascade_sequence();
        self.queue.push_event(CascadeEvent::CascadeStarted { word_len });
        log::info!("Cascade started ({} tiles)", word_len);
    }

    fn finish_cascade(&mut self) -> CascadeSummary {
        self.scoring.end_cascade_sequence();
        let summary = self.session.finish(self.clock.now_ms());
        self.phase = Phase::Idle;
        log::info!(
            "Cascade complete: {} destroyed, {} chains, depth {}, {:?}",
            summary.tiles_destroyed,
            summary.chain_reactions,
            summary.depth,
            summary.stop_reason
        );
        self.queue.push_event(CascadeEvent::CascadeComplete {
            summary: summary.clone(),
        });
        self.last_summary = Some(summary.clone());
        summary
    }

    fn schedule(&mut self, action: EffectAction) {
        match Effect::new(action) {
            Ok(effect) => self.queue.enqueue(effect),
            Err(error) => self.queue.reject(error),
        }
    }

    async fn animate(&mut self, request: AnimationRequest) -> Result<(), AnimationError> {
        self.animator.animate(request).await
    }

    /// Targets plus the 8-neighbourhood of any bomb among them, deduplicated
    fn expand_blast(&self, targets: &[Coord]) -> Vec<Coord> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(targets.len());
        for &pos in targets {
            if seen.insert(pos) {
                out.push(pos);
            }
        }
        for &pos in targets {
            let is_bomb = self
                .grid
                .tile_at(pos)
                .is_some_and(|t| t.kind == TileKind::Bomb);
            if !is_bomb {
                continue;
            }
            for n in self.grid.neighbor_coords(pos, 1) {
                if seen.insert(n) {
                    out.push(n);
                }
            }
        }
        out
    }

    async fn resolve_explosion(
        &mut self,
        targets: Vec<Coord>,
        origin: ExplosionOrigin,
    ) -> Resolution {
        let mut doomed = Vec::new();
        for pos in self.expand_blast(&targets) {
            let Some(tile) = self.grid.tile_at_mut(pos) else {
                continue;
            };
            if tile.is_exploding() {
                doomed.push(pos);
                continue;
            }
            match tile.take_damage() {
                DamageOutcome::Destroyed => doomed.push(pos),
                DamageOutcome::Converted => self.session.blockers_converted += 1,
                DamageOutcome::Damaged | DamageOutcome::Ignored => {}
            }
        }

        let result = if doomed.is_empty() {
            Ok(())
        } else {
            let targets = doomed
                .iter()
                .filter_map(|&p| self.grid.tile_at(p).map(|t| AnimationTarget::at(t.id, p)))
                .collect();
            self.animate(AnimationRequest {
                kind: AnimationKind::Destroy,
                targets,
                duration_ms: self.config.explosion_ms,
                stagger_ms: 0.0,
                easing: Easing::EaseOutQuad,
            })
            .await
        };

        let removed: Vec<Tile> = doomed
            .iter()
            .filter_map(|&p| self.grid.remove_at(p))
            .collect();
        self.reveal_around(&doomed);
        self.session.tiles_destroyed += removed.len() as u32;

        if let ExplosionOrigin::Chain { wave } = origin {
            if !removed.is_empty() {
                self.scoring.record_chain_reaction(&removed);
                self.queue.push_event(CascadeEvent::ChainReaction {
                    wave,
                    tiles: removed.len(),
                });
            }
        }

        if doomed.is_empty() {
            self.maybe_settle();
        } else {
            self.schedule(EffectAction::Ripple { seeds: doomed });
        }
        (removed.len(), result)
    }

    /// Uncover hidden tiles next to cleared slots
    fn reveal_around(&mut self, cleared: &[Coord]) {
        for &pos in cleared {
            for n in self.grid.neighbor_coords(pos, 1) {
                if let Some(tile) = self.grid.tile_at_mut(n) {
                    if tile.reveal() {
                        log::debug!("Revealed hidden tile at ({}, {})", n.x, n.y);
                    }
                }
            }
        }
    }

    async fn resolve_ripple(&mut self, seeds: Vec<Coord>) -> Resolution {
        let already_stopped = self.session.stop_reason().is_some();
        if !self.session.can_continue(self.clock.now_ms()) {
            if let (false, Some(reason)) = (already_stopped, self.session.stop_reason()) {
                self.queue.push_event(CascadeEvent::GovernorStop { reason });
            }
            self.maybe_settle();
            return (0, Ok(()));
        }

        let outcome = ripple::propagate(
            &mut self.grid,
            &mut self.session,
            &seeds,
            &self.ripple,
            &mut self.rng,
        );
        for cue in &outcome.cues {
            self.animator.cue(*cue);
        }
        self.session.blockers_converted += outcome.converted;
        self.queue.push_event(CascadeEvent::RippleWave {
            depth: outcome.depth,
            hits: outcome.hits,
            detonations: outcome.to_explode.len(),
        });

        let intensity = self.session.visual_intensity() as f64;
        let settle_ms = (self.config.settle_ms * intensity).max(self.config.settle_floor_ms);
        let result = self
            .animate(AnimationRequest {
                kind: AnimationKind::Settle,
                targets: Vec::new(),
                duration_ms: settle_ms,
                stagger_ms: 0.0,
                easing: Easing::Linear,
            })
            .await;

        if outcome.to_explode.is_empty() {
            self.maybe_settle();
        } else {
            for batch in outcome.to_explode.chunks(self.config.batch_limit.max(1)) {
                let wave = self.session.advance_chain();
                self.schedule(EffectAction::Explosion {
                    targets: batch.to_vec(),
                    origin: ExplosionOrigin::Chain { wave },
                });
            }
        }
        (outcome.hits, result)
    }

    /// Queue gravity once no explosion or ripple is left to run
    fn maybe_settle(&mut self) {
        if self.phase != Phase::Propagating {
            return;
        }
        if self
            .queue
            .has_pending(&[EffectKind::Explosion, EffectKind::Ripple])
        {
            return;
        }
        self.phase = Phase::Settling;
        let moves = self.grid.apply_gravity();
        if moves.is_empty() {
            self.refill();
        } else {
            self.schedule(EffectAction::Gravity { moves });
        }
    }

    async fn resolve_gravity(&mut self, moves: Vec<MovementRecord>) -> Resolution {
        let targets = moves
            .iter()
            .map(|m| AnimationTarget {
                tile_id: m.tile_id,
                from: Coord::new(m.x, m.from_y),
                to: Coord::new(m.x, m.to_y),
            })
            .collect();
        let result = self
            .animate(AnimationRequest {
                kind: AnimationKind::Fall,
                targets,
                duration_ms: self.config.fall_ms,
                stagger_ms: 0.0,
                easing: Easing::EaseOutBounce,
            })
            .await;

        for m in &moves {
            if let Some(tile) = self.grid.tile_at_mut(Coord::new(m.x, m.to_y)) {
                tile.falling = false;
            }
        }
        self.refill();
        (moves.len(), result)
    }

    fn refill(&mut self) {
        let created = self.grid.refill(&mut self.factory);
        self.phase = Phase::Refilled;
        if !created.is_empty() {
            let stagger_ms =
                self.config.spawn_stagger_ms * self.session.visual_intensity() as f64;
            self.schedule(EffectAction::Spawn {
                tiles: created,
                stagger_ms,
            });
        }
    }

    async fn resolve_spawn(&mut self, tiles: Vec<Tile>, stagger_ms: f64) -> Resolution {
        let count = tiles.len();
        let targets = tiles
            .iter()
            .map(|t| AnimationTarget::at(t.id, t.pos))
            .collect();
        let result = self
            .animate(AnimationRequest {
                kind: AnimationKind::Spawn,
                targets,
                duration_ms: self.config.spawn_ms,
                stagger_ms,
                easing: Easing::EaseOutBack,
            })
            .await;
        (count, result)
    }

    /// Remove leftover exploding tiles, drop and refill with no animation
    fn settle_now(&mut self) {
        let exploding = self.grid.coords_where(Tile::is_exploding);
        let removed = exploding
            .iter()
            .filter_map(|&p| self.grid.remove_at(p))
            .count();
        self.session.tiles_destroyed += removed as u32;
        self.grid.apply_gravity();
        for tile in self.grid.iter_mut() {
            tile.falling = false;
        }
        self.grid.refill(&mut self.factory);
        self.phase = Phase::Refilled;
    }
}
