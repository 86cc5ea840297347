//! Animation contract between the cascade engine and the rendering host
//!
//! The engine hands the host a request (targets + duration/easing) and awaits
//! the returned future, which resolves once the last target finishes. Hosts
//! decide how that maps onto frames; headless hosts resolve immediately.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::Coord;
use crate::error::AnimationError;

/// Boxed completion future for one animation request
pub type AnimationFuture = Pin<Box<dyn Future<Output = Result<(), AnimationError>>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationKind {
    /// Tiles shrink/burst and are released
    Destroy,
    /// Tiles slide from `from` to `to`
    Fall,
    /// New tiles scale in from zero
    Spawn,
    /// Pause after a ripple so its cues can play out
    Settle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Easing {
    #[default]
    Linear,
    EaseOutQuad,
    EaseOutBounce,
    EaseOutBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationTarget {
    pub tile_id: u64,
    pub from: Coord,
    pub to: Coord,
}

impl AnimationTarget {
    /// Target that stays in place
    pub fn at(tile_id: u64, pos: Coord) -> Self {
        Self {
            tile_id,
            from: pos,
            to: pos,
        }
    }
}

/// One batch of concurrently animating targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationRequest {
    pub kind: AnimationKind,
    pub targets: Vec<AnimationTarget>,
    pub duration_ms: f64,
    /// Delay added per target index
    pub stagger_ms: f64,
    pub easing: Easing,
}

impl AnimationRequest {
    /// Time until the last target finishes
    pub fn total_ms(&self) -> f64 {
        let staggered = self.targets.len().saturating_sub(1) as f64 * self.stagger_ms;
        self.duration_ms + staggered
    }
}

/// Fire-and-forget visual hint emitted while a ripple spreads
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropagationCue {
    pub pos: Coord,
    pub delay_ms: f64,
    /// Current visual intensity (0-1]
    pub intensity: f32,
    /// True if the ripple pushed the tile into Exploding
    pub detonated: bool,
}

/// Rendering collaborator
pub trait Animator {
    /// Start an animation; the future resolves when every target is done
    fn animate(&mut self, request: AnimationRequest) -> AnimationFuture;

    /// Propagation cue; not awaited
    fn cue(&mut self, _cue: PropagationCue) {}
}

/// Resolves every request immediately, tracking the time it would have taken
#[derive(Debug, Clone, Default)]
pub struct InstantAnimator {
    /// Sum of `total_ms` over all requests
    pub virtual_ms: f64,
    pub requests: usize,
}

impl InstantAnimator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Animator for InstantAnimator {
    fn animate(&mut self, request: AnimationRequest) -> AnimationFuture {
        self.virtual_ms += request.total_ms();
        self.requests += 1;
        Box::pin(std::future::ready(Ok(())))
    }
}

/// Records everything and fails requests of chosen kinds. For headless hosts
/// and tests.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAnimator {
    pub requests: Vec<AnimationRequest>,
    pub cues: Vec<PropagationCue>,
    /// Kinds that fail, each entry consumed by one failure
    pub failures: Vec<AnimationKind>,
}

impl ScriptedAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next request of `kind`
    pub fn fail_next(mut self, kind: AnimationKind) -> Self {
        self.failures.push(kind);
        self
    }

    pub fn kinds(&self) -> Vec<AnimationKind> {
        self.requests.iter().map(|r| r.kind).collect()
    }
}

impl Animator for ScriptedAnimator {
    fn animate(&mut self, request: AnimationRequest) -> AnimationFuture {
        let kind = request.kind;
        self.requests.push(request);
        if let Some(i) = self.failures.iter().position(|k| *k == kind) {
            self.failures.remove(i);
            return Box::pin(std::future::ready(Err(AnimationError::Failed(format!(
                "scripted {kind:?} failure"
            )))));
        }
        Box::pin(std::future::ready(Ok(())))
    }

    fn cue(&mut self, cue: PropagationCue) {
        self.cues.push(cue);
    }
}
