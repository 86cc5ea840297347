//! Lifecycle notifications emitted while a cascade resolves.
//! Hosts drain these to gate input and drive HUD state.

use super::effect::EffectKind;
use super::session::{CascadeSummary, StopReason};
use crate::error::{AnimationError, EffectError};

#[derive(Clone, Debug, PartialEq)]
pub enum CascadeEvent {
    CascadeStarted { word_len: usize },
    EffectStarted { kind: EffectKind },
    EffectCompleted { kind: EffectKind },
    EffectErrored { kind: EffectKind, error: AnimationError },
    /// Malformed effect dropped at enqueue
    EffectRejected { error: EffectError },
    RippleWave { depth: u32, hits: usize, detonations: usize },
    ChainReaction { wave: u32, tiles: usize },
    GovernorStop { reason: StopReason },
    QueueIdle,
    CascadeComplete { summary: CascadeSummary },
}
