//! Effect descriptors consumed by the effect queue

use std::fmt;

use serde::{Deserialize, Serialize};

use super::grid::MovementRecord;
use super::tile::Tile;
use crate::Coord;
use crate::error::EffectError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Explosion,
    Ripple,
    Gravity,
    Spawn,
}

/// What queued an explosion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplosionOrigin {
    /// The submitted word
    Word,
    /// A ripple-triggered detonation batch
    Chain { wave: u32 },
}

/// Kind-specific targets and parameters
#[derive(Debug, Clone, PartialEq)]
pub enum EffectAction {
    Explosion {
        targets: Vec<Coord>,
        origin: ExplosionOrigin,
    },
    Ripple {
        seeds: Vec<Coord>,
    },
    Gravity {
        moves: Vec<MovementRecord>,
    },
    Spawn {
        tiles: Vec<Tile>,
        stagger_ms: f64,
    },
}

impl EffectAction {
    pub fn kind(&self) -> EffectKind {
        match self {
            EffectAction::Explosion { .. } => EffectKind::Explosion,
            EffectAction::Ripple { .. } => EffectKind::Ripple,
            EffectAction::Gravity { .. } => EffectKind::Gravity,
            EffectAction::Spawn { .. } => EffectKind::Spawn,
        }
    }

    pub fn target_count(&self) -> usize {
        match self {
            EffectAction::Explosion { targets, .. } => targets.len(),
            EffectAction::Ripple { seeds } => seeds.len(),
            EffectAction::Gravity { moves } => moves.len(),
            EffectAction::Spawn { tiles, .. } => tiles.len(),
        }
    }
}

/// Passed to an effect's completion callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectReport {
    pub kind: EffectKind,
    /// Tiles the effect touched (destroyed, moved, spawned or surged)
    pub affected: usize,
}

pub type OnComplete = Box<dyn FnOnce(&EffectReport)>;

/// A unit of scheduled work. Immutable once built.
pub struct Effect {
    action: EffectAction,
    on_complete: Option<OnComplete>,
}

impl Effect {
    /// Build an effect, rejecting one with no targets
    pub fn new(action: EffectAction) -> Result<Self, EffectError> {
        if action.target_count() == 0 {
            return Err(EffectError::EmptyTargets(action.kind()));
        }
        Ok(Self {
            action,
            on_complete: None,
        })
    }

    pub fn explosion(targets: Vec<Coord>, origin: ExplosionOrigin) -> Result<Self, EffectError> {
        Self::new(EffectAction::Explosion { targets, origin })
    }

    pub fn ripple(seeds: Vec<Coord>) -> Result<Self, EffectError> {
        Self::new(EffectAction::Ripple { seeds })
    }

    pub fn gravity(moves: Vec<MovementRecord>) -> Result<Self, EffectError> {
        Self::new(EffectAction::Gravity { moves })
    }

    pub fn spawn(tiles: Vec<Tile>, stagger_ms: f64) -> Result<Self, EffectError> {
        Self::new(EffectAction::Spawn { tiles, stagger_ms })
    }

    /// Attach a callback run after the effect resolves successfully
    pub fn on_complete(mut self, callback: impl FnOnce(&EffectReport) + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn kind(&self) -> EffectKind {
        self.action.kind()
    }

    pub fn action(&self) -> &EffectAction {
        &self.action
    }

    pub(crate) fn into_parts(self) -> (EffectAction, Option<OnComplete>) {
        (self.action, self.on_complete)
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("action", &self.action)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}
