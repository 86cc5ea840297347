//! Tile state machine
//!
//! Normal -> Destabilized -> Exploding, with blocker categories diverted into
//! a health pool that converts them to Normal tiles when depleted. `falling`
//! is a transient overlay set by gravity, not part of the transition graph.

use serde::{Deserialize, Serialize};

use crate::Coord;
use crate::consts::*;

/// Tile category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Normal,
    /// Explodes its 8-neighbourhood along with itself
    Bomb,
    Ice,
    Stone,
    /// Scales the word score
    Multiplier,
    /// Unselectable blocker until revealed
    Hidden,
}

impl TileKind {
    /// Starting health for a freshly spawned tile of this kind
    pub fn initial_health(&self) -> u8 {
        match self {
            TileKind::Ice => ICE_HEALTH,
            TileKind::Stone => STONE_HEALTH,
            TileKind::Hidden => HIDDEN_HEALTH,
            _ => NORMAL_HEALTH,
        }
    }
}

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TileState {
    #[default]
    Normal,
    /// One more surge detonates
    Destabilized,
    /// Terminal; removed once its destruction animation completes
    Exploding,
}

/// Result of one `apply_surge` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurgeOutcome {
    /// Counter advanced, still Normal
    Charged,
    /// Crossed the threshold
    Destabilized,
    /// Now Exploding
    Detonated,
    /// Blocker lost health
    Damaged,
    /// Blocker depleted and became a Normal tile
    Converted,
    /// Tile is already Exploding
    Ignored,
}

/// Result of one `take_damage` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    Damaged,
    Converted,
    Destroyed,
    Ignored,
}

/// A letter tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Unique per grid, never reused
    pub id: u64,
    pub pos: Coord,
    pub letter: char,
    pub value: u32,
    pub kind: TileKind,
    pub state: TileState,
    pub health: u8,
    pub surge_count: u32,
    pub revealed: bool,
    /// Set while a gravity move is animating
    #[serde(default)]
    pub falling: bool,
}

impl Tile {
    pub fn new(id: u64, pos: Coord, letter: char, value: u32, kind: TileKind) -> Self {
        Self {
            id,
            pos,
            letter,
            value,
            kind,
            state: TileState::Normal,
            health: kind.initial_health(),
            surge_count: 0,
            revealed: kind != TileKind::Hidden,
            falling: false,
        }
    }

    /// Ice, Stone and unrevealed Hidden tiles take damage instead of surges
    pub fn is_blocker(&self) -> bool {
        match self.kind {
            TileKind::Ice | TileKind::Stone => true,
            TileKind::Hidden => !self.revealed,
            _ => false,
        }
    }

    pub fn is_exploding(&self) -> bool {
        self.state == TileState::Exploding
    }

    /// Word multiplier this tile contributes
    pub fn multiplier(&self) -> u32 {
        if self.kind == TileKind::Multiplier {
            MULTIPLIER_FACTOR
        } else {
            1
        }
    }

    pub fn apply_surge(&mut self, threshold: u32) -> SurgeOutcome {
        if self.is_exploding() {
            return SurgeOutcome::Ignored;
        }
        if self.is_blocker() {
            return match self.take_damage() {
                DamageOutcome::Converted => SurgeOutcome::Converted,
                _ => SurgeOutcome::Damaged,
            };
        }

        self.surge_count += 1;
        if self.state == TileState::Destabilized {
            self.state = TileState::Exploding;
            SurgeOutcome::Detonated
        } else if self.surge_count >= threshold {
            self.state = TileState::Destabilized;
            SurgeOutcome::Destabilized
        } else {
            SurgeOutcome::Charged
        }
    }

    pub fn take_damage(&mut self) -> DamageOutcome {
        if self.is_exploding() {
            return DamageOutcome::Ignored;
        }
        self.health = self.health.saturating_sub(1);

        if !self.is_blocker() {
            self.state = TileState::Exploding;
            return DamageOutcome::Destroyed;
        }
        if self.health == 0 {
            self.convert_to_normal();
            DamageOutcome::Converted
        } else {
            DamageOutcome::Damaged
        }
    }

    /// Uncover a Hidden tile. Returns false if there was nothing to reveal.
    pub fn reveal(&mut self) -> bool {
        if self.kind != TileKind::Hidden || self.revealed {
            return false;
        }
        self.revealed = true;
        self.health = NORMAL_HEALTH;
        true
    }

    pub fn can_be_selected(&self) -> bool {
        self.revealed
            && !matches!(self.kind, TileKind::Ice | TileKind::Stone)
            && !self.is_exploding()
            && !self.falling
    }

    fn convert_to_normal(&mut self) {
        self.kind = TileKind::Normal;
        self.health = NORMAL_HEALTH;
        self.surge_count = 0;
        self.revealed = true;
        self.state = TileState::Normal;
    }
}
