//! Surge Cascade - cascade resolution engine for a letter-grid puzzle
//!
//! Core modules:
//! - `sim`: Deterministic cascade core (tiles, grid, session, effect queue, ripple)
//! - `animation`: Animation contract injected by the rendering host
//! - `scoring`: Scoring collaborator hooks
//! - `platform`: Browser/native platform abstraction (clock, logging)
//! - `settings`: Data-driven engine configuration

pub mod animation;
pub mod error;
pub mod platform;
pub mod scoring;
pub mod settings;
pub mod sim;

pub use animation::{AnimationRequest, Animator, InstantAnimator};
pub use error::{AnimationError, ConfigError, EffectError, GridError, SetupError, SubmitError};
pub use scoring::{ChainTally, NoScoring, ScoreHooks};
pub use settings::{CascadeConfig, PlatformClass};
pub use sim::{CascadeEngine, CascadeEvent, CascadeSummary, Grid, Tile, TileKind, TileState};

use serde::{Deserialize, Serialize};

/// Engine configuration defaults
pub mod consts {
    /// Surges needed before a tile destabilizes
    pub const DEFAULT_THRESHOLD: u32 = 3;
    /// Probability that a ripple reaches an adjacent tile
    pub const DEFAULT_SPREAD: f32 = 0.6;
    /// Per-ring decay of spread probability
    pub const SPREAD_FALLOFF: f32 = 0.8;

    /// Max ripple passes per cascade on desktop-class hosts
    pub const DESKTOP_MAX_DEPTH: u32 = 10;
    /// Mobile hosts render slower, so chains get more passes before cutoff
    pub const MOBILE_MAX_DEPTH: u32 = 16;
    /// Wall-clock cap for one cascade (ms)
    pub const MAX_CASCADE_MS: f64 = 12_000.0;

    /// Largest ripple radius a config may ask for
    pub const MAX_RIPPLE_RADIUS: usize = 8;

    /// Lower bound for the post-ripple settle delay (ms)
    pub const SETTLE_FLOOR_MS: f64 = 200.0;

    /// Health per tile category
    pub const NORMAL_HEALTH: u8 = 1;
    pub const ICE_HEALTH: u8 = 2;
    pub const STONE_HEALTH: u8 = 4;
    pub const HIDDEN_HEALTH: u8 = 2;

    /// Word multiplier carried by Multiplier tiles
    pub const MULTIPLIER_FACTOR: u32 = 2;
}

/// Grid coordinate. `y = 0` is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    #[inline]
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Chebyshev (king-move) distance between two coordinates
#[inline]
pub fn chebyshev(a: Coord, b: Coord) -> usize {
    a.x.abs_diff(b.x).max(a.y.abs_diff(b.y))
}

/// True if `a` and `b` touch, including diagonally
#[inline]
pub fn is_adjacent(a: Coord, b: Coord) -> bool {
    chebyshev(a, b) == 1
}
