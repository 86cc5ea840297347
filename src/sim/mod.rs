//! Deterministic cascade core
//!
//! Grid state and every cascade rule live here:
//! - Seeded RNG only (tile factory and ripple rolls)
//! - Stable iteration order (row-major scans, FIFO effects)
//! - No rendering or platform dependencies beyond the injected traits

pub mod effect;
pub mod engine;
pub mod event;
pub mod grid;
pub mod queue;
pub mod ripple;
pub mod session;
pub mod tile;

pub use effect::{Effect, EffectAction, EffectKind, EffectReport, ExplosionOrigin};
pub use engine::CascadeEngine;
pub use event::CascadeEvent;
pub use grid::{Grid, MovementRecord, TileFactory};
pub use queue::EffectQueue;
pub use ripple::{RippleOutcome, RippleParams, propagate};
pub use session::{CascadeSession, CascadeSummary, StopReason};
pub use tile::{DamageOutcome, SurgeOutcome, Tile, TileKind, TileState};
