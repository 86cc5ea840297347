//! Error types for configuration, grid access, effects and word submission

use thiserror::Error;

use crate::Coord;
use crate::sim::effect::EffectKind;

/// Invalid or unreadable engine configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("spread must be within 0..=1, got {0}")]
    InvalidSpread(f32),
    #[error("{0} must be at least 1")]
    Zero(&'static str),
    #[error("ripple_radius must be at most {max}, got {value}")]
    RadiusTooLarge { value: usize, max: usize },
    #[error("{name} must be a finite, non-negative number, got {value}")]
    InvalidDuration { name: &'static str, value: f64 },
    #[error("{name} must be within (0, 1), got {value}")]
    OutOfUnitRange { name: &'static str, value: f32 },
    #[error("tile weight {name} must be finite and non-negative, got {value}")]
    NegativeWeight { name: &'static str, value: f32 },
    #[error("special tile weights sum to {0}, must not exceed 1")]
    WeightsExceedOne(f32),
    #[error("letter table has no positive weights")]
    EmptyLetterTable,
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid dimensions must be non-zero, got {width}x{height}")]
    ZeroSize { width: usize, height: usize },
    #[error("coordinate ({}, {}) is outside the grid", .0.x, .0.y)]
    OutOfBounds(Coord),
}

/// Effect rejected at enqueue time; never queued
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EffectError {
    #[error("{0:?} effect has no targets")]
    EmptyTargets(EffectKind),
}

/// Word submission refused before any session starts
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("a cascade is already resolving")]
    CascadeInProgress,
    #[error("word has {len} tiles, minimum is {min}")]
    TooShort { len: usize, min: usize },
    #[error("no tile at ({}, {})", .0.x, .0.y)]
    EmptySlot(Coord),
    #[error("tile at ({}, {}) appears twice", .0.x, .0.y)]
    Duplicate(Coord),
    #[error("tile at ({}, {}) cannot be selected", .0.x, .0.y)]
    NotSelectable(Coord),
    #[error("tile {index} is not adjacent to the previous tile")]
    NotAdjacent { index: usize },
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Effect(#[from] EffectError),
}

/// Engine construction failure
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Failure reported by the rendering host for one effect
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnimationError {
    #[error("animation failed: {0}")]
    Failed(String),
    #[error("animation target was released before completion")]
    TargetReleased,
}
