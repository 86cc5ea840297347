//! Engine configuration
//!
//! Supplied by the host once per level. The engine reads it at session start
//! and never mutates it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Host device class, selects the default depth ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PlatformClass {
    #[default]
    Desktop,
    Mobile,
}

impl PlatformClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformClass::Desktop => "Desktop",
            PlatformClass::Mobile => "Mobile",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "desktop" | "pc" => Some(PlatformClass::Desktop),
            "mobile" | "phone" | "tablet" => Some(PlatformClass::Mobile),
            _ => None,
        }
    }

    /// Ripple passes allowed before the governor stops the cascade
    pub fn max_depth(&self) -> u32 {
        match self {
            PlatformClass::Desktop => DESKTOP_MAX_DEPTH,
            PlatformClass::Mobile => MOBILE_MAX_DEPTH,
        }
    }
}

/// Probability of each special tile type on spawn. Normal takes the remainder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileWeights {
    pub bomb: f32,
    pub ice: f32,
    pub stone: f32,
    pub multiplier: f32,
    pub hidden: f32,
}

impl Default for TileWeights {
    fn default() -> Self {
        Self {
            bomb: 0.03,
            ice: 0.04,
            stone: 0.02,
            multiplier: 0.03,
            hidden: 0.03,
        }
    }
}

impl TileWeights {
    /// Only Normal tiles spawn
    pub fn none() -> Self {
        Self {
            bomb: 0.0,
            ice: 0.0,
            stone: 0.0,
            multiplier: 0.0,
            hidden: 0.0,
        }
    }

    pub fn named(&self) -> [(&'static str, f32); 5] {
        [
            ("bomb", self.bomb),
            ("ice", self.ice),
            ("stone", self.stone),
            ("multiplier", self.multiplier),
            ("hidden", self.hidden),
        ]
    }

    pub fn total(&self) -> f32 {
        self.named().iter().map(|(_, w)| w).sum()
    }
}

/// One entry of the letter distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterWeight {
    pub letter: char,
    pub weight: u32,
    pub value: u32,
}

const fn lw(letter: char, weight: u32, value: u32) -> LetterWeight {
    LetterWeight { letter, weight, value }
}

/// English letter frequencies with word-game point values
pub const ENGLISH_LETTERS: [LetterWeight; 26] = [
    lw('A', 9, 1),
    lw('B', 2, 3),
    lw('C', 2, 3),
    lw('D', 4, 2),
    lw('E', 12, 1),
    lw('F', 2, 4),
    lw('G', 3, 2),
    lw('H', 2, 4),
    lw('I', 9, 1),
    lw('J', 1, 8),
    lw('K', 1, 5),
    lw('L', 4, 1),
    lw('M', 2, 3),
    lw('N', 6, 1),
    lw('O', 8, 1),
    lw('P', 2, 3),
    lw('Q', 1, 10),
    lw('R', 6, 1),
    lw('S', 4, 1),
    lw('T', 6, 1),
    lw('U', 4, 1),
    lw('V', 2, 4),
    lw('W', 2, 4),
    lw('X', 1, 8),
    lw('Y', 2, 4),
    lw('Z', 1, 10),
];

/// Cascade engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// Host device class
    pub platform: PlatformClass,

    // === Propagation ===
    /// Chance (0-1) that a ripple reaches a tile one ring out
    pub spread: f32,
    /// Surges applied to a tile each time a ripple reaches it
    pub power: u32,
    /// Surges before a tile destabilizes
    pub threshold: u32,
    /// Ring radius a ripple reaches around each seed
    pub ripple_radius: usize,
    /// Largest detonation group exploded as one effect
    pub batch_limit: usize,

    // === Governor ===
    /// Ripple pass ceiling; `None` uses the platform default
    pub max_depth: Option<u32>,
    /// Wall-clock cap for one cascade (ms)
    pub max_duration_ms: f64,
    /// Average FPS below which a frame window counts as degraded
    pub low_fps_threshold: f32,
    /// Frame samples per performance window
    pub perf_window: usize,
    /// Multiplier applied to visual intensity per degraded window
    pub intensity_decay: f32,
    /// Intensity below which the cascade is cut short
    pub intensity_floor: f32,

    // === Timing (ms, before intensity scaling) ===
    pub settle_ms: f64,
    pub settle_floor_ms: f64,
    pub stagger_ms: f64,
    pub explosion_ms: f64,
    pub fall_ms: f64,
    pub spawn_ms: f64,
    pub spawn_stagger_ms: f64,

    // === Words & tiles ===
    pub min_word_length: usize,
    pub tile_weights: TileWeights,
    pub letters: Vec<LetterWeight>,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            platform: PlatformClass::Desktop,

            spread: DEFAULT_SPREAD,
            power: 1,
            threshold: DEFAULT_THRESHOLD,
            ripple_radius: 1,
            batch_limit: 12,

            max_depth: None,
            max_duration_ms: MAX_CASCADE_MS,
            low_fps_threshold: 30.0,
            perf_window: 10,
            intensity_decay: 0.8,
            intensity_floor: 0.3,

            settle_ms: 300.0,
            settle_floor_ms: SETTLE_FLOOR_MS,
            stagger_ms: 40.0,
            explosion_ms: 350.0,
            fall_ms: 250.0,
            spawn_ms: 200.0,
            spawn_stagger_ms: 20.0,

            min_word_length: 3,
            tile_weights: TileWeights::default(),
            letters: ENGLISH_LETTERS.to_vec(),
        }
    }
}

impl CascadeConfig {
    /// Create a config from a platform class (applies its defaults)
    pub fn for_platform(platform: PlatformClass) -> Self {
        Self {
            platform,
            ..Self::default()
        }
    }

    /// Depth ceiling in effect for this config
    pub fn effective_max_depth(&self) -> u32 {
        self.max_depth.unwrap_or_else(|| self.platform.max_depth())
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded cascade config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.spread) {
            return Err(ConfigError::InvalidSpread(self.spread));
        }
        if self.power == 0 {
            return Err(ConfigError::Zero("power"));
        }
        if self.threshold == 0 {
            return Err(ConfigError::Zero("threshold"));
        }
        if self.ripple_radius == 0 {
            return Err(ConfigError::Zero("ripple_radius"));
        }
        if self.ripple_radius > MAX_RIPPLE_RADIUS {
            return Err(ConfigError::RadiusTooLarge {
                value: self.ripple_radius,
                max: MAX_RIPPLE_RADIUS,
            });
        }
        if self.batch_limit == 0 {
            return Err(ConfigError::Zero("batch_limit"));
        }
        if self.effective_max_depth() == 0 {
            return Err(ConfigError::Zero("max_depth"));
        }
        if self.perf_window == 0 {
            return Err(ConfigError::Zero("perf_window"));
        }
        if self.min_word_length == 0 {
            return Err(ConfigError::Zero("min_word_length"));
        }
        for (name, value) in [
            ("max_duration_ms", self.max_duration_ms),
            ("low_fps_threshold", self.low_fps_threshold as f64),
            ("settle_ms", self.settle_ms),
            ("settle_floor_ms", self.settle_floor_ms),
            ("stagger_ms", self.stagger_ms),
            ("explosion_ms", self.explosion_ms),
            ("fall_ms", self.fall_ms),
            ("spawn_ms", self.spawn_ms),
            ("spawn_stagger_ms", self.spawn_stagger_ms),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidDuration { name, value });
            }
        }
        for (name, value) in [
            ("intensity_decay", self.intensity_decay),
            ("intensity_floor", self.intensity_floor),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(ConfigError::OutOfUnitRange { name, value });
            }
        }
        for (name, value) in self.tile_weights.named() {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NegativeWeight { name, value });
            }
        }
        let total = self.tile_weights.total();
        if total > 1.0 {
            return Err(ConfigError::WeightsExceedOne(total));
        }
        if !self.letters.iter().any(|l| l.weight > 0) {
            return Err(ConfigError::EmptyLetterTable);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(CascadeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_platform_depth_ceiling() {
        let desktop = CascadeConfig::for_platform(PlatformClass::Desktop);
        let mobile = CascadeConfig::for_platform(PlatformClass::Mobile);
        assert!(mobile.effective_max_depth() > desktop.effective_max_depth());

        let pinned = CascadeConfig {
            max_depth: Some(4),
            ..mobile
        };
        assert_eq!(pinned.effective_max_depth(), 4);
    }

    #[test]
    fn test_platform_from_str() {
        assert_eq!(PlatformClass::from_str("MOBILE"), Some(PlatformClass::Mobile));
        assert_eq!(PlatformClass::from_str("pc"), Some(PlatformClass::Desktop));
        assert_eq!(PlatformClass::from_str("toaster"), None);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = CascadeConfig::from_json(r#"{ "spread": 1.0, "power": 2 }"#).unwrap();
        assert_eq!(config.spread, 1.0);
        assert_eq!(config.power, 2);
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.letters.len(), 26);
    }

    #[test]
    fn test_rejects_bad_ranges() {
        assert!(matches!(
            CascadeConfig::from_json(r#"{ "spread": 1.5 }"#),
            Err(ConfigError::InvalidSpread(_))
        ));
        assert!(matches!(
            CascadeConfig::from_json(r#"{ "threshold": 0 }"#),
            Err(ConfigError::Zero("threshold"))
        ));
        assert!(matches!(
            CascadeConfig::from_json(r#"{ "intensity_floor": 1.0 }"#),
            Err(ConfigError::OutOfUnitRange { .. })
        ));
        assert!(matches!(
            CascadeConfig::from_json(r#"{ "tile_weights": { "bomb": 0.9, "ice": 0.9 } }"#),
            Err(ConfigError::WeightsExceedOne(_))
        ));
        assert!(matches!(
            CascadeConfig::from_json("not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_radius() {
        let config = CascadeConfig {
            ripple_radius: usize::MAX,
            ..CascadeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RadiusTooLarge { max: MAX_RIPPLE_RADIUS, .. })
        ));
        let widest = CascadeConfig {
            ripple_radius: MAX_RIPPLE_RADIUS,
            ..CascadeConfig::default()
        };
        assert!(widest.validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_or_nan_timings() {
        let negative = CascadeConfig {
            max_duration_ms: -1.0,
            ..CascadeConfig::default()
        };
        assert!(matches!(
            negative.validate(),
            Err(ConfigError::InvalidDuration { name: "max_duration_ms", .. })
        ));
        let nan_fall = CascadeConfig {
            fall_ms: f64::NAN,
            ..CascadeConfig::default()
        };
        assert!(matches!(
            nan_fall.validate(),
            Err(ConfigError::InvalidDuration { name: "fall_ms", .. })
        ));
        let nan_fps = CascadeConfig {
            low_fps_threshold: f32::NAN,
            ..CascadeConfig::default()
        };
        assert!(matches!(
            nan_fps.validate(),
            Err(ConfigError::InvalidDuration { name: "low_fps_threshold", .. })
        ));
        let nan_floor = CascadeConfig {
            intensity_floor: f32::NAN,
            ..CascadeConfig::default()
        };
        assert!(matches!(
            nan_floor.validate(),
            Err(ConfigError::OutOfUnitRange { .. })
        ));
        let zero_stagger = CascadeConfig {
            stagger_ms: 0.0,
            ..CascadeConfig::default()
        };
        assert!(zero_stagger.validate().is_ok());
    }

    #[test]
    fn test_json_roundtrip_keeps_limits() {
        let config = CascadeConfig {
            max_depth: Some(7),
            batch_limit: 5,
            ..CascadeConfig::default()
        };
        let parsed = CascadeConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed.max_depth, Some(7));
        assert_eq!(parsed.batch_limit, 5);
    }
}
