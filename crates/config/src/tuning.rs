//! Numeric tuning of the rendering engine.

use serde::{Deserialize, Serialize};

use crate::brush::InkColor;
use crate::error::ConfigError;

/// Default number of retained history steps
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Default particle batch per scheduling tick
pub const DEFAULT_PARTICLE_BATCH: usize = 1000;

/// Engine tuning values. Not part of the per-stroke brush configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineTuning {
    /// Maximum retained history steps (ring-buffer capacity)
    pub history_capacity: usize,
    /// Velocity (CSS px per ms) at which synthetic pressure reaches zero
    pub max_velocity: f32,
    /// Swelling headroom: maximum stamp size = brush size * headroom
    pub size_headroom: f32,
    /// Fixed stamp size (CSS px) used by hairline strokes
    pub hairline_stamp_size: f32,
    /// Splatter stamps emitted per main stamp on rough strokes
    pub splatter_count: usize,
    /// Particles stamped per scheduling tick
    pub particle_batch: usize,
    /// Glyph coverage (0-255) above which a scanned pixel becomes a particle
    pub alpha_threshold: u8,
    /// Guide row period as a multiple of the font size
    pub guide_period_factor: f32,
    /// Opaque background used for raster export and frame composition
    pub background: InkColor,
    /// Application name used in export filenames
    pub app_name: String,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            max_velocity: 4.0,
            size_headroom: 1.5,
            hairline_stamp_size: 0.5,
            splatter_count: 3,
            particle_batch: DEFAULT_PARTICLE_BATCH,
            alpha_threshold: 50,
            guide_period_factor: 1.8,
            background: InkColor::PAPER,
            app_name: "calligraph".to_string(),
        }
    }
}

impl EngineTuning {
    /// Parse tuning from JSON, filling missing fields with defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Validate that tuning values are usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::OutOfRange {
                field: "history_capacity",
                value: 0.0,
                expected: ">= 1",
            });
        }
        if !(self.max_velocity.is_finite() && self.max_velocity > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "max_velocity",
                value: self.max_velocity,
                expected: "> 0",
            });
        }
        if !(self.size_headroom.is_finite() && self.size_headroom > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "size_headroom",
                value: self.size_headroom,
                expected: "> 0",
            });
        }
        if self.particle_batch == 0 {
            return Err(ConfigError::OutOfRange {
                field: "particle_batch",
                value: 0.0,
                expected: ">= 1",
            });
        }
        if !(self.guide_period_factor.is_finite() && self.guide_period_factor > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "guide_period_factor",
                value: self.guide_period_factor,
                expected: "> 0",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning() {
        let tuning = EngineTuning::default();
        assert_eq!(tuning.history_capacity, 20);
        assert_eq!(tuning.particle_batch, 1000);
        assert!(tuning.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let tuning =
            EngineTuning::from_json(r#"{"history_capacity": 5, "app_name": "sumi"}"#).unwrap();
        assert_eq!(tuning.history_capacity, 5);
        assert_eq!(tuning.app_name, "sumi");
        assert_eq!(tuning.size_headroom, 1.5);
    }

    #[test]
    fn test_rejects_zero_capacity() {
        assert!(EngineTuning::from_json(r#"{"history_capacity": 0}"#).is_err());
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            EngineTuning::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
