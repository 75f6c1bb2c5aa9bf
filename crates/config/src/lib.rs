//! Shared configuration for Calligraph
//!
//! This crate provides the single source of truth for the viewport geometry,
//! the brush configuration supplied by the UI on every draw/generate action,
//! and the numeric tuning of the engine.

mod brush;
mod error;
mod tuning;

use serde::{Deserialize, Serialize};

pub use brush::{BrushConfiguration, FontStyle, InkColor, WeightOption};
pub use error::ConfigError;
pub use tuning::EngineTuning;

/// Default viewport width in CSS pixels
pub const DEFAULT_WIDTH: u32 = 1280;

/// Default viewport height in CSS pixels
pub const DEFAULT_HEIGHT: u32 = 800;

/// Default device pixel ratio (1.0 = no scaling)
pub const DEFAULT_SCALE: f32 = 1.0;

/// Viewport configuration: container size in CSS pixels plus device pixel ratio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Container width in CSS pixels
    pub width: u32,
    /// Container height in CSS pixels
    pub height: u32,
    /// Device pixel ratio
    pub scale: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            scale: DEFAULT_SCALE,
        }
    }
}

impl DisplayConfig {
    /// Create a new display config with the given dimensions and a 1.0 pixel ratio
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scale: DEFAULT_SCALE,
        }
    }

    /// Create a display config with an explicit device pixel ratio.
    ///
    /// Non-finite or non-positive ratios fall back to 1.0.
    pub fn with_scale(width: u32, height: u32, scale: f32) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            DEFAULT_SCALE
        };
        Self {
            width,
            height,
            scale,
        }
    }

    /// Get scaled width (device pixels)
    pub fn scaled_width(&self) -> u32 {
        (self.width as f32 * self.scale).round() as u32
    }

    /// Get scaled height (device pixels)
    pub fn scaled_height(&self) -> u32 {
        (self.height as f32 * self.scale).round() as u32
    }

    /// True when the viewport has no area (e.g. before initial layout)
    pub fn is_empty(&self) -> bool {
        self.scaled_width() == 0 || self.scaled_height() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DisplayConfig::default();
        assert_eq!(config.width, DEFAULT_WIDTH);
        assert_eq!(config.height, DEFAULT_HEIGHT);
        assert_eq!(config.scale, DEFAULT_SCALE);
    }

    #[test]
    fn test_scaled_dimensions() {
        let config = DisplayConfig::with_scale(640, 480, 2.0);
        assert_eq!(config.scaled_width(), 1280);
        assert_eq!(config.scaled_height(), 960);
    }

    #[test]
    fn test_invalid_scale_falls_back() {
        let config = DisplayConfig::with_scale(10, 10, f32::NAN);
        assert_eq!(config.scale, DEFAULT_SCALE);
        let config = DisplayConfig::with_scale(10, 10, -2.0);
        assert_eq!(config.scale, DEFAULT_SCALE);
    }

    #[test]
    fn test_empty_viewport() {
        assert!(DisplayConfig::new(0, 300).is_empty());
        assert!(!DisplayConfig::new(1, 1).is_empty());
    }
}
