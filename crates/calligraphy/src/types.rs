use calligraph_config::InkColor;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Blend modes for stamping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum BlendMode {
    #[default]
    Normal = 0,
    /// Destination-out: removes existing ink instead of painting
    Erase = 1,
}

/// Where a sample's pressure value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PressureKind {
    /// Reported by the device (stylus)
    Measured,
    /// Filled in because the device reports no pressure (mouse, touch)
    Defaulted,
}

/// One normalized input sample in surface (device pixel) space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub position: Vec2,
    /// Pressure 0.0-1.0
    pub pressure: f32,
    pub pressure_kind: PressureKind,
    /// Monotonic timestamp in milliseconds
    pub time: f64,
}

impl Sample {
    /// Sample with a device-reported pressure
    pub fn measured(x: f32, y: f32, pressure: f32, time: f64) -> Self {
        Self {
            position: Vec2::new(x, y),
            pressure: pressure.clamp(0.0, 1.0),
            pressure_kind: PressureKind::Measured,
            time,
        }
    }

    /// Sample whose pressure was filled in with the default
    pub fn defaulted(x: f32, y: f32, time: f64) -> Self {
        Self {
            position: Vec2::new(x, y),
            pressure: crate::constants::DEFAULT_PRESSURE,
            pressure_kind: PressureKind::Defaulted,
            time,
        }
    }
}

/// A single tilted-ellipse stamp, ready for rasterization and vector logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampPrimitive {
    pub center: Vec2,
    pub radius_x: f32,
    pub radius_y: f32,
    /// Rotation in radians
    pub rotation: f32,
    pub color: InkColor,
    pub opacity: f32,
    /// Soft edge width in surface pixels beyond the ellipse, 0 for a hard edge
    pub glow: f32,
    pub blend_mode: BlendMode,
}

impl StampPrimitive {
    pub fn is_eraser(&self) -> bool {
        self.blend_mode == BlendMode::Erase
    }

    /// All geometry finite and radii positive
    pub fn is_valid(&self) -> bool {
        self.center.is_finite()
            && self.radius_x.is_finite()
            && self.radius_y.is_finite()
            && self.rotation.is_finite()
            && self.opacity.is_finite()
            && self.glow.is_finite()
            && self.radius_x > 0.0
            && self.radius_y > 0.0
    }
}
