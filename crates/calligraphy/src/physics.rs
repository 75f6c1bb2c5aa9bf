//! Brush physics: maps a pair of samples and a brush configuration to stroke geometry.
//!
//! Everything here is pure. Samples and the resulting sizes are surface
//! pixels; brush sizes in a [`BrushConfiguration`] are CSS pixels and are
//! scaled by the device pixel ratio. Velocity is CSS pixels per millisecond.

use calligraph_config::{BrushConfiguration, EngineTuning};

use crate::constants::HAIRLINE_MAX_SIZE;
use crate::types::{PressureKind, Sample};

/// Geometry of one movement segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentDynamics {
    /// Euclidean length of the segment in surface pixels
    pub distance: f32,
    /// Direction of travel in radians
    pub angle: f32,
    /// Stamp diameter for this segment in surface pixels
    pub target_size: f32,
    /// CSS pixels per millisecond
    pub velocity: f32,
}

/// Segment velocity in sample units per millisecond. Zero or negative
/// elapsed time yields 0.
pub fn velocity(prev: &Sample, cur: &Sample) -> f32 {
    let elapsed = cur.time - prev.time;
    if elapsed.is_nan() || elapsed <= 0.0 {
        return 0.0;
    }
    let v = prev.position.distance(cur.position) as f64 / elapsed;
    if v.is_finite() { v as f32 } else { 0.0 }
}

/// Pressure used for sizing: measured pressure when the device reports it,
/// otherwise a synthetic pressure that falls as velocity rises.
pub fn effective_pressure(sample: &Sample, velocity: f32, max_velocity: f32) -> f32 {
    match sample.pressure_kind {
        PressureKind::Measured => sample.pressure.clamp(0.0, 1.0),
        PressureKind::Defaulted => {
            if max_velocity <= 0.0 {
                return 1.0;
            }
            1.0 - (velocity / max_velocity).clamp(0.0, 1.0)
        }
    }
}

/// `max_size * (1 - (1 - pressure) * taper)` with `max_size = size * headroom`
pub fn target_size(size: f32, taper: f32, pressure: f32, headroom: f32) -> f32 {
    let max_size = size * headroom;
    let pressure = pressure.clamp(0.0, 1.0);
    let taper = taper.clamp(0.0, 1.0);
    (max_size * (1.0 - (1.0 - pressure) * taper)).max(0.0)
}

/// Hairline mode: a uniform pen with no pressure response
pub fn is_hairline(config: &BrushConfiguration) -> bool {
    config.size <= HAIRLINE_MAX_SIZE
}

/// Physics model parameterized by engine tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushPhysics {
    pub max_velocity: f32,
    pub size_headroom: f32,
    pub hairline_stamp_size: f32,
}

impl Default for BrushPhysics {
    fn default() -> Self {
        Self::from_tuning(&EngineTuning::default())
    }
}

impl BrushPhysics {
    pub fn from_tuning(tuning: &EngineTuning) -> Self {
        Self {
            max_velocity: tuning.max_velocity,
            size_headroom: tuning.size_headroom,
            hairline_stamp_size: tuning.hairline_stamp_size,
        }
    }

    /// Compute the geometry for the movement from `prev` to `cur`, with
    /// samples in surface pixels at `device_pixel_ratio`
    pub fn segment(
        &self,
        prev: &Sample,
        cur: &Sample,
        config: &BrushConfiguration,
        device_pixel_ratio: f32,
    ) -> SegmentDynamics {
        let ratio = sanitize_ratio(device_pixel_ratio);
        let delta = cur.position - prev.position;
        let distance = delta.length();
        let angle = delta.y.atan2(delta.x);

        if is_hairline(config) {
            return SegmentDynamics {
                distance,
                angle,
                target_size: self.hairline_stamp_size * ratio,
                velocity: 0.0,
            };
        }

        let velocity = velocity(prev, cur) / ratio;
        let pressure = effective_pressure(cur, velocity, self.max_velocity);
        SegmentDynamics {
            distance,
            angle,
            target_size: target_size(
                config.size * ratio,
                config.taper,
                pressure,
                self.size_headroom,
            ),
            velocity,
        }
    }
}

/// A usable device pixel ratio: non-finite or non-positive values become 1
pub fn sanitize_ratio(device_pixel_ratio: f32) -> f32 {
    if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio
    } else {
        1.0
    }
}
