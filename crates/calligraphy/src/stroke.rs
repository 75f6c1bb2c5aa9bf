//! Stroke engine: turns consecutive samples into stamps with dry-brush
//! texture, splatter, soft glow and eraser compositing.

use std::f32::consts::FRAC_PI_2;

use calligraph_config::{BrushConfiguration, EngineTuning};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::constants::{
    BASE_STEP_FACTOR, DRY_BRUSH_DIVISOR, GLOW_HARDNESS_CUTOFF, MAX_SEGMENT_STAMPS, MIN_STEP,
    SPACING_FACTOR, SPLATTER_MAX_OPACITY, SPLATTER_RADIUS_FACTOR, SPLATTER_ROUGHNESS,
};
use crate::physics::{BrushPhysics, is_hairline, sanitize_ratio};
use crate::stamp::InkLayer;
use crate::types::{BlendMode, Sample, StampPrimitive};

/// State of one active single-pointer drawing session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSession {
    /// Pointer driving the stroke
    pub pointer_id: u32,
    /// Last processed sample; the next segment starts here
    pub last: Sample,
    /// Device pixel ratio of the surface the samples live on
    pub device_pixel_ratio: f32,
    /// Main stamps emitted so far
    pub stamps: usize,
}

/// What one `stroke_to` call produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentReport {
    pub steps: usize,
    pub stamps: usize,
    pub skipped: usize,
    pub splatters: usize,
}

/// Stamp spacing for a stamp of `target_size`, both in CSS pixels
pub fn step_size(target_size: f32, spacing: f32) -> f32 {
    let base_step = (target_size * BASE_STEP_FACTOR).max(MIN_STEP);
    base_step + spacing * target_size * SPACING_FACTOR
}

/// Width of the soft edge drawn around a stamp
pub fn glow_width(target_size: f32, config: &BrushConfiguration, hairline: bool) -> f32 {
    if hairline || config.is_eraser || config.hardness >= GLOW_HARDNESS_CUTOFF {
        0.0
    } else {
        target_size * (1.0 - config.hardness)
    }
}

/// Stroke engine
///
/// Owns the physics model and the random source for dry-brush and splatter.
#[derive(Debug, Clone)]
pub struct StrokeEngine {
    physics: BrushPhysics,
    splatter_count: usize,
    rng: StdRng,
}

impl StrokeEngine {
    /// Create an engine seeded from the operating system
    pub fn new(tuning: &EngineTuning) -> Self {
        Self::from_rng(tuning, StdRng::from_os_rng())
    }

    /// Create an engine with a deterministic random sequence
    pub fn with_seed(tuning: &EngineTuning, seed: u64) -> Self {
        Self::from_rng(tuning, StdRng::seed_from_u64(seed))
    }

    fn from_rng(tuning: &EngineTuning, rng: StdRng) -> Self {
        Self {
            physics: BrushPhysics::from_tuning(tuning),
            splatter_count: tuning.splatter_count,
            rng,
        }
    }

    pub fn physics(&self) -> &BrushPhysics {
        &self.physics
    }

    /// Start a session at the contact point. Nothing is stamped until the
    /// contact moves.
    pub fn begin(&self, pointer_id: u32, sample: Sample, device_pixel_ratio: f32) -> StrokeSession {
        let device_pixel_ratio = sanitize_ratio(device_pixel_ratio);
        debug!(
            "StrokeEngine::begin: pointer={} at ({:.1}, {:.1}) ratio={:.2}",
            pointer_id, sample.position.x, sample.position.y, device_pixel_ratio
        );
        StrokeSession {
            pointer_id,
            last: sample,
            device_pixel_ratio,
            stamps: 0,
        }
    }

    /// Stamp the segment from the session's last sample to `sample`, then
    /// advance the session.
    pub fn stroke_to(
        &mut self,
        session: &mut StrokeSession,
        sample: Sample,
        config: &BrushConfiguration,
        layer: &mut InkLayer,
    ) -> SegmentReport {
        let prev = session.last;
        session.last = sample;

        let ratio = session.device_pixel_ratio;
        let dynamics = self.physics.segment(&prev, &sample, config, ratio);
        if !dynamics.distance.is_finite() || !dynamics.target_size.is_finite() {
            trace!("stroke_to: non-finite segment skipped");
            return SegmentReport::default();
        }

        let hairline = is_hairline(config);
        let erasing = config.is_eraser;
        let target_size = dynamics.target_size;
        // Spacing is decided in CSS pixels so the stamp count is the same at every ratio
        let step = step_size(target_size / ratio, config.spacing);
        let steps = ((dynamics.distance / ratio / step).ceil() as usize).min(MAX_SEGMENT_STAMPS);

        let radius_x = target_size / 2.0;
        let radius_y = radius_x * config.roundness;
        let rotation = config.angle_radians();
        let glow = glow_width(target_size, config, hairline);
        let blend_mode = if erasing {
            BlendMode::Erase
        } else {
            BlendMode::Normal
        };
        let textured = !hairline && !erasing;
        let skip_threshold = dynamics.velocity * config.roughness / DRY_BRUSH_DIVISOR;
        let opacity = 1.0;
        let splatter = textured && (opacity < 0.9 || config.roughness > SPLATTER_ROUGHNESS);

        let mut report = SegmentReport {
            steps,
            ..Default::default()
        };

        for i in 0..steps {
            let t = i as f32 / steps as f32;
            let center = prev.position.lerp(sample.position, t);

            if textured && self.rng.random::<f32>() < skip_threshold {
                report.skipped += 1;
                continue;
            }

            let main = StampPrimitive {
                center,
                radius_x,
                radius_y,
                rotation,
                color: config.color,
                opacity,
                glow,
                blend_mode,
            };
            if layer.stamp(&main) {
                report.stamps += 1;
            }

            if splatter {
                for _ in 0..self.splatter_count {
                    let spray = self.splatter(&main, target_size);
                    if layer.stamp(&spray) {
                        report.splatters += 1;
                    }
                }
            }
        }

        session.stamps += report.stamps;
        trace!(
            "stroke_to: dist={:.1} size={:.1} v={:.3} steps={} stamps={} skipped={} splatters={}",
            dynamics.distance,
            target_size,
            dynamics.velocity,
            report.steps,
            report.stamps,
            report.skipped,
            report.splatters
        );
        report
    }

    /// A small droplet thrown off to the side of the main stamp
    fn splatter(&mut self, main: &StampPrimitive, target_size: f32) -> StampPrimitive {
        let angle = main.rotation + self.rng.random_range(-FRAC_PI_2..=FRAC_PI_2);
        let distance = self.rng.random::<f32>() * target_size / 2.0;
        StampPrimitive {
            center: main.center + Vec2::from_angle(angle) * distance,
            radius_x: main.radius_x * SPLATTER_RADIUS_FACTOR,
            radius_y: main.radius_y * SPLATTER_RADIUS_FACTOR,
            rotation: main.rotation,
            color: main.color,
            opacity: SPLATTER_MAX_OPACITY * self.rng.random::<f32>(),
            glow: 0.0,
            blend_mode: BlendMode::Normal,
        }
    }
}
