//! Glyph scanning and the particle reveal animation.

use std::cell::Cell;
use std::rc::Rc;

use calligraph_config::{BrushConfiguration, FontStyle, InkColor, WeightOption};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

use super::raster::AlphaMask;
use crate::scheduler::{FrameTask, TaskStatus};
use crate::stamp::InkLayer;
use crate::types::{BlendMode, StampPrimitive};

/// Per-particle size variation (plus or minus)
const SIZE_VARIATION: f32 = 0.15;

/// Fraction of particles dropped for the dry-ink look
const DRY_INK_DROP_RATE: f64 = 0.1;

/// Grid step for scanning a glyph mask: 1 for THIN, 2 otherwise, scaled by pixel density
pub fn scan_step(weight: WeightOption, device_pixel_ratio: f32) -> u32 {
    let base = match weight {
        WeightOption::Thin => 1.0,
        WeightOption::Normal | WeightOption::Bold => 2.0,
    };
    (base * device_pixel_ratio).round().max(1.0) as u32
}

/// Positions on an integer grid whose coverage exceeds `threshold`, in scan order
pub fn scan_particles(mask: &AlphaMask, step: u32, threshold: u8) -> Vec<Vec2> {
    let step = step.max(1) as usize;
    let mut particles = Vec::new();
    for y in (0..mask.height).step_by(step) {
        for x in (0..mask.width).step_by(step) {
            if mask.get(x, y) > threshold {
                particles.push(Vec2::new(x as f32, y as f32));
            }
        }
    }
    particles
}

/// How generated particles are stamped
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleStyle {
    /// Nominal stamp diameter in surface pixels
    pub size: f32,
    /// Maximum positional offset in surface pixels
    pub jiggle: f32,
    /// Minor/major axis ratio
    pub roundness: f32,
    /// Stamp rotation in radians
    pub rotation: f32,
    pub color: InkColor,
    /// Probability that a particle is skipped entirely
    pub drop_rate: f64,
}

impl ParticleStyle {
    pub fn from_config(config: &BrushConfiguration, device_pixel_ratio: f32) -> Self {
        let step = scan_step(config.weight_option, device_pixel_ratio) as f32;
        let weight_factor = match config.weight_option {
            WeightOption::Thin => 1.2,
            WeightOption::Normal => 1.6,
            WeightOption::Bold => 2.0,
        };
        let base_jiggle = match config.weight_option {
            WeightOption::Thin => 0.3,
            WeightOption::Normal | WeightOption::Bold => 0.8,
        };
        let (roundness, roughness_factor) = match config.font_style {
            FontStyle::Hand => (0.9, 1.0),
            FontStyle::Pen => (1.0, 0.4),
            FontStyle::Brush => (0.6, 1.5),
        };
        let drop_rate = if config.font_style == FontStyle::Brush
            && config.weight_option != WeightOption::Thin
        {
            DRY_INK_DROP_RATE
        } else {
            0.0
        };
        Self {
            size: step * weight_factor,
            jiggle: base_jiggle * device_pixel_ratio * roughness_factor,
            roundness,
            rotation: config.angle_radians(),
            color: config.color,
            drop_rate,
        }
    }
}

/// Incremental stamping of a shuffled particle queue into the text layer.
///
/// Runs as a frame task: each batch stamps up to `batch` particles. The
/// shared `remaining` counter lets the owner report progress while the task
/// lives inside the scheduler.
pub struct ParticleAnimation {
    queue: Vec<Vec2>,
    style: ParticleStyle,
    batch: usize,
    rng: StdRng,
    remaining: Rc<Cell<usize>>,
    stamped: usize,
    dropped: usize,
}

impl ParticleAnimation {
    pub fn new(
        queue: Vec<Vec2>,
        style: ParticleStyle,
        batch: usize,
        rng: StdRng,
        remaining: Rc<Cell<usize>>,
    ) -> Self {
        remaining.set(queue.len());
        Self {
            queue,
            style,
            batch: batch.max(1),
            rng,
            remaining,
            stamped: 0,
            dropped: 0,
        }
    }

    fn particle_stamp(&mut self, position: Vec2) -> StampPrimitive {
        let style = self.style;
        let jiggle = if style.jiggle > 0.0 {
            Vec2::new(
                self.rng.random_range(-style.jiggle..=style.jiggle),
                self.rng.random_range(-style.jiggle..=style.jiggle),
            )
        } else {
            Vec2::ZERO
        };
        let size = style.size * (1.0 + self.rng.random_range(-SIZE_VARIATION..=SIZE_VARIATION));
        let radius_x = size / 2.0;
        StampPrimitive {
            center: position + jiggle,
            radius_x,
            radius_y: radius_x * style.roundness,
            rotation: style.rotation,
            color: style.color,
            opacity: 1.0,
            glow: 0.0,
            blend_mode: BlendMode::Normal,
        }
    }
}

impl FrameTask<InkLayer> for ParticleAnimation {
    fn run_batch(&mut self, layer: &mut InkLayer) -> TaskStatus {
        for _ in 0..self.batch {
            let Some(position) = self.queue.pop() else {
                break;
            };
            if self.style.drop_rate > 0.0 && self.rng.random_bool(self.style.drop_rate) {
                self.dropped += 1;
                continue;
            }
            let stamp = self.particle_stamp(position);
            if layer.stamp(&stamp) {
                self.stamped += 1;
            }
        }
        self.remaining.set(self.queue.len());

        if self.queue.is_empty() {
            debug!(
                "ParticleAnimation: done, stamped={} dropped={}",
                self.stamped, self.dropped
            );
            TaskStatus::Complete
        } else {
            TaskStatus::Pending
        }
    }
}
