//! Generated text: glyphs are rasterized, scanned into particles and
//! re-stamped with brush texture over several frames.
//!
//! - [`raster`] - glyph rasterizers and coverage masks
//! - [`particles`] - grid scanning and the reveal animation

mod particles;
mod raster;

use std::cell::Cell;
use std::rc::Rc;

use calligraph_config::{BrushConfiguration, EngineTuning};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

pub use particles::{ParticleAnimation, ParticleStyle, scan_particles, scan_step};
pub use raster::{AlphaMask, BlockRasterizer, FontRasterizer, GlyphRasterizer, Script, TextRequest};

use crate::error::GenerateError;
use crate::scheduler::{FrameScheduler, TaskHandle, TickReport};
use crate::stamp::InkLayer;

/// The rasterizer used when none is supplied
pub fn default_rasterizer() -> FontRasterizer {
    #[cfg(feature = "default-fonts")]
    {
        FontRasterizer::with_default_fonts()
    }
    #[cfg(not(feature = "default-fonts"))]
    {
        FontRasterizer::empty()
    }
}

/// Text-to-particle generator.
///
/// Holds at most one live animation; starting a new render or cancelling
/// invalidates the previous handle before any new work begins.
pub struct TextParticleGenerator {
    rasterizer: Box<dyn GlyphRasterizer>,
    scheduler: FrameScheduler<InkLayer>,
    live: Option<TaskHandle>,
    remaining: Rc<Cell<usize>>,
    rng: StdRng,
    batch: usize,
    alpha_threshold: u8,
}

impl std::fmt::Debug for TextParticleGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextParticleGenerator")
            .field("live", &self.live)
            .field("remaining", &self.remaining.get())
            .field("batch", &self.batch)
            .finish()
    }
}

impl TextParticleGenerator {
    pub fn new(rasterizer: Box<dyn GlyphRasterizer>, tuning: &EngineTuning) -> Self {
        Self::from_rng(rasterizer, tuning, StdRng::from_os_rng())
    }

    pub fn with_seed(
        rasterizer: Box<dyn GlyphRasterizer>,
        tuning: &EngineTuning,
        seed: u64,
    ) -> Self {
        Self::from_rng(rasterizer, tuning, StdRng::seed_from_u64(seed))
    }

    fn from_rng(
        rasterizer: Box<dyn GlyphRasterizer>,
        tuning: &EngineTuning,
        rng: StdRng,
    ) -> Self {
        Self {
            rasterizer,
            scheduler: FrameScheduler::new(),
            live: None,
            remaining: Rc::new(Cell::new(0)),
            rng,
            batch: tuning.particle_batch.max(1),
            alpha_threshold: tuning.alpha_threshold,
        }
    }

    /// Replace the rasterizer (e.g. after registering fonts)
    pub fn set_rasterizer(&mut self, rasterizer: Box<dyn GlyphRasterizer>) {
        self.rasterizer = rasterizer;
    }

    /// Cancel any in-flight animation, clear the text layer and queue a new reveal.
    ///
    /// Returns the number of queued particles. Blank text, or text whose
    /// glyphs leave no coverage, leaves the layer cleared and queues nothing.
    pub fn start(
        &mut self,
        text: &str,
        config: &BrushConfiguration,
        layer: &mut InkLayer,
        device_pixel_ratio: f32,
    ) -> Result<usize, GenerateError> {
        self.cancel();
        layer.clear();

        if text.trim().is_empty() {
            debug!("TextParticleGenerator: blank text, layer cleared");
            return Ok(0);
        }
        if layer.surface.is_empty() {
            return Err(GenerateError::ResourceUnavailable);
        }

        let request =
            TextRequest::from_config(config, layer.width(), layer.height(), device_pixel_ratio);
        let mask = self.rasterizer.rasterize(text, &request)?;

        let step = scan_step(config.weight_option, device_pixel_ratio);
        let mut particles = scan_particles(&mask, step, self.alpha_threshold);
        particles.shuffle(&mut self.rng);
        let count = particles.len();
        if count == 0 {
            debug!("TextParticleGenerator: no coverage above threshold, nothing queued");
            return Ok(0);
        }

        let style = ParticleStyle::from_config(config, device_pixel_ratio);
        let animation = ParticleAnimation::new(
            particles,
            style,
            self.batch,
            StdRng::seed_from_u64(self.rng.random()),
            self.remaining.clone(),
        );
        self.live = Some(self.scheduler.schedule(animation));

        info!(
            "TextParticleGenerator: {} particles queued (step {}, {} chars)",
            count,
            step,
            text.chars().count()
        );
        Ok(count)
    }

    /// Cancel the live animation. Returns true if one was running.
    pub fn cancel(&mut self) -> bool {
        let cancelled = match self.live.take() {
            Some(handle) => self.scheduler.cancel(handle),
            None => false,
        };
        self.remaining.set(0);
        if cancelled {
            debug!("TextParticleGenerator: animation cancelled");
        }
        cancelled
    }

    /// Run one batch of the live animation against the text layer
    pub fn tick(&mut self, layer: &mut InkLayer) -> TickReport {
        let report = self.scheduler.tick(layer);
        if let Some(handle) = self.live
            && !self.scheduler.is_live(handle)
        {
            self.live = None;
        }
        report
    }

    pub fn is_animating(&self) -> bool {
        self.live.is_some()
    }

    /// Particles still waiting to be stamped
    pub fn remaining(&self) -> usize {
        self.remaining.get()
    }
}
