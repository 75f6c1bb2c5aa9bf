//! Layer compositor: guides, generated text and hand drawing, plus the
//! scratch surface frames are composed into.

use calligraph_config::{DisplayConfig, InkColor};
use tracing::{debug, info};

use crate::stamp::InkLayer;
use crate::surface::CpuSurface;

/// Guide line color (straight alpha)
const GUIDE_COLOR: [f32; 3] = [0.55, 0.6, 0.7];

/// Guide line offsets from the baseline in font-size units, with line alpha
const GUIDE_LINES: [(f32, f32); 4] = [
    // ascender
    (-0.75, 0.12),
    // mean line
    (-0.45, 0.12),
    // baseline
    (0.0, 0.3),
    // descender
    (0.25, 0.12),
];

/// Vertical period of guide rows in surface pixels
pub fn guide_period(font_size: f32, period_factor: f32, device_pixel_ratio: f32) -> f32 {
    font_size * period_factor * device_pixel_ratio
}

/// Three ordered layers plus a scratch surface, all the same size
#[derive(Debug)]
pub struct LayerStack {
    pub guides: CpuSurface,
    pub text: InkLayer,
    pub drawing: InkLayer,
    scratch: CpuSurface,
    display: Option<DisplayConfig>,
    show_guides: bool,
}

impl Default for LayerStack {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerStack {
    /// Unallocated stack; every surface is zero-sized until the first resize
    pub fn new() -> Self {
        Self {
            guides: CpuSurface::new(0, 0),
            text: InkLayer::new(0, 0),
            drawing: InkLayer::new(0, 0),
            scratch: CpuSurface::new(0, 0),
            display: None,
            show_guides: false,
        }
    }

    pub fn is_allocated(&self) -> bool {
        !self.drawing.surface.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.drawing.width()
    }

    pub fn height(&self) -> u32 {
        self.drawing.height()
    }

    pub fn display(&self) -> Option<DisplayConfig> {
        self.display
    }

    pub fn device_pixel_ratio(&self) -> f32 {
        self.display.map(|d| d.scale).unwrap_or(1.0)
    }

    pub fn show_guides(&self) -> bool {
        self.show_guides
    }

    pub fn set_show_guides(&mut self, enabled: bool) {
        self.show_guides = enabled;
    }

    /// Reallocate every surface at `viewport * device_pixel_ratio`.
    ///
    /// The drawing layer keeps its pixels and log; guides and text start
    /// empty. Returns false (and changes nothing) when the size is unchanged.
    pub fn resize(&mut self, viewport: DisplayConfig) -> bool {
        let width = viewport.scaled_width();
        let height = viewport.scaled_height();
        self.display = Some(viewport);

        if width == self.width() && height == self.height() {
            debug!("LayerStack::resize: {}x{} unchanged", width, height);
            return false;
        }

        info!(
            "LayerStack::resize: {}x{} -> {}x{} (ratio {:.2})",
            self.width(),
            self.height(),
            width,
            height,
            viewport.scale
        );
        self.drawing.surface = self.drawing.surface.resized_preserving(width, height);
        self.text = InkLayer::new(width, height);
        self.guides = CpuSurface::new(width, height);
        self.scratch = CpuSurface::new(width, height);
        true
    }

    /// Redraw the guide rows for a font size; clears them when guides are off
    pub fn render_guides(&mut self, font_size: f32, period_factor: f32) {
        self.guides.clear_transparent();
        if !self.show_guides || !self.is_allocated() {
            return;
        }

        let ratio = self.device_pixel_ratio();
        let period = guide_period(font_size, period_factor, ratio);
        if !(period.is_finite() && period >= 1.0) {
            return;
        }
        let font_px = font_size * ratio;
        let thickness = ratio.max(1.0);
        let height = self.guides.height as f32;

        // Center the rows: equal leftover space above the first and below the last
        let rows = (height / period).floor().max(1.0);
        let phase = (height - rows * period) / 2.0;

        let mut row_top = phase;
        while row_top < height {
            let baseline = row_top + period / 2.0 + font_px * 0.25;
            for (offset, alpha) in GUIDE_LINES {
                let y = baseline + offset * font_px - thickness / 2.0;
                let color = [GUIDE_COLOR[0], GUIDE_COLOR[1], GUIDE_COLOR[2], alpha];
                self.guides.fill_span(y, thickness, color);
            }
            row_top += period;
        }
        debug!(
            "LayerStack::render_guides: period={:.1} rows={} phase={:.1}",
            period, rows, phase
        );
    }

    /// Compose background, guides (when shown), text and drawing into the
    /// scratch surface and return it
    pub fn compose_frame(&mut self, background: InkColor) -> &CpuSurface {
        self.scratch.clear(background.to_rgba());
        if self.show_guides {
            self.scratch.composite_over(&self.guides);
        }
        self.scratch.composite_over(&self.text.surface);
        self.scratch.composite_over(&self.drawing.surface);
        &self.scratch
    }

    /// Compose the ink layers (no guides) over an opaque background onto a new surface
    pub fn flatten_ink(&self, background: InkColor) -> CpuSurface {
        let mut out = CpuSurface::new(self.width(), self.height());
        out.clear(background.to_rgba());
        out.composite_over(&self.text.surface);
        out.composite_over(&self.drawing.surface);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlendMode, StampPrimitive};
    use glam::Vec2;

    fn ink(layer: &mut InkLayer, x: f32, y: f32) {
        layer.stamp(&StampPrimitive {
            center: Vec2::new(x, y),
            radius_x: 3.0,
            radius_y: 3.0,
            rotation: 0.0,
            color: InkColor::BLACK,
            opacity: 1.0,
            glow: 0.0,
            blend_mode: BlendMode::Normal,
        });
    }

    #[test]
    fn test_resize_scales_by_ratio() {
        let mut layers = LayerStack::new();
        assert!(!layers.is_allocated());
        assert!(layers.resize(DisplayConfig::with_scale(100, 50, 2.0)));
        assert_eq!((layers.width(), layers.height()), (200, 100));
        assert_eq!(layers.text.width(), 200);
        assert_eq!(layers.guides.height, 100);
    }

    #[test]
    fn test_redundant_resize_is_noop() {
        let mut layers = LayerStack::new();
        layers.resize(DisplayConfig::new(40, 40));
        ink(&mut layers.text, 10.0, 10.0);
        assert!(!layers.resize(DisplayConfig::new(40, 40)));
        assert!(layers.text.surface.inked_pixel_count() > 0);
    }

    #[test]
    fn test_resize_preserves_drawing_only() {
        let mut layers = LayerStack::new();
        layers.resize(DisplayConfig::new(40, 40));
        ink(&mut layers.drawing, 10.0, 10.0);
        ink(&mut layers.text, 20.0, 20.0);

        assert!(layers.resize(DisplayConfig::new(60, 30)));
        assert!(layers.drawing.surface.alpha_at(10, 10) > 0.9);
        assert_eq!(layers.drawing.log.len(), 1);
        assert_eq!(layers.text.surface.inked_pixel_count(), 0);
        assert!(layers.text.log.is_empty());
    }

    #[test]
    fn test_guides_only_when_enabled() {
        let mut layers = LayerStack::new();
        layers.resize(DisplayConfig::new(200, 400));
        layers.render_guides(48.0, 1.8);
        assert_eq!(layers.guides.inked_pixel_count(), 0);

        layers.set_show_guides(true);
        layers.render_guides(48.0, 1.8);
        assert!(layers.guides.inked_pixel_count() > 0);

        layers.set_show_guides(false);
        layers.render_guides(48.0, 1.8);
        assert_eq!(layers.guides.inked_pixel_count(), 0);
    }

    #[test]
    fn test_guide_period() {
        assert!((guide_period(100.0, 1.8, 2.0) - 360.0).abs() < 1e-4);
    }

    #[test]
    fn test_compose_frame_layers_in_order() {
        let mut layers = LayerStack::new();
        layers.resize(DisplayConfig::new(30, 30));
        ink(&mut layers.drawing, 10.0, 10.0);
        let frame = layers.compose_frame(InkColor::PAPER);
        let paper = InkColor::PAPER.to_rgba();
        let corner = frame.get_pixel(29, 29).unwrap();
        assert!((corner[0] - paper[0]).abs() < 1e-6);
        assert_eq!(corner[3], 1.0);
        let inked = frame.get_pixel(10, 10).unwrap();
        assert!(inked[0] < 0.2);
    }

    #[test]
    fn test_flatten_ink_is_opaque() {
        let mut layers = LayerStack::new();
        layers.resize(DisplayConfig::new(8, 8));
        let flat = layers.flatten_ink(InkColor::PAPER);
        assert!(flat.pixels().iter().all(|p| (p[3] - 1.0).abs() < 1e-6));
    }
}
