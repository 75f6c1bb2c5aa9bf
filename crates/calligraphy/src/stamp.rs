//! Stamp rendering: rasterizes tilted ellipses and keeps each layer's
//! pixels and vector log in step.

use tracing::trace;

use crate::constants::GLOW_OPACITY;
use crate::surface::CpuSurface;
use crate::types::{BlendMode, StampPrimitive};
use crate::vector::{VectorEntry, VectorLog};

/// Rasterize one stamp onto a surface.
///
/// The ellipse core is fully covered, with a one-pixel antialiased rim and an
/// optional soft glow ring of `stamp.glow` pixels beyond the edge.
/// Returns the bounding box of the affected region (x, y, width, height), or
/// None if the stamp is invalid or completely outside the surface.
pub fn rasterize_stamp(
    surface: &mut CpuSurface,
    stamp: &StampPrimitive,
) -> Option<(u32, u32, u32, u32)> {
    if !stamp.is_valid() || stamp.opacity <= 0.0 {
        trace!("rasterize_stamp: skipped invalid stamp {:?}", stamp);
        return None;
    }

    let glow = stamp.glow.max(0.0);
    let cos_a = stamp.rotation.cos();
    let sin_a = stamp.rotation.sin();
    let (rx, ry) = (stamp.radius_x, stamp.radius_y);

    // Bounding box of the rotated ellipse:
    //   half_w = sqrt(a² cos²θ + b² sin²θ)
    //   half_h = sqrt(a² sin²θ + b² cos²θ)
    let (cos_sq, sin_sq) = (cos_a * cos_a, sin_a * sin_a);
    let margin = glow + 1.0;
    let half_w = (rx * rx * cos_sq + ry * ry * sin_sq).sqrt() + margin;
    let half_h = (rx * rx * sin_sq + ry * ry * cos_sq).sqrt() + margin;

    let center = stamp.center;
    let x_min = ((center.x - half_w).floor().max(0.0) as u32).min(surface.width);
    let y_min = ((center.y - half_h).floor().max(0.0) as u32).min(surface.height);
    let x_max = ((center.x + half_w).ceil().max(0.0) as u32).min(surface.width);
    let y_max = ((center.y + half_h).ceil().max(0.0) as u32).min(surface.height);

    if x_min >= x_max || y_min >= y_max {
        return None;
    }

    let color = stamp.color.to_rgba();
    for py in y_min..y_max {
        for px in x_min..x_max {
            let dx = (px as f32 + 0.5) - center.x;
            let dy = (py as f32 + 0.5) - center.y;

            // Rotate by -angle into ellipse axes
            let local_x = dx * cos_a + dy * sin_a;
            let local_y = -dx * sin_a + dy * cos_a;
            let nx = local_x / rx;
            let ny = local_y / ry;
            let normalized = (nx * nx + ny * ny).sqrt();

            let coverage = edge_coverage(normalized, (dx * dx + dy * dy).sqrt(), glow);
            if coverage <= 0.0 {
                continue;
            }

            let amount = stamp.opacity * coverage;
            match stamp.blend_mode {
                BlendMode::Normal => surface.blend_pixel(px, py, color, amount),
                BlendMode::Erase => surface.erase_pixel(px, py, amount),
            }
        }
    }

    Some((x_min, y_min, x_max - x_min, y_max - y_min))
}

/// Coverage of a pixel at `normalized` ellipse distance (1.0 on the edge) and
/// `length` pixels from the center.
#[inline]
fn edge_coverage(normalized: f32, length: f32, glow: f32) -> f32 {
    if normalized <= 1.0 {
        return 1.0;
    }
    // Pixel distance past the edge along the ray from the center
    let beyond = length * (1.0 - 1.0 / normalized);
    let rim = (1.0 - beyond).clamp(0.0, 1.0);
    let halo = if glow > 0.0 {
        (1.0 - beyond / glow).clamp(0.0, 1.0) * GLOW_OPACITY
    } else {
        0.0
    };
    rim.max(halo)
}

/// A raster layer paired with the vector log of what was stamped onto it.
#[derive(Debug, Clone)]
pub struct InkLayer {
    pub surface: CpuSurface,
    pub log: VectorLog,
}

impl InkLayer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            surface: CpuSurface::new(width, height),
            log: VectorLog::new(),
        }
    }

    /// Draw a stamp and record it.
    ///
    /// This is the only path that writes ink into a layer: the pixel write
    /// and the log append happen together. Eraser stamps touch pixels only.
    /// Returns false when the stamp geometry is invalid and nothing happened.
    pub fn stamp(&mut self, stamp: &StampPrimitive) -> bool {
        if !stamp.is_valid() {
            trace!("InkLayer::stamp: skipped non-finite stamp");
            return false;
        }
        rasterize_stamp(&mut self.surface, stamp);
        if !stamp.is_eraser() {
            self.log.push(VectorEntry::from_stamp(stamp));
        }
        true
    }

    /// Clear pixels and log
    pub fn clear(&mut self) {
        self.surface.clear_transparent();
        self.log.clear();
    }

    pub fn width(&self) -> u32 {
        self.surface.width
    }

    pub fn height(&self) -> u32 {
        self.surface.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calligraph_config::InkColor;
    use glam::Vec2;

    fn stamp(x: f32, y: f32, radius: f32) -> StampPrimitive {
        StampPrimitive {
            center: Vec2::new(x, y),
            radius_x: radius,
            radius_y: radius,
            rotation: 0.0,
            color: InkColor::BLACK,
            opacity: 1.0,
            glow: 0.0,
            blend_mode: BlendMode::Normal,
        }
    }

    #[test]
    fn test_circle_covers_center_not_corner() {
        let mut surface = CpuSurface::new(20, 20);
        let region = rasterize_stamp(&mut surface, &stamp(10.0, 10.0, 4.0));
        assert!(region.is_some());
        assert!((surface.alpha_at(10, 10) - 1.0).abs() < 1e-5);
        assert_eq!(surface.alpha_at(0, 0), 0.0);
        assert_eq!(surface.alpha_at(19, 19), 0.0);
    }

    #[test]
    fn test_rotated_ellipse_follows_major_axis() {
        let mut surface = CpuSurface::new(40, 40);
        let mut s = stamp(20.0, 20.0, 10.0);
        s.radius_y = 2.0;
        s.rotation = std::f32::consts::FRAC_PI_2;
        rasterize_stamp(&mut surface, &s);
        // Major axis is now vertical
        assert!(surface.alpha_at(19, 27) > 0.9);
        assert_eq!(surface.alpha_at(27, 19), 0.0);
    }

    #[test]
    fn test_hairline_stamp_leaves_ink() {
        let mut surface = CpuSurface::new(10, 10);
        rasterize_stamp(&mut surface, &stamp(5.0, 5.0, 0.25));
        assert!(surface.inked_pixel_count() > 0);
    }

    #[test]
    fn test_glow_extends_coverage() {
        let mut hard = CpuSurface::new(40, 40);
        let mut soft = CpuSurface::new(40, 40);
        rasterize_stamp(&mut hard, &stamp(20.0, 20.0, 5.0));
        let mut glowing = stamp(20.0, 20.0, 5.0);
        glowing.glow = 6.0;
        rasterize_stamp(&mut soft, &glowing);
        assert!(soft.inked_pixel_count() > hard.inked_pixel_count());
        assert!(soft.alpha_at(29, 20) > 0.0);
        assert!(soft.alpha_at(29, 20) <= GLOW_OPACITY + 1e-5);
    }

    #[test]
    fn test_non_finite_is_skipped() {
        let mut layer = InkLayer::new(10, 10);
        assert!(!layer.stamp(&stamp(f32::NAN, 5.0, 2.0)));
        assert!(!layer.stamp(&stamp(5.0, 5.0, f32::INFINITY)));
        assert!(!layer.stamp(&stamp(5.0, 5.0, 0.0)));
        assert_eq!(layer.surface.inked_pixel_count(), 0);
        assert!(layer.log.is_empty());
    }

    #[test]
    fn test_eraser_clears_pixels_without_logging() {
        let mut layer = InkLayer::new(20, 20);
        assert!(layer.stamp(&stamp(10.0, 10.0, 5.0)));
        assert_eq!(layer.log.len(), 1);

        let mut eraser = stamp(10.0, 10.0, 8.0);
        eraser.blend_mode = BlendMode::Erase;
        assert!(layer.stamp(&eraser));
        assert_eq!(layer.log.len(), 1);
        assert_eq!(layer.surface.alpha_at(10, 10), 0.0);
    }

    #[test]
    fn test_offscreen_stamp_is_still_logged() {
        let mut layer = InkLayer::new(10, 10);
        assert!(layer.stamp(&stamp(-50.0, -50.0, 2.0)));
        assert_eq!(layer.surface.inked_pixel_count(), 0);
        assert_eq!(layer.log.len(), 1);
    }
}
