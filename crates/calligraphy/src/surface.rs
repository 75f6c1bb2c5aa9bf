//! CPU raster surface for layers - premultiplied RGBA f32 storage

use tracing::debug;

/// An 8-bit copy of a surface, used for history snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterSnapshot {
    pub width: u32,
    pub height: u32,
    /// Premultiplied RGBA, row-major
    data: Vec<[u8; 4]>,
}

impl RasterSnapshot {
    /// Whether every pixel is fully transparent
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|p| p[3] == 0)
    }
}

/// A CPU raster surface.
/// Stores pixels as premultiplied [f32; 4]
#[derive(Debug, Clone)]
pub struct CpuSurface {
    /// Surface dimensions
    pub width: u32,
    pub height: u32,
    /// Pixel data in row-major order, each pixel is [r, g, b, a] as f32
    pixels: Vec<[f32; 4]>,
}

impl CpuSurface {
    /// Create a new surface with the given dimensions, initialized to transparent black
    pub fn new(width: u32, height: u32) -> Self {
        let pixel_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            pixels: vec![[0.0, 0.0, 0.0, 0.0]; pixel_count],
        }
    }

    /// Whether the surface has no pixels
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Clear the surface to a solid (premultiplied) color
    pub fn clear(&mut self, color: [f32; 4]) {
        self.pixels.fill(color);
    }

    /// Reset every pixel to transparent
    pub fn clear_transparent(&mut self) {
        self.clear([0.0; 4]);
    }

    /// Get a pixel at the given coordinates
    /// Returns None if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y as usize) * (self.width as usize) + (x as usize);
        Some(self.pixels[index])
    }

    /// Alpha at the given coordinates, 0.0 when out of bounds
    #[inline]
    pub fn alpha_at(&self, x: u32, y: u32) -> f32 {
        self.get_pixel(x, y).map(|p| p[3]).unwrap_or(0.0)
    }

    /// Set a pixel at the given coordinates
    /// Does nothing if coordinates are out of bounds
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [f32; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = (y as usize) * (self.width as usize) + (x as usize);
        self.pixels[index] = color;
    }

    /// Paint a straight-alpha color over an existing pixel (source-over)
    /// Formula: out = src * alpha + dst * (1 - alpha)
    #[inline]
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: [f32; 4], opacity: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = (y as usize) * (self.width as usize) + (x as usize);
        let dst = self.pixels[index];

        let src_alpha = (color[3] * opacity).clamp(0.0, 1.0);
        let inv_src_alpha = 1.0 - src_alpha;

        self.pixels[index] = [
            color[0] * src_alpha + dst[0] * inv_src_alpha,
            color[1] * src_alpha + dst[1] * inv_src_alpha,
            color[2] * src_alpha + dst[2] * inv_src_alpha,
            src_alpha + dst[3] * inv_src_alpha,
        ];
    }

    /// Erase a pixel (destination-out)
    /// The erase_amount (0-1) determines how much coverage is removed
    #[inline]
    pub fn erase_pixel(&mut self, x: u32, y: u32, erase_amount: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = (y as usize) * (self.width as usize) + (x as usize);
        let dst = self.pixels[index];

        let remaining = (1.0 - erase_amount).clamp(0.0, 1.0);
        self.pixels[index] = [
            dst[0] * remaining,
            dst[1] * remaining,
            dst[2] * remaining,
            dst[3] * remaining,
        ];
    }

    /// Blend a horizontal band spanning the full width.
    ///
    /// `y` is the band's top edge; partially covered rows get fractional coverage.
    pub fn fill_span(&mut self, y: f32, thickness: f32, color: [f32; 4]) {
        if !(y.is_finite() && thickness.is_finite()) || thickness <= 0.0 {
            return;
        }
        let top = y.max(0.0);
        let bottom = (y + thickness).min(self.height as f32);
        if top >= bottom {
            return;
        }
        for row in (top.floor() as u32)..(bottom.ceil() as u32) {
            let row_top = row as f32;
            let coverage = (bottom.min(row_top + 1.0) - top.max(row_top)).clamp(0.0, 1.0);
            if coverage <= 0.0 {
                continue;
            }
            for x in 0..self.width {
                self.blend_pixel(x, row, color, coverage);
            }
        }
    }

    /// Composite another surface of the same size over this one (premultiplied source-over)
    ///
    /// Returns false when sizes differ.
    pub fn composite_over(&mut self, top: &CpuSurface) -> bool {
        if top.width != self.width || top.height != self.height {
            debug!(
                "composite_over: size mismatch {}x{} onto {}x{}",
                top.width, top.height, self.width, self.height
            );
            return false;
        }
        for (dst, src) in self.pixels.iter_mut().zip(top.pixels.iter()) {
            let inv = 1.0 - src[3];
            *dst = [
                src[0] + dst[0] * inv,
                src[1] + dst[1] * inv,
                src[2] + dst[2] * inv,
                src[3] + dst[3] * inv,
            ];
        }
        true
    }

    /// Copy of this surface at a new size, keeping the overlapping top-left region
    pub fn resized_preserving(&self, width: u32, height: u32) -> CpuSurface {
        let mut resized = CpuSurface::new(width, height);
        resized.copy_overlap(&self.pixels, self.width, self.height, |p| p);
        resized
    }

    /// Quantize the surface into an 8-bit snapshot
    pub fn snapshot(&self) -> RasterSnapshot {
        let data = self
            .pixels
            .iter()
            .map(|p| p.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect();
        RasterSnapshot {
            width: self.width,
            height: self.height,
            data,
        }
    }

    /// Replace the surface content with a snapshot.
    ///
    /// A snapshot of a different size is copied into the overlapping
    /// top-left region and the rest of the surface is cleared.
    pub fn restore(&mut self, snapshot: &RasterSnapshot) {
        if snapshot.width == self.width && snapshot.height == self.height {
            for (dst, src) in self.pixels.iter_mut().zip(snapshot.data.iter()) {
                *dst = src.map(|c| c as f32 / 255.0);
            }
            return;
        }
        debug!(
            "restore: snapshot {}x{} differs from surface {}x{}, copying overlap",
            snapshot.width, snapshot.height, self.width, self.height
        );
        self.clear_transparent();
        self.copy_overlap(&snapshot.data, snapshot.width, snapshot.height, |p| {
            p.map(|c| c as f32 / 255.0)
        });
    }

    fn copy_overlap<P: Copy>(
        &mut self,
        source: &[P],
        src_width: u32,
        src_height: u32,
        convert: impl Fn(P) -> [f32; 4],
    ) {
        let copy_w = self.width.min(src_width) as usize;
        let copy_h = self.height.min(src_height) as usize;
        for y in 0..copy_h {
            let src_row = y * src_width as usize;
            let dst_row = y * self.width as usize;
            for x in 0..copy_w {
                self.pixels[dst_row + x] = convert(source[src_row + x]);
            }
        }
    }

    /// Straight-alpha RGBA8 bytes, for image encoding
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 4);
        for p in &self.pixels {
            let a = p[3].clamp(0.0, 1.0);
            let unpremultiply = |c: f32| {
                if a > 0.0 {
                    ((c / a).clamp(0.0, 1.0) * 255.0).round() as u8
                } else {
                    0
                }
            };
            bytes.extend_from_slice(&[
                unpremultiply(p[0]),
                unpremultiply(p[1]),
                unpremultiply(p[2]),
                (a * 255.0).round() as u8,
            ]);
        }
        bytes
    }

    /// Get the total number of pixels
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    /// Number of pixels with any coverage
    pub fn inked_pixel_count(&self) -> usize {
        self.pixels.iter().filter(|p| p[3] > 0.0).count()
    }

    /// Get direct access to pixel data
    #[inline]
    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }
}
