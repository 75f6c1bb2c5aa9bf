//! Glyph rasterization into coverage masks.

use std::collections::HashMap;

use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont, point};
use calligraph_config::{BrushConfiguration, FontStyle, WeightOption};
use tracing::{debug, warn};

use crate::error::GenerateError;

/// 8-bit coverage buffer at surface resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMask {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>,
}

impl AlphaMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Raise coverage at a signed position; out-of-bounds writes are dropped
    #[inline]
    pub fn raise(&mut self, x: i64, y: i64, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
        let index = y as usize * self.width as usize + x as usize;
        self.data[index] = self.data[index].max(value);
    }

    /// Fill an axis-aligned span of one row with full coverage
    fn fill_row(&mut self, y: i64, x0: f32, x1: f32) {
        let start = x0.round() as i64;
        let end = x1.round() as i64;
        for x in start..end {
            self.raise(x, y, 1.0);
        }
    }

    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&v| v == 0)
    }

    /// Count of pixels with coverage above `threshold`
    pub fn count_above(&self, threshold: u8) -> usize {
        self.data.iter().filter(|&&v| v > threshold).count()
    }

    /// Grow coverage outward by `radius` pixels (a round stroke around the fill)
    pub fn dilated(&self, radius: u32) -> AlphaMask {
        if radius == 0 {
            return self.clone();
        }
        let r = radius as i64;
        let offsets: Vec<(i64, i64)> = (-r..=r)
            .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
            .filter(|(dx, dy)| dx * dx + dy * dy <= r * r)
            .collect();

        let mut out = AlphaMask::new(self.width, self.height);
        for y in 0..self.height as i64 {
            for x in 0..self.width as i64 {
                let value = self.data[y as usize * self.width as usize + x as usize];
                if value == 0 {
                    continue;
                }
                for (dx, dy) in &offsets {
                    out.raise(x + dx, y + dy, value as f32 / 255.0);
                }
            }
        }
        out
    }
}

/// Writing system of the text, used to pick a glyph style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    Latin,
    /// Hangul, kana or CJK ideographs
    Native,
}

impl Script {
    pub fn detect(text: &str) -> Self {
        if text.chars().any(is_native_char) {
            Script::Native
        } else {
            Script::Latin
        }
    }

    fn other(self) -> Self {
        match self {
            Script::Latin => Script::Native,
            Script::Native => Script::Latin,
        }
    }
}

fn is_native_char(c: char) -> bool {
    matches!(c,
        '\u{1100}'..='\u{11FF}'   // Hangul Jamo
        | '\u{3040}'..='\u{30FF}' // Hiragana, Katakana
        | '\u{3130}'..='\u{318F}' // Hangul compatibility Jamo
        | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
        | '\u{AC00}'..='\u{D7AF}' // Hangul syllables
    )
}

/// Layout parameters for one text render, in surface pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextRequest {
    pub width: u32,
    pub height: u32,
    pub font_px: f32,
    pub letter_spacing_px: f32,
    /// Multiple of `font_px` between baselines
    pub line_height: f32,
    pub slant_degrees: f32,
    pub style: FontStyle,
    pub weight: WeightOption,
}

impl TextRequest {
    /// Build a request for a surface of `width x height` at the given pixel ratio.
    ///
    /// Letter spacing is dropped for the cursive HAND style.
    pub fn from_config(
        config: &BrushConfiguration,
        width: u32,
        height: u32,
        device_pixel_ratio: f32,
    ) -> Self {
        let letter_spacing_px = match config.font_style {
            FontStyle::Hand => 0.0,
            _ => config.letter_spacing * device_pixel_ratio,
        };
        Self {
            width,
            height,
            font_px: config.font_size * device_pixel_ratio,
            letter_spacing_px,
            line_height: config.line_height,
            slant_degrees: config.slant,
            style: config.font_style,
            weight: config.weight_option,
        }
    }

    /// Width of the outline stroke added around BOLD glyphs
    pub fn outline_radius(&self) -> u32 {
        match self.weight {
            WeightOption::Bold => (self.font_px * 0.025).round().max(1.0) as u32,
            _ => 0,
        }
    }

    fn shear(&self) -> f32 {
        self.slant_degrees.to_radians().tan()
    }

    /// Baselines of `line_count` lines whose glyphs span `ascent + descent`,
    /// centered vertically
    fn baselines(&self, line_count: usize, ascent: f32, descent: f32) -> Vec<f32> {
        let step = self.font_px * self.line_height;
        let block = step * line_count.saturating_sub(1) as f32 + ascent + descent;
        let top = (self.height as f32 - block) / 2.0;
        (0..line_count)
            .map(|i| top + ascent + i as f32 * step)
            .collect()
    }

    fn validate(&self, text: &str) -> Result<(), GenerateError> {
        if text.trim().is_empty() {
            return Err(GenerateError::EmptyText);
        }
        if self.width == 0 || self.height == 0 {
            return Err(GenerateError::ResourceUnavailable);
        }
        Ok(())
    }
}

/// Turns text into a coverage mask the size of the request
pub trait GlyphRasterizer {
    fn rasterize(&self, text: &str, request: &TextRequest) -> Result<AlphaMask, GenerateError>;
}

/// Font-backed rasterizer with one face per (style, script)
#[derive(Clone, Default)]
pub struct FontRasterizer {
    faces: HashMap<(FontStyle, Script), FontArc>,
    fallback: Option<FontArc>,
}

impl std::fmt::Debug for FontRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRasterizer")
            .field("faces", &self.faces.keys().collect::<Vec<_>>())
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}

impl FontRasterizer {
    /// Rasterizer with no faces; every render fails with `NoFont` until one is registered
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rasterizer preloaded with the bundled faces
    #[cfg(feature = "default-fonts")]
    pub fn with_default_fonts() -> Self {
        let mut rasterizer = Self::empty();
        let bundled: [(FontStyle, &'static [u8]); 3] = [
            (FontStyle::Hand, epaint_default_fonts::UBUNTU_LIGHT),
            (FontStyle::Pen, epaint_default_fonts::HACK_REGULAR),
            (FontStyle::Brush, epaint_default_fonts::UBUNTU_LIGHT),
        ];
        for (style, data) in bundled {
            match FontArc::try_from_slice(data) {
                Ok(font) => {
                    rasterizer.fallback.get_or_insert_with(|| font.clone());
                    rasterizer.faces.insert((style, Script::Latin), font);
                }
                Err(e) => warn!("bundled font for {:?} failed to load: {}", style, e),
            }
        }
        rasterizer
    }

    /// Register a face from font file bytes (TTF/OTF)
    pub fn register(
        &mut self,
        style: FontStyle,
        script: Script,
        data: Vec<u8>,
    ) -> Result<(), GenerateError> {
        let font = FontArc::try_from_vec(data).map_err(|_| GenerateError::InvalidFont)?;
        self.fallback.get_or_insert_with(|| font.clone());
        self.faces.insert((style, script), font);
        debug!("FontRasterizer: registered {:?}/{:?}", style, script);
        Ok(())
    }

    /// Face for a style and script, falling back to the other script, then to
    /// the first loaded face
    pub fn face(&self, style: FontStyle, script: Script) -> Option<&FontArc> {
        self.faces
            .get(&(style, script))
            .or_else(|| self.faces.get(&(style, script.other())))
            .or(self.fallback.as_ref())
    }

    /// First face with a real glyph for `ch`: the face for `style` and
    /// `script`, then every registered face in style order
    fn resolve(&self, ch: char, style: FontStyle, script: Script) -> Option<(&FontArc, GlyphId)> {
        let registered = [FontStyle::Hand, FontStyle::Pen, FontStyle::Brush]
            .into_iter()
            .flat_map(|s| [(s, script), (s, script.other())])
            .filter_map(|key| self.faces.get(&key));
        self.face(style, script)
            .into_iter()
            .chain(registered)
            .find_map(|font| {
                let id = font.glyph_id(ch);
                (id != GlyphId(0)).then_some((font, id))
            })
    }

    /// Place one line's glyphs left to right from x = 0.
    ///
    /// Characters no face covers are counted in `missing` and take no space.
    fn layout_line<'a>(
        &'a self,
        line: &str,
        primary: &'a FontArc,
        request: &TextRequest,
        script: Script,
    ) -> LineLayout<'a> {
        let scale = PxScale::from(request.font_px);
        let mut glyphs = Vec::new();
        let mut missing = 0;
        let mut pen = 0.0f32;
        let mut prev: Option<(&FontArc, GlyphId)> = None;

        for ch in line.chars() {
            let resolved = if ch.is_whitespace() {
                Some((primary, primary.glyph_id(ch)))
            } else {
                self.resolve(ch, request.style, script)
            };
            let Some((font, id)) = resolved else {
                missing += 1;
                continue;
            };
            let scaled = font.as_scaled(scale);
            // Kerning only applies between glyphs of the same face
            let same_face = prev.filter(|(prev_font, _)| std::ptr::eq(*prev_font, font));
            if let Some((_, prev_id)) = same_face {
                pen += scaled.kern(prev_id, id);
            }
            glyphs.push(PlacedGlyph { font, id, x: pen });
            pen += scaled.h_advance(id) + request.letter_spacing_px;
            prev = Some((font, id));
        }

        let width = if glyphs.is_empty() {
            0.0
        } else {
            pen - request.letter_spacing_px
        };
        LineLayout {
            glyphs,
            width,
            missing,
        }
    }
}

struct PlacedGlyph<'a> {
    font: &'a FontArc,
    id: GlyphId,
    x: f32,
}

struct LineLayout<'a> {
    glyphs: Vec<PlacedGlyph<'a>>,
    width: f32,
    missing: usize,
}

impl GlyphRasterizer for FontRasterizer {
    /// Characters missing from every loaded face are skipped with a warning;
    /// text made only of such characters fails with `NoFont`.
    fn rasterize(&self, text: &str, request: &TextRequest) -> Result<AlphaMask, GenerateError> {
        request.validate(text)?;
        let script = Script::detect(text);
        let primary = self
            .face(request.style, script)
            .ok_or(GenerateError::NoFont)?;

        let scale = PxScale::from(request.font_px);
        let scaled = primary.as_scaled(scale);
        let lines: Vec<&str> = text.lines().collect();
        let baselines = request.baselines(lines.len(), scaled.ascent(), -scaled.descent());
        let shear = request.shear();
        let mut mask = AlphaMask::new(request.width, request.height);
        let mut missing = 0;
        let mut drawn = 0;

        for (line, baseline) in lines.iter().zip(baselines) {
            let layout = self.layout_line(line, primary, request, script);
            missing += layout.missing;
            // Center the line horizontally
            let left = (request.width as f32 - layout.width) / 2.0;
            for placed in &layout.glyphs {
                let glyph = placed
                    .id
                    .with_scale_and_position(scale, point(left + placed.x, baseline));
                if let Some(outlined) = placed.font.outline_glyph(glyph) {
                    let bounds = outlined.px_bounds();
                    outlined.draw(|px, py, coverage| {
                        let y = bounds.min.y + py as f32;
                        let sx = bounds.min.x + px as f32 + (baseline - y) * shear;
                        mask.raise(sx.round() as i64, y as i64, coverage);
                    });
                    drawn += 1;
                }
            }
        }

        if missing > 0 {
            warn!(
                "FontRasterizer: {} characters have no glyph in any loaded face, skipped",
                missing
            );
            if drawn == 0 {
                return Err(GenerateError::NoFont);
            }
        }

        let radius = request.outline_radius();
        if radius > 0 {
            mask = mask.dilated(radius);
        }
        debug!(
            "FontRasterizer: {} lines at {:.0}px, slant {:.1}, outline {}",
            lines.len(),
            request.font_px,
            request.slant_degrees,
            radius
        );
        Ok(mask)
    }
}

/// Deterministic rasterizer drawing one solid block per visible character.
///
/// Uses the same layout rules as the font rasterizer (centering, letter
/// spacing, line height, slant, bold outline) without needing font data.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockRasterizer;

impl BlockRasterizer {
    const ADVANCE: f32 = 0.6;
    const ASCENT: f32 = 0.8;
    const DESCENT: f32 = 0.2;
    const BLOCK_WIDTH: f32 = 0.5;
    const BLOCK_HEIGHT: f32 = 0.7;
}

impl GlyphRasterizer for BlockRasterizer {
    fn rasterize(&self, text: &str, request: &TextRequest) -> Result<AlphaMask, GenerateError> {
        request.validate(text)?;
        let em = request.font_px;
        let lines: Vec<&str> = text.lines().collect();
        let baselines = request.baselines(lines.len(), Self::ASCENT * em, Self::DESCENT * em);
        let shear = request.shear();
        let advance = Self::ADVANCE * em + request.letter_spacing_px;
        let mut mask = AlphaMask::new(request.width, request.height);

        for (line, baseline) in lines.iter().zip(baselines) {
            let count = line.chars().count() as f32;
            let width = (count * advance - request.letter_spacing_px).max(0.0);
            let left = (request.width as f32 - width) / 2.0;
            for (i, ch) in line.chars().enumerate() {
                if ch.is_whitespace() {
                    continue;
                }
                let x0 = left + i as f32 * advance;
                let top = (baseline - Self::BLOCK_HEIGHT * em).round() as i64;
                for y in top..baseline.round() as i64 {
                    let offset = (baseline - y as f32) * shear;
                    mask.fill_row(y, x0 + offset, x0 + Self::BLOCK_WIDTH * em + offset);
                }
            }
        }

        let radius = request.outline_radius();
        if radius > 0 {
            mask = mask.dilated(radius);
        }
        Ok(mask)
    }
}
