//! Brush configuration supplied by the UI layer.
//!
//! The core never persists or mutates a [`BrushConfiguration`]; it receives a
//! fresh snapshot on every draw or generate action.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// An opaque sRGB ink color, serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InkColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl InkColor {
    pub const BLACK: InkColor = InkColor::new(0x1a, 0x1a, 0x1a);
    pub const PAPER: InkColor = InkColor::new(0xfd, 0xfb, 0xf7);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb` or `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, ConfigError> {
        let digits = hex.trim().trim_start_matches('#');
        let parse = |s: &str| {
            u8::from_str_radix(s, 16).map_err(|_| ConfigError::InvalidColor(hex.to_string()))
        };
        match digits.len() {
            6 => Ok(Self::new(
                parse(&digits[0..2])?,
                parse(&digits[2..4])?,
                parse(&digits[4..6])?,
            )),
            3 => {
                let expand = |i: usize| parse(&digits[i..i + 1]).map(|v| v * 17);
                Ok(Self::new(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => Err(ConfigError::InvalidColor(hex.to_string())),
        }
    }

    /// Straight-alpha RGBA in 0.0-1.0 with full alpha
    pub fn to_rgba(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            1.0,
        ]
    }
}

impl Default for InkColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for InkColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for InkColor {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<InkColor> for String {
    fn from(color: InkColor) -> Self {
        color.to_string()
    }
}

/// Glyph-shaping style used by the text generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FontStyle {
    /// Cursive handwriting; letter spacing is suppressed so joins stay connected
    #[default]
    Hand,
    /// Even, pen-like strokes
    Pen,
    /// Broad brush with bristle flare and dry-ink dropout
    Brush,
}

/// Stroke weight used by the text generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WeightOption {
    Thin,
    #[default]
    Normal,
    Bold,
}

/// Complete brush configuration snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrushConfiguration {
    /// Nominal brush diameter in surface pixels; <= 1.0 selects hairline mode
    pub size: f32,
    /// Dry-brush intensity 0.0-1.0
    pub roughness: f32,
    /// How strongly pressure drives stamp size, 0.0-1.0
    pub taper: f32,
    pub color: InkColor,
    /// Minor/major axis ratio of the stamp ellipse, 0.05-1.0
    pub roundness: f32,
    /// Stamp rotation in degrees
    pub angle: f32,
    /// Edge hardness 0.0-1.0
    pub hardness: f32,
    /// Extra spacing between stamps as a fraction of stamp size
    pub spacing: f32,
    /// Letter spacing for generated text, CSS pixels
    pub letter_spacing: f32,
    /// Line height multiplier for generated text
    pub line_height: f32,
    /// Slant of generated text in degrees (applied as a horizontal shear)
    pub slant: f32,
    /// Font size of generated text, CSS pixels
    pub font_size: f32,
    pub font_style: FontStyle,
    pub weight_option: WeightOption,
    pub is_eraser: bool,
}

impl Default for BrushConfiguration {
    fn default() -> Self {
        Self {
            size: 12.0,
            roughness: 0.3,
            taper: 0.6,
            color: InkColor::BLACK,
            roundness: 0.8,
            angle: 45.0,
            hardness: 0.85,
            spacing: 0.05,
            letter_spacing: 0.0,
            line_height: 1.4,
            slant: 0.0,
            font_size: 96.0,
            font_style: FontStyle::Hand,
            weight_option: WeightOption::Normal,
            is_eraser: false,
        }
    }
}

fn check(
    field: &'static str,
    value: f32,
    range: std::ops::RangeInclusive<f32>,
    expected: &'static str,
) -> Result<(), ConfigError> {
    if value.is_finite() && range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            expected,
        })
    }
}

impl BrushConfiguration {
    /// Validate that parameters are in acceptable ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        check("size", self.size, 0.1..=500.0, "0.1..=500")?;
        check("roughness", self.roughness, 0.0..=1.0, "0..=1")?;
        check("taper", self.taper, 0.0..=1.0, "0..=1")?;
        check("roundness", self.roundness, 0.05..=1.0, "0.05..=1")?;
        check("angle", self.angle, -360.0..=360.0, "-360..=360")?;
        check("hardness", self.hardness, 0.0..=1.0, "0..=1")?;
        check("spacing", self.spacing, 0.0..=5.0, "0..=5")?;
        check("letterSpacing", self.letter_spacing, -50.0..=200.0, "-50..=200")?;
        check("lineHeight", self.line_height, 0.5..=5.0, "0.5..=5")?;
        check("slant", self.slant, -60.0..=60.0, "-60..=60")?;
        check("fontSize", self.font_size, 4.0..=1000.0, "4..=1000")?;
        Ok(())
    }

    /// Copy with every numeric field forced into its valid range.
    ///
    /// Non-finite values are replaced with the default for that field.
    pub fn clamped(&self) -> Self {
        let defaults = Self::default();
        let fix = |value: f32, fallback: f32, lo: f32, hi: f32| {
            if value.is_finite() {
                value.clamp(lo, hi)
            } else {
                fallback
            }
        };
        Self {
            size: fix(self.size, defaults.size, 0.1, 500.0),
            roughness: fix(self.roughness, defaults.roughness, 0.0, 1.0),
            taper: fix(self.taper, defaults.taper, 0.0, 1.0),
            color: self.color,
            roundness: fix(self.roundness, defaults.roundness, 0.05, 1.0),
            angle: fix(self.angle, defaults.angle, -360.0, 360.0),
            hardness: fix(self.hardness, defaults.hardness, 0.0, 1.0),
            spacing: fix(self.spacing, defaults.spacing, 0.0, 5.0),
            letter_spacing: fix(self.letter_spacing, defaults.letter_spacing, -50.0, 200.0),
            line_height: fix(self.line_height, defaults.line_height, 0.5, 5.0),
            slant: fix(self.slant, defaults.slant, -60.0, 60.0),
            font_size: fix(self.font_size, defaults.font_size, 4.0, 1000.0),
            font_style: self.font_style,
            weight_option: self.weight_option,
            is_eraser: self.is_eraser,
        }
    }

    /// Stamp rotation in radians
    pub fn angle_radians(&self) -> f32 {
        self.angle.to_radians()
    }

    /// Parse a configuration from JSON, filling missing fields with defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}
