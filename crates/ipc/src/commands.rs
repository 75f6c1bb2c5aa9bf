//! Canvas command types.

use serde::{Deserialize, Serialize};

/// Interaction mode of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CanvasMode {
    /// Single-pointer contacts draw strokes
    #[default]
    Draw,
    /// Text is generated as brush particles; contacts only pan/zoom
    Generate,
}

/// View transform requested by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewRequest {
    pub scale: f32,
    pub offset: [f32; 2],
}

/// Kind of export file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Png,
    Svg,
}

impl ExportKind {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }
}
