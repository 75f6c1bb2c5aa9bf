//! Error types for the calligraphy core

use thiserror::Error;

/// Errors from text generation
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no font available for text generation")]
    NoFont,
    #[error("font data could not be parsed")]
    InvalidFont,
    #[error("text is empty")]
    EmptyText,
    #[error("text surface is not allocated")]
    ResourceUnavailable,
}

/// Errors from raster or vector export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("export surface is not allocated")]
    ResourceUnavailable,
    #[error("export surface has zero size")]
    EmptySurface,
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Errors surfaced by the canvas facade
#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("canvas surfaces are not allocated")]
    ResourceUnavailable,
    #[error("text generation failed: {0}")]
    Generate(#[from] GenerateError),
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}
