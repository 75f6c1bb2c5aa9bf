//! Calligraph rendering core - brush physics, layered surfaces and text particles
//!
//! This crate provides everything behind the drawing surface:
//! - [`sampler`] - pointer reports to surface-space samples
//! - [`physics`] - velocity, synthetic pressure and stamp size
//! - [`stamp`] - ellipse rasterization and the raster + vector ink layer
//! - [`stroke`] - stroke sessions with dry-brush, splatter and eraser
//! - [`layers`] - guide, text and drawing layers with resize handling
//! - [`history`] - bounded undo/redo over the drawing layer
//! - [`gesture`] - drawing versus pinch/pan arbitration
//! - [`scheduler`] - cancellable per-frame tasks
//! - [`text`] - glyph rasterization and the particle reveal
//! - [`export`] - PNG and SVG encoding
//! - [`canvas`] - the [`CalligraphyCanvas`] facade tying it together

pub mod canvas;
pub mod constants;
pub mod error;
pub mod export;
pub mod gesture;
pub mod history;
pub mod layers;
pub mod physics;
pub mod sampler;
pub mod scheduler;
pub mod stamp;
pub mod stroke;
pub mod surface;
pub mod text;
pub mod types;
pub mod vector;

pub use canvas::*;
pub use constants::*;
pub use error::*;
pub use export::*;
pub use gesture::*;
pub use history::*;
pub use layers::*;
pub use physics::*;
pub use sampler::*;
pub use scheduler::*;
pub use stamp::*;
pub use stroke::*;
pub use surface::*;
pub use text::*;
pub use types::*;
pub use vector::*;
