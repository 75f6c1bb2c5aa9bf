//! Vector path log: an ordered record of stamped ellipses for lossless export.

use std::fmt::Write as _;

use calligraph_config::InkColor;
use serde::{Deserialize, Serialize};

use crate::types::StampPrimitive;

/// One logged ellipse, in surface pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    pub cx: f32,
    pub cy: f32,
    pub rx: f32,
    pub ry: f32,
    /// Rotation in degrees
    pub rotation: f32,
    pub fill: InkColor,
    pub opacity: f32,
}

impl VectorEntry {
    pub fn from_stamp(stamp: &StampPrimitive) -> Self {
        Self {
            cx: stamp.center.x,
            cy: stamp.center.y,
            rx: stamp.radius_x,
            ry: stamp.radius_y,
            rotation: stamp.rotation.to_degrees(),
            fill: stamp.color,
            opacity: stamp.opacity.clamp(0.0, 1.0),
        }
    }

    /// Append this entry as an `<ellipse>` element, scaling geometry by `scale`
    pub fn write_svg(&self, out: &mut String, scale: f32) {
        let cx = self.cx * scale;
        let cy = self.cy * scale;
        // Writing to a String cannot fail
        let _ = write!(
            out,
            r#"<ellipse cx="{cx:.1}" cy="{cy:.1}" rx="{:.1}" ry="{:.1}" transform="rotate({:.1} {cx:.1} {cy:.1})" fill="{}" fill-opacity="{:.2}"/>"#,
            self.rx * scale,
            self.ry * scale,
            self.rotation,
            self.fill,
            self.opacity,
        );
    }
}

/// Append-only ordered sequence of vector entries.
///
/// Entries are never reordered; undo replaces the whole log with the
/// restored step's copy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorLog {
    entries: Vec<VectorEntry>,
}

impl VectorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: VectorEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[VectorEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop every entry after the first `len`
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    /// Replace the contents with a copy of another log
    pub fn replace_with(&mut self, other: &VectorLog) {
        self.entries.clone_from(&other.entries);
    }

    /// Append every entry as SVG elements, one per line
    pub fn write_svg(&self, out: &mut String, scale: f32) {
        for entry in &self.entries {
            entry.write_svg(out, scale);
            out.push('\n');
        }
    }
}
