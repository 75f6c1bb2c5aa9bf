//! Pointer input event types.
//!
//! Positions are container-relative CSS pixels, before the view transform and
//! device pixel ratio are applied.

use serde::{Deserialize, Serialize};

/// Kind of device producing a pointer contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    Mouse,
    Touch,
    Stylus,
}

/// Phase of a pointer contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// One physical report of a pointer: position, pressure and time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
    /// Reported pressure 0.0-1.0, `None` when the device does not report one
    #[serde(default)]
    pub pressure: Option<f32>,
    /// Monotonic timestamp in milliseconds
    pub timestamp: f64,
}

/// A pointer event as delivered by the UI layer.
///
/// High report-rate devices may deliver several physical samples per event;
/// they are carried in `coalesced`, oldest first, and include the primary one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub pointer_id: u32,
    pub phase: PointerPhase,
    pub kind: ContactKind,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub pressure: Option<f32>,
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coalesced: Vec<PointerSample>,
}

impl PointerEvent {
    /// Create a single-sample event
    pub fn new(
        pointer_id: u32,
        phase: PointerPhase,
        kind: ContactKind,
        x: f32,
        y: f32,
        timestamp: f64,
    ) -> Self {
        Self {
            pointer_id,
            phase,
            kind,
            x,
            y,
            pressure: None,
            timestamp,
            coalesced: Vec::new(),
        }
    }

    /// Builder-style pressure setter
    pub fn with_pressure(mut self, pressure: f32) -> Self {
        self.pressure = Some(pressure);
        self
    }

    /// Builder-style coalesced samples setter
    pub fn with_coalesced(mut self, samples: Vec<PointerSample>) -> Self {
        self.coalesced = samples;
        self
    }

    /// The primary sample of this event
    pub fn primary(&self) -> PointerSample {
        PointerSample {
            x: self.x,
            y: self.y,
            pressure: self.pressure,
            timestamp: self.timestamp,
        }
    }

    /// All physical samples in delivery order.
    ///
    /// Falls back to the primary sample when no coalesced batch was delivered.
    pub fn samples(&self) -> Vec<PointerSample> {
        if self.coalesced.is_empty() {
            vec![self.primary()]
        } else {
            self.coalesced.clone()
        }
    }
}
