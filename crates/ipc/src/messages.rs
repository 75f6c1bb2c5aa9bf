//! Main IPC message enums for communication between the UI layer and the canvas core.

use calligraph_config::{BrushConfiguration, DisplayConfig};
use serde::{Deserialize, Serialize};

use crate::commands::{CanvasMode, ExportKind, ViewRequest};
use crate::input::PointerEvent;

/// Messages from the UI layer to the canvas core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum UiToCanvas {
    /// Container laid out or resized
    BeginViewport(DisplayConfig),

    /// Switch between drawing and text generation
    SetMode { mode: CanvasMode },

    /// Replace the active brush configuration
    SetBrush(BrushConfiguration),

    /// Generate text as brush particles
    RenderText { text: String },

    /// Clear drawing and generated text
    Clear,

    /// Undo the last drawing step
    Undo,

    /// Redo the last undone drawing step
    Redo,

    /// Export the canvas
    Export { kind: ExportKind },

    /// Show or hide the writing guides
    SetShowGuides { enabled: bool },

    /// Set the view transform
    SetViewState(ViewRequest),

    /// Pointer input
    Pointer(PointerEvent),

    /// Display refresh tick
    Frame { timestamp: f64 },
}

/// Messages from the canvas core to the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CanvasToUi {
    /// Undo/redo availability changed
    HistoryChanged { can_undo: bool, can_redo: bool },

    /// View transform changed by a gesture or command
    ViewChanged { scale: f32, offset: [f32; 2] },

    /// Text particles still waiting to be stamped
    GenerationProgress { remaining: usize },

    /// Text particle animation finished
    GenerationComplete,

    /// Export produced a file to download
    ExportReady {
        filename: String,
        mime_type: String,
        bytes: Vec<u8>,
    },

    /// Export failed; canvas state is unchanged
    ExportFailed { message: String },

    /// Non-fatal error notification
    Error { message: String },
}
