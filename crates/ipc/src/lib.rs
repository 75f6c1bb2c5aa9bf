//! IPC message protocol for Calligraph
//!
//! Defines all message types exchanged between the UI layer and the canvas core.

mod commands;
mod error;
mod input;
mod messages;

pub use commands::{CanvasMode, ExportKind, ViewRequest};
pub use error::IpcError;
pub use input::{ContactKind, PointerEvent, PointerPhase, PointerSample};
pub use messages::{CanvasToUi, UiToCanvas};

/// Parse a UI message from JSON.
pub fn parse_ui_message(json: &str) -> Result<UiToCanvas, IpcError> {
    let trimmed = json.trim();
    if trimmed.is_empty() {
        return Err(IpcError::InvalidFormat("empty message".to_string()));
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// Serialize a canvas notice to JSON.
pub fn encode_canvas_message(message: &CanvasToUi) -> Result<String, IpcError> {
    Ok(serde_json::to_string(message)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pointer_message() {
        let json = concat!(
            r#"{"type":"Pointer","data":{"pointer_id":1,"phase":"down","#,
            r#""kind":"mouse","x":10.0,"y":20.0,"timestamp":5.0}}"#
        );
        match parse_ui_message(json).unwrap() {
            UiToCanvas::Pointer(event) => {
                assert_eq!(event.pointer_id, 1);
                assert_eq!(event.phase, PointerPhase::Down);
                assert_eq!(event.kind, ContactKind::Mouse);
                assert_eq!(event.pressure, None);
                assert!(event.coalesced.is_empty());
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_parse_unit_and_struct_variants() {
        assert!(matches!(
            parse_ui_message(r#"{"type":"Undo"}"#).unwrap(),
            UiToCanvas::Undo
        ));
        assert!(matches!(
            parse_ui_message(r#"{"type":"SetMode","data":{"mode":"GENERATE"}}"#).unwrap(),
            UiToCanvas::SetMode {
                mode: CanvasMode::Generate
            }
        ));
        assert!(matches!(
            parse_ui_message(r#"{"type":"Export","data":{"kind":"svg"}}"#).unwrap(),
            UiToCanvas::Export {
                kind: ExportKind::Svg
            }
        ));
    }

    #[test]
    fn test_parse_brush_message_fills_defaults() {
        let json = r#"{"type":"SetBrush","data":{"size":3,"fontStyle":"PEN"}}"#;
        match parse_ui_message(json).unwrap() {
            UiToCanvas::SetBrush(config) => {
                assert_eq!(config.size, 3.0);
                assert_eq!(config.font_style, calligraph_config::FontStyle::Pen);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_empty_message_is_invalid() {
        assert!(matches!(
            parse_ui_message("   "),
            Err(IpcError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_ui_message("{"),
            Err(IpcError::Serialize(_))
        ));
    }

    #[test]
    fn test_encode_notice() {
        let json = encode_canvas_message(&CanvasToUi::HistoryChanged {
            can_undo: true,
            can_redo: false,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"type":"HistoryChanged","data":{"can_undo":true,"can_redo":false}}"#
        );
    }

    #[test]
    fn test_coalesced_samples_fall_back_to_primary() {
        let event = PointerEvent::new(3, PointerPhase::Move, ContactKind::Stylus, 1.0, 2.0, 9.0)
            .with_pressure(0.7);
        let samples = event.samples();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].pressure, Some(0.7));

        let batch = vec![
            PointerSample {
                x: 0.5,
                y: 1.0,
                pressure: Some(0.6),
                timestamp: 8.0,
            },
            PointerSample {
                x: 1.0,
                y: 2.0,
                pressure: Some(0.7),
                timestamp: 9.0,
            },
        ];
        let event = event.with_coalesced(batch.clone());
        assert_eq!(event.samples(), batch);
    }
}
