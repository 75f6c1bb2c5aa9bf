//! Command scripts: one `UiToCanvas` JSON message per line, replayed
//! against a canvas with simulated display frames.

use std::path::{Path, PathBuf};

use calligraph_config::{BrushConfiguration, DisplayConfig, FontStyle, WeightOption};
use calligraph_ipc::{
    CanvasMode, CanvasToUi, ContactKind, ExportKind, IpcError, PointerEvent, PointerPhase,
    PointerSample, UiToCanvas, encode_canvas_message, parse_ui_message,
};
use calligraphy::CalligraphyCanvas;
use tracing::{debug, info, warn};

/// Simulated display refresh interval in milliseconds
const FRAME_MS: f64 = 1000.0 / 60.0;

/// Frames allowed for a text animation to settle before an export
const MAX_SETTLE_FRAMES: usize = 10_000;

/// Errors while loading or replaying a script
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Failed to read script {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Script line {line}: {source}")]
    Parse { line: usize, source: IpcError },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Parse a script: blank lines and lines starting with `#` are skipped
pub fn parse_script(text: &str) -> Result<Vec<UiToCanvas>, ScriptError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(i, line)| {
            parse_ui_message(line).map_err(|source| ScriptError::Parse {
                line: i + 1,
                source,
            })
        })
        .collect()
}

pub fn load_script(path: &Path) -> Result<Vec<UiToCanvas>, ScriptError> {
    let text = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_script(&text)
}

/// Summary of a replay
#[derive(Debug, Default)]
pub struct ReplayReport {
    pub messages: usize,
    pub frames: usize,
    pub exports: Vec<PathBuf>,
    pub failures: Vec<String>,
}

/// Drives a canvas from a message list the way a UI event loop would
pub struct Replay<'a> {
    canvas: &'a mut CalligraphyCanvas,
    out_dir: PathBuf,
    clock: f64,
    report: ReplayReport,
}

impl<'a> Replay<'a> {
    pub fn new(canvas: &'a mut CalligraphyCanvas, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            canvas,
            out_dir: out_dir.into(),
            clock: 0.0,
            report: ReplayReport::default(),
        }
    }

    /// Apply every message in order, then let any text animation finish.
    ///
    /// Pending text animation is run to completion before each export so
    /// the exported file shows the whole render.
    pub fn run(
        mut self,
        messages: impl IntoIterator<Item = UiToCanvas>,
    ) -> Result<ReplayReport, ScriptError> {
        for message in messages {
            if matches!(message, UiToCanvas::Export { .. }) {
                self.settle();
            }
            if let UiToCanvas::Frame { timestamp } = message {
                self.clock = self.clock.max(timestamp);
                self.report.frames += 1;
            }
            self.report.messages += 1;
            let notices = self.canvas.apply(message);
            self.handle_notices(notices)?;
        }
        self.settle();
        let notices = self.canvas.drain_notices();
        self.handle_notices(notices)?;
        Ok(self.report)
    }

    fn settle(&mut self) {
        let mut frames = 0;
        while self.canvas.is_generating() && frames < MAX_SETTLE_FRAMES {
            self.clock += FRAME_MS;
            self.canvas.tick(self.clock);
            frames += 1;
        }
        if frames > 0 {
            debug!("Settled text animation in {} frames", frames);
            self.report.frames += frames;
        }
    }

    fn handle_notices(&mut self, notices: Vec<CanvasToUi>) -> Result<(), ScriptError> {
        for notice in notices {
            match notice {
                CanvasToUi::ExportReady {
                    filename, bytes, ..
                } => {
                    let path = self.out_dir.join(filename);
                    std::fs::write(&path, &bytes).map_err(|source| ScriptError::Write {
                        path: path.clone(),
                        source,
                    })?;
                    info!("Wrote {} ({} bytes)", path.display(), bytes.len());
                    self.report.exports.push(path);
                }
                CanvasToUi::ExportFailed { message } | CanvasToUi::Error { message } => {
                    warn!("Canvas reported: {}", message);
                    self.report.failures.push(message);
                }
                other => match encode_canvas_message(&other) {
                    Ok(json) => debug!("notice {}", json),
                    Err(e) => warn!("Failed to encode notice: {}", e),
                },
            }
        }
        Ok(())
    }
}

/// Built-in script: a few brush strokes, generated text, then both exports
pub fn demo_script() -> Vec<UiToCanvas> {
    let mut script = vec![
        UiToCanvas::BeginViewport(DisplayConfig::with_scale(640, 400, 2.0)),
        UiToCanvas::SetShowGuides { enabled: true },
        UiToCanvas::SetBrush(BrushConfiguration {
            size: 14.0,
            font_size: 72.0,
            font_style: FontStyle::Brush,
            weight_option: WeightOption::Normal,
            ..Default::default()
        }),
    ];

    // A gently curving stroke with coalesced stylus samples
    let mut t = 0.0;
    script.push(UiToCanvas::Pointer(
        PointerEvent::new(1, PointerPhase::Down, ContactKind::Stylus, 60.0, 320.0, t)
            .with_pressure(0.4),
    ));
    for step in 0..40 {
        let batch: Vec<PointerSample> = (1..=3)
            .map(|k| {
                let i = (step * 3 + k) as f32;
                t += 4.0;
                PointerSample {
                    x: 60.0 + i * 4.2,
                    y: 320.0 - (i * 0.05).sin() * 40.0,
                    pressure: Some(0.3 + 0.6 * (i / 120.0)),
                    timestamp: t,
                }
            })
            .collect();
        let Some(last) = batch.last().copied() else {
            continue;
        };
        script.push(UiToCanvas::Pointer(
            PointerEvent::new(1, PointerPhase::Move, ContactKind::Stylus, last.x, last.y, t)
                .with_pressure(last.pressure.unwrap_or(0.5))
                .with_coalesced(batch),
        ));
    }
    script.push(UiToCanvas::Pointer(PointerEvent::new(
        1,
        PointerPhase::Up,
        ContactKind::Stylus,
        564.0,
        320.0 - 6.0_f32.sin() * 40.0,
        t + 4.0,
    )));

    // A quick mouse flick, textured by its speed
    for (phase, x, y, dt) in [
        (PointerPhase::Down, 80.0, 360.0, 100.0),
        (PointerPhase::Move, 560.0, 370.0, 180.0),
        (PointerPhase::Up, 560.0, 370.0, 190.0),
    ] {
        script.push(UiToCanvas::Pointer(PointerEvent::new(
            2,
            phase,
            ContactKind::Mouse,
            x,
            y,
            t + dt,
        )));
    }

    script.extend([
        UiToCanvas::SetMode {
            mode: CanvasMode::Generate,
        },
        UiToCanvas::RenderText {
            text: "Calligraph\nink & brush".to_string(),
        },
        UiToCanvas::Export {
            kind: ExportKind::Png,
        },
        UiToCanvas::Export {
            kind: ExportKind::Svg,
        },
    ]);
    script
}
