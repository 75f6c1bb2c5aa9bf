//! The calligraphy canvas facade: owns every layer, the history and the
//! input state, and exposes the commands the UI layer calls.

use calligraph_config::{BrushConfiguration, DisplayConfig, EngineTuning};
use calligraph_ipc::{CanvasMode, CanvasToUi, ExportKind, PointerEvent, UiToCanvas};
use glam::Vec2;
use tracing::{debug, info, warn};

use crate::error::CanvasError;
use crate::export::{self, ExportFile};
use crate::gesture::{GestureAction, GestureController, ViewState};
use crate::history::HistoryManager;
use crate::layers::LayerStack;
use crate::sampler::PointSampler;
use crate::scheduler::TickReport;
use crate::stroke::{StrokeEngine, StrokeSession};
use crate::surface::CpuSurface;
use crate::text::{GlyphRasterizer, TextParticleGenerator, default_rasterizer};

/// Interactive calligraphy canvas.
///
/// Single-threaded: input events and frame ticks are delivered in order by
/// the host. Notices for the UI accumulate and are drained with
/// [`CalligraphyCanvas::drain_notices`] (or returned from [`CalligraphyCanvas::apply`]).
pub struct CalligraphyCanvas {
    tuning: EngineTuning,
    brush: BrushConfiguration,
    mode: CanvasMode,
    layers: LayerStack,
    history: HistoryManager,
    gestures: GestureController,
    sampler: PointSampler,
    strokes: StrokeEngine,
    session: Option<StrokeSession>,
    generator: TextParticleGenerator,
    last_text: Option<String>,
    outbound: Vec<CanvasToUi>,
}

impl std::fmt::Debug for CalligraphyCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalligraphyCanvas")
            .field("mode", &self.mode)
            .field("layers", &(self.layers.width(), self.layers.height()))
            .field("history_index", &self.history.index())
            .field("gesture", &self.gestures.state())
            .field("drawing", &self.session.is_some())
            .field("generator", &self.generator)
            .finish()
    }
}

impl CalligraphyCanvas {
    pub fn new(tuning: EngineTuning) -> Self {
        let strokes = StrokeEngine::new(&tuning);
        let generator = TextParticleGenerator::new(Box::new(default_rasterizer()), &tuning);
        Self::assemble(tuning, strokes, generator)
    }

    /// Deterministic canvas: stroke texture and particle order come from `seed`
    pub fn with_seed(tuning: EngineTuning, seed: u64) -> Self {
        let strokes = StrokeEngine::with_seed(&tuning, seed);
        let generator = TextParticleGenerator::with_seed(
            Box::new(default_rasterizer()),
            &tuning,
            seed.wrapping_add(1),
        );
        Self::assemble(tuning, strokes, generator)
    }

    fn assemble(
        tuning: EngineTuning,
        strokes: StrokeEngine,
        generator: TextParticleGenerator,
    ) -> Self {
        Self {
            history: HistoryManager::new(tuning.history_capacity),
            tuning,
            brush: BrushConfiguration::default(),
            mode: CanvasMode::default(),
            layers: LayerStack::new(),
            gestures: GestureController::new(),
            sampler: PointSampler::default(),
            strokes,
            session: None,
            generator,
            last_text: None,
            outbound: Vec::new(),
        }
    }

    /// Use a different glyph rasterizer for text generation
    pub fn set_rasterizer(&mut self, rasterizer: Box<dyn GlyphRasterizer>) {
        self.generator.set_rasterizer(rasterizer);
    }

    // ---- Queries ----

    pub fn tuning(&self) -> &EngineTuning {
        &self.tuning
    }

    pub fn brush(&self) -> &BrushConfiguration {
        &self.brush
    }

    pub fn mode(&self) -> CanvasMode {
        self.mode
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn view(&self) -> ViewState {
        self.gestures.view()
    }

    pub fn is_drawing(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_generating(&self) -> bool {
        self.generator.is_animating()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Take every notice produced since the last drain
    pub fn drain_notices(&mut self) -> Vec<CanvasToUi> {
        std::mem::take(&mut self.outbound)
    }

    // ---- Commands ----

    /// Allocate (or resize) the layers for a container.
    ///
    /// Returns false while the container has no area; the canvas stays in its
    /// previous state. The first allocation records the blank undo floor.
    pub fn begin_viewport(&mut self, viewport: DisplayConfig) -> bool {
        let viewport = DisplayConfig::with_scale(viewport.width, viewport.height, viewport.scale);
        if viewport.is_empty() {
            warn!(
                "begin_viewport: container {}x{} has no area, surfaces not allocated",
                viewport.width, viewport.height
            );
            return false;
        }

        let first_allocation = !self.layers.is_allocated();
        let resized = self.layers.resize(viewport);
        self.sampler = PointSampler::new(viewport.scale);

        if first_allocation {
            self.history.reset(&self.layers.drawing);
            self.notify_history();
            info!(
                "Canvas allocated at {}x{} (ratio {:.2})",
                self.layers.width(),
                self.layers.height(),
                viewport.scale
            );
        }
        if resized {
            self.refresh_guides();
            if let Some(text) = self.last_text.clone() {
                self.start_text(&text);
            }
        }
        true
    }

    /// Switch between drawing and text generation; cancels any text animation
    pub fn set_mode(&mut self, mode: CanvasMode) {
        if self.generator.cancel() {
            debug!("set_mode: text animation cancelled");
        }
        if self.mode != mode {
            info!("Canvas mode {:?} -> {:?}", self.mode, mode);
        }
        self.mode = mode;
    }

    /// Replace the brush configuration; out-of-range values are clamped
    pub fn set_brush(&mut self, config: BrushConfiguration) {
        if let Err(e) = config.validate() {
            warn!("set_brush: {}, clamping", e);
        }
        let font_changed = config.font_size != self.brush.font_size;
        self.brush = config.clamped();
        if font_changed {
            self.refresh_guides();
        }
    }

    /// Generate `text` as brush particles on the text layer.
    ///
    /// Returns the number of queued particles; blank text clears the layer.
    pub fn render_text(&mut self, text: &str) -> Result<usize, CanvasError> {
        if !self.layers.is_allocated() {
            return Err(CanvasError::ResourceUnavailable);
        }
        self.last_text = Some(text.to_string()).filter(|t| !t.trim().is_empty());
        let ratio = self.layers.device_pixel_ratio();
        let count = self
            .generator
            .start(text, &self.brush, &mut self.layers.text, ratio)?;
        if count > 0 {
            self.outbound
                .push(CanvasToUi::GenerationProgress { remaining: count });
        } else {
            self.outbound.push(CanvasToUi::GenerationComplete);
        }
        Ok(count)
    }

    /// Clear generated text and drawing, recording the empty drawing as a step
    pub fn clear(&mut self) {
        self.generator.cancel();
        self.session = None;
        self.last_text = None;
        if !self.layers.is_allocated() {
            debug!("clear: surfaces not allocated");
            return;
        }
        self.layers.text.clear();
        self.layers.drawing.clear();
        self.history.save(&self.layers.drawing);
        self.notify_history();
        info!("Canvas cleared");
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.layers.is_allocated() && self.history.undo(&mut self.layers.drawing);
        if changed {
            self.notify_history();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.layers.is_allocated() && self.history.redo(&mut self.layers.drawing);
        if changed {
            self.notify_history();
        }
        changed
    }

    pub fn export_png(&self) -> Result<ExportFile, CanvasError> {
        self.export(ExportKind::Png)
    }

    pub fn export_svg(&self) -> Result<ExportFile, CanvasError> {
        self.export(ExportKind::Svg)
    }

    /// Encode an export; canvas state is never modified
    pub fn export(&self, kind: ExportKind) -> Result<ExportFile, CanvasError> {
        let file = export::export(
            &self.layers,
            kind,
            self.tuning.background,
            &self.tuning.app_name,
        )?;
        info!("Exported {} ({} bytes)", file.filename, file.bytes.len());
        Ok(file)
    }

    pub fn set_show_guides(&mut self, enabled: bool) {
        self.layers.set_show_guides(enabled);
        self.refresh_guides();
    }

    /// Set the view transform; the scale is clamped
    pub fn set_view_state(&mut self, scale: f32, offset: Vec2) -> ViewState {
        let view = ViewState::new(scale, offset);
        self.gestures.set_view(view);
        self.notify_view(view);
        view
    }

    // ---- Input and frames ----

    /// Route one pointer event through gesture arbitration and, when it
    /// belongs to the drawing contact, the stroke engine
    pub fn handle_pointer(&mut self, event: &PointerEvent) {
        let action = self.gestures.handle(event, self.mode);
        match action {
            GestureAction::None => {}
            GestureAction::BeginStroke => {
                if !self.layers.is_allocated() {
                    debug!("handle_pointer: stroke ignored, surfaces not allocated");
                    return;
                }
                let view = self.gestures.view();
                let mut samples = self.sampler.samples(event, &view).into_iter();
                if let Some(first) = samples.next() {
                    let ratio = self.sampler.device_pixel_ratio();
                    let mut session = self.strokes.begin(event.pointer_id, first, ratio);
                    for sample in samples {
                        self.strokes
                            .stroke_to(&mut session, sample, &self.brush, &mut self.layers.drawing);
                    }
                    self.session = Some(session);
                }
            }
            GestureAction::ContinueStroke => self.continue_stroke(event),
            GestureAction::EndStroke => {
                self.continue_stroke(event);
                if let Some(session) = self.session.take() {
                    self.history.save(&self.layers.drawing);
                    debug!(
                        "Stroke ended: pointer={} stamps={}",
                        session.pointer_id, session.stamps
                    );
                    self.notify_history();
                }
            }
            GestureAction::AbandonStroke => {
                if let Some(session) = self.session.take() {
                    self.history.restore_current(&mut self.layers.drawing);
                    info!(
                        "Stroke abandoned: pointer={} ({} stamps rolled back)",
                        session.pointer_id, session.stamps
                    );
                }
            }
            GestureAction::ViewChanged(view) => self.notify_view(view),
        }
    }

    fn continue_stroke(&mut self, event: &PointerEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.pointer_id != event.pointer_id {
            return;
        }
        let view = self.gestures.view();
        for sample in self.sampler.samples(event, &view) {
            self.strokes
                .stroke_to(session, sample, &self.brush, &mut self.layers.drawing);
        }
    }

    /// Advance the text animation by one batch
    pub fn tick(&mut self, timestamp: f64) -> TickReport {
        if !self.generator.is_animating() {
            return TickReport::default();
        }
        let report = self.generator.tick(&mut self.layers.text);
        if self.generator.is_animating() {
            self.outbound.push(CanvasToUi::GenerationProgress {
                remaining: self.generator.remaining(),
            });
        } else {
            debug!("tick {:.1}: text animation complete", timestamp);
            self.outbound.push(CanvasToUi::GenerationComplete);
        }
        report
    }

    /// Compose the display frame; None before the first allocation
    pub fn compose_frame(&mut self) -> Option<&CpuSurface> {
        if !self.layers.is_allocated() {
            return None;
        }
        Some(self.layers.compose_frame(self.tuning.background))
    }

    /// Apply one UI message and return the notices it produced
    pub fn apply(&mut self, message: UiToCanvas) -> Vec<CanvasToUi> {
        match message {
            UiToCanvas::BeginViewport(viewport) => {
                self.begin_viewport(viewport);
            }
            UiToCanvas::SetMode { mode } => self.set_mode(mode),
            UiToCanvas::SetBrush(config) => self.set_brush(config),
            UiToCanvas::RenderText { text } => {
                if let Err(e) = self.render_text(&text) {
                    warn!("render_text failed: {}", e);
                    self.outbound.push(CanvasToUi::Error {
                        message: e.to_string(),
                    });
                }
            }
            UiToCanvas::Clear => self.clear(),
            UiToCanvas::Undo => {
                self.undo();
            }
            UiToCanvas::Redo => {
                self.redo();
            }
            UiToCanvas::Export { kind } => match self.export(kind) {
                Ok(file) => self.outbound.push(CanvasToUi::ExportReady {
                    mime_type: file.mime_type().to_string(),
                    filename: file.filename,
                    bytes: file.bytes,
                }),
                Err(e) => {
                    warn!("Export {:?} failed: {}", kind, e);
                    self.outbound.push(CanvasToUi::ExportFailed {
                        message: e.to_string(),
                    });
                }
            },
            UiToCanvas::SetShowGuides { enabled } => self.set_show_guides(enabled),
            UiToCanvas::SetViewState(request) => {
                self.set_view_state(request.scale, Vec2::from(request.offset));
            }
            UiToCanvas::Pointer(event) => self.handle_pointer(&event),
            UiToCanvas::Frame { timestamp } => {
                self.tick(timestamp);
            }
        }
        self.drain_notices()
    }

    // ---- Internals ----

    fn start_text(&mut self, text: &str) {
        if let Err(e) = self.render_text(text) {
            warn!("Regenerating text failed: {}", e);
            self.outbound.push(CanvasToUi::Error {
                message: e.to_string(),
            });
        }
    }

    fn refresh_guides(&mut self) {
        self.layers
            .render_guides(self.brush.font_size, self.tuning.guide_period_factor);
    }

    fn notify_history(&mut self) {
        self.outbound.push(CanvasToUi::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    fn notify_view(&mut self, view: ViewState) {
        self.outbound.push(CanvasToUi::ViewChanged {
            scale: view.scale(),
            offset: view.offset.to_array(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{AlphaMask, BlockRasterizer, TextRequest};
    use calligraph_ipc::{ContactKind, PointerPhase};

    fn canvas() -> CalligraphyCanvas {
        let mut canvas = CalligraphyCanvas::with_seed(EngineTuning::default(), 7);
        canvas.set_rasterizer(Box::new(BlockRasterizer));
        canvas
    }

    fn pointer(id: u32, phase: PointerPhase, x: f32, y: f32, t: f64) -> PointerEvent {
        PointerEvent::new(id, phase, ContactKind::Mouse, x, y, t)
    }

    fn stroke(canvas: &mut CalligraphyCanvas, y: f32) {
        canvas.handle_pointer(&pointer(1, PointerPhase::Down, 10.0, y, 0.0));
        canvas.handle_pointer(&pointer(1, PointerPhase::Move, 60.0, y, 50.0));
        canvas.handle_pointer(&pointer(1, PointerPhase::Up, 60.0, y, 60.0));
    }

    #[test]
    fn test_operations_before_allocation_are_noops() {
        let mut canvas = canvas();
        stroke(&mut canvas, 10.0);
        canvas.clear();
        assert!(!canvas.undo());
        assert!(!canvas.is_drawing());
        assert!(canvas.compose_frame().is_none());
        assert!(matches!(
            canvas.render_text("abc"),
            Err(CanvasError::ResourceUnavailable)
        ));
        assert!(matches!(
            canvas.export_png(),
            Err(CanvasError::Export(crate::error::ExportError::ResourceUnavailable))
        ));
        assert!(canvas.drain_notices().is_empty());
    }

    #[test]
    fn test_empty_container_is_not_allocated() {
        let mut canvas = canvas();
        assert!(!canvas.begin_viewport(DisplayConfig::new(0, 300)));
        assert!(!canvas.layers().is_allocated());
    }

    #[test]
    fn test_first_allocation_records_floor() {
        let mut canvas = canvas();
        assert!(canvas.begin_viewport(DisplayConfig::new(100, 80)));
        assert_eq!(canvas.history().len(), 1);
        assert_eq!(
            canvas.drain_notices(),
            vec![CanvasToUi::HistoryChanged {
                can_undo: false,
                can_redo: false
            }]
        );
        // A later resize keeps the history
        stroke(&mut canvas, 20.0);
        canvas.begin_viewport(DisplayConfig::new(120, 80));
        assert_eq!(canvas.history().len(), 2);
    }

    #[test]
    fn test_stroke_saves_history() {
        let mut canvas = canvas();
        canvas.begin_viewport(DisplayConfig::new(100, 80));
        canvas.drain_notices();
        stroke(&mut canvas, 20.0);
        assert!(!canvas.layers().drawing.log.is_empty());
        assert!(canvas.can_undo());
        assert_eq!(
            canvas.drain_notices(),
            vec![CanvasToUi::HistoryChanged {
                can_undo: true,
                can_redo: false
            }]
        );
    }

    #[test]
    fn test_generate_mode_does_not_draw() {
        let mut canvas = canvas();
        canvas.begin_viewport(DisplayConfig::new(100, 80));
        canvas.set_mode(CanvasMode::Generate);
        stroke(&mut canvas, 20.0);
        assert!(canvas.layers().drawing.log.is_empty());
        assert!(!canvas.can_undo());
    }

    #[test]
    fn test_cancelled_contact_rolls_back() {
        let mut canvas = canvas();
        canvas.begin_viewport(DisplayConfig::new(100, 80));
        stroke(&mut canvas, 20.0);
        let saved = canvas.layers().drawing.log.len();

        canvas.handle_pointer(&pointer(2, PointerPhase::Down, 10.0, 50.0, 100.0));
        canvas.handle_pointer(&pointer(2, PointerPhase::Move, 80.0, 50.0, 150.0));
        assert!(canvas.layers().drawing.log.len() > saved);
        canvas.handle_pointer(&pointer(2, PointerPhase::Cancel, 80.0, 50.0, 160.0));
        assert_eq!(canvas.layers().drawing.log.len(), saved);
        assert_eq!(canvas.history().index(), 1);
    }

    #[test]
    fn test_render_text_animates_to_completion() {
        let mut canvas = canvas();
        canvas.begin_viewport(DisplayConfig::new(200, 100));
        canvas.drain_notices();
        let count = canvas.render_text("ab").unwrap();
        assert!(count > 0);
        assert_eq!(
            canvas.drain_notices(),
            vec![CanvasToUi::GenerationProgress { remaining: count }]
        );

        let mut frames = 0;
        while canvas.is_generating() {
            canvas.tick(frames as f64 * 16.0);
            frames += 1;
            assert!(frames < 100);
        }
        let notices = canvas.drain_notices();
        assert_eq!(notices.last(), Some(&CanvasToUi::GenerationComplete));
        assert!(!canvas.layers().text.log.is_empty());
    }

    #[test]
    fn test_text_without_coverage_completes_once() {
        struct NoCoverage;
        impl GlyphRasterizer for NoCoverage {
            fn rasterize(
                &self,
                _text: &str,
                request: &TextRequest,
            ) -> Result<AlphaMask, crate::error::GenerateError> {
                Ok(AlphaMask::new(request.width, request.height))
            }
        }

        let mut canvas = canvas();
        canvas.set_rasterizer(Box::new(NoCoverage));
        canvas.begin_viewport(DisplayConfig::new(200, 100));
        canvas.drain_notices();

        assert_eq!(canvas.render_text("ab").unwrap(), 0);
        assert!(!canvas.is_generating());
        canvas.tick(16.0);
        assert_eq!(canvas.drain_notices(), vec![CanvasToUi::GenerationComplete]);
    }

    #[test]
    fn test_mode_switch_cancels_animation() {
        let mut canvas = canvas();
        canvas.begin_viewport(DisplayConfig::new(200, 100));
        canvas.render_text("abc").unwrap();
        assert!(canvas.is_generating());
        canvas.set_mode(CanvasMode::Generate);
        assert!(!canvas.is_generating());
        canvas.tick(16.0);
        assert!(canvas.layers().text.log.is_empty());
    }

    #[test]
    fn test_clear_cancels_animation_and_saves() {
        let mut canvas = canvas();
        canvas.begin_viewport(DisplayConfig::new(200, 100));
        stroke(&mut canvas, 20.0);
        canvas.render_text("abc").unwrap();
        canvas.tick(0.0);
        canvas.clear();

        assert!(!canvas.is_generating());
        assert!(canvas.layers().text.log.is_empty());
        assert!(canvas.layers().drawing.log.is_empty());
        assert_eq!(canvas.history().index(), 2);

        assert!(canvas.undo());
        assert!(!canvas.layers().drawing.log.is_empty());
    }

    #[test]
    fn test_apply_export_failure_is_a_notice() {
        let mut canvas = canvas();
        let notices = canvas.apply(UiToCanvas::Export {
            kind: ExportKind::Png,
        });
        assert!(matches!(
            notices.as_slice(),
            [CanvasToUi::ExportFailed { .. }]
        ));
    }

    #[test]
    fn test_apply_export_ready() {
        let mut canvas = canvas();
        canvas.apply(UiToCanvas::BeginViewport(DisplayConfig::new(40, 30)));
        let notices = canvas.apply(UiToCanvas::Export {
            kind: ExportKind::Svg,
        });
        match notices.as_slice() {
            [CanvasToUi::ExportReady {
                filename,
                mime_type,
                bytes,
            }] => {
                assert!(filename.ends_with(".svg"));
                assert_eq!(mime_type, "image/svg+xml");
                assert!(bytes.starts_with(b"<svg"));
            }
            other => panic!("unexpected notices {other:?}"),
        }
    }

    #[test]
    fn test_set_view_state_clamps_and_notifies() {
        let mut canvas = canvas();
        let view = canvas.set_view_state(9.0, Vec2::new(3.0, 4.0));
        assert_eq!(view.scale(), 5.0);
        assert_eq!(
            canvas.drain_notices(),
            vec![CanvasToUi::ViewChanged {
                scale: 5.0,
                offset: [3.0, 4.0]
            }]
        );
    }

    #[test]
    fn test_view_transform_maps_strokes() {
        let mut canvas = canvas();
        canvas.begin_viewport(DisplayConfig::with_scale(100, 100, 2.0));
        canvas.set_brush(BrushConfiguration {
            roughness: 0.0,
            ..Default::default()
        });
        canvas.set_view_state(2.0, Vec2::new(10.0, 10.0));
        canvas.handle_pointer(&pointer(1, PointerPhase::Down, 30.0, 50.0, 0.0));
        canvas.handle_pointer(&pointer(1, PointerPhase::Move, 50.0, 50.0, 10.0));
        // (p - offset) / scale * ratio: (30, 50) -> (20, 40), (50, 50) -> (40, 40)
        let entries = canvas.layers().drawing.log.entries();
        assert!(!entries.is_empty());
        assert!((entries[0].cx - 20.0).abs() < 1e-3);
        assert!(entries.iter().all(|e| (e.cy - 40.0).abs() < 1e-3));
        assert!(entries.iter().all(|e| e.cx < 40.0));
    }
}
