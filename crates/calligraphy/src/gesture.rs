//! Pointer arbitration: single-pointer drawing versus two-pointer pinch/pan.

use calligraph_ipc::{CanvasMode, PointerEvent, PointerPhase};
use glam::Vec2;
use tracing::debug;

use crate::constants::{MAX_VIEW_SCALE, MIN_VIEW_SCALE};

/// View transform applied to the canvas inside its container
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    scale: f32,
    pub offset: Vec2,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

impl ViewState {
    /// Create a view state; scale is clamped to the allowed range
    pub fn new(scale: f32, offset: Vec2) -> Self {
        let mut view = Self {
            scale: 1.0,
            offset: if offset.is_finite() { offset } else { Vec2::ZERO },
        };
        view.set_scale(scale);
        view
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Set the scale, clamped to [MIN_VIEW_SCALE, MAX_VIEW_SCALE]. Non-finite input is ignored.
    pub fn set_scale(&mut self, scale: f32) {
        if scale.is_finite() {
            self.scale = scale.clamp(MIN_VIEW_SCALE, MAX_VIEW_SCALE);
        }
    }

    /// Container coordinates to unscaled canvas coordinates
    pub fn screen_to_canvas(&self, point: Vec2) -> Vec2 {
        (point - self.offset) / self.scale
    }
}

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Drawing { pointer_id: u32 },
    Gesturing,
}

/// What the canvas should do in response to a pointer event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureAction {
    None,
    BeginStroke,
    ContinueStroke,
    EndStroke,
    /// Throw away the in-progress stroke without saving it
    AbandonStroke,
    ViewChanged(ViewState),
}

/// Two-pointer pinch/pan state machine.
///
/// Exactly one of drawing or gesturing is active at a time; a second contact
/// always takes over from a stroke in progress.
#[derive(Debug, Default)]
pub struct GestureController {
    state: GestureState,
    /// Active contacts in arrival order
    pointers: Vec<(u32, Vec2)>,
    view: ViewState,
    last_distance: Option<f32>,
    last_midpoint: Vec2,
}

impl GestureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn set_view(&mut self, view: ViewState) {
        self.view = view;
    }

    pub fn handle(&mut self, event: &PointerEvent, mode: CanvasMode) -> GestureAction {
        let position = Vec2::new(event.x, event.y);
        match event.phase {
            PointerPhase::Down => self.pointer_down(event.pointer_id, position, mode),
            PointerPhase::Move => self.pointer_move(event.pointer_id, position),
            PointerPhase::Up => self.pointer_up(event.pointer_id, false),
            PointerPhase::Cancel => self.pointer_up(event.pointer_id, true),
        }
    }

    fn pointer_down(&mut self, id: u32, position: Vec2, mode: CanvasMode) -> GestureAction {
        if let Some(entry) = self.pointers.iter_mut().find(|(pid, _)| *pid == id) {
            entry.1 = position;
            return GestureAction::None;
        }
        self.pointers.push((id, position));

        if self.pointers.len() >= 2 {
            let was_drawing = matches!(self.state, GestureState::Drawing { .. });
            if self.state != GestureState::Gesturing {
                debug!("GestureController: two contacts, entering gesture");
                self.state = GestureState::Gesturing;
                self.reset_pinch_reference();
            }
            return if was_drawing {
                GestureAction::AbandonStroke
            } else {
                GestureAction::None
            };
        }

        if self.state == GestureState::Idle && mode == CanvasMode::Draw {
            self.state = GestureState::Drawing { pointer_id: id };
            return GestureAction::BeginStroke;
        }
        GestureAction::None
    }

    fn pointer_move(&mut self, id: u32, position: Vec2) -> GestureAction {
        let Some(entry) = self.pointers.iter_mut().find(|(pid, _)| *pid == id) else {
            return GestureAction::None;
        };
        entry.1 = position;

        match self.state {
            GestureState::Drawing { pointer_id } if pointer_id == id => {
                GestureAction::ContinueStroke
            }
            GestureState::Gesturing => self.update_pinch(),
            _ => GestureAction::None,
        }
    }

    fn pointer_up(&mut self, id: u32, cancelled: bool) -> GestureAction {
        self.pointers.retain(|(pid, _)| *pid != id);

        match self.state {
            GestureState::Drawing { pointer_id } if pointer_id == id => {
                self.state = GestureState::Idle;
                if cancelled {
                    GestureAction::AbandonStroke
                } else {
                    GestureAction::EndStroke
                }
            }
            GestureState::Gesturing if self.pointers.len() < 2 => {
                debug!("GestureController: gesture ended");
                self.state = GestureState::Idle;
                self.last_distance = None;
                GestureAction::None
            }
            GestureState::Gesturing => {
                // A third contact lifted; measure from the remaining pair
                self.reset_pinch_reference();
                GestureAction::None
            }
            _ => GestureAction::None,
        }
    }

    fn pinch_pair(&self) -> Option<(Vec2, Vec2)> {
        match self.pointers.as_slice() {
            [(_, a), (_, b), ..] => Some((*a, *b)),
            _ => None,
        }
    }

    fn reset_pinch_reference(&mut self) {
        if let Some((a, b)) = self.pinch_pair() {
            self.last_distance = Some(a.distance(b));
            self.last_midpoint = (a + b) / 2.0;
        }
    }

    fn update_pinch(&mut self) -> GestureAction {
        let Some((a, b)) = self.pinch_pair() else {
            return GestureAction::None;
        };
        let distance = a.distance(b);
        let midpoint = (a + b) / 2.0;

        if let Some(previous) = self.last_distance
            && previous > 0.0
            && distance.is_finite()
        {
            let scale = self.view.scale * (distance / previous);
            self.view.set_scale(scale);
        }
        self.view.offset += midpoint - self.last_midpoint;

        self.last_distance = Some(distance);
        self.last_midpoint = midpoint;
        GestureAction::ViewChanged(self.view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calligraph_ipc::ContactKind;

    fn ev(id: u32, phase: PointerPhase, x: f32, y: f32) -> PointerEvent {
        PointerEvent::new(id, phase, ContactKind::Touch, x, y, 0.0)
    }

    #[test]
    fn test_single_pointer_draws() {
        let mut gc = GestureController::new();
        let draw = CanvasMode::Draw;
        assert_eq!(
            gc.handle(&ev(1, PointerPhase::Down, 0.0, 0.0), draw),
            GestureAction::BeginStroke
        );
        assert_eq!(
            gc.handle(&ev(1, PointerPhase::Move, 5.0, 0.0), draw),
            GestureAction::ContinueStroke
        );
        assert_eq!(
            gc.handle(&ev(1, PointerPhase::Up, 5.0, 0.0), draw),
            GestureAction::EndStroke
        );
        assert_eq!(gc.state(), GestureState::Idle);
    }

    #[test]
    fn test_generate_mode_does_not_draw() {
        let mut gc = GestureController::new();
        let action = gc.handle(&ev(1, PointerPhase::Down, 0.0, 0.0), CanvasMode::Generate);
        assert_eq!(action, GestureAction::None);
        assert_eq!(gc.state(), GestureState::Idle);
    }

    #[test]
    fn test_second_contact_abandons_stroke() {
        let mut gc = GestureController::new();
        let draw = CanvasMode::Draw;
        gc.handle(&ev(1, PointerPhase::Down, 0.0, 0.0), draw);
        assert_eq!(
            gc.handle(&ev(2, PointerPhase::Down, 100.0, 0.0), draw),
            GestureAction::AbandonStroke
        );
        assert_eq!(gc.state(), GestureState::Gesturing);

        // The first pointer no longer draws
        let action = gc.handle(&ev(1, PointerPhase::Move, 10.0, 0.0), draw);
        assert!(matches!(action, GestureAction::ViewChanged(_)));

        // Lifting either contact ends the gesture without a stroke end
        assert_eq!(
            gc.handle(&ev(2, PointerPhase::Up, 100.0, 0.0), draw),
            GestureAction::None
        );
        assert_eq!(gc.state(), GestureState::Idle);
        assert_eq!(gc.handle(&ev(1, PointerPhase::Move, 20.0, 0.0), draw), GestureAction::None);
        assert_eq!(gc.handle(&ev(1, PointerPhase::Up, 20.0, 0.0), draw), GestureAction::None);
    }

    #[test]
    fn test_pinch_scales_and_pans() {
        let mut gc = GestureController::new();
        let mode = CanvasMode::Generate;
        gc.handle(&ev(1, PointerPhase::Down, 0.0, 0.0), mode);
        gc.handle(&ev(2, PointerPhase::Down, 100.0, 0.0), mode);
        let action = gc.handle(&ev(2, PointerPhase::Move, 200.0, 0.0), mode);
        let GestureAction::ViewChanged(view) = action else {
            panic!("expected view change, got {action:?}");
        };
        assert!((view.scale() - 2.0).abs() < 1e-5);
        assert!((view.offset.x - 50.0).abs() < 1e-5);
    }

    #[test]
    fn test_scale_stays_clamped() {
        let mut gc = GestureController::new();
        let mode = CanvasMode::Draw;
        gc.handle(&ev(1, PointerPhase::Down, 0.0, 0.0), mode);
        gc.handle(&ev(2, PointerPhase::Down, 10.0, 0.0), mode);
        for i in 1..50 {
            gc.handle(&ev(2, PointerPhase::Move, 10.0 * (i as f32 + 1.0), 0.0), mode);
            assert!(gc.view().scale() <= MAX_VIEW_SCALE);
        }
        assert_eq!(gc.view().scale(), MAX_VIEW_SCALE);
        for i in (1..50).rev() {
            gc.handle(&ev(2, PointerPhase::Move, 0.2 * i as f32, 0.0), mode);
            assert!(gc.view().scale() >= MIN_VIEW_SCALE);
        }
        assert_eq!(gc.view().scale(), MIN_VIEW_SCALE);
    }

    #[test]
    fn test_zero_distance_start_suppresses_scale() {
        let mut gc = GestureController::new();
        let mode = CanvasMode::Draw;
        gc.handle(&ev(1, PointerPhase::Down, 50.0, 50.0), mode);
        gc.handle(&ev(2, PointerPhase::Down, 50.0, 50.0), mode);
        let action = gc.handle(&ev(2, PointerPhase::Move, 80.0, 50.0), mode);
        let GestureAction::ViewChanged(view) = action else {
            panic!("expected view change");
        };
        assert_eq!(view.scale(), 1.0);
        assert!(view.scale().is_finite());
    }

    #[test]
    fn test_cancel_abandons_stroke() {
        let mut gc = GestureController::new();
        gc.handle(&ev(1, PointerPhase::Down, 0.0, 0.0), CanvasMode::Draw);
        assert_eq!(
            gc.handle(&ev(1, PointerPhase::Cancel, 0.0, 0.0), CanvasMode::Draw),
            GestureAction::AbandonStroke
        );
    }

    #[test]
    fn test_view_state_clamps_and_maps() {
        let view = ViewState::new(10.0, Vec2::new(20.0, 10.0));
        assert_eq!(view.scale(), MAX_VIEW_SCALE);
        let view = ViewState::new(2.0, Vec2::new(20.0, 10.0));
        assert_eq!(view.screen_to_canvas(Vec2::new(40.0, 30.0)), Vec2::new(10.0, 10.0));
        let mut view = ViewState::new(f32::NAN, Vec2::NAN);
        assert_eq!(view.scale(), 1.0);
        assert_eq!(view.offset, Vec2::ZERO);
        view.set_scale(0.1);
        assert_eq!(view.scale(), MIN_VIEW_SCALE);
    }
}
