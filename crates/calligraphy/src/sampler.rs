//! Point sampler: the single boundary between container coordinates and
//! surface (device pixel) space.

use calligraph_ipc::{ContactKind, PointerEvent, PointerSample};
use glam::Vec2;

use crate::gesture::ViewState;
use crate::physics::sanitize_ratio;
use crate::types::Sample;

/// Converts raw pointer reports into surface-space samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSampler {
    device_pixel_ratio: f32,
}

impl Default for PointSampler {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl PointSampler {
    pub fn new(device_pixel_ratio: f32) -> Self {
        Self {
            device_pixel_ratio: sanitize_ratio(device_pixel_ratio),
        }
    }

    pub fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    /// Container CSS pixels to surface pixels through the inverse view transform
    pub fn to_surface(&self, point: Vec2, view: &ViewState) -> Vec2 {
        view.screen_to_canvas(point) * self.device_pixel_ratio
    }

    /// Normalize one physical report.
    ///
    /// A reported pressure in [0, 1] is kept as measured; anything else
    /// (absent, NaN, out of range) falls back to the default pressure.
    pub fn sample(&self, raw: &PointerSample, kind: ContactKind, view: &ViewState) -> Sample {
        let position = self.to_surface(Vec2::new(raw.x, raw.y), view);
        match raw.pressure {
            Some(p) if (0.0..=1.0).contains(&p) => {
                Sample::measured(position.x, position.y, p, raw.timestamp)
            }
            _ => {
                if kind == ContactKind::Stylus {
                    tracing::trace!("stylus sample without pressure, defaulting");
                }
                Sample::defaulted(position.x, position.y, raw.timestamp)
            }
        }
    }

    /// Every physical sample carried by an event, oldest first
    pub fn samples(&self, event: &PointerEvent, view: &ViewState) -> Vec<Sample> {
        event
            .samples()
            .iter()
            .map(|raw| self.sample(raw, event.kind, view))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_PRESSURE;
    use crate::types::PressureKind;
    use calligraph_ipc::PointerPhase;

    #[test]
    fn test_mouse_defaults_pressure() {
        let sampler = PointSampler::new(2.0);
        let event = PointerEvent::new(1, PointerPhase::Down, ContactKind::Mouse, 10.0, 5.0, 3.0);
        let samples = sampler.samples(&event, &ViewState::default());
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].position, Vec2::new(20.0, 10.0));
        assert_eq!(samples[0].pressure, DEFAULT_PRESSURE);
        assert_eq!(samples[0].pressure_kind, PressureKind::Defaulted);
        assert_eq!(samples[0].time, 3.0);
    }

    #[test]
    fn test_stylus_pressure_is_measured() {
        let sampler = PointSampler::new(1.0);
        let event = PointerEvent::new(1, PointerPhase::Move, ContactKind::Stylus, 0.0, 0.0, 0.0)
            .with_pressure(0.8);
        let sample = sampler.samples(&event, &ViewState::default())[0];
        assert_eq!(sample.pressure_kind, PressureKind::Measured);
        assert!((sample.pressure - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_pressure_falls_back() {
        let sampler = PointSampler::default();
        let event = PointerEvent::new(1, PointerPhase::Move, ContactKind::Touch, 0.0, 0.0, 0.0)
            .with_pressure(f32::NAN);
        let sample = sampler.samples(&event, &ViewState::default())[0];
        assert_eq!(sample.pressure_kind, PressureKind::Defaulted);
        assert_eq!(sample.pressure, DEFAULT_PRESSURE);
    }

    #[test]
    fn test_inverse_view_transform() {
        let sampler = PointSampler::new(2.0);
        let view = ViewState::new(2.0, Vec2::new(100.0, 50.0));
        let surface = sampler.to_surface(Vec2::new(120.0, 70.0), &view);
        assert_eq!(surface, Vec2::new(20.0, 20.0));
    }

    #[test]
    fn test_coalesced_samples_in_order() {
        let sampler = PointSampler::new(1.0);
        let batch = (0..4)
            .map(|i| PointerSample {
                x: i as f32,
                y: 0.0,
                pressure: None,
                timestamp: i as f64,
            })
            .collect();
        let event = PointerEvent::new(1, PointerPhase::Move, ContactKind::Stylus, 3.0, 0.0, 3.0)
            .with_coalesced(batch);
        let xs: Vec<f32> = sampler
            .samples(&event, &ViewState::default())
            .iter()
            .map(|s| s.position.x)
            .collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_bad_ratio_falls_back_to_one() {
        assert_eq!(PointSampler::new(0.0).device_pixel_ratio(), 1.0);
        assert_eq!(PointSampler::new(f32::NAN).device_pixel_ratio(), 1.0);
    }
}
