/// Minimum view scale.
pub const MIN_VIEW_SCALE: f32 = 0.5;

/// Maximum view scale.
pub const MAX_VIEW_SCALE: f32 = 5.0;

/// Brush sizes at or below this select hairline (uniform pen) mode.
pub const HAIRLINE_MAX_SIZE: f32 = 1.0;

/// Base stamp step as a fraction of stamp size.
pub const BASE_STEP_FACTOR: f32 = 0.05;

/// Smallest stamp step in surface pixels.
pub const MIN_STEP: f32 = 0.5;

/// Spacing multiplier applied to `spacing * target_size`.
pub const SPACING_FACTOR: f32 = 1.5;

/// Divisor of `velocity * roughness` giving the dry-brush skip probability.
pub const DRY_BRUSH_DIVISOR: f32 = 5.0;

/// Roughness above which splatter stamps are emitted.
pub const SPLATTER_ROUGHNESS: f32 = 0.2;

/// Splatter radius relative to the main stamp.
pub const SPLATTER_RADIUS_FACTOR: f32 = 0.3;

/// Maximum splatter opacity.
pub const SPLATTER_MAX_OPACITY: f32 = 0.4;

/// Hardness at or above which no soft glow is drawn.
pub const GLOW_HARDNESS_CUTOFF: f32 = 0.95;

/// Default pressure for contacts that do not report one.
pub const DEFAULT_PRESSURE: f32 = 0.5;

/// Peak opacity of the soft glow ring around a stamp.
pub const GLOW_OPACITY: f32 = 0.35;

/// Upper bound on stamps emitted for a single segment.
pub const MAX_SEGMENT_STAMPS: usize = 65_536;
