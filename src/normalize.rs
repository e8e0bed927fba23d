//! Pixel to unit-square coordinate mapping.

/// Current drawing surface size in pixels. Both sides are always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    width: u32,
    height: u32,
}

impl SurfaceSize {
    /// Build a surface size, clamping each side to at least one pixel.
    pub fn new(width: i64, height: i64) -> Self {
        Self {
            width: width.clamp(1, u32::MAX as i64) as u32,
            height: height.clamp(1, u32::MAX as i64) as u32,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
        }
    }
}

/// A point in `[0,1] x [0,1]`, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPoint {
    pub x: f32,
    pub y: f32,
}

impl NormalizedPoint {
    /// The surface center, used before any touch has been seen.
    pub const CENTER: NormalizedPoint = NormalizedPoint { x: 0.5, y: 0.5 };

    /// Map to device coordinates (`[-1,1]`, y pointing up).
    pub fn to_device(self) -> (f32, f32) {
        (self.x * 2.0 - 1.0, 1.0 - self.y * 2.0)
    }
}

/// Normalize raw pixel coordinates against the surface size.
///
/// Out-of-range input is clamped rather than rejected; NaN maps to 0.
pub fn normalize(x: f32, y: f32, surface: SurfaceSize) -> NormalizedPoint {
    NormalizedPoint {
        x: unit_clamp(x / surface.width as f32),
        y: unit_clamp(y / surface.height as f32),
    }
}

fn unit_clamp(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
