#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_SCALE, MIN_SCALE};

/// A point in local pixel or screen space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Camera affine transform for pan/zoom over the map canvas.
///
/// `translate_x` / `translate_y` are in screen pixels.
/// `scale` is a zoom factor (1.0 = whole map fits the canvas).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: Self = Self { scale: 1.0, translate_x: 0.0, translate_y: 0.0 };

    #[must_use]
    pub fn new(scale: f64, translate_x: f64, translate_y: f64) -> Self {
        Self { scale, translate_x, translate_y }
    }

    /// Return a copy whose scale lies in `[MIN_SCALE, MAX_SCALE]`.
    ///
    /// Non-finite components are replaced by the identity's.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self::IDENTITY.merge(self)
    }

    /// Convert a local pixel point (untransformed canvas) to screen space.
    #[must_use]
    pub fn apply(&self, local: Point) -> Point {
        Point {
            x: self.translate_x + self.scale * local.x,
            y: self.translate_y + self.scale * local.y,
        }
    }

    /// Convert a screen point back to local pixel space.
    #[must_use]
    pub fn invert(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.translate_x) / self.scale,
            y: (screen.y - self.translate_y) / self.scale,
        }
    }

    /// Take finite components from `next`, keeping `self`'s where `next` has
    /// NaN or infinities, then clamp the scale.
    fn merge(self, next: Self) -> Self {
        let pick = |candidate: f64, fallback: f64| if candidate.is_finite() { candidate } else { fallback };
        Self {
            scale: pick(next.scale, self.scale).clamp(MIN_SCALE, MAX_SCALE),
            translate_x: pick(next.translate_x, self.translate_x),
            translate_y: pick(next.translate_y, self.translate_y),
        }
    }
}

/// Owner of the current camera transform.
///
/// Every write goes through [`TransformStore::set`], so the scale invariant
/// holds no matter which gesture produced the value. Callers are responsible
/// for refreshing screen-space state after each write.
#[derive(Debug, Clone, Default)]
pub struct TransformStore {
    current: ViewTransform,
}

impl TransformStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the transform, clamping the scale. Returns the stored value.
    pub fn set(&mut self, next: ViewTransform) -> ViewTransform {
        self.current = self.current.merge(next);
        self.current
    }

    /// The current transform.
    #[must_use]
    pub fn current(&self) -> ViewTransform {
        self.current
    }

    /// Multiply the scale by `factor`, keeping `anchor` (screen space) fixed.
    ///
    /// The anchor stays put even when the requested scale is clamped.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) -> ViewTransform {
        let cur = self.current;
        let scale = (cur.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        let local = cur.invert(anchor);
        self.set(ViewTransform {
            scale,
            translate_x: anchor.x - local.x * scale,
            translate_y: anchor.y - local.y * scale,
        })
    }

    /// Shift the transform by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) -> ViewTransform {
        let cur = self.current;
        self.set(ViewTransform {
            translate_x: cur.translate_x + dx,
            translate_y: cur.translate_y + dy,
            ..cur
        })
    }

    /// Return to the identity transform.
    pub fn reset(&mut self) -> ViewTransform {
        self.set(ViewTransform::IDENTITY)
    }
}
