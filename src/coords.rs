//! Conversions between the viewer's coordinate spaces.
//!
//! | Space | Units | Origin |
//! |-------|-------|--------|
//! | world | game units, `x` east / `z` north | map centre |
//! | normalized | `[-0.5, 0.5]` per axis | map centre |
//! | local | canvas pixels before pan/zoom | canvas top-left |
//! | screen | canvas pixels after pan/zoom | canvas top-left |
//!
//! North-up mode mirrors the map through its centre, so the normalized
//! coordinates of every world point are negated. Applying the flip twice is
//! the identity, which keeps restored links stable across toggles.

#[cfg(test)]
#[path = "coords_test.rs"]
mod coords_test;

use serde::{Deserialize, Serialize};

use crate::camera::{Point, ViewTransform};
use crate::consts::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, WORLD_HEIGHT, WORLD_WIDTH};

/// A position in world space: `x` east, `z` north.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub z: f64,
}

impl WorldPoint {
    #[must_use]
    pub fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }
}

/// Size of the playable map square, centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldExtent {
    pub width: f64,
    pub height: f64,
}

impl WorldExtent {
    pub const STANDARD: Self = Self { width: WORLD_WIDTH, height: WORLD_HEIGHT };

    /// Whether `p` lies inside the map square (edges included).
    #[must_use]
    pub fn contains(&self, p: WorldPoint) -> bool {
        p.x.abs() <= self.width / 2.0 && p.z.abs() <= self.height / 2.0
    }
}

impl Default for WorldExtent {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Canvas dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self { width: DEFAULT_CANVAS_WIDTH, height: DEFAULT_CANVAS_HEIGHT }
    }
}

/// Map orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Data as authored: world north points down the canvas.
    #[default]
    Normal,
    /// Geometry mirrored so that north renders upward.
    NorthUp,
}

impl Orientation {
    #[must_use]
    pub fn from_north_up(north_up: bool) -> Self {
        if north_up { Self::NorthUp } else { Self::Normal }
    }

    #[must_use]
    pub fn is_north_up(self) -> bool {
        self == Self::NorthUp
    }

    /// Mirror a world point through the origin when north-up, otherwise
    /// return it unchanged.
    #[must_use]
    pub fn flip(self, p: WorldPoint) -> WorldPoint {
        match self {
            Self::Normal => p,
            Self::NorthUp => WorldPoint { x: -p.x, z: -p.z },
        }
    }
}

/// Stateless converter bound to one canvas size, world extent and orientation.
///
/// Construct a fresh mapper whenever any of the three changes; it is `Copy`
/// and holds no caches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    pub canvas: CanvasSize,
    pub world: WorldExtent,
    pub orientation: Orientation,
}

impl CoordinateMapper {
    #[must_use]
    pub fn new(canvas: CanvasSize, orientation: Orientation) -> Self {
        Self { canvas, world: WorldExtent::STANDARD, orientation }
    }

    /// World → normalized, with the orientation flip applied.
    #[must_use]
    pub fn world_to_normalized(&self, p: WorldPoint) -> Point {
        let p = self.orientation.flip(p);
        Point { x: p.x / self.world.width, y: -p.z / self.world.height }
    }

    /// Normalized → world, undoing the orientation flip.
    #[must_use]
    pub fn normalized_to_world(&self, n: Point) -> WorldPoint {
        let p = WorldPoint { x: n.x * self.world.width, z: -n.y * self.world.height };
        self.orientation.flip(p)
    }

    /// Normalized → local pixel space.
    #[must_use]
    pub fn normalized_to_local(&self, n: Point) -> Point {
        Point { x: (n.x + 0.5) * self.canvas.width, y: (n.y + 0.5) * self.canvas.height }
    }

    /// Local pixel space → normalized.
    #[must_use]
    pub fn local_to_normalized(&self, l: Point) -> Point {
        Point { x: l.x / self.canvas.width - 0.5, y: l.y / self.canvas.height - 0.5 }
    }

    /// World → local pixel space (untransformed canvas).
    #[must_use]
    pub fn world_to_local(&self, p: WorldPoint) -> Point {
        self.normalized_to_local(self.world_to_normalized(p))
    }

    /// World → screen under `transform`.
    #[must_use]
    pub fn world_to_screen(&self, p: WorldPoint, transform: &ViewTransform) -> Point {
        transform.apply(self.world_to_local(p))
    }

    /// Screen → world under `transform`; exact inverse of [`Self::world_to_screen`].
    #[must_use]
    pub fn screen_to_world(&self, s: Point, transform: &ViewTransform) -> WorldPoint {
        self.normalized_to_world(self.local_to_normalized(transform.invert(s)))
    }

    /// Whether a screen point lies on the canvas, edges included.
    #[must_use]
    pub fn is_on_canvas(&self, s: Point) -> bool {
        (0.0..=self.canvas.width).contains(&s.x) && (0.0..=self.canvas.height).contains(&s.y)
    }

    /// Integer world coordinates under a screen point, for the hover readout.
    ///
    /// Returns `None` when the point falls outside the map square.
    #[must_use]
    pub fn world_readout(&self, s: Point, transform: &ViewTransform) -> Option<WorldReadout> {
        let w = self.screen_to_world(s, transform);
        let rounded = WorldPoint::new(w.x.round(), w.z.round());
        if !self.world.contains(rounded) {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        let readout = WorldReadout { x: rounded.x as i64, z: rounded.z as i64 };
        Some(readout)
    }
}

/// Rounded world coordinates shown next to the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorldReadout {
    pub x: i64,
    pub z: i64,
}
