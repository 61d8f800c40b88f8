//! Overlay markers pinned to world positions.
//!
//! Markers travel inside share links as a JSON array, so the serde shape here
//! is a wire format: `{"type": "player", "position": [x, y, z], "size": 32}`.
//! Only `x` and `z` of the position matter for placement; `y` (altitude) is
//! carried through untouched.

#[cfg(test)]
#[path = "icons_test.rs"]
mod icons_test;

use serde::{Deserialize, Serialize};

use crate::camera::{Point, ViewTransform};
use crate::consts::DEFAULT_ICON_SIZE_PX;
use crate::coords::{CoordinateMapper, WorldPoint};

const PLAYER_ICON_URL: &str = "icon_transparent.webp";
const AUTOLATHE_ICON_URL: &str = "https://stationeers-wiki.com/images/8/85/StructureAutolathe_BuildState4.png";

/// What a marker depicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconKind {
    Player,
    Autolathe,
    /// Unrecognized kinds still occupy a slot but have no image.
    #[serde(other)]
    Other,
}

impl IconKind {
    /// Image the renderer should show for this kind, if any.
    #[must_use]
    pub fn image_url(self) -> Option<&'static str> {
        match self {
            Self::Player => Some(PLAYER_ICON_URL),
            Self::Autolathe => Some(AUTOLATHE_ICON_URL),
            Self::Other => None,
        }
    }
}

/// A marker placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconMarker {
    #[serde(rename = "type")]
    pub kind: IconKind,
    /// Game position `[x, y, z]`.
    pub position: [f64; 3],
    /// Edge length in pixels; [`DEFAULT_ICON_SIZE_PX`] when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

impl IconMarker {
    #[must_use]
    pub fn new(kind: IconKind, x: f64, z: f64) -> Self {
        Self { kind, position: [x, 0.0, z], size: None }
    }

    /// Ground-plane position used for placement.
    #[must_use]
    pub fn world_position(&self) -> WorldPoint {
        WorldPoint::new(self.position[0], self.position[2])
    }

    #[must_use]
    pub fn size_px(&self) -> f64 {
        self.size.filter(|s| s.is_finite() && *s > 0.0).unwrap_or(DEFAULT_ICON_SIZE_PX)
    }
}

/// Where and whether one marker is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IconPlacement {
    pub kind: IconKind,
    /// Screen point the marker is centred on.
    pub center: Point,
    /// Top-left corner of the marker image.
    pub top_left: Point,
    pub size: f64,
    pub visible: bool,
}

/// Compute a placement for every marker.
///
/// Cheap enough to run after every transform change, resize and orientation
/// toggle: one forward projection per marker, no geometry access.
#[must_use]
pub fn reposition(icons: &[IconMarker], transform: &ViewTransform, mapper: &CoordinateMapper) -> Vec<IconPlacement> {
    icons.iter().map(|icon| place(icon, transform, mapper)).collect()
}

/// Placement of a single marker.
#[must_use]
pub fn place(icon: &IconMarker, transform: &ViewTransform, mapper: &CoordinateMapper) -> IconPlacement {
    let center = mapper.world_to_screen(icon.world_position(), transform);
    let size = icon.size_px();
    let half = size / 2.0;
    IconPlacement {
        kind: icon.kind,
        center,
        top_left: Point::new(center.x - half, center.y - half),
        size,
        visible: mapper.is_on_canvas(center),
    }
}
