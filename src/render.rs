//! Capabilities the engine drives but does not implement.
//!
//! The viewer never draws. It hands a [`Renderer`] screen-space marker
//! placements, the active region features with their visibility, and layer
//! toggles; the host decides how those become pixels (SVG, canvas, GPU).

use crate::camera::{Point, ViewTransform};
use crate::geo::{RegionFeature, SpawnPoint};
use crate::icons::IconPlacement;

/// Drawing surface consumed by the viewer.
pub trait Renderer {
    /// Redraw the active region layer. `visible[i]` is the filter result for
    /// `features[i]`. Feature geometry is in data space; `transform` is the
    /// current pan/zoom to apply on top of the host's projection.
    fn draw_regions(&mut self, features: &[RegionFeature], visible: &[bool], transform: ViewTransform, opacity: f64);

    /// Redraw spawn points at the given local pixel positions.
    fn draw_spawns(&mut self, spawns: &[(SpawnPoint, Point)], transform: ViewTransform, visible: bool);

    /// Show or hide the terrain raster.
    fn set_terrain_visible(&mut self, visible: bool);

    /// Draw the north indicator, pointing up when `north_up`.
    fn draw_compass(&mut self, north_up: bool);

    /// Remove every marker.
    fn clear_markers(&mut self);

    /// Move marker `index` to `placement`.
    fn place_marker(&mut self, index: usize, placement: &IconPlacement);

    /// Current pointer position in screen coordinates, if over the canvas.
    fn pointer_position(&self) -> Option<Point>;
}

/// Errors from a clipboard backend.
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable")]
    Unavailable,
    #[error("clipboard write failed: {0}")]
    Write(String),
}

/// Destination for copied share links.
pub trait Clipboard {
    /// Copy `text`.
    ///
    /// # Errors
    ///
    /// Returns [`ClipboardError`] if the text could not be copied.
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}
