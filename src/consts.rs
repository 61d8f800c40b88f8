//! Shared numeric constants and default values for the viewer engine.

// ── World ───────────────────────────────────────────────────────

/// Width of the playable map square, in world units.
pub const WORLD_WIDTH: f64 = 4000.0;

/// Height of the playable map square, in world units.
pub const WORLD_HEIGHT: f64 = 4000.0;

// ── Camera ──────────────────────────────────────────────────────

/// Smallest allowed camera scale.
pub const MIN_SCALE: f64 = 1.0;

/// Largest allowed camera scale.
pub const MAX_SCALE: f64 = 100.0;

// ── Canvas ──────────────────────────────────────────────────────

/// Canvas width used when none is requested, in pixels.
pub const DEFAULT_CANVAS_WIDTH: f64 = 800.0;

/// Canvas height used when none is requested, in pixels.
pub const DEFAULT_CANVAS_HEIGHT: f64 = 800.0;

// ── Overlays ────────────────────────────────────────────────────

/// Rendered marker edge length when a marker carries no explicit size.
pub const DEFAULT_ICON_SIZE_PX: f64 = 32.0;

/// Region fill opacity while terrain or spawn overlays are shown.
pub const REGION_OPACITY_LAYERED: f64 = 0.7;

/// Region fill opacity when regions are the only visible layer.
pub const REGION_OPACITY_SOLO: f64 = 1.0;

// ── View defaults ───────────────────────────────────────────────

/// Planet shown on first visit.
pub const DEFAULT_PLANET: &str = "lunar";
