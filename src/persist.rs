//! View state serialization: share-link query strings and restoration.
//!
//! Restoration reads each field from three channels in order: the request's
//! query parameters, then local storage, then a built-in default. A value
//! that is present but unparseable in one channel falls through to the next
//! instead of failing the whole restore.
//!
//! Share links carry every field at once. Markers travel as a JSON array
//! that is percent-encoded before being placed in the query, so links from
//! the browser viewer (which double-encodes) decode unchanged.

#[cfg(test)]
#[path = "persist_test.rs"]
mod persist_test;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;
use url::form_urlencoded;

use crate::camera::ViewTransform;
use crate::consts::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, DEFAULT_PLANET};
use crate::coords::CanvasSize;
use crate::geo::RegionType;
use crate::icons::IconMarker;
use crate::storage::{Storage, keys};

/// Characters left unescaped by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Query parameter names that are not also storage keys.
pub mod params {
    pub const SELECTED: &str = "selected";
    pub const ICONS: &str = "icons";
    pub const EMBED: &str = "embed";
    pub const WIDTH: &str = "width";
    pub const HEIGHT: &str = "height";
}

/// The `icons` parameter could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum MarkerDecodeError {
    #[error("icons parameter is not valid percent-encoded UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("icons parameter is not a marker list: {0}")]
    Json(#[from] serde_json::Error),
}

/// Colour theme, persisted only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            other => Err(format!("unknown theme {other:?}")),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded query parameters; the first occurrence of a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    /// Parse a raw query string, with or without the leading `?`.
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut map = HashMap::new();
        for (k, v) in form_urlencoded::parse(query.as_bytes()) {
            map.entry(k.into_owned()).or_insert_with(|| v.into_owned());
        }
        Self(map)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl From<HashMap<String, String>> for QueryParams {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

/// Everything a share link carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedViewState {
    pub planet: String,
    pub region: RegionType,
    pub terrain: bool,
    pub spawn: bool,
    pub north_up: bool,
    pub transform: ViewTransform,
    /// Positions in the region option list; `0` (or empty) means all.
    pub selected: Vec<usize>,
    pub icons: Vec<IconMarker>,
}

impl Default for PersistedViewState {
    fn default() -> Self {
        Self {
            planet: DEFAULT_PLANET.to_owned(),
            region: RegionType::default(),
            terrain: true,
            spawn: false,
            north_up: false,
            transform: ViewTransform::IDENTITY,
            selected: vec![0],
            icons: Vec::new(),
        }
    }
}

impl PersistedViewState {
    /// Encode every field as a query string (no leading `?`).
    #[must_use]
    pub fn to_query(&self) -> String {
        let selected = self.selected.iter().map(usize::to_string).collect::<Vec<_>>().join("-");
        form_urlencoded::Serializer::new(String::new())
            .append_pair(keys::PLANET, &self.planet)
            .append_pair(keys::REGION, self.region.as_str())
            .append_pair(keys::TERRAIN, flag(self.terrain))
            .append_pair(keys::SPAWN, flag(self.spawn))
            .append_pair(keys::ZOOM, &format_zoom(self.transform.scale))
            .append_pair(keys::X, &format_offset(self.transform.translate_x))
            .append_pair(keys::Y, &format_offset(self.transform.translate_y))
            .append_pair(params::SELECTED, &selected)
            .append_pair(keys::ROTATE, flag(self.north_up))
            .append_pair(params::ICONS, &encode_icons(&self.icons))
            .finish()
    }

    /// Full share URL: `base` with its query replaced by [`Self::to_query`].
    #[must_use]
    pub fn share_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.set_fragment(None);
        url.set_query(Some(&self.to_query()));
        url
    }
}

/// Where a restored region selection came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavedSelection {
    /// Option positions from a share link.
    Indices(Vec<usize>),
    /// Colour keys from local storage.
    Keys(Vec<String>),
}

/// Result of restoring a view on load.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoredView {
    pub state: PersistedViewState,
    pub selection: SavedSelection,
    pub canvas: CanvasSize,
    pub embed: bool,
    pub theme: Theme,
}

/// Restore the view from the query (first), storage (second) and defaults.
#[must_use]
pub fn restore(query: &QueryParams, storage: &dyn Storage) -> RestoredView {
    let defaults = PersistedViewState::default();
    let layered = Layered { query, storage };

    let transform = ViewTransform::new(
        layered.read_number(keys::ZOOM, defaults.transform.scale),
        layered.read_number(keys::X, defaults.transform.translate_x),
        layered.read_number(keys::Y, defaults.transform.translate_y),
    )
    .clamped();

    let selection = match query.get(params::SELECTED) {
        Some(raw) => SavedSelection::Indices(parse_indices(raw)),
        None => match storage.get(keys::SELECTED_REGIONS).map(|raw| serde_json::from_str::<Vec<String>>(&raw)) {
            Some(Ok(saved)) => SavedSelection::Keys(saved),
            Some(Err(e)) => {
                warn!(error = %e, "stored region selection unreadable; selecting all");
                SavedSelection::Indices(defaults.selected.clone())
            }
            None => SavedSelection::Indices(defaults.selected.clone()),
        },
    };

    let icons = match query.get(params::ICONS) {
        Some(raw) => decode_icons(raw).unwrap_or_else(|e| {
            warn!(error = %e, "failed to decode icons from link; starting with none");
            Vec::new()
        }),
        None => Vec::new(),
    };

    let state = PersistedViewState {
        planet: layered.read_text(keys::PLANET).unwrap_or(defaults.planet),
        region: layered.read(keys::REGION, defaults.region),
        terrain: layered.read_flag(keys::TERRAIN, defaults.terrain),
        spawn: layered.read_flag(keys::SPAWN, defaults.spawn),
        north_up: layered.read_flag(keys::ROTATE, defaults.north_up),
        transform,
        selected: match &selection {
            SavedSelection::Indices(indices) => indices.clone(),
            SavedSelection::Keys(_) => defaults.selected,
        },
        icons,
    };

    RestoredView {
        state,
        selection,
        canvas: CanvasSize::new(
            canvas_dimension(query.get(params::WIDTH), DEFAULT_CANVAS_WIDTH),
            canvas_dimension(query.get(params::HEIGHT), DEFAULT_CANVAS_HEIGHT),
        ),
        embed: query.get(params::EMBED) == Some("1"),
        theme: storage
            .get(keys::THEME)
            .and_then(|raw| raw.parse::<Theme>().ok_or_log(keys::THEME, "storage"))
            .unwrap_or_default(),
    }
}

/// Query-then-storage field reader.
struct Layered<'a> {
    query: &'a QueryParams,
    storage: &'a dyn Storage,
}

impl Layered<'_> {
    fn read<T: FromStr>(&self, key: &str, default: T) -> T {
        self.read_where(key, |_: &T| true).unwrap_or(default)
    }

    /// Like [`Self::read`], but NaN and infinities also fall through.
    fn read_number(&self, key: &str, default: f64) -> f64 {
        self.read_where(key, |v: &f64| v.is_finite()).unwrap_or(default)
    }

    fn read_where<T: FromStr>(&self, key: &str, valid: impl Fn(&T) -> bool) -> Option<T> {
        let from_query = self
            .query
            .get(key)
            .and_then(|raw| raw.trim().parse::<T>().ok_or_log(key, "query"))
            .filter(&valid);
        from_query.or_else(|| {
            self.storage
                .get(key)
                .and_then(|raw| raw.trim().parse::<T>().ok_or_log(key, "storage"))
                .filter(&valid)
        })
    }

    fn read_flag(&self, key: &str, default: bool) -> bool {
        match (self.query.get(key), self.storage.get(key)) {
            (Some(raw), _) => raw == "1",
            (None, Some(raw)) => raw == "1",
            (None, None) => default,
        }
    }

    fn read_text(&self, key: &str) -> Option<String> {
        self.query
            .get(key)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
            .or_else(|| self.storage.get(key).filter(|v| !v.is_empty()))
    }
}

trait OkOrLog<T> {
    fn ok_or_log(self, key: &str, channel: &str) -> Option<T>;
}

impl<T, E> OkOrLog<T> for Result<T, E> {
    fn ok_or_log(self, key: &str, channel: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(_) => {
                debug!(key, channel, "unparseable view field; falling back");
                None
            }
        }
    }
}

fn canvas_dimension(raw: Option<&str>, default: f64) -> f64 {
    raw.and_then(|r| r.trim().parse::<u32>().ok_or_log("width/height", "query"))
        .filter(|v| *v > 0)
        .map_or(default, f64::from)
}

/// Split a dash-joined index list, skipping anything that is not an integer.
#[must_use]
pub fn parse_indices(raw: &str) -> Vec<usize> {
    raw.split('-')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok_or_log(params::SELECTED, "query"))
        .collect()
}

/// Percent-encode a marker list the way the browser viewer does.
#[must_use]
pub fn encode_icons(icons: &[IconMarker]) -> String {
    if icons.is_empty() {
        return String::new();
    }
    match serde_json::to_string(icons) {
        Ok(json) => utf8_percent_encode(&json, URI_COMPONENT).to_string(),
        Err(e) => {
            warn!(error = %e, "failed to encode icons; sharing without them");
            String::new()
        }
    }
}

/// Decode the `icons` parameter value (already form-decoded).
///
/// An empty value decodes to no markers.
///
/// # Errors
///
/// Returns [`MarkerDecodeError`] if the value is not percent-encoded JSON
/// describing a marker list.
pub fn decode_icons(raw: &str) -> Result<Vec<IconMarker>, MarkerDecodeError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let json = percent_decode_str(raw).decode_utf8()?;
    Ok(serde_json::from_str(&json)?)
}

/// Boolean flag as written to links and storage.
#[must_use]
pub fn flag(on: bool) -> &'static str {
    if on { "1" } else { "0" }
}

/// Zoom with two fraction digits.
#[must_use]
pub fn format_zoom(scale: f64) -> String {
    format!("{scale:.2}")
}

/// Translation rounded to the nearest integer.
#[must_use]
pub fn format_offset(offset: f64) -> String {
    // Adding zero turns -0 into 0.
    format!("{}", offset.round() + 0.0)
}
