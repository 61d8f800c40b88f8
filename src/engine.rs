//! The viewer controller.
//!
//! [`Viewer`] owns the single [`ViewState`] and every component that derives
//! from it. All mutation goes through [`Viewer::dispatch`]: the owning
//! component updates its piece of state, markers and the renderer are
//! refreshed before `dispatch` returns, and the changed fields are written
//! through to storage. Anything that needs the host (fetching geography,
//! restyling for a theme) comes back as an [`Action`].

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use tracing::{debug, info, warn};
use url::Url;

use crate::camera::{Point, TransformStore, ViewTransform};
use crate::consts::{REGION_OPACITY_LAYERED, REGION_OPACITY_SOLO};
use crate::coords::{CanvasSize, CoordinateMapper, Orientation, WorldReadout};
use crate::geo::{GeographyError, PlanetData, RegionFeature, RegionType};
use crate::icons::{self, IconMarker, IconPlacement};
use crate::persist::{self, PersistedViewState, RestoredView, SavedSelection, Theme};
use crate::render::{Clipboard, ClipboardError, Renderer};
use crate::selection::{RegionOption, RegionSelectionState};
use crate::source::GeographySource;
use crate::storage::{Storage, keys};

/// User intents and restored settings, applied in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetTransform(ViewTransform),
    ZoomAt { anchor: Point, factor: f64 },
    PanBy { dx: f64, dy: f64 },
    ResetTransform,
    Resize(CanvasSize),
    SelectPlanet(String),
    SelectRegionType(RegionType),
    /// Toggle one region option by colour key (`"all"` for the sentinel).
    ToggleRegion(String),
    SetTerrainVisible(bool),
    SetSpawnVisible(bool),
    SetNorthUp(bool),
    PlaceIcon(IconMarker),
    SetIcons(Vec<IconMarker>),
    ClearIcons,
    ToggleTheme,
}

/// Work the host must perform after a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Fetch geography and hand the result to [`Viewer::complete_load`].
    FetchGeography(LoadRequest),
    /// Restyle the page for the new theme.
    ThemeChanged(Theme),
}

/// An issued geography fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    /// Monotonic id; only the latest issued request may apply.
    pub generation: u64,
    pub planet: String,
    /// Mirror the geometry before applying it.
    pub north_up: bool,
    /// Region filter to reapply once the options are rebuilt.
    pub selection: SavedSelection,
}

/// What [`Viewer::complete_load`] did with a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer request was issued after this one; the result was discarded.
    Stale,
}

/// Errors surfaced by the viewer.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// The latest geography request failed. The planet id is not rolled
    /// back and the previous geography stays on screen.
    #[error("failed to load geography for {planet}: {source}")]
    GeographyLoad {
        planet: String,
        #[source]
        source: GeographyError,
    },
}

/// Fields of the view that are not owned by a dedicated component.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub planet: String,
    pub region: RegionType,
    pub terrain: bool,
    pub spawn: bool,
    pub orientation: Orientation,
    pub canvas: CanvasSize,
    pub icons: Vec<IconMarker>,
    pub theme: Theme,
    /// Chromeless presentation requested by the link.
    pub embed: bool,
}

/// A share link and the outcome of copying it.
#[derive(Debug)]
pub struct SharedLink {
    pub url: Url,
    /// Set when the clipboard rejected the link; the link is still valid.
    pub copy_error: Option<ClipboardError>,
}

/// The map viewer: view state plus the components derived from it.
pub struct Viewer<R: Renderer, S: Storage> {
    state: ViewState,
    transform: TransformStore,
    selection: RegionSelectionState,
    geography: Option<PlanetData>,
    placements: Vec<IconPlacement>,
    /// Last issued load generation.
    generation: u64,
    pending: Option<LoadRequest>,
    /// Region filter waiting for an option list to resolve against. Kept
    /// current by edits made while a load is pending and kept across failed
    /// loads; cleared once a load applies it.
    unresolved: Option<SavedSelection>,
    renderer: R,
    storage: S,
}

impl<R: Renderer, S: Storage> Viewer<R, S> {
    /// Build a viewer from a restored view and issue the initial load.
    ///
    /// Nothing is written to storage here; restoration only reads.
    pub fn start(restored: RestoredView, renderer: R, storage: S) -> (Self, LoadRequest) {
        let RestoredView { state: persisted, selection, canvas, embed, theme } = restored;
        let mut transform = TransformStore::new();
        transform.set(persisted.transform);
        let mut viewer = Self {
            state: ViewState {
                planet: persisted.planet,
                region: persisted.region,
                terrain: persisted.terrain,
                spawn: persisted.spawn,
                orientation: Orientation::from_north_up(persisted.north_up),
                canvas,
                icons: persisted.icons,
                theme,
                embed,
            },
            transform,
            selection: RegionSelectionState::new(),
            geography: None,
            placements: Vec::new(),
            generation: 0,
            pending: None,
            unresolved: None,
            renderer,
            storage,
        };
        viewer.redraw_all();
        let request = viewer.issue_load(selection);
        info!(
            planet = %viewer.state.planet,
            region = %viewer.state.region,
            north_up = viewer.state.orientation.is_north_up(),
            embed,
            "viewer started"
        );
        (viewer, request)
    }

    // --- Commands ---

    /// Apply one command and return the host work it requires.
    pub fn dispatch(&mut self, command: Command) -> Vec<Action> {
        match command {
            Command::SetTransform(next) => {
                self.transform.set(next);
                self.transform_changed();
            }
            Command::ZoomAt { anchor, factor } => {
                self.transform.zoom_at(anchor, factor);
                self.transform_changed();
            }
            Command::PanBy { dx, dy } => {
                self.transform.pan_by(dx, dy);
                self.transform_changed();
            }
            Command::ResetTransform => {
                self.transform.reset();
                self.transform_changed();
            }
            Command::Resize(canvas) => {
                let usable = |v: f64| v.is_finite() && v > 0.0;
                if !usable(canvas.width) || !usable(canvas.height) {
                    warn!(width = canvas.width, height = canvas.height, "ignoring unusable canvas size");
                    return Vec::new();
                }
                self.state.canvas = canvas;
                self.redraw_regions();
                self.redraw_spawns();
                self.redraw_markers();
            }
            Command::SelectPlanet(planet) => return self.select_planet(planet),
            Command::SelectRegionType(region) => self.select_region_type(region),
            Command::ToggleRegion(key) => {
                self.selection.toggle(&key);
                self.track_unresolved();
                self.redraw_regions();
                self.write_selection();
            }
            Command::SetTerrainVisible(visible) => {
                self.state.terrain = visible;
                self.renderer.set_terrain_visible(visible);
                self.redraw_regions();
                self.write(keys::TERRAIN, persist::flag(visible));
            }
            Command::SetSpawnVisible(visible) => {
                self.state.spawn = visible;
                self.redraw_regions();
                self.redraw_spawns();
                self.write(keys::SPAWN, persist::flag(visible));
            }
            Command::SetNorthUp(north_up) => return self.set_north_up(north_up),
            Command::PlaceIcon(icon) => {
                let placement = icons::place(&icon, &self.transform.current(), &self.mapper());
                self.renderer.place_marker(self.placements.len(), &placement);
                self.placements.push(placement);
                self.state.icons.push(icon);
            }
            Command::SetIcons(markers) => {
                self.state.icons = markers;
                self.redraw_markers();
            }
            Command::ClearIcons => {
                self.state.icons.clear();
                self.redraw_markers();
            }
            Command::ToggleTheme => {
                self.state.theme = self.state.theme.toggled();
                self.write(keys::THEME, self.state.theme.as_str());
                return vec![Action::ThemeChanged(self.state.theme)];
            }
        }
        Vec::new()
    }

    /// Switching planets resets the camera and the region filter.
    fn select_planet(&mut self, planet: String) -> Vec<Action> {
        self.state.planet = planet;
        self.transform.reset();
        self.transform_changed();
        let planet = self.state.planet.clone();
        self.write(keys::PLANET, &planet);
        self.write(keys::SELECTED_REGIONS, "[]");
        vec![Action::FetchGeography(self.issue_load(SavedSelection::Indices(vec![0])))]
    }

    /// Switching region layers rebuilds the options and selects all.
    fn select_region_type(&mut self, region: RegionType) {
        self.state.region = region;
        self.rebuild_selection();
        self.track_unresolved();
        self.redraw_regions();
        self.write(keys::REGION, region.as_str());
        self.write_selection();
    }

    /// Flip orientation: markers move now, mirrored geometry follows the reload.
    fn set_north_up(&mut self, north_up: bool) -> Vec<Action> {
        self.state.orientation = Orientation::from_north_up(north_up);
        self.write(keys::ROTATE, persist::flag(north_up));
        self.renderer.draw_compass(north_up);
        self.redraw_spawns();
        self.redraw_markers();
        let selection =
            self.unresolved.clone().unwrap_or_else(|| SavedSelection::Keys(self.selection.saved_keys()));
        vec![Action::FetchGeography(self.issue_load(selection))]
    }

    // --- Geography loads ---

    fn issue_load(&mut self, selection: SavedSelection) -> LoadRequest {
        self.generation += 1;
        let request = LoadRequest {
            generation: self.generation,
            planet: self.state.planet.clone(),
            north_up: self.state.orientation.is_north_up(),
            selection,
        };
        debug!(generation = request.generation, planet = %request.planet, "issued geography load");
        self.pending = Some(request.clone());
        self.unresolved = Some(request.selection.clone());
        request
    }

    /// Record a filter edit against the selection a pending load will apply.
    fn track_unresolved(&mut self) {
        if self.unresolved.is_some() {
            self.unresolved = Some(SavedSelection::Keys(self.selection.saved_keys()));
        }
    }

    /// Apply the result of a fetch issued by [`Action::FetchGeography`].
    ///
    /// # Errors
    ///
    /// Returns [`ViewerError::GeographyLoad`] if the latest request failed.
    /// Failures of superseded requests are reported as [`LoadOutcome::Stale`].
    pub fn complete_load(
        &mut self,
        request: LoadRequest,
        result: Result<PlanetData, GeographyError>,
    ) -> Result<LoadOutcome, ViewerError> {
        if request.generation != self.generation {
            debug!(
                generation = request.generation,
                latest = self.generation,
                planet = %request.planet,
                "discarding stale geography load"
            );
            return Ok(LoadOutcome::Stale);
        }
        self.pending = None;

        let mut data = result.map_err(|source| {
            warn!(planet = %request.planet, error = %source, "geography load failed");
            ViewerError::GeographyLoad { planet: request.planet.clone(), source }
        })?;
        if request.north_up {
            data.mirror();
        }
        info!(
            planet = %request.planet,
            generation = request.generation,
            mining = data.mining.len(),
            names = data.names.len(),
            poi = data.poi.len(),
            spawns = data.spawns.len(),
            "geography loaded"
        );
        self.geography = Some(data);
        self.rebuild_selection();
        let selection = self.unresolved.take().unwrap_or(request.selection);
        match &selection {
            SavedSelection::Indices(indices) => self.selection.apply_indices(indices),
            SavedSelection::Keys(saved) => self.selection.apply_keys(saved.iter().map(String::as_str)),
        }
        self.redraw_all();
        Ok(LoadOutcome::Applied)
    }

    /// Fetch `request` from `source` and apply it.
    ///
    /// # Errors
    ///
    /// See [`Viewer::complete_load`].
    pub async fn load_with<G: GeographySource>(
        &mut self,
        source: &G,
        request: LoadRequest,
    ) -> Result<LoadOutcome, ViewerError> {
        let result = source.fetch(&request.planet).await;
        self.complete_load(request, result)
    }

    fn rebuild_selection(&mut self) {
        let features = self.geography.as_ref().map_or(&[][..], |g| g.regions(self.state.region));
        self.selection.rebuild(features);
    }

    // --- Redraw ---

    fn transform_changed(&mut self) {
        let t = self.transform.current();
        self.redraw_regions();
        self.redraw_spawns();
        self.redraw_markers();
        self.write(keys::ZOOM, &persist::format_zoom(t.scale));
        self.write(keys::X, &persist::format_offset(t.translate_x));
        self.write(keys::Y, &persist::format_offset(t.translate_y));
    }

    fn redraw_all(&mut self) {
        self.renderer.set_terrain_visible(self.state.terrain);
        self.renderer.draw_compass(self.state.orientation.is_north_up());
        self.redraw_regions();
        self.redraw_spawns();
        self.redraw_markers();
    }

    fn redraw_regions(&mut self) {
        let opacity = self.region_opacity();
        let transform = self.transform.current();
        let features: &[RegionFeature] = self.geography.as_ref().map_or(&[], |g| g.regions(self.state.region));
        let visible = self.selection.visibility(features);
        self.renderer.draw_regions(features, &visible, transform, opacity);
    }

    fn redraw_spawns(&mut self) {
        let mapper = self.mapper();
        let spawns: Vec<_> = self
            .geography
            .as_ref()
            .map(|g| g.spawns.iter().map(|s| (s.clone(), mapper.world_to_local(s.world))).collect())
            .unwrap_or_default();
        self.renderer.draw_spawns(&spawns, self.transform.current(), self.state.spawn);
    }

    fn redraw_markers(&mut self) {
        self.placements = icons::reposition(&self.state.icons, &self.transform.current(), &self.mapper());
        self.renderer.clear_markers();
        for (i, placement) in self.placements.iter().enumerate() {
            self.renderer.place_marker(i, placement);
        }
    }

    /// Regions are translucent when drawn over another layer.
    fn region_opacity(&self) -> f64 {
        if self.state.terrain || self.state.spawn { REGION_OPACITY_LAYERED } else { REGION_OPACITY_SOLO }
    }

    // --- Persistence ---

    fn write(&mut self, key: &str, value: &str) {
        if let Err(e) = self.storage.set(key, value) {
            warn!(key, error = %e, "failed to persist view field");
        }
    }

    fn write_selection(&mut self) {
        match serde_json::to_string(&self.selection.saved_keys()) {
            Ok(json) => self.write(keys::SELECTED_REGIONS, &json),
            Err(e) => warn!(error = %e, "failed to encode region selection"),
        }
    }

    /// Everything a share link carries, as of now.
    #[must_use]
    pub fn snapshot(&self) -> PersistedViewState {
        PersistedViewState {
            planet: self.state.planet.clone(),
            region: self.state.region,
            terrain: self.state.terrain,
            spawn: self.state.spawn,
            north_up: self.state.orientation.is_north_up(),
            transform: self.transform.current(),
            selected: self.selected_indices(),
            icons: self.state.icons.clone(),
        }
    }

    /// Link-channel selection. An unresolved link selection is shared as is.
    /// Unresolved storage keys cannot be indexed before an option list
    /// exists, so they share as the live filter (all, before any load).
    fn selected_indices(&self) -> Vec<usize> {
        match &self.unresolved {
            Some(SavedSelection::Indices(indices)) => indices.clone(),
            _ => self.selection.indices(),
        }
    }

    /// Query string of the current share link.
    #[must_use]
    pub fn share_query(&self) -> String {
        self.snapshot().to_query()
    }

    /// Share link for the current view, rooted at `base`.
    #[must_use]
    pub fn share_link(&self, base: &Url) -> Url {
        self.snapshot().share_url(base)
    }

    /// Build the share link and copy it. A clipboard failure is reported on
    /// the result but does not prevent sharing.
    pub fn share(&self, base: &Url, clipboard: &mut impl Clipboard) -> SharedLink {
        let url = self.share_link(base);
        let copy_error = match clipboard.write_text(url.as_str()) {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "failed to copy share link");
                Some(e)
            }
        };
        info!(%url, copied = copy_error.is_none(), "share link created");
        SharedLink { url, copy_error }
    }

    // --- Queries ---

    /// World coordinates under the pointer, if it is over the map.
    #[must_use]
    pub fn hover(&self) -> Option<WorldReadout> {
        let pointer = self.renderer.pointer_position()?;
        self.mapper().world_readout(pointer, &self.transform.current())
    }

    #[must_use]
    pub fn mapper(&self) -> CoordinateMapper {
        CoordinateMapper::new(self.state.canvas, self.state.orientation)
    }

    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    #[must_use]
    pub fn transform(&self) -> ViewTransform {
        self.transform.current()
    }

    /// Current marker placements, one per marker.
    #[must_use]
    pub fn placements(&self) -> &[IconPlacement] {
        &self.placements
    }

    /// Region filter options for the active layer.
    #[must_use]
    pub fn region_options(&self) -> Vec<RegionOption> {
        self.selection.options()
    }

    #[must_use]
    pub fn selection(&self) -> &RegionSelectionState {
        &self.selection
    }

    /// Loaded geography, mirrored when north-up.
    #[must_use]
    pub fn geography(&self) -> Option<&PlanetData> {
        self.geography.as_ref()
    }

    /// The request whose completion is awaited, if any.
    #[must_use]
    pub fn pending_load(&self) -> Option<&LoadRequest> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    #[must_use]
    pub fn storage(&self) -> &S {
        &self.storage
    }
}
