//! Router assembly and HTTP handlers.
//!
//! The service exposes the planet data directory and resolves share links
//! without a browser: `/api/view` runs the link through the same [`Viewer`]
//! the client uses, with a renderer that draws nothing.

#[cfg(test)]
#[path = "routes_test.rs"]
mod routes_test;

use axum::Router;
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::camera::{Point, ViewTransform};
use crate::coords::CanvasSize;
use crate::engine::Viewer;
use crate::geo::{GeographyError, RegionFeature, RegionType, SpawnPoint};
use crate::icons::IconPlacement;
use crate::persist::{PersistedViewState, QueryParams, restore};
use crate::render::Renderer;
use crate::selection::{RegionOption, RegionSelectionState};
use crate::state::AppState;
use crate::storage::MemoryStorage;

/// Full service router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let data = ServeDir::new(&state.config.data_dir);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/view", get(resolve_view))
        .route("/api/planets/{planet}/{region}", get(region_options))
        .nest_service("/data", data)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// HTTP status for a geography failure.
pub(crate) fn geography_error_to_status(err: &GeographyError) -> StatusCode {
    match err {
        GeographyError::InvalidPlanet(_) => StatusCode::BAD_REQUEST,
        GeographyError::NotFound(_) => StatusCode::NOT_FOUND,
        GeographyError::Fetch(_)
        | GeographyError::Parse(_)
        | GeographyError::MissingCollection(_)
        | GeographyError::BadArc(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// =============================================================================
// VIEW RESOLUTION
// =============================================================================

/// Renderer for server-side resolution; positions are reported, not drawn.
struct HeadlessRenderer;

impl Renderer for HeadlessRenderer {
    fn draw_regions(&mut self, _: &[RegionFeature], _: &[bool], _: ViewTransform, _: f64) {}
    fn draw_spawns(&mut self, _: &[(SpawnPoint, Point)], _: ViewTransform, _: bool) {}
    fn set_terrain_visible(&mut self, _: bool) {}
    fn draw_compass(&mut self, _: bool) {}
    fn clear_markers(&mut self) {}
    fn place_marker(&mut self, _: usize, _: &IconPlacement) {}

    fn pointer_position(&self) -> Option<Point> {
        None
    }
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub view: PersistedViewState,
    pub canvas: CanvasSize,
    pub embed: bool,
    /// Canonical query string for the resolved view.
    pub share_query: String,
    pub share_url: String,
    pub icons: Vec<IconPlacement>,
    pub regions: Vec<RegionOption>,
    /// Set when the planet's geography could not be loaded; the view is
    /// still resolved, without region options.
    pub geography_error: Option<String>,
}

/// `GET /api/view?<share query>`: restore a share link and report the
/// resulting view, marker placements and region filter.
pub async fn resolve_view(State(state): State<AppState>, RawQuery(query): RawQuery) -> Json<ViewResponse> {
    let params = QueryParams::parse(query.as_deref().unwrap_or_default());
    let restored = restore(&params, &MemoryStorage::new());
    let (canvas, embed) = (restored.canvas, restored.embed);
    let (mut viewer, request) = Viewer::start(restored, HeadlessRenderer, MemoryStorage::new());

    let result = state.planet(&request.planet).await.map(|data| (*data).clone());
    let geography_error = match viewer.complete_load(request, result) {
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "share link references unavailable geography");
            Some(e.to_string())
        }
    };

    Json(ViewResponse {
        view: viewer.snapshot(),
        canvas,
        embed,
        share_query: viewer.share_query(),
        share_url: viewer.share_link(&state.config.public_base_url).to_string(),
        icons: viewer.placements().to_vec(),
        regions: viewer.region_options(),
        geography_error,
    })
}

// =============================================================================
// REGION OPTIONS
// =============================================================================

#[derive(Debug, Serialize)]
pub struct RegionOptionsResponse {
    pub planet: String,
    pub region: RegionType,
    pub feature_count: usize,
    pub options: Vec<RegionOption>,
    pub spawns: Vec<SpawnPoint>,
}

/// `GET /api/planets/{planet}/{region}`: selectable categories of one
/// region layer plus the planet's spawn points.
pub async fn region_options(
    State(state): State<AppState>,
    Path((planet, region)): Path<(String, String)>,
) -> Result<Json<RegionOptionsResponse>, StatusCode> {
    let region = region.parse::<RegionType>().map_err(|e| {
        warn!(%planet, error = %e, "rejected region options request");
        StatusCode::BAD_REQUEST
    })?;
    let data = state.planet(&planet).await.map_err(|e| {
        warn!(%planet, error = %e, "failed to load planet for region options");
        geography_error_to_status(&e)
    })?;

    let features = data.regions(region);
    let mut selection = RegionSelectionState::new();
    selection.rebuild(features);

    Ok(Json(RegionOptionsResponse {
        planet,
        region,
        feature_count: features.len(),
        options: selection.options(),
        spawns: data.spawns.clone(),
    }))
}
