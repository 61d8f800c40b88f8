#![allow(clippy::float_cmp)]

use std::path::Path as FsPath;

use serde_json::json;
use url::Url;

use super::*;
use crate::config::ServerConfig;

fn planet_file() -> String {
    let mining = json!({
        "type": "Topology",
        "arcs": [[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 0.0]]],
        "objects": { "data": { "type": "GeometryCollection", "geometries": [
            { "type": "Polygon", "arcs": [[0]], "properties": { "color_hex": "#aa0000", "name": "Basin" } },
            { "type": "Polygon", "arcs": [[0]], "properties": { "color_hex": "#00aa00", "name": "Shelf" } },
        ] } },
    });
    let empty = json!({ "type": "Topology", "arcs": [], "objects": { "data": { "type": "GeometryCollection", "geometries": [] } } });
    json!({ "mining": mining, "names": empty, "poi": empty, "start_locations": { "Base": [12.0, -30.0] } }).to_string()
}

fn state_in(dir: &FsPath) -> AppState {
    AppState::new(ServerConfig {
        port: 3000,
        data_dir: dir.to_path_buf(),
        public_base_url: Url::parse("https://maps.example/viewer/").expect("url"),
    })
}

fn data_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("lunar.json"), planet_file()).expect("write");
    dir
}

async fn view(state: &AppState, query: &str) -> ViewResponse {
    let Json(response) = resolve_view(State(state.clone()), RawQuery(Some(query.to_owned()))).await;
    response
}

// --- health ---

#[tokio::test]
async fn healthz_reports_ok() {
    assert_eq!(healthz().await, "ok");
}

// --- /api/view ---

#[tokio::test]
async fn resolve_view_applies_link() {
    let dir = data_dir();
    let state = state_in(dir.path());
    let icons = "%5B%7B%22type%22%3A%22player%22%2C%22position%22%3A%5B2000%2C0%2C-1000%5D%7D%5D";
    let response = view(&state, &format!("planet=lunar&selected=2&zoom=1&embed=1&icons={icons}")).await;

    assert_eq!(response.geography_error, None);
    assert!(response.embed);
    assert_eq!(response.view.selected, vec![2]);
    assert_eq!(response.regions.len(), 3);
    assert!(response.regions[2].checked);
    assert_eq!(response.icons.len(), 1);
    assert_eq!(response.icons[0].center, Point::new(800.0, 600.0));
    assert!(response.icons[0].visible);
    assert!(response.share_url.starts_with("https://maps.example/viewer/?planet=lunar"));
    assert_eq!(QueryParams::parse(&response.share_query).get("selected"), Some("2"));
}

#[tokio::test]
async fn resolve_view_canonicalizes_out_of_range_selection() {
    let dir = data_dir();
    let state = state_in(dir.path());
    let response = view(&state, "selected=1-9").await;
    assert_eq!(response.view.selected, vec![1]);
}

#[tokio::test]
async fn resolve_view_without_query_uses_defaults() {
    let dir = data_dir();
    let state = state_in(dir.path());
    let Json(response) = resolve_view(State(state), RawQuery(None)).await;
    assert_eq!(response.view.planet, "lunar");
    assert_eq!(response.canvas, CanvasSize::new(800.0, 800.0));
    assert_eq!(response.view.selected, vec![0]);
}

#[tokio::test]
async fn resolve_view_reports_missing_geography() {
    let dir = data_dir();
    let state = state_in(dir.path());
    let response = view(&state, "planet=vulcan&zoom=3").await;
    assert!(response.geography_error.is_some());
    assert_eq!(response.view.planet, "vulcan");
    assert_eq!(response.view.transform.scale, 3.0);
    assert_eq!(response.regions.len(), 1);
}

// --- /api/planets ---

#[tokio::test]
async fn region_options_lists_categories_and_spawns() {
    let dir = data_dir();
    let state = state_in(dir.path());
    let Json(response) = region_options(State(state), Path(("lunar".into(), "mining".into())))
        .await
        .expect("options");
    assert_eq!(response.feature_count, 2);
    let labels: Vec<_> = response.options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, ["All", "Basin", "Shelf"]);
    assert_eq!(response.spawns.len(), 1);
    assert_eq!(response.spawns[0].name, "Base");
}

#[tokio::test]
async fn region_options_rejects_bad_input() {
    let dir = data_dir();
    let state = state_in(dir.path());
    let status = region_options(State(state.clone()), Path(("lunar".into(), "lakes".into())))
        .await
        .expect_err("bad region");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let status = region_options(State(state.clone()), Path(("vulcan".into(), "poi".into())))
        .await
        .expect_err("missing planet");
    assert_eq!(status, StatusCode::NOT_FOUND);
    let status = region_options(State(state), Path(("..".into(), "poi".into())))
        .await
        .expect_err("invalid planet");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn planets_are_cached_after_first_load() {
    let dir = data_dir();
    let state = state_in(dir.path());
    state.planet("lunar").await.expect("first load");
    std::fs::remove_file(dir.path().join("lunar.json")).expect("remove");
    let data = state.planet("lunar").await.expect("cached");
    assert_eq!(data.mining.len(), 2);
}

#[test]
fn geography_errors_map_to_statuses() {
    assert_eq!(geography_error_to_status(&GeographyError::InvalidPlanet("..".into())), StatusCode::BAD_REQUEST);
    assert_eq!(geography_error_to_status(&GeographyError::NotFound("x".into())), StatusCode::NOT_FOUND);
    assert_eq!(
        geography_error_to_status(&GeographyError::MissingCollection("poi")),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
