#![allow(clippy::float_cmp)]

use rand::Rng;

use super::*;
use crate::icons::IconKind;
use crate::storage::MemoryStorage;

fn restore_query(query: &str) -> RestoredView {
    restore(&QueryParams::parse(query), &MemoryStorage::new())
}

fn storage_with(entries: &[(&str, &str)]) -> MemoryStorage {
    let mut storage = MemoryStorage::new();
    for (k, v) in entries {
        storage.set(k, v).expect("set");
    }
    storage
}

// --- scenario: restore from link ---

#[test]
fn restore_from_link_scenario() {
    let restored = restore_query("terrain=0&spawn=1&rotate=1&zoom=2.50&x=10&y=-5&selected=1-3");
    let state = &restored.state;
    assert!(!state.terrain);
    assert!(state.spawn);
    assert!(state.north_up);
    assert_eq!(state.transform, ViewTransform::new(2.5, 10.0, -5.0));
    assert_eq!(state.selected, vec![1, 3]);
    assert_eq!(restored.selection, SavedSelection::Indices(vec![1, 3]));
}

// --- defaults ---

#[test]
fn empty_query_and_storage_yield_defaults() {
    let restored = restore_query("");
    assert_eq!(restored.state, PersistedViewState::default());
    assert_eq!(restored.selection, SavedSelection::Indices(vec![0]));
    assert_eq!(restored.canvas, CanvasSize::new(800.0, 800.0));
    assert!(!restored.embed);
    assert_eq!(restored.theme, Theme::Dark);
}

// --- precedence ---

#[test]
fn storage_fills_fields_missing_from_query() {
    let storage = storage_with(&[("zoom", "3.00"), ("planet", "mars"), ("x", "40"), ("rotate", "1")]);
    let restored = restore(&QueryParams::parse("planet=vulcan&x=7"), &storage);
    assert_eq!(restored.state.planet, "vulcan");
    assert_eq!(restored.state.transform, ViewTransform::new(3.0, 7.0, 0.0));
    assert!(restored.state.north_up);
}

#[test]
fn malformed_query_number_falls_back_to_storage() {
    let storage = storage_with(&[("zoom", "4.25")]);
    let restored = restore(&QueryParams::parse("zoom=abc&y=NaN"), &storage);
    assert_eq!(restored.state.transform.scale, 4.25);
    assert_eq!(restored.state.transform.translate_y, 0.0);
}

#[test]
fn malformed_everywhere_falls_back_to_default() {
    let storage = storage_with(&[("zoom", "big")]);
    let restored = restore(&QueryParams::parse("zoom=huge"), &storage);
    assert_eq!(restored.state.transform.scale, 1.0);
}

#[test]
fn out_of_range_zoom_is_clamped() {
    assert_eq!(restore_query("zoom=250").state.transform.scale, 100.0);
    assert_eq!(restore_query("zoom=0.2").state.transform.scale, 1.0);
}

#[test]
fn unknown_region_falls_back() {
    let storage = storage_with(&[("region", "poi")]);
    let restored = restore(&QueryParams::parse("region=lakes"), &storage);
    assert_eq!(restored.state.region, RegionType::Poi);
}

#[test]
fn stored_selection_keys_are_used_without_link_selection() {
    let storage = storage_with(&[("selectedRegions", r##"["#ff0000","#0000ff"]"##)]);
    let restored = restore(&QueryParams::default(), &storage);
    assert_eq!(restored.selection, SavedSelection::Keys(vec!["#ff0000".into(), "#0000ff".into()]));
}

#[test]
fn link_selection_beats_stored_keys() {
    let storage = storage_with(&[("selectedRegions", r##"["#ff0000"]"##)]);
    let restored = restore(&QueryParams::parse("selected=2"), &storage);
    assert_eq!(restored.selection, SavedSelection::Indices(vec![2]));
}

#[test]
fn corrupt_stored_selection_selects_all() {
    let storage = storage_with(&[("selectedRegions", "{oops")]);
    let restored = restore(&QueryParams::default(), &storage);
    assert_eq!(restored.selection, SavedSelection::Indices(vec![0]));
}

#[test]
fn empty_selected_means_all() {
    let restored = restore_query("selected=");
    assert_eq!(restored.selection, SavedSelection::Indices(Vec::new()));
}

#[test]
fn theme_comes_from_storage() {
    let storage = storage_with(&[("theme", "light")]);
    assert_eq!(restore(&QueryParams::default(), &storage).theme, Theme::Light);
}

// --- presentation ---

#[test]
fn embed_and_canvas_size_come_from_query() {
    let restored = restore_query("embed=1&width=1024&height=600");
    assert!(restored.embed);
    assert_eq!(restored.canvas, CanvasSize::new(1024.0, 600.0));
}

#[test]
fn invalid_canvas_size_uses_default() {
    let restored = restore_query("width=0&height=wide");
    assert_eq!(restored.canvas, CanvasSize::new(800.0, 800.0));
}

// --- icons ---

#[test]
fn browser_encoded_icons_decode() {
    // encodeURIComponent('[{"type":"player","position":[1,2,3]}]'), then URLSearchParams
    let query = "icons=%255B%257B%2522type%2522%253A%2522player%2522%252C%2522position%2522%253A%255B1%252C2%252C3%255D%257D%255D";
    let restored = restore_query(query);
    assert_eq!(restored.state.icons.len(), 1);
    assert_eq!(restored.state.icons[0].kind, IconKind::Player);
    assert_eq!(restored.state.icons[0].position, [1.0, 2.0, 3.0]);
}

#[test]
fn undecodable_icons_reset_to_empty_without_failing_restore() {
    let restored = restore_query("icons=%5Bnot-json&zoom=5.00&spawn=1");
    assert!(restored.state.icons.is_empty());
    assert_eq!(restored.state.transform.scale, 5.0);
    assert!(restored.state.spawn);
}

#[test]
fn decode_icons_reports_bad_json() {
    let err = decode_icons("%7B%7D").expect_err("object is not a list");
    assert!(matches!(err, MarkerDecodeError::Json(_)));
}

#[test]
fn empty_icons_value_decodes_to_none() {
    assert_eq!(decode_icons("").expect("empty"), Vec::new());
}

// --- encoding ---

#[test]
fn query_contains_every_field() {
    let query = PersistedViewState::default().to_query();
    for key in ["planet", "region", "terrain", "spawn", "zoom", "x", "y", "selected", "rotate", "icons"] {
        assert!(query.contains(&format!("{key}=")), "{key} missing from {query}");
    }
}

#[test]
fn numeric_fields_are_rounded() {
    let state = PersistedViewState {
        transform: ViewTransform::new(2.345_678, 10.6, -5.4),
        ..PersistedViewState::default()
    };
    let query = QueryParams::parse(&state.to_query());
    assert_eq!(query.get("zoom"), Some("2.35"));
    assert_eq!(query.get("x"), Some("11"));
    assert_eq!(query.get("y"), Some("-5"));
}

#[test]
fn negative_zero_offset_formats_as_zero() {
    assert_eq!(format_offset(-0.3), "0");
    assert_eq!(format_zoom(2.5), "2.50");
}

#[test]
fn share_url_replaces_query_and_fragment() {
    let base = Url::parse("https://maps.example/viewer/?old=1#frag").expect("url");
    let url = PersistedViewState::default().share_url(&base);
    assert_eq!(url.path(), "/viewer/");
    assert_eq!(url.fragment(), None);
    let params = QueryParams::parse(url.query().unwrap_or_default());
    assert_eq!(params.get("old"), None);
    assert_eq!(params.get("planet"), Some("lunar"));
}

#[test]
fn query_params_first_occurrence_wins() {
    let params = QueryParams::parse("?zoom=2&zoom=3");
    assert_eq!(params.get("zoom"), Some("2"));
}

// --- round trip ---

fn random_state(rng: &mut impl Rng) -> PersistedViewState {
    let planets = ["lunar", "mars", "europa", "vulcan", "venus"];
    let regions = RegionType::ALL;
    let icon_count = rng.random_range(0..=5);
    let icons = (0..icon_count)
        .map(|_| IconMarker {
            kind: if rng.random_bool(0.5) { IconKind::Player } else { IconKind::Autolathe },
            position: [
                f64::from(rng.random_range(-8000..=8000)) / 4.0,
                f64::from(rng.random_range(-400..=400)),
                f64::from(rng.random_range(-8000..=8000)) / 4.0,
            ],
            size: if rng.random_bool(0.5) { Some(f64::from(rng.random_range(8..=64))) } else { None },
        })
        .collect();
    let selected_len = rng.random_range(0..=4);
    PersistedViewState {
        planet: planets[rng.random_range(0..planets.len())].to_owned(),
        region: regions[rng.random_range(0..regions.len())],
        terrain: rng.random_bool(0.5),
        spawn: rng.random_bool(0.5),
        north_up: rng.random_bool(0.5),
        transform: ViewTransform::new(
            rng.random_range(1.0..=100.0),
            rng.random_range(-20_000.0..20_000.0),
            rng.random_range(-20_000.0..20_000.0),
        ),
        selected: (0..selected_len).map(|_| rng.random_range(0..12)).collect(),
        icons,
    }
}

#[test]
fn encode_then_restore_preserves_state_within_rounding() {
    let mut rng = rand::rng();
    for _ in 0..300 {
        let state = random_state(&mut rng);
        let restored = restore_query(&state.to_query()).state;
        assert_eq!(restored.planet, state.planet);
        assert_eq!(restored.region, state.region);
        assert_eq!(restored.terrain, state.terrain);
        assert_eq!(restored.spawn, state.spawn);
        assert_eq!(restored.north_up, state.north_up);
        assert_eq!(restored.selected, state.selected);
        assert_eq!(restored.icons, state.icons);
        assert!((restored.transform.scale - state.transform.scale).abs() <= 0.005 + 1e-9);
        assert_eq!(restored.transform.translate_x, state.transform.translate_x.round() + 0.0);
        assert_eq!(restored.transform.translate_y, state.transform.translate_y.round() + 0.0);
    }
}
