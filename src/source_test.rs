use serde_json::json;

use super::*;

fn planet_file() -> String {
    let topo = json!({
        "type": "Topology",
        "arcs": [[[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 0.0]]],
        "objects": { "data": { "type": "GeometryCollection", "geometries": [
            { "type": "Polygon", "arcs": [[0]], "properties": { "color_hex": "#aa0000", "name": "Basin" } },
        ] } },
    });
    json!({ "mining": topo, "names": topo, "poi": topo, "start_locations": { "Base": [12.0, -30.0] } }).to_string()
}

// --- planet ids ---

#[test]
fn planet_ids_are_restricted() {
    for ok in ["lunar", "mars_2", "europa-b", "X1"] {
        assert!(validate_planet_id(ok).is_ok(), "{ok}");
    }
    for bad in ["", "../secrets", "a/b", "moon.json", "luna?x=1", "ma rs"] {
        assert!(matches!(validate_planet_id(bad), Err(GeographyError::InvalidPlanet(_))), "{bad}");
    }
}

// --- filesystem ---

#[tokio::test]
async fn fs_source_reads_planet_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("lunar.json"), planet_file()).expect("write");
    let data = FsGeographySource::new(dir.path()).fetch("lunar").await.expect("fetch");
    assert_eq!(data.mining.len(), 1);
    assert_eq!(data.mining[0].name, "Basin");
    assert_eq!(data.spawns.len(), 1);
}

#[tokio::test]
async fn fs_source_reports_missing_planet() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = FsGeographySource::new(dir.path()).fetch("vulcan").await.expect_err("missing");
    assert!(matches!(err, GeographyError::NotFound(ref p) if p == "vulcan"));
}

#[tokio::test]
async fn fs_source_reports_malformed_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("mars.json"), r#"{"mining": 3}"#).expect("write");
    let err = FsGeographySource::new(dir.path()).fetch("mars").await.expect_err("malformed");
    assert!(matches!(err, GeographyError::Parse(_)));
}

#[tokio::test]
async fn fs_source_rejects_traversal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = FsGeographySource::new(dir.path()).fetch("../lunar").await.expect_err("invalid");
    assert!(matches!(err, GeographyError::InvalidPlanet(_)));
}

// --- http ---

#[test]
fn http_source_resolves_planet_under_base() {
    let base = Url::parse("https://maps.example/data/").expect("url");
    let source = HttpGeographySource::new(reqwest::Client::new(), base);
    assert_eq!(source.url_for("lunar").expect("url").as_str(), "https://maps.example/data/lunar.json");
    assert!(matches!(source.url_for("../etc"), Err(GeographyError::InvalidPlanet(_))));
}

/// Serve `/data/lunar.json`, a failing `/data/broken.json` and a garbled
/// `/data/garbled.json` on an ephemeral local port. Returns the data base URL.
async fn serve_planets() -> Url {
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;

    let app = Router::new()
        .route("/data/lunar.json", get(|| async { planet_file() }))
        .route("/data/broken.json", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/data/garbled.json", get(|| async { "{not json" }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move { axum::serve(listener, app).await });
    Url::parse(&format!("http://{addr}/data/")).expect("url")
}

#[tokio::test]
async fn http_source_fetches_and_decodes_planet() {
    let source = HttpGeographySource::new(reqwest::Client::new(), serve_planets().await);
    let data = source.fetch("lunar").await.expect("fetch");
    assert_eq!(data.mining[0].color_key.as_deref(), Some("#aa0000"));
    assert_eq!(data.spawns[0].name, "Base");
}

#[tokio::test]
async fn http_source_maps_response_failures() {
    let source = HttpGeographySource::new(reqwest::Client::new(), serve_planets().await);
    assert!(matches!(source.fetch("vulcan").await, Err(GeographyError::NotFound(ref p)) if p == "vulcan"));
    assert!(matches!(source.fetch("broken").await, Err(GeographyError::Fetch(_))));
    assert!(matches!(source.fetch("garbled").await, Err(GeographyError::Parse(_))));
    assert!(matches!(source.fetch("../lunar").await, Err(GeographyError::InvalidPlanet(_))));
}
