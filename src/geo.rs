//! Planet geography: region features, spawn points, and TopoJSON decoding.
//!
//! Each planet file bundles three topologies (`mining`, `names`, `poi`), each
//! holding its shapes under the object key `data`, plus a `start_locations`
//! map. Topologies are decoded into plain coordinate rings here so the rest of
//! the engine never sees arc indices or quantized deltas.

#[cfg(test)]
#[path = "geo_test.rs"]
mod geo_test;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coords::WorldPoint;

/// Name of the topology object holding a collection's shapes.
const DATA_OBJECT: &str = "data";

/// Errors from fetching or decoding a planet's geography.
#[derive(Debug, thiserror::Error)]
pub enum GeographyError {
    /// The planet id contains characters that cannot form a data path.
    #[error("invalid planet id: {0:?}")]
    InvalidPlanet(String),
    /// No data exists for the planet.
    #[error("no geography for planet {0}")]
    NotFound(String),
    /// Transport failure while fetching the planet file.
    #[error("geography fetch failed: {0}")]
    Fetch(String),
    /// The planet file is not valid JSON of the expected shape.
    #[error("geography parse failed: {0}")]
    Parse(#[from] serde_json::Error),
    /// A required topology collection is absent.
    #[error("missing collection {0:?}")]
    MissingCollection(&'static str),
    /// A geometry refers to an arc that does not exist.
    #[error("arc index {0} out of range")]
    BadArc(i64),
}

/// Mutually exclusive region overlay layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionType {
    #[default]
    Mining,
    Names,
    Poi,
}

impl RegionType {
    pub const ALL: [Self; 3] = [Self::Mining, Self::Names, Self::Poi];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mining => "mining",
            Self::Names => "names",
            Self::Poi => "poi",
        }
    }
}

impl fmt::Display for RegionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mining" => Ok(Self::Mining),
            "names" => Ok(Self::Names),
            "poi" => Ok(Self::Poi),
            other => Err(format!("unknown region type {other:?}")),
        }
    }
}

/// A linear ring or line, as `[x, y]` pairs in data coordinates.
pub type Line = Vec<[f64; 2]>;

/// Decoded shape of one feature.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point([f64; 2]),
    MultiPoint(Vec<[f64; 2]>),
    LineString(Line),
    MultiLineString(Vec<Line>),
    Polygon(Vec<Line>),
    MultiPolygon(Vec<Vec<Line>>),
    Empty,
}

impl Geometry {
    /// Negate every coordinate (mirror through the origin).
    pub fn mirror(&mut self) {
        fn flip(p: &mut [f64; 2]) {
            p[0] = -p[0];
            p[1] = -p[1];
        }
        match self {
            Self::Point(p) => flip(p),
            Self::MultiPoint(ps) | Self::LineString(ps) => ps.iter_mut().for_each(flip),
            Self::MultiLineString(lines) | Self::Polygon(lines) => {
                lines.iter_mut().flatten().for_each(flip);
            }
            Self::MultiPolygon(polys) => polys.iter_mut().flatten().flatten().for_each(flip),
            Self::Empty => {}
        }
    }
}

/// One region shape with its filter key and label.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionFeature {
    /// Filter key (`color_hex` in the data); `None` means always shown.
    pub color_key: Option<String>,
    pub name: String,
    pub geometry: Geometry,
}

/// A named starting location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpawnPoint {
    pub name: String,
    pub world: WorldPoint,
}

/// Decoded geography for one planet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanetData {
    pub mining: Vec<RegionFeature>,
    pub names: Vec<RegionFeature>,
    pub poi: Vec<RegionFeature>,
    pub spawns: Vec<SpawnPoint>,
}

impl PlanetData {
    /// Decode a planet file.
    ///
    /// # Errors
    ///
    /// Returns [`GeographyError`] if the JSON is malformed, a collection is
    /// missing, or a geometry references an unknown arc.
    pub fn from_json(raw: &str) -> Result<Self, GeographyError> {
        let file: PlanetFile = serde_json::from_str(raw)?;
        let collection = |name: &'static str, topo: Option<Topology>| {
            topo.ok_or(GeographyError::MissingCollection(name))?.features(DATA_OBJECT)
        };
        Ok(Self {
            mining: collection("mining", file.mining)?,
            names: collection("names", file.names)?,
            poi: collection("poi", file.poi)?,
            spawns: file
                .start_locations
                .into_iter()
                .map(|(name, [x, z])| SpawnPoint { name, world: WorldPoint::new(x, z) })
                .collect(),
        })
    }

    /// Features of one region layer.
    #[must_use]
    pub fn regions(&self, region: RegionType) -> &[RegionFeature] {
        match region {
            RegionType::Mining => &self.mining,
            RegionType::Names => &self.names,
            RegionType::Poi => &self.poi,
        }
    }

    /// Mirror all region geometry through the origin, for north-up display.
    ///
    /// Spawn points stay in world coordinates; the coordinate mapper flips
    /// them when projecting.
    pub fn mirror(&mut self) {
        for feature in self.mining.iter_mut().chain(&mut self.names).chain(&mut self.poi) {
            feature.geometry.mirror();
        }
    }
}

// =============================================================================
// TOPOJSON
// =============================================================================

#[derive(Debug, Deserialize)]
struct PlanetFile {
    mining: Option<Topology>,
    names: Option<Topology>,
    poi: Option<Topology>,
    #[serde(default)]
    start_locations: BTreeMap<String, [f64; 2]>,
}

/// Quantization transform of a topology.
#[derive(Debug, Clone, Copy, Deserialize)]
struct Quantize {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct Topology {
    #[serde(default)]
    transform: Option<Quantize>,
    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
    #[serde(default)]
    objects: HashMap<String, TopoObject>,
}

#[derive(Debug, Default, Deserialize)]
struct TopoObject {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    geometries: Vec<TopoObject>,
    #[serde(default)]
    arcs: Value,
    #[serde(default)]
    coordinates: Value,
    #[serde(default)]
    properties: Option<HashMap<String, Value>>,
}

impl TopoObject {
    fn property(&self, key: &str) -> Option<&str> {
        self.properties.as_ref()?.get(key)?.as_str()
    }
}

impl Topology {
    /// Decode object `name` into features; a missing object yields none.
    fn features(self, name: &str) -> Result<Vec<RegionFeature>, GeographyError> {
        let arcs = self.decoded_arcs();
        let Some(object) = self.objects.get(name) else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        collect_features(object, &arcs, self.transform, &mut out)?;
        Ok(out)
    }

    /// Absolute arc coordinates, undoing delta encoding and quantization.
    fn decoded_arcs(&self) -> Vec<Line> {
        self.arcs
            .iter()
            .map(|arc| {
                let (mut x, mut y) = (0.0, 0.0);
                arc.iter()
                    .filter(|p| p.len() >= 2)
                    .map(|p| match self.transform {
                        Some(q) => {
                            x += p[0];
                            y += p[1];
                            [x * q.scale[0] + q.translate[0], y * q.scale[1] + q.translate[1]]
                        }
                        None => [p[0], p[1]],
                    })
                    .collect()
            })
            .collect()
    }
}

fn collect_features(
    object: &TopoObject,
    arcs: &[Line],
    quantize: Option<Quantize>,
    out: &mut Vec<RegionFeature>,
) -> Result<(), GeographyError> {
    if object.kind.as_deref() == Some("GeometryCollection") {
        for child in &object.geometries {
            collect_features(child, arcs, quantize, out)?;
        }
        return Ok(());
    }
    let geometry = decode_geometry(object, arcs, quantize)?;
    out.push(RegionFeature {
        color_key: object.property("color_hex").map(str::to_owned),
        name: object.property("name").unwrap_or_default().to_owned(),
        geometry,
    });
    Ok(())
}

fn decode_geometry(object: &TopoObject, arcs: &[Line], quantize: Option<Quantize>) -> Result<Geometry, GeographyError> {
    let point = |v: &Value| -> Option<[f64; 2]> {
        let p = v.as_array()?;
        let (x, y) = (p.first()?.as_f64()?, p.get(1)?.as_f64()?);
        Some(match quantize {
            Some(q) => [x * q.scale[0] + q.translate[0], y * q.scale[1] + q.translate[1]],
            None => [x, y],
        })
    };
    let geometry = match object.kind.as_deref() {
        Some("Point") => point(&object.coordinates).map_or(Geometry::Empty, Geometry::Point),
        Some("MultiPoint") => Geometry::MultiPoint(as_list(&object.coordinates).iter().filter_map(|v| point(v)).collect()),
        Some("LineString") => Geometry::LineString(stitch(&index_list(&object.arcs), arcs)?),
        Some("MultiLineString") => Geometry::MultiLineString(rings(&object.arcs, arcs)?),
        Some("Polygon") => Geometry::Polygon(rings(&object.arcs, arcs)?),
        Some("MultiPolygon") => Geometry::MultiPolygon(
            as_list(&object.arcs)
                .iter()
                .map(|polygon| rings(polygon, arcs))
                .collect::<Result<_, _>>()?,
        ),
        _ => Geometry::Empty,
    };
    Ok(geometry)
}

fn as_list(v: &Value) -> &[Value] {
    v.as_array().map_or(&[], Vec::as_slice)
}

fn index_list(v: &Value) -> Vec<i64> {
    as_list(v).iter().filter_map(Value::as_i64).collect()
}

fn rings(v: &Value, arcs: &[Line]) -> Result<Vec<Line>, GeographyError> {
    as_list(v).iter().map(|ring| stitch(&index_list(ring), arcs)).collect()
}

/// Concatenate arcs into one line. A negative index `i` means arc `!i`
/// reversed; the shared point between consecutive arcs is kept once.
fn stitch(indices: &[i64], arcs: &[Line]) -> Result<Line, GeographyError> {
    let mut line: Line = Vec::new();
    for &index in indices {
        let (pos, reversed) = if index < 0 { (!index, true) } else { (index, false) };
        let arc = usize::try_from(pos)
            .map_err(|_| GeographyError::BadArc(index))
            .and_then(|pos| arcs.get(pos).ok_or(GeographyError::BadArc(index)))?;
        if !line.is_empty() {
            line.pop();
        }
        if reversed {
            line.extend(arc.iter().rev());
        } else {
            line.extend(arc.iter());
        }
    }
    Ok(line)
}
