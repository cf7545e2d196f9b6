//! Raw geographic features as delivered by a feature source.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;

/// A position in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

impl Coord {
    pub fn new(lon: f64, lat: f64) -> Coord {
        Coord { lon, lat }
    }
}

impl From<Coord> for geo::Coord<f64> {
    fn from(c: Coord) -> Self {
        geo::Coord { x: c.lon, y: c.lat }
    }
}

impl From<geo::Coord<f64>> for Coord {
    fn from(c: geo::Coord<f64>) -> Self {
        Coord::new(c.x, c.y)
    }
}

/// A closed ordered sequence of vertices; the outer boundary or a hole of
/// a polygon.
pub type Ring = Vec<Coord>;

#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Point(Coord),
    LineString(Vec<Coord>),
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
    /// Any geometry kind the renderer has no drawing rule for, by name.
    Unsupported(String),
}

impl Geometry {
    pub fn kind(&self) -> &str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
            Geometry::Unsupported(kind) => kind,
        }
    }

    /// Decodes a GeoJSON geometry object.
    pub fn from_geojson(value: &Value) -> Result<Geometry, Error> {
        #[derive(Deserialize)]
        struct GeoJson {
            #[serde(rename = "type")]
            kind: String,
            #[serde(default)]
            coordinates: Value,
        }

        let geojson = GeoJson::deserialize(value)?;
        let coordinates = geojson.coordinates;

        let geometry = match geojson.kind.as_str() {
            "Point" => Geometry::Point(position(serde_json::from_value(coordinates)?)),
            "LineString" => Geometry::LineString(line(serde_json::from_value(coordinates)?)),
            "Polygon" => Geometry::Polygon(polygon(serde_json::from_value(coordinates)?)),
            "MultiPolygon" => {
                let polygons: Vec<Vec<Vec<Vec<f64>>>> = serde_json::from_value(coordinates)?;
                Geometry::MultiPolygon(polygons.into_iter().map(polygon).collect())
            }
            other => Geometry::Unsupported(other.to_owned()),
        };

        Ok(geometry)
    }
}

// GeoJSON positions may carry an altitude, which is ignored. Short
// positions decode as NaN and are dropped by the callers below.
fn position(raw: Vec<f64>) -> Coord {
    match raw.as_slice() {
        [lon, lat, ..] => Coord::new(*lon, *lat),
        _ => Coord::new(f64::NAN, f64::NAN),
    }
}

fn line(raw: Vec<Vec<f64>>) -> Vec<Coord> {
    raw.into_iter()
        .map(position)
        .filter(|c| c.lon.is_finite() && c.lat.is_finite())
        .collect()
}

fn polygon(raw: Vec<Vec<Vec<f64>>>) -> Vec<Ring> {
    raw.into_iter().map(line).collect()
}

/// The tag set of a feature.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    /// Returns the value of tag `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Reads tags from a JSON object. Returns `None` unless the value is an
    /// object whose values are all strings.
    pub fn from_json(value: &Value) -> Option<Tags> {
        let object = value.as_object()?;
        object
            .iter()
            .map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_owned())))
            .collect::<Option<BTreeMap<_, _>>>()
            .map(Tags)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Tags(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A tagged geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct RawFeature {
    /// Stable source identifier such as `way/123`, when the source has one.
    pub id: Option<String>,
    pub geometry: Geometry,
    pub tags: Option<Tags>,
}

impl RawFeature {
    pub fn new(geometry: Geometry, tags: Option<Tags>) -> RawFeature {
        RawFeature {
            id: None,
            geometry,
            tags,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> RawFeature {
        self.id = Some(id.into());
        self
    }
}
