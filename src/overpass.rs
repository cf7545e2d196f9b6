/// OpenStreetMap features from an Overpass API endpoint
///
/// Further reading: https://wiki.openstreetmap.org/wiki/Overpass_API/Overpass_QL
use crate::feature::{Coord, Geometry, RawFeature, Ring, Tags};
use crate::{Error, FeatureSource, GeoBounds};

use geo::{Contains, LineString, Point, Polygon};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

// TODO: remove once async fn in traits become stable
use async_trait::async_trait;

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Keys whose presence makes a closed way an area rather than a loop.
const AREA_KEYS: &[&str] = &[
    "amenity", "building", "landuse", "leisure", "man_made", "natural", "place", "shop",
    "tourism", "water",
];

/// Feature source backed by the Overpass API.
#[derive(Clone, Debug)]
pub struct OverpassSource {
    client: reqwest::Client,
    endpoint: String,
}

impl OverpassSource {
    pub fn new(endpoint: impl Into<String>) -> Result<OverpassSource, Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(OverpassSource::with_client(client, endpoint))
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> OverpassSource {
        OverpassSource {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl FeatureSource for OverpassSource {
    async fn features(&self, bounds: GeoBounds) -> Result<Vec<RawFeature>, Error> {
        let query = overpass_query(&bounds);
        debug!(endpoint = %self.endpoint, query = %query, "Querying Overpass");

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("data", query)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::SourceStatus {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        decode(&body)
    }
}

/// Every way and multipolygon relation touching `bounds`, with full
/// geometry.
fn overpass_query(bounds: &GeoBounds) -> String {
    let bbox = format!(
        "{},{},{},{}",
        bounds.south, bounds.west, bounds.north, bounds.east
    );
    format!(
        "[out:json][timeout:25];(way({bbox});relation[\"type\"=\"multipolygon\"]({bbox}););out geom;",
        bbox = bbox
    )
}

#[derive(Deserialize)]
struct Response {
    elements: Vec<Element>,
}

#[derive(Deserialize)]
struct Element {
    #[serde(rename = "type")]
    kind: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    tags: Value,
    #[serde(default)]
    geometry: Vec<Option<LatLon>>,
    #[serde(default)]
    members: Vec<Member>,
}

#[derive(Deserialize)]
struct Member {
    #[serde(default)]
    role: String,
    #[serde(default)]
    geometry: Vec<Option<LatLon>>,
}

#[derive(Clone, Copy, Deserialize)]
struct LatLon {
    lat: f64,
    lon: f64,
}

fn coords(geometry: &[Option<LatLon>]) -> Vec<Coord> {
    geometry
        .iter()
        .flatten()
        .map(|p| Coord::new(p.lon, p.lat))
        .collect()
}

/// Decodes an Overpass JSON response. Untagged elements (typically the
/// member ways of a relation) are skipped.
pub fn decode(body: &[u8]) -> Result<Vec<RawFeature>, Error> {
    let response: Response = serde_json::from_slice(body)?;
    let total = response.elements.len();

    let features: Vec<RawFeature> = response
        .elements
        .into_iter()
        .filter(|element| !element.tags.is_null())
        .filter_map(|element| {
            let tags = Tags::from_json(&element.tags);
            let geometry = match element.kind.as_str() {
                "node" => Geometry::Point(Coord::new(element.lon?, element.lat?)),
                "way" => way_geometry(coords(&element.geometry), tags.as_ref()),
                "relation" => {
                    if tags.as_ref().and_then(|t| t.get("type")) != Some("multipolygon") {
                        debug!(id = element.id, "Skipping non-multipolygon relation");
                        return None;
                    }
                    let polygons = multipolygon(&element.members);
                    if polygons.is_empty() {
                        debug!(id = element.id, "Skipping multipolygon without closed rings");
                        return None;
                    }
                    Geometry::MultiPolygon(polygons)
                }
                other => Geometry::Unsupported(other.to_owned()),
            };

            Some(RawFeature::new(geometry, tags).with_id(format!("{}/{}", element.kind, element.id)))
        })
        .collect();

    debug!(total, decoded = features.len(), "Decoded Overpass response");
    Ok(features)
}

fn is_closed(ring: &[Coord]) -> bool {
    ring.len() >= 4 && ring.first() == ring.last()
}

fn way_geometry(vertices: Vec<Coord>, tags: Option<&Tags>) -> Geometry {
    if is_closed(&vertices) && is_area(tags) {
        Geometry::Polygon(vec![vertices])
    } else {
        Geometry::LineString(vertices)
    }
}

/// Whether a closed way describes an area.
fn is_area(tags: Option<&Tags>) -> bool {
    let Some(tags) = tags else {
        return false;
    };

    match tags.get("area") {
        Some("yes") => return true,
        Some("no") => return false,
        _ => {}
    }

    // Closed roads and barriers are loops unless tagged area=yes.
    if tags.contains("highway") || tags.contains("barrier") {
        return false;
    }

    AREA_KEYS.iter().any(|key| tags.contains(key))
}

/// Builds polygons from the member ways of a multipolygon relation. Each
/// outer ring starts a polygon; each inner ring joins the first polygon
/// whose outer ring contains it.
fn multipolygon(members: &[Member]) -> Vec<Vec<Ring>> {
    let (inner, outer): (Vec<&Member>, Vec<&Member>) =
        members.iter().partition(|m| m.role == "inner");

    let mut polygons: Vec<Vec<Ring>> = stitch_rings(outer.iter().map(|m| coords(&m.geometry)).collect())
        .into_iter()
        .map(|ring| vec![ring])
        .collect();

    for hole in stitch_rings(inner.iter().map(|m| coords(&m.geometry)).collect()) {
        let owner = polygons
            .iter_mut()
            .find(|polygon| encloses(&polygon[0], hole[0]));
        match owner {
            Some(polygon) => polygon.push(hole),
            None => debug!("Dropping inner ring outside every outer ring"),
        }
    }

    polygons
}

/// Joins way fragments end to end into closed rings. Fragments that never
/// close are dropped.
fn stitch_rings(mut fragments: Vec<Vec<Coord>>) -> Vec<Ring> {
    fragments.retain(|fragment| fragment.len() >= 2);
    fragments.reverse();

    let mut rings = Vec::new();
    while let Some(mut ring) = fragments.pop() {
        loop {
            if is_closed(&ring) {
                rings.push(ring);
                break;
            }

            let Some(&end) = ring.last() else {
                break;
            };
            let next = fragments
                .iter()
                .position(|f| f.first() == Some(&end) || f.last() == Some(&end));
            let Some(index) = next else {
                debug!(vertices = ring.len(), "Dropping unclosed ring fragment");
                break;
            };

            let mut fragment = fragments.remove(index);
            if fragment.first() != Some(&end) {
                fragment.reverse();
            }
            ring.extend(fragment.into_iter().skip(1));
        }
    }

    rings
}

/// Whether `point` lies strictly inside the ring `outer`.
fn encloses(outer: &[Coord], point: Coord) -> bool {
    let outer: LineString<f64> = outer.iter().copied().map(geo::Coord::from).collect();
    Polygon::new(outer, vec![]).contains(&Point::from(geo::Coord::from(point)))
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Read;
    use std::net::SocketAddr;

    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;

    use super::*;
    use crate::assemble::PathAccumulator;
    use crate::compositor::tests::compositor;
    use crate::encode::rasterize;

    fn sample() -> Vec<u8> {
        let mut file =
            File::open("test_data/overpass_sample.json").expect("Unable to open the test json file.");
        let mut data = Vec::new();
        file.read_to_end(&mut data).expect("Unable to read the file");
        data
    }

    fn by_id<'a>(features: &'a [RawFeature], id: &str) -> Option<&'a RawFeature> {
        features.iter().find(|f| f.id.as_deref() == Some(id))
    }

    fn c(lon: f64, lat: f64) -> Coord {
        Coord::new(lon, lat)
    }

    #[test]
    fn test_query_uses_south_west_north_east() {
        let query = overpass_query(&GeoBounds {
            north: 52.4,
            south: 52.3,
            east: 5.0,
            west: 4.8,
        });

        assert!(query.starts_with("[out:json]"));
        assert!(query.contains("way(52.3,4.8,52.4,5)"));
        assert!(query.contains("relation[\"type\"=\"multipolygon\"](52.3,4.8,52.4,5)"));
        assert!(query.ends_with("out geom;"));
    }

    #[test]
    fn test_decode_sample() {
        let features = decode(&sample()).unwrap();

        // The untagged member way is skipped.
        assert_eq!(features.len(), 7);
        assert!(by_id(&features, "way/100").is_none());

        let cafe = by_id(&features, "node/1").unwrap();
        assert_eq!(cafe.geometry, Geometry::Point(c(4.8925, 52.3731)));

        let road = by_id(&features, "way/10").unwrap();
        assert!(matches!(&road.geometry, Geometry::LineString(v) if v.len() == 3));

        let building = by_id(&features, "way/11").unwrap();
        assert!(matches!(&building.geometry, Geometry::Polygon(r) if r.len() == 1 && r[0].len() == 5));

        // A closed road stays a line.
        let roundabout = by_id(&features, "way/12").unwrap();
        assert!(matches!(&roundabout.geometry, Geometry::LineString(_)));

        let plaza = by_id(&features, "way/13").unwrap();
        assert!(matches!(&plaza.geometry, Geometry::Polygon(_)));

        let lake = by_id(&features, "relation/20").unwrap();
        match &lake.geometry {
            Geometry::MultiPolygon(polygons) => {
                assert_eq!(polygons.len(), 1);
                assert_eq!(polygons[0].len(), 2);
                assert!(is_closed(&polygons[0][0]));
                assert!(is_closed(&polygons[0][1]));
            }
            other => panic!("unexpected geometry {:?}", other),
        }

        let weird = by_id(&features, "way/14").unwrap();
        assert_eq!(weird.tags, None);
    }

    #[test]
    fn test_is_area() {
        let tags = |pairs: &[(&str, &str)]| -> Tags { pairs.iter().copied().collect() };

        assert!(is_area(Some(&tags(&[("building", "yes")]))));
        assert!(is_area(Some(&tags(&[("leisure", "park")]))));
        assert!(!is_area(Some(&tags(&[("highway", "residential")]))));
        assert!(is_area(Some(&tags(&[("highway", "pedestrian"), ("area", "yes")]))));
        assert!(!is_area(Some(&tags(&[("building", "yes"), ("area", "no")]))));
        assert!(!is_area(Some(&tags(&[("railway", "rail")]))));
        assert!(!is_area(None));
    }

    #[test]
    fn test_stitch_rings_joins_reversed_fragments() {
        let fragments = vec![
            vec![c(0.0, 0.0), c(1.0, 0.0), c(1.0, 1.0)],
            vec![c(0.0, 0.0), c(0.0, 1.0), c(1.0, 1.0)],
            vec![c(5.0, 5.0), c(6.0, 5.0)],
        ];

        let rings = stitch_rings(fragments);
        assert_eq!(rings.len(), 1);
        assert_eq!(
            rings[0],
            vec![c(0.0, 0.0), c(1.0, 0.0), c(1.0, 1.0), c(0.0, 1.0), c(0.0, 0.0)]
        );
    }

    #[test]
    fn test_encloses() {
        let square = vec![c(0.0, 0.0), c(2.0, 0.0), c(2.0, 2.0), c(0.0, 2.0), c(0.0, 0.0)];

        assert!(encloses(&square, c(1.0, 1.0)));
        assert!(!encloses(&square, c(3.0, 1.0)));
        assert!(!encloses(&square, c(1.0, -1.0)));
    }

    #[test]
    fn test_lake_hole_is_not_painted() {
        let features = decode(&sample()).unwrap();
        let lake = by_id(&features, "relation/20").unwrap().clone();
        let bounds = GeoBounds {
            north: 52.4,
            south: 52.3,
            east: 4.9,
            west: 4.8,
        };

        let canvas = compositor().render(&PathAccumulator::from_features(&[lake]), &bounds);
        let pixmap = rasterize(&canvas, 1.0).unwrap();
        let pixel = |x, y| {
            let p = pixmap.pixel(x, y).unwrap();
            [p.red(), p.green(), p.blue(), p.alpha()]
        };

        // Inside the inner ring (4.84,52.34)-(4.86,52.34)-(4.86,52.36).
        assert_eq!(pixel(145, 140), [235, 227, 205, 255]);
        // Open water.
        assert_eq!(pixel(20, 20), [185, 211, 194, 255]);
        assert_eq!(pixel(230, 230), [185, 211, 194, 255]);
    }

    #[test]
    fn test_decode_invalid_json() {
        assert!(matches!(decode(b"<osm/>"), Err(Error::Decode(_))));
    }

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_features_over_http() {
        let body = sample();
        let router = Router::new().route(
            "/api/interpreter",
            post(move |form: String| async move {
                assert!(form.starts_with("data="));
                body
            }),
        );
        let addr = serve(router).await;

        let source = OverpassSource::new(format!("http://{}/api/interpreter", addr)).unwrap();
        let features = source
            .features(GeoBounds {
                north: 52.4,
                south: 52.3,
                east: 5.0,
                west: 4.8,
            })
            .await
            .unwrap();
        assert_eq!(features.len(), 7);
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let router = Router::new().route(
            "/api/interpreter",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
        );
        let addr = serve(router).await;

        let source = OverpassSource::new(format!("http://{}/api/interpreter", addr)).unwrap();
        let result = source
            .features(GeoBounds {
                north: 1.0,
                south: 0.0,
                east: 1.0,
                west: 0.0,
            })
            .await;
        assert!(matches!(result, Err(Error::SourceStatus { status: 429 })));
    }
}
