//! Per-category path assembly.
//!
//! Features of one category are merged into a single stroked path (line
//! strings) and a single filled path (polygon rings). Every category
//! shares one flat style, so the order sub-paths are appended in never
//! changes the rendered output.
use std::collections::BTreeMap;

use geo::{LineString, Winding};
use tracing::{debug, warn};

use crate::classify::{classify, Category};
use crate::feature::{Coord, Geometry, RawFeature, Ring};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(Coord),
    LineTo(Coord),
    Close,
}

/// A path in geographic degrees.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeoPath {
    commands: Vec<PathCommand>,
}

impl GeoPath {
    pub fn move_to(&mut self, to: Coord) {
        self.commands.push(PathCommand::MoveTo(to));
    }

    pub fn line_to(&mut self, to: Coord) {
        self.commands.push(PathCommand::LineTo(to));
    }

    pub fn close(&mut self) {
        self.commands.push(PathCommand::Close);
    }

    pub fn append(&mut self, other: GeoPath) {
        self.commands.extend(other.commands);
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn subpath_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::MoveTo(_)))
            .count()
    }

    pub fn segment_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::LineTo(_)))
            .count()
    }

    /// An open path through `vertices`, or `None` for fewer than two.
    fn open(vertices: &[Coord]) -> Option<GeoPath> {
        let (first, rest) = vertices.split_first()?;
        if rest.is_empty() {
            return None;
        }

        let mut path = GeoPath::default();
        path.move_to(*first);
        for vertex in rest {
            path.line_to(*vertex);
        }
        Some(path)
    }

    /// A closed path around `ring`, or `None` for an empty ring.
    fn closed(ring: &Ring) -> Option<GeoPath> {
        let (first, rest) = ring.split_first()?;

        let mut path = GeoPath::default();
        path.move_to(*first);
        for vertex in rest {
            path.line_to(*vertex);
        }
        path.close();
        Some(path)
    }
}

/// Rewinds `ring` counter-clockwise when `outer`, clockwise otherwise, so
/// holes cancel their outer ring under the non-zero fill rule.
fn wound(ring: &[Coord], outer: bool) -> Ring {
    let mut line: LineString<f64> = ring.iter().copied().map(geo::Coord::from).collect();
    if outer {
        line.make_ccw_winding();
    } else {
        line.make_cw_winding();
    }
    line.into_iter().map(Coord::from).collect()
}

/// The stroked and filled paths of one category.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoryPaths {
    pub lines: GeoPath,
    pub rings: GeoPath,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathAccumulator {
    paths: BTreeMap<Category, CategoryPaths>,
}

impl PathAccumulator {
    /// Classifies and assembles a whole feature set.
    pub fn from_features<'a, I>(features: I) -> PathAccumulator
    where
        I: IntoIterator<Item = &'a RawFeature>,
    {
        let mut accumulator = PathAccumulator::default();
        let mut dropped = 0usize;
        let mut kept = 0usize;

        for feature in features {
            match classify(feature.tags.as_ref()) {
                Some(category) => {
                    kept += 1;
                    accumulator.add(category, &feature.geometry);
                }
                None => dropped += 1,
            }
        }

        debug!(kept, dropped, "Assembled feature paths");
        accumulator
    }

    /// Adds one classified geometry to its category's paths.
    pub fn add(&mut self, category: Category, geometry: &Geometry) {
        match geometry {
            Geometry::Point(_) => {}
            Geometry::LineString(vertices) => {
                if let Some(path) = GeoPath::open(vertices) {
                    self.entry(category).lines.append(path);
                }
            }
            Geometry::Polygon(rings) => self.add_rings(category, rings),
            Geometry::MultiPolygon(polygons) => {
                for rings in polygons {
                    self.add_rings(category, rings);
                }
            }
            Geometry::Unsupported(kind) => {
                warn!(kind = %kind, category = %category, "Skipping unsupported geometry");
            }
        }
    }

    /// The first ring of a polygon is its outer boundary, later rings are
    /// holes.
    fn add_rings(&mut self, category: Category, rings: &[Ring]) {
        for (index, ring) in rings.iter().enumerate() {
            if let Some(path) = GeoPath::closed(&wound(ring, index == 0)) {
                self.entry(category).rings.append(path);
            }
        }
    }

    fn entry(&mut self, category: Category) -> &mut CategoryPaths {
        self.paths.entry(category).or_default()
    }

    pub fn get(&self, category: Category) -> Option<&CategoryPaths> {
        self.paths.get(&category)
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.paths.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Tags;

    fn coords(points: &[(f64, f64)]) -> Vec<Coord> {
        points.iter().map(|&(lon, lat)| Coord::new(lon, lat)).collect()
    }

    #[test]
    fn test_single_vertex_line_contributes_nothing() {
        let mut acc = PathAccumulator::default();
        acc.add(Category::RoutePrimary, &Geometry::LineString(coords(&[(0.0, 0.0)])));
        acc.add(Category::RoutePrimary, &Geometry::LineString(vec![]));

        assert!(acc.is_empty());
    }

    #[test]
    fn test_line_string_is_one_open_subpath() {
        let mut acc = PathAccumulator::default();
        let line = coords(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (2.0, 1.0)]);
        acc.add(Category::RouteSecondary, &Geometry::LineString(line));

        let paths = acc.get(Category::RouteSecondary).unwrap();
        assert_eq!(paths.lines.subpath_count(), 1);
        assert_eq!(paths.lines.segment_count(), 3);
        assert!(!paths.lines.commands().contains(&PathCommand::Close));
        assert!(paths.rings.is_empty());
    }

    #[test]
    fn test_polygon_rings_are_closed_and_empty_rings_skipped() {
        let mut acc = PathAccumulator::default();
        let outer = coords(&[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 0.0)]);
        let hole = coords(&[(1.0, 1.0), (2.0, 1.0), (2.0, 2.0), (1.0, 1.0)]);
        acc.add(Category::Park, &Geometry::Polygon(vec![outer, vec![], hole]));

        let rings = &acc.get(Category::Park).unwrap().rings;
        assert_eq!(rings.subpath_count(), 2);
        assert_eq!(
            rings.commands().iter().filter(|c| **c == PathCommand::Close).count(),
            2
        );
    }

    fn ring_of(path: &GeoPath, index: usize) -> LineString<f64> {
        let mut rings: Vec<Vec<geo::Coord<f64>>> = Vec::new();
        for command in path.commands() {
            match command {
                PathCommand::MoveTo(c) => rings.push(vec![(*c).into()]),
                PathCommand::LineTo(c) => rings.last_mut().unwrap().push((*c).into()),
                PathCommand::Close => {}
            }
        }
        LineString::new(rings.swap_remove(index))
    }

    #[test]
    fn test_holes_wind_against_outer_ring() {
        let mut acc = PathAccumulator::default();
        // Both rings clockwise, as some sources deliver them.
        let outer = coords(&[(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (4.0, 0.0), (0.0, 0.0)]);
        let hole = coords(&[(1.0, 1.0), (1.0, 2.0), (2.0, 2.0), (2.0, 1.0), (1.0, 1.0)]);
        acc.add(Category::Building, &Geometry::Polygon(vec![outer.clone(), hole.clone()]));
        // And both counter-clockwise.
        let reversed = |ring: &Vec<Coord>| ring.iter().rev().copied().collect::<Vec<_>>();
        acc.add(
            Category::Water,
            &Geometry::MultiPolygon(vec![vec![reversed(&outer), reversed(&hole)]]),
        );

        for category in [Category::Building, Category::Water] {
            let rings = &acc.get(category).unwrap().rings;
            assert!(ring_of(rings, 0).is_ccw(), "{} outer ring", category);
            assert!(ring_of(rings, 1).is_cw(), "{} hole", category);
        }
    }

    #[test]
    fn test_single_vertex_ring_is_still_closed() {
        let mut acc = PathAccumulator::default();
        acc.add(Category::Building, &Geometry::Polygon(vec![coords(&[(1.0, 1.0)])]));

        let rings = &acc.get(Category::Building).unwrap().rings;
        assert_eq!(
            rings.commands(),
            &[PathCommand::MoveTo(Coord::new(1.0, 1.0)), PathCommand::Close]
        );
    }

    #[test]
    fn test_multi_polygon_flattens_to_rings() {
        let mut acc = PathAccumulator::default();
        let a = coords(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        let b = coords(&[(2.0, 2.0), (3.0, 2.0), (3.0, 3.0), (2.0, 2.0)]);
        acc.add(
            Category::Water,
            &Geometry::MultiPolygon(vec![vec![a], vec![b, vec![]]]),
        );

        assert_eq!(acc.get(Category::Water).unwrap().rings.subpath_count(), 2);
    }

    #[test]
    fn test_points_and_unsupported_are_skipped() {
        let mut acc = PathAccumulator::default();
        acc.add(Category::Building, &Geometry::Point(Coord::new(1.0, 1.0)));
        acc.add(Category::Building, &Geometry::Unsupported("MultiLineString".into()));

        assert!(acc.is_empty());
    }

    #[test]
    fn test_from_features_merges_same_category() {
        let primary: Tags = [("highway", "primary")].into_iter().collect();
        let motorway: Tags = [("highway", "motorway")].into_iter().collect();
        let features = vec![
            RawFeature::new(
                Geometry::LineString(coords(&[(0.0, 0.0), (1.0, 1.0)])),
                Some(primary.clone()),
            ),
            RawFeature::new(
                Geometry::LineString(coords(&[(1.0, 0.0), (0.0, 1.0)])),
                Some(primary),
            ),
            RawFeature::new(
                Geometry::LineString(coords(&[(0.0, 0.5), (1.0, 0.5)])),
                Some(motorway),
            ),
            RawFeature::new(Geometry::LineString(coords(&[(0.0, 0.2), (1.0, 0.2)])), None),
        ];

        let acc = PathAccumulator::from_features(&features);
        assert_eq!(acc.categories().collect::<Vec<_>>(), vec![Category::RoutePrimary]);
        assert_eq!(acc.get(Category::RoutePrimary).unwrap().lines.subpath_count(), 2);
    }
}
