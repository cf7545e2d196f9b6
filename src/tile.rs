/// Slippy map tile addressing and Web Mercator bounds.
///
/// Tile numbering follows the standard XYZ scheme: columns grow eastward,
/// rows grow southward, and each zoom level has 2^zoom tiles per axis.
use crate::error::Error;

use slippy_map_tilenames::{lonlat2tile, tile2lonlat};

/// Deepest zoom level accepted when constructing a [`Tile`].
pub const MAX_ZOOM: u8 = 24;

/// A geographic bounding box in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBounds {
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Returns the (latitude, longitude) of the box's center.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.north + self.south) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// Splits the box at its longitudinal midpoint into a western and an
    /// eastern half, each covering the full latitude range.
    pub fn split_at_longitude_midpoint(&self) -> (GeoBounds, GeoBounds) {
        let mid = self.west + self.width() / 2.0;
        (
            GeoBounds {
                east: mid,
                ..*self
            },
            GeoBounds {
                west: mid,
                ..*self
            },
        )
    }
}

/// A slippy map tile in XYZ format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    pub zoom: u8,
    pub column: u32,
    pub row: u32,
}

impl Tile {
    /// Constructs a tile, checking that it lies inside the tile pyramid.
    pub fn new(zoom: u8, column: u32, row: u32) -> Result<Tile, Error> {
        let tile = Tile { zoom, column, row };
        if zoom > MAX_ZOOM
            || u64::from(column) >= tiles_per_axis(zoom)
            || u64::from(row) >= tiles_per_axis(zoom)
        {
            return Err(Error::InvalidTile { zoom, column, row });
        }

        Ok(tile)
    }

    /// Geographic bounds of the tile.
    pub fn bounds(&self) -> GeoBounds {
        GeoBounds {
            north: latitude_of_row(self.row, self.zoom),
            south: latitude_of_row(self.row + 1, self.zoom),
            west: longitude_of_column(self.column, self.zoom),
            east: longitude_of_column(self.column + 1, self.zoom),
        }
    }
}

fn tiles_per_axis(zoom: u8) -> u64 {
    1u64 << zoom
}

/// Latitude of the northern edge of `row` (inverse Web Mercator).
pub fn latitude_of_row(row: u32, zoom: u8) -> f64 {
    let (_, lat) = tile2lonlat(0, row, zoom);
    lat
}

/// Longitude of the western edge of `column`.
pub fn longitude_of_column(column: u32, zoom: u8) -> f64 {
    let (lon, _) = tile2lonlat(column, 0, zoom);
    lon
}

/// Returns the (column, row) of the tile containing a point.
pub fn column_row_of_lat_lon(lat: f64, lon: f64, zoom: u8) -> (u32, u32) {
    lonlat2tile(lon, lat, zoom)
}
