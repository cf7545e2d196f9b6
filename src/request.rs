//! Tile request paths of the form `/{zoom}/{column}/{row}[@{scale}].{format}`.
use std::str::FromStr;

use crate::encode::OutputFormat;
use crate::error::Error;
use crate::tile::Tile;

/// A parsed tile request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileRequest {
    pub tile: Tile,
    /// Raster pixels per canvas unit, 1 to 9.
    pub scale: f64,
    pub format: OutputFormat,
}

impl TileRequest {
    pub fn new(tile: Tile, scale: f64, format: OutputFormat) -> TileRequest {
        TileRequest {
            tile,
            scale,
            format,
        }
    }

    /// Parses a request path. A leading slash is optional.
    pub fn parse(path: &str) -> Result<TileRequest, Error> {
        let malformed = || Error::MalformedPath(path.to_owned());

        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let (stem, extension) = trimmed.rsplit_once('.').ok_or_else(malformed)?;
        let format = OutputFormat::from_str(extension)?;

        let (coords, scale) = match stem.split_once('@') {
            Some((coords, scale)) => (coords, parse_scale(scale).ok_or_else(malformed)?),
            None => (stem, 1.0),
        };

        let mut parts = coords.split('/');
        let (Some(zoom), Some(column), Some(row), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        let zoom: u8 = parse_index(zoom).ok_or_else(malformed)?;
        let column: u32 = parse_index(column).ok_or_else(malformed)?;
        let row: u32 = parse_index(row).ok_or_else(malformed)?;

        Ok(TileRequest {
            tile: Tile::new(zoom, column, row)?,
            scale,
            format,
        })
    }
}

impl FromStr for TileRequest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TileRequest::parse(s)
    }
}

// Plain ASCII digits only; `str::parse` would also accept a leading `+`.
fn parse_index<T: FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_scale(s: &str) -> Option<f64> {
    match s.as_bytes() {
        [digit @ b'1'..=b'9'] => Some(f64::from(digit - b'0')),
        _ => None,
    }
}
