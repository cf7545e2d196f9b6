//! # Tile Painter
//!
//! Renders OpenStreetMap features into styled slippy map tiles.
//!
//! ## Current features
//!
//! Given a tile address (`zoom/column/row`), this crate computes the tile's
//! geographic bounds, fetches the features inside them from a
//! [`FeatureSource`] (as two half-tile requests, run concurrently),
//! classifies each feature into one of a small set of rendering categories
//! (roads, water, parks, buildings), merges the geometries of each category
//! into one path, and composites the categories in a fixed draw order. The
//! result is encoded as PNG at any integer scale, or as SVG.
//!
//! Two feature sources are provided: the public Overpass API
//! ([`overpass::OverpassSource`]) and an osm2pgsql PostGIS database
//! ([`postgis::PostgisSource`]). Styling is a YAML document; see
//! `styles/default.yml` for the built-in one.
//!
//! ## Known Limitations
//!
//! Inside a tile, degrees are mapped linearly to pixels. Only the tile
//! bounds use Web Mercator math, so features are slightly stretched
//! vertically, more so far from the equator and at low zoom. There are no
//! labels, no simplification of features, and no caching of fetched data
//! or rendered tiles.

#![deny(warnings)]

// TODO: remove once async fn in traits become stable
use async_trait::async_trait;

pub mod assemble;
pub mod canvas;
pub mod classify;
pub mod compositor;
pub mod encode;
pub mod error;
pub mod feature;
pub mod fetch;
pub mod font;
pub mod overpass;
pub mod postgis;
pub mod renderer;
pub mod request;
pub mod server;
pub mod style;
pub mod tile;

pub use crate::classify::Category;
pub use crate::compositor::Compositor;
pub use crate::encode::OutputFormat;
pub use crate::error::Error;
pub use crate::feature::{Geometry, RawFeature, Tags};
pub use crate::font::FontAsset;
pub use crate::renderer::{RenderedTile, TileRenderer};
pub use crate::request::TileRequest;
pub use crate::style::Style;
pub use crate::tile::{GeoBounds, Tile};

/// This is the main trait exported by this crate: anything that can supply
/// the tagged features inside a bounding box.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// Returns every feature intersecting `bounds`. Failures are scoped to
    /// the calling request.
    async fn features(&self, bounds: GeoBounds) -> Result<Vec<RawFeature>, Error>;
}
