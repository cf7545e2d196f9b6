//! One tile request, end to end.
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use crate::assemble::PathAccumulator;
use crate::canvas::Canvas;
use crate::compositor::Compositor;
use crate::encode::encode;
use crate::error::Error;
use crate::fetch::fetch_tile_features;
use crate::request::TileRequest;
use crate::tile::Tile;
use crate::FeatureSource;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Encoded tile bytes and their media type.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedTile {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Renders tiles from one feature source with one compositor. Cheap to
/// clone; every render works on request-local data only.
#[derive(Clone)]
pub struct TileRenderer {
    source: Arc<dyn FeatureSource>,
    compositor: Compositor,
    fetch_timeout: Duration,
}

impl TileRenderer {
    pub fn new(source: Arc<dyn FeatureSource>, compositor: Compositor) -> TileRenderer {
        TileRenderer {
            source,
            compositor,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> TileRenderer {
        self.fetch_timeout = timeout;
        self
    }

    /// Fetches, classifies, assembles and composites one tile.
    #[instrument(skip(self), fields(zoom = tile.zoom, column = tile.column, row = tile.row))]
    pub async fn draw(&self, tile: Tile) -> Result<Canvas, Error> {
        let bounds = tile.bounds();
        let features =
            fetch_tile_features(self.source.as_ref(), &bounds, self.fetch_timeout).await?;
        let paths = PathAccumulator::from_features(&features);

        Ok(self.compositor.render(&paths, &bounds))
    }

    /// Draws and encodes the requested tile.
    pub async fn render(&self, request: &TileRequest) -> Result<RenderedTile, Error> {
        let canvas = self.draw(request.tile).await?;
        let bytes = encode(&canvas, request.format, request.scale)?;
        info!(
            zoom = request.tile.zoom,
            column = request.tile.column,
            row = request.tile.row,
            format = %request.format,
            bytes = bytes.len(),
            "Rendered tile"
        );

        Ok(RenderedTile {
            content_type: request.format.content_type(),
            bytes,
        })
    }
}
