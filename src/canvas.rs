//! A recording vector canvas.
//!
//! The compositor issues draw calls against a [`Canvas`]; the encoders in
//! [`crate::encode`] replay the same list to produce PNG or SVG output.
//!
//! Canvas units are y-up: (0, 0) is the south-west corner and
//! (dimension, dimension) the north-east corner. Encoders flip to the
//! y-down convention of image formats.
use crate::assemble::GeoPath;
use crate::style::Color;
use crate::tile::GeoBounds;

/// Default canvas side, in canvas units. Matches the slippy map tile size.
pub const DEFAULT_DIMENSION: f64 = 256.0;

/// Affine map from geographic degrees to canvas units.
///
/// The map is linear in degrees: the tile bounds come from Web Mercator
/// but no projection is applied inside the tile. Over the span of a single
/// tile this is a close approximation whose vertical error grows with
/// latitude and shrinks with zoom.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl ViewTransform {
    pub fn new(bounds: &GeoBounds, dimension: f64) -> ViewTransform {
        ViewTransform {
            scale_x: dimension / bounds.width(),
            scale_y: dimension / bounds.height(),
            translate_x: -bounds.west,
            translate_y: -bounds.south,
        }
    }

    /// Maps a longitude/latitude pair to canvas units.
    pub fn apply(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (x, y) = self.offset(lon, lat);
        (x * self.scale_x, y * self.scale_y)
    }

    /// The translation step alone: degrees relative to the south-west
    /// corner. Encoders build paths in this frame so that single-precision
    /// rasterizers keep full resolution inside the tile.
    pub fn offset(&self, lon: f64, lat: f64) -> (f64, f64) {
        (lon + self.translate_x, lat + self.translate_y)
    }
}

/// Stroke parameters. `width` is in degrees, before the view transform.
/// Strokes always have round caps and round joins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
}

impl StrokeStyle {
    pub fn round(width: f64) -> StrokeStyle {
        StrokeStyle { width }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Fills the whole canvas.
    Background(Color),
    /// Fills a geographic path with the non-zero winding rule.
    Fill { path: GeoPath, color: Color },
    /// Strokes a geographic path.
    Stroke {
        path: GeoPath,
        color: Color,
        style: StrokeStyle,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    dimension: f64,
    view: ViewTransform,
    font_family: Option<String>,
    ops: Vec<DrawOp>,
}

impl Canvas {
    /// A blank square canvas of side `dimension` with the identity view.
    pub fn new(dimension: f64) -> Canvas {
        Canvas {
            dimension,
            view: ViewTransform {
                scale_x: 1.0,
                scale_y: 1.0,
                translate_x: 0.0,
                translate_y: 0.0,
            },
            font_family: None,
            ops: Vec::new(),
        }
    }

    /// Names the font family text on this canvas would be set in.
    pub fn set_font_family(&mut self, family: &str) {
        self.font_family = Some(family.to_owned());
    }

    pub fn font_family(&self) -> Option<&str> {
        self.font_family.as_deref()
    }

    pub fn set_view(&mut self, view: ViewTransform) {
        self.view = view;
    }

    pub fn fill_background(&mut self, color: Color) {
        self.ops.push(DrawOp::Background(color));
    }

    pub fn fill(&mut self, path: &GeoPath, color: Color) {
        if !path.is_empty() {
            self.ops.push(DrawOp::Fill {
                path: path.clone(),
                color,
            });
        }
    }

    pub fn stroke(&mut self, path: &GeoPath, color: Color, style: StrokeStyle) {
        if !path.is_empty() {
            self.ops.push(DrawOp::Stroke {
                path: path.clone(),
                color,
                style,
            });
        }
    }

    pub fn dimension(&self) -> f64 {
        self.dimension
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }
}
