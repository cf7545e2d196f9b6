//! PNG and SVG output for a drawn [`Canvas`].
//!
//! Both encoders replay the canvas draw list in order. Paths are emitted in
//! degrees relative to the south-west corner, and the view scale is applied
//! as a transform, so stroke widths scale with the view exactly as the
//! geometry does.
use std::fmt;
use std::str::FromStr;

use svg::node::element::path::Data;
use svg::node::element::{Path as SvgPath, Rectangle};
use svg::Document;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::assemble::{GeoPath, PathCommand};
use crate::canvas::{Canvas, DrawOp, StrokeStyle, ViewTransform};
use crate::error::Error;
use crate::style::Color;

/// Largest raster side, in pixels.
const MAX_RASTER_SIDE: f64 = 8192.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Svg,
}

impl OutputFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Svg => "image/svg+xml",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(Error::UnsupportedFormat(other.to_owned())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Encodes `canvas` in `format`. `scale` only affects raster output.
pub fn encode(canvas: &Canvas, format: OutputFormat, scale: f64) -> Result<Vec<u8>, Error> {
    match format {
        OutputFormat::Png => encode_png(canvas, scale),
        OutputFormat::Svg => Ok(encode_svg(canvas).into_bytes()),
    }
}

/// Rasterizes `canvas` at `scale` pixels per canvas unit and encodes it as
/// PNG.
pub fn encode_png(canvas: &Canvas, scale: f64) -> Result<Vec<u8>, Error> {
    let pixmap = rasterize(canvas, scale)?;
    pixmap.encode_png().map_err(|e| Error::Encode(e.to_string()))
}

/// Replays the draw list into a new pixmap.
pub fn rasterize(canvas: &Canvas, scale: f64) -> Result<Pixmap, Error> {
    let side = (canvas.dimension() * scale).round();
    if !(1.0..=MAX_RASTER_SIDE).contains(&side) {
        return Err(Error::InvalidCanvas {
            width: side.max(0.0) as u32,
            height: side.max(0.0) as u32,
        });
    }
    let side = side as u32;
    let mut pixmap = Pixmap::new(side, side).ok_or(Error::InvalidCanvas {
        width: side,
        height: side,
    })?;

    let pixels_per_unit = f64::from(side) / canvas.dimension();
    let view = canvas.view();
    let transform = Transform::from_row(
        (view.scale_x * pixels_per_unit) as f32,
        0.0,
        0.0,
        -(view.scale_y * pixels_per_unit) as f32,
        0.0,
        side as f32,
    );

    for op in canvas.ops() {
        match op {
            DrawOp::Background(color) => pixmap.fill(skia_color(color)),
            DrawOp::Fill { path, color } => {
                if let Some(path) = skia_path(path, view) {
                    pixmap.fill_path(&path, &paint(color), FillRule::Winding, transform, None);
                }
            }
            DrawOp::Stroke { path, color, style } => {
                if let Some(path) = skia_path(path, view) {
                    pixmap.stroke_path(&path, &paint(color), &skia_stroke(style), transform, None);
                }
            }
        }
    }

    Ok(pixmap)
}

fn skia_color(color: &Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn paint(color: &Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn skia_stroke(style: &StrokeStyle) -> Stroke {
    Stroke {
        width: style.width as f32,
        line_cap: tiny_skia::LineCap::Round,
        line_join: tiny_skia::LineJoin::Round,
        ..Stroke::default()
    }
}

fn skia_path(path: &GeoPath, view: &ViewTransform) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for command in path.commands() {
        match command {
            PathCommand::MoveTo(c) => {
                let (x, y) = view.offset(c.lon, c.lat);
                builder.move_to(x as f32, y as f32);
            }
            PathCommand::LineTo(c) => {
                let (x, y) = view.offset(c.lon, c.lat);
                builder.line_to(x as f32, y as f32);
            }
            PathCommand::Close => builder.close(),
        }
    }
    builder.finish()
}

/// Renders `canvas` as a standalone SVG document of `dimension` units.
pub fn encode_svg(canvas: &Canvas) -> String {
    let dimension = canvas.dimension();
    let view = canvas.view();
    let transform = format!(
        "matrix({} 0 0 {} 0 {})",
        view.scale_x, -view.scale_y, dimension
    );

    let mut document = Document::new()
        .set("width", dimension.to_string())
        .set("height", dimension.to_string())
        .set("viewBox", format!("0 0 {} {}", dimension, dimension));
    if let Some(family) = canvas.font_family() {
        document = document.set("font-family", family);
    }

    for op in canvas.ops() {
        document = match op {
            DrawOp::Background(color) => document.add(with_opacity(
                Rectangle::new()
                    .set("width", dimension.to_string())
                    .set("height", dimension.to_string())
                    .set("fill", color.to_hex()),
                "fill-opacity",
                color,
            )),
            DrawOp::Fill { path, color } => document.add(with_opacity(
                SvgPath::new()
                    .set("d", svg_data(path, view))
                    .set("transform", transform.as_str())
                    .set("fill", color.to_hex())
                    .set("fill-rule", "nonzero"),
                "fill-opacity",
                color,
            )),
            DrawOp::Stroke { path, color, style } => document.add(with_opacity(
                SvgPath::new()
                    .set("d", svg_data(path, view))
                    .set("transform", transform.as_str())
                    .set("fill", "none")
                    .set("stroke", color.to_hex())
                    .set("stroke-width", style.width.to_string())
                    .set("stroke-linecap", "round")
                    .set("stroke-linejoin", "round"),
                "stroke-opacity",
                color,
            )),
        };
    }

    document.to_string()
}

fn with_opacity<N>(node: N, attribute: &str, color: &Color) -> N
where
    N: svg::Node,
{
    let mut node = node;
    if color.a < u8::MAX {
        node.assign(attribute, color.opacity().to_string());
    }
    node
}

fn svg_data(path: &GeoPath, view: &ViewTransform) -> Data {
    path.commands()
        .iter()
        .fold(Data::new(), |data, command| match command {
            PathCommand::MoveTo(c) => {
                let (x, y) = view.offset(c.lon, c.lat);
                data.move_to((x as f32, y as f32))
            }
            PathCommand::LineTo(c) => {
                let (x, y) = view.offset(c.lon, c.lat);
                data.line_to((x as f32, y as f32))
            }
            PathCommand::Close => data.close(),
        })
}
