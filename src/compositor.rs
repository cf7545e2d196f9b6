//! Draws assembled category paths onto a canvas in style order.
use std::sync::Arc;

use tracing::trace;

use crate::assemble::PathAccumulator;
use crate::canvas::{Canvas, StrokeStyle, ViewTransform};
use crate::font::FontAsset;
use crate::style::Style;
use crate::tile::GeoBounds;

#[derive(Clone, Debug)]
pub struct Compositor {
    style: Arc<Style>,
    font: Arc<FontAsset>,
    dimension: f64,
}

impl Compositor {
    pub fn new(style: Arc<Style>, font: Arc<FontAsset>, dimension: f64) -> Compositor {
        Compositor {
            style,
            font,
            dimension,
        }
    }

    /// Renders the paths of one tile. Later categories in the draw order
    /// occlude earlier ones; within a category, strokes are drawn before
    /// fills.
    pub fn render(&self, paths: &PathAccumulator, bounds: &GeoBounds) -> Canvas {
        let mut canvas = Canvas::new(self.dimension);
        canvas.set_font_family(self.font.family());
        canvas.fill_background(self.style.background);
        canvas.set_view(ViewTransform::new(bounds, self.dimension));

        for &category in self.style.draw_order() {
            let Some(category_paths) = paths.get(category) else {
                continue;
            };
            let style = self.style.category(category);
            trace!(category = %category, "Drawing category");

            canvas.stroke(
                &category_paths.lines,
                style.fill,
                StrokeStyle::round(style.stroke_width),
            );
            canvas.fill(&category_paths.rings, style.fill);
        }

        canvas
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;
    use crate::canvas::DrawOp;
    use crate::classify::Category;
    use crate::feature::{Coord, Geometry};

    pub(crate) fn compositor() -> Compositor {
        Compositor::new(
            Arc::new(Style::builtin()),
            Arc::new(FontAsset::unchecked("dejavu-serif")),
            256.0,
        )
    }

    fn bounds() -> GeoBounds {
        GeoBounds {
            north: 1.0,
            south: 0.0,
            east: 1.0,
            west: 0.0,
        }
    }

    fn square() -> Geometry {
        Geometry::Polygon(vec![vec![
            Coord::new(0.2, 0.2),
            Coord::new(0.8, 0.2),
            Coord::new(0.8, 0.8),
            Coord::new(0.2, 0.8),
            Coord::new(0.2, 0.2),
        ]])
    }

    fn diagonal() -> Geometry {
        Geometry::LineString(vec![Coord::new(0.0, 0.0), Coord::new(1.0, 1.0)])
    }

    #[test]
    fn test_empty_tile_is_background_only() {
        let canvas = compositor().render(&PathAccumulator::default(), &bounds());

        assert_eq!(
            canvas.ops(),
            &[DrawOp::Background(Style::builtin().background)]
        );
        assert_eq!(canvas.view().scale_x, 256.0);
    }

    #[test]
    fn test_draw_order_follows_categories() {
        let mut paths = PathAccumulator::default();
        // Inserted back to front on purpose.
        paths.add(Category::Building, &square());
        paths.add(Category::RoutePrimary, &diagonal());
        paths.add(Category::Water, &square());
        paths.add(Category::RoutePrimary, &square());

        let canvas = compositor().render(&paths, &bounds());
        let style = Style::builtin();
        let colors: Vec<_> = canvas
            .ops()
            .iter()
            .map(|op| match op {
                DrawOp::Background(c) => ("background", *c),
                DrawOp::Fill { color, .. } => ("fill", *color),
                DrawOp::Stroke { color, .. } => ("stroke", *color),
            })
            .collect();

        assert_eq!(
            colors,
            vec![
                ("background", style.background),
                ("fill", style.category(Category::Water).fill),
                ("stroke", style.category(Category::RoutePrimary).fill),
                ("fill", style.category(Category::RoutePrimary).fill),
                ("fill", style.category(Category::Building).fill),
            ]
        );
    }

    #[test]
    fn test_stroke_uses_category_width() {
        let mut paths = PathAccumulator::default();
        paths.add(Category::RouteTransit, &diagonal());

        let canvas = compositor().render(&paths, &bounds());
        match &canvas.ops()[1] {
            DrawOp::Stroke { style, .. } => {
                assert_approx_eq!(style.width, 0.00015 / 8.0);
            }
            other => panic!("expected a stroke, got {:?}", other),
        }
    }
}
