/// Declarative category styling, loaded from YAML.
///
/// A style maps every [`Category`] to a fill color, a stroke width in
/// degrees and a draw-order rank. Styles are read once and never mutated.
use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::classify::Category;
use crate::error::Error;

const DEFAULT_STYLE_YAML: &str = include_str!("../styles/default.yml");

static DEFAULT_STYLE: Lazy<Style> = Lazy::new(|| {
    Style::from_yaml(DEFAULT_STYLE_YAML).expect("the built-in style is valid")
});

/// An opaque or translucent RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "[u8; 4]")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<[u8; 4]> for Color {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Color { r, g, b, a }
    }
}

impl Color {
    /// `#rrggbb` notation, dropping alpha.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn opacity(&self) -> f32 {
        f32::from(self.a) / 255.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct CategoryStyle {
    pub fill: Color,
    #[serde(default)]
    pub stroke_width: f64,
    pub rank: u32,
}

/// A validated style. Only [`Style::from_yaml`] and [`Style::builtin`]
/// construct one, so every category is styled and the draw order is set.
#[derive(Clone, Debug)]
pub struct Style {
    pub name: String,
    pub background: Color,
    categories: BTreeMap<Category, CategoryStyle>,
    draw_order: Vec<Category>,
}

/// The style document as written, before validation.
#[derive(Deserialize)]
struct StyleDocument {
    name: String,
    background: Color,
    categories: BTreeMap<Category, CategoryStyle>,
}

impl Style {
    /// Constructs a style from a YAML document, checking that every
    /// category is styled exactly once with a distinct rank.
    pub fn from_yaml(data: &str) -> Result<Style, Error> {
        let document: StyleDocument = serde_yaml::from_str(data)?;

        for category in Category::ALL {
            let entry = document.categories.get(&category).ok_or_else(|| {
                Error::InvalidStyle(format!("no entry for category {}", category))
            })?;
            if !entry.stroke_width.is_finite() || entry.stroke_width < 0.0 {
                return Err(Error::InvalidStyle(format!(
                    "stroke width of {} must be a non-negative number",
                    category
                )));
            }
        }

        let mut order: Vec<(u32, Category)> = document
            .categories
            .iter()
            .map(|(category, s)| (s.rank, *category))
            .collect();
        order.sort_unstable();
        if let Some(pair) = order.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(Error::InvalidStyle(format!(
                "{} and {} share rank {}",
                pair[0].1, pair[1].1, pair[0].0
            )));
        }
        Ok(Style {
            name: document.name,
            background: document.background,
            categories: document.categories,
            draw_order: order.into_iter().map(|(_, category)| category).collect(),
        })
    }

    /// The built-in flat style.
    pub fn builtin() -> Style {
        DEFAULT_STYLE.clone()
    }

    /// Categories ordered back to front.
    pub fn draw_order(&self) -> &[Category] {
        &self.draw_order
    }

    pub fn category(&self, category: Category) -> &CategoryStyle {
        // from_yaml guarantees an entry for every category
        &self.categories[&category]
    }
}
