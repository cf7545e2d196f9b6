//! The font asset, loaded once at startup.
use std::path::Path;

use tracing::info;

use crate::error::Error;

/// A validated font file. Immutable once loaded; share it behind an `Arc`.
#[derive(Debug)]
pub struct FontAsset {
    family: String,
    units_per_em: u16,
    glyph_count: u16,
}

impl FontAsset {
    /// Reads and validates the font at `path`, registering it as `family`.
    pub fn load(path: impl AsRef<Path>, family: &str) -> Result<FontAsset, Error> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| Error::Font {
            family: family.to_owned(),
            reason: format!("{}: {}", path.display(), e),
        })?;

        let font = FontAsset::from_bytes(family, data)?;
        info!(
            family = %font.family,
            path = %path.display(),
            glyphs = font.glyph_count,
            units_per_em = font.units_per_em,
            "Loaded font"
        );
        Ok(font)
    }

    pub fn from_bytes(family: &str, data: Vec<u8>) -> Result<FontAsset, Error> {
        let face = ttf_parser::Face::parse(&data, 0).map_err(|e| Error::Font {
            family: family.to_owned(),
            reason: e.to_string(),
        })?;
        let units_per_em = face.units_per_em();
        let glyph_count = face.number_of_glyphs();

        Ok(FontAsset {
            family: family.to_owned(),
            units_per_em,
            glyph_count,
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// An asset carrying only a family name, for exercising the
    /// compositor without a font file on disk.
    #[cfg(test)]
    pub(crate) fn unchecked(family: &str) -> FontAsset {
        FontAsset {
            family: family.to_owned(),
            units_per_em: 2048,
            glyph_count: 0,
        }
    }
}
