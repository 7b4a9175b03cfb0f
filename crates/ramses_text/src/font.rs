//! Handles, glyph value types and the font instance abstraction

use crate::{Result, TextError};
use std::sync::Arc;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub const INVALID: $name = $name(u32::MAX);

            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }
    };
}

id_type!(
    /// Handle of a font face owned by a [`FontRegistry`](crate::FontRegistry)
    FontId
);
id_type!(
    /// Handle of a sized font instance owned by a [`FontRegistry`](crate::FontRegistry)
    FontInstanceId
);
id_type!(
    /// Handle of a text line owned by a [`TextCache`](crate::TextCache)
    TextLineId
);

/// Glyph index inside one font face
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphId(pub u32);

/// Identifies one rasterized glyph image
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlyphKey {
    pub identifier: GlyphId,
    pub instance: FontInstanceId,
}

impl GlyphKey {
    pub fn new(identifier: GlyphId, instance: FontInstanceId) -> Self {
        Self {
            identifier,
            instance,
        }
    }
}

/// Placement of one glyph relative to the pen position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlyphMetrics {
    pub key: GlyphKey,
    /// Bitmap width in pixels
    pub width: u32,
    /// Bitmap height in pixels
    pub height: u32,
    /// Bitmap left edge relative to the pen
    pub pos_x: i32,
    /// Bitmap bottom edge relative to the baseline
    pub pos_y: i32,
    /// Pen advance to the next glyph
    pub advance: i32,
}

impl GlyphMetrics {
    pub fn has_area(&self) -> bool {
        self.width != 0 && self.height != 0
    }
}

/// Start of a run rendered with one font instance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontInstanceOffset {
    pub instance: FontInstanceId,
    pub begin: usize,
}

pub type FontInstanceOffsets = Vec<FontInstanceOffset>;

/// Single channel coverage bitmap of one glyph
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphBitmap {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// A font face at one fixed pixel size
pub trait FontInstance {
    fn id(&self) -> FontInstanceId;

    /// Whether the face maps `c` to a glyph
    fn supports_character(&mut self, c: char) -> bool;

    /// Line height in pixels
    fn height(&self) -> i32;

    fn ascender(&self) -> i32;

    fn descender(&self) -> i32;

    /// Append one [`GlyphMetrics`] per shaped glyph of `chars`
    fn load_and_append_glyph_metrics(&mut self, chars: &[char], out: &mut Vec<GlyphMetrics>);

    /// Rasterize a glyph; glyphs without ink return an empty bitmap
    fn load_glyph_bitmap_data(&mut self, glyph: GlyphId) -> GlyphBitmap;
}

/// Resolves font instances by id
pub trait FontAccessor {
    fn font_instance(&mut self, id: FontInstanceId) -> Option<&mut dyn FontInstance>;
}

impl<T: FontAccessor + ?Sized> FontAccessor for &mut T {
    fn font_instance(&mut self, id: FontInstanceId) -> Option<&mut dyn FontInstance> {
        (**self).font_instance(id)
    }
}

/// Raw font file data plus the face index inside it
#[derive(Clone)]
pub struct FontFace {
    data: Arc<Vec<u8>>,
    face_index: u32,
}

impl FontFace {
    /// Validate and wrap font data
    pub fn from_data_with_index(data: Vec<u8>, face_index: u32) -> Result<Self> {
        ttf_parser::Face::parse(&data, face_index)
            .map_err(|e| TextError::FontParseError(format!("{:?}", e)))?;
        Ok(Self {
            data: Arc::new(data),
            face_index,
        })
    }

    pub fn from_data(data: Vec<u8>) -> Result<Self> {
        Self::from_data_with_index(data, 0)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn face_index(&self) -> u32 {
        self.face_index
    }

    /// Parsed view of the face
    pub fn parse(&self) -> Result<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.face_index)
            .map_err(|e| TextError::FontParseError(format!("{:?}", e)))
    }

    /// Family name from the name table, if present
    pub fn family_name(&self) -> Option<String> {
        let face = self.parse().ok()?;
        face.names()
            .into_iter()
            .filter(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
            .find_map(|name| name.to_string())
    }
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("bytes", &self.data.len())
            .field("face_index", &self.face_index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sentinel() {
        assert!(!FontInstanceId::INVALID.is_valid());
        assert!(FontInstanceId(0).is_valid());
        assert_eq!(TextLineId::default(), TextLineId::INVALID);
    }

    #[test]
    fn test_glyph_keys_differ_per_instance() {
        let a = GlyphKey::new(GlyphId(7), FontInstanceId(1));
        let b = GlyphKey::new(GlyphId(7), FontInstanceId(2));
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_is_not_a_font() {
        assert!(FontFace::from_data(vec![0, 1, 2, 3]).is_err());
    }
}
