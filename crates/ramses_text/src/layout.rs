//! Measuring positioned glyph runs

use crate::font::GlyphMetrics;

/// Ink extent of a glyph run relative to its starting pen position
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBoundingBox {
    /// Left edge of the leftmost bitmap
    pub offset_x: i32,
    /// Bottom edge of the lowest bitmap, relative to the baseline
    pub offset_y: i32,
    pub width: u32,
    pub height: u32,
    /// Sum of all glyph advances
    pub combined_advance: i32,
}

#[derive(Clone, Copy)]
struct Extent {
    left: i32,
    right: i32,
    bottom: i32,
    top: i32,
}

impl Extent {
    fn include(self, other: Extent) -> Extent {
        Extent {
            left: self.left.min(other.left),
            right: self.right.max(other.right),
            bottom: self.bottom.min(other.bottom),
            top: self.top.max(other.top),
        }
    }
}

fn glyph_extent(glyph: &GlyphMetrics, pen: i32) -> Option<Extent> {
    if !glyph.has_area() {
        return None;
    }
    let left = pen + glyph.pos_x;
    Some(Extent {
        left,
        right: left + glyph.width as i32,
        bottom: glyph.pos_y,
        top: glyph.pos_y + glyph.height as i32,
    })
}

/// Bounding box of all glyph bitmaps when laid out from pen position 0
///
/// Glyphs without area only advance the pen. A run without any ink has an
/// empty box at the origin.
pub fn bounding_box_for_string(glyphs: &[GlyphMetrics]) -> TextBoundingBox {
    let mut pen = 0i32;
    let mut extent: Option<Extent> = None;
    for glyph in glyphs {
        if let Some(glyph_extent) = glyph_extent(glyph, pen) {
            extent = Some(match extent {
                Some(e) => e.include(glyph_extent),
                None => glyph_extent,
            });
        }
        pen += glyph.advance;
    }

    match extent {
        Some(e) => TextBoundingBox {
            offset_x: e.left,
            offset_y: e.bottom,
            width: (e.right - e.left) as u32,
            height: (e.top - e.bottom) as u32,
            combined_advance: pen,
        },
        None => TextBoundingBox {
            combined_advance: pen,
            ..TextBoundingBox::default()
        },
    }
}

/// Number of leading glyphs whose bounding box is at most `max_width` wide
pub fn find_fitting_substring(glyphs: &[GlyphMetrics], max_width: u32) -> usize {
    let mut pen = 0i32;
    let mut extent: Option<Extent> = None;
    for (index, glyph) in glyphs.iter().enumerate() {
        if let Some(glyph_extent) = glyph_extent(glyph, pen) {
            let grown = match extent {
                Some(e) => e.include(glyph_extent),
                None => glyph_extent,
            };
            if (grown.right - grown.left) as u32 > max_width {
                return index;
            }
            extent = Some(grown);
        }
        pen += glyph.advance;
    }
    glyphs.len()
}
