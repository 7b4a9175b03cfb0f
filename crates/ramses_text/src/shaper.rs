//! Bidi-aware text shaping using rustybuzz
//!
//! Input runs are split into visual bidi runs with unicode-bidi and each run
//! is shaped in its own direction. Positions are returned in font units.

use crate::font::GlyphId;
use rustybuzz::{Direction, UnicodeBuffer};
use unicode_bidi::BidiInfo;

/// One glyph produced by the shaper, in font units
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShapedGlyph {
    pub glyph: GlyphId,
    /// Byte offset of the source cluster in the filtered run
    pub cluster: u32,
    pub x_advance: i32,
    pub x_offset: i32,
    pub y_offset: i32,
}

/// Directional formatting characters that never produce a glyph
pub fn is_bidi_control(c: char) -> bool {
    matches!(
        c,
        '\u{200E}' | '\u{200F}' | '\u{061C}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}'
    )
}

/// Shape a run of characters in visual order
pub fn shape(face: &rustybuzz::Face<'_>, chars: &[char]) -> Vec<ShapedGlyph> {
    let text: String = chars.iter().filter(|c| !is_bidi_control(**c)).collect();
    if text.is_empty() {
        return Vec::new();
    }

    let bidi = BidiInfo::new(&text, None);
    let mut glyphs = Vec::with_capacity(text.len());

    for paragraph in &bidi.paragraphs {
        let (levels, runs) = bidi.visual_runs(paragraph, paragraph.range.clone());
        for run in runs {
            let direction = if levels[run.start].is_rtl() {
                Direction::RightToLeft
            } else {
                Direction::LeftToRight
            };

            let mut buffer = UnicodeBuffer::new();
            buffer.push_str(&text[run.clone()]);
            buffer.set_direction(direction);
            buffer.guess_segment_properties();

            let output = rustybuzz::shape(face, &[], buffer);
            tracing::trace!(
                "shaper: run {:?} {:?} -> {} glyphs",
                run,
                direction,
                output.len()
            );
            for (info, position) in output.glyph_infos().iter().zip(output.glyph_positions()) {
                glyphs.push(ShapedGlyph {
                    glyph: GlyphId(info.glyph_id),
                    cluster: run.start as u32 + info.cluster,
                    x_advance: position.x_advance,
                    x_offset: position.x_offset,
                    y_offset: position.y_offset,
                });
            }
        }
    }
    glyphs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bidi_controls() {
        for c in [
            '\u{200E}', '\u{200F}', '\u{061C}', '\u{202A}', '\u{202E}', '\u{2066}', '\u{2069}',
        ] {
            assert!(is_bidi_control(c), "{:?}", c);
        }
        for c in ['a', '\u{200D}', '\u{2065}', '\u{202F}'] {
            assert!(!is_bidi_control(c), "{:?}", c);
        }
    }
}
