//! Font instance backed by ttf-parser metrics and swash rasterization
//!
//! Plain instances map each character to one glyph and apply pair kerning
//! from the `kern` table. Shaping instances run text through rustybuzz, which
//! handles bidi reordering, ligatures and mark positioning.

use crate::font::{FontFace, FontInstance, FontInstanceId, GlyphBitmap, GlyphId, GlyphKey, GlyphMetrics};
use crate::shaper;
use crate::{Result, TextError};
use lru::LruCache;
use rustc_hash::FxHashMap;
use std::num::NonZeroUsize;
use swash::scale::{Render, ScaleContext, Source, StrikeWith};
use swash::zeno::Format;

/// Bitmap placement of a rasterized glyph relative to the pen and baseline
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct GlyphPlacement {
    left: i32,
    top: i32,
    width: u32,
    height: u32,
}

/// A font face rasterized at a fixed pixel size
pub struct RasterFontInstance {
    id: FontInstanceId,
    face: FontFace,
    size: f32,
    /// Pixels per font unit
    scale: f32,
    shaping: bool,
    ascender: i32,
    descender: i32,
    height: i32,
    scale_context: ScaleContext,
    supported: FxHashMap<char, bool>,
    placements: FxHashMap<GlyphId, GlyphPlacement>,
    bitmaps: LruCache<GlyphId, GlyphBitmap>,
}

impl RasterFontInstance {
    /// Create an instance of `face` at `size` pixels
    pub fn new(
        id: FontInstanceId,
        face: FontFace,
        size: u32,
        shaping: bool,
        bitmap_cache_capacity: usize,
    ) -> Result<Self> {
        if size == 0 {
            return Err(TextError::FontLoadError(
                "font instance size must be at least one pixel".to_string(),
            ));
        }
        if shaping && rustybuzz::Face::from_slice(face.data(), face.face_index()).is_none() {
            return Err(TextError::FontParseError(
                "face cannot be loaded by the shaper".to_string(),
            ));
        }

        let parsed = face.parse()?;
        let size = size as f32;
        let scale = size / parsed.units_per_em() as f32;
        let ascender = (parsed.ascender() as f32 * scale).round() as i32;
        let descender = (parsed.descender() as f32 * scale).round() as i32;
        let line = parsed.ascender() as i32 - parsed.descender() as i32 + parsed.line_gap() as i32;
        let height = (line as f32 * scale).round() as i32;

        let capacity = NonZeroUsize::new(bitmap_cache_capacity).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            id,
            face,
            size,
            scale,
            shaping,
            ascender,
            descender,
            height,
            scale_context: ScaleContext::new(),
            supported: FxHashMap::default(),
            placements: FxHashMap::default(),
            bitmaps: LruCache::new(capacity),
        })
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn is_shaping(&self) -> bool {
        self.shaping
    }

    pub fn face(&self) -> &FontFace {
        &self.face
    }

    fn to_pixels(&self, font_units: f32) -> i32 {
        (font_units * self.scale).round() as i32
    }

    /// Pixel bounds of a glyph, from the outline when the face has outlines
    fn placement(&mut self, face: &ttf_parser::Face<'_>, glyph: GlyphId) -> GlyphPlacement {
        if let Some(placement) = self.placements.get(&glyph) {
            return *placement;
        }
        let placement = if has_outlines(face) {
            face.glyph_bounding_box(ttf_parser::GlyphId(glyph.0 as u16))
                .map_or(GlyphPlacement::default(), |bounds| {
                    outline_placement(bounds, self.scale)
                })
        } else {
            // Bitmap-only faces: the strike decides the extent.
            match rasterize(&mut self.scale_context, &self.face, self.size, glyph) {
                Some(image) => GlyphPlacement {
                    left: image.placement.left,
                    top: image.placement.top,
                    width: image.placement.width,
                    height: image.placement.height,
                },
                None => GlyphPlacement::default(),
            }
        };
        self.placements.insert(glyph, placement);
        placement
    }

    fn metrics(
        &mut self,
        face: &ttf_parser::Face<'_>,
        glyph: GlyphId,
        advance: i32,
        offset_x: i32,
        offset_y: i32,
    ) -> GlyphMetrics {
        let placement = self.placement(face, glyph);
        let (width, height) = if placement.width == 0 || placement.height == 0 {
            (0, 0)
        } else {
            (placement.width, placement.height)
        };
        GlyphMetrics {
            key: GlyphKey::new(glyph, self.id),
            width,
            height,
            pos_x: placement.left + offset_x,
            pos_y: placement.top - height as i32 + offset_y,
            advance,
        }
    }

    fn append_plain(&mut self, chars: &[char], out: &mut Vec<GlyphMetrics>) {
        let face_data = self.face.clone();
        let face = match face_data.parse() {
            Ok(face) => face,
            Err(e) => {
                tracing::error!("Font instance {:?}: {}", self.id, e);
                return;
            }
        };

        let mut previous: Option<ttf_parser::GlyphId> = None;
        for &c in chars {
            let glyph = face.glyph_index(c).unwrap_or(ttf_parser::GlyphId(0));
            let advance = face.glyph_hor_advance(glyph).unwrap_or(0) as i32;
            let kerning = previous.map_or(0, |left| pair_kerning(&face, left, glyph));
            let advance = self.to_pixels((advance + kerning) as f32);
            out.push(self.metrics(&face, GlyphId(glyph.0 as u32), advance, 0, 0));
            previous = Some(glyph);
        }
    }

    fn append_shaped(&mut self, chars: &[char], out: &mut Vec<GlyphMetrics>) {
        let face_data = self.face.clone();
        let Some(face) = rustybuzz::Face::from_slice(face_data.data(), face_data.face_index())
        else {
            tracing::error!("Font instance {:?}: face cannot be shaped", self.id);
            return;
        };

        for shaped in shaper::shape(&face, chars) {
            let advance = self.to_pixels(shaped.x_advance as f32);
            let offset_x = self.to_pixels(shaped.x_offset as f32);
            let offset_y = self.to_pixels(shaped.y_offset as f32);
            out.push(self.metrics(&face, shaped.glyph, advance, offset_x, offset_y));
        }
    }
}

impl FontInstance for RasterFontInstance {
    fn id(&self) -> FontInstanceId {
        self.id
    }

    fn supports_character(&mut self, c: char) -> bool {
        if let Some(supported) = self.supported.get(&c) {
            return *supported;
        }
        let supported = self
            .face
            .parse()
            .map(|face| face.glyph_index(c).is_some())
            .unwrap_or(false);
        self.supported.insert(c, supported);
        supported
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn ascender(&self) -> i32 {
        self.ascender
    }

    fn descender(&self) -> i32 {
        self.descender
    }

    fn load_and_append_glyph_metrics(&mut self, chars: &[char], out: &mut Vec<GlyphMetrics>) {
        if chars.is_empty() {
            return;
        }
        if self.shaping {
            self.append_shaped(chars, out);
        } else {
            self.append_plain(chars, out);
        }
    }

    fn load_glyph_bitmap_data(&mut self, glyph: GlyphId) -> GlyphBitmap {
        if let Some(bitmap) = self.bitmaps.get(&glyph) {
            return bitmap.clone();
        }

        let face_data = self.face.clone();
        let placement = match face_data.parse() {
            Ok(face) => self.placement(&face, glyph),
            Err(e) => {
                tracing::error!("Font instance {:?}: {}", self.id, e);
                GlyphPlacement::default()
            }
        };

        let bitmap = match rasterize(&mut self.scale_context, &self.face, self.size, glyph) {
            Some(image) if placement.width > 0 && placement.height > 0 => {
                let (width, height) = (image.placement.width, image.placement.height);
                let pixels = (width * height) as usize;
                let coverage = if image.data.len() == pixels * 4 {
                    // Color sources come back as RGBA; keep coverage only.
                    image.data.chunks_exact(4).map(|rgba| rgba[3]).collect()
                } else {
                    image.data
                };
                let rendered = GlyphPlacement {
                    left: image.placement.left,
                    top: image.placement.top,
                    width,
                    height,
                };
                GlyphBitmap {
                    data: blit_to_placement(&coverage, rendered, placement),
                    width: placement.width,
                    height: placement.height,
                }
            }
            _ => GlyphBitmap::default(),
        };

        tracing::trace!(
            "font instance {:?}: rasterized glyph {} ({}x{})",
            self.id,
            glyph.0,
            bitmap.width,
            bitmap.height
        );
        self.bitmaps.put(glyph, bitmap.clone());
        bitmap
    }
}

/// Horizontal kerning between two glyphs in font units
fn pair_kerning(face: &ttf_parser::Face<'_>, left: ttf_parser::GlyphId, right: ttf_parser::GlyphId) -> i32 {
    let Some(kern) = face.tables().kern else {
        return 0;
    };
    kern.subtables
        .into_iter()
        .filter(|subtable| subtable.horizontal && !subtable.variable)
        .find_map(|subtable| subtable.glyphs_kerning(left, right))
        .map_or(0, |value| value as i32)
}

fn has_outlines(face: &ttf_parser::Face<'_>) -> bool {
    let tables = face.tables();
    tables.glyf.is_some() || tables.cff.is_some()
}

/// Whole-pixel box around scaled outline bounds, y up
fn outline_placement(bounds: ttf_parser::Rect, scale: f32) -> GlyphPlacement {
    let left = (bounds.x_min as f32 * scale).floor() as i32;
    let right = (bounds.x_max as f32 * scale).ceil() as i32;
    let bottom = (bounds.y_min as f32 * scale).floor() as i32;
    let top = (bounds.y_max as f32 * scale).ceil() as i32;
    if right <= left || top <= bottom {
        return GlyphPlacement::default();
    }
    GlyphPlacement {
        left,
        top,
        width: (right - left) as u32,
        height: (top - bottom) as u32,
    }
}

/// Copy coverage rendered at `source` into a zeroed buffer laid out as `target`
///
/// Rows or columns of the rendering outside `target` are cropped.
fn blit_to_placement(data: &[u8], source: GlyphPlacement, target: GlyphPlacement) -> Vec<u8> {
    if source == target {
        return data.to_vec();
    }
    let mut out = vec![0u8; target.width as usize * target.height as usize];
    let dx = source.left - target.left;
    let dy = target.top - source.top;
    for row in 0..source.height as i32 {
        let target_row = row + dy;
        if target_row < 0 || target_row >= target.height as i32 {
            continue;
        }
        for column in 0..source.width as i32 {
            let target_column = column + dx;
            if target_column < 0 || target_column >= target.width as i32 {
                continue;
            }
            let value = data
                .get((row * source.width as i32 + column) as usize)
                .copied()
                .unwrap_or(0);
            out[(target_row * target.width as i32 + target_column) as usize] = value;
        }
    }
    out
}

/// Render one glyph as 8-bit coverage
fn rasterize(
    context: &mut ScaleContext,
    face: &FontFace,
    size: f32,
    glyph: GlyphId,
) -> Option<swash::scale::image::Image> {
    let font = swash::FontRef::from_index(face.data(), face.face_index() as usize)?;
    let mut scaler = context.builder(font).size(size).build();
    Render::new(&[
        Source::Outline,
        Source::Bitmap(StrikeWith::BestFit),
        Source::ColorBitmap(StrikeWith::BestFit),
    ])
    .format(Format::Alpha)
    .render(&mut scaler, glyph.0 as u16)
}

impl std::fmt::Debug for RasterFontInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterFontInstance")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("shaping", &self.shaping)
            .finish()
    }
}
