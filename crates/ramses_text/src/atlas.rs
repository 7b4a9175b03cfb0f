//! Glyph texture atlas
//!
//! Packs glyph bitmaps into fixed-size pages and builds the quads that sample
//! them. Every glyph occurrence mapped onto a page holds one reference; the
//! space of a glyph is given back to its page as soon as the last reference
//! is unmapped.

use crate::font::{GlyphKey, GlyphMetrics};
use crate::page::{GlyphTexturePage, Quad, QuadOffset, QuadSize};
use crate::{Result, TextError};
use rustc_hash::FxHashMap;
use std::path::Path;

/// Empty border around each glyph on a page, in pixels
pub const PADDING: u32 = 1;
const HALF_PADDING: f32 = PADDING as f32 / 2.0;

/// Renderable data for one run of glyphs
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphGeometry {
    /// Page sampled by every quad of this geometry
    pub atlas_page: usize,
    /// Two floats per vertex, four vertices per quad
    pub positions: Vec<f32>,
    /// Two floats per vertex, normalized to the page size
    pub texcoords: Vec<f32>,
    /// Six indices per quad
    pub indices: Vec<u16>,
}

#[derive(Clone, Debug)]
struct GlyphBitmapEntry {
    size: QuadSize,
    data: Vec<u8>,
}

#[derive(Clone, Copy, Debug)]
struct GlyphPlacement {
    /// Padded quad on the page, `None` for glyphs without area
    quad: Option<Quad>,
    refcount: u32,
}

#[derive(Debug)]
struct AtlasPage {
    texture: GlyphTexturePage,
    glyphs: FxHashMap<GlyphKey, GlyphPlacement>,
}

/// Set of atlas pages plus the glyph bitmaps that can be placed on them
#[derive(Debug)]
pub struct GlyphTextureAtlas {
    page_size: QuadSize,
    pages: Vec<AtlasPage>,
    /// Registered bitmaps outlive their placements so that remapping a glyph
    /// skips rasterization; see [`release_unused_bitmaps`](Self::release_unused_bitmaps).
    bitmaps: FxHashMap<GlyphKey, GlyphBitmapEntry>,
}

impl GlyphTextureAtlas {
    pub fn new(page_size: QuadSize) -> Self {
        Self {
            page_size,
            pages: Vec::new(),
            bitmaps: FxHashMap::default(),
        }
    }

    pub fn page_size(&self) -> QuadSize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<&GlyphTexturePage> {
        self.pages.get(index).map(|p| &p.texture)
    }

    pub fn mark_page_clean(&mut self, index: usize) {
        if let Some(page) = self.pages.get_mut(index) {
            page.texture.mark_clean();
        }
    }

    /// Remember the bitmap of a glyph; known glyphs are left untouched
    pub fn register_glyph(&mut self, key: GlyphKey, size: QuadSize, data: Vec<u8>) {
        if self.bitmaps.contains_key(&key) {
            return;
        }
        if data.len() as u64 != size.area() {
            tracing::warn!(
                "Glyph {:?} bitmap has {} bytes, expected {}x{}; not registered",
                key,
                data.len(),
                size.width,
                size.height
            );
            return;
        }
        self.bitmaps.insert(key, GlyphBitmapEntry { size, data });
    }

    pub fn is_glyph_registered(&self, key: GlyphKey) -> bool {
        self.bitmaps.contains_key(&key)
    }

    /// Drop the bitmaps of glyphs that are not mapped on any page
    ///
    /// Returns the number of bitmaps released.
    pub fn release_unused_bitmaps(&mut self) -> usize {
        let before = self.bitmaps.len();
        let pages = &self.pages;
        self.bitmaps
            .retain(|key, _| pages.iter().any(|page| page.glyphs.contains_key(key)));
        let released = before - self.bitmaps.len();
        tracing::debug!("atlas: released {} unused glyph bitmaps", released);
        released
    }

    /// Number of mapped occurrences of `key` on `page`
    pub fn glyph_refcount(&self, key: GlyphKey, page: usize) -> u32 {
        self.pages
            .get(page)
            .and_then(|p| p.glyphs.get(&key))
            .map_or(0, |placement| placement.refcount)
    }

    /// Place all glyphs on one page and build their quads
    ///
    /// Fails without changing any state if a glyph with area is not
    /// registered, if the glyphs cannot share one page, or if the quads need
    /// more vertices than 16 bit indices address.
    pub fn map_glyphs_and_create_geometry(&mut self, glyphs: &[GlyphMetrics]) -> Result<GlyphGeometry> {
        let renderable = glyphs.iter().filter(|g| g.has_area()).count();
        if renderable * 4 > u16::MAX as usize + 1 {
            return Err(TextError::TooManyVertices(renderable * 4));
        }

        let mut keys: Vec<GlyphKey> = Vec::new();
        for glyph in glyphs.iter().filter(|g| g.has_area()) {
            if !self.bitmaps.contains_key(&glyph.key) {
                return Err(TextError::GlyphNotRegistered(glyph.key));
            }
            if !keys.contains(&glyph.key) {
                keys.push(glyph.key);
            }
        }
        // Largest glyphs first, stable for equal areas.
        keys.sort_by_key(|key| std::cmp::Reverse(self.bitmaps[key].size.area()));

        let page_index = self.select_page(&keys)?;
        self.place_missing_glyphs(page_index, &keys)?;

        let page = &mut self.pages[page_index];
        for glyph in glyphs {
            page.glyphs
                .entry(glyph.key)
                .or_insert(GlyphPlacement {
                    quad: None,
                    refcount: 0,
                })
                .refcount += 1;
        }

        tracing::trace!(
            "atlas: mapped {} glyphs ({} unique) onto page {}",
            glyphs.len(),
            keys.len(),
            page_index
        );
        Ok(self.build_geometry(page_index, glyphs))
    }

    /// Drop one reference per occurrence; unreferenced space is freed
    pub fn unmap_glyphs_from_page(&mut self, glyphs: &[GlyphMetrics], page: usize) {
        let Some(atlas_page) = self.pages.get_mut(page) else {
            tracing::error!("Cannot unmap glyphs from unknown atlas page {}", page);
            return;
        };

        for glyph in glyphs {
            let Some(placement) = atlas_page.glyphs.get_mut(&glyph.key) else {
                tracing::warn!("Glyph {:?} is not mapped on atlas page {}", glyph.key, page);
                continue;
            };
            placement.refcount = placement.refcount.saturating_sub(1);
            if placement.refcount > 0 {
                continue;
            }
            if let Some(quad) = placement.quad {
                atlas_page.texture.clear_region(quad);
                atlas_page.texture.release_space(quad);
            }
            atlas_page.glyphs.remove(&glyph.key);
        }
    }

    /// Write an atlas page as a grayscale PNG
    pub fn save_page_png(&self, page: usize, path: impl AsRef<Path>) -> Result<()> {
        let texture = self
            .page(page)
            .ok_or(TextError::UnknownAtlasPage(page))?;
        let size = texture.size();
        image::save_buffer(
            path,
            texture.pixels(),
            size.width,
            size.height,
            image::ExtendedColorType::L8,
        )?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Packing
    // ─────────────────────────────────────────────────────────────────────────

    fn padded_size(&self, key: &GlyphKey) -> QuadSize {
        let size = self.bitmaps[key].size;
        QuadSize::new(size.width + 2 * PADDING, size.height + 2 * PADDING)
    }

    fn missing_sizes(&self, page: &AtlasPage, keys: &[GlyphKey]) -> Vec<QuadSize> {
        keys.iter()
            .filter(|key| !page.glyphs.contains_key(*key))
            .map(|key| self.padded_size(key))
            .collect()
    }

    /// First page that can hold every glyph it does not have yet
    fn select_page(&mut self, keys: &[GlyphKey]) -> Result<usize> {
        for (index, page) in self.pages.iter().enumerate() {
            if page.texture.can_fit_all(&self.missing_sizes(page, keys)) {
                return Ok(index);
            }
        }

        let page = AtlasPage {
            texture: GlyphTexturePage::new(self.page_size),
            glyphs: FxHashMap::default(),
        };
        if !page.texture.can_fit_all(&self.missing_sizes(&page, keys)) {
            tracing::error!(
                "{} glyphs do not fit into an empty {}x{} atlas page",
                keys.len(),
                self.page_size.width,
                self.page_size.height
            );
            return Err(TextError::AtlasFull);
        }
        tracing::debug!("atlas: adding page {}", self.pages.len());
        self.pages.push(page);
        Ok(self.pages.len() - 1)
    }

    fn place_missing_glyphs(&mut self, page_index: usize, keys: &[GlyphKey]) -> Result<()> {
        for key in keys {
            if self.pages[page_index].glyphs.contains_key(key) {
                continue;
            }
            let padded = self.padded_size(key);
            let bitmap = &self.bitmaps[key];
            let page = &mut self.pages[page_index];

            let free_index = page
                .texture
                .find_free_space(padded)
                .ok_or(TextError::AtlasFull)?;
            let quad = page.texture.claim_space(free_index, padded);
            page.texture.write_bitmap(
                QuadOffset {
                    x: quad.origin.x + PADDING,
                    y: quad.origin.y + PADDING,
                },
                bitmap.size.width,
                bitmap.size.height,
                &bitmap.data,
            );
            page.glyphs.insert(
                *key,
                GlyphPlacement {
                    quad: Some(quad),
                    refcount: 0,
                },
            );
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Geometry
    // ─────────────────────────────────────────────────────────────────────────

    fn build_geometry(&self, page_index: usize, glyphs: &[GlyphMetrics]) -> GlyphGeometry {
        let page = &self.pages[page_index];
        let page_width = self.page_size.width as f32;
        let page_height = self.page_size.height as f32;

        let renderable = glyphs.iter().filter(|g| g.has_area()).count();
        let mut geometry = GlyphGeometry {
            atlas_page: page_index,
            positions: Vec::with_capacity(renderable * 8),
            texcoords: Vec::with_capacity(renderable * 8),
            indices: Vec::with_capacity(renderable * 6),
        };

        let mut pen_x = 0i32;
        for glyph in glyphs {
            let placement = page
                .glyphs
                .get(&glyph.key)
                .and_then(|placement| placement.quad);
            if let (true, Some(quad)) = (glyph.has_area(), placement) {
                let left = (pen_x + glyph.pos_x) as f32;
                let right = left + glyph.width as f32;
                let bottom = glyph.pos_y as f32;
                let top = bottom + glyph.height as f32;

                geometry.positions.extend_from_slice(&[
                    left - HALF_PADDING,
                    bottom - HALF_PADDING,
                    left - HALF_PADDING,
                    top + HALF_PADDING,
                    right + HALF_PADDING,
                    top + HALF_PADDING,
                    right + HALF_PADDING,
                    bottom - HALF_PADDING,
                ]);

                let tex_left = (quad.origin.x + PADDING) as f32 - HALF_PADDING;
                let tex_right = (quad.origin.x + PADDING + glyph.width) as f32 + HALF_PADDING;
                let tex_top = (quad.origin.y + PADDING) as f32 - HALF_PADDING;
                let tex_bottom = (quad.origin.y + PADDING + glyph.height) as f32 + HALF_PADDING;
                geometry.texcoords.extend_from_slice(&[
                    tex_left / page_width,
                    tex_bottom / page_height,
                    tex_left / page_width,
                    tex_top / page_height,
                    tex_right / page_width,
                    tex_top / page_height,
                    tex_right / page_width,
                    tex_bottom / page_height,
                ]);

                let base = (geometry.positions.len() / 2 - 4) as u16;
                geometry
                    .indices
                    .extend_from_slice(&[base + 2, base + 1, base, base + 3, base + 2, base]);
            }
            pen_x += glyph.advance;
        }
        geometry
    }
}
