//! Text cache
//!
//! Turns runs of characters into positioned glyphs and positioned glyphs into
//! renderable text lines. Glyph bitmaps are rasterized on first use, packed
//! into the glyph atlas and uploaded as one texture per atlas page. Every text
//! line owns its own buffers and mesh in the scene backend.

use crate::atlas::{GlyphGeometry, GlyphTextureAtlas};
use crate::config::TextConfig;
use crate::font::{
    FontAccessor, FontInstanceId, FontInstanceOffset, GlyphBitmap, GlyphMetrics, TextLineId,
};
use crate::page::QuadSize;
use crate::{Result, TextError};
use indexmap::IndexMap;
use ramses_scene::{EffectSemantic, GeometryBackend, SceneObjectId, TextMeshDescription};

/// A renderable line of text and the scene objects backing it
#[derive(Clone, Debug, PartialEq)]
pub struct TextLine {
    pub glyphs: Vec<GlyphMetrics>,
    /// Atlas page sampled by this line
    pub atlas_page: usize,
    pub mesh_node: SceneObjectId,
    pub appearance: SceneObjectId,
    pub geometry: SceneObjectId,
    pub indices: SceneObjectId,
    pub positions: SceneObjectId,
    pub texcoords: SceneObjectId,
}

impl TextLine {
    fn scene_objects(&self) -> [SceneObjectId; 6] {
        [
            self.mesh_node,
            self.appearance,
            self.geometry,
            self.indices,
            self.positions,
            self.texcoords,
        ]
    }
}

/// Owner of the glyph atlas and all text lines of one scene
pub struct TextCache<S: GeometryBackend, F: FontAccessor> {
    scene: S,
    fonts: F,
    atlas: GlyphTextureAtlas,
    /// Texture of each atlas page, indexed like the pages
    page_textures: Vec<SceneObjectId>,
    lines: IndexMap<TextLineId, TextLine>,
    next_line: u32,
}

impl<S: GeometryBackend, F: FontAccessor> TextCache<S, F> {
    /// Create a cache whose atlas pages are `page_size` pixels large
    pub fn new(scene: S, fonts: F, page_size: QuadSize) -> Self {
        Self {
            scene,
            fonts,
            atlas: GlyphTextureAtlas::new(page_size),
            page_textures: Vec::new(),
            lines: IndexMap::new(),
            next_line: 0,
        }
    }

    pub fn with_config(scene: S, fonts: F, config: &TextConfig) -> Self {
        Self::new(scene, fonts, config.atlas_page_size())
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn fonts(&self) -> &F {
        &self.fonts
    }

    pub fn fonts_mut(&mut self) -> &mut F {
        &mut self.fonts
    }

    pub fn atlas(&self) -> &GlyphTextureAtlas {
        &self.atlas
    }

    /// Scene texture holding atlas page `page`
    pub fn page_texture(&self, page: usize) -> Option<SceneObjectId> {
        self.page_textures.get(page).copied()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Glyph positioning
    // ─────────────────────────────────────────────────────────────────────────

    /// Metrics of `text`, each run rendered with the instance of its offset
    ///
    /// Runs of unknown font instances contribute no glyphs.
    pub fn get_positioned_glyphs(
        &mut self,
        text: &[char],
        offsets: &[FontInstanceOffset],
    ) -> Vec<GlyphMetrics> {
        let mut glyphs = Vec::with_capacity(text.len());
        for (index, offset) in offsets.iter().enumerate() {
            let begin = offset.begin.min(text.len());
            let end = offsets
                .get(index + 1)
                .map_or(text.len(), |next| next.begin.min(text.len()));
            if begin >= end {
                continue;
            }
            self.append_glyphs(&text[begin..end], offset.instance, &mut glyphs);
        }
        glyphs
    }

    /// Metrics of `text` rendered with a single font instance
    pub fn get_positioned_glyphs_for_instance(
        &mut self,
        text: &[char],
        instance: FontInstanceId,
    ) -> Vec<GlyphMetrics> {
        let mut glyphs = Vec::with_capacity(text.len());
        self.append_glyphs(text, instance, &mut glyphs);
        glyphs
    }

    fn append_glyphs(&mut self, text: &[char], instance: FontInstanceId, out: &mut Vec<GlyphMetrics>) {
        match self.fonts.font_instance(instance) {
            Some(font) => font.load_and_append_glyph_metrics(text, out),
            None => tracing::error!(
                "TextCache::get_positioned_glyphs: unknown font instance {:?}, {} characters skipped",
                instance,
                text.len()
            ),
        }
    }

    /// Widen or narrow glyph spacing by `tracking` thousandths of the font size
    pub fn apply_tracking_to_glyphs(glyphs: &mut [GlyphMetrics], tracking: i32, font_size: i32) {
        let delta = font_size * tracking / 1000;
        for glyph in glyphs {
            glyph.advance += delta;
        }
    }

    pub fn contains_renderable_glyphs(glyphs: &[GlyphMetrics]) -> bool {
        glyphs.iter().any(GlyphMetrics::has_area)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Text lines
    // ─────────────────────────────────────────────────────────────────────────

    /// Build a mesh for `glyphs` using a text effect
    ///
    /// The effect must declare position, texture coordinate and texture
    /// inputs. All glyphs are placed on a single atlas page.
    pub fn create_text_line(
        &mut self,
        glyphs: &[GlyphMetrics],
        effect: SceneObjectId,
    ) -> Result<TextLineId> {
        self.try_create_text_line(glyphs, effect)
            .map_err(|e| {
                tracing::error!("TextCache::create_text_line: {}", e);
                e
            })
    }

    fn try_create_text_line(
        &mut self,
        glyphs: &[GlyphMetrics],
        effect: SceneObjectId,
    ) -> Result<TextLineId> {
        if !Self::contains_renderable_glyphs(glyphs) {
            return Err(TextError::NoRenderableGlyphs);
        }
        for semantic in [
            EffectSemantic::TextPositions,
            EffectSemantic::TextTextureCoordinates,
            EffectSemantic::TextTexture,
        ] {
            if self.scene.find_effect_input(effect, semantic).is_none() {
                return Err(TextError::MissingEffectInput(semantic));
            }
        }

        self.register_missing_glyphs(glyphs)?;
        let geometry = self.atlas.map_glyphs_and_create_geometry(glyphs)?;
        let page = geometry.atlas_page;

        let id = TextLineId(self.next_line);
        let created = self
            .upload_dirty_pages()
            .and_then(|_| self.create_line_objects(id, effect, &geometry));
        let line = match created {
            Ok(line) => TextLine {
                glyphs: glyphs.to_vec(),
                ..line
            },
            Err(e) => {
                self.atlas.unmap_glyphs_from_page(glyphs, page);
                return Err(e);
            }
        };

        self.next_line += 1;
        tracing::debug!(
            "TextCache: created text line {:?} with {} glyphs on atlas page {}",
            id,
            glyphs.len(),
            page
        );
        self.lines.insert(id, line);
        Ok(id)
    }

    /// Destroy a text line and release its glyphs from the atlas
    pub fn delete_text_line(&mut self, id: TextLineId) -> bool {
        let Some(line) = self.lines.shift_remove(&id) else {
            tracing::error!("TextCache::delete_text_line: unknown text line {:?}", id);
            return false;
        };

        self.atlas.unmap_glyphs_from_page(&line.glyphs, line.atlas_page);
        for object in line.scene_objects() {
            if let Err(e) = self.scene.destroy_object(object) {
                tracing::warn!("TextCache: failed to destroy {} of text line {:?}: {}", object, id, e);
            }
        }
        true
    }

    pub fn get_text_line(&self, id: TextLineId) -> Option<&TextLine> {
        self.lines.get(&id)
    }

    pub fn get_text_line_mut(&mut self, id: TextLineId) -> Option<&mut TextLine> {
        self.lines.get_mut(&id)
    }

    pub fn text_line_count(&self) -> usize {
        self.lines.len()
    }

    /// Forget rasterized bitmaps of glyphs no text line uses anymore
    pub fn release_unused_glyph_bitmaps(&mut self) -> usize {
        self.atlas.release_unused_bitmaps()
    }

    /// Rasterize glyphs the atlas has not seen yet
    ///
    /// Every glyph's font instance must be known, even for glyphs without
    /// area.
    fn register_missing_glyphs(&mut self, glyphs: &[GlyphMetrics]) -> Result<()> {
        for glyph in glyphs {
            let font = self
                .fonts
                .font_instance(glyph.key.instance)
                .ok_or(TextError::UnknownFontInstance(glyph.key.instance))?;
            if self.atlas.is_glyph_registered(glyph.key) {
                continue;
            }

            let size = QuadSize::new(glyph.width, glyph.height);
            let data = if glyph.has_area() {
                let bitmap = font.load_glyph_bitmap_data(glyph.key.identifier);
                fit_bitmap(bitmap, size)
            } else {
                Vec::new()
            };
            self.atlas.register_glyph(glyph.key, size, data);
        }
        Ok(())
    }

    fn upload_dirty_pages(&mut self) -> Result<()> {
        let page_size = self.atlas.page_size();
        for index in 0..self.atlas.page_count() {
            let Some(page) = self.atlas.page(index) else {
                continue;
            };
            match self.page_textures.get(index) {
                Some(texture) if page.is_dirty() => {
                    self.scene.update_texture(*texture, page.pixels())?;
                }
                Some(_) => continue,
                None => {
                    let texture = self.scene.create_texture(
                        page_size.width,
                        page_size.height,
                        page.pixels(),
                        &format!("text_atlas_page_{}", index),
                    )?;
                    tracing::debug!("TextCache: atlas page {} uploaded as {}", index, texture);
                    self.page_textures.push(texture);
                }
            }
            self.atlas.mark_page_clean(index);
        }
        Ok(())
    }

    fn create_line_objects(
        &mut self,
        id: TextLineId,
        effect: SceneObjectId,
        geometry: &GlyphGeometry,
    ) -> Result<TextLine> {
        let mut created = Vec::with_capacity(3);
        let result = self.build_line_objects(id, effect, geometry, &mut created);
        if result.is_err() {
            for object in created {
                if let Err(e) = self.scene.destroy_object(object) {
                    tracing::warn!("TextCache: failed to clean up {}: {}", object, e);
                }
            }
        }
        result
    }

    fn build_line_objects(
        &mut self,
        id: TextLineId,
        effect: SceneObjectId,
        geometry: &GlyphGeometry,
        created: &mut Vec<SceneObjectId>,
    ) -> Result<TextLine> {
        let texture = self
            .page_textures
            .get(geometry.atlas_page)
            .copied()
            .ok_or(TextError::UnknownAtlasPage(geometry.atlas_page))?;
        let name = format!("text_line_{}", id.0);

        let indices = self
            .scene
            .create_index_buffer(&geometry.indices, &format!("{}_indices", name))?;
        created.push(indices);
        let positions = self
            .scene
            .create_vertex_buffer(&geometry.positions, 2, &format!("{}_positions", name))?;
        created.push(positions);
        let texcoords = self
            .scene
            .create_vertex_buffer(&geometry.texcoords, 2, &format!("{}_texcoords", name))?;
        created.push(texcoords);

        let mesh = self.scene.create_text_mesh(&TextMeshDescription {
            name,
            effect,
            indices,
            positions,
            texcoords,
            texture,
            index_count: geometry.indices.len() as u32,
        })?;

        Ok(TextLine {
            glyphs: Vec::new(),
            atlas_page: geometry.atlas_page,
            mesh_node: mesh.mesh_node,
            appearance: mesh.appearance,
            geometry: mesh.geometry,
            indices,
            positions,
            texcoords,
        })
    }
}

/// Copy a bitmap into a buffer of exactly `size`, cropping or padding with zeros
fn fit_bitmap(bitmap: GlyphBitmap, size: QuadSize) -> Vec<u8> {
    if bitmap.width == size.width && bitmap.height == size.height {
        return bitmap.data;
    }
    tracing::warn!(
        "glyph bitmap is {}x{} but metrics say {}x{}",
        bitmap.width,
        bitmap.height,
        size.width,
        size.height
    );
    let mut data = vec![0u8; size.area() as usize];
    let copy_width = bitmap.width.min(size.width) as usize;
    for row in 0..bitmap.height.min(size.height) as usize {
        let source = row * bitmap.width as usize;
        let target = row * size.width as usize;
        if let Some(line) = bitmap.data.get(source..source + copy_width) {
            data[target..target + copy_width].copy_from_slice(line);
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{FontInstance, GlyphId, GlyphKey};
    use ramses_scene::{InMemoryScene, SceneBackend};
    use rustc_hash::FxHashMap;

    /// Monospace test font: spaces are empty, everything else a full block
    struct BlockFont {
        id: FontInstanceId,
        glyph_size: u32,
        bitmap_loads: usize,
    }

    impl FontInstance for BlockFont {
        fn id(&self) -> FontInstanceId {
            self.id
        }

        fn supports_character(&mut self, _c: char) -> bool {
            true
        }

        fn height(&self) -> i32 {
            self.glyph_size as i32 + 2
        }

        fn ascender(&self) -> i32 {
            self.glyph_size as i32
        }

        fn descender(&self) -> i32 {
            -2
        }

        fn load_and_append_glyph_metrics(&mut self, chars: &[char], out: &mut Vec<GlyphMetrics>) {
            for &c in chars {
                let size = if c == ' ' { 0 } else { self.glyph_size };
                out.push(GlyphMetrics {
                    key: GlyphKey::new(GlyphId(c as u32), self.id),
                    width: size,
                    height: size,
                    pos_x: 0,
                    pos_y: 0,
                    advance: self.glyph_size as i32 + 1,
                });
            }
        }

        fn load_glyph_bitmap_data(&mut self, _glyph: GlyphId) -> GlyphBitmap {
            self.bitmap_loads += 1;
            GlyphBitmap {
                data: vec![255; (self.glyph_size * self.glyph_size) as usize],
                width: self.glyph_size,
                height: self.glyph_size,
            }
        }
    }

    #[derive(Default)]
    struct BlockFonts(FxHashMap<FontInstanceId, BlockFont>);

    impl BlockFonts {
        fn with_sizes(sizes: &[u32]) -> Self {
            let mut fonts = Self::default();
            for (index, size) in sizes.iter().enumerate() {
                let id = FontInstanceId(index as u32);
                fonts.0.insert(
                    id,
                    BlockFont {
                        id,
                        glyph_size: *size,
                        bitmap_loads: 0,
                    },
                );
            }
            fonts
        }
    }

    impl FontAccessor for BlockFonts {
        fn font_instance(&mut self, id: FontInstanceId) -> Option<&mut dyn FontInstance> {
            self.0.get_mut(&id).map(|font| font as &mut dyn FontInstance)
        }
    }

    const SMALL: FontInstanceId = FontInstanceId(0);
    const LARGE: FontInstanceId = FontInstanceId(1);

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    fn text_effect(scene: &mut InMemoryScene) -> SceneObjectId {
        scene.create_effect(
            "text_effect",
            &[
                (EffectSemantic::TextPositions, "a_position"),
                (EffectSemantic::TextTextureCoordinates, "a_texcoord"),
                (EffectSemantic::TextTexture, "u_texture"),
            ],
            &[],
        )
    }

    fn cache(page: u32) -> (TextCache<InMemoryScene, BlockFonts>, SceneObjectId) {
        let mut scene = InMemoryScene::new();
        let effect = text_effect(&mut scene);
        let cache = TextCache::new(
            scene,
            BlockFonts::with_sizes(&[4, 10]),
            QuadSize::new(page, page),
        );
        (cache, effect)
    }

    #[test]
    fn test_positioned_glyphs_per_offset() {
        let (mut cache, _) = cache(64);
        let text = chars("<ignore> test abcd ");
        let offsets = [
            FontInstanceOffset {
                instance: FontInstanceId::INVALID,
                begin: 0,
            },
            FontInstanceOffset {
                instance: SMALL,
                begin: 8,
            },
            FontInstanceOffset {
                instance: LARGE,
                begin: 14,
            },
        ];

        let glyphs = cache.get_positioned_glyphs(&text, &offsets);
        assert_eq!(glyphs.len(), 11);
        assert!(glyphs[..6].iter().all(|g| g.key.instance == SMALL));
        assert!(glyphs[6..].iter().all(|g| g.key.instance == LARGE));
        assert_eq!(glyphs[1].key.identifier, GlyphId('t' as u32));
        assert_eq!(glyphs[6].width, 10);
    }

    #[test]
    fn test_creates_text_line() {
        let (mut cache, effect) = cache(64);
        let glyphs = cache.get_positioned_glyphs_for_instance(&chars(" test "), SMALL);

        let id = cache.create_text_line(&glyphs, effect).unwrap();
        assert!(id.is_valid());

        let line = cache.get_text_line(id).unwrap().clone();
        assert_eq!(line.glyphs, glyphs);
        assert_eq!(line.atlas_page, 0);

        let scene = cache.scene();
        assert_eq!(scene.index_buffer_data(line.indices).unwrap().len(), 24);
        let (components, positions) = scene.vertex_buffer_data(line.positions).unwrap();
        assert_eq!(components, 2);
        assert_eq!(positions.len(), 32);
        assert_eq!(scene.vertex_buffer_data(line.texcoords).unwrap().1.len(), 32);
        assert_eq!(scene.mesh_parameters(line.mesh_node).unwrap().index_count, 24);
        assert_eq!(scene.mesh_appearance(line.mesh_node), Some(line.appearance));
        assert_eq!(scene.appearance_texture(line.appearance), cache.page_texture(0));
    }

    #[test]
    fn test_line_ids_increase() {
        let (mut cache, effect) = cache(64);
        let first = cache.get_positioned_glyphs_for_instance(&chars(" test "), SMALL);
        let second = cache.get_positioned_glyphs_for_instance(&chars("123abc"), SMALL);

        let a = cache.create_text_line(&first, effect).unwrap();
        let b = cache.create_text_line(&second, effect).unwrap();
        assert!(b > a);

        let line = cache.get_text_line(b).unwrap();
        assert_eq!(
            cache.scene().index_buffer_data(line.indices).unwrap().len(),
            36
        );
    }

    #[test]
    fn test_rejects_empty_and_whitespace() {
        let (mut cache, effect) = cache(64);
        assert!(matches!(
            cache.create_text_line(&[], effect),
            Err(TextError::NoRenderableGlyphs)
        ));

        let spaces = cache.get_positioned_glyphs_for_instance(&chars("  "), SMALL);
        assert_eq!(spaces.len(), 2);
        assert!(!TextCache::<InMemoryScene, BlockFonts>::contains_renderable_glyphs(&spaces));
        assert!(cache.create_text_line(&spaces, effect).is_err());
        assert_eq!(cache.text_line_count(), 0);
    }

    #[test]
    fn test_rejects_non_text_effect() {
        let (mut cache, _) = cache(64);
        let effect = cache.scene_mut().create_effect(
            "plain",
            &[(EffectSemantic::TextPositions, "a_position")],
            &[],
        );
        let glyphs = cache.get_positioned_glyphs_for_instance(&chars("x"), SMALL);
        assert!(matches!(
            cache.create_text_line(&glyphs, effect),
            Err(TextError::MissingEffectInput(
                EffectSemantic::TextTextureCoordinates
            ))
        ));
    }

    #[test]
    fn test_rejects_unknown_font_instance() {
        let (mut cache, effect) = cache(64);
        let mut glyphs = cache.get_positioned_glyphs_for_instance(&chars(" test "), SMALL);
        if let Some(last) = glyphs.last_mut() {
            last.key.instance = FontInstanceId(999);
        }
        assert!(matches!(
            cache.create_text_line(&glyphs, effect),
            Err(TextError::UnknownFontInstance(FontInstanceId(999)))
        ));
    }

    #[test]
    fn test_rejects_cached_glyphs_of_removed_instance() {
        let (mut cache, effect) = cache(64);
        let glyphs = cache.get_positioned_glyphs_for_instance(&chars("ab"), SMALL);
        let first = cache.create_text_line(&glyphs, effect).unwrap();
        assert!(cache.atlas().is_glyph_registered(glyphs[0].key));

        cache.fonts_mut().0.remove(&SMALL);
        assert!(matches!(
            cache.create_text_line(&glyphs, effect),
            Err(TextError::UnknownFontInstance(SMALL))
        ));
        assert_eq!(cache.text_line_count(), 1);
        assert_eq!(cache.atlas().glyph_refcount(glyphs[0].key, 0), 1);
        assert!(cache.delete_text_line(first));
    }

    #[test]
    fn test_rejects_text_larger_than_a_page() {
        // 12x12 padded glyphs, a 24x24 page holds four
        let (mut cache, effect) = cache(24);
        let glyphs = cache.get_positioned_glyphs_for_instance(&chars("ABCDEFGH"), LARGE);
        assert!(matches!(
            cache.create_text_line(&glyphs, effect),
            Err(TextError::AtlasFull)
        ));
        assert_eq!(cache.atlas().page_count(), 0);
    }

    #[test]
    fn test_delete_text_line() {
        let (mut cache, effect) = cache(64);
        let glyphs = cache.get_positioned_glyphs_for_instance(&chars(" test "), SMALL);
        let id = cache.create_text_line(&glyphs, effect).unwrap();
        let line = cache.get_text_line(id).unwrap().clone();
        let key = glyphs[1].key;
        assert_eq!(cache.atlas().glyph_refcount(key, 0), 2);

        assert!(cache.delete_text_line(id));
        assert!(!cache.delete_text_line(id));
        assert!(cache.get_text_line(id).is_none());
        assert_eq!(cache.atlas().glyph_refcount(key, 0), 0);
        assert!(!cache.scene().contains(line.mesh_node));
        assert!(!cache.scene().contains(line.positions));
        // the atlas texture outlives the line
        assert!(cache.page_texture(0).is_some());

        // "test" has three distinct inked glyphs plus the space
        assert!(cache.atlas().is_glyph_registered(key));
        assert_eq!(cache.release_unused_glyph_bitmaps(), 4);
        assert!(!cache.atlas().is_glyph_registered(key));
    }

    #[test]
    fn test_unknown_line_ids() {
        let (mut cache, _) = cache(64);
        assert!(cache.get_text_line(TextLineId::INVALID).is_none());
        assert!(cache.get_text_line_mut(TextLineId(3)).is_none());
        assert!(!cache.delete_text_line(TextLineId(3)));
    }

    #[test]
    fn test_bitmaps_are_rasterized_once() {
        let (mut cache, effect) = cache(64);
        let glyphs = cache.get_positioned_glyphs_for_instance(&chars("aaab"), SMALL);
        cache.create_text_line(&glyphs, effect).unwrap();
        cache.create_text_line(&glyphs, effect).unwrap();
        assert_eq!(cache.fonts().0[&SMALL].bitmap_loads, 2);
    }

    #[test]
    fn test_dirty_pages_are_reuploaded() {
        let (mut cache, effect) = cache(64);
        let first = cache.get_positioned_glyphs_for_instance(&chars("ab"), SMALL);
        cache.create_text_line(&first, effect).unwrap();
        let texture = cache.page_texture(0).unwrap();
        assert_eq!(cache.scene().texture_update_count(texture), Some(0));

        let second = cache.get_positioned_glyphs_for_instance(&chars("cd"), SMALL);
        cache.create_text_line(&second, effect).unwrap();
        assert_eq!(cache.scene().texture_update_count(texture), Some(1));

        cache.create_text_line(&first, effect).unwrap();
        assert_eq!(cache.scene().texture_update_count(texture), Some(1));
    }

    #[test]
    fn test_tracking() {
        let mut glyphs = vec![GlyphMetrics {
            key: GlyphKey::new(GlyphId(1), SMALL),
            width: 1,
            height: 1,
            pos_x: 0,
            pos_y: 0,
            advance: 10,
        }];
        TextCache::<InMemoryScene, BlockFonts>::apply_tracking_to_glyphs(&mut glyphs, 500, 20);
        assert_eq!(glyphs[0].advance, 20);
        TextCache::<InMemoryScene, BlockFonts>::apply_tracking_to_glyphs(&mut glyphs, -100, 20);
        assert_eq!(glyphs[0].advance, 18);
    }
}
