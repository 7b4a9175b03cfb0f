//! Font registry
//!
//! Owns font faces and sized font instances and hands out [`FontId`] and
//! [`FontInstanceId`] handles for them. Faces can be loaded from a path, from
//! a byte range of a larger container file, from a file descriptor or by
//! family name from the system fonts known to the shared library.

use crate::config::TextConfig;
use crate::font::{FontAccessor, FontFace, FontId, FontInstance, FontInstanceId};
use crate::instance::RasterFontInstance;
use crate::library::LibraryHandle;
use crate::{Result, TextError};
use fontdb::{Family, Query, Source, Stretch, Style, Weight};
use indexmap::IndexMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

struct InstanceEntry {
    font: FontId,
    instance: Box<dyn FontInstance>,
}

/// Owner of all fonts and font instances
pub struct FontRegistry {
    library: LibraryHandle<'static>,
    fonts: IndexMap<FontId, FontFace>,
    instances: IndexMap<FontInstanceId, InstanceEntry>,
    next_font: u32,
    next_instance: u32,
    bitmap_cache_capacity: usize,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::with_config(&TextConfig::default())
    }

    pub fn with_config(config: &TextConfig) -> Self {
        Self {
            library: LibraryHandle::acquire_global(),
            fonts: IndexMap::new(),
            instances: IndexMap::new(),
            next_font: 0,
            next_instance: 0,
            bitmap_cache_capacity: config.bitmap_cache_capacity,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Fonts
    // ─────────────────────────────────────────────────────────────────────────

    /// Load a font file
    pub fn create_font(&mut self, path: impl AsRef<Path>) -> Result<FontId> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            TextError::FontLoadError(format!("Failed to read font file {:?}: {}", path, e))
        });
        self.add_font_data(data, 0)
    }

    /// Load a font stored at `offset..offset + length` of a container file
    pub fn create_font_from_reader_region<R: Read + Seek>(
        &mut self,
        reader: &mut R,
        offset: u64,
        length: usize,
    ) -> Result<FontId> {
        let data = read_region(reader, offset, length);
        self.add_font_data(data, 0)
    }

    /// Load a font stored at `offset..offset + length` behind a file descriptor
    ///
    /// The descriptor's file offset is left untouched.
    #[cfg(unix)]
    pub fn create_font_from_fd(
        &mut self,
        fd: std::os::fd::BorrowedFd<'_>,
        offset: u64,
        length: usize,
    ) -> Result<FontId> {
        use std::os::unix::fs::FileExt;

        let data = fd
            .try_clone_to_owned()
            .map(File::from)
            .and_then(|file| {
                let mut data = vec![0u8; length];
                file.read_exact_at(&mut data, offset)?;
                Ok(data)
            })
            .map_err(|e| {
                TextError::FontLoadError(format!(
                    "Failed to read {} bytes at offset {} from descriptor: {}",
                    length, offset, e
                ))
            });
        self.add_font_data(data, 0)
    }

    /// Load font data already in memory
    pub fn create_font_from_data(&mut self, data: Vec<u8>) -> Result<FontId> {
        self.add_font_data(Ok(data), 0)
    }

    /// Load a system font by family name
    pub fn create_system_font(&mut self, family: &str) -> Result<FontId> {
        let query = Query {
            families: &[Family::Name(family)],
            weight: Weight::NORMAL,
            style: Style::Normal,
            stretch: Stretch::Normal,
        };
        let database = self.library.database();
        let loaded = database
            .query(&query)
            .and_then(|id| database.face_source(id))
            .ok_or_else(|| TextError::FontLoadError(format!("Font '{}' not found", family)))
            .and_then(|(source, face_index)| {
                let data = match source {
                    Source::File(path) => std::fs::read(&path).map_err(|e| {
                        TextError::FontLoadError(format!(
                            "Failed to read font file {:?}: {}",
                            path, e
                        ))
                    })?,
                    Source::Binary(data) => data.as_ref().as_ref().to_vec(),
                    Source::SharedFile(_path, data) => data.as_ref().as_ref().to_vec(),
                };
                Ok((data, face_index))
            });

        match loaded {
            Ok((data, face_index)) => self.add_font_data(Ok(data), face_index),
            Err(e) => {
                tracing::error!("FontRegistry::create_system_font: {}", e);
                Err(e)
            }
        }
    }

    /// Remove a font together with all of its instances
    pub fn delete_font(&mut self, id: FontId) -> bool {
        if self.fonts.shift_remove(&id).is_none() {
            tracing::error!("FontRegistry::delete_font: unknown font {:?}", id);
            return false;
        }
        self.instances.retain(|_, entry| entry.font != id);
        true
    }

    pub fn font(&self, id: FontId) -> Option<&FontFace> {
        self.fonts.get(&id)
    }

    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }

    fn add_font_data(&mut self, data: Result<Vec<u8>>, face_index: u32) -> Result<FontId> {
        let face = data.and_then(|data| FontFace::from_data_with_index(data, face_index));
        match face {
            Ok(face) => {
                let id = FontId(self.next_font);
                self.next_font += 1;
                tracing::debug!("FontRegistry: created font {:?} ({:?})", id, face);
                self.fonts.insert(id, face);
                Ok(id)
            }
            Err(e) => {
                tracing::error!("FontRegistry: failed to create font: {}", e);
                Err(e)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Font instances
    // ─────────────────────────────────────────────────────────────────────────

    /// Instance of `font` at `size` pixels, one glyph per character
    pub fn create_font_instance(&mut self, font: FontId, size: u32) -> Result<FontInstanceId> {
        self.add_font_instance(font, size, false)
    }

    /// Instance of `font` at `size` pixels, shaped with bidi support
    pub fn create_font_instance_with_shaping(
        &mut self,
        font: FontId,
        size: u32,
    ) -> Result<FontInstanceId> {
        self.add_font_instance(font, size, true)
    }

    pub fn delete_font_instance(&mut self, id: FontInstanceId) -> bool {
        if self.instances.shift_remove(&id).is_none() {
            tracing::error!("FontRegistry::delete_font_instance: unknown instance {:?}", id);
            return false;
        }
        true
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    fn add_font_instance(&mut self, font: FontId, size: u32, shaping: bool) -> Result<FontInstanceId> {
        let Some(face) = self.fonts.get(&font) else {
            tracing::error!("FontRegistry: cannot create instance of unknown font {:?}", font);
            return Err(TextError::FontLoadError(format!("Unknown font {:?}", font)));
        };

        let id = FontInstanceId(self.next_instance);
        let instance =
            RasterFontInstance::new(id, face.clone(), size, shaping, self.bitmap_cache_capacity)
                .map_err(|e| {
                    tracing::error!("FontRegistry: failed to create font instance: {}", e);
                    e
                })?;
        self.next_instance += 1;
        self.instances.insert(
            id,
            InstanceEntry {
                font,
                instance: Box::new(instance),
            },
        );
        Ok(id)
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontAccessor for FontRegistry {
    fn font_instance(&mut self, id: FontInstanceId) -> Option<&mut dyn FontInstance> {
        match self.instances.get_mut(&id) {
            Some(entry) => Some(entry.instance.as_mut()),
            None => None,
        }
    }
}

fn read_region<R: Read + Seek>(reader: &mut R, offset: u64, length: usize) -> Result<Vec<u8>> {
    let mut data = vec![0u8; length];
    reader
        .seek(SeekFrom::Start(offset))
        .and_then(|_| reader.read_exact(&mut data))
        .map_err(|e| {
            TextError::FontLoadError(format!(
                "Failed to read {} bytes at offset {}: {}",
                length, offset, e
            ))
        })?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_fails() {
        let mut registry = FontRegistry::new();
        assert!(registry.create_font("/nonexistent/font.ttf").is_err());
        assert_eq!(registry.font_count(), 0);
    }

    #[test]
    fn test_garbage_data_fails() {
        let mut registry = FontRegistry::new();
        assert!(registry.create_font_from_data(vec![1, 2, 3]).is_err());
    }

    #[test]
    fn test_region_out_of_range_fails() {
        let mut registry = FontRegistry::new();
        let mut reader = std::io::Cursor::new(vec![0u8; 16]);
        assert!(registry
            .create_font_from_reader_region(&mut reader, 8, 64)
            .is_err());
    }

    #[test]
    fn test_unknown_ids() {
        let mut registry = FontRegistry::new();
        assert!(!registry.delete_font(FontId(0)));
        assert!(!registry.delete_font_instance(FontInstanceId(0)));
        assert!(registry.create_font_instance(FontId(0), 12).is_err());
        assert!(registry.font_instance(FontInstanceId(0)).is_none());
    }
}
