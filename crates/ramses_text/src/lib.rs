//! Text rendering for RAMSES scenes
//!
//! This crate provides:
//! - UTF-8/UTF-16/UTF-32 decoding and conversion
//! - Font loading (paths, file regions, descriptors, system families via fontdb)
//! - Glyph metrics and rasterization (ttf-parser + swash), optional shaping (rustybuzz)
//! - Font cascades mapping characters to font instances
//! - A reference counted glyph texture atlas
//! - A text cache that turns glyph runs into scene meshes

pub mod atlas;
pub mod cache;
pub mod cascade;
pub mod config;
pub mod font;
pub mod instance;
pub mod layout;
pub mod library;
pub mod page;
pub mod registry;
pub mod shaper;
pub mod utf;

pub use atlas::{GlyphGeometry, GlyphTextureAtlas};
pub use cache::{TextCache, TextLine};
pub use cascade::{filter_and_find_font_instances_for_string, FontCascade};
pub use config::TextConfig;
pub use font::{
    FontAccessor, FontFace, FontId, FontInstance, FontInstanceId, FontInstanceOffset,
    FontInstanceOffsets, GlyphBitmap, GlyphId, GlyphKey, GlyphMetrics, TextLineId,
};
pub use instance::RasterFontInstance;
pub use layout::{bounding_box_for_string, find_fitting_substring, TextBoundingBox};
pub use library::LibraryHandle;
pub use page::{GlyphTexturePage, Quad, QuadOffset, QuadSize};
pub use registry::FontRegistry;

use thiserror::Error;

/// Text rendering errors
#[derive(Error, Debug)]
pub enum TextError {
    #[error("Failed to load font: {0}")]
    FontLoadError(String),

    #[error("Failed to parse font: {0}")]
    FontParseError(String),

    #[error("Unknown font instance: {0:?}")]
    UnknownFontInstance(FontInstanceId),

    #[error("Glyph {0:?} has no registered bitmap")]
    GlyphNotRegistered(GlyphKey),

    #[error("Glyphs do not fit into a single atlas page")]
    AtlasFull,

    #[error("Atlas has no page {0}")]
    UnknownAtlasPage(usize),

    #[error("Text line has no renderable glyphs")]
    NoRenderableGlyphs,

    #[error("Effect is missing the text input for {0:?}")]
    MissingEffectInput(ramses_scene::EffectSemantic),

    #[error("Text line needs {0} vertices, more than 16 bit indices can address")]
    TooManyVertices(usize),

    #[error("Scene backend error: {0}")]
    Scene(#[from] ramses_scene::SceneError),

    #[error("Failed to write atlas page: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid font data")]
    InvalidFontData,
}

pub type Result<T> = std::result::Result<T, TextError>;
