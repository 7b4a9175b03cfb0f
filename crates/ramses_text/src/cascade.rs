//! Font cascade
//!
//! Chooses, per character, the first font instance of a priority list that
//! can render it and falls back to a replacement character otherwise.

use crate::font::{FontAccessor, FontInstanceId, FontInstanceOffset, FontInstanceOffsets};
use rustc_hash::FxHashSet;

/// Ordered font instances plus the fallback used when none supports a character
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontCascade {
    /// Characters removed from the input before font lookup
    pub excluded_characters: FxHashSet<char>,
    /// Instances tried in order for every character
    pub font_priority: Vec<FontInstanceId>,
    pub fallback_font: FontInstanceId,
    pub fallback_character: char,
}

impl FontCascade {
    pub fn new(font_priority: Vec<FontInstanceId>, fallback_font: FontInstanceId) -> Self {
        Self {
            excluded_characters: FxHashSet::default(),
            font_priority,
            fallback_font,
            fallback_character: char::REPLACEMENT_CHARACTER,
        }
    }

    pub fn with_excluded_characters(mut self, excluded: impl IntoIterator<Item = char>) -> Self {
        self.excluded_characters.extend(excluded);
        self
    }

    pub fn with_fallback_character(mut self, c: char) -> Self {
        self.fallback_character = c;
        self
    }
}

/// Filter `text` and split it into runs per font instance
///
/// Stops at the first NUL. Returns the characters to render (excluded ones
/// removed, unsupported ones replaced by the fallback character) and the
/// offsets at which the font instance changes.
pub fn filter_and_find_font_instances_for_string(
    cascade: &FontCascade,
    fonts: &mut dyn FontAccessor,
    text: &[char],
) -> (Vec<char>, FontInstanceOffsets) {
    let mut filtered = Vec::with_capacity(text.len());
    let mut offsets = FontInstanceOffsets::new();

    for &c in text.iter().take_while(|c| **c != '\0') {
        if cascade.excluded_characters.contains(&c) {
            continue;
        }

        let supporting = cascade.font_priority.iter().copied().find(|id| {
            match fonts.font_instance(*id) {
                Some(instance) => instance.supports_character(c),
                None => {
                    tracing::error!("FontCascade: unknown font instance {:?}", id);
                    false
                }
            }
        });
        let (instance, rendered) = match supporting {
            Some(instance) => (instance, c),
            None => {
                tracing::trace!(
                    "FontCascade: no font for U+{:04X}, using fallback",
                    c as u32
                );
                (cascade.fallback_font, cascade.fallback_character)
            }
        };

        if offsets.last().map(|o| o.instance) != Some(instance) {
            offsets.push(FontInstanceOffset {
                instance,
                begin: filtered.len(),
            });
        }
        filtered.push(rendered);
    }

    (filtered, offsets)
}
