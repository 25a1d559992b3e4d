use crate::fonts::Font;
use ets_types::ScaledPoint;
use rustybuzz::{Feature, UnicodeBuffer};
use std::cell::RefCell;
use ttf_parser::{GlyphId, Tag};

// Reuse buffer to avoid allocations when shaping many short strings
thread_local! {
    static SCRATCH_BUFFER: RefCell<Option<UnicodeBuffer>> = RefCell::new(Some(UnicodeBuffer::new()));
}

/// One shaped glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapedGlyph {
    /// Glyph id inside the font.
    pub codepoint: u32,
    pub advance: ScaledPoint,
    /// Source text covered by this glyph. Empty for the trailing glyphs of a
    /// cluster that shaped into several glyphs.
    pub components: String,
    /// Unicode scalar value of the first source character, 0 if none.
    pub glyph: u32,
    pub hyphenate: bool,
    pub is_space: bool,
    pub height: ScaledPoint,
    pub depth: ScaledPoint,
}

impl Font {
    /// Shapes `text` left to right with ligatures and kerning enabled.
    ///
    /// Returns an empty sequence if the face cannot be opened for shaping.
    pub fn shape(&self, text: &str) -> Vec<ShapedGlyph> {
        static FEATURES: std::sync::OnceLock<Vec<Feature>> = std::sync::OnceLock::new();
        let features = FEATURES.get_or_init(|| {
            vec![
                Feature::new(Tag::from_bytes(b"liga"), 1, ..),
                Feature::new(Tag::from_bytes(b"kern"), 1, ..),
            ]
        });

        let Some(face) = self.face.as_face() else {
            log::warn!("Face '{}' cannot be opened for shaping", self.face.name);
            return Vec::new();
        };

        let mut buffer = SCRATCH_BUFFER.with(|b| b.borrow_mut().take().unwrap_or_else(UnicodeBuffer::new));
        buffer.push_str(text);
        buffer.guess_segment_properties();

        let glyph_buffer = rustybuzz::shape(&face, features, buffer);
        let infos = glyph_buffer.glyph_infos();
        let positions = glyph_buffer.glyph_positions();

        let mut shaped = Vec::with_capacity(infos.len());
        let mut previous_cluster = None;
        for (i, (info, pos)) in infos.iter().zip(positions.iter()).enumerate() {
            let start = info.cluster as usize;
            let components = if previous_cluster == Some(start) {
                String::new()
            } else {
                let end = infos[i + 1..]
                    .iter()
                    .map(|next| next.cluster as usize)
                    .find(|&c| c > start)
                    .unwrap_or(text.len());
                text.get(start..end).unwrap_or_default().to_string()
            };
            previous_cluster = Some(start);

            let (height, depth) = face
                .glyph_bounding_box(GlyphId(info.glyph_id as u16))
                .map(|bbox| {
                    (
                        self.face.scale(i32::from(bbox.y_max).max(0), self.size),
                        self.face.scale((-i32::from(bbox.y_min)).max(0), self.size),
                    )
                })
                .unwrap_or_default();

            shaped.push(ShapedGlyph {
                codepoint: info.glyph_id,
                advance: self.face.scale(pos.x_advance, self.size),
                glyph: components.chars().next().map_or(0, u32::from),
                hyphenate: !components.is_empty() && components.chars().all(char::is_alphabetic),
                is_space: !components.is_empty() && components.chars().all(char::is_whitespace),
                components,
                height,
                depth,
            });
        }

        let recycled_buffer = glyph_buffer.clear();
        SCRATCH_BUFFER.with(|b| *b.borrow_mut() = Some(recycled_buffer));

        log::debug!("Shaped {:?} into {} glyphs", text, shaped.len());
        shaped
    }
}
