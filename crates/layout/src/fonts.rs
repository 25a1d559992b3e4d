//! Font faces, sized fonts and system font lookup.
//!
//! A [`Face`] is one parsed font file. A [`Font`] is a face at a size and
//! carries the inter-word space derived from the face's space glyph.
//! [`FontLocator`] resolves family names through fontdb when the
//! `system-fonts` feature is enabled.

use ets_types::ScaledPoint;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FontError {
    #[error("Failed to read font file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("'{0}' is not a usable TrueType or OpenType font")]
    Malformed(String),

    #[error("Font not found: {0}")]
    NotFound(String),
}

/// One parsed font file.
pub struct Face {
    pub name: String,
    pub filename: Option<PathBuf>,
    pub postscript_name: String,
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    pub index: u32,
    data: Arc<Vec<u8>>,
}

impl std::fmt::Debug for Face {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Face")
            .field("name", &self.name)
            .field("postscript_name", &self.postscript_name)
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl Face {
    pub fn from_file(name: &str, path: impl AsRef<Path>) -> Result<Self, FontError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| FontError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_data(name, data, 0, Some(path.to_path_buf()))
    }

    /// Validates `data` with ttf-parser and reads the metrics the engine needs.
    pub fn from_data(name: &str, data: Vec<u8>, index: u32, filename: Option<PathBuf>) -> Result<Self, FontError> {
        let label = filename
            .as_ref()
            .map_or_else(|| name.to_string(), |p| p.display().to_string());
        let face = ttf_parser::Face::parse(&data, index).map_err(|_| FontError::Malformed(label))?;

        let postscript_name = extract_postscript_name(&face).unwrap_or_else(|| name.replace(' ', ""));
        let units_per_em = face.units_per_em();
        let ascender = face.ascender();
        let descender = face.descender();
        log::debug!("Loaded face '{}' ({}), {} units per em", name, postscript_name, units_per_em);

        Ok(Self {
            name: name.to_string(),
            filename,
            postscript_name,
            units_per_em,
            ascender,
            descender,
            index,
            data: Arc::new(data),
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Creates a lightweight shaping view over the font data.
    pub fn as_face(&self) -> Option<rustybuzz::Face<'_>> {
        rustybuzz::Face::from_slice(&self.data, self.index)
    }

    /// Converts font units to scaled points at `size`.
    pub fn scale(&self, units: i32, size: ScaledPoint) -> ScaledPoint {
        ScaledPoint((units as i64).saturating_mul(size.raw()) / self.units_per_em.max(1) as i64)
    }
}

/// Extracts the PostScript name, falling back to the full name and then the family name.
fn extract_postscript_name(face: &ttf_parser::Face<'_>) -> Option<String> {
    for (id, strip) in [
        (ttf_parser::name_id::POST_SCRIPT_NAME, false),
        (ttf_parser::name_id::FULL_NAME, true),
        (ttf_parser::name_id::FAMILY, true),
    ] {
        let found = face
            .names()
            .into_iter()
            .find(|n| n.name_id == id)
            .and_then(|n| n.to_string());
        if let Some(name) = found {
            return Some(if strip { name.replace(' ', "") } else { name });
        }
    }
    log::warn!("Could not extract any usable name from font data");
    None
}

/// A face at a size.
#[derive(Debug, Clone)]
pub struct Font {
    pub face: Arc<Face>,
    pub size: ScaledPoint,
    /// Natural inter-word space.
    pub space: ScaledPoint,
    pub stretch: ScaledPoint,
    pub shrink: ScaledPoint,
}

impl Font {
    pub fn new(face: Arc<Face>, size: ScaledPoint) -> Self {
        let space_units = ttf_parser::Face::parse(face.data(), face.index)
            .ok()
            .and_then(|f| f.glyph_index(' ').and_then(|gid| f.glyph_hor_advance(gid)))
            .map(i32::from)
            .unwrap_or(face.units_per_em as i32 / 3);
        let space = face.scale(space_units, size);
        Self {
            face,
            size,
            space,
            stretch: space / 2,
            shrink: space / 3,
        }
    }
}

/// Looks up installed fonts by family name.
#[cfg(feature = "system-fonts")]
pub struct FontLocator {
    db: fontdb::Database,
}

#[cfg(feature = "system-fonts")]
impl Default for FontLocator {
    fn default() -> Self {
        Self::system()
    }
}

#[cfg(feature = "system-fonts")]
impl FontLocator {
    /// Scans the platform's font directories.
    pub fn system() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        log::debug!("fontdb found {} system faces", db.len());
        Self { db }
    }

    pub fn add_font_dir<P: AsRef<Path>>(&mut self, path: P) {
        self.db.load_fonts_dir(path);
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Loads the best match for `family`.
    pub fn find(&self, family: &str, weight: u16, italic: bool) -> Result<Face, FontError> {
        let query = fontdb::Query {
            families: &[fontdb::Family::Name(family)],
            weight: fontdb::Weight(weight),
            stretch: fontdb::Stretch::Normal,
            style: if italic { fontdb::Style::Italic } else { fontdb::Style::Normal },
        };
        let id = self
            .db
            .query(&query)
            .ok_or_else(|| FontError::NotFound(family.to_string()))?;
        self.load(family, id)
    }

    /// A TrueType face usable as a last resort: a common sans family if
    /// installed, otherwise the first `.ttf` face known to fontdb.
    pub fn fallback(&self) -> Option<Face> {
        for family in ["DejaVu Sans", "Liberation Sans", "Arial", "FreeSans"] {
            if let Ok(face) = self.find(family, 400, false) {
                return Some(face);
            }
        }
        let id = self.db.faces().find_map(|info| match &info.source {
            fontdb::Source::File(path)
                if path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf")) =>
            {
                Some(info.id)
            }
            _ => None,
        })?;
        let name = self
            .db
            .face(id)
            .and_then(|info| info.families.first().map(|(n, _)| n.clone()))
            .unwrap_or_else(|| "fallback".to_string());
        self.load(&name, id).ok()
    }

    fn load(&self, family: &str, id: fontdb::ID) -> Result<Face, FontError> {
        let info = self.db.face(id).ok_or_else(|| FontError::NotFound(family.to_string()))?;
        let filename = match &info.source {
            fontdb::Source::File(path) => Some(path.clone()),
            _ => None,
        };
        log::debug!("Matched font: {:?} ({})", info.families, info.post_script_name);
        let (data, index) = self
            .db
            .with_face_data(id, |data, index| (data.to_vec(), index))
            .ok_or_else(|| FontError::NotFound(family.to_string()))?;
        Face::from_data(family, data, index, filename)
    }
}
