//! Resource caches owned by a document.
//!
//! Handles into these caches are the typed refs from `ets-types`. Every
//! lookup checks that a ref was minted by the same document.

use crate::DocumentError;
use ets_layout::{Face, Font, Lang};
use ets_render_lopdf::{ImageSource, RenderError, RenderResources};
use ets_types::{DocumentId, FaceRef, FamilyRef, FontRef, ImageFileRef, ImageRef, LangRef, ScaledPoint};
use image::{ImageFormat, ImageReader};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a face comes from: `source` is a font file, or an installed
/// family name when system fonts are enabled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontSource {
    pub name: String,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Normal,
    Italic,
}

impl FontStyle {
    /// Accepts `regular`, `normal` and `italic`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "regular" | "normal" => Some(FontStyle::Normal),
            "italic" => Some(FontStyle::Italic),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FontFamily {
    pub id: usize,
    pub name: String,
    members: HashMap<(u16, FontStyle), FaceRef>,
}

impl FontFamily {
    pub fn new(id: usize, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            members: HashMap::new(),
        }
    }

    pub fn add_member(&mut self, weight: u16, style: FontStyle, face: FaceRef) {
        self.members.insert((weight, style), face);
    }

    pub fn member(&self, weight: u16, style: FontStyle) -> Option<FaceRef> {
        self.members.get(&(weight, style)).copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// A probed image file. Raster formats always have one page.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub filename: PathBuf,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub number_of_pages: u32,
}

impl ImageFile {
    pub fn probe(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let image_error = |message: String| DocumentError::Image {
            path: path.display().to_string(),
            message,
        };
        let reader = ImageReader::open(path)
            .map_err(|e| image_error(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| image_error(e.to_string()))?;
        let format = reader
            .format()
            .ok_or_else(|| image_error("unknown image format".to_string()))?;
        let (width, height) = reader.into_dimensions().map_err(|e| image_error(e.to_string()))?;
        log::debug!("Probed {} as {:?}, {}x{} px", path.display(), format, width, height);
        Ok(Self {
            filename: path.to_path_buf(),
            format,
            width,
            height,
            number_of_pages: 1,
        })
    }

    pub fn format_name(&self) -> String {
        match self.format {
            ImageFormat::Png => "png".to_string(),
            ImageFormat::Jpeg => "jpeg".to_string(),
            ImageFormat::Gif => "gif".to_string(),
            other => format!("{:?}", other).to_lowercase(),
        }
    }

    /// Reads the pixels for embedding. JPEG data is passed through as is.
    pub fn source(&self) -> Result<ImageSource, DocumentError> {
        let image_error = |message: String| DocumentError::Image {
            path: self.filename.display().to_string(),
            message,
        };
        let decoded = image::open(&self.filename).map_err(|e| image_error(e.to_string()))?;
        if self.format == ImageFormat::Jpeg {
            let data = std::fs::read(&self.filename)?;
            return Ok(ImageSource::Jpeg {
                data,
                width: self.width,
                height: self.height,
                components: decoded.color().channel_count().min(3),
            });
        }
        let rgba = decoded.to_rgba8();
        let mut pixels = Vec::with_capacity(rgba.len() / 4 * 3);
        let mut alpha = Vec::with_capacity(rgba.len() / 4);
        for px in rgba.pixels() {
            pixels.extend_from_slice(&px.0[..3]);
            alpha.push(px.0[3]);
        }
        let alpha = decoded.color().has_alpha().then_some(alpha);
        Ok(ImageSource::Rgb {
            pixels,
            alpha,
            width: self.width,
            height: self.height,
        })
    }
}

/// An image instance. Its natural size is one PDF point per pixel.
#[derive(Debug, Clone)]
pub struct Image {
    pub file: ImageFileRef,
    pub width: ScaledPoint,
    pub height: ScaledPoint,
}

#[derive(Debug)]
pub(crate) struct FontEntry {
    pub face: FaceRef,
    pub font: Font,
}

/// The caches proper, kept apart from the output side of a document so the
/// renderer can borrow them while it writes.
#[derive(Debug)]
pub struct Resources {
    document: DocumentId,
    pub(crate) faces: Vec<Arc<Face>>,
    pub(crate) face_index: HashMap<(FontSource, u16, FontStyle), FaceRef>,
    pub(crate) fonts: Vec<FontEntry>,
    pub(crate) font_index: HashMap<(FaceRef, ScaledPoint), FontRef>,
    pub(crate) families: Vec<FontFamily>,
    pub(crate) image_files: Vec<ImageFile>,
    pub(crate) image_file_index: HashMap<PathBuf, ImageFileRef>,
    pub(crate) images: Vec<Image>,
    pub(crate) langs: Vec<Lang>,
    pub(crate) lang_index: HashMap<PathBuf, LangRef>,
}

macro_rules! lookup {
    ($get:ident, $get_mut:ident, $field:ident, $ref:ty, $item:ty) => {
        pub fn $get(&self, r: $ref) -> Result<&$item, DocumentError> {
            self.check(r.document, &r)?;
            self.$field
                .get(r.slot())
                .ok_or_else(|| DocumentError::UnknownResource(r.to_string()))
        }

        pub fn $get_mut(&mut self, r: $ref) -> Result<&mut $item, DocumentError> {
            self.check(r.document, &r)?;
            self.$field
                .get_mut(r.slot())
                .ok_or_else(|| DocumentError::UnknownResource(r.to_string()))
        }
    };
}

impl Resources {
    pub fn new(document: DocumentId) -> Self {
        Self {
            document,
            faces: Vec::new(),
            face_index: HashMap::new(),
            fonts: Vec::new(),
            font_index: HashMap::new(),
            families: Vec::new(),
            image_files: Vec::new(),
            image_file_index: HashMap::new(),
            images: Vec::new(),
            langs: Vec::new(),
            lang_index: HashMap::new(),
        }
    }

    pub fn document(&self) -> DocumentId {
        self.document
    }

    fn check(&self, owner: DocumentId, r: &dyn std::fmt::Display) -> Result<(), DocumentError> {
        if owner == self.document {
            Ok(())
        } else {
            Err(DocumentError::ForeignResource(r.to_string()))
        }
    }

    pub fn face(&self, r: FaceRef) -> Result<&Arc<Face>, DocumentError> {
        self.check(r.document, &r)?;
        self.faces
            .get(r.slot())
            .ok_or_else(|| DocumentError::UnknownResource(r.to_string()))
    }

    pub fn font(&self, r: FontRef) -> Result<&Font, DocumentError> {
        self.check(r.document, &r)?;
        self.fonts
            .get(r.slot())
            .map(|entry| &entry.font)
            .ok_or_else(|| DocumentError::UnknownResource(r.to_string()))
    }

    /// The face a font was created from.
    pub fn font_face(&self, r: FontRef) -> Result<FaceRef, DocumentError> {
        self.check(r.document, &r)?;
        self.fonts
            .get(r.slot())
            .map(|entry| entry.face)
            .ok_or_else(|| DocumentError::UnknownResource(r.to_string()))
    }

    lookup!(family, family_mut, families, FamilyRef, FontFamily);
    lookup!(image_file, image_file_mut, image_files, ImageFileRef, ImageFile);
    lookup!(image, image_mut, images, ImageRef, Image);
    lookup!(lang, lang_mut, langs, LangRef, Lang);
}

impl RenderResources for Resources {
    fn font(&self, font: FontRef) -> Option<(FaceRef, &Font)> {
        let entry = self.fonts.get(font.slot()).filter(|_| font.document == self.document)?;
        Some((entry.face, &entry.font))
    }

    fn image_file(&self, image: ImageRef) -> Option<ImageFileRef> {
        Resources::image(self, image).ok().map(|img| img.file)
    }

    fn image_source(&self, file: ImageFileRef) -> Result<ImageSource, RenderError> {
        let image_file = Resources::image_file(self, file).map_err(|e| RenderError::MissingResource(e.to_string()))?;
        image_file.source().map_err(|e| RenderError::Image(e.to_string()))
    }
}
