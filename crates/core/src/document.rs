use crate::config::EtsConfig;
use crate::page::Page;
use crate::resources::{FontEntry, FontFamily, FontSource, FontStyle, Image, ImageFile, Resources};
use crate::DocumentError;
#[cfg(feature = "system-fonts")]
use ets_layout::FontLocator;
use ets_layout::{Face, Font, Lang, hyphenate_list};
use ets_node::{NodeArena, NodeId, NodeKind, NodeError};
use ets_render_lopdf::{DocumentInfo, PdfRenderer, Placement};
use ets_types::{DocumentId, FaceRef, FamilyRef, FontRef, ImageFileRef, ImageRef, LangRef, PageRef, ScaledPoint};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A PDF document being assembled.
///
/// The output file is created by [`Document::create`] and closed by
/// [`Document::finish`]. Every operation that changes the document fails
/// with [`DocumentError::Finished`] afterwards.
pub struct Document {
    id: DocumentId,
    filename: PathBuf,
    config: EtsConfig,
    renderer: Option<PdfRenderer<BufWriter<File>>>,
    resources: Resources,
    pages: Vec<Page>,
    current_page: Option<PageRef>,
    default_language: Option<LangRef>,
    #[cfg(feature = "system-fonts")]
    locator: Option<FontLocator>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("filename", &self.filename)
            .field("pages", &self.pages.len())
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl Document {
    pub fn create(id: DocumentId, path: impl AsRef<Path>, config: EtsConfig) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let renderer = PdfRenderer::new(BufWriter::new(file))?;
        log::debug!("Created {} at {}", id, path.display());
        Ok(Self {
            id,
            filename: path.to_path_buf(),
            config,
            renderer: Some(renderer),
            resources: Resources::new(id),
            pages: Vec::new(),
            current_page: None,
            default_language: None,
            #[cfg(feature = "system-fonts")]
            locator: None,
        })
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn config(&self) -> &EtsConfig {
        &self.config
    }

    pub fn is_finished(&self) -> bool {
        self.renderer.is_none()
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// A language of this document, for editing. Languages are frozen once
    /// the document is finished.
    pub fn lang_mut(&mut self, lang: LangRef) -> Result<&mut Lang, DocumentError> {
        self.ensure_open()?;
        self.resources.lang_mut(lang)
    }

    fn ensure_open(&self) -> Result<(), DocumentError> {
        if self.is_finished() {
            Err(DocumentError::Finished)
        } else {
            Ok(())
        }
    }

    fn check_page(&self, page: PageRef) -> Result<(), DocumentError> {
        if page.document != self.id {
            return Err(DocumentError::ForeignResource(page.to_string()));
        }
        if page.slot() >= self.pages.len() {
            return Err(DocumentError::UnknownResource(page.to_string()));
        }
        Ok(())
    }

    // Pages

    /// Starts a new page and makes it the current one.
    pub fn new_page(&mut self) -> Result<PageRef, DocumentError> {
        self.ensure_open()?;
        if let Some(previous) = self.current_page.and_then(|r| self.pages.get(r.slot()))
            && !previous.shipped
            && !previous.placements.is_empty()
        {
            log::warn!("Page {} is replaced before it was shipped out", previous.number);
        }
        let r = PageRef::new(self.id, self.pages.len() as u32);
        self.pages
            .push(Page::new(self.pages.len() + 1, self.config.page_width, self.config.page_height));
        self.current_page = Some(r);
        log::debug!("New page {}", self.pages.len());
        Ok(r)
    }

    /// The current page, started on demand.
    pub fn current_page(&mut self) -> Result<PageRef, DocumentError> {
        match self.current_page {
            Some(r) if !self.pages[r.slot()].shipped => Ok(r),
            _ => self.new_page(),
        }
    }

    pub fn page(&self, page: PageRef) -> Result<&Page, DocumentError> {
        self.check_page(page)?;
        Ok(&self.pages[page.slot()])
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Places `vlist` on the current page with its top left corner at
    /// (`x`, `y`), measured from the bottom left corner of the page.
    pub fn output_at(
        &mut self,
        arena: &NodeArena,
        x: ScaledPoint,
        y: ScaledPoint,
        vlist: NodeId,
    ) -> Result<(), DocumentError> {
        self.ensure_open()?;
        let found = arena.kind(vlist);
        if found != NodeKind::VList {
            return Err(NodeError::TypeMismatch {
                expected: NodeKind::VList,
                found,
            }
            .into());
        }
        let page = self.current_page()?;
        self.pages[page.slot()].placements.push(Placement { x, y, vlist });
        Ok(())
    }

    /// Renders `page` and writes it to the output file.
    pub fn shipout(&mut self, arena: &NodeArena, page: PageRef) -> Result<(), DocumentError> {
        self.ensure_open()?;
        self.check_page(page)?;
        let slot = page.slot();
        if self.pages[slot].shipped {
            return Err(DocumentError::AlreadyShipped(self.pages[slot].number));
        }
        let renderer = self.renderer.as_mut().ok_or(DocumentError::Finished)?;
        let p = &self.pages[slot];
        renderer.render_page(arena, &p.placements, &self.resources, p.width, p.height)?;
        self.pages[slot].shipped = true;
        log::debug!("Shipped out page {}", self.pages[slot].number);
        Ok(())
    }

    /// Ships out the current page if it holds unshipped material, then
    /// completes and closes the PDF file.
    pub fn finish(&mut self, arena: &NodeArena) -> Result<(), DocumentError> {
        self.ensure_open()?;
        if let Some(r) = self.current_page
            && !self.pages[r.slot()].shipped
        {
            self.shipout(arena, r)?;
        }
        let renderer = self.renderer.take().ok_or(DocumentError::Finished)?;
        let info = DocumentInfo {
            title: self.config.title.clone(),
            creator: self.config.creator.clone(),
        };
        let writer = renderer.finish(&info)?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        log::info!("Finished {} ({} pages)", self.filename.display(), self.pages.len());
        Ok(())
    }

    // Hyphenation

    pub fn load_pattern(&mut self, path: impl AsRef<Path>) -> Result<LangRef, DocumentError> {
        self.ensure_open()?;
        let path = path.as_ref();
        if let Some(&r) = self.resources.lang_index.get(path) {
            return Ok(r);
        }
        let lang = Lang::load(path, self.config.left_hyphenmin, self.config.right_hyphenmin)?;
        let r = LangRef::new(self.id, self.resources.langs.len() as u32);
        self.resources.langs.push(lang);
        self.resources.lang_index.insert(path.to_path_buf(), r);
        Ok(r)
    }

    pub fn default_language(&self) -> Result<Option<LangRef>, DocumentError> {
        self.ensure_open()?;
        Ok(self.default_language)
    }

    pub fn set_default_language(&mut self, lang: LangRef) -> Result<(), DocumentError> {
        self.ensure_open()?;
        self.resources.lang(lang)?;
        self.default_language = Some(lang);
        Ok(())
    }

    /// Inserts disc nodes at the hyphenation points of every word in the
    /// list starting at `head`. Returns the number of points found.
    pub fn hyphenate(&self, arena: &mut NodeArena, head: NodeId) -> Result<usize, DocumentError> {
        self.ensure_open()?;
        let default = match self.default_language {
            Some(r) => Some(self.resources.lang(r)?),
            None => None,
        };
        if default.is_none() {
            log::debug!("hyphenate: no default language set");
        }
        let resolve = |r: LangRef| self.resources.lang(r).ok();
        Ok(hyphenate_list(arena, head, default, &resolve))
    }

    // Fonts

    pub fn load_face(&mut self, source: &FontSource) -> Result<FaceRef, DocumentError> {
        self.load_face_styled(source, 400, FontStyle::Normal)
    }

    fn load_face_styled(&mut self, source: &FontSource, weight: u16, style: FontStyle) -> Result<FaceRef, DocumentError> {
        self.ensure_open()?;
        let key = (source.clone(), weight, style);
        if let Some(&r) = self.resources.face_index.get(&key) {
            return Ok(r);
        }
        let face = self.read_face(source, weight, style)?;
        let r = FaceRef::new(self.id, self.resources.faces.len() as u32);
        self.resources.faces.push(Arc::new(face));
        self.resources.face_index.insert(key, r);
        Ok(r)
    }

    fn read_face(&mut self, source: &FontSource, weight: u16, style: FontStyle) -> Result<Face, DocumentError> {
        let path = Path::new(&source.source);
        if path.is_file() || !self.config.system_fonts {
            return Ok(Face::from_file(&source.name, path)?);
        }
        #[cfg(feature = "system-fonts")]
        {
            let locator = self.locator.get_or_insert_with(FontLocator::system);
            let mut face = locator.find(&source.source, weight, style == FontStyle::Italic)?;
            face.name = source.name.clone();
            Ok(face)
        }
        #[cfg(not(feature = "system-fonts"))]
        {
            let _ = (weight, style);
            Ok(Face::from_file(&source.name, path)?)
        }
    }

    pub fn create_font(&mut self, face: FaceRef, size: ScaledPoint) -> Result<FontRef, DocumentError> {
        self.ensure_open()?;
        if let Some(&r) = self.resources.font_index.get(&(face, size)) {
            return Ok(r);
        }
        let font = Font::new(self.resources.face(face)?.clone(), size);
        let r = FontRef::new(self.id, self.resources.fonts.len() as u32);
        self.resources.fonts.push(FontEntry { face, font });
        self.resources.font_index.insert((face, size), r);
        Ok(r)
    }

    pub fn new_font_family(&mut self, name: &str) -> Result<FamilyRef, DocumentError> {
        self.ensure_open()?;
        let id = self.resources.families.len();
        self.resources.families.push(FontFamily::new(id, name));
        Ok(FamilyRef::new(self.id, id as u32))
    }

    /// Loads a face and registers it in `family` for the given weight and style.
    pub fn add_family_member(
        &mut self,
        family: FamilyRef,
        source: &FontSource,
        weight: u16,
        style: FontStyle,
    ) -> Result<FaceRef, DocumentError> {
        self.resources.family(family)?;
        let face = self.load_face_styled(source, weight, style)?;
        self.resources.family_mut(family)?.add_member(weight, style, face);
        Ok(face)
    }

    // Images

    pub fn load_image_file(&mut self, path: impl AsRef<Path>) -> Result<ImageFileRef, DocumentError> {
        self.ensure_open()?;
        let path = path.as_ref();
        if let Some(&r) = self.resources.image_file_index.get(path) {
            return Ok(r);
        }
        let file = ImageFile::probe(path)?;
        let r = ImageFileRef::new(self.id, self.resources.image_files.len() as u32);
        self.resources.image_files.push(file);
        self.resources.image_file_index.insert(path.to_path_buf(), r);
        Ok(r)
    }

    pub fn create_image(&mut self, file: ImageFileRef) -> Result<ImageRef, DocumentError> {
        self.ensure_open()?;
        let probed = self.resources.image_file(file)?;
        let image = Image {
            file,
            width: ScaledPoint::from_pt(probed.width as f64),
            height: ScaledPoint::from_pt(probed.height as f64),
        };
        let r = ImageRef::new(self.id, self.resources.images.len() as u32);
        self.resources.images.push(image);
        Ok(r)
    }
}
