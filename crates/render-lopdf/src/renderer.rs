use crate::RenderError;
use crate::fonts::{EmbeddedFont, glyph_string};
use crate::images::{ImageSource, write_image};
use crate::writer::StreamingPdfWriter;
use ets_layout::Font;
use ets_layout::algorithms::hpack::glue_width;
use ets_node::{Glyph, HList, ImageNode, Node, NodeArena, NodeId};
use ets_types::{FaceRef, FontRef, ImageFileRef, ImageRef, ScaledPoint};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId, dictionary};
use std::collections::HashMap;
use std::io::Write;

/// Looks up the document resources that nodes refer to.
pub trait RenderResources {
    fn font(&self, font: FontRef) -> Option<(FaceRef, &Font)>;

    fn image_file(&self, image: ImageRef) -> Option<ImageFileRef>;

    /// Pixel data for an image file, read the first time a page uses it.
    fn image_source(&self, file: ImageFileRef) -> Result<ImageSource, RenderError>;
}

/// A vertical list placed on a page. `y` is the top edge, measured from the
/// bottom of the page like everything else in PDF space.
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub x: ScaledPoint,
    pub y: ScaledPoint,
    pub vlist: NodeId,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub creator: Option<String>,
}

/// Turns shipped pages into PDF objects.
pub struct PdfRenderer<W: Write> {
    writer: StreamingPdfWriter<W>,
    fonts: Vec<EmbeddedFont>,
    font_slots: HashMap<FaceRef, usize>,
    images: HashMap<ImageFileRef, (String, ObjectId)>,
}

#[derive(Default)]
struct PageContent {
    ops: Vec<Operation>,
    in_text: bool,
    font: Option<(usize, ScaledPoint)>,
}

impl PageContent {
    fn end_text(&mut self) {
        if self.in_text {
            self.ops.push(Operation::new("ET", vec![]));
            self.in_text = false;
            self.font = None;
        }
    }
}

impl<W: Write> PdfRenderer<W> {
    pub fn new(writer: W) -> Result<Self, RenderError> {
        Ok(Self {
            writer: StreamingPdfWriter::new(writer)?,
            fonts: Vec::new(),
            font_slots: HashMap::new(),
            images: HashMap::new(),
        })
    }

    pub fn page_count(&self) -> usize {
        self.writer.page_count()
    }

    /// Renders one page and writes it out. Pages appear in the document in
    /// the order they are rendered.
    pub fn render_page(
        &mut self,
        arena: &NodeArena,
        placements: &[Placement],
        resources: &dyn RenderResources,
        width: ScaledPoint,
        height: ScaledPoint,
    ) -> Result<ObjectId, RenderError> {
        let mut page = PageContent::default();
        for placement in placements {
            let top = placement.y;
            match arena.node(placement.vlist) {
                Node::VList(v) => self.vlist(&mut page, arena, resources, v.list, placement.x, top)?,
                Node::HList(h) => self.hlist(&mut page, arena, resources, h, placement.x, top - h.height)?,
                other => {
                    return Err(RenderError::NotAList(other.kind().as_str()));
                }
            }
        }
        page.end_text();

        let content_id = self.writer.write_content(Content { operations: page.ops })?;
        let page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => self.writer.pages_id(),
            "MediaBox" => vec![0.0.into(), 0.0.into(), width.to_bp().into(), height.to_bp().into()],
            "Contents" => content_id,
            "Resources" => self.writer.resources_id(),
        };
        let page_id = self.writer.write_object(page_dict.into())?;
        self.writer.add_page(page_id);
        log::debug!("Wrote page {} as object {:?}", self.writer.page_count(), page_id);
        Ok(page_id)
    }

    fn vlist(
        &mut self,
        page: &mut PageContent,
        arena: &NodeArena,
        resources: &dyn RenderResources,
        head: Option<NodeId>,
        x: ScaledPoint,
        top: ScaledPoint,
    ) -> Result<(), RenderError> {
        let mut y = top;
        for id in arena.iter(head) {
            match arena.node(id) {
                Node::HList(h) => {
                    let baseline = y - h.height;
                    self.hlist(page, arena, resources, h, x, baseline)?;
                    y = baseline - h.depth;
                }
                Node::VList(v) => {
                    self.vlist(page, arena, resources, v.list, x, y)?;
                    y -= v.height + v.depth;
                }
                Node::Glue(g) => y -= g.width,
                Node::Image(img) => {
                    y -= img.height;
                    self.image(page, resources, img, x, y)?;
                }
                Node::Glyph(g) => {
                    let baseline = y - g.height;
                    self.glyph(page, resources, g, x, baseline)?;
                    y = baseline - g.depth;
                }
                Node::Disc(_) | Node::Lang(_) | Node::Penalty(_) => {}
            }
        }
        Ok(())
    }

    fn hlist(
        &mut self,
        page: &mut PageContent,
        arena: &NodeArena,
        resources: &dyn RenderResources,
        hlist: &HList,
        left: ScaledPoint,
        baseline: ScaledPoint,
    ) -> Result<(), RenderError> {
        let mut x = left;
        for id in arena.iter(hlist.list) {
            match arena.node(id) {
                Node::Glyph(g) => {
                    self.glyph(page, resources, g, x, baseline)?;
                    x += g.width;
                }
                Node::Glue(g) => x += glue_width(g, hlist.glue_set),
                Node::HList(h) => {
                    self.hlist(page, arena, resources, h, x, baseline)?;
                    x += h.width;
                }
                Node::VList(v) => {
                    self.vlist(page, arena, resources, v.list, x, baseline + v.height)?;
                    x += v.width;
                }
                Node::Image(img) => {
                    self.image(page, resources, img, x, baseline)?;
                    x += img.width;
                }
                Node::Disc(_) | Node::Lang(_) | Node::Penalty(_) => {}
            }
        }
        Ok(())
    }

    fn glyph(
        &mut self,
        page: &mut PageContent,
        resources: &dyn RenderResources,
        glyph: &Glyph,
        x: ScaledPoint,
        baseline: ScaledPoint,
    ) -> Result<(), RenderError> {
        let Some(font_ref) = glyph.font else {
            log::warn!("Skipping glyph {} without a font", glyph.codepoint);
            return Ok(());
        };
        let (face_ref, font) = resources
            .font(font_ref)
            .ok_or_else(|| RenderError::MissingResource(font_ref.to_string()))?;
        let gid = u16::try_from(glyph.codepoint)
            .map_err(|_| RenderError::GlyphOutOfRange(glyph.codepoint))?;

        let slot = match self.font_slots.get(&face_ref) {
            Some(&slot) => slot,
            None => {
                let slot = self.fonts.len();
                let id = self.writer.reserve();
                self.fonts
                    .push(EmbeddedFont::new(format!("F{}", slot + 1), id, font.face.clone()));
                self.font_slots.insert(face_ref, slot);
                slot
            }
        };
        let embedded = &mut self.fonts[slot];
        embedded.record(gid, &glyph.components);

        if !page.in_text {
            page.ops.push(Operation::new("BT", vec![]));
            page.in_text = true;
        }
        if page.font != Some((slot, font.size)) {
            page.ops.push(Operation::new(
                "Tf",
                vec![Object::Name(embedded.name.clone().into_bytes()), font.size.to_bp().into()],
            ));
            page.font = Some((slot, font.size));
        }
        page.ops.push(Operation::new(
            "Tm",
            vec![
                1.into(),
                0.into(),
                0.into(),
                1.into(),
                x.to_bp().into(),
                baseline.to_bp().into(),
            ],
        ));
        page.ops.push(Operation::new("Tj", vec![glyph_string(gid)]));
        Ok(())
    }

    /// Draws `image` with its lower left corner at (`x`, `bottom`).
    fn image(
        &mut self,
        page: &mut PageContent,
        resources: &dyn RenderResources,
        image: &ImageNode,
        x: ScaledPoint,
        bottom: ScaledPoint,
    ) -> Result<(), RenderError> {
        let Some(image_ref) = image.img else {
            log::warn!("Skipping image node without an image");
            return Ok(());
        };
        let file = resources
            .image_file(image_ref)
            .ok_or_else(|| RenderError::MissingResource(image_ref.to_string()))?;
        let name = match self.images.get(&file) {
            Some((name, _)) => name.clone(),
            None => {
                let id = write_image(&mut self.writer, resources.image_source(file)?)?;
                let name = format!("Im{}", self.images.len() + 1);
                self.images.insert(file, (name.clone(), id));
                name
            }
        };

        page.end_text();
        page.ops.push(Operation::new("q", vec![]));
        page.ops.push(Operation::new(
            "cm",
            vec![
                image.width.to_bp().into(),
                0.into(),
                0.into(),
                image.height.to_bp().into(),
                x.to_bp().into(),
                bottom.to_bp().into(),
            ],
        ));
        page.ops.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        page.ops.push(Operation::new("Q", vec![]));
        Ok(())
    }

    /// Embeds the fonts used so far, writes the shared resources and the
    /// document trailer, and hands back the underlying writer.
    pub fn finish(mut self, info: &DocumentInfo) -> Result<W, RenderError> {
        let mut font_dict = Dictionary::new();
        for font in &self.fonts {
            font.write(&mut self.writer)?;
            font_dict.set(font.name.as_bytes(), font.id);
        }
        let mut xobjects = Dictionary::new();
        for (name, id) in self.images.values() {
            xobjects.set(name.as_bytes(), *id);
        }
        let mut resources = Dictionary::new();
        if !font_dict.is_empty() {
            resources.set("Font", font_dict);
        }
        if !xobjects.is_empty() {
            resources.set("XObject", xobjects);
        }

        let mut info_dict = dictionary! { "Producer" => Object::string_literal(concat!("ets ", env!("CARGO_PKG_VERSION"))) };
        if let Some(title) = &info.title {
            info_dict.set("Title", Object::string_literal(title.as_str()));
        }
        if let Some(creator) = &info.creator {
            info_dict.set("Creator", Object::string_literal(creator.as_str()));
        }
        self.writer.set_info(info_dict);

        log::info!(
            "Finishing PDF with {} page(s), {} font(s), {} image(s)",
            self.writer.page_count(),
            self.fonts.len(),
            self.images.len()
        );
        Ok(self.writer.finish(resources)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ets_node::{Glue, VList};
    use ets_types::DocumentId;
    use std::io::Cursor;

    struct OnlyImages;

    impl RenderResources for OnlyImages {
        fn font(&self, _font: FontRef) -> Option<(FaceRef, &Font)> {
            None
        }

        fn image_file(&self, image: ImageRef) -> Option<ImageFileRef> {
            Some(ImageFileRef::new(image.document, 0))
        }

        fn image_source(&self, _file: ImageFileRef) -> Result<ImageSource, RenderError> {
            Ok(ImageSource::Rgb {
                pixels: vec![255, 0, 0, 0, 255, 0],
                alpha: None,
                width: 2,
                height: 1,
            })
        }
    }

    fn pt(v: f64) -> ScaledPoint {
        ScaledPoint::from_pt(v)
    }

    fn image_page(arena: &mut NodeArena, images: usize) -> NodeId {
        let mut head = None;
        let mut tail = None;
        for i in 0..images {
            let img = arena.alloc(ImageNode {
                img: Some(ImageRef::new(DocumentId(0), i as u32)),
                width: pt(20.0),
                height: pt(10.0),
            });
            head = Some(arena.insert_after(head, tail, img));
            tail = Some(img);
            let glue = arena.alloc(Glue {
                width: pt(5.0),
                ..Glue::default()
            });
            arena.insert_after(head, tail, glue);
            tail = Some(glue);
        }
        arena.alloc(VList {
            list: head,
            width: pt(20.0),
            height: pt(30.0),
            depth: ScaledPoint::ZERO,
        })
    }

    #[test]
    fn test_images_share_one_xobject_per_file() {
        let mut arena = NodeArena::new();
        let vlist = image_page(&mut arena, 2);
        let mut renderer = PdfRenderer::new(Cursor::new(Vec::new())).unwrap();
        renderer
            .render_page(
                &arena,
                &[Placement { x: pt(72.0), y: pt(770.0), vlist }],
                &OnlyImages,
                pt(595.0),
                pt(842.0),
            )
            .unwrap();
        assert_eq!(renderer.images.len(), 1);
        let bytes = renderer.finish(&DocumentInfo::default()).unwrap().into_inner();

        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = pages[&1];
        let content = doc.get_and_decode_page_content(page_id).unwrap();
        let draws = content.operations.iter().filter(|op| op.operator == "Do").count();
        assert_eq!(draws, 2);
        // The first image sits right below the top edge.
        let cm = content.operations.iter().find(|op| op.operator == "cm").unwrap();
        assert_eq!(cm.operands[5].as_float().unwrap(), 760.0);
    }

    #[test]
    fn test_missing_font_is_reported() {
        let mut arena = NodeArena::new();
        let glyph = arena.alloc(Glyph {
            codepoint: 3,
            components: "a".into(),
            font: Some(FontRef::new(DocumentId(0), 7)),
            width: pt(5.0),
            ..Glyph::default()
        });
        let hlist = ets_layout::hpack(&mut arena, Some(glyph));
        let vlist = arena.alloc(VList {
            list: Some(hlist),
            ..VList::default()
        });
        let mut renderer = PdfRenderer::new(Cursor::new(Vec::new())).unwrap();
        let err = renderer
            .render_page(&arena, &[Placement { x: pt(0.0), y: pt(100.0), vlist }], &OnlyImages, pt(100.0), pt(100.0))
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingResource(_)));
    }

    #[test]
    fn test_info_dictionary_carries_title() {
        let renderer = PdfRenderer::new(Cursor::new(Vec::new())).unwrap();
        let info = DocumentInfo {
            title: Some("Report".into()),
            creator: None,
        };
        let bytes = renderer.finish(&info).unwrap().into_inner();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        let info_ref = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let dict = doc.get_dictionary(info_ref).unwrap();
        assert_eq!(dict.get(b"Title").unwrap().as_str().unwrap(), b"Report");
    }
}
