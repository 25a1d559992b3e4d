//! TrueType embedding as Type0 fonts with Identity-H encoding.

use crate::RenderError;
use crate::writer::StreamingPdfWriter;
use ets_layout::Face;
use lopdf::{Object, ObjectId, Stream, StringFormat, dictionary};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::Write;
use std::sync::Arc;

/// A face used by at least one page, together with the glyphs drawn from it.
pub(crate) struct EmbeddedFont {
    pub name: String,
    pub id: ObjectId,
    face: Arc<Face>,
    /// Glyph id to the text it was shaped from, for the ToUnicode map.
    used: BTreeMap<u16, String>,
}

impl EmbeddedFont {
    pub fn new(name: String, id: ObjectId, face: Arc<Face>) -> Self {
        Self {
            name,
            id,
            face,
            used: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, gid: u16, text: &str) {
        let entry = self.used.entry(gid).or_default();
        if entry.is_empty() {
            entry.push_str(text);
        }
    }

    /// Writes the font program, descriptor, CID font, ToUnicode map and the
    /// Type0 dictionary under the id reserved at first use.
    pub fn write<W: Write>(&self, writer: &mut StreamingPdfWriter<W>) -> Result<(), RenderError> {
        let parsed = ttf_parser::Face::parse(self.face.data(), self.face.index)
            .map_err(|e| RenderError::Font {
                face: self.face.name.clone(),
                reason: e.to_string(),
            })?;
        let upem = i64::from(self.face.units_per_em.max(1));
        let to_pdf = |units: i64| units * 1000 / upem;
        let bbox = parsed.global_bounding_box();
        let base_font = self.face.postscript_name.replace(' ', "");

        let program = Stream::new(
            dictionary! { "Length1" => self.face.data().len() as i64 },
            self.face.data().to_vec(),
        );
        let program_id = writer.write_object(Object::Stream(program))?;

        let mut flags = 32;
        if parsed.is_monospaced() {
            flags |= 1;
        }
        if parsed.is_italic() {
            flags |= 64;
        }
        let descriptor = dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => Object::Name(base_font.clone().into_bytes()),
            "Flags" => flags,
            "FontBBox" => vec![
                to_pdf(bbox.x_min.into()).into(),
                to_pdf(bbox.y_min.into()).into(),
                to_pdf(bbox.x_max.into()).into(),
                to_pdf(bbox.y_max.into()).into(),
            ],
            "ItalicAngle" => parsed.italic_angle() as i64,
            "Ascent" => to_pdf(self.face.ascender.into()),
            "Descent" => to_pdf(self.face.descender.into()),
            "CapHeight" => to_pdf(parsed.capital_height().unwrap_or(self.face.ascender).into()),
            "StemV" => 80,
            "FontFile2" => program_id,
        };
        let descriptor_id = writer.write_object(descriptor.into())?;

        let mut widths = Vec::with_capacity(self.used.len() * 2);
        for &gid in self.used.keys() {
            let advance = parsed.glyph_hor_advance(ttf_parser::GlyphId(gid)).unwrap_or(0);
            widths.push(Object::Integer(i64::from(gid)));
            widths.push(Object::Array(vec![Object::Integer(to_pdf(advance.into()))]));
        }
        let cid_font = dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => Object::Name(base_font.clone().into_bytes()),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "CIDToGIDMap" => "Identity",
            "W" => widths,
        };
        let cid_font_id = writer.write_object(cid_font.into())?;

        let cmap = Stream::new(dictionary! {}, self.to_unicode_cmap().into_bytes());
        let cmap_id = writer.write_object(Object::Stream(cmap))?;

        let type0 = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => Object::Name(base_font.into_bytes()),
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(cid_font_id)],
            "ToUnicode" => cmap_id,
        };
        writer.write_object_at(self.id, &type0.into())?;
        log::debug!("Embedded font {} ({} glyphs used)", self.name, self.used.len());
        Ok(())
    }

    fn to_unicode_cmap(&self) -> String {
        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
             1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
        );
        let mapped: Vec<_> = self.used.iter().filter(|(_, text)| !text.is_empty()).collect();
        // bfchar blocks hold at most 100 entries.
        for block in mapped.chunks(100) {
            let _ = writeln!(cmap, "{} beginbfchar", block.len());
            for (gid, text) in block {
                let utf16: String = text.encode_utf16().map(|u| format!("{:04X}", u)).collect();
                let _ = writeln!(cmap, "<{:04X}> <{}>", gid, utf16);
            }
            cmap.push_str("endbfchar\n");
        }
        cmap.push_str("endcmap\nCMapName currentdict /CIDInit /ProcSet findresource /defineresource pop\nend\nend\n");
        cmap
    }
}

/// Two-byte glyph string for the `Tj` operator under Identity-H.
pub(crate) fn glyph_string(gid: u16) -> Object {
    Object::String(gid.to_be_bytes().to_vec(), StringFormat::Hexadecimal)
}
