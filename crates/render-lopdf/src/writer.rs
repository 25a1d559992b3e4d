use crate::RenderError;
use lopdf::content::Content;
use lopdf::{Dictionary, Object, ObjectId, Stream, StringFormat, dictionary};
use std::io::{self, Write};

/// Writes a PDF file front to back without ever seeking.
///
/// Objects go to the sink as soon as they are written; only their byte
/// offsets are kept. Three ids are reserved up front so that pages can point
/// at the page tree and the shared resource dictionary before either exists.
/// [`StreamingPdfWriter::finish`] writes those, the catalog, the cross
/// reference table and the trailer.
pub struct StreamingPdfWriter<W: Write> {
    sink: W,
    position: u64,
    /// Byte offset per object number; `None` for ids reserved but unused.
    offsets: Vec<Option<u64>>,
    pages: ObjectId,
    resources: ObjectId,
    catalog: ObjectId,
    page_ids: Vec<ObjectId>,
    info: Option<Dictionary>,
}

impl<W: Write> StreamingPdfWriter<W> {
    pub fn new(sink: W) -> io::Result<Self> {
        let mut writer = Self {
            sink,
            position: 0,
            offsets: vec![None],
            pages: (0, 0),
            resources: (0, 0),
            catalog: (0, 0),
            page_ids: Vec::new(),
            info: None,
        };
        // The comment line with high bytes marks the file as binary.
        writer.emit(b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n")?;
        writer.pages = writer.reserve();
        writer.resources = writer.reserve();
        writer.catalog = writer.reserve();
        Ok(writer)
    }

    /// The page tree every page names as its parent.
    pub fn pages_id(&self) -> ObjectId {
        self.pages
    }

    /// The resource dictionary shared by all pages.
    pub fn resources_id(&self) -> ObjectId {
        self.resources
    }

    /// Hands out a fresh object id to be written later.
    pub fn reserve(&mut self) -> ObjectId {
        self.offsets.push(None);
        ((self.offsets.len() - 1) as u32, 0)
    }

    pub fn write_object(&mut self, object: Object) -> io::Result<ObjectId> {
        let id = self.reserve();
        self.write_object_at(id, &object)?;
        Ok(id)
    }

    pub fn write_object_at(&mut self, id: ObjectId, object: &Object) -> io::Result<()> {
        let slot = id.0 as usize;
        if slot >= self.offsets.len() {
            self.offsets.resize(slot + 1, None);
        }
        self.offsets[slot] = Some(self.position);

        let mut buf = format!("{} {} obj\n", id.0, id.1).into_bytes();
        serialize(&mut buf, object);
        buf.extend_from_slice(b"\nendobj\n");
        self.emit(&buf)
    }

    pub fn write_content(&mut self, content: Content) -> Result<ObjectId, RenderError> {
        let stream = Stream::new(Dictionary::new(), content.encode()?);
        Ok(self.write_object(Object::Stream(stream))?)
    }

    pub fn add_page(&mut self, page: ObjectId) {
        self.page_ids.push(page);
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub fn set_info(&mut self, info: Dictionary) {
        self.info = Some(info);
    }

    /// Completes the file and returns the sink, flushed.
    pub fn finish(mut self, resources: Dictionary) -> io::Result<W> {
        self.write_object_at(self.resources, &resources.into())?;

        let kids: Vec<Object> = self.page_ids.iter().map(|&id| Object::Reference(id)).collect();
        let count = kids.len() as i64;
        let tree = dictionary! { "Type" => "Pages", "Kids" => kids, "Count" => count };
        self.write_object_at(self.pages, &tree.into())?;

        let catalog = dictionary! { "Type" => "Catalog", "Pages" => self.pages };
        self.write_object_at(self.catalog, &catalog.into())?;

        let info = match self.info.take() {
            Some(info) => Some(self.write_object(info.into())?),
            None => None,
        };

        let xref_offset = self.position;
        let mut table = format!("xref\n0 {}\n0000000000 65535 f \n", self.offsets.len());
        for offset in &self.offsets[1..] {
            match offset {
                Some(offset) => table.push_str(&format!("{:010} 00000 n \n", offset)),
                None => table.push_str("0000000000 00000 f \n"),
            }
        }
        self.emit(table.as_bytes())?;

        let mut trailer = dictionary! { "Size" => self.offsets.len() as i64, "Root" => self.catalog };
        if let Some(info) = info {
            trailer.set("Info", info);
        }
        let mut buf = b"trailer\n".to_vec();
        serialize(&mut buf, &trailer.into());
        buf.extend_from_slice(format!("\nstartxref\n{}\n%%EOF\n", xref_offset).as_bytes());
        self.emit(&buf)?;

        self.sink.flush()?;
        Ok(self.sink)
    }

    fn emit(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.sink.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }
}

/// Appends the PDF syntax of `object` to `out`.
fn serialize(out: &mut Vec<u8>, object: &Object) {
    match object {
        Object::Null => out.extend_from_slice(b"null"),
        Object::Boolean(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        Object::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
        Object::Real(r) => out.extend_from_slice(real(*r).as_bytes()),
        Object::Name(name) => {
            out.push(b'/');
            out.extend_from_slice(name);
        }
        Object::String(bytes, StringFormat::Literal) => {
            out.push(b'(');
            for &b in bytes {
                if matches!(b, b'(' | b')' | b'\\') {
                    out.push(b'\\');
                }
                out.push(b);
            }
            out.push(b')');
        }
        Object::String(bytes, StringFormat::Hexadecimal) => {
            out.push(b'<');
            for b in bytes {
                out.extend_from_slice(format!("{:02X}", b).as_bytes());
            }
            out.push(b'>');
        }
        Object::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                serialize(out, item);
            }
            out.push(b']');
        }
        Object::Dictionary(dict) => serialize_dict(out, dict),
        Object::Stream(stream) => {
            let mut dict = stream.dict.clone();
            dict.set("Length", stream.content.len() as i64);
            serialize_dict(out, &dict);
            out.extend_from_slice(b"\nstream\n");
            out.extend_from_slice(&stream.content);
            out.extend_from_slice(b"\nendstream");
        }
        Object::Reference((num, gen_)) => out.extend_from_slice(format!("{} {} R", num, gen_).as_bytes()),
    }
}

fn serialize_dict(out: &mut Vec<u8>, dict: &Dictionary) {
    out.extend_from_slice(b"<<");
    for (key, value) in dict.iter() {
        out.push(b'/');
        out.extend_from_slice(key);
        out.push(b' ');
        serialize(out, value);
        out.push(b' ');
    }
    out.extend_from_slice(b">>");
}

/// Up to four decimals, without trailing zeros.
fn real(value: f32) -> String {
    let text = format!("{:.4}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "" | "-" | "-0" => "0".to_string(),
        t => t.to_string(),
    }
}
