use lopdf::Document as LopdfDocument;
use lopdf::Object;
use std::collections::BTreeSet;

/// BaseFont names of every font dictionary in the file.
pub fn extract_font_names(doc: &LopdfDocument) -> BTreeSet<String> {
    doc.objects
        .values()
        .filter_map(|object| object.as_dict().ok())
        .filter(|dict| matches!(dict.get(b"Type").and_then(Object::as_name), Ok(b"Font")))
        .filter_map(|dict| dict.get(b"BaseFont").and_then(Object::as_name).ok())
        .map(|name| String::from_utf8_lossy(name).to_string())
        .collect()
}

/// Number of image XObjects in the file, soft masks included.
pub fn count_images(doc: &LopdfDocument) -> usize {
    doc.objects
        .values()
        .filter_map(|object| object.as_stream().ok())
        .filter(|stream| matches!(stream.dict.get(b"Subtype").and_then(Object::as_name), Ok(b"Image")))
        .count()
}

/// Operator names of the content stream of page `number` (one based).
pub fn page_operators(doc: &LopdfDocument, number: u32) -> Vec<String> {
    let Some(&page_id) = doc.get_pages().get(&number) else {
        return Vec::new();
    };
    let Ok(content) = doc.get_and_decode_page_content(page_id) else {
        return Vec::new();
    };
    content.operations.into_iter().map(|op| op.operator).collect()
}

#[macro_export]
macro_rules! assert_pdf_page_count {
    ($pdf:expr, $expected:expr) => {
        assert_eq!(
            $pdf.page_count(),
            $expected,
            "expected {} pages, found {}",
            $expected,
            $pdf.page_count()
        );
    };
}
