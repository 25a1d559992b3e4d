//! Newtype references to document-owned resources.
//!
//! A reference pairs the owning document with an index into one of its
//! caches, so a node can carry a font or image without owning it and the
//! document can reject references minted by a different document.

use std::fmt;

/// Identifies one document within a runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u32);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "document#{}", self.0)
    }
}

macro_rules! resource_ref {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            pub document: DocumentId,
            pub index: u32,
        }

        impl $name {
            pub const fn new(document: DocumentId, index: u32) -> Self {
                Self { document, index }
            }

            /// Position in the owning document's cache.
            pub const fn slot(self) -> usize {
                self.index as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}@{}", $label, self.index, self.document.0)
            }
        }
    };
}

resource_ref!(
    /// A loaded font face (the font file).
    FaceRef,
    "face"
);
resource_ref!(
    /// A face instantiated at a size.
    FontRef,
    "font"
);
resource_ref!(
    /// A named group of faces keyed by weight and style.
    FamilyRef,
    "fontfamily"
);
resource_ref!(
    /// A probed image file.
    ImageFileRef,
    "imagefile"
);
resource_ref!(
    /// An image instance placed by image nodes.
    ImageRef,
    "image"
);
resource_ref!(
    /// A hyphenation language loaded from a pattern file.
    LangRef,
    "lang"
);
resource_ref!(PageRef, "page");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refs_compare_by_document_and_index() {
        let a = FontRef::new(DocumentId(0), 1);
        let b = FontRef::new(DocumentId(1), 1);
        assert_ne!(a, b);
        assert_eq!(a, FontRef::new(DocumentId(0), 1));
        assert_eq!(a.slot(), 1);
        assert_eq!(a.to_string(), "font#1@0");
    }
}
