//! Streaming PDF output for ets.
//!
//! Pages are rendered from node lists into content streams and written as
//! soon as they are shipped out. Fonts are embedded as Identity-H encoded
//! TrueType CID fonts once the document finishes and the set of used
//! glyphs is known. Images become XObjects the first time a page uses them.

mod error;
mod fonts;
mod images;
mod renderer;
mod writer;

pub use error::RenderError;
pub use images::ImageSource;
pub use renderer::{DocumentInfo, PdfRenderer, Placement, RenderResources};
pub use writer::StreamingPdfWriter;
