use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("cannot write PDF: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot encode content stream: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("cannot embed face '{face}': {reason}")]
    Font { face: String, reason: String },
    #[error("glyph id {0} does not fit a CID font")]
    GlyphOutOfRange(i64),
    #[error("cannot output a {0} node, expected a vlist")]
    NotAList(&'static str),
    #[error("{0} is not known to this document")]
    MissingResource(String),
    #[error("cannot embed image: {0}")]
    Image(String),
}
