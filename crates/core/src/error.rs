//! Errors raised by document operations.

use ets_layout::{FontError, HyphenationError, LayoutError};
use ets_node::NodeError;
use ets_render_lopdf::RenderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Configuration error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Font(#[from] FontError),
    #[error(transparent)]
    Hyphenation(#[from] HyphenationError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Node(#[from] NodeError),
    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),
    #[error("Cannot load image '{path}': {message}")]
    Image { path: String, message: String },
    #[error("document is already finished")]
    Finished,
    #[error("page {0} was already shipped out")]
    AlreadyShipped(usize),
    #[error("{0} belongs to a different document")]
    ForeignResource(String),
    #[error("{0} does not exist")]
    UnknownResource(String),
}
