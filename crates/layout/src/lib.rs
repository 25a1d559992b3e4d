use ets_node::NodeError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error(transparent)]
    Node(#[from] NodeError),
    #[error("Line break settings: {0}")]
    InvalidSettings(String),
}

pub mod algorithms;
pub mod fonts;
pub mod hyphenation;
pub mod text;

pub use self::algorithms::hpack::{hpack, hpack_to};
pub use self::algorithms::linebreak::{LinebreakSettings, simple_linebreak};
pub use self::fonts::{Face, Font, FontError};
#[cfg(feature = "system-fonts")]
pub use self::fonts::FontLocator;
pub use self::hyphenation::{HyphenationError, Lang, hyphenate_list};
pub use self::text::shaper::ShapedGlyph;

#[cfg(test)]
mod test_utils;
