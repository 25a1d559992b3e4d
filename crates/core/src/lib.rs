//! # ets-core
//!
//! Documents, pages and the resource caches behind them.
//!
//! A [`Document`] owns its output file from [`Document::create`] until
//! [`Document::finish`], plus caches of faces, fonts, font families, image
//! files, images and hyphenation languages. Scripts only ever hold typed
//! references into these caches.

mod config;
mod document;
mod error;
mod page;
mod resources;

pub use config::EtsConfig;
pub use document::Document;
pub use error::DocumentError;
pub use page::Page;
pub use resources::{FontFamily, FontSource, FontStyle, Image, ImageFile, Resources};
