//! # ets
//!
//! Scriptable typesetting. Lua scripts build TeX-style node lists (glyphs,
//! glue, penalties, boxes), pack and break them into lines, hyphenate them
//! and place the results on PDF pages.
//!
//! ```no_run
//! use ets::{EtsConfig, Runtime};
//!
//! let runtime = Runtime::new(EtsConfig::default())?;
//! runtime.exec(r#"
//!     local doc = document.new("out.pdf")
//!     doc.outputat(0, "800pt", node.new("vlist"))
//!     doc.finish()
//! "#, "hello")?;
//! # Ok::<(), ets::EtsError>(())
//! ```
//!
//! The pieces live in separate crates and are re-exported here:
//!
//! - `ets-types`: scaled points, distance literals, resource refs
//! - `ets-node`: the node arena and the by-name field registry
//! - `ets-layout`: fonts, shaping, hpack, line breaking, hyphenation
//! - `ets-core`: documents, pages and resource caches
//! - `ets-lua`: the Lua runtime

mod error;
pub mod runner;

pub use error::EtsError;
pub use ets_core::{Document, DocumentError, EtsConfig};
pub use ets_lua::{Runtime, ScriptError};

pub use ets_layout as layout;
pub use ets_node as node;
pub use ets_types as types;
