//! # ets-lua
//!
//! The script surface of ets. A [`Runtime`] owns a Lua state with two
//! global libraries installed:
//!
//! - `node`: create nodes, splice lists, pack and break them into lines.
//! - `document`: open PDF documents and load the fonts, images and
//!   hyphenation patterns they use.
//!
//! Nodes and resources reach scripts as userdata handles. Fields are read
//! and written by name through dispatch tables built when the runtime is
//! created. Recoverable failures come back to the script as `false` plus a
//! message; misuse raises a Lua error.

mod convert;
mod document;
mod error;
mod font;
mod image;
mod language;
mod node;
mod page;
mod properties;
mod runtime;

pub use error::ScriptError;
pub use runtime::Runtime;
