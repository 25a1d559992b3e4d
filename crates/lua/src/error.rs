//! Errors at the script boundary.
//!
//! Recoverable failures reach the script as the two values `false` and a
//! message. Usage errors (a wrong handle type, an unknown node kind, a bad
//! field write) are raised as Lua errors and abort the calling chunk.

use ets_core::DocumentError;
use ets_node::NodeError;
use mlua::{IntoLuaMulti, Lua, MultiValue};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("{0}")]
    Lua(#[from] mlua::Error),
    #[error("cannot read script '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// `bad argument #<pos> to '<function>' (<expected> expected, got <got>)`
pub(crate) fn bad_argument(pos: usize, function: &str, expected: &str, got: &str) -> mlua::Error {
    mlua::Error::RuntimeError(format!(
        "bad argument #{} to '{}' ({} expected, got {})",
        pos, function, expected, got
    ))
}

pub(crate) fn usage(err: impl std::fmt::Display) -> mlua::Error {
    mlua::Error::RuntimeError(err.to_string())
}

impl From<NodeError> for ScriptError {
    fn from(err: NodeError) -> Self {
        ScriptError::Lua(usage(err))
    }
}

/// The `false, message` pair.
pub(crate) fn fail(lua: &Lua, message: impl std::fmt::Display) -> mlua::Result<MultiValue> {
    let message = message.to_string();
    log::debug!("Script call failed: {}", message);
    (false, message).into_lua_multi(lua)
}

/// Hands a document result to the script: values on success, `false,
/// message` for recoverable failures, a raised error for misuse.
pub(crate) fn recover<T: IntoLuaMulti>(lua: &Lua, result: Result<T, DocumentError>) -> mlua::Result<MultiValue> {
    match result {
        Ok(value) => value.into_lua_multi(lua),
        Err(err @ (DocumentError::Node(_) | DocumentError::ForeignResource(_) | DocumentError::UnknownResource(_))) => {
            Err(usage(err))
        }
        Err(err) => fail(lua, err),
    }
}
