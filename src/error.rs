use ets_core::DocumentError;
use ets_lua::ScriptError;
use thiserror::Error;

/// Everything that can stop a run of the `ets` binary.
#[derive(Error, Debug)]
pub enum EtsError {
    #[error("Script failed: {0}")]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Usage(String),
}
