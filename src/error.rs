//! Crate-wide error type.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the component and the bundled engine.
#[derive(Error, Debug)]
pub enum Error {
    /// The engine's working directory is unusable (missing and not creatable,
    /// not writable, or behind an unknown path alias).
    #[error("invalid configuration for '{}': {reason}", path.display())]
    InvalidConfig { path: PathBuf, reason: String },

    /// A method name that the engine does not declare.
    #[error("invalid or undefined engine method '{0}' passed to 'Pdf::run_method'")]
    InvalidMethod(String),

    #[error("invalid arguments for engine method '{method}': {reason}")]
    InvalidArguments { method: String, reason: String },

    #[error("invalid value for engine property '{name}': {reason}")]
    InvalidProperty { name: String, reason: String },

    #[error("unknown page format '{0}'")]
    UnknownFormat(String),

    #[error("failed to render PDF: {0}")]
    Render(String),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<taffy::TaffyError> for Error {
    fn from(err: taffy::TaffyError) -> Self {
        Error::Render(format!("layout failed: {err}"))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
