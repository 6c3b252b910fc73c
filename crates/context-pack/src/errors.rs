//! Error types for the context-pack library.
//!
//! Only the edges of the crate (config parsing, reading graph and diff files)
//! can fail. The ranking core is total and never produces these.

/// Top-level error enum for the context-pack library.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("Config error at line {line}: {message}")]
    Config { line: usize, message: String },

    /// An override that parsed but does not fit the config schema.
    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PackError {
    pub(crate) fn config(line: usize, message: impl Into<String>) -> Self {
        PackError::Config {
            line,
            message: message.into(),
        }
    }
}

#[cfg(feature = "python")]
impl From<PackError> for pyo3::PyErr {
    fn from(err: PackError) -> pyo3::PyErr {
        use pyo3::exceptions::{PyIOError, PyValueError};
        match &err {
            PackError::Io(_) => PyIOError::new_err(err.to_string()),
            PackError::Config { .. }
            | PackError::Invalid(_)
            | PackError::UnknownKey(_)
            | PackError::Json(_) => {
                PyValueError::new_err(err.to_string())
            }
        }
    }
}

pub type PackResult<T> = Result<T, PackError>;
