use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FragSeekError {
    /// Invalid build or search parameters. The caller has to fix the
    /// configuration and rebuild.
    #[error("Invalid configuration for `{field}`: {reason}")]
    Configuration { field: &'static str, reason: String },

    /// An operation was invoked before the state it depends on exists,
    /// e.g. searching before the index is built.
    #[error("Invalid state for `{operation}`: expected {expected}")]
    InvalidState {
        operation: &'static str,
        expected: &'static str,
    },

    #[error("Index {index} is out of range for a collection of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A build-time budget was exceeded. Retrying with fewer proteins,
    /// fewer variable modifications or a larger budget may succeed.
    #[error("Resource budget exceeded for {resource}: required at least {required}, budget is {budget}")]
    ResourceExhaustion {
        resource: &'static str,
        required: usize,
        budget: usize,
    },

    #[error("Error reading {path:?}: {source}")]
    Io {
        source: std::io::Error,
        path: Option<PathBuf>,
    },

    #[error("Error parsing input: {msg}")]
    Parse { msg: String },

    /// A sequence or modification could not be resolved to a mass.
    #[error("Chemistry error: {msg}")]
    Chemistry { msg: String },
}

impl FragSeekError {
    pub fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field,
            reason: reason.into(),
        }
    }

    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            source,
            path: Some(path.into()),
        }
    }
}

impl From<serde_json::Error> for FragSeekError {
    fn from(val: serde_json::Error) -> Self {
        FragSeekError::Parse {
            msg: val.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FragSeekError>;
