use fragseek::FragSeekError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Error interpreting the config: {reason}")]
    Config { reason: String },

    #[error("Error parsing config: {msg}")]
    ParseError { msg: String },

    #[error("Error accessing {}: {msg}", .path.as_deref().unwrap_or("<unknown>"))]
    Io { msg: String, path: Option<String> },

    #[error("Error writing results: {0}")]
    Output(#[from] csv::Error),

    #[error(transparent)]
    Search(#[from] FragSeekError),
}

pub type Result<T> = std::result::Result<T, CliError>;
