use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not parse config: {0}")]
    Parse(#[from] toml_edit::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Usage: {0}")]
    Usage(String),
}

pub type AppResult<T> = Result<T, AppError>;
