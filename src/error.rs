use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    #[error("command failed: {0}")]
    Command(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
