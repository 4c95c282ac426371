use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("clip index {index} out of bounds (timeline has {len} clips)")]
    ClipIndexOutOfBounds { index: usize, len: usize },

    #[error("clip ranges overlap")]
    OverlapDetected,
}

pub type Result<T> = std::result::Result<T, CoreError>;
