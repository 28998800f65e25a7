use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Raster error: {0}")]
    Raster(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<CoreError> for String {
    fn from(err: CoreError) -> Self {
        err.to_string()
    }
}
