use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("dataset error: {0}")]
    Dataset(String),
    #[error("download of {url} failed after {attempts} attempts: {reason}")]
    Download {
        url: String,
        attempts: u32,
        reason: String,
    },
    #[error("input not found: {0}")]
    MissingInput(String),
}

impl From<anyhow::Error> for AssetError {
    fn from(value: anyhow::Error) -> Self {
        Self::Dataset(format!("{value:#}"))
    }
}
