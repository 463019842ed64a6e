use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("receipt scanning is not configured")]
    MissingApiKey,
    #[error("image is empty")]
    EmptyImage,
    #[error("image is not valid base64")]
    InvalidImage(#[from] base64::DecodeError),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("vision service answered {status}: {message}")]
    Vision { status: StatusCode, message: String },
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
