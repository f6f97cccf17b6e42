use std::io;

use thiserror::Error;

use crate::session::ActionKind;

/// Problems caught locally, before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unsupported file type '{media_type}', only JPG, JPEG and PNG are accepted")]
    UnsupportedType { media_type: String },
    #[error("file is too large ({size_bytes} bytes), the limit is {limit} bytes")]
    TooLarge { size_bytes: u64, limit: u64 },
    #[error("an API key is required before running OCR")]
    MissingApiKey,
    #[error("paste or upload an image first")]
    NoImage,
    #[error("nothing to export, run OCR or write some content first")]
    NothingToExport,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The service answered with a structured `error` field.
    #[error("{0}")]
    Application(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    TimedOut,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for RequestError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            RequestError::TimedOut
        } else if error.is_builder() {
            RequestError::InvalidRequest(error.to_string())
        } else {
            RequestError::Network(error.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("{0} is already in progress")]
    Busy(ActionKind),
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    #[error("failed to deliver file: {0}")]
    Delivery(#[from] io::Error),
}
