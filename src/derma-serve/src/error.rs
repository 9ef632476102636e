use std::io;

use thiserror::Error;

/// Closed set of failure kinds surfaced by the service.
///
/// Everything a request can fail with is one of these; the HTTP layer maps
/// each kind to a status code and the uniform failure envelope.
#[derive(Debug, Error)]
pub enum Error {
    /// The multipart form carried no usable `image` field.
    #[error("No file uploaded")]
    MissingInput,

    /// A prediction was requested before the model finished loading.
    #[error("Model is not loaded. Please ensure the model is properly initialized.")]
    ModelUnavailable,

    /// Declared request body size exceeded the upload cap.
    #[error("Payload content length greater than maximum allowed: {0}")]
    PayloadTooLarge(u64),

    /// The uploaded bytes did not decode as an image.
    #[error("{0}")]
    Decode(String),

    /// A dependency failed: store call, inference runtime, or filesystem.
    #[error("{0}")]
    Upstream(String),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Decode(err.to_string())
    }
}

impl From<tensorflow::Status> for Error {
    fn from(status: tensorflow::Status) -> Self {
        Error::Upstream(status.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Upstream(err.to_string())
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Upstream(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
