use thiserror::Error;

/// Errors emitted by document transforms.
#[derive(Debug, Error)]
pub enum Error {
    /// The input bytes do not decode as a valid PDF structure.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The input bytes do not decode as an image.
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    /// Workspace or output file I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The Word container could not be written.
    #[error("failed to write document: {0}")]
    DocumentWrite(String),

    /// The caller passed inputs that cannot produce an artifact.
    #[error("{message}")]
    InvalidInput { message: String },
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
