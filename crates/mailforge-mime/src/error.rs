//! Error types for message assembly.

/// Result type alias for message assembly operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Message assembly error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from the byte codecs while encoding a header or body.
    #[error(transparent)]
    Codec(#[from] mailforge_codec::Error),

    /// Failure reported by an external collaborator, such as an attachment
    /// reader or an output sink.
    #[error("upstream error: {0}")]
    Upstream(#[from] std::io::Error),
}
