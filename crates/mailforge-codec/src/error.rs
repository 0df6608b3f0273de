//! Error types for codec operations.

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Codec error types.
///
/// Decode errors identify the offending byte and its offset in the input so
/// callers can point at the exact position in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A byte that is not valid at its position: a bad hex digit after `=`,
    /// a control byte that must have been escaped, or garbage between a `=`
    /// and the line ending.
    #[error("malformed input: invalid byte 0x{byte:02x} at offset {offset}")]
    MalformedInput {
        /// The offending byte.
        byte: u8,
        /// Offset of the offending byte in the input.
        offset: usize,
    },

    /// The input ended in the middle of an `=XX` escape sequence.
    #[error("unexpected end of input after `=` at offset {offset}")]
    UnexpectedEnd {
        /// Offset of the truncated `=`.
        offset: usize,
    },

    /// The requested encoded-word encoding is neither `Q` nor `B`.
    #[error("unsupported header encoding: {0:?}")]
    UnsupportedEncoding(String),

    /// Encoded-words within a single header value use different charsets.
    #[error("multiple charsets in header: {first:?} and {second:?}")]
    CharsetConflict {
        /// Charset of the first decoded word.
        first: String,
        /// The conflicting charset.
        second: String,
    },
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        Self::new(std::io::ErrorKind::InvalidData, err)
    }
}
