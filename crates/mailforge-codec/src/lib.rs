//! # mailforge-codec
//!
//! Text-transformation codecs for composing 7-bit-safe email: the
//! quoted-printable byte codec (RFC 2045), RFC 2047 encoded-words for
//! header values, and the line-length-bounded writers used when streaming
//! message bodies.
//!
//! ## Features
//!
//! - **Quoted-Printable**: buffer and streaming encode/decode with exact
//!   byte-level error positions
//! - **Encoded-words**: `=?charset?enc?payload?=` encoding and decoding
//!   with UTF-8-aware word splitting
//! - **Line wrapping**: `io::Write` adapters keeping every output line
//!   within 78 columns
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailforge_codec::{qp, word::WordEncoder};
//!
//! let encoded = qp::encode("Café".as_bytes());
//! assert_eq!(encoded, b"Caf=C3=A9");
//! assert_eq!(qp::decode(&encoded)?, "Café".as_bytes());
//!
//! let subject = WordEncoder::utf8_q().encode("São Paulo");
//! assert_eq!(subject, "=?UTF-8?Q?S=C3=A3o_Paulo?=");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;

pub mod qp;
pub mod word;
pub mod wrap;

pub use error::{Error, Result};
pub use word::{WordEncoder, WordEncoding, decode_header};

/// Returns true if `c` is an RFC 5322 VCHAR (visible) character.
pub(crate) const fn is_vchar(c: u8) -> bool {
    matches!(c, b'!'..=b'~')
}

/// Returns true if `c` is a space or horizontal tab (RFC 5234 appendix B).
pub(crate) const fn is_wsp(c: u8) -> bool {
    matches!(c, b' ' | b'\t')
}

/// Returns true if `c` is a newline character.
pub(crate) const fn is_newline(c: u8) -> bool {
    matches!(c, b'\n' | b'\r')
}
