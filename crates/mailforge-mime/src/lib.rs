//! # mailforge-mime
//!
//! Message model and multipart assembler for composing MIME email.
//!
//! ## Features
//!
//! - **Message model**: ordered headers, body parts, attachments
//! - **Header encoding**: non-ASCII header values fold into RFC 2047
//!   encoded-words automatically
//! - **Multipart assembly**: `multipart/mixed` and `multipart/alternative`
//!   envelopes with per-level boundaries
//! - **Body encoding**: quoted-printable or base64, wrapped to 78 columns
//!
//! ## Quick Start
//!
//! ```ignore
//! use chrono::Utc;
//! use mailforge_mime::Message;
//!
//! let mut msg = Message::new();
//! msg.set_address_header("From", "alex@example.com", "Alex");
//! msg.set_header("To", "bob@example.com");
//! msg.set_header("Subject", "¡Hola!");
//! msg.set_body("text/plain", "Hello Bob!");
//! msg.add_alternative("text/html", "Hello <b>Bob</b>!");
//! msg.attach("notes.txt", b"see attachment".to_vec());
//!
//! let wire = msg.export(Utc::now())?;
//! let raw = wire.to_bytes();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod boundary;
mod error;
mod export;
mod headers;
mod message;
mod mime_type;

pub use error::{Error, Result};
pub use export::WireMessage;
pub use headers::Headers;
pub use message::{Encoding, Message};
