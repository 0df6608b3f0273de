//! Mail message model: headers, body parts, attachments.

use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use mailforge_codec::{WordEncoder, WordEncoding};

use crate::error::Result;
use crate::headers::Headers;

/// Transfer encoding used for message bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Quoted-printable encoding (RFC 2045).
    QuotedPrintable,
    /// Base64 encoding (RFC 2045).
    Base64,
}

impl Encoding {
    const fn word_encoding(self) -> WordEncoding {
        match self {
            Self::QuotedPrintable => WordEncoding::Q,
            Self::Base64 => WordEncoding::B,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Base64 => write!(f, "base64"),
        }
    }
}

/// A textual body part.
#[derive(Debug, Clone)]
pub(crate) struct Part {
    pub(crate) content_type: String,
    pub(crate) body: Vec<u8>,
}

/// A file attachment.
#[derive(Debug, Clone)]
pub(crate) struct Attachment {
    pub(crate) name: String,
    pub(crate) content: Vec<u8>,
}

/// A mail message under construction.
///
/// Header values set through this type are routed through the RFC 2047
/// encoder, so they may contain arbitrary text. Bodies and attachments are
/// stored raw and encoded during [`export`](Message::export).
#[derive(Debug, Clone)]
pub struct Message {
    pub(crate) headers: Headers,
    pub(crate) parts: Vec<Part>,
    pub(crate) attachments: Vec<Attachment>,
    pub(crate) charset: String,
    pub(crate) encoding: Encoding,
    word_encoder: WordEncoder,
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

impl Message {
    /// Creates a new UTF-8 message using quoted-printable body encoding.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options("UTF-8", Encoding::QuotedPrintable)
    }

    /// Creates a message using the given charset label and body encoding.
    ///
    /// The charset is an opaque label: no conversion is performed, and
    /// header-word splitting is only available for UTF-8.
    #[must_use]
    pub fn with_options(charset: impl Into<String>, encoding: Encoding) -> Self {
        let charset = charset.into();
        let word_encoder = WordEncoder::new(charset.clone(), encoding.word_encoding());
        Self {
            headers: Headers::new(),
            parts: Vec::new(),
            attachments: Vec::new(),
            charset,
            encoding,
            word_encoder,
        }
    }

    /// Sets a header field, encoding the value when it needs it.
    pub fn set_header(&mut self, field: impl Into<String>, value: &str) {
        let value = self.word_encoder.encode(value);
        self.headers.set(field, value);
    }

    /// Adds a value to a header field, encoding the value when it needs it.
    pub fn add_header(&mut self, field: impl Into<String>, value: &str) {
        let value = self.word_encoder.encode(value);
        self.headers.add(field, value);
    }

    /// Sets an address header as `{display name} <{address}>`.
    pub fn set_address_header(&mut self, field: impl Into<String>, address: &str, name: &str) {
        let value = self.address_value(address, name);
        self.headers.set(field, value);
    }

    /// Adds an address to a header field as `{display name} <{address}>`.
    pub fn add_address_header(&mut self, field: impl Into<String>, address: &str, name: &str) {
        let value = self.address_value(address, name);
        self.headers.add(field, value);
    }

    fn address_value(&self, address: &str, name: &str) -> String {
        format!("{} <{address}>", self.word_encoder.encode(name))
    }

    /// Sets a date header in RFC 2822 format.
    pub fn set_date_header(&mut self, field: impl Into<String>, date: DateTime<Utc>) {
        self.headers.set(field, date.to_rfc2822());
    }

    /// Adds a date to a header field in RFC 2822 format.
    pub fn add_date_header(&mut self, field: impl Into<String>, date: DateTime<Utc>) {
        self.headers.add(field, date.to_rfc2822());
    }

    /// Gets the values of a header field, as stored (already encoded).
    #[must_use]
    pub fn header(&self, field: &str) -> Option<&[String]> {
        self.headers.get_all(field)
    }

    /// Deletes a header field.
    pub fn remove_header(&mut self, field: &str) {
        self.headers.remove(field);
    }

    /// Sets the body of the message, dropping any previously added parts.
    pub fn set_body(&mut self, content_type: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.parts = vec![Part {
            content_type: content_type.into(),
            body: body.into(),
        }];
    }

    /// Adds an alternative rendering of the body, usually the HTML version
    /// next to the plain-text one.
    pub fn add_alternative(&mut self, content_type: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.parts.push(Part {
            content_type: content_type.into(),
            body: body.into(),
        });
    }

    /// Appends an empty part and returns a writer for its body, for use
    /// with template engines and other `io::Write`-based producers.
    pub fn body_writer(&mut self, content_type: impl Into<String>) -> &mut Vec<u8> {
        self.parts.push(Part {
            content_type: content_type.into(),
            body: Vec::new(),
        });
        let last = self.parts.len() - 1;
        &mut self.parts[last].body
    }

    /// Attaches in-memory content under the given filename.
    ///
    /// Duplicate filenames are appended as-is; no de-duplication happens.
    pub fn attach(&mut self, name: impl Into<String>, content: Vec<u8>) {
        self.attachments.push(Attachment {
            name: name.into(),
            content,
        });
    }

    /// Attaches a file, reading its content through the supplied reader
    /// collaborator. The attachment name is the path's final component.
    ///
    /// # Errors
    ///
    /// Propagates the reader's error unmodified.
    pub fn attach_file_with<F>(&mut self, path: impl AsRef<Path>, read: F) -> Result<()>
    where
        F: FnOnce(&Path) -> std::io::Result<Vec<u8>>,
    {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let content = read(path)?;
        self.attach(name, content);
        Ok(())
    }
}
