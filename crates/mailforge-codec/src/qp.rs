//! Quoted-printable codec as specified by RFC 2045.
//!
//! Deviations, shared with most deployed codecs:
//! 1. `=\n` is accepted as a soft line break in addition to `=\r\n`.
//! 2. a `\r` or `\n` not preceded by `=` passes through unescaped.

use std::io::{self, BufRead, Read, Write};

use crate::error::{Error, Result};
use crate::{is_newline, is_vchar, is_wsp};

const HEX_TABLE: &[u8; 16] = b"0123456789ABCDEF";

/// Maximum length of an encoding of `n` source bytes.
#[must_use]
pub const fn max_encoded_len(n: usize) -> usize {
    3 * n
}

/// Encodes `src` as quoted-printable text.
///
/// Visible characters other than `=` pass through, as do newlines.
/// Horizontal whitespace is escaped only when it is the last character of a
/// line, where mail agents would otherwise strip it. Every other byte
/// becomes an uppercase `=XX` escape.
#[must_use]
pub fn encode(src: &[u8]) -> Vec<u8> {
    let mut dst = Vec::with_capacity(max_encoded_len(src.len()));
    for (i, &c) in src.iter().enumerate() {
        if c != b'=' && (is_vchar(c) || is_newline(c)) {
            dst.push(c);
        } else if is_wsp(c) && !is_last_char(i, src) {
            dst.push(c);
        } else {
            push_escape(&mut dst, c);
        }
    }
    dst
}

/// Returns true if byte `i` is the last character of its line.
fn is_last_char(i: usize, src: &[u8]) -> bool {
    i == src.len() - 1
        || src[i + 1] == b'\n'
        || (src[i + 1] == b'\r' && src.get(i + 2) == Some(&b'\n'))
}

fn push_escape(dst: &mut Vec<u8>, b: u8) {
    dst.push(b'=');
    dst.push(HEX_TABLE[(b >> 4) as usize]);
    dst.push(HEX_TABLE[(b & 0x0f) as usize]);
}

/// Decodes quoted-printable `src`.
///
/// Operates line by line: a line ending in `=` (optionally `=\r`) is a soft
/// break and is removed, and trailing whitespace before a line ending is
/// trimmed.
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] for an invalid hex digit after `=`, for
/// whitespace between a `=` and the line ending, and for any unescaped byte
/// outside the visible-ASCII/whitespace/newline set.
/// Returns [`Error::UnexpectedEnd`] for a `=` with fewer than two following
/// bytes at the end of the input.
pub fn decode(src: &[u8]) -> Result<Vec<u8>> {
    let mut dst = Vec::with_capacity(src.len());
    let mut start = 0;
    while start < src.len() {
        let end = src[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(src.len(), |i| start + i + 1);
        decode_line(&mut dst, src, start, end)?;
        start = end;
    }
    Ok(dst)
}

/// Decodes the raw line `src[start..end]` into `dst`. Error offsets are
/// absolute within `src`.
fn decode_line(dst: &mut Vec<u8>, src: &[u8], start: usize, end: usize) -> Result<()> {
    let line = &src[start..end];
    let eol_len = if line.ends_with(b"\r\n") {
        2
    } else if line.ends_with(b"\n") {
        1
    } else {
        0
    };
    let mut content_end = end - eol_len;
    let mut keep_eol = eol_len > 0;

    // Trailing whitespace is trimmed; a `=` left at the end of the trimmed
    // line is a soft break, while whitespace between the `=` and the line
    // ending is malformed.
    let mut trimmed = content_end;
    while trimmed > start && matches!(src[trimmed - 1], b' ' | b'\t' | b'\r' | b'\n') {
        trimmed -= 1;
    }
    if trimmed > start && src[trimmed - 1] == b'=' {
        if trimmed < content_end {
            return Err(Error::MalformedInput {
                byte: src[trimmed],
                offset: trimmed,
            });
        }
        trimmed -= 1;
        keep_eol = false;
    }
    content_end = trimmed;

    let mut i = start;
    while i < content_end {
        match src[i] {
            b'=' => {
                if i + 2 >= src.len() {
                    return Err(Error::UnexpectedEnd { offset: i });
                }
                dst.push(read_hex_byte(src, i + 1)?);
                i += 2;
            }
            c if (b' '..=b'~').contains(&c) || matches!(c, b'\n' | b'\r' | b'\t') => dst.push(c),
            c => return Err(Error::MalformedInput { byte: c, offset: i }),
        }
        i += 1;
    }
    if keep_eol {
        dst.extend_from_slice(&src[end - eol_len..end]);
    }
    Ok(())
}

fn from_hex(b: u8, offset: usize) -> Result<u8> {
    match b {
        b'0'..=b'9' => Ok(b - b'0'),
        b'A'..=b'F' => Ok(b - b'A' + 10),
        _ => Err(Error::MalformedInput { byte: b, offset }),
    }
}

/// Reads the two hex digits at `src[i]` and `src[i + 1]` as one byte.
pub(crate) fn read_hex_byte(src: &[u8], i: usize) -> Result<u8> {
    Ok(from_hex(src[i], i)? << 4 | from_hex(src[i + 1], i + 1)?)
}

/// Streaming quoted-printable encoder over any [`Write`] sink.
///
/// Every `write` call encodes its input independently; no state is carried
/// between calls. When the sink accepts only part of the encoded output, the
/// reported count covers whole encoded units only: a byte whose three-byte
/// escape was partially flushed counts as not consumed, so the caller can
/// resubmit the remainder.
#[derive(Debug)]
pub struct Encoder<W> {
    inner: W,
}

impl<W: Write> Encoder<W> {
    /// Creates an encoder writing encoded output to `inner`.
    pub const fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Unwraps the encoder, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let encoded = encode(buf);
        let mut flushed = 0;
        while flushed < encoded.len() {
            match self.inner.write(&encoded[flushed..]) {
                Ok(0) => break,
                Ok(n) => flushed += n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    let consumed = consumed_input(&encoded[..flushed]);
                    if consumed == 0 {
                        return Err(e);
                    }
                    // The error resurfaces when the caller resubmits.
                    return Ok(consumed);
                }
            }
        }
        if flushed == encoded.len() {
            Ok(buf.len())
        } else {
            Ok(consumed_input(&encoded[..flushed]))
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Counts the input bytes whose encoded unit lies entirely within `encoded`.
fn consumed_input(encoded: &[u8]) -> usize {
    let mut consumed = 0;
    let mut i = 0;
    while i < encoded.len() {
        if encoded[i] == b'=' {
            if i + 2 >= encoded.len() {
                break;
            }
            i += 2;
        }
        i += 1;
        consumed += 1;
    }
    consumed
}

/// Streaming quoted-printable decoder over any [`BufRead`] source.
///
/// Reads one raw line at a time from the source and decodes it
/// independently; decoded bytes are served across `read` calls. A decode
/// error on any line is fatal for the stream.
#[derive(Debug)]
pub struct Decoder<R> {
    inner: R,
    line: Vec<u8>,
    pos: usize,
    eof: bool,
    failed: Option<Error>,
}

impl<R: BufRead> Decoder<R> {
    /// Creates a decoder reading raw quoted-printable text from `inner`.
    pub const fn new(inner: R) -> Self {
        Self {
            inner,
            line: Vec::new(),
            pos: 0,
            eof: false,
            failed: None,
        }
    }
}

impl<R: BufRead> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut n = 0;
        while n < buf.len() {
            if self.pos == self.line.len() {
                if let Some(err) = &self.failed {
                    if n > 0 {
                        return Ok(n);
                    }
                    return Err(err.clone().into());
                }
                if self.eof {
                    return Ok(n);
                }
                let mut raw = Vec::new();
                if self.inner.read_until(b'\n', &mut raw)? == 0 {
                    self.eof = true;
                    continue;
                }
                if raw.last() != Some(&b'\n') {
                    self.eof = true;
                }
                match decode(&raw) {
                    Ok(decoded) => {
                        self.line = decoded;
                        self.pos = 0;
                    }
                    Err(err) => {
                        self.failed = Some(err);
                    }
                }
            } else {
                let take = (self.line.len() - self.pos).min(buf.len() - n);
                buf[n..n + take].copy_from_slice(&self.line[self.pos..self.pos + take]);
                self.pos += take;
                n += take;
            }
        }
        Ok(n)
    }
}
