//! Line-length-bounded pass-through writers.
//!
//! Both writers keep the visible length of every output line at or below 78
//! characters, as defined in RFC 5322 section 2.1.1. They perform byte
//! accounting and break insertion only and never inspect payload semantics
//! beyond what the break rules require.

use std::io::{self, Write};

/// Maximum visible line length, per RFC 5322 section 2.1.1.
pub const MAX_LINE_LEN: usize = 78;

/// Wraps base64 text at 78 characters per line.
///
/// Base64 has no escape sequences, so the split point is pure arithmetic:
/// fill the remaining columns, emit CRLF, continue.
#[derive(Debug)]
pub struct Base64LineWriter<W> {
    inner: W,
    line_len: usize,
}

impl<W: Write> Base64LineWriter<W> {
    /// Creates a wrapping writer around `inner`.
    pub const fn new(inner: W) -> Self {
        Self { inner, line_len: 0 }
    }

    /// Unwraps the writer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for Base64LineWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut p = buf;
        let mut n = 0;
        while p.len() + self.line_len > MAX_LINE_LEN {
            let fill = MAX_LINE_LEN - self.line_len;
            self.inner.write_all(&p[..fill])?;
            self.inner.write_all(b"\r\n")?;
            p = &p[fill..];
            n += fill;
            self.line_len = 0;
        }
        self.inner.write_all(p)?;
        self.line_len += p.len();
        Ok(n + p.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Wraps already-escaped quoted-printable text at 78 characters per line.
///
/// A literal `\n` arriving before the column limit is flushed through
/// unmodified and resets the column counter; no artificial break is inserted
/// before a genuine line ending. Otherwise a soft break `=\r\n` is inserted
/// at the limit, backed off by one or two bytes when the cut would fall
/// inside an `=XX` escape triplet.
#[derive(Debug)]
pub struct QpLineWriter<W> {
    inner: W,
    line_len: usize,
}

impl<W: Write> QpLineWriter<W> {
    /// Creates a wrapping writer around `inner`.
    pub const fn new(inner: W) -> Self {
        Self { inner, line_len: 0 }
    }

    /// Unwraps the writer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for QpLineWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut p = buf;
        let mut n = 0;
        while !p.is_empty() {
            let budget = MAX_LINE_LEN - self.line_len;

            // Under the limit: write everything and keep counting.
            if p.len() < budget {
                self.inner.write_all(p)?;
                self.line_len += p.len();
                return Ok(n + p.len());
            }

            // A genuine newline within reach ends the line for us. A bare
            // `\n` one past the limit still qualifies when a `\r` precedes
            // it, since CRLF adds no visible length.
            let window = &p[..(budget + 2).min(p.len())];
            if let Some(i) = window.iter().position(|&b| b == b'\n') {
                if i != budget + 1 || p[i - 1] == b'\r' {
                    self.inner.write_all(&p[..=i])?;
                    p = &p[i + 1..];
                    n += i + 1;
                    self.line_len = 0;
                    continue;
                }
            }

            // Never cut between `=` and its two hex digits.
            let cut = if budget >= 2 && p[budget - 2] == b'=' {
                budget - 2
            } else if p[budget - 1] == b'=' {
                budget - 1
            } else {
                budget
            };
            self.inner.write_all(&p[..cut])?;
            self.inner.write_all(b"=\r\n")?;
            p = &p[cut..];
            n += cut;
            self.line_len = 0;
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
