//! RFC 2047 encoded-words for MIME header values.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Error, Result};
use crate::qp::read_hex_byte;
use crate::{is_newline, is_vchar, is_wsp};

/// Maximum length of an encoded-word, per RFC 2047 section 2.
const MAX_ENCODED_WORD_LEN: usize = 75;

/// Sub-encoding of an encoded-word payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordEncoding {
    /// The Q-encoding defined in RFC 2047, a quoted-printable variant.
    Q,
    /// The Base64 encoding defined in RFC 2045.
    B,
}

impl WordEncoding {
    /// Parses an encoding tag as it appears on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedEncoding`] for anything but `Q` or `B`
    /// (case-insensitive).
    pub fn from_tag(tag: &str) -> Result<Self> {
        if tag.eq_ignore_ascii_case("q") {
            Ok(Self::Q)
        } else if tag.eq_ignore_ascii_case("b") {
            Ok(Self::B)
        } else {
            Err(Error::UnsupportedEncoding(tag.to_string()))
        }
    }

    const fn tag(self) -> char {
        match self {
            Self::Q => 'Q',
            Self::B => 'B',
        }
    }
}

/// Encoder for RFC 2047 encoded-words.
///
/// Splitting a string across several encoded-words is enabled only when the
/// charset is UTF-8: a multi-octet character must not be split across
/// adjacent words, and UTF-8 is the only charset whose character boundaries
/// this encoder knows.
#[derive(Debug, Clone)]
pub struct WordEncoder {
    charset: String,
    encoding: WordEncoding,
    split_words: bool,
}

impl WordEncoder {
    /// Creates an encoder producing words in `charset` with the given
    /// sub-encoding.
    pub fn new(charset: impl Into<String>, encoding: WordEncoding) -> Self {
        let charset = charset.into();
        let split_words = charset.eq_ignore_ascii_case("utf-8");
        Self {
            charset,
            encoding,
            split_words,
        }
    }

    /// The standard encoder: UTF-8 text in Q-encoded words.
    #[must_use]
    pub fn utf8_q() -> Self {
        Self::new("UTF-8", WordEncoding::Q)
    }

    /// Encodes a string for use as a MIME header value.
    ///
    /// The input passes through unchanged if every byte is a visible ASCII
    /// character or horizontal whitespace; otherwise it is folded into one
    /// or more encoded-words of at most 75 bytes each.
    #[must_use]
    pub fn encode(&self, s: &str) -> String {
        if !needs_encoding(s) {
            return s.to_string();
        }
        self.encode_word(s)
    }

    fn encode_word(&self, s: &str) -> String {
        let mut buf = String::new();
        let overhead = self.open_word(&mut buf);
        match self.encoding {
            WordEncoding::B => self.encode_b(&mut buf, s, overhead),
            WordEncoding::Q => self.encode_q(&mut buf, s, overhead),
        }
        close_word(&mut buf);
        buf
    }

    fn encode_b(&self, buf: &mut String, s: &str, overhead: usize) {
        let max_len = MAX_ENCODED_WORD_LEN.saturating_sub(overhead + 2);
        if !self.split_words || b64_len(s.len()) <= max_len {
            buf.push_str(&STANDARD.encode(s.as_bytes()));
            return;
        }

        let mut accumulated = 0;
        let mut last = 0;
        for (i, ch) in s.char_indices() {
            let rune_size = ch.len_utf8();
            if b64_len(accumulated + rune_size) <= max_len {
                accumulated += rune_size;
            } else {
                buf.push_str(&STANDARD.encode(&s.as_bytes()[last..i]));
                self.split_word(buf);
                last = i;
                accumulated = rune_size;
            }
        }
        buf.push_str(&STANDARD.encode(&s.as_bytes()[last..]));
    }

    fn encode_q(&self, buf: &mut String, s: &str, overhead: usize) {
        if !self.split_words {
            for &b in s.as_bytes() {
                push_q(buf, b);
            }
            return;
        }

        let mut len = overhead;
        for (i, ch) in s.char_indices() {
            let b = s.as_bytes()[i];
            let (enc_len, rune_size) = if b == b' ' || (is_vchar(b) && !matches!(b, b'=' | b'?' | b'_')) {
                (1, 1)
            } else {
                let rune_size = ch.len_utf8();
                (3 * rune_size, rune_size)
            };

            // Two columns stay reserved for the closing "?=".
            if len + enc_len > MAX_ENCODED_WORD_LEN - 2 {
                len = self.split_word(buf);
            }
            for &byte in &s.as_bytes()[i..i + rune_size] {
                push_q(buf, byte);
            }
            len += enc_len;
        }
    }

    fn open_word(&self, buf: &mut String) -> usize {
        buf.push_str("=?");
        buf.push_str(&self.charset);
        buf.push('?');
        buf.push(self.encoding.tag());
        buf.push('?');
        5 + self.charset.len()
    }

    fn split_word(&self, buf: &mut String) -> usize {
        close_word(buf);
        buf.push_str("\r\n ");
        self.open_word(buf)
    }
}

fn close_word(buf: &mut String) {
    buf.push_str("?=");
}

fn needs_encoding(s: &str) -> bool {
    s.bytes().any(|b| !is_vchar(b) && !is_wsp(b))
}

fn b64_len(n: usize) -> usize {
    base64::encoded_len(n, true).unwrap_or(usize::MAX)
}

fn push_q(buf: &mut String, b: u8) {
    if b == b' ' {
        buf.push('_');
    } else if is_vchar(b) && !matches!(b, b'=' | b'?' | b'_') {
        buf.push(b as char);
    } else {
        const HEX_TABLE: &[u8; 16] = b"0123456789ABCDEF";
        buf.push('=');
        buf.push(HEX_TABLE[(b >> 4) as usize] as char);
        buf.push(HEX_TABLE[(b & 0x0f) as usize] as char);
    }
}

/// Decodes a MIME header value by decoding every encoded-word in it.
///
/// Text outside encoded-words is copied through literally, and whitespace
/// separating two adjacent encoded-words is deleted. No charset conversion
/// is performed: the returned bytes are in the returned charset label, which
/// is `None` when the header contains no encoded-word.
///
/// A token that matches the encoded-word shape but whose payload fails to
/// decode is emitted verbatim rather than treated as an error.
///
/// # Errors
///
/// Returns [`Error::CharsetConflict`] when encoded-words within the value
/// use different charset labels.
pub fn decode_header(header: &str) -> Result<(Vec<u8>, Option<String>)> {
    let mut out = Vec::new();
    let mut charset: Option<String> = None;
    let mut rest = header;

    while let Some(i) = rest.find('=') {
        out.extend_from_slice(&rest.as_bytes()[..i]);
        rest = &rest[i..];

        let Some(word_len) = match_encoded_word(rest) else {
            out.push(b'=');
            rest = &rest[1..];
            continue;
        };
        let mut word = &rest[..word_len];

        loop {
            let Some((decoded, word_charset)) = decode_word(word) else {
                out.extend_from_slice(word.as_bytes());
                rest = &rest[word.len()..];
                break;
            };
            match &charset {
                None => charset = Some(word_charset),
                Some(current) if *current != word_charset => {
                    return Err(Error::CharsetConflict {
                        first: current.clone(),
                        second: word_charset,
                    });
                }
                Some(_) => {}
            }
            out.extend_from_slice(&decoded);
            rest = &rest[word.len()..];

            // Whitespace and newlines separating two encoded-words must be
            // deleted.
            let gap = rest
                .bytes()
                .take_while(|&b| is_wsp(b) || is_newline(b))
                .count();
            if gap == 0 {
                break;
            }
            match match_encoded_word(&rest[gap..]) {
                Some(next_len) => {
                    rest = &rest[gap..];
                    word = &rest[..next_len];
                }
                None => break,
            }
        }
    }
    out.extend_from_slice(rest.as_bytes());

    Ok((out, charset))
}

/// Matches an encoded-word at the start of `s`, returning its length.
///
/// Grammar: `=?` charset `?` [BbQq] `?` payload `?=`, where charset is one
/// or more word characters or `-` and payload is one or more non-`?` bytes.
fn match_encoded_word(s: &str) -> Option<usize> {
    let rest = s.strip_prefix("=?")?;
    let charset_len = rest.find('?')?;
    let charset = &rest[..charset_len];
    if charset.is_empty()
        || !charset
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return None;
    }

    let after_charset = &rest.as_bytes()[charset_len + 1..];
    if after_charset.len() < 2
        || !matches!(after_charset[0], b'b' | b'B' | b'q' | b'Q')
        || after_charset[1] != b'?'
    {
        return None;
    }

    let payload = &rest[charset_len + 3..];
    let payload_len = payload.find('?')?;
    if payload_len == 0 || payload.as_bytes().get(payload_len + 1) != Some(&b'=') {
        return None;
    }

    // "=?" + charset + "?X?" + payload + "?="
    Some(2 + charset_len + 3 + payload_len + 2)
}

/// Decodes a single matched encoded-word; `None` means the payload does not
/// decode and the word should be passed through verbatim.
fn decode_word(word: &str) -> Option<(Vec<u8>, String)> {
    let inner = &word[2..word.len() - 2];
    let mut fields = inner.split('?');
    let charset = fields.next()?;
    let encoding = fields.next()?;
    let payload = fields.next()?;

    let decoded = match encoding {
        "B" | "b" => STANDARD.decode(payload).ok()?,
        "Q" | "q" => q_decode(payload).ok()?,
        _ => return None,
    };
    Some((decoded, charset.to_string()))
}

/// Decodes a Q-encoded payload: `_` is a space, `=XX` a hex escape.
fn q_decode(s: &str) -> Result<Vec<u8>> {
    let src = s.as_bytes();
    let mut dst = Vec::with_capacity(src.len());
    let mut i = 0;
    while i < src.len() {
        match src[i] {
            b'_' => dst.push(b' '),
            b'=' => {
                if i + 2 >= src.len() {
                    return Err(Error::UnexpectedEnd { offset: i });
                }
                dst.push(read_hex_byte(src, i + 1)?);
                i += 2;
            }
            c if is_vchar(c) || matches!(c, b' ' | b'\n' | b'\r' | b'\t') => dst.push(c),
            c => return Err(Error::MalformedInput { byte: c, offset: i }),
        }
        i += 1;
    }
    Ok(dst)
}
