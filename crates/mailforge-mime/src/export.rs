//! Export of a [`Message`] into its wire form.

use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use mailforge_codec::qp;
use mailforge_codec::wrap::{Base64LineWriter, QpLineWriter};

use crate::boundary;
use crate::error::Result;
use crate::headers::Headers;
use crate::message::{Encoding, Message};
use crate::mime_type;

/// A fully assembled message: the top-level header mapping plus one
/// concatenated, encoded body.
#[derive(Debug, Clone)]
pub struct WireMessage {
    /// Top-level headers, in write order.
    pub headers: Headers,
    /// The message body, CRLF framed.
    pub body: Vec<u8>,
}

impl WireMessage {
    /// Renders headers and body as one raw RFC 5322 message.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.body.len() + 256);
        for (name, values) in self.headers.iter() {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(values.join(", ").as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
        out
    }
}

impl Message {
    /// Assembles the message into its wire form.
    ///
    /// `now` supplies the `Date` header when none was set; `Mime-Version`
    /// is added the same way. The envelope shape is decided before any
    /// output: `multipart/mixed` wraps everything when attachments mix with
    /// body parts or there is more than one attachment, and
    /// `multipart/alternative` wraps multiple body parts.
    ///
    /// # Errors
    ///
    /// Fails when a part body cannot be encoded or written; no partial
    /// message is returned.
    pub fn export(&self, now: DateTime<Utc>) -> Result<WireMessage> {
        let mut w = MessageWriter::new(self, now);

        if self.is_mixed() {
            w.open_multipart("mixed");
        }
        if self.is_alternative() {
            w.open_multipart("alternative");
        }

        for part in &self.parts {
            w.write_header(&[
                (
                    "Content-Type",
                    format!("{}; charset={}", part.content_type, self.charset),
                ),
                ("Content-Transfer-Encoding", self.encoding.to_string()),
            ]);
            w.write_body(&part.body, self.encoding)?;
        }
        if self.is_alternative() {
            w.close_multipart();
        }

        for attachment in &self.attachments {
            let mime_type = mime_type::from_filename(&attachment.name);
            w.write_header(&[
                (
                    "Content-Type",
                    format!("{mime_type}; name=\"{}\"", attachment.name),
                ),
                (
                    "Content-Disposition",
                    format!("attachment; filename=\"{}\"", attachment.name),
                ),
                ("Content-Transfer-Encoding", Encoding::Base64.to_string()),
            ]);
            w.write_body(&attachment.content, Encoding::Base64)?;
        }
        if self.is_mixed() {
            w.close_multipart();
        }

        Ok(w.finish())
    }

    fn is_mixed(&self) -> bool {
        (!self.parts.is_empty() && !self.attachments.is_empty()) || self.attachments.len() > 1
    }

    fn is_alternative(&self) -> bool {
        self.parts.len() > 1
    }
}

/// One open multipart nesting level.
struct Level {
    boundary: String,
    has_parts: bool,
}

/// Incremental body writer with a dynamic stack of open multipart levels.
struct MessageWriter {
    headers: Headers,
    buf: Vec<u8>,
    levels: Vec<Level>,
}

impl MessageWriter {
    fn new(msg: &Message, now: DateTime<Utc>) -> Self {
        // Copied so export never mutates the message.
        let mut headers = msg.headers.clone();
        if !headers.contains("Mime-Version") {
            headers.set("Mime-Version", "1.0");
        }
        if !headers.contains("Date") {
            headers.set("Date", now.to_rfc2822());
        }
        Self {
            headers,
            buf: Vec::new(),
            levels: Vec::new(),
        }
    }

    fn open_multipart(&mut self, subtype: &str) {
        let boundary = boundary::generate();
        let content_type = format!("multipart/{subtype}; boundary={boundary}");
        if self.levels.is_empty() {
            self.headers.set("Content-Type", content_type);
        } else {
            self.create_part(&[("Content-Type", content_type)]);
        }
        self.levels.push(Level {
            boundary,
            has_parts: false,
        });
    }

    fn close_multipart(&mut self) {
        if let Some(level) = self.levels.pop() {
            self.buf.extend_from_slice(b"\r\n--");
            self.buf.extend_from_slice(level.boundary.as_bytes());
            self.buf.extend_from_slice(b"--\r\n");
        }
    }

    fn write_header(&mut self, fields: &[(&str, String)]) {
        if self.levels.is_empty() {
            for (name, value) in fields {
                self.headers.set(*name, value.clone());
            }
        } else {
            self.create_part(fields);
        }
    }

    fn create_part(&mut self, fields: &[(&str, String)]) {
        let Some(level) = self.levels.last_mut() else {
            return;
        };
        if level.has_parts {
            self.buf.extend_from_slice(b"\r\n");
        }
        level.has_parts = true;
        self.buf.extend_from_slice(b"--");
        self.buf.extend_from_slice(level.boundary.as_bytes());
        self.buf.extend_from_slice(b"\r\n");
        for (name, value) in fields {
            self.buf.extend_from_slice(name.as_bytes());
            self.buf.extend_from_slice(b": ");
            self.buf.extend_from_slice(value.as_bytes());
            self.buf.extend_from_slice(b"\r\n");
        }
        self.buf.extend_from_slice(b"\r\n");
    }

    fn write_body(&mut self, body: &[u8], encoding: Encoding) -> Result<()> {
        match encoding {
            Encoding::Base64 => {
                let mut encoder = base64::write::EncoderWriter::new(
                    Base64LineWriter::new(&mut self.buf),
                    &STANDARD,
                );
                encoder.write_all(body)?;
                encoder.finish()?;
            }
            Encoding::QuotedPrintable => {
                let mut encoder = qp::Encoder::new(QpLineWriter::new(&mut self.buf));
                encoder.write_all(body)?;
            }
        }
        Ok(())
    }

    fn finish(self) -> WireMessage {
        WireMessage {
            headers: self.headers,
            body: self.buf,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use base64::Engine;
    use chrono::TimeZone;

    const FIXED_DATE: &str = "Wed, 25 Jun 2014 17:46:00 +0000";

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 6, 25, 17, 46, 0).unwrap()
    }

    fn boundary_of(content_type: &str) -> String {
        let idx = content_type.find("boundary=").unwrap();
        content_type[idx + "boundary=".len()..]
            .chars()
            .take_while(char::is_ascii_alphanumeric)
            .collect()
    }

    fn body_str(wire: &WireMessage) -> String {
        String::from_utf8(wire.body.clone()).unwrap()
    }

    #[test]
    fn test_export_flat_message() {
        let mut msg = Message::new();
        msg.set_address_header("From", "from@example.com", "Señor From");
        msg.set_address_header("To", "to@example.com", "Señor To");
        msg.add_address_header("To", "tobis@example.com", "Señor To Bis");
        msg.set_header("Subject", "¡Hola, señor!");
        msg.set_body("text/plain", "¡Hola, señor!");

        let wire = msg.export(fixed_now()).unwrap();

        assert_eq!(
            wire.headers.get("From"),
            Some("=?UTF-8?Q?Se=C3=B1or_From?= <from@example.com>")
        );
        assert_eq!(
            wire.headers.get_all("To").unwrap(),
            [
                "=?UTF-8?Q?Se=C3=B1or_To?= <to@example.com>",
                "=?UTF-8?Q?Se=C3=B1or_To_Bis?= <tobis@example.com>",
            ]
        );
        assert_eq!(
            wire.headers.get("Subject"),
            Some("=?UTF-8?Q?=C2=A1Hola,_se=C3=B1or!?=")
        );
        assert_eq!(wire.headers.get("Mime-Version"), Some("1.0"));
        assert_eq!(wire.headers.get("Date"), Some(FIXED_DATE));
        assert_eq!(
            wire.headers.get("Content-Type"),
            Some("text/plain; charset=UTF-8")
        );
        assert_eq!(
            wire.headers.get("Content-Transfer-Encoding"),
            Some("quoted-printable")
        );
        assert_eq!(body_str(&wire), "=C2=A1Hola, se=C3=B1or!");
    }

    #[test]
    fn test_export_empty_message() {
        let msg = Message::new();
        let wire = msg.export(fixed_now()).unwrap();

        assert_eq!(wire.headers.get("Mime-Version"), Some("1.0"));
        assert_eq!(wire.headers.get("Date"), Some(FIXED_DATE));
        assert_eq!(wire.headers.get("Content-Type"), None);
        assert!(wire.body.is_empty());
    }

    #[test]
    fn test_export_keeps_explicit_date() {
        let mut msg = Message::new();
        msg.set_date_header("Date", Utc.with_ymd_and_hms(2020, 1, 12, 3, 4, 5).unwrap());
        let wire = msg.export(fixed_now()).unwrap();
        assert_eq!(wire.headers.get("Date"), Some("Sun, 12 Jan 2020 03:04:05 +0000"));
    }

    #[test]
    fn test_export_base64_body() {
        let mut msg = Message::with_options("ISO-8859-1", Encoding::Base64);
        msg.add_header("Subject", "café");
        msg.set_body("text/html", "¡Hola, señor!");

        let wire = msg.export(fixed_now()).unwrap();

        assert_eq!(wire.headers.get("Subject"), Some("=?ISO-8859-1?B?Y2Fmw6k=?="));
        assert_eq!(
            wire.headers.get("Content-Type"),
            Some("text/html; charset=ISO-8859-1")
        );
        assert_eq!(
            wire.headers.get("Content-Transfer-Encoding"),
            Some("base64")
        );
        assert_eq!(body_str(&wire), "wqFIb2xhLCBzZcOxb3Ih");
    }

    #[test]
    fn test_export_alternative() {
        let mut msg = Message::new();
        msg.set_body("text/plain", "¡Hola, señor!");
        msg.add_alternative("text/html", "¡<b>Hola</b>, <i>señor</i>!");

        let wire = msg.export(fixed_now()).unwrap();
        let content_type = wire.headers.get("Content-Type").unwrap();
        assert!(content_type.starts_with("multipart/alternative; boundary="));
        let b = boundary_of(content_type);

        let want = format!(
            "--{b}\r\n\
             Content-Type: text/plain; charset=UTF-8\r\n\
             Content-Transfer-Encoding: quoted-printable\r\n\
             \r\n\
             =C2=A1Hola, se=C3=B1or!\r\n\
             --{b}\r\n\
             Content-Type: text/html; charset=UTF-8\r\n\
             Content-Transfer-Encoding: quoted-printable\r\n\
             \r\n\
             =C2=A1<b>Hola</b>, <i>se=C3=B1or</i>!\r\n\
             --{b}--\r\n"
        );
        assert_eq!(body_str(&wire), want);
    }

    #[test]
    fn test_export_part_with_attachment_is_mixed() {
        let mut msg = Message::new();
        msg.set_body("text/plain", "Test");
        msg.attach("test.pdf", b"Content of test.pdf".to_vec());

        let wire = msg.export(fixed_now()).unwrap();
        let content_type = wire.headers.get("Content-Type").unwrap();
        assert!(content_type.starts_with("multipart/mixed; boundary="));
        let b = boundary_of(content_type);

        let pdf = STANDARD.encode(b"Content of test.pdf");
        let want = format!(
            "--{b}\r\n\
             Content-Type: text/plain; charset=UTF-8\r\n\
             Content-Transfer-Encoding: quoted-printable\r\n\
             \r\n\
             Test\r\n\
             --{b}\r\n\
             Content-Type: application/pdf; name=\"test.pdf\"\r\n\
             Content-Disposition: attachment; filename=\"test.pdf\"\r\n\
             Content-Transfer-Encoding: base64\r\n\
             \r\n\
             {pdf}\r\n\
             --{b}--\r\n"
        );
        assert_eq!(body_str(&wire), want);
    }

    #[test]
    fn test_export_single_attachment_stays_flat() {
        let mut msg = Message::new();
        msg.attach("test.pdf", b"Content of test.pdf".to_vec());

        let wire = msg.export(fixed_now()).unwrap();

        assert_eq!(
            wire.headers.get("Content-Type"),
            Some("application/pdf; name=\"test.pdf\"")
        );
        assert_eq!(
            wire.headers.get("Content-Disposition"),
            Some("attachment; filename=\"test.pdf\"")
        );
        assert_eq!(
            wire.headers.get("Content-Transfer-Encoding"),
            Some("base64")
        );
        assert_eq!(body_str(&wire), STANDARD.encode(b"Content of test.pdf"));
    }

    #[test]
    fn test_export_two_attachments_without_part_is_mixed() {
        let mut msg = Message::new();
        msg.attach("test.pdf", b"Content of test.pdf".to_vec());
        msg.attach("test.zip", b"Content of test.zip".to_vec());

        let wire = msg.export(fixed_now()).unwrap();
        let content_type = wire.headers.get("Content-Type").unwrap();
        assert!(content_type.starts_with("multipart/mixed; boundary="));
        let b = boundary_of(content_type);

        let pdf = STANDARD.encode(b"Content of test.pdf");
        let zip = STANDARD.encode(b"Content of test.zip");
        let want = format!(
            "--{b}\r\n\
             Content-Type: application/pdf; name=\"test.pdf\"\r\n\
             Content-Disposition: attachment; filename=\"test.pdf\"\r\n\
             Content-Transfer-Encoding: base64\r\n\
             \r\n\
             {pdf}\r\n\
             --{b}\r\n\
             Content-Type: application/zip; name=\"test.zip\"\r\n\
             Content-Disposition: attachment; filename=\"test.zip\"\r\n\
             Content-Transfer-Encoding: base64\r\n\
             \r\n\
             {zip}\r\n\
             --{b}--\r\n"
        );
        assert_eq!(body_str(&wire), want);
    }

    #[test]
    fn test_export_part_and_two_attachments_skips_alternative() {
        let mut msg = Message::new();
        msg.set_body("text/plain", "see attachments");
        msg.attach("a.pdf", b"A".to_vec());
        msg.attach("b.zip", b"B".to_vec());

        let wire = msg.export(fixed_now()).unwrap();
        let content_type = wire.headers.get("Content-Type").unwrap();
        assert!(content_type.starts_with("multipart/mixed; boundary="));

        let body = body_str(&wire);
        assert!(!body.contains("multipart/alternative"));
        assert_eq!(body.matches("Content-Transfer-Encoding: base64").count(), 2);
        assert_eq!(
            body.matches("Content-Transfer-Encoding: quoted-printable")
                .count(),
            1
        );
    }

    #[test]
    fn test_export_nested_mixed_and_alternative() {
        let mut msg = Message::new();
        msg.set_body("text/plain", "¡Hola, señor!");
        msg.add_alternative("text/html", "¡<b>Hola</b>, <i>señor</i>!");
        msg.attach("test.pdf", b"Content of test.pdf".to_vec());

        let wire = msg.export(fixed_now()).unwrap();
        let content_type = wire.headers.get("Content-Type").unwrap();
        assert!(content_type.starts_with("multipart/mixed; boundary="));
        let main = boundary_of(content_type);

        let body = body_str(&wire);
        let inner_ct = body.find("Content-Type: multipart/alternative").unwrap();
        let sub = boundary_of(&body[inner_ct..]);

        let pdf = STANDARD.encode(b"Content of test.pdf");
        let want = format!(
            "--{main}\r\n\
             Content-Type: multipart/alternative; boundary={sub}\r\n\
             \r\n\
             --{sub}\r\n\
             Content-Type: text/plain; charset=UTF-8\r\n\
             Content-Transfer-Encoding: quoted-printable\r\n\
             \r\n\
             =C2=A1Hola, se=C3=B1or!\r\n\
             --{sub}\r\n\
             Content-Type: text/html; charset=UTF-8\r\n\
             Content-Transfer-Encoding: quoted-printable\r\n\
             \r\n\
             =C2=A1<b>Hola</b>, <i>se=C3=B1or</i>!\r\n\
             --{sub}--\r\n\
             \r\n\
             --{main}\r\n\
             Content-Type: application/pdf; name=\"test.pdf\"\r\n\
             Content-Disposition: attachment; filename=\"test.pdf\"\r\n\
             Content-Transfer-Encoding: base64\r\n\
             \r\n\
             {pdf}\r\n\
             --{main}--\r\n"
        );
        assert_eq!(body, want);
    }

    #[test]
    fn test_export_qp_line_wrapping() {
        let zeros = |n: usize| "0".repeat(n);
        let mut msg = Message::new();
        msg.set_body(
            "text/plain",
            format!(
                "{}\r\n{}à\r\n{}à\r\n{}à\r\n{}à\r\n{}\r\n{}\n",
                zeros(79),
                zeros(78),
                zeros(77),
                zeros(76),
                zeros(75),
                zeros(78),
                zeros(79),
            ),
        );

        let wire = msg.export(fixed_now()).unwrap();
        let want = format!(
            "{}=\r\n0\r\n{}=\r\n=C3=A0\r\n{}=\r\n=C3=A0\r\n{}=\r\n=C3=A0\r\n{}=C3=\r\n=A0\r\n{}\r\n{}=\r\n0\n",
            zeros(78),
            zeros(78),
            zeros(77),
            zeros(76),
            zeros(75),
            zeros(78),
            zeros(78),
        );
        assert_eq!(body_str(&wire), want);
    }

    #[test]
    fn test_export_base64_line_wrapping() {
        let mut msg = Message::with_options("UTF-8", Encoding::Base64);
        msg.set_body("text/plain", "0".repeat(58));

        let wire = msg.export(fixed_now()).unwrap();
        let want = format!("{}MA\r\n==", "MDAw".repeat(19));
        assert_eq!(body_str(&wire), want);
    }

    #[test]
    fn test_wire_message_to_bytes() {
        let mut msg = Message::new();
        msg.set_header("From", "a@example.com");
        msg.set_body("text/plain", "hi");

        let raw = msg.export(fixed_now()).unwrap().to_bytes();
        let text = String::from_utf8(raw).unwrap();
        assert!(text.starts_with("From: a@example.com\r\n"));
        assert!(text.contains("\r\n\r\nhi"));
    }
}
