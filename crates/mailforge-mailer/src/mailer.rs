//! Driving an assembled message through a transport collaborator.

use chrono::{DateTime, Utc};
use mailforge_mime::{Headers, Message, WireMessage};
use tracing::debug;

use crate::transport::Transport;

/// Errors from handing a message to the transport.
#[derive(Debug, thiserror::Error)]
pub enum SendError<E> {
    /// The message carries neither a `Sender` nor a `From` header.
    #[error("message has no Sender or From header")]
    MissingSender,

    /// The message could not be assembled.
    #[error(transparent)]
    Compose(#[from] mailforge_mime::Error),

    /// Failure reported by the transport collaborator, unmodified.
    #[error("transport error: {0}")]
    Transport(E),
}

/// Sends assembled messages through a [`Transport`].
#[derive(Debug)]
pub struct Mailer<T> {
    transport: T,
}

impl<T: Transport> Mailer<T> {
    /// Creates a mailer over the given transport.
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Assembles `msg` and sends it to all its recipients.
    ///
    /// The visible copy goes to the `To` and `Cc` addresses with the `Bcc`
    /// header omitted; every `Bcc` recipient then receives its own copy
    /// with the `Bcc` header narrowed to that recipient.
    ///
    /// # Errors
    ///
    /// [`SendError::MissingSender`] when neither `Sender` nor `From` is
    /// set, [`SendError::Compose`] when assembly fails, and
    /// [`SendError::Transport`] carrying the collaborator's error
    /// unmodified. No retry is attempted.
    pub fn send(&mut self, msg: &Message, now: DateTime<Utc>) -> Result<(), SendError<T::Error>> {
        let wire = msg.export(now)?;
        let from = sender_of(&wire.headers).ok_or(SendError::MissingSender)?;
        let (recipients, bcc) = recipients_of(&wire.headers);

        debug!(%from, to = recipients.len(), bcc = bcc.len(), "sending message");
        let raw = flatten(&wire, None);
        self.transport
            .send(&from, &recipients, &raw)
            .map_err(SendError::Transport)?;

        for hidden in &bcc {
            let raw = flatten(&wire, Some(hidden));
            self.transport
                .send(&from, std::slice::from_ref(hidden), &raw)
                .map_err(SendError::Transport)?;
        }
        Ok(())
    }
}

/// Renders the message as raw RFC 5322 bytes. The `Bcc` field is omitted,
/// or narrowed to the values matching the one given recipient.
fn flatten(wire: &WireMessage, bcc: Option<&str>) -> Vec<u8> {
    let mut out = Vec::with_capacity(wire.body.len() + 256);
    for (name, values) in wire.headers.iter() {
        if name.eq_ignore_ascii_case("Bcc") {
            let Some(bcc) = bcc else { continue };
            for value in values {
                if value.contains(bcc) {
                    push_field(&mut out, name, value);
                }
            }
        } else {
            push_field(&mut out, name, &values.join(", "));
        }
    }
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(&wire.body);
    out
}

fn push_field(out: &mut Vec<u8>, name: &str, value: &str) {
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(b": ");
    out.extend_from_slice(value.as_bytes());
    out.extend_from_slice(b"\r\n");
}

/// Resolves the envelope sender from `Sender`, then `From`.
fn sender_of(headers: &Headers) -> Option<String> {
    headers
        .get("Sender")
        .filter(|v| !v.is_empty())
        .or_else(|| headers.get("From"))
        .and_then(address_of)
}

const DESTINATION_FIELDS: [&str; 3] = ["Bcc", "To", "Cc"];

/// Gathers envelope recipients. `Bcc` addresses are collected separately
/// and excluded from the visible recipient list; duplicates are dropped.
/// Values that do not parse as addresses are skipped.
fn recipients_of(headers: &Headers) -> (Vec<String>, Vec<String>) {
    let mut recipients = Vec::new();
    let mut bcc = Vec::new();
    for field in DESTINATION_FIELDS {
        let Some(values) = headers.get_all(field) else {
            continue;
        };
        for value in values {
            let Some(address) = address_of(value) else {
                continue;
            };
            if field == "Bcc" {
                if !bcc.contains(&address) {
                    bcc.push(address);
                }
            } else if !bcc.contains(&address) && !recipients.contains(&address) {
                recipients.push(address);
            }
        }
    }
    (recipients, bcc)
}

/// Extracts the bare address from `Display Name <address>` or from a bare
/// address.
fn address_of(field: &str) -> Option<String> {
    let addr = match (field.find('<'), field.rfind('>')) {
        (Some(open), Some(close)) if open < close => &field[open + 1..close],
        _ => field,
    };
    let addr = addr.trim();
    if addr.is_empty() || !addr.contains('@') {
        return None;
    }
    Some(addr.to_string())
}
