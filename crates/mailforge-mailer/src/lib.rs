//! # mailforge-mailer
//!
//! Transport glue for composed mail: resolves the envelope sender and
//! recipients, flattens the assembled message to raw RFC 5322 bytes, and
//! hands it to a delivery collaborator, fanning out one extra copy per
//! `Bcc` recipient.
//!
//! The actual delivery mechanism (SMTP dialog, authentication) lives behind
//! the [`Transport`] trait and is supplied by the caller.
//!
//! ## Quick Start
//!
//! ```ignore
//! use chrono::Utc;
//! use mailforge_mailer::{Mailer, Transport};
//! use mailforge_mime::Message;
//!
//! let mut msg = Message::new();
//! msg.set_header("From", "alex@example.com");
//! msg.set_header("To", "bob@example.com");
//! msg.set_body("text/plain", "Hello Bob!");
//!
//! let mut mailer = Mailer::new(my_smtp_transport);
//! mailer.send(&msg, Utc::now())?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod mailer;
mod transport;

pub use mailer::{Mailer, SendError};
pub use transport::Transport;
