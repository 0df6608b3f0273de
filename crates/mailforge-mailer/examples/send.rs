//! Sends a composed message through a transport that prints instead of
//! delivering.

use chrono::Utc;
use mailforge_mailer::{Mailer, Transport};
use mailforge_mime::Message;

struct ConsoleTransport;

impl Transport for ConsoleTransport {
    type Error = std::io::Error;

    fn send(
        &mut self,
        from: &str,
        recipients: &[String],
        raw_message: &[u8],
    ) -> Result<(), Self::Error> {
        println!("MAIL FROM: {from}");
        println!("RCPT TO: {}", recipients.join(", "));
        println!("{}", String::from_utf8_lossy(raw_message));
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut msg = Message::new();
    msg.set_address_header("From", "alex@example.com", "Alex");
    msg.set_header("To", "bob@example.com");
    msg.add_header("Bcc", "archive@example.com");
    msg.set_header("Subject", "¡Hola, señor!");
    msg.set_body("text/plain", "All systems nominal.");

    let mut mailer = Mailer::new(ConsoleTransport);
    mailer.send(&msg, Utc::now())?;
    Ok(())
}
