//! Composes a multipart message and prints its wire form.

use chrono::Utc;
use mailforge_mime::Message;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut msg = Message::new();
    msg.set_address_header("From", "alex@example.com", "Alex");
    msg.set_address_header("To", "bob@example.com", "Señor Bob");
    msg.set_header("Subject", "¡Hola, señor!");
    msg.set_body("text/plain", "Hello Bob, see the attached notes.");
    msg.add_alternative("text/html", "Hello <b>Bob</b>, see the attached notes.");
    msg.attach_file_with("notes.txt", |_| Ok(b"- wrap lines at 78 columns\n".to_vec()))?;

    let wire = msg.export(Utc::now())?;
    print!("{}", String::from_utf8_lossy(&wire.to_bytes()));
    Ok(())
}
