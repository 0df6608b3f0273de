//! The transport collaborator boundary.

/// A delivery collaborator that accepts a fully assembled message.
///
/// Implementations carry their own server address and credentials; this
/// crate never inspects them. Errors surface unmodified through
/// [`SendError::Transport`](crate::SendError::Transport) with no retry or
/// backoff. A caller wanting timeouts wraps the transport externally.
pub trait Transport {
    /// Error type reported by the collaborator.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Delivers `raw_message` from `from` to `recipients`.
    ///
    /// # Errors
    ///
    /// Whatever the underlying delivery mechanism reports.
    fn send(
        &mut self,
        from: &str,
        recipients: &[String],
        raw_message: &[u8],
    ) -> Result<(), Self::Error>;
}
