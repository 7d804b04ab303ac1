//! Error types for the transport layer.

/// Errors that can occur during transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Accepting an incoming connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(std::io::Error),

    /// Sending on an established connection failed.
    #[error("send failed: {0}")]
    SendFailed(std::io::Error),

    /// Receiving on an established connection failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(std::io::Error),

    /// The remote side went away.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),
}
