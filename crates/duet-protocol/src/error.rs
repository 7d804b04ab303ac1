//! Error types for the protocol layer.
//!
//! Each crate in Duet defines its own error enum. A `ProtocolError` always
//! means serialization trouble, not networking or room management.

/// Errors that can occur while encoding or decoding events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, or an
    /// unknown event tag.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but violates protocol rules (e.g. an empty
    /// display name on a create request).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
