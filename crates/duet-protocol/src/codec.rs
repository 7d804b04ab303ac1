//! Codec trait and the JSON implementation.
//!
//! The coordination layer never serializes events directly; it goes
//! through a [`Codec`] so the wire format can be swapped (a binary codec
//! is the obvious follow-up) without touching dispatch code.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts between event types and raw bytes.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// JSON codec via `serde_json`.
///
/// Human-readable, so events can be inspected in browser DevTools — the
/// client end of this protocol is a web app, which makes JSON the right
/// default rather than just the convenient one.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
