//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire payloads.
///
/// Every variant is recoverable: a peer that sends garbage is treated as
/// having sent no information at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload bytes are not a valid JSON document for the expected shape.
    #[error("json decode failed: {0}")]
    JsonDecode(String),

    /// Payload could not be serialized.
    #[error("json encode failed: {0}")]
    JsonEncode(String),

    /// Opcode is not part of the protocol.
    #[error("unknown opcode: {0}")]
    UnknownOpcode(u16),

    /// Payload exceeds [`crate::Frame::MAX_PAYLOAD_SIZE`].
    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge {
        /// Actual size in bytes
        size: usize,
        /// Maximum allowed size
        max: usize,
    },
}
