//! Transport envelope.
//!
//! A `Frame` is what the transport moves around: the opcode plus the raw,
//! already-encoded payload. Routing never needs to look inside the payload;
//! only the match controller (for moves) and the client (for state) decode it.

use bytes::Bytes;

use crate::{
    Opcode,
    errors::{ProtocolError, Result},
};

/// Opcode-tagged payload bytes.
///
/// # Invariants
///
/// - `payload` is never decoded during routing. Decoding is done through
///   [`crate::Payload::from_frame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw opcode. May be outside the protocol if the peer is misbehaving.
    pub opcode: u16,

    /// Encoded payload bytes.
    pub payload: Bytes,
}

impl Frame {
    /// Upper bound on accepted payload size (64 KiB).
    ///
    /// The largest legitimate payload (a projected view with two players) is
    /// well under 1 KiB.
    pub const MAX_PAYLOAD_SIZE: usize = 64 * 1024;

    /// Create a frame for a known opcode.
    #[must_use]
    pub fn new(opcode: Opcode, payload: impl Into<Bytes>) -> Self {
        Self { opcode: opcode.to_u16(), payload: payload.into() }
    }

    /// Create a frame from a raw opcode as delivered by the transport.
    #[must_use]
    pub fn from_raw(opcode: u16, payload: impl Into<Bytes>) -> Self {
        Self { opcode, payload: payload.into() }
    }

    /// Typed opcode. `None` if the raw value is not part of the protocol.
    #[must_use]
    pub fn opcode_enum(&self) -> Option<Opcode> {
        Opcode::from_u16(self.opcode)
    }

    /// Check the payload size limit.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if the payload exceeds
    ///   [`Frame::MAX_PAYLOAD_SIZE`]
    pub fn check_size(&self) -> Result<()> {
        Self::check_len(self.payload.len())
    }

    pub(crate) fn check_len(size: usize) -> Result<()> {
        if size > Self::MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge { size, max: Self::MAX_PAYLOAD_SIZE });
        }
        Ok(())
    }
}
