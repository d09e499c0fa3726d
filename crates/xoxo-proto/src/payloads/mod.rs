//! JSON-encoded protocol messages.
//!
//! The frame opcode selects the payload type, so only the inner struct is
//! serialized (no variant tag on the wire). Decoding goes through the
//! opcode, which means a `State` body sent with the `Move` opcode fails to
//! decode rather than being misinterpreted.

pub mod game;

use crate::{
    Frame, Opcode,
    errors::{ProtocolError, Result},
};

/// All possible frame payloads.
///
/// # Invariants
///
/// - Each variant maps to exactly one [`Opcode`] (enforced by exhaustive
///   matching in [`Payload::opcode`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Move command from a player.
    Move(game::Move),
    /// Projected state for one recipient.
    State(game::ProjectedView),
}

impl Payload {
    /// Opcode corresponding to this payload type.
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::Move(_) => Opcode::Move,
            Self::State(_) => Opcode::State,
        }
    }

    /// Encode the inner struct as JSON.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::JsonEncode` if serialization fails
    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Self::Move(inner) => serde_json::to_vec(inner),
            Self::State(inner) => serde_json::to_vec(inner),
        }
        .map_err(|e| ProtocolError::JsonEncode(e.to_string()))
    }

    /// Decode payload bytes for a given opcode.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::PayloadTooLarge` if bytes exceed
    ///   [`Frame::MAX_PAYLOAD_SIZE`]; checked before parsing
    /// - `ProtocolError::JsonDecode` on malformed JSON, non-object bodies,
    ///   unknown fields or out-of-range values
    pub fn decode(opcode: Opcode, bytes: &[u8]) -> Result<Self> {
        Frame::check_len(bytes.len())?;
        Self::parse(opcode, bytes)
    }

    fn parse(opcode: Opcode, bytes: &[u8]) -> Result<Self> {
        let payload = match opcode {
            Opcode::Move => game::from_object_slice(bytes).map(Self::Move),
            Opcode::State => game::from_object_slice(bytes).map(Self::State),
        };

        payload.map_err(|e| ProtocolError::JsonDecode(e.to_string()))
    }

    /// Encode into a transport frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::JsonEncode` if serialization fails
    pub fn into_frame(self) -> Result<Frame> {
        let bytes = self.encode()?;
        Ok(Frame::new(self.opcode(), bytes))
    }

    /// Parse a transport frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::UnknownOpcode` if the frame's opcode is not part of
    ///   the protocol
    /// - any error from [`Payload::decode`]
    pub fn from_frame(frame: &Frame) -> Result<Self> {
        let opcode =
            frame.opcode_enum().ok_or(ProtocolError::UnknownOpcode(frame.opcode))?;
        frame.check_size()?;
        Self::parse(opcode, &frame.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        game::{Move, ProjectedView, StateSnapshot},
        *,
    };

    #[test]
    fn move_frame_uses_move_opcode() {
        let frame = Payload::Move(Move::at(1, 1)).into_frame().unwrap();
        assert_eq!(frame.opcode_enum(), Some(Opcode::Move));
        assert_eq!(&frame.payload[..], br#"{"row":2,"col":2}"#);
    }

    #[test]
    fn opcode_payload_mismatch_fails() {
        let view = ProjectedView {
            active_player: None,
            other_player: None,
            state: StateSnapshot::default(),
            your_turn: true,
        };
        let frame = Payload::State(view).into_frame().unwrap();

        let result = Payload::decode(Opcode::Move, &frame.payload);
        assert!(matches!(result, Err(ProtocolError::JsonDecode(_))));
    }

    #[test]
    fn unknown_opcode_fails() {
        let frame = Frame::from_raw(7, &b"{}"[..]);
        assert_eq!(Payload::from_frame(&frame), Err(ProtocolError::UnknownOpcode(7)));
    }

    #[test]
    fn array_bodies_rejected() {
        assert!(Payload::decode(Opcode::Move, b"[2,2]").is_err());
        assert!(Payload::decode(Opcode::Move, br#"{"row":2,"col":2}"#).is_ok());

        let state = r#"{"cells":[[-1,-1,-1],[-1,-1,-1],[-1,-1,-1]],"player_turn":1}"#;
        let player = r#"{"user_id":"a"}"#;
        for body in [
            r#"{"state":[null,1,[]],"your_turn":true}"#.to_owned(),
            format!(r#"{{"active_player":["n","s","a","u"],"state":{state}}}"#),
            r#"{"state":{"player_turn":1,"players":[["n","s","a","u"]]}}"#.to_owned(),
            format!(r#"[null,null,{state},true]"#),
        ] {
            assert!(Payload::decode(Opcode::State, body.as_bytes()).is_err(), "{body}");
        }

        let body = format!(r#"{{"active_player":{player},"other_player":null,"state":{state}}}"#);
        let Ok(Payload::State(view)) = Payload::decode(Opcode::State, body.as_bytes()) else {
            panic!("object body should decode");
        };
        assert_eq!(view.active_player.map(|p| p.user_id).as_deref(), Some("a"));
    }

    #[test]
    fn oversized_frame_rejected_before_parsing() {
        let frame = Frame::new(Opcode::Move, vec![b' '; Frame::MAX_PAYLOAD_SIZE + 1]);
        assert!(matches!(
            Payload::from_frame(&frame),
            Err(ProtocolError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn garbage_fails_without_panicking() {
        for bytes in [&b""[..], b"null", b"[]", b"{", b"\xff\xfe"] {
            assert!(Payload::decode(Opcode::State, bytes).is_err());
            assert!(Payload::decode(Opcode::Move, bytes).is_err());
        }
    }
}
