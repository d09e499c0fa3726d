//! Message opcodes.

/// Numeric tag identifying the payload carried by a [`crate::Frame`].
///
/// Values are fixed on the wire and must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    /// Client -> server move command.
    Move = 1,
    /// Server -> client projected match state.
    State = 2,
}

impl Opcode {
    /// Parse a raw opcode. `None` for values outside the protocol.
    #[must_use]
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::Move),
            2 => Some(Self::State),
            _ => None,
        }
    }

    /// Raw wire value.
    #[must_use]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcodes_are_distinct_and_stable() {
        assert_eq!(Opcode::Move.to_u16(), 1);
        assert_eq!(Opcode::State.to_u16(), 2);
        assert_eq!(Opcode::from_u16(1), Some(Opcode::Move));
        assert_eq!(Opcode::from_u16(2), Some(Opcode::State));
        assert_eq!(Opcode::from_u16(0), None);
        assert_eq!(Opcode::from_u16(3), None);
    }
}
