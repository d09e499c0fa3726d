//! Wire protocol for xoxo matches.
//!
//! Everything that crosses the network lives here: the opcode table, the
//! [`Frame`] envelope (opcode + raw payload bytes) and the JSON payloads
//! carried inside it.
//!
//! # Components
//!
//! - [`Opcode`]: numeric message tag, shared by server and client
//! - [`Frame`]: transport envelope, routable without touching the payload
//! - [`Payload`]: typed view of a frame's bytes (`Move` or `State`)
//! - [`payloads::game`]: `Move`, `Player`, `StateSnapshot`, `ProjectedView`
//!
//! Decoding is strict: unknown fields are a decode error, as are out-of-range
//! cell or turn values.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
mod frame;
mod opcode;
pub mod payloads;

pub use errors::{ProtocolError, Result};
pub use frame::Frame;
pub use opcode::Opcode;
pub use payloads::{
    Payload,
    game::{
        BOARD_SIZE, Cell, Cells, Move, Player, ProjectedView, Seat, StateSnapshot, Turn,
        empty_cells,
    },
};
