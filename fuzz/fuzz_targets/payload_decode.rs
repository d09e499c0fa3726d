//! Fuzz target for Payload::from_frame
//!
//! Feeds arbitrary bytes through every opcode, plus the raw opcode taken
//! from the first two bytes.
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an error.

#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use xoxo_proto::{Frame, Opcode, Payload};

fuzz_target!(|data: &[u8]| {
    let payload = Bytes::copy_from_slice(data);

    for opcode in [Opcode::Move, Opcode::State] {
        let frame = Frame::new(opcode, payload.clone());
        if let Ok(decoded) = Payload::from_frame(&frame) {
            // Anything that decodes must re-encode.
            assert!(decoded.encode().is_ok());
        }
    }

    if let [hi, lo, rest @ ..] = data {
        let frame = Frame::from_raw(u16::from_be_bytes([*hi, *lo]), Bytes::copy_from_slice(rest));
        let _ = Payload::from_frame(&frame);
    }
});
