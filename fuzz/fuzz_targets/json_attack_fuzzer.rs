//! Fuzz target for hostile JSON payloads
//!
//! # Strategy
//!
//! - Deeply nested: arrays/objects nested to arbitrary depth (stack overflow)
//! - Huge numbers: coordinates and enum values far outside their range
//! - Type confusion: a view body under the move opcode and vice versa
//! - Duplicate keys: objects repeating a field name
//! - Unknown fields: extra keys next to valid ones
//!
//! # Invariants
//!
//! - Deeply nested input is rejected, not recursed into without bound
//! - Out-of-range values are rejected, never wrapped
//! - NEVER panic on malformed JSON

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use xoxo_proto::{Frame, Opcode, Payload};

#[derive(Debug, Clone, Arbitrary)]
enum JsonAttack {
    DeeplyNested { depth: u16, object: bool },
    HugeNumbers { row: i64, col: i64, cell: i64, turn: i64 },
    TypeConfusion { as_move: bool },
    DuplicateKeys { count: u8, value: i32 },
    UnknownField { name: String },
}

fn decode_all(bytes: &[u8]) {
    for opcode in [Opcode::Move, Opcode::State] {
        let _ = Payload::from_frame(&Frame::new(opcode, bytes.to_vec()));
    }
}

fuzz_target!(|attack: JsonAttack| {
    match attack {
        JsonAttack::DeeplyNested { depth, object } => {
            let depth = usize::from(depth % 4096);
            let (open, close) = if object { (r#"{"row":"#, "}") } else { ("[", "]") };
            let json = format!("{}1{}", open.repeat(depth), close.repeat(depth));
            decode_all(json.as_bytes());
        },

        JsonAttack::HugeNumbers { row, col, cell, turn } => {
            let mv = format!(r#"{{"row":{row},"col":{col}}}"#);
            if let Ok(Payload::Move(decoded)) =
                Payload::from_frame(&Frame::new(Opcode::Move, mv.into_bytes()))
            {
                assert_eq!(i64::from(decoded.row), row);
                assert_eq!(i64::from(decoded.col), col);
            }

            let view = format!(
                r#"{{"state":{{"cells":[[{cell},-1,-1],[-1,-1,-1],[-1,-1,-1]],"player_turn":{turn},"players":[]}},"your_turn":false}}"#
            );
            if let Ok(Payload::State(decoded)) =
                Payload::from_frame(&Frame::new(Opcode::State, view.into_bytes()))
            {
                assert!(matches!(cell, -1 | 1 | 2));
                assert!(matches!(turn, -1 | 1 | 2));
                assert_eq!(decoded.state.available().len(), if cell == -1 { 9 } else { 8 });
            }
        },

        JsonAttack::TypeConfusion { as_move } => {
            let (opcode, body) = if as_move {
                (Opcode::Move, r#"{"state":{},"your_turn":true}"#)
            } else {
                (Opcode::State, r#"{"row":1,"col":1}"#)
            };
            assert!(Payload::from_frame(&Frame::new(opcode, body.as_bytes().to_vec())).is_err());
        },

        JsonAttack::DuplicateKeys { count, value } => {
            let count = usize::from(count % 16).max(2);
            let fields = vec![format!(r#""row":{value}"#); count].join(",");
            let json = format!(r#"{{{fields},"col":1}}"#);
            decode_all(json.as_bytes());
        },

        JsonAttack::UnknownField { name } => {
            let Ok(key) = serde_json_string(&name) else {
                return;
            };
            let json = format!(r#"{{"row":1,"col":1,{key}:0}}"#);
            let decoded = Payload::from_frame(&Frame::new(Opcode::Move, json.into_bytes()));
            if name != "row" && name != "col" {
                assert!(decoded.is_err());
            }
        },
    }
});

/// Quote `s` as a JSON string literal.
fn serde_json_string(s: &str) -> Result<String, std::fmt::Error> {
    use std::fmt::Write;

    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c.is_control() => write!(out, "\\u{:04x}", c as u32)?,
            c => out.push(c),
        }
    }
    out.push('"');
    Ok(out)
}
