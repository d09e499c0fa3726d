//! Match payload types.
//!
//! Field names follow the JSON wire format used by every xoxo peer:
//! `cells`, `player_turn`, `players`, `winner`, `draw`, `rematch_countdown`
//! for the board state, `active_player`, `other_player`, `state`, `your_turn`
//! for the projected view, and `row`, `col` for moves.
//!
//! Empty cells are `-1` and a finished game has `player_turn == -1`.

use std::{fmt, marker::PhantomData};

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{MapAccess, Visitor, value::MapAccessDeserializer},
};

/// Board edge length.
pub const BOARD_SIZE: usize = 3;

/// 3x3 grid, indexed `[row][col]`.
pub type Cells = [[Cell; BOARD_SIZE]; BOARD_SIZE];

/// Player slot. The first player admitted to a match is [`Seat::One`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Seat {
    /// First-joined player, plays `O`.
    One,
    /// Second-joined player, plays `X`.
    Two,
}

impl Seat {
    /// 1-based player number as used on the wire.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// 0-based roster index.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    /// Seat for a 0-based roster index. `None` past the second slot.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::One),
            1 => Some(Self::Two),
            _ => None,
        }
    }

    /// The opposing seat.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    /// Board mark used when rendering.
    #[must_use]
    pub const fn mark(self) -> char {
        match self {
            Self::One => 'O',
            Self::Two => 'X',
        }
    }
}

impl TryFrom<u8> for Seat {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(format!("invalid player number {other}")),
        }
    }
}

impl From<Seat> for u8 {
    fn from(seat: Seat) -> Self {
        seat.number()
    }
}

/// Board cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Cell {
    /// Unclaimed.
    #[default]
    Empty,
    /// Claimed by a player.
    Taken(Seat),
}

impl Cell {
    /// Whether the cell is unclaimed.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Rendering mark: `O`, `X` or `.`.
    #[must_use]
    pub const fn mark(self) -> char {
        match self {
            Self::Empty => '.',
            Self::Taken(seat) => seat.mark(),
        }
    }
}

impl TryFrom<i8> for Cell {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Empty),
            1 => Ok(Self::Taken(Seat::One)),
            2 => Ok(Self::Taken(Seat::Two)),
            other => Err(format!("invalid cell value {other}")),
        }
    }
}

impl From<Cell> for i8 {
    fn from(cell: Cell) -> Self {
        match cell {
            Cell::Empty => -1,
            Cell::Taken(seat) => seat.number() as i8,
        }
    }
}

/// Whose move it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Turn {
    /// Waiting on this seat.
    Seat(Seat),
    /// Game over (win or draw); no seat may move.
    Terminal,
}

impl Turn {
    /// Seat to move, if the game is still running.
    #[must_use]
    pub const fn seat(self) -> Option<Seat> {
        match self {
            Self::Seat(seat) => Some(seat),
            Self::Terminal => None,
        }
    }

    /// Wire representation: `1`, `2`, or `-1` when terminal.
    #[must_use]
    pub const fn number(self) -> i8 {
        match self {
            Self::Seat(seat) => seat.number() as i8,
            Self::Terminal => -1,
        }
    }
}

impl Default for Turn {
    fn default() -> Self {
        Self::Seat(Seat::One)
    }
}

impl TryFrom<i8> for Turn {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Terminal),
            1 => Ok(Self::Seat(Seat::One)),
            2 => Ok(Self::Seat(Seat::Two)),
            other => Err(format!("invalid player turn {other}")),
        }
    }
}

impl From<Turn> for i8 {
    fn from(turn: Turn) -> Self {
        turn.number()
    }
}

/// Player identity as seen by peers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Player {
    /// Server node hosting the player's session.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub node: String,
    /// Routing/session identifier.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub session_id: String,
    /// Stable user identifier. Unique within a match.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
}

impl Player {
    /// Create a player identity.
    pub fn new(
        node: impl Into<String>,
        session_id: impl Into<String>,
        user_id: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            node: node.into(),
            session_id: session_id.into(),
            user_id: user_id.into(),
            username: username.into(),
        }
    }
}

/// Move command. Coordinates are 1-based on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Move {
    /// 1-based row.
    #[serde(default)]
    pub row: i32,
    /// 1-based column.
    #[serde(default)]
    pub col: i32,
}

impl Move {
    /// Build a move from 0-based board coordinates.
    #[must_use]
    pub const fn at(row: usize, col: usize) -> Self {
        Self { row: row as i32 + 1, col: col as i32 + 1 }
    }

    /// 0-based `(row, col)`. `None` if either coordinate is off the board.
    #[must_use]
    pub fn zero_based(&self) -> Option<(usize, usize)> {
        let row = usize::try_from(self.row.checked_sub(1)?).ok()?;
        let col = usize::try_from(self.col.checked_sub(1)?).ok()?;
        (row < BOARD_SIZE && col < BOARD_SIZE).then_some((row, col))
    }
}

/// Authoritative board state as broadcast by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateSnapshot {
    /// Board cells.
    #[serde(default = "empty_cells")]
    pub cells: Cells,
    /// Seat to move, or terminal.
    pub player_turn: Turn,
    /// Roster in join order.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub players: Vec<Player>,
    /// Winning seat, if any.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "winner")]
    pub winner: Option<Seat>,
    /// Board is full with no winner.
    #[serde(default, skip_serializing_if = "is_false")]
    pub draw: bool,
    /// Ticks until the board resets for a rematch.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rematch_countdown: u32,
}

impl Default for StateSnapshot {
    fn default() -> Self {
        Self {
            cells: empty_cells(),
            player_turn: Turn::default(),
            players: Vec::new(),
            winner: None,
            draw: false,
            rematch_countdown: 0,
        }
    }
}

impl StateSnapshot {
    /// Game has a winner or is drawn.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.winner.is_some() || self.draw
    }

    /// Empty cells as 0-based `(row, col)`, in row-major order.
    #[must_use]
    pub fn available(&self) -> Vec<(usize, usize)> {
        (0..BOARD_SIZE * BOARD_SIZE)
            .map(|i| (i / BOARD_SIZE, i % BOARD_SIZE))
            .filter(|&(row, col)| self.cells[row][col].is_empty())
            .collect()
    }

    /// Roster entry for a seat.
    #[must_use]
    pub fn player(&self, seat: Seat) -> Option<&Player> {
        self.players.get(seat.index())
    }
}

/// Per-recipient view of a match.
///
/// `active_player`, `other_player` and `state` are identical for both
/// recipients of one broadcast; only `your_turn` differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectedView {
    /// Player whose turn it is (player one once the game is over).
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "object_or_null")]
    pub active_player: Option<Player>,
    /// The opponent of `active_player`.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "object_or_null")]
    pub other_player: Option<Player>,
    /// Board state.
    #[serde(deserialize_with = "object")]
    pub state: StateSnapshot,
    /// Whether the recipient is the player to move.
    #[serde(default)]
    pub your_turn: bool,
}

/// All cells empty.
#[must_use]
pub fn empty_cells() -> Cells {
    [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE]
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &u32) -> bool {
    *value == 0
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Player>, D::Error>
where
    D: Deserializer<'de>,
{
    let players = Option::<Vec<Object<Player>>>::deserialize(deserializer)?;
    Ok(players.unwrap_or_default().into_iter().map(|Object(player)| player).collect())
}

/// Decode a JSON object from `bytes`, rejecting any other top-level shape.
///
/// # Errors
///
/// Malformed JSON, trailing data, or a value that is not an object.
pub(crate) fn from_object_slice<'de, T>(bytes: &'de [u8]) -> serde_json::Result<T>
where
    T: Deserialize<'de>,
{
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let Object(value) = Object::deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(value)
}

fn object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Object::deserialize(deserializer).map(|Object(value)| value)
}

fn object_or_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Object<T>>::deserialize(deserializer)?.map(|Object(value)| value))
}

/// Struct that only decodes from a map.
///
/// Derived struct impls also accept sequences (`[2,2]` as a [`Move`]); the
/// wire format names every field.
struct Object<T>(T);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Object<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ObjectVisitor(PhantomData)).map(Object)
    }
}

struct ObjectVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for ObjectVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<T, A::Error> {
        T::deserialize(MapAccessDeserializer::new(map))
    }
}

/// `winner` accepts `1`/`2` or a falsy sentinel (`false`, `0`, `null`).
mod winner {
    use std::fmt;

    use serde::{
        Deserializer, Serializer,
        de::{self, Unexpected, Visitor},
    };

    use super::Seat;

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(winner: &Option<Seat>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match winner {
            Some(seat) => serializer.serialize_u8(seat.number()),
            None => serializer.serialize_bool(false),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Seat>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(WinnerVisitor)
    }

    struct WinnerVisitor;

    impl<'de> Visitor<'de> for WinnerVisitor {
        type Value = Option<Seat>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("1, 2, or a falsy value")
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
            if value {
                return Err(E::invalid_value(Unexpected::Bool(value), &self));
            }
            Ok(None)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            match value {
                0 => Ok(None),
                1 => Ok(Some(Seat::One)),
                2 => Ok(Some(Seat::Two)),
                _ => Err(E::invalid_value(Unexpected::Unsigned(value), &self)),
            }
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            match u64::try_from(value) {
                Ok(value) => self.visit_u64(value),
                Err(_) => Err(E::invalid_value(Unexpected::Signed(value), &self)),
            }
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }
}
