// Position categories and position-indexed maps.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Squad position category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    Keeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    /// All positions in display order.
    pub const ALL: [Position; 4] = [
        Position::Keeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Parse a position string.
    ///
    /// Accepts the short codes ("GKP", "GK", "DEF", "MID", "FWD"), the long
    /// names, and the numeric FPL element type ("1".."4").
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "1" | "GK" | "GKP" | "KEEPER" | "GOALKEEPER" => Some(Position::Keeper),
            "2" | "DEF" | "DEFENDER" => Some(Position::Defender),
            "3" | "MID" | "MIDFIELDER" => Some(Position::Midfielder),
            "4" | "FWD" | "FW" | "FORWARD" => Some(Position::Forward),
            _ => None,
        }
    }

    /// Map an FPL `element_type` id to a position.
    pub fn from_element_type(id: u8) -> Option<Self> {
        match id {
            1 => Some(Position::Keeper),
            2 => Some(Position::Defender),
            3 => Some(Position::Midfielder),
            4 => Some(Position::Forward),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Keeper => "GKP",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }

    /// Deterministic ordering index, used for dense per-position arrays.
    pub fn index(&self) -> usize {
        match self {
            Position::Keeper => 0,
            Position::Defender => 1,
            Position::Midfielder => 2,
            Position::Forward => 3,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// PositionMap
// ---------------------------------------------------------------------------

/// One value per position. Deserializes from a table with `keeper`,
/// `defender`, `midfielder` and `forward` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PositionMap<T> {
    pub keeper: T,
    pub defender: T,
    pub midfielder: T,
    pub forward: T,
}

impl<T> PositionMap<T> {
    pub fn new(keeper: T, defender: T, midfielder: T, forward: T) -> Self {
        Self {
            keeper,
            defender,
            midfielder,
            forward,
        }
    }

    pub fn get(&self, pos: Position) -> &T {
        match pos {
            Position::Keeper => &self.keeper,
            Position::Defender => &self.defender,
            Position::Midfielder => &self.midfielder,
            Position::Forward => &self.forward,
        }
    }

    pub fn get_mut(&mut self, pos: Position) -> &mut T {
        match pos {
            Position::Keeper => &mut self.keeper,
            Position::Defender => &mut self.defender,
            Position::Midfielder => &mut self.midfielder,
            Position::Forward => &mut self.forward,
        }
    }

    /// Iterate `(position, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &T)> {
        Position::ALL.into_iter().map(move |p| (p, self.get(p)))
    }
}

impl PositionMap<usize> {
    /// Count positions from an iterator (e.g. over a squad).
    pub fn count<I: IntoIterator<Item = Position>>(positions: I) -> Self {
        let mut counts = PositionMap::default();
        for pos in positions {
            *counts.get_mut(pos) += 1;
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.keeper + self.defender + self.midfielder + self.forward
    }
}
