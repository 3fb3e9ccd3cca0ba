use std::fmt;

use serde::{Deserialize, Serialize};

/// A compass or vertical direction an exit can lead in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// North.
    North,
    /// East.
    East,
    /// South.
    South,
    /// West.
    West,
    /// Up.
    Up,
    /// Down.
    Down,
    /// Northeast.
    Northeast,
    /// Northwest.
    Northwest,
    /// Southeast.
    Southeast,
    /// Southwest.
    Southwest,
}

impl Direction {
    /// Every direction, in display order.
    pub const ALL: [Direction; 10] = [
        Self::North,
        Self::East,
        Self::South,
        Self::West,
        Self::Up,
        Self::Down,
        Self::Northeast,
        Self::Northwest,
        Self::Southeast,
        Self::Southwest,
    ];

    /// Parse a direction from a full name or customary abbreviation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "n" | "north" => Some(Self::North),
            "s" | "south" => Some(Self::South),
            "e" | "east" => Some(Self::East),
            "w" | "west" => Some(Self::West),
            "u" | "up" => Some(Self::Up),
            "d" | "down" => Some(Self::Down),
            "ne" | "northeast" => Some(Self::Northeast),
            "nw" | "northwest" => Some(Self::Northwest),
            "se" | "southeast" => Some(Self::Southeast),
            "sw" | "southwest" => Some(Self::Southwest),
            _ => None,
        }
    }

    /// The direction leading back the way this one came.
    pub fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Northeast => Self::Southwest,
            Self::Southwest => Self::Northeast,
            Self::Northwest => Self::Southeast,
            Self::Southeast => Self::Northwest,
        }
    }

    /// Get the display name for this direction.
    pub fn name(&self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
            Self::Up => "up",
            Self::Down => "down",
            Self::Northeast => "northeast",
            Self::Northwest => "northwest",
            Self::Southeast => "southeast",
            Self::Southwest => "southwest",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
