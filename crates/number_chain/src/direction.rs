use bevy::prelude::*;
use strum::{EnumIter, IntoEnumIterator};

/// One of the eight unit offsets around a cell.
///
/// Offsets are `(column, row)` pairs and rows grow downward, so `South` is `(0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Direction {
    NorthWest,
    North,
    NorthEast,
    West,
    East,
    SouthWest,
    South,
    SouthEast,
}

impl Direction {
    /// The direction gravity pulls values toward.
    pub const DOWN: Self = Self::South;

    pub const fn offset(self) -> IVec2 {
        match self {
            Self::NorthWest => IVec2::new(-1, -1),
            Self::North => IVec2::new(0, -1),
            Self::NorthEast => IVec2::new(1, -1),
            Self::West => IVec2::new(-1, 0),
            Self::East => IVec2::new(1, 0),
            Self::SouthWest => IVec2::new(-1, 1),
            Self::South => IVec2::new(0, 1),
            Self::SouthEast => IVec2::new(1, 1),
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Self::NorthWest => Self::SouthEast,
            Self::North => Self::South,
            Self::NorthEast => Self::SouthWest,
            Self::West => Self::East,
            Self::East => Self::West,
            Self::SouthWest => Self::NorthEast,
            Self::South => Self::North,
            Self::SouthEast => Self::NorthWest,
        }
    }

    pub fn from_offset(offset: IVec2) -> Option<Self> {
        Self::iter().find(|direction| direction.offset() == offset)
    }

    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }
}
