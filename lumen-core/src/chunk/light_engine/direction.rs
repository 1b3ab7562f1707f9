//! Axis directions for light propagation.

use bitflags::bitflags;
use lumen_utils::BlockPos;

/// Six axis directions for light propagation.
///
/// The ordinal values (0-5) are stable and index the bits of a [`DirectionSet`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Downward (-Y direction) - ordinal 0
    Down = 0,
    /// Upward (+Y direction) - ordinal 1
    Up = 1,
    /// North (-Z direction) - ordinal 2
    North = 2,
    /// South (+Z direction) - ordinal 3
    South = 3,
    /// West (-X direction) - ordinal 4
    West = 4,
    /// East (+X direction) - ordinal 5
    East = 5,
}

impl Direction {
    /// All six directions in ordinal order.
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// The four directions that cross chunk borders.
    pub const HORIZONTAL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Returns the opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Down => Self::Up,
            Self::Up => Self::Down,
            Self::North => Self::South,
            Self::South => Self::North,
            Self::West => Self::East,
            Self::East => Self::West,
        }
    }

    /// Gets the offset in the given direction.
    ///
    /// Returns (dx, dy, dz) for this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Self::Down => (0, -1, 0),
            Self::Up => (0, 1, 0),
            Self::North => (0, 0, -1),
            Self::South => (0, 0, 1),
            Self::West => (-1, 0, 0),
            Self::East => (1, 0, 0),
        }
    }

    /// Returns a new `BlockPos` relative to the given position in this direction.
    #[must_use]
    pub const fn relative(self, pos: BlockPos) -> BlockPos {
        let (dx, dy, dz) = self.offset();
        pos.offset(dx, dy, dz)
    }

    /// Looks a direction up by its ordinal.
    #[must_use]
    pub const fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Down),
            1 => Some(Self::Up),
            2 => Some(Self::North),
            3 => Some(Self::South),
            4 => Some(Self::West),
            5 => Some(Self::East),
            _ => None,
        }
    }
}

bitflags! {
    /// A set of directions, one bit per [`Direction`] ordinal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DirectionSet: u8 {
        /// -Y
        const DOWN = 1 << 0;
        /// +Y
        const UP = 1 << 1;
        /// -Z
        const NORTH = 1 << 2;
        /// +Z
        const SOUTH = 1 << 3;
        /// -X
        const WEST = 1 << 4;
        /// +X
        const EAST = 1 << 5;
    }
}

impl DirectionSet {
    /// The set holding only `dir`.
    #[must_use]
    pub const fn of(dir: Direction) -> Self {
        Self::from_bits_truncate(1 << dir as u8)
    }

    /// Every direction except `dir`.
    #[must_use]
    pub const fn everything_but(dir: Direction) -> Self {
        Self::from_bits_truncate(Self::all().bits() & !(1 << dir as u8))
    }

    /// Whether `dir` is part of the set.
    #[must_use]
    #[inline]
    pub const fn has(self, dir: Direction) -> bool {
        self.bits() & (1 << dir as u8) != 0
    }

    /// Iterates the directions of the set in ordinal order.
    pub fn directions(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |dir| self.has(*dir))
    }
}

impl From<Direction> for DirectionSet {
    fn from(dir: Direction) -> Self {
        Self::of(dir)
    }
}
