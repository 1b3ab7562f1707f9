//! `QueueEntry` bit-packing system for light propagation.
//!
//! A `QueueEntry` packs a voxel position, a light level, the directions to propagate
//! along and two flags into a single u64. Positions are stored relative to an
//! [`EncodeOrigin`] chosen once per propagation run, which keeps the entry a single
//! machine word while still covering every chunk a run can reach.

use lumen_utils::{BlockPos, ChunkPos, SECTION_SIZE};

use super::direction::{Direction, DirectionSet};

/// The block that queue coordinates of one propagation run are stored relative to.
///
/// The window spans 4096 blocks on x and z, centred on the chunk the run is centred on,
/// and 65536 blocks upwards from the bottom of the lowest light section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOrigin {
    x: i32,
    y: i32,
    z: i32,
}

impl EncodeOrigin {
    /// Width of the horizontal window in blocks.
    pub const HORIZONTAL_SPAN: i32 = 1 << 12;
    /// Height of the vertical window in blocks.
    pub const VERTICAL_SPAN: i32 = 1 << 16;

    /// Builds the origin for a run centred on `chunk`.
    #[must_use]
    pub const fn around(chunk: ChunkPos, min_light_section: i32) -> Self {
        let half = Self::HORIZONTAL_SPAN / 2;
        Self {
            x: chunk.min_block_x() + 8 - half,
            y: min_light_section * SECTION_SIZE,
            z: chunk.min_block_z() + 8 - half,
        }
    }

    /// Whether `pos` can be encoded relative to this origin.
    #[must_use]
    #[inline]
    pub const fn contains(self, pos: BlockPos) -> bool {
        let dx = pos.x() - self.x;
        let dy = pos.y() - self.y;
        let dz = pos.z() - self.z;
        dx >= 0
            && dx < Self::HORIZONTAL_SPAN
            && dz >= 0
            && dz < Self::HORIZONTAL_SPAN
            && dy >= 0
            && dy < Self::VERTICAL_SPAN
    }

    /// Packs `pos` into the low 40 bits of an entry.
    #[must_use]
    #[inline]
    pub fn encode(self, pos: BlockPos) -> u64 {
        debug_assert!(self.contains(pos), "{pos} is outside the encode window");
        let dx = (pos.x() - self.x) as u64;
        let dz = (pos.z() - self.z) as u64;
        let dy = (pos.y() - self.y) as u64;
        (dx & QueueEntry::X_MASK)
            | (dz & QueueEntry::X_MASK) << QueueEntry::Z_SHIFT
            | (dy & QueueEntry::Y_MASK) << QueueEntry::Y_SHIFT
    }

    /// Unpacks the position stored in the low 40 bits of `bits`.
    #[must_use]
    #[inline]
    pub fn decode(self, bits: u64) -> BlockPos {
        let dx = (bits & QueueEntry::X_MASK) as i32;
        let dz = ((bits >> QueueEntry::Z_SHIFT) & QueueEntry::X_MASK) as i32;
        let dy = ((bits >> QueueEntry::Y_SHIFT) & QueueEntry::Y_MASK) as i32;
        BlockPos::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

/// A queue entry that encodes light propagation information in a bit-packed u64.
///
/// Bit layout:
/// ```text
/// Bit Position:  63  62  61..50  49......44  43..40  39.....24  23.....12  11......0
///                | S | R |  --  | D D D D D D | L L L L | Y (16)  | Z (12)  | X (12)  |
///                  |   |          |             |         +-----------+-----------+-> Position relative to the origin
///                  |   |          |             +---------------------------------> Light Level (4 bits)
///                  |   |          +-----------------------------------------------> Direction Flags (6 bits)
///                  |   +----------------------------------------------------------> Recheck Level Flag
///                  +--------------------------------------------------------------> Sided Transparent Flag
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct QueueEntry(u64);

impl QueueEntry {
    const X_MASK: u64 = 0xFFF;
    const Y_MASK: u64 = 0xFFFF;
    const Z_SHIFT: u32 = 12;
    const Y_SHIFT: u32 = 24;
    const POSITION_MASK: u64 = (1 << 40) - 1;

    const LEVEL_SHIFT: u32 = 40;
    const LEVEL_MASK: u64 = 0x0F;

    const DIRECTIONS_SHIFT: u32 = 44;
    const DIRECTIONS_MASK: u64 = 0x3F;

    /// The entry only applies while the voxel still holds exactly the recorded level.
    const RECHECK_LEVEL_FLAG: u64 = 1 << 62;

    /// The voxel's own block is conditionally opaque; its faces must be tested.
    const SIDED_TRANSPARENT_FLAG: u64 = 1 << 63;

    #[inline]
    fn pack(
        origin: EncodeOrigin,
        pos: BlockPos,
        level: u8,
        directions: DirectionSet,
        flags: u64,
    ) -> Self {
        debug_assert!(level <= 15, "Light level must be 0-15");
        Self(
            origin.encode(pos)
                | (u64::from(level) & Self::LEVEL_MASK) << Self::LEVEL_SHIFT
                | u64::from(directions.bits()) << Self::DIRECTIONS_SHIFT
                | flags,
        )
    }

    const fn sided(sided: bool) -> u64 {
        if sided { Self::SIDED_TRANSPARENT_FLAG } else { 0 }
    }

    /// Creates an entry flooding a light source's own level in every direction.
    #[must_use]
    pub fn increase_from_emission(
        origin: EncodeOrigin,
        pos: BlockPos,
        level: u8,
        sided: bool,
    ) -> Self {
        Self::pack(origin, pos, level, DirectionSet::all(), Self::sided(sided))
    }

    /// Creates an increase entry for every direction except the one leading back.
    #[must_use]
    pub fn increase_skip_one_direction(
        origin: EncodeOrigin,
        pos: BlockPos,
        level: u8,
        sided: bool,
        skip_dir: Direction,
    ) -> Self {
        Self::pack(
            origin,
            pos,
            level,
            DirectionSet::everything_but(skip_dir),
            Self::sided(sided),
        )
    }

    /// Creates an increase entry propagating in a single direction.
    #[must_use]
    pub fn increase_only_one_direction(
        origin: EncodeOrigin,
        pos: BlockPos,
        level: u8,
        sided: bool,
        dir: Direction,
    ) -> Self {
        Self::pack(origin, pos, level, DirectionSet::of(dir), Self::sided(sided))
    }

    /// Creates an increase entry that re-propagates a voxel's current level, dropped if
    /// the level changed before the entry is processed.
    #[must_use]
    pub fn recheck_all_directions(
        origin: EncodeOrigin,
        pos: BlockPos,
        level: u8,
        sided: bool,
    ) -> Self {
        Self::pack(
            origin,
            pos,
            level,
            DirectionSet::all(),
            Self::RECHECK_LEVEL_FLAG | Self::sided(sided),
        )
    }

    /// Creates an entry for decreasing light in all directions.
    #[must_use]
    pub fn decrease_all_directions(origin: EncodeOrigin, pos: BlockPos, level: u8) -> Self {
        Self::pack(origin, pos, level, DirectionSet::all(), 0)
    }

    /// Creates an entry for decreasing light in all directions except one.
    #[must_use]
    pub fn decrease_skip_one_direction(
        origin: EncodeOrigin,
        pos: BlockPos,
        level: u8,
        sided: bool,
        skip_dir: Direction,
    ) -> Self {
        Self::pack(
            origin,
            pos,
            level,
            DirectionSet::everything_but(skip_dir),
            Self::sided(sided),
        )
    }

    /// Decodes the voxel position of this entry.
    #[must_use]
    #[inline]
    pub fn pos(self, origin: EncodeOrigin) -> BlockPos {
        origin.decode(self.0 & Self::POSITION_MASK)
    }

    /// Gets the light level from this queue entry (0-15).
    #[must_use]
    #[inline]
    pub const fn level(self) -> u8 {
        ((self.0 >> Self::LEVEL_SHIFT) & Self::LEVEL_MASK) as u8
    }

    /// The directions this entry propagates along.
    #[must_use]
    #[inline]
    pub const fn directions(self) -> DirectionSet {
        DirectionSet::from_bits_truncate(
            ((self.0 >> Self::DIRECTIONS_SHIFT) & Self::DIRECTIONS_MASK) as u8,
        )
    }

    /// Checks if light should propagate in the given direction.
    #[must_use]
    #[inline]
    pub const fn should_propagate(self, dir: Direction) -> bool {
        self.directions().has(dir)
    }

    /// Whether the entry is dropped unless the voxel still holds [`Self::level`].
    #[must_use]
    #[inline]
    pub const fn is_recheck(self) -> bool {
        self.0 & Self::RECHECK_LEVEL_FLAG != 0
    }

    /// Whether the voxel's own faces must be tested before propagating out of it.
    #[must_use]
    #[inline]
    pub const fn is_sided(self) -> bool {
        self.0 & Self::SIDED_TRANSPARENT_FLAG != 0
    }

    /// The raw packed value.
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }
}
