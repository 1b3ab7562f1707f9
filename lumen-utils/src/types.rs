// Wrapper types making it harder to accidentally use the wrong underlying type.

use std::fmt::{self, Display};

use crate::math::{Vector2, Vector3};

/// Edge length of a section (and width of a chunk) in blocks.
pub const SECTION_SIZE: i32 = 16;

/// Number of voxels in one section.
pub const SECTION_VOLUME: usize = 16 * 16 * 16;

/// A raw block state id. Using a block registry this id resolves to the block's material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockStateId(pub u16);

/// A chunk position. The vector's `y` component holds the chunk's z coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChunkPos(pub Vector2<i32>);

impl ChunkPos {
    /// Creates a chunk position from chunk coordinates.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self(Vector2::new(x, z))
    }

    /// The chunk x coordinate.
    #[must_use]
    pub const fn x(self) -> i32 {
        self.0.x
    }

    /// The chunk z coordinate.
    #[must_use]
    pub const fn z(self) -> i32 {
        self.0.y
    }

    /// The smallest block x coordinate inside this chunk.
    #[must_use]
    pub const fn min_block_x(self) -> i32 {
        self.0.x << 4
    }

    /// The smallest block z coordinate inside this chunk.
    #[must_use]
    pub const fn min_block_z(self) -> i32 {
        self.0.y << 4
    }

    /// Returns the chunk offset by the given amount of chunks.
    #[must_use]
    pub const fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.0.x + dx, self.0.y + dz)
    }

    /// Chebyshev distance in chunks.
    #[must_use]
    pub const fn chessboard_distance(self, other: Self) -> i32 {
        let dx = (self.0.x - other.0.x).abs();
        let dz = (self.0.y - other.0.y).abs();
        if dx > dz { dx } else { dz }
    }
}

impl Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.0.x, self.0.y)
    }
}

/// A block position in world space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockPos(pub Vector3<i32>);

impl BlockPos {
    /// Creates a block position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// The x coordinate.
    #[must_use]
    pub const fn x(self) -> i32 {
        self.0.x
    }

    /// The y coordinate.
    #[must_use]
    pub const fn y(self) -> i32 {
        self.0.y
    }

    /// The z coordinate.
    #[must_use]
    pub const fn z(self) -> i32 {
        self.0.z
    }

    /// Returns the position offset by the given amounts.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.0.x + dx, self.0.y + dy, self.0.z + dz)
    }

    /// The chunk containing this block.
    #[must_use]
    pub const fn chunk_pos(self) -> ChunkPos {
        ChunkPos::new(self.0.x >> 4, self.0.z >> 4)
    }

    /// The section containing this block.
    #[must_use]
    pub const fn section_pos(self) -> SectionPos {
        SectionPos::new(self.0.x >> 4, self.0.y >> 4, self.0.z >> 4)
    }

    /// Index of this block inside its section, laid out as `y * 256 + z * 16 + x`.
    #[must_use]
    pub const fn section_index(self) -> usize {
        ((self.0.y & 15) << 8 | (self.0.z & 15) << 4 | (self.0.x & 15)) as usize
    }
}

impl Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0.x, self.0.y, self.0.z)
    }
}

/// A section position: chunk x, section y, chunk z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SectionPos(pub Vector3<i32>);

impl SectionPos {
    /// Creates a section position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// Creates the section position at height `section_y` of a chunk.
    #[must_use]
    pub const fn of(chunk: ChunkPos, section_y: i32) -> Self {
        Self::new(chunk.x(), section_y, chunk.z())
    }

    /// The section x coordinate (chunk x).
    #[must_use]
    pub const fn x(self) -> i32 {
        self.0.x
    }

    /// The section y coordinate.
    #[must_use]
    pub const fn y(self) -> i32 {
        self.0.y
    }

    /// The section z coordinate (chunk z).
    #[must_use]
    pub const fn z(self) -> i32 {
        self.0.z
    }

    /// The chunk this section belongs to.
    #[must_use]
    pub const fn chunk(self) -> ChunkPos {
        ChunkPos::new(self.0.x, self.0.z)
    }

    /// The block with the smallest coordinates in this section.
    #[must_use]
    pub const fn origin(self) -> BlockPos {
        BlockPos::new(self.0.x << 4, self.0.y << 4, self.0.z << 4)
    }

    /// Returns the section offset by the given amounts.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.0.x + dx, self.0.y + dy, self.0.z + dz)
    }
}

impl Display for SectionPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.0.x, self.0.y, self.0.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_block_to_chunk() {
        let pos = BlockPos::new(-1, -1, -17);
        assert_eq!(pos.chunk_pos(), ChunkPos::new(-1, -2));
        assert_eq!(pos.section_pos(), SectionPos::new(-1, -1, -2));
    }

    #[test]
    fn test_section_index_layout() {
        assert_eq!(BlockPos::new(0, 0, 0).section_index(), 0);
        assert_eq!(BlockPos::new(1, 0, 0).section_index(), 1);
        assert_eq!(BlockPos::new(0, 0, 1).section_index(), 16);
        assert_eq!(BlockPos::new(0, 1, 0).section_index(), 256);
        assert_eq!(BlockPos::new(-1, -1, -1).section_index(), 4095);
    }

    #[test]
    fn test_section_origin_roundtrip() {
        let section = SectionPos::new(-3, 2, 7);
        assert_eq!(section.origin().section_pos(), section);
        assert_eq!(section.chunk(), ChunkPos::new(-3, 7));
    }

    #[test]
    fn test_chessboard_distance() {
        assert_eq!(ChunkPos::new(0, 0).chessboard_distance(ChunkPos::new(-2, 1)), 2);
    }
}
