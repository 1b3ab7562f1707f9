//! Block storage for one 16×16×16 section.

use lumen_utils::{BlockStateId, SECTION_VOLUME};

/// The block ids of a section.
///
/// A section filled with a single block stores just that id; the first differing write
/// expands it into a full array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockSection {
    /// Every voxel holds the same block.
    Homogeneous(BlockStateId),
    /// One id per voxel, indexed `y * 256 + z * 16 + x`.
    Heterogeneous(Box<[BlockStateId; SECTION_VOLUME]>),
}

impl BlockSection {
    /// A section of air.
    pub const EMPTY: Self = Self::Homogeneous(BlockStateId(0));

    /// The block at a section index.
    #[must_use]
    #[inline]
    pub fn get(&self, index: usize) -> BlockStateId {
        match self {
            Self::Homogeneous(id) => *id,
            Self::Heterogeneous(blocks) => blocks[index],
        }
    }

    /// Sets the block at a section index and returns the previous one.
    ///
    /// Collapses back to [`BlockSection::Homogeneous`] once every voxel holds the same id.
    pub fn set(&mut self, index: usize, id: BlockStateId) -> BlockStateId {
        match self {
            Self::Homogeneous(current) => {
                let old = *current;
                if old != id {
                    let mut blocks = Box::new([old; SECTION_VOLUME]);
                    blocks[index] = id;
                    *self = Self::Heterogeneous(blocks);
                }
                old
            }
            Self::Heterogeneous(blocks) => {
                let old = std::mem::replace(&mut blocks[index], id);
                if old != id && blocks.iter().all(|block| *block == id) {
                    *self = Self::Homogeneous(id);
                }
                old
            }
        }
    }

    /// Number of voxels that are not air.
    #[must_use]
    pub fn non_empty_block_count(&self) -> usize {
        match self {
            Self::Homogeneous(id) if id.0 == 0 => 0,
            Self::Homogeneous(_) => SECTION_VOLUME,
            Self::Heterogeneous(blocks) => blocks.iter().filter(|block| block.0 != 0).count(),
        }
    }

    /// Whether the section holds only air.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Homogeneous(id) => id.0 == 0,
            Self::Heterogeneous(blocks) => blocks.iter().all(|block| block.0 == 0),
        }
    }

    /// Section indices of every voxel whose block matches `predicate`.
    pub fn positions_matching<'a>(
        &'a self,
        mut predicate: impl FnMut(BlockStateId) -> bool + 'a,
    ) -> Box<dyn Iterator<Item = usize> + 'a> {
        match self {
            Self::Homogeneous(id) => {
                if predicate(*id) {
                    Box::new(0..SECTION_VOLUME)
                } else {
                    Box::new(std::iter::empty())
                }
            }
            Self::Heterogeneous(blocks) => Box::new(
                blocks
                    .iter()
                    .enumerate()
                    .filter(move |(_, block)| predicate(**block))
                    .map(|(index, _)| index),
            ),
        }
    }
}

impl Default for BlockSection {
    fn default() -> Self {
        Self::EMPTY
    }
}
