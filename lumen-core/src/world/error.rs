//! Errors of the reference world.

use lumen_utils::{BlockPos, BlockStateId, ChunkPos};

/// Ways a [`VoxelWorld`](super::VoxelWorld) operation can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The chunk holding the position is not loaded.
    #[error("chunk {0} is not loaded")]
    ChunkNotLoaded(ChunkPos),
    /// The position lies above or below the world's sections.
    #[error("{pos} is outside the world's sections {min_section}..={max_section}")]
    OutOfWorld {
        /// The rejected position.
        pos: BlockPos,
        /// Lowest world section.
        min_section: i32,
        /// Highest world section.
        max_section: i32,
    },
    /// The id is not registered.
    #[error("unknown block state id {}", .0.0)]
    UnknownBlock(BlockStateId),
}
