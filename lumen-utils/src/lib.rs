//! # Lumen utils
//!
//! Position and vector types shared by the lumen crates.

pub mod math;
mod types;

pub use types::{BlockPos, BlockStateId, ChunkPos, SECTION_SIZE, SECTION_VOLUME, SectionPos};
