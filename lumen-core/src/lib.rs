//! # Lumen core
//!
//! Incremental block light for a chunked voxel world.
//!
//! The engine keeps one 4-bit light level per voxel and updates it with a breadth-first
//! flood fill whenever a block changes, a chunk becomes available, or a section's geometry
//! flips between empty and non-empty. Light arrays are published per section so reader
//! threads always observe the state before or after a propagation run, never a mix.

pub mod chunk;
pub mod world;

pub use chunk::light_engine::{BlockLight, BlockLightEngine, LightInterface, LightUpdateReport};
pub use world::VoxelWorld;
