//! Block light propagation using an incremental flood-fill algorithm.

pub mod access;
mod base;
pub mod channel;
pub mod direction;
pub mod light_interface;
pub mod light_queue;
pub mod queue_entry;
mod updates;

// Re-export main types for convenience
pub use access::{ChunkLightAccess, LightChunkAccess, LightChunkGetter, MAX_RUN_RADIUS};
pub use base::LightEngine;
pub use channel::{BlockLight, LightChannel};
pub use direction::{Direction, DirectionSet};
pub use light_interface::LightInterface;
pub use light_queue::LightQueue;
pub use queue_entry::{EncodeOrigin, QueueEntry};
pub use updates::LightUpdateReport;

/// The block light engine.
pub type BlockLightEngine = LightEngine<BlockLight>;
