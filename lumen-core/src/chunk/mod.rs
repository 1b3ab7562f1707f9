//! Per-chunk light data and the light engine that maintains it.

pub mod chunk_light;
pub mod emptiness_map;
pub mod light_engine;
pub mod light_storage;
pub mod material;
