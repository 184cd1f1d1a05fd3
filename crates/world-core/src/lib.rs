//! World Visualization Core
//!
//! This crate contains the data side of the world visualization host:
//! - import: SDF world loading into a [`WorldDescriptor`]
//! - search_path: `model://` resolution roots
//! - world: loaded world and model entries
//! - types: pose, joint and rigid body samples

pub mod import;
pub mod search_path;
pub mod types;
pub mod world;

pub use import::*;
pub use search_path::*;
pub use types::*;
pub use world::*;
