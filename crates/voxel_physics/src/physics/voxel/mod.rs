//! Voxel world contract and the dense reference grid

pub mod grid;
pub mod world;

pub use grid::VoxelGrid;
pub use world::{GridInfo, SlideResult, SweepHit, VoxelRayHit, VoxelWorld};
