//! Spatial partitioning data structures
//!
//! Provides the dynamic bounding-volume hierarchy used by the broad phase
//! and the [`SpatialQuery`] seam the collision system talks to.

pub mod bvh;
pub mod spatial_query;

pub use bvh::{DynamicBvh, NodeId};
pub use spatial_query::{BvhSpatialQuery, SpatialQuery};
