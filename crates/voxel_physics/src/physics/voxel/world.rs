//! Query contract of the voxel world
//!
//! The movement resolver only needs these queries; any solid/empty grid can
//! back them. Overlap is strict: a box resting exactly on a voxel face does
//! not overlap that voxel.

use crate::foundation::math::{IVec3, Vec3};
use crate::physics::collision::AABB;

/// First contact of a swept box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    /// Fraction of the displacement travelled before contact, in `[0, 1]`
    pub time: f32,
    /// Unit normal of the surface that was hit
    pub normal: Vec3,
    /// Voxel that was hit
    pub voxel: IVec3,
}

/// Outcome of a slide-move query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideResult {
    /// Displacement actually achieved
    pub displacement: Vec3,
    /// Normal of the last surface slid along, if any
    pub normal: Option<Vec3>,
}

impl SlideResult {
    /// Part of `requested` that could not be travelled
    pub fn blocked(&self, requested: Vec3) -> Vec3 {
        requested - self.displacement
    }
}

/// Nearest voxel hit by a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelRayHit {
    /// Point where the ray enters the voxel
    pub position: Vec3,
    /// Face normal at the entry point (zero when the ray starts inside)
    pub normal: Vec3,
    /// Coordinate of the voxel
    pub voxel: IVec3,
    /// Distance along the ray
    pub distance: f32,
}

/// Placement and resolution of a voxel grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridInfo {
    /// World position of the minimum corner of voxel (0, 0, 0)
    pub origin: Vec3,
    /// Number of voxels per axis
    pub dimensions: IVec3,
    /// Edge length of one voxel
    pub voxel_size: f32,
}

impl GridInfo {
    /// World-space box covered by the grid
    pub fn bounds(&self) -> AABB {
        let extent = Vec3::new(
            self.dimensions.x as f32,
            self.dimensions.y as f32,
            self.dimensions.z as f32,
        ) * self.voxel_size;
        AABB::new(self.origin, self.origin + extent)
    }
}

/// Solid/empty voxel world queried by the movement resolver
pub trait VoxelWorld {
    /// Whether `aabb` overlaps any solid voxel
    fn overlaps_aabb(&self, aabb: &AABB) -> bool;

    /// Sweep `aabb` along `displacement` and report the first contact
    fn sweep_aabb(&self, aabb: &AABB, displacement: Vec3) -> Option<SweepHit>;

    /// Move `aabb` along `displacement`, sliding along at most
    /// `max_iterations` blocking surfaces
    fn slide_move(&self, aabb: &AABB, displacement: Vec3, max_iterations: u32) -> SlideResult;

    /// Whether a supporting surface lies within `probe_distance` below `aabb`
    fn is_grounded(&self, aabb: &AABB, probe_distance: f32) -> bool;

    /// Nearest solid voxel along a ray
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<VoxelRayHit>;

    /// Every solid voxel overlapped by `aabb`
    fn overlapping_voxels(&self, aabb: &AABB) -> Vec<IVec3>;

    /// Grid placement metadata
    fn grid_info(&self) -> GridInfo;
}
