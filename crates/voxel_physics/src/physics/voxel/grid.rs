//! Dense voxel grid implementing [`VoxelWorld`]
//!
//! One flag per cell, laid out x-fastest. Voxel `(i, j, k)` covers
//! `origin + [i, i+1] * size` on each axis. Cells outside the grid are empty.
//!
//! Contacts use [`CONTACT_TOLERANCE`]: boxes touching a face (or sunk into it
//! by less than the tolerance) do not overlap it, and a sweep that starts in
//! such a contact and moves inward is stopped at time zero.

use crate::foundation::math::{utils, IVec3, Vec3};
use crate::physics::collision::AABB;

use super::world::{GridInfo, SlideResult, SweepHit, VoxelRayHit, VoxelWorld};

/// Penetration below which a box counts as touching rather than overlapping
pub const CONTACT_TOLERANCE: f32 = 1.0e-4;

/// Dense solid/empty voxel grid
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    info: GridInfo,
    solid: Vec<bool>,
}

impl VoxelGrid {
    /// Create an empty grid.
    ///
    /// Negative dimensions are treated as zero and a non-positive voxel size
    /// falls back to 1.
    pub fn new(origin: Vec3, dimensions: IVec3, voxel_size: f32) -> Self {
        let dimensions = dimensions.map(|d| d.max(0));
        let voxel_size = if voxel_size > 0.0 && voxel_size.is_finite() {
            voxel_size
        } else {
            log::warn!("Invalid voxel size {voxel_size}, using 1.0");
            1.0
        };
        let cells: usize = dimensions.iter().map(|&d| d as usize).product();

        Self {
            info: GridInfo { origin, dimensions, voxel_size },
            solid: vec![false; cells],
        }
    }

    fn index(&self, voxel: IVec3) -> Option<usize> {
        let d = self.info.dimensions;
        if (0..3).any(|a| voxel[a] < 0 || voxel[a] >= d[a]) {
            return None;
        }
        let (x, y, z) = (voxel.x as usize, voxel.y as usize, voxel.z as usize);
        Some(x + d.x as usize * (y + d.y as usize * z))
    }

    /// Whether a voxel is solid (out-of-grid voxels never are)
    pub fn is_solid(&self, voxel: IVec3) -> bool {
        self.index(voxel).is_some_and(|i| self.solid[i])
    }

    /// Set one voxel. Returns `false` when it lies outside the grid.
    pub fn set_solid(&mut self, voxel: IVec3, solid: bool) -> bool {
        match self.index(voxel) {
            Some(i) => {
                self.solid[i] = solid;
                true
            }
            None => false,
        }
    }

    /// Set every voxel in the inclusive range `min..=max`
    pub fn fill(&mut self, min: IVec3, max: IVec3, solid: bool) {
        for z in min.z..=max.z {
            for y in min.y..=max.y {
                for x in min.x..=max.x {
                    self.set_solid(IVec3::new(x, y, z), solid);
                }
            }
        }
    }

    /// Number of solid voxels
    pub fn solid_count(&self) -> usize {
        self.solid.iter().filter(|&&s| s).count()
    }

    /// Voxel containing a world-space point
    pub fn world_to_voxel(&self, point: Vec3) -> IVec3 {
        ((point - self.info.origin) / self.info.voxel_size).map(|c| c.floor() as i32)
    }

    /// World-space box of a voxel
    pub fn voxel_bounds(&self, voxel: IVec3) -> AABB {
        let s = self.info.voxel_size;
        let min = self.info.origin + voxel.map(|c| c as f32) * s;
        AABB::new(min, min + Vec3::repeat(s))
    }

    /// Total volume shared between `aabb` and solid voxels
    pub fn penetration_volume(&self, aabb: &AABB) -> f32 {
        self.overlapping_voxels(aabb)
            .into_iter()
            .map(|v| {
                let b = self.voxel_bounds(v);
                let overlap = aabb.max.inf(&b.max) - aabb.min.sup(&b.min);
                overlap.map(|o| o.max(0.0)).product()
            })
            .sum()
    }

    /// Clipped voxel range covered by `aabb` (inclusive on both ends)
    fn voxel_range(&self, aabb: &AABB) -> Option<(IVec3, IVec3)> {
        let s = self.info.voxel_size;
        let lo = ((aabb.min - self.info.origin) / s).map(|c| c.floor() as i32);
        let hi = ((aabb.max - self.info.origin) / s).map(|c| c.ceil() as i32 - 1);
        let last = self.info.dimensions.map(|d| d - 1);
        let lo = lo.sup(&IVec3::zeros());
        let hi = hi.inf(&last);

        if (0..3).any(|a| lo[a] > hi[a]) {
            None
        } else {
            Some((lo, hi))
        }
    }

    fn solid_voxels_in(&self, lo: IVec3, hi: IVec3) -> impl Iterator<Item = IVec3> + '_ {
        (lo.z..=hi.z).flat_map(move |z| {
            (lo.y..=hi.y).flat_map(move |y| {
                (lo.x..=hi.x).map(move |x| IVec3::new(x, y, z))
            })
        })
        .filter(move |&v| self.is_solid(v))
    }

    /// Swept-box test against one voxel
    fn sweep_voxel(&self, aabb: &AABB, displacement: Vec3, voxel: IVec3) -> Option<SweepHit> {
        let vb = self.voxel_bounds(voxel);
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut enter_axis = None;

        for axis in 0..3 {
            let d = displacement[axis];
            if d.abs() < 1.0e-9 {
                // Not moving on this axis: must already overlap it
                if aabb.max[axis] <= vb.min[axis] + CONTACT_TOLERANCE
                    || aabb.min[axis] >= vb.max[axis] - CONTACT_TOLERANCE
                {
                    return None;
                }
                continue;
            }

            let (near, far) = if d > 0.0 {
                ((vb.min[axis] - aabb.max[axis]) / d, (vb.max[axis] - aabb.min[axis]) / d)
            } else {
                ((vb.max[axis] - aabb.min[axis]) / d, (vb.min[axis] - aabb.max[axis]) / d)
            };

            if near > t_enter {
                t_enter = near;
                enter_axis = Some(axis);
            }
            t_exit = t_exit.min(far);
        }

        let axis = enter_axis?;
        if t_enter >= t_exit || t_enter > 1.0 {
            return None;
        }
        if t_enter < 0.0 {
            // Started inside: only shallow contacts block, deep overlaps may escape
            let depth = -t_enter * displacement[axis].abs();
            if depth > 2.0 * CONTACT_TOLERANCE {
                return None;
            }
        }

        let mut normal = Vec3::zeros();
        normal[axis] = -displacement[axis].signum();
        Some(SweepHit {
            time: t_enter.clamp(0.0, 1.0),
            normal,
            voxel,
        })
    }
}

impl VoxelWorld for VoxelGrid {
    fn overlaps_aabb(&self, aabb: &AABB) -> bool {
        !self.overlapping_voxels(aabb).is_empty()
    }

    fn sweep_aabb(&self, aabb: &AABB, displacement: Vec3) -> Option<SweepHit> {
        if displacement.magnitude_squared() < 1.0e-14 {
            return None;
        }

        let region = aabb
            .union(&aabb.translated(displacement))
            .expanded(2.0 * CONTACT_TOLERANCE);
        let (lo, hi) = self.voxel_range(&region)?;

        let mut best: Option<SweepHit> = None;
        for voxel in self.solid_voxels_in(lo, hi) {
            if let Some(hit) = self.sweep_voxel(aabb, displacement, voxel) {
                if best.map_or(true, |b| hit.time < b.time) {
                    best = Some(hit);
                }
            }
        }
        best
    }

    fn slide_move(&self, aabb: &AABB, displacement: Vec3, max_iterations: u32) -> SlideResult {
        let initial_penetration = self.penetration_volume(aabb);
        let mut current = *aabb;
        let mut moved = Vec3::zeros();
        let mut remaining = displacement;
        let mut normal = None;

        for _ in 0..max_iterations.max(1) {
            if remaining.magnitude_squared() < 1.0e-14 {
                break;
            }
            match self.sweep_aabb(&current, remaining) {
                None => {
                    moved += remaining;
                    current = current.translated(remaining);
                    remaining = Vec3::zeros();
                }
                Some(hit) => {
                    let step = remaining * hit.time;
                    moved += step;
                    current = current.translated(step);
                    let left = remaining - step;
                    remaining = left - hit.normal * left.dot(&hit.normal);
                    normal = Some(hit.normal);
                }
            }
        }

        // Never trade a shallow overlap for a deeper one
        if initial_penetration > 0.0
            && self.penetration_volume(&current) > initial_penetration + 1.0e-6
        {
            return SlideResult { displacement: Vec3::zeros(), normal };
        }

        SlideResult { displacement: moved, normal }
    }

    fn is_grounded(&self, aabb: &AABB, probe_distance: f32) -> bool {
        if probe_distance <= 0.0 {
            return false;
        }
        let slab = AABB::new(
            Vec3::new(aabb.min.x, aabb.min.y - probe_distance, aabb.min.z),
            Vec3::new(aabb.max.x, aabb.min.y, aabb.max.z),
        );
        self.overlaps_aabb(&slab)
    }

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<VoxelRayHit> {
        let dir = utils::safe_normalize(direction);
        if dir == Vec3::zeros() || max_distance <= 0.0 {
            return None;
        }

        let bounds = self.info.bounds();
        let ray = crate::physics::collision::Ray::new(origin, dir);
        let t_start = bounds.intersect_ray(&ray)?;
        if t_start > max_distance {
            return None;
        }

        let s = self.info.voxel_size;
        let entry = origin + dir * t_start;
        let last = self.info.dimensions.map(|d| d - 1);
        let mut voxel = self.world_to_voxel(entry + dir * 1.0e-5)
            .sup(&IVec3::zeros())
            .inf(&last);

        let mut normal = Vec3::zeros();
        if t_start > 0.0 {
            // Entered through the face closest to the entry point
            let mut best = f32::INFINITY;
            for axis in 0..3 {
                let face = if dir[axis] > 0.0 { bounds.min[axis] } else { bounds.max[axis] };
                let gap = (entry[axis] - face).abs();
                if dir[axis] != 0.0 && gap < best {
                    best = gap;
                    normal = Vec3::zeros();
                    normal[axis] = -dir[axis].signum();
                }
            }
        }

        let step = dir.map(|d| if d > 0.0 { 1 } else if d < 0.0 { -1 } else { 0 });
        let mut t_max = Vec3::repeat(f32::INFINITY);
        let mut t_delta = Vec3::repeat(f32::INFINITY);
        for axis in 0..3 {
            if step[axis] == 0 {
                continue;
            }
            let cell_min = self.info.origin[axis] + voxel[axis] as f32 * s;
            let boundary = if step[axis] > 0 { cell_min + s } else { cell_min };
            t_max[axis] = t_start + (boundary - entry[axis]) / dir[axis];
            t_delta[axis] = s / dir[axis].abs();
        }

        let mut t = t_start;
        let max_steps = self.info.dimensions.iter().map(|&d| d as usize).sum::<usize>() + 3;
        for _ in 0..max_steps {
            if self.is_solid(voxel) {
                return Some(VoxelRayHit {
                    position: origin + dir * t,
                    normal,
                    voxel,
                    distance: t,
                });
            }

            let axis = if t_max.x <= t_max.y && t_max.x <= t_max.z {
                0
            } else if t_max.y <= t_max.z {
                1
            } else {
                2
            };
            t = t_max[axis];
            if t > max_distance {
                return None;
            }
            voxel[axis] += step[axis];
            t_max[axis] += t_delta[axis];
            normal = Vec3::zeros();
            normal[axis] = -(step[axis] as f32);

            if voxel[axis] < 0 || voxel[axis] > last[axis] {
                return None;
            }
        }
        None
    }

    fn overlapping_voxels(&self, aabb: &AABB) -> Vec<IVec3> {
        let shrunk = AABB::new(
            aabb.min + Vec3::repeat(CONTACT_TOLERANCE),
            aabb.max - Vec3::repeat(CONTACT_TOLERANCE),
        );
        if !shrunk.is_valid() {
            return Vec::new();
        }
        match self.voxel_range(&shrunk) {
            Some((lo, hi)) => self.solid_voxels_in(lo, hi).collect(),
            None => Vec::new(),
        }
    }

    fn grid_info(&self) -> GridInfo {
        self.info
    }
}
