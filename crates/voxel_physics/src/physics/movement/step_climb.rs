//! Step-climb search
//!
//! Finds the lowest ledge height that lets a blocked box continue forward.
//! The search is expressed over two predicates so the same code climbs
//! static voxels and platform bodies: `obstacle` decides whether anything
//! blocks the way at all, `solid` decides whether a candidate box is free.

use crate::core::StepClimbConfig;
use crate::foundation::math::{utils, Vec3};
use crate::physics::collision::AABB;

/// Inputs of one climb attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepClimbRequest {
    /// Box after the blocked move
    pub aabb: AABB,
    /// Horizontal travel direction (normalized internally)
    pub direction: Vec3,
    /// Horizontal distance that was blocked
    pub forward: f32,
    /// Highest ledge to consider
    pub max_height: f32,
    /// Extra forward distance for the landing probe
    pub overshoot: f32,
    /// Shortest forward distance for the landing probe
    pub min_step_depth: f32,
}

/// A successful climb
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepClimbResult {
    /// Translation from the request box to the landing box
    pub offset: Vec3,
    /// Height gained
    pub height: f32,
}

/// Box sitting on top of `aabb`'s floor, from `bottom` to `top` above it
fn vertical_band(aabb: &AABB, bottom: f32, top: f32) -> AABB {
    AABB::new(
        Vec3::new(aabb.min.x, aabb.min.y + bottom, aabb.min.z),
        Vec3::new(aabb.max.x, aabb.min.y + top, aabb.max.z),
    )
}

/// Probe boxes just ahead of the front face, split across its width
fn front_probes(aabb: &AABB, direction: Vec3, distance: f32, height: f32, count: u32) -> Vec<AABB> {
    let band = vertical_band(aabb, 1.0e-3, height).translated(direction * distance);
    // Split along the horizontal axis that is most perpendicular to travel
    let lateral = if direction.x.abs() >= direction.z.abs() { 2 } else { 0 };
    let count = count.max(1);
    let width = (band.max[lateral] - band.min[lateral]) / count as f32;

    (0..count)
        .map(|i| {
            let mut probe = band;
            probe.min[lateral] = band.min[lateral] + width * i as f32;
            probe.max[lateral] = probe.min[lateral] + width;
            probe
        })
        .collect()
}

/// Search for a ledge the box can climb onto.
///
/// Returns `None` when nothing obstructs the way, no height up to
/// `max_height` (rounded up to a whole increment) is free, or the gain would
/// be negligible.
pub fn try_step_climb<O, S>(
    request: &StepClimbRequest,
    config: &StepClimbConfig,
    obstacle: O,
    solid: S,
) -> Option<StepClimbResult>
where
    O: Fn(&AABB) -> bool,
    S: Fn(&AABB) -> bool,
{
    let direction = utils::safe_normalize(utils::horizontal(request.direction));
    let increment = config.height_increment;
    if direction == Vec3::zeros() || request.max_height <= 0.0 || increment <= 0.0 {
        return None;
    }

    let forward = (request.forward + request.overshoot).max(request.min_step_depth);
    let obstructed = front_probes(
        &request.aabb,
        direction,
        forward,
        request.max_height,
        config.obstacle_probes,
    )
    .iter()
    .any(&obstacle);
    if !obstructed {
        return None;
    }

    let steps = (request.max_height / increment).ceil() as u32;

    for i in 1..=steps {
        let height = i as f32 * increment;
        let raised = request.aabb.translated(Vec3::new(0.0, height, 0.0));
        if solid(&raised) {
            continue;
        }
        let ahead = raised.translated(direction * forward);
        if solid(&ahead) {
            continue;
        }

        // Drop back down from the forward position until something supports it
        let Some(drop) = (0..=i).map(|k| k as f32 * increment).find(|&drop| {
            let candidate = ahead.translated(Vec3::new(0.0, -drop, 0.0));
            let slab = vertical_band(&candidate, -config.ground_slab, 0.0);
            !solid(&candidate) && solid(&slab)
        }) else {
            continue;
        };

        let gain = height - drop;
        if gain < increment * 0.25 {
            log::trace!("Step climb rejected: gain {gain:.4} is noise");
            return None;
        }
        log::trace!("Step climb found: gain {gain:.3} at probe height {height:.3}");
        return Some(StepClimbResult {
            offset: direction * forward + Vec3::new(0.0, gain, 0.0),
            height: gain,
        });
    }

    None
}
