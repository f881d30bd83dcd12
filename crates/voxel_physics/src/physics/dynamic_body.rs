//! Dynamic-body push-out
//!
//! Dynamic voxel bodies are resolved against voxel colliders with a
//! separating-axis test on axis-aligned boxes. The collider is pushed out
//! along the minimum translation vector; there is no impulse exchange.

use crate::core::DynamicBodyConfig;
use crate::ecs::components::{BodyFlags, DynamicVoxelBodyComponent, VoxelColliderComponent};
use crate::ecs::Entity;
use crate::foundation::math::{Quat, Vec3};
use crate::physics::collision::{separating_axis_test, AABB};

/// State of one dynamic body captured once per frame
#[derive(Debug, Clone, PartialEq)]
pub struct BodySnapshot {
    /// Owning entity
    pub entity: Entity,
    /// World boxes tested against colliders
    pub boxes: Vec<AABB>,
    /// Bound of all boxes
    pub bound: AABB,
    /// Body center
    pub center: Vec3,
    /// Linear velocity derived this frame
    pub velocity: Vec3,
    /// Rotation between the previous frame and this one
    pub frame_rotation: Quat,
    /// Behaviour switches
    pub flags: BodyFlags,
    /// Pass-through direction of one-way bodies
    pub one_way_direction: Vec3,
}

impl BodySnapshot {
    /// Capture the current state of `body`
    pub fn capture(entity: Entity, body: &DynamicVoxelBodyComponent) -> Self {
        let boxes = body.collision_boxes();
        let bound = boxes.iter().fold(AABB::reset(), |acc, b| acc.union(b));
        Self {
            entity,
            boxes,
            bound,
            center: body.position,
            velocity: body.velocity,
            frame_rotation: body.frame_rotation(),
            flags: body.flags,
            one_way_direction: body.one_way_direction,
        }
    }

    /// Height of the top face
    pub fn top(&self) -> f32 {
        self.bound.max.y
    }

    /// Whether an entity moving with `velocity` passes through this body
    pub fn lets_through(&self, velocity: Vec3) -> bool {
        self.flags.contains(BodyFlags::ONE_WAY) && velocity.dot(&self.one_way_direction) > 0.0
    }
}

/// Push applied to a collider by one body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PushOut {
    /// Body that pushed
    pub body: Entity,
    /// Axis of the deepest penetration resolved
    pub normal: Vec3,
    /// Deepest penetration resolved
    pub depth: f32,
    /// Total translation to apply to the collider
    pub offset: Vec3,
}

/// Resolve `aabb` against every box of `body`.
///
/// Each box is resolved in turn against the already-pushed collider box.
/// Pushes are capped at `max_penetration_resolve` and padded by the skin
/// width. Returns `None` when the body does not push, lets the collider
/// through, or nothing overlaps.
pub fn resolve_against_body(
    aabb: &AABB,
    velocity: Vec3,
    body: &BodySnapshot,
    config: &DynamicBodyConfig,
) -> Option<PushOut> {
    if !body.flags.contains(BodyFlags::PUSH_ENTITIES) || body.lets_through(velocity) {
        return None;
    }

    let mut current = *aabb;
    let mut result: Option<PushOut> = None;
    for solid in &body.boxes {
        let Some(sat) = separating_axis_test(&current, solid) else {
            continue;
        };
        let push = sat.normal * (sat.depth.min(config.max_penetration_resolve) + config.skin_width);
        current = current.translated(push);

        let push_out = result.get_or_insert(PushOut {
            body: body.entity,
            normal: sat.normal,
            depth: 0.0,
            offset: Vec3::zeros(),
        });
        push_out.offset += push;
        if sat.depth > push_out.depth {
            push_out.depth = sat.depth;
            push_out.normal = sat.normal;
        }
    }
    result
}

/// Apply a push to a collider's position and velocity.
///
/// Velocity heading into the push normal is removed, horizontal part from
/// `velocity` and vertical part from the collider. An upward push counts as
/// support.
pub fn apply_push(
    collider: &mut VoxelColliderComponent,
    position: &mut Vec3,
    velocity: &mut Vec3,
    push: &PushOut,
) {
    *position += push.offset;

    let mut full = Vec3::new(velocity.x, collider.vertical_velocity, velocity.z);
    let into = full.dot(&push.normal);
    if into < 0.0 {
        full -= push.normal * into;
    }
    velocity.x = full.x;
    velocity.z = full.z;
    collider.vertical_velocity = full.y;

    if push.normal.y > 0.0 {
        collider.vertical_velocity = collider.vertical_velocity.max(0.0);
        collider.grounded = true;
    }
    collider.last_collision_normal = Some(push.normal);
    collider.was_colliding = true;
}
