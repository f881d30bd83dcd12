//! Sub-stepped movement resolution for voxel colliders
//!
//! One frame for one collider runs, in order: [`check_grounded`],
//! [`apply_gravity`], [`continue_climb`] (which may end the frame early),
//! [`move_collider`] and finally [`clamp_to_world`]. Dynamic-body push-out,
//! riding and stuck recovery are layered on top by the ECS system.
//!
//! [`check_grounded`]: VoxelMovementResolver::check_grounded
//! [`apply_gravity`]: VoxelMovementResolver::apply_gravity
//! [`continue_climb`]: VoxelMovementResolver::continue_climb
//! [`move_collider`]: VoxelMovementResolver::move_collider
//! [`clamp_to_world`]: VoxelMovementResolver::clamp_to_world

use super::step_climb::{try_step_climb, StepClimbRequest, StepClimbResult};
use super::Obstacles;
use crate::core::{StepClimbConfig, VoxelMovementConfig};
use crate::ecs::components::VoxelColliderComponent;
use crate::foundation::math::{constants, utils, Vec3};
use crate::physics::collision::AABB;

// Leftover displacement below this is not considered blocked
const BLOCK_EPSILON: f32 = 1.0e-5;

/// What happened while moving a collider for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveOutcome {
    /// Total translation applied to the position
    pub displacement: Vec3,
    /// Sub-steps actually run
    pub substeps: u32,
    /// Movement along X was blocked
    pub blocked_x: bool,
    /// Movement along Z was blocked
    pub blocked_z: bool,
    /// Height of the last step climbed (or started, for smooth climbs)
    pub climbed: Option<f32>,
    /// Normal of the last blocking surface
    pub normal: Option<Vec3>,
}

impl MoveOutcome {
    /// Whether anything blocked the move
    pub fn was_blocked(&self) -> bool {
        self.normal.is_some() || self.blocked_x || self.blocked_z
    }
}

/// Movement resolver over one frame's obstacles
pub struct VoxelMovementResolver<'a> {
    obstacles: Obstacles<'a>,
    config: &'a VoxelMovementConfig,
    step_config: &'a StepClimbConfig,
}

impl<'a> VoxelMovementResolver<'a> {
    /// Create a resolver for this frame
    pub fn new(
        obstacles: Obstacles<'a>,
        config: &'a VoxelMovementConfig,
        step_config: &'a StepClimbConfig,
    ) -> Self {
        Self {
            obstacles,
            config,
            step_config,
        }
    }

    /// Obstacles this resolver moves against
    pub fn obstacles(&self) -> &Obstacles<'a> {
        &self.obstacles
    }

    /// Grounded on voxel or body support just below the feet, or while riding a platform
    pub fn check_grounded(&self, collider: &VoxelColliderComponent, position: Vec3, riding: bool) -> bool {
        let aabb = collider.aabb_at(position);
        riding
            || self.obstacles.world.is_grounded(&aabb, collider.ground_check_distance)
            || self.obstacles.bodies_support(&aabb, collider.ground_check_distance)
    }

    /// Integrate gravity into the vertical velocity.
    ///
    /// A grounded collider only loses residual downward speed.
    pub fn apply_gravity(&self, collider: &mut VoxelColliderComponent, dt: f32) {
        if collider.grounded {
            collider.vertical_velocity = collider.vertical_velocity.max(0.0);
        } else {
            collider.vertical_velocity -= self.config.gravity * collider.gravity_scale * dt;
            collider.vertical_velocity = collider.vertical_velocity.max(-collider.max_fall_speed);
        }
    }

    /// Advance a smooth climb toward its target.
    ///
    /// Returns `true` while a climb is in progress, in which case normal
    /// movement is skipped for the frame.
    pub fn continue_climb(
        &self,
        collider: &mut VoxelColliderComponent,
        position: &mut Vec3,
        dt: f32,
    ) -> bool {
        let Some(target) = collider.climb_target else {
            return false;
        };

        let to_target = target - *position;
        let distance = to_target.magnitude();
        let step = collider.step_climb.climb_speed * dt;
        if distance < self.step_config.arrival_epsilon || step >= distance {
            *position = target;
            collider.climb_target = None;
            collider.grounded = true;
            collider.vertical_velocity = 0.0;
        } else {
            *position += to_target * (step / distance);
        }
        true
    }

    /// Move a collider by its horizontal `velocity` and its vertical velocity.
    ///
    /// Blocked horizontal axes are zeroed in `velocity`; blocked vertical
    /// motion zeroes the collider's vertical velocity.
    pub fn move_collider(
        &self,
        collider: &mut VoxelColliderComponent,
        velocity: &mut Vec3,
        position: &mut Vec3,
        dt: f32,
    ) -> MoveOutcome {
        let mut outcome = MoveOutcome::default();
        let start = *position;

        let total = Vec3::new(velocity.x, collider.vertical_velocity, velocity.z) * dt;
        let distance = total.magnitude();
        if distance < self.config.min_move_distance {
            collider.was_colliding = false;
            return outcome;
        }

        let voxel_size = self.obstacles.world.grid_info().voxel_size;
        let max_step = (self.config.max_substep_fraction * voxel_size).max(constants::EPSILON);
        let substeps = ((distance / max_step).ceil() as u32).clamp(1, self.config.max_substeps.max(1));
        let sub_dt = dt / substeps as f32;

        for _ in 0..substeps {
            let step = Vec3::new(velocity.x, collider.vertical_velocity, velocity.z) * sub_dt;
            if step.magnitude() < self.config.min_move_distance {
                break;
            }
            outcome.substeps += 1;

            let aabb = collider.aabb_at(*position);
            let (on_voxels, voxel_normal) = if collider.sliding_enabled {
                let slide = self
                    .obstacles
                    .world
                    .slide_move(&aabb, step, collider.max_slide_iterations);
                (slide.displacement, slide.normal)
            } else {
                match self.obstacles.world.sweep_aabb(&aabb, step) {
                    Some(hit) => (step * hit.time, Some(hit.normal)),
                    None => (step, None),
                }
            };
            let (actual, body_normal) = self.obstacles.clip_to_bodies(&aabb, on_voxels);
            let normal = body_normal
                .filter(|n| n.y != 0.0)
                .or(voxel_normal)
                .or(body_normal);

            let blocked = step - actual;
            let blocked_horizontal = utils::horizontal(blocked).magnitude();
            let wants_horizontal = utils::horizontal(step).magnitude() > BLOCK_EPSILON;

            if collider.grounded
                && collider.step_climb.enabled
                && wants_horizontal
                && blocked_horizontal > BLOCK_EPSILON
            {
                let moved = aabb.translated(actual);
                if let Some(climb) = self.find_step(collider, &moved, step, blocked_horizontal) {
                    outcome.climbed = Some(climb.height);
                    let landing = *position + actual + climb.offset;
                    if collider.step_climb.smooth {
                        *position += actual;
                        collider.climb_target = Some(landing);
                        break;
                    }
                    *position = landing;
                    continue;
                }
            }

            *position += actual;

            if collider.sliding_enabled {
                if blocked.x.abs() > BLOCK_EPSILON {
                    velocity.x = 0.0;
                    outcome.blocked_x = true;
                }
                if blocked.z.abs() > BLOCK_EPSILON {
                    velocity.z = 0.0;
                    outcome.blocked_z = true;
                }
                if blocked.y.abs() > BLOCK_EPSILON {
                    collider.vertical_velocity = 0.0;
                }
            } else if let Some(n) = normal {
                // Remove the velocity component heading into the surface
                let mut full = Vec3::new(velocity.x, collider.vertical_velocity, velocity.z);
                let into = full.dot(&n);
                if into < 0.0 {
                    full -= n * into;
                }
                outcome.blocked_x |= n.x != 0.0;
                outcome.blocked_z |= n.z != 0.0;
                velocity.x = full.x;
                velocity.z = full.z;
                collider.vertical_velocity = full.y;
            }

            if let Some(n) = normal {
                if n.y.abs() > self.config.steep_normal_threshold {
                    collider.vertical_velocity = 0.0;
                    if n.y > 0.0 {
                        collider.grounded = true;
                    }
                }
                outcome.normal = Some(n);
            }
        }

        outcome.displacement = *position - start;
        collider.was_colliding = outcome.was_blocked();
        if outcome.normal.is_some() {
            collider.last_collision_normal = outcome.normal;
        }
        outcome
    }

    /// Climb against voxels and against bodies, keeping the lower of the two
    fn find_step(
        &self,
        collider: &VoxelColliderComponent,
        moved: &AABB,
        step: Vec3,
        blocked_horizontal: f32,
    ) -> Option<StepClimbResult> {
        let voxel_size = self.obstacles.world.grid_info().voxel_size;
        let request = StepClimbRequest {
            aabb: *moved,
            direction: utils::horizontal(step),
            forward: blocked_horizontal,
            max_height: collider.step_climb.effective_max_height(voxel_size),
            overshoot: collider.step_climb.search_overshoot,
            min_step_depth: collider.step_climb.min_step_depth,
        };

        let solid = |b: &AABB| self.obstacles.is_blocked(b);
        let on_voxels = try_step_climb(&request, self.step_config, |b| self.obstacles.voxels_overlap(b), solid);
        let on_bodies = if self.obstacles.bodies.is_empty() {
            None
        } else {
            try_step_climb(&request, self.step_config, |b| self.obstacles.bodies_overlap(b), solid)
        };

        match (on_voxels, on_bodies) {
            (Some(a), Some(b)) => Some(if b.height < a.height { b } else { a }),
            (a, b) => a.or(b),
        }
    }

    /// Keep the collider inside the grid horizontally and above its floor.
    ///
    /// The top of the world stays open.
    pub fn clamp_to_world(&self, collider: &mut VoxelColliderComponent, position: &mut Vec3) {
        if !self.config.clamp_to_world {
            return;
        }

        let bounds = self.obstacles.world.grid_info().bounds();
        let aabb = collider.aabb_at(*position);
        for axis in [0, 2] {
            if aabb.size()[axis] >= bounds.size()[axis] {
                position[axis] += bounds.center()[axis] - aabb.center()[axis];
            } else if aabb.min[axis] < bounds.min[axis] {
                position[axis] += bounds.min[axis] - aabb.min[axis];
            } else if aabb.max[axis] > bounds.max[axis] {
                position[axis] -= aabb.max[axis] - bounds.max[axis];
            }
        }

        if aabb.min.y < bounds.min.y {
            position.y += bounds.min.y - aabb.min.y;
            collider.vertical_velocity = collider.vertical_velocity.max(0.0);
        }
    }
}
