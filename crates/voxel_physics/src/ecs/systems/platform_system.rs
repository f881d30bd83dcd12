//! Platform motion system
//!
//! Advances every [`PlatformComponent`] along its motion, writes the result
//! into the transform and then derives this frame's velocities for every
//! dynamic voxel body from its transform. Runs before collision detection so
//! the rest of the frame sees platforms at their new positions.

use crate::ecs::components::{DynamicVoxelBodyComponent, PlatformComponent, TransformComponent};
use crate::ecs::{Entity, World};
use crate::foundation::math::Vec3;

/// Drives platforms and keeps dynamic body velocities current
#[derive(Debug, Default)]
pub struct PlatformMotionSystem {
    next_id: u32,
}

impl PlatformMotionSystem {
    /// Create a new platform motion system
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a platform entity.
    ///
    /// The transform starts at the motion's current position, or at
    /// `position` for static and custom motions.
    pub fn create_platform(
        &mut self,
        world: &mut World,
        position: Vec3,
        body: DynamicVoxelBodyComponent,
        mut platform: PlatformComponent,
    ) -> Entity {
        platform.id = self.next_id;
        self.next_id += 1;

        let start = platform.motion.position().unwrap_or(position);
        let entity = world.create_entity();
        world.add_component(entity, TransformComponent::from_position(start));
        world.add_component(entity, body);
        world.add_component(entity, platform);
        log::debug!("Created platform {entity} at {start:?}");
        entity
    }

    /// Advance platforms, then derive body velocities
    pub fn update(&mut self, world: &mut World, dt: f32) {
        self.advance_platforms(world, dt);
        self.sync_bodies(world, dt);
    }

    fn advance_platforms(&self, world: &mut World, dt: f32) {
        for entity in world.entities_with::<PlatformComponent>() {
            let Some(platform) = world.get_component_mut::<PlatformComponent>(entity) else {
                continue;
            };
            if !platform.active {
                continue;
            }
            let position = platform.motion.advance(dt);
            let spin = platform.self_rotation.map(|rotation| rotation.delta(dt));

            let Some(transform) = world.get_component_mut::<TransformComponent>(entity) else {
                continue;
            };
            if let Some(position) = position {
                transform.position = position;
            }
            if let Some(spin) = spin {
                transform.rotation = spin * transform.rotation;
            }
        }
    }

    fn sync_bodies(&self, world: &mut World, dt: f32) {
        for entity in world.entities_with::<DynamicVoxelBodyComponent>() {
            let Some((position, rotation)) = world
                .get_component::<TransformComponent>(entity)
                .map(|t| (t.position, t.rotation))
            else {
                continue;
            };
            if let Some(body) = world.get_component_mut::<DynamicVoxelBodyComponent>(entity) {
                body.sync_from_transform(position, rotation, dt);
            }
        }
    }
}
