//! Voxel collision system
//!
//! Based on Game Engine Architecture 3rd Edition:
//! - Section 12.3: Character movement against static geometry
//! - Section 13.3.10: Collision event callbacks
//! - Section 16.6: Updating Game Objects in Real Time
//!
//! Moves every entity with a [`VoxelColliderComponent`] through the voxel
//! world once per frame, then resolves it against dynamic voxel bodies,
//! keeps it riding platforms and relocates it when it gets stuck.

use crate::core::PhysicsConfig;
use crate::ecs::components::{
    BodyFlags, DynamicVoxelBodyComponent, LadderClimbingComponent, MovementComponent, TransformComponent,
    VoxelColliderComponent,
};
use crate::ecs::{Entity, World};
use crate::events::{EventArg, EventSystem, EventType};
use crate::foundation::math::{utils, Quat, Vec3};
use crate::physics::collision::AABB;
use crate::physics::dynamic_body::{apply_push, resolve_against_body, BodySnapshot};
use crate::physics::movement::{find_escape, Obstacles, StuckTracker, VoxelMovementResolver};
use crate::physics::platform_riding::{carry_rider, is_standing_on, RiderTable};
use crate::physics::voxel::VoxelWorld;

const RISE_EPSILON: f32 = 1.0e-3;

/// Per-frame state of one entity while it is being resolved
struct FrameState {
    collider: VoxelColliderComponent,
    position: Vec3,
    rotation: Quat,
    velocity: Vec3,
}

/// System that resolves voxel colliders against the voxel world and dynamic bodies
#[derive(Debug, Default)]
pub struct VoxelCollisionSystem {
    riders: RiderTable,
    stuck: StuckTracker,
}

impl VoxelCollisionSystem {
    /// Create a new voxel collision system
    pub fn new() -> Self {
        Self::default()
    }

    /// Platforms and their riders as of the last update
    pub fn riders(&self) -> &RiderTable {
        &self.riders
    }

    /// Stuck counters as of the last update
    pub fn stuck_tracker(&self) -> &StuckTracker {
        &self.stuck
    }

    /// Resolve every voxel collider for one frame.
    ///
    /// Dynamic bodies must already carry this frame's velocities.
    pub fn update(
        &mut self,
        world: &mut World,
        voxel_world: &dyn VoxelWorld,
        events: &mut EventSystem,
        config: &PhysicsConfig,
        dt: f32,
    ) {
        self.prune(world, events);

        let bodies: Vec<BodySnapshot> = world
            .query::<DynamicVoxelBodyComponent>()
            .into_iter()
            .map(|(entity, body)| BodySnapshot::capture(entity, body))
            .collect();
        let solid_boxes: Vec<AABB> = bodies
            .iter()
            .filter(|b| b.flags.contains(BodyFlags::PUSH_ENTITIES) && !b.flags.contains(BodyFlags::ONE_WAY))
            .flat_map(|b| b.boxes.iter().copied())
            .collect();

        let resolver = VoxelMovementResolver::new(
            Obstacles::new(voxel_world, &solid_boxes),
            &config.movement,
            &config.step_climb,
        );

        let mut resolved = 0usize;
        for entity in world.entities_with::<VoxelColliderComponent>() {
            if world.has_component::<LadderClimbingComponent>(entity) {
                continue;
            }
            let Some(mut state) = Self::read_state(world, entity) else {
                continue;
            };

            self.resolve_entity(entity, &mut state, &resolver, &bodies, events, config, dt);
            Self::write_state(world, entity, state);
            resolved += 1;
        }

        log::debug!(
            "Voxel collision: {resolved} colliders, {} bodies, {} riders",
            bodies.len(),
            self.riders.len()
        );
    }

    fn read_state(world: &World, entity: Entity) -> Option<FrameState> {
        let collider = world.get_component::<VoxelColliderComponent>(entity)?.clone();
        let transform = world.get_component::<TransformComponent>(entity)?;
        let velocity = world
            .get_component::<MovementComponent>(entity)
            .map(MovementComponent::effective_velocity)
            .unwrap_or_else(Vec3::zeros);
        Some(FrameState {
            collider,
            position: transform.position,
            rotation: transform.rotation,
            velocity,
        })
    }

    fn write_state(world: &mut World, entity: Entity, state: FrameState) {
        if let Some(transform) = world.get_component_mut::<TransformComponent>(entity) {
            transform.position = state.position;
            transform.rotation = state.rotation;
        }
        if let Some(movement) = world.get_component_mut::<MovementComponent>(entity) {
            if movement.enabled {
                movement.velocity.x = state.velocity.x;
                movement.velocity.z = state.velocity.z;
            }
        }
        if let Some(collider) = world.get_component_mut::<VoxelColliderComponent>(entity) {
            *collider = state.collider;
        }
    }

    fn resolve_entity(
        &mut self,
        entity: Entity,
        state: &mut FrameState,
        resolver: &VoxelMovementResolver<'_>,
        bodies: &[BodySnapshot],
        events: &mut EventSystem,
        config: &PhysicsConfig,
        dt: f32,
    ) {
        let was_grounded = state.collider.grounded;
        let riding = self.riders.is_riding(entity);

        state.collider.grounded = resolver.check_grounded(&state.collider, state.position, riding);
        resolver.apply_gravity(&mut state.collider, dt);

        if resolver.continue_climb(&mut state.collider, &mut state.position, dt) {
            Self::publish_grounded(entity, was_grounded, &state.collider, events);
            return;
        }

        // Gravity alone is not an intent to move
        let intent = utils::horizontal(state.velocity)
            .magnitude()
            .max(state.collider.vertical_velocity);
        resolver.move_collider(&mut state.collider, &mut state.velocity, &mut state.position, dt);

        self.push_out(entity, state, bodies, events, config);
        self.ride(entity, state, bodies, events, config, dt);
        resolver.clamp_to_world(&mut state.collider, &mut state.position);

        if config.stuck.enabled {
            let should_move = intent > config.stuck.min_speed;
            if self.stuck.observe(entity, state.position, should_move, &config.stuck) {
                self.escape(entity, state, resolver.obstacles(), events, config);
            }
        }

        Self::publish_grounded(entity, was_grounded, &state.collider, events);
    }

    /// Push the collider out of every body it does not ride
    fn push_out(
        &self,
        entity: Entity,
        state: &mut FrameState,
        bodies: &[BodySnapshot],
        events: &mut EventSystem,
        config: &PhysicsConfig,
    ) {
        for body in bodies {
            if body.entity == entity || self.riders.rides(body.entity, entity) {
                continue;
            }
            let velocity = Vec3::new(state.velocity.x, state.collider.vertical_velocity, state.velocity.z);
            let aabb = state.collider.aabb_at(state.position);
            let Some(push) = resolve_against_body(&aabb, velocity, body, &config.dynamic_bodies) else {
                continue;
            };

            apply_push(&mut state.collider, &mut state.position, &mut state.velocity, &push);
            let event = events
                .event(EventType::DynamicCollision)
                .with_arg("entity", EventArg::Entity(entity))
                .with_arg("body", EventArg::Entity(push.body))
                .with_arg("normal", EventArg::Vector(push.normal))
                .with_arg("depth", EventArg::Scalar(push.depth));
            events.send(event);
        }
    }

    /// Attach, detach and carry riders
    fn ride(
        &mut self,
        entity: Entity,
        state: &mut FrameState,
        bodies: &[BodySnapshot],
        events: &mut EventSystem,
        config: &PhysicsConfig,
        dt: f32,
    ) {
        for body in bodies {
            if body.entity == entity {
                continue;
            }
            let aabb = state.collider.aabb_at(state.position);
            // Moving up faster than the platform means jumping off or passing through
            let rising = state.collider.vertical_velocity > body.velocity.y.max(0.0) + RISE_EPSILON;
            let standing = !rising && is_standing_on(&aabb, body, dt, &config.dynamic_bodies);

            if standing {
                if self.riders.insert(body.entity, entity) {
                    log::debug!("Entity {entity} started riding {}", body.entity);
                    Self::publish_platform(EventType::PlatformEnter, body.entity, entity, events);
                }
                let feet_offset = state.position.y - aabb.min.y;
                state.position =
                    carry_rider(state.position, Some(&mut state.rotation), feet_offset, body, dt);
                state.collider.grounded = true;
                state.collider.vertical_velocity = state.collider.vertical_velocity.max(0.0);
            } else if self.riders.remove(body.entity, entity) {
                log::debug!("Entity {entity} stopped riding {}", body.entity);
                Self::publish_platform(EventType::PlatformExit, body.entity, entity, events);
            }
        }
    }

    fn escape(
        &mut self,
        entity: Entity,
        state: &mut FrameState,
        obstacles: &Obstacles<'_>,
        events: &mut EventSystem,
        config: &PhysicsConfig,
    ) {
        let aabb = state.collider.aabb_at(state.position);
        let Some(offset) = find_escape(obstacles, &aabb, &config.stuck) else {
            log::warn!("Entity {entity} is stuck at {:?} and no free spot was found", state.position);
            return;
        };

        state.position += offset;
        state.collider.vertical_velocity = 0.0;
        state.collider.climb_target = None;
        self.stuck.reset(entity, state.position);
        log::warn!("Entity {entity} was stuck, relocated by {offset:?}");

        let event = events
            .event(EventType::StuckEscape)
            .with_arg("entity", EventArg::Entity(entity))
            .with_arg("offset", EventArg::Vector(offset))
            .with_arg("distance", EventArg::Scalar(offset.magnitude()));
        events.send(event);
    }

    /// Drop riders and stuck counters of entities that no longer take part
    fn prune(&mut self, world: &World, events: &mut EventSystem) {
        let dropped = self.riders.retain(|platform, rider| {
            world.has_component::<DynamicVoxelBodyComponent>(platform)
                && world.has_component::<VoxelColliderComponent>(rider)
        });
        for (platform, rider) in dropped {
            Self::publish_platform(EventType::PlatformExit, platform, rider, events);
        }

        self.stuck
            .retain(|entity| world.has_component::<VoxelColliderComponent>(entity));
    }

    fn publish_platform(kind: EventType, platform: Entity, rider: Entity, events: &mut EventSystem) {
        let event = events
            .event(kind)
            .with_arg("entity", EventArg::Entity(rider))
            .with_arg("platform", EventArg::Entity(platform));
        events.send(event);
    }

    fn publish_grounded(
        entity: Entity,
        was_grounded: bool,
        collider: &VoxelColliderComponent,
        events: &mut EventSystem,
    ) {
        if collider.grounded == was_grounded {
            return;
        }
        let event = events
            .event(EventType::GroundedChanged)
            .with_arg("entity", EventArg::Entity(entity))
            .with_arg("grounded", EventArg::Bool(collider.grounded));
        events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::IVec3;
    use crate::physics::voxel::VoxelGrid;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn floor_grid() -> VoxelGrid {
        let mut grid = VoxelGrid::new(Vec3::zeros(), IVec3::new(16, 16, 16), 1.0);
        grid.fill(IVec3::new(0, 0, 0), IVec3::new(15, 0, 15), true);
        grid
    }

    fn spawn_walker(world: &mut World, position: Vec3, velocity: Vec3) -> Entity {
        let entity = world.create_entity();
        world.add_component(entity, TransformComponent::from_position(position));
        world.add_component(entity, VoxelColliderComponent::new(Vec3::new(0.3, 0.5, 0.3)));
        world.add_component(entity, MovementComponent::with_velocity(velocity));
        entity
    }

    fn count(events: &EventSystem, kind: EventType) -> usize {
        events.pending().iter().filter(|e| e.event_type == kind).count()
    }

    #[test]
    fn test_falls_and_lands_once() {
        let grid = floor_grid();
        let mut world = World::new();
        let mut events = EventSystem::new();
        let mut system = VoxelCollisionSystem::new();
        let config = PhysicsConfig::default();
        let entity = spawn_walker(&mut world, Vec3::new(8.0, 4.0, 8.0), Vec3::zeros());

        for _ in 0..120 {
            system.update(&mut world, &grid, &mut events, &config, DT);
        }

        let position = world
            .get_component::<TransformComponent>(entity)
            .map(|t| t.position)
            .unwrap_or_default();
        assert_relative_eq!(position.y, 1.5, epsilon = 0.01);
        let collider = world.get_component::<VoxelColliderComponent>(entity).cloned();
        assert!(collider.is_some_and(|c| c.grounded && c.vertical_velocity == 0.0));

        let grounded: Vec<_> = events
            .pending()
            .iter()
            .filter(|e| e.event_type == EventType::GroundedChanged)
            .collect();
        assert_eq!(grounded.len(), 1);
        assert_eq!(grounded[0].get_bool("grounded"), Some(true));
        assert_eq!(grounded[0].get_entity("entity"), Some(entity));
    }

    #[test]
    fn test_ladder_climbers_are_skipped() {
        let grid = floor_grid();
        let mut world = World::new();
        let mut events = EventSystem::new();
        let mut system = VoxelCollisionSystem::new();
        let entity = spawn_walker(&mut world, Vec3::new(8.0, 4.0, 8.0), Vec3::x());
        world.add_component(entity, LadderClimbingComponent);

        system.update(&mut world, &grid, &mut events, &PhysicsConfig::default(), DT);

        let position = world.get_component::<TransformComponent>(entity).map(|t| t.position);
        assert_eq!(position, Some(Vec3::new(8.0, 4.0, 8.0)));
        assert!(events.pending().is_empty());
    }

    #[test]
    fn test_stuck_entity_escapes_through_grid_search() {
        // Solid 12^3 cube with a one-voxel pocket at (6, 6, 6)
        let mut grid = VoxelGrid::new(Vec3::zeros(), IVec3::new(16, 16, 16), 1.0);
        grid.fill(IVec3::new(0, 0, 0), IVec3::new(10, 10, 10), true);
        grid.set_solid(IVec3::new(6, 6, 6), false);

        let mut world = World::new();
        let mut events = EventSystem::new();
        let mut system = VoxelCollisionSystem::new();
        let config = PhysicsConfig::default();
        let entity = world.create_entity();
        world.add_component(entity, TransformComponent::from_position(Vec3::new(6.5, 6.3, 6.5)));
        world.add_component(entity, VoxelColliderComponent::new(Vec3::repeat(0.3)));
        world.add_component(entity, MovementComponent::new());

        for _ in 0..120 {
            // Input keeps pushing into the wall
            if let Some(movement) = world.get_component_mut::<MovementComponent>(entity) {
                movement.set_velocity(Vec3::x());
            }
            system.update(&mut world, &grid, &mut events, &config, DT);
        }

        assert_eq!(count(&events, EventType::StuckEscape), 1);
        let escape = events
            .pending()
            .iter()
            .find(|e| e.event_type == EventType::StuckEscape)
            .and_then(|e| e.get_vector("offset"))
            .unwrap_or_default();
        assert_relative_eq!(escape, Vec3::new(0.0, 5.0, 0.0));

        let position = world
            .get_component::<TransformComponent>(entity)
            .map(|t| t.position)
            .unwrap_or_default();
        assert_relative_eq!(position.y, 11.3, epsilon = 1.0e-3);
        let collider = VoxelColliderComponent::new(Vec3::repeat(0.3));
        assert!(!grid.overlaps_aabb(&collider.aabb_at(position)));
    }

    #[test]
    fn test_pushed_out_of_body_and_pruned_on_destroy() {
        let grid = floor_grid();
        let mut world = World::new();
        let mut events = EventSystem::new();
        let mut system = VoxelCollisionSystem::new();
        let config = PhysicsConfig::default();

        // Walker standing on the floor, a crate overlapping its right side
        let walker = spawn_walker(&mut world, Vec3::new(8.0, 1.5, 8.0), Vec3::zeros());
        let block = world.create_entity();
        let mut body = DynamicVoxelBodyComponent::new_box(Vec3::repeat(0.5), 1.0);
        body.sync_from_transform(Vec3::new(8.7, 1.5, 8.0), Quat::identity(), DT);
        world.add_component(block, body);

        system.update(&mut world, &grid, &mut events, &config, DT);

        let position = world
            .get_component::<TransformComponent>(walker)
            .map(|t| t.position)
            .unwrap_or_default();
        // Penetration 0.1 along x, plus skin
        assert_relative_eq!(position.x, 7.899, epsilon = 1.0e-4);
        let push = events
            .pending()
            .iter()
            .find(|e| e.event_type == EventType::DynamicCollision)
            .cloned()
            .expect("push event");
        assert_eq!(push.get_entity("body"), Some(block));
        assert_eq!(push.get_vector("normal"), Some(Vec3::new(-1.0, 0.0, 0.0)));
        assert_relative_eq!(push.get_scalar("depth").unwrap_or_default(), 0.1, epsilon = 1.0e-4);

        assert_eq!(system.stuck_tracker().len(), 1);
        world.destroy_entity(walker);
        system.update(&mut world, &grid, &mut events, &config, DT);
        assert!(system.stuck_tracker().is_empty());
    }

    fn spawn_body(world: &mut World, body: DynamicVoxelBodyComponent, center: Vec3) -> Entity {
        let entity = world.create_entity();
        let mut body = body;
        body.sync_from_transform(center, Quat::identity(), DT);
        world.add_component(entity, body);
        entity
    }

    fn position_of(world: &World, entity: Entity) -> Vec3 {
        world
            .get_component::<TransformComponent>(entity)
            .map(|t| t.position)
            .unwrap_or_default()
    }

    #[test]
    fn test_idle_entity_rests_on_crate() {
        let grid = floor_grid();
        let mut world = World::new();
        let mut events = EventSystem::new();
        let mut system = VoxelCollisionSystem::new();
        let config = PhysicsConfig::default();

        // Floating crate, top face at y = 2.5
        spawn_body(&mut world, DynamicVoxelBodyComponent::new_box(Vec3::repeat(0.5), 1.0), Vec3::new(8.0, 2.0, 8.0));
        let walker = spawn_walker(&mut world, Vec3::new(8.0, 3.5, 8.0), Vec3::zeros());

        for _ in 0..120 {
            system.update(&mut world, &grid, &mut events, &config, DT);
        }

        assert_eq!(count(&events, EventType::StuckEscape), 0);
        assert_eq!(count(&events, EventType::DynamicCollision), 0);
        assert_eq!(count(&events, EventType::GroundedChanged), 1);
        assert_relative_eq!(position_of(&world, walker).y, 3.0, epsilon = 1.0e-3);
        let collider = world.get_component::<VoxelColliderComponent>(walker).cloned();
        assert!(collider.is_some_and(|c| c.grounded && c.vertical_velocity == 0.0));
    }

    #[test]
    fn test_walking_into_crate_stops_without_escape() {
        let grid = floor_grid();
        let mut world = World::new();
        let mut events = EventSystem::new();
        let mut system = VoxelCollisionSystem::new();
        let config = PhysicsConfig::default();

        // Two units tall, too high to climb
        spawn_body(
            &mut world,
            DynamicVoxelBodyComponent::new_box(Vec3::new(0.5, 1.0, 0.5), 1.0),
            Vec3::new(8.0, 2.0, 8.0),
        );
        let walker = spawn_walker(&mut world, Vec3::new(6.0, 1.5, 8.0), Vec3::new(3.0, 0.0, 0.0));

        for _ in 0..120 {
            system.update(&mut world, &grid, &mut events, &config, DT);
        }

        assert_eq!(count(&events, EventType::StuckEscape), 0);
        let position = position_of(&world, walker);
        assert_relative_eq!(position.x, 7.2, epsilon = 1.0e-3);
        assert_relative_eq!(position.y, 1.5, epsilon = 1.0e-3);
        let velocity = world
            .get_component::<MovementComponent>(walker)
            .map(|m| m.velocity)
            .unwrap_or_default();
        assert_eq!(velocity.x, 0.0);
    }

    #[test]
    fn test_rider_on_two_platforms() {
        let grid = floor_grid();
        let mut world = World::new();
        let mut events = EventSystem::new();
        let mut system = VoxelCollisionSystem::new();
        let config = PhysicsConfig::default();

        // Two slabs meeting at x = 8, tops at y = 4.25
        let slab = || DynamicVoxelBodyComponent::new_box(Vec3::new(1.0, 0.25, 1.0), 1.0).as_platform();
        let left = spawn_body(&mut world, slab(), Vec3::new(7.0, 4.0, 8.0));
        let right = spawn_body(&mut world, slab(), Vec3::new(9.0, 4.0, 8.0));
        let rider = spawn_walker(&mut world, Vec3::new(8.0, 4.75, 8.0), Vec3::zeros());

        for _ in 0..5 {
            system.update(&mut world, &grid, &mut events, &config, DT);
        }
        let mut platforms = system.riders().platforms_of(rider);
        platforms.sort();
        let mut expected = vec![left, right];
        expected.sort();
        assert_eq!(platforms, expected);
        assert_eq!(count(&events, EventType::PlatformEnter), 2);
        assert_relative_eq!(position_of(&world, rider).y, 4.75, epsilon = 1.0e-3);

        // Slide the right slab out from under the rider
        if let Some(body) = world.get_component_mut::<DynamicVoxelBodyComponent>(right) {
            body.sync_from_transform(Vec3::new(12.0, 4.0, 8.0), Quat::identity(), DT);
        }
        system.update(&mut world, &grid, &mut events, &config, DT);

        assert_eq!(system.riders().platforms_of(rider), vec![left]);
        let exit = events
            .pending()
            .iter()
            .find(|e| e.event_type == EventType::PlatformExit)
            .cloned()
            .expect("exit event");
        assert_eq!(exit.get_entity("platform"), Some(right));
        assert_eq!(exit.get_entity("entity"), Some(rider));

        let position = position_of(&world, rider);
        assert_relative_eq!(position, Vec3::new(8.0, 4.75, 8.0), epsilon = 1.0e-3);
        let collider = world.get_component::<VoxelColliderComponent>(rider).cloned();
        assert!(collider.is_some_and(|c| c.grounded));
    }
}
