//! ECS collision system wrapper
//!
//! Based on Game Engine Architecture 3rd Edition:
//! - Section 13.3: Collision Detection System
//! - Section 16.6: Updating Game Objects in Real Time
//!
//! This module provides an ECS-aware wrapper around the core collision system,
//! keeping it in sync with collider attach/detach notifications and
//! transforms, publishing collision events and maintaining
//! `CollisionStateComponent`s.

use crate::core::BroadPhaseConfig;
use crate::ecs::components::{ColliderComponent, CollisionStateComponent, TransformComponent};
use crate::ecs::{Entity, World};
use crate::events::{EventArg, EventSystem, EventType};
use crate::physics::collision_system::{CollisionPair, PhysicsCollisionSystem};
use crate::spatial::spatial_query::{BvhSpatialQuery, SpatialQuery};
use std::collections::{HashMap, HashSet};

/// ECS collision system that integrates collision detection with the ECS World
///
/// This system:
/// - Registers and unregisters colliders from attach/detach notifications
/// - Refreshes every collider bound from its transform each frame
/// - Publishes a `CollisionPair` event per contact
/// - Updates CollisionStateComponents each frame
pub struct EcsCollisionSystem {
    collision_system: PhysicsCollisionSystem,
    publish_events: bool,
}

impl EcsCollisionSystem {
    /// Create a new ECS collision system with the given spatial query
    pub fn new(spatial_query: Box<dyn SpatialQuery>, config: &BroadPhaseConfig) -> Self {
        Self {
            collision_system: PhysicsCollisionSystem::new(spatial_query)
                .with_bound_margin(config.bound_margin),
            publish_events: config.publish_events,
        }
    }

    /// Create a system backed by a dynamic BVH
    pub fn with_bvh(config: &BroadPhaseConfig) -> Self {
        Self::new(Box::new(BvhSpatialQuery::new()), config)
    }

    /// Register a collider using the entity's current transform.
    ///
    /// Entities without a transform are picked up once they get one.
    pub fn register_collider(&mut self, entity: Entity, world: &World) {
        let (Some(collider), Some(transform)) = (
            world.get_component::<ColliderComponent>(entity),
            world.get_component::<TransformComponent>(entity),
        ) else {
            return;
        };

        self.collision_system.register_collider(
            entity,
            collider.shape.to_world_space(transform.position, transform.scale),
            collider.layer,
            collider.mask,
            collider.is_trigger,
        );
    }

    /// Unregister a collider (called when ColliderComponent is removed)
    pub fn unregister_collider(&mut self, entity: Entity) {
        self.collision_system.unregister_collider(entity);
    }

    /// Main update function - performs collision detection and updates components
    ///
    /// GEA 16.6: "Game object updates are typically performed once per frame"
    pub fn update(&mut self, world: &mut World, events: &mut EventSystem) {
        // Step 1: Apply attach/detach notifications
        self.process_notifications(world);

        // Step 2: Refresh bounds from transforms
        self.sync_colliders(world);

        // Step 3: Broad + narrow phase
        self.collision_system.detect_collisions();

        // Step 4: Publish contacts
        if self.publish_events {
            self.send_pair_events(events);
        }

        // Step 5: Update CollisionStateComponents with results
        self.update_collision_states(world);
    }

    fn process_notifications(&mut self, world: &mut World) {
        if world.track_changes::<ColliderComponent>() {
            // Colliders attached before tracking started
            for entity in world.entities_with::<ColliderComponent>() {
                self.register_collider(entity, world);
            }
        }

        for entity in world.drain_detached::<ColliderComponent>() {
            self.unregister_collider(entity);
        }
        for entity in world.drain_attached::<ColliderComponent>() {
            if !self.collision_system.has_collider(entity) {
                self.register_collider(entity, world);
            }
        }
    }

    fn sync_colliders(&mut self, world: &World) {
        for (entity, collider) in world.query::<ColliderComponent>() {
            let Some(transform) = world.get_component::<TransformComponent>(entity) else {
                continue;
            };
            let shape = collider.shape.to_world_space(transform.position, transform.scale);
            if !self
                .collision_system
                .update_collider(entity, shape, collider.layer, collider.mask)
            {
                self.collision_system.register_collider(
                    entity,
                    shape,
                    collider.layer,
                    collider.mask,
                    collider.is_trigger,
                );
            }
        }
    }

    fn send_pair_events(&self, events: &mut EventSystem) {
        let entered: HashSet<CollisionPair> =
            self.collision_system.collision_entered().into_iter().collect();
        let mut pairs: Vec<_> = self.collision_system.current_collisions().iter().copied().collect();
        pairs.sort();

        for pair in pairs {
            let event = events
                .event(EventType::CollisionPair)
                .with_arg("entity_a", EventArg::Entity(pair.entity_a))
                .with_arg("entity_b", EventArg::Entity(pair.entity_b))
                .with_arg("entered", EventArg::Bool(entered.contains(&pair)))
                .with_arg("trigger", EventArg::Bool(self.collision_system.is_trigger_pair(&pair)));
            events.send(event);
        }
    }

    /// Update CollisionStateComponents with current collision data
    fn update_collision_states(&self, world: &mut World) {
        fn index(pairs: impl IntoIterator<Item = CollisionPair>) -> HashMap<Entity, Vec<Entity>> {
            let mut map: HashMap<Entity, Vec<Entity>> = HashMap::new();
            for pair in pairs {
                map.entry(pair.entity_a).or_default().push(pair.entity_b);
                map.entry(pair.entity_b).or_default().push(pair.entity_a);
            }
            map
        }

        let current = index(self.collision_system.current_collisions().iter().copied());
        let entered = index(self.collision_system.collision_entered());
        let exited = index(self.collision_system.collision_exited());

        for (entity, state) in world.query_mut::<CollisionStateComponent>() {
            state.clear_frame_data();
            state.colliding_with = current
                .get(&entity)
                .map(|others| others.iter().copied().collect())
                .unwrap_or_default();
            if let Some(others) = entered.get(&entity) {
                state.collision_entered.clone_from(others);
            }
            if let Some(others) = exited.get(&entity) {
                state.collision_exited.clone_from(others);
            }
        }
    }

    /// Get reference to underlying collision system
    pub fn collision_system(&self) -> &PhysicsCollisionSystem {
        &self.collision_system
    }

    /// Get mutable reference to underlying collision system
    pub fn collision_system_mut(&mut self) -> &mut PhysicsCollisionSystem {
        &mut self.collision_system
    }

    /// Get reference to spatial query (shorthand for collision_system().spatial_query())
    pub fn spatial_query(&self) -> &dyn SpatialQuery {
        self.collision_system.spatial_query()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::physics::collision::CollisionShape;

    fn spawn(world: &mut World, position: Vec3, shape: CollisionShape) -> Entity {
        let entity = world.create_entity();
        world.add_component(entity, TransformComponent::from_position(position));
        world.add_component(entity, ColliderComponent::new(shape));
        world.add_component(entity, CollisionStateComponent::default());
        entity
    }

    #[test]
    fn test_attach_move_detach_cycle() {
        let mut world = World::new();
        let mut events = EventSystem::new();
        let mut system = EcsCollisionSystem::with_bvh(&BroadPhaseConfig::default());

        // Spawned before the first update: picked up when tracking starts
        let a = spawn(&mut world, Vec3::zeros(), CollisionShape::cuboid(Vec3::repeat(1.0)));
        system.update(&mut world, &mut events);
        assert_eq!(system.collision_system().collider_count(), 1);

        // Spawned later: picked up through the attach notification
        let b = spawn(&mut world, Vec3::new(1.5, 0.0, 0.0), CollisionShape::sphere(1.0));
        system.update(&mut world, &mut events);
        assert_eq!(system.collision_system().collider_count(), 2);

        let state = world.get_component::<CollisionStateComponent>(a).cloned().unwrap_or_default();
        assert!(state.is_colliding_with(b));
        assert!(state.just_collided_with(b));

        let pairs: Vec<_> = events
            .pending()
            .iter()
            .filter(|e| e.event_type == EventType::CollisionPair)
            .collect();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].get_entity("entity_a"), Some(a));
        assert_eq!(pairs[0].get_entity("entity_b"), Some(b));
        assert_eq!(pairs[0].get_bool("entered"), Some(true));
        events.clear();

        // Move apart
        if let Some(t) = world.get_component_mut::<TransformComponent>(b) {
            t.position = Vec3::new(10.0, 0.0, 0.0);
        }
        system.update(&mut world, &mut events);
        let state = world.get_component::<CollisionStateComponent>(a).cloned().unwrap_or_default();
        assert!(!state.is_colliding());
        assert!(state.just_stopped_colliding_with(b));
        assert!(events.pending().is_empty());

        // Detach
        world.destroy_entity(b);
        system.update(&mut world, &mut events);
        assert_eq!(system.collision_system().collider_count(), 1);
        assert_eq!(system.spatial_query().entity_count(), 1);
    }

    #[test]
    fn test_scale_feeds_world_bounds() {
        let mut world = World::new();
        let mut events = EventSystem::new();
        let mut system = EcsCollisionSystem::with_bvh(&BroadPhaseConfig::default());

        let a = world.create_entity();
        world.add_component(
            a,
            TransformComponent::from_position(Vec3::zeros()).with_scale(Vec3::new(3.0, 1.0, 1.0)),
        );
        world.add_component(a, ColliderComponent::new(CollisionShape::cuboid(Vec3::repeat(1.0))));
        let b = spawn(&mut world, Vec3::new(3.4, 0.0, 0.0), CollisionShape::sphere(0.5));

        system.update(&mut world, &mut events);
        assert_eq!(system.collision_system().current_collisions().len(), 1);
        let bound = system.spatial_query().get_bound(a).unwrap_or_default();
        assert_eq!(bound.max.x, 3.0);
        assert!(system.collision_system().has_collider(b));
    }

    #[test]
    fn test_events_can_be_disabled() {
        let mut world = World::new();
        let mut events = EventSystem::new();
        let config = BroadPhaseConfig {
            publish_events: false,
            ..BroadPhaseConfig::default()
        };
        let mut system = EcsCollisionSystem::with_bvh(&config);
        spawn(&mut world, Vec3::zeros(), CollisionShape::sphere(1.0));
        spawn(&mut world, Vec3::new(0.5, 0.0, 0.0), CollisionShape::sphere(1.0));

        system.update(&mut world, &mut events);
        assert_eq!(system.collision_system().current_collisions().len(), 1);
        assert!(events.pending().is_empty());
    }
}
