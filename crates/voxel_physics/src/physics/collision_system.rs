//! Core collision detection system
//!
//! Based on Game Engine Architecture 3rd Edition, Chapter 13:
//! "The collision detection system is typically split into two phases:
//! broad-phase and narrow-phase."
//!
//! This module implements a pure collision system that doesn't depend on ECS,
//! allowing it to be used in different contexts. The ECS wrapper is in
//! ecs/systems/collision_system.rs

use crate::ecs::Entity;
use crate::physics::collision::{WorldSpaceShape, AABB};
use crate::physics::collision_layers::CollisionLayers;
use crate::spatial::spatial_query::SpatialQuery;
use std::collections::{HashMap, HashSet};

/// Collision pair representing two entities that are colliding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollisionPair {
    /// Smaller of the two entities
    pub entity_a: Entity,
    /// Larger of the two entities
    pub entity_b: Entity,
}

impl CollisionPair {
    /// Create a new collision pair (always stores the smaller entity first for consistency)
    pub fn new(entity_a: Entity, entity_b: Entity) -> Self {
        if entity_a <= entity_b {
            Self { entity_a, entity_b }
        } else {
            Self { entity_a: entity_b, entity_b: entity_a }
        }
    }

    /// The other member of the pair, `None` if `entity` is not part of it
    pub fn other(&self, entity: Entity) -> Option<Entity> {
        if entity == self.entity_a {
            Some(self.entity_b)
        } else if entity == self.entity_b {
            Some(self.entity_a)
        } else {
            None
        }
    }
}

/// Collider data stored by the collision system
#[derive(Debug, Clone)]
struct ColliderData {
    shape: WorldSpaceShape,
    layer: CollisionLayers,
    mask: CollisionLayers,
    is_trigger: bool,
}

/// Core collision detection system (GEA 13.3)
///
/// This system manages collision detection between entities using a two-phase
/// approach: broad-phase (spatial query) and narrow-phase (shape intersection).
pub struct PhysicsCollisionSystem {
    /// Spatial partitioning structure for broad-phase
    spatial_query: Box<dyn SpatialQuery>,

    /// Collider data for each entity
    colliders: HashMap<Entity, ColliderData>,

    /// Collision pairs from the current frame
    current_pairs: HashSet<CollisionPair>,

    /// Collision pairs from the previous frame
    previous_pairs: HashSet<CollisionPair>,

    /// Padding added around bounds stored in the spatial structure
    bound_margin: f32,

    /// Broad-phase candidates seen by the last detection pass
    candidate_count: usize,
}

impl PhysicsCollisionSystem {
    /// Create a new collision system with the given spatial query implementation
    pub fn new(spatial_query: Box<dyn SpatialQuery>) -> Self {
        Self {
            spatial_query,
            colliders: HashMap::new(),
            current_pairs: HashSet::new(),
            previous_pairs: HashSet::new(),
            bound_margin: 0.0,
            candidate_count: 0,
        }
    }

    /// Builder pattern: Pad stored bounds by `margin`.
    ///
    /// With a margin, a collider whose tight bound still fits inside its
    /// stored bound is not touched at all during [`update_collider`](Self::update_collider).
    pub fn with_bound_margin(mut self, margin: f32) -> Self {
        self.bound_margin = margin.max(0.0);
        self
    }

    fn stored_bound(&self, shape: &WorldSpaceShape) -> AABB {
        shape.aabb().expanded(self.bound_margin)
    }

    /// Register a collider (called when ColliderComponent is added to an entity)
    pub fn register_collider(
        &mut self,
        entity: Entity,
        shape: WorldSpaceShape,
        layer: CollisionLayers,
        mask: CollisionLayers,
        is_trigger: bool,
    ) {
        self.spatial_query.insert(entity, self.stored_bound(&shape));
        self.colliders.insert(entity, ColliderData {
            shape,
            layer,
            mask,
            is_trigger,
        });
        log::trace!("Registered collider for {}", entity);
    }

    /// Unregister a collider (called when ColliderComponent is removed)
    pub fn unregister_collider(&mut self, entity: Entity) {
        self.spatial_query.remove(entity);
        if self.colliders.remove(&entity).is_some() {
            log::trace!("Unregistered collider for {}", entity);
        }
    }

    /// Update a registered collider's world shape and filtering.
    ///
    /// Returns `false` when the entity has no registered collider.
    pub fn update_collider(
        &mut self,
        entity: Entity,
        shape: WorldSpaceShape,
        layer: CollisionLayers,
        mask: CollisionLayers,
    ) -> bool {
        let Some(collider) = self.colliders.get_mut(&entity) else {
            return false;
        };
        collider.shape = shape;
        collider.layer = layer;
        collider.mask = mask;

        let tight = shape.aabb();
        let still_fits = self.bound_margin > 0.0
            && self
                .spatial_query
                .get_bound(entity)
                .is_some_and(|stored| stored.contains(&tight));
        if !still_fits {
            let bound = self.stored_bound(&shape);
            self.spatial_query.update(entity, bound);
        }
        true
    }

    /// Perform collision detection update (broad-phase + narrow-phase)
    /// Returns collision pairs for this frame
    pub fn detect_collisions(&mut self) -> &HashSet<CollisionPair> {
        // Move current pairs to previous
        std::mem::swap(&mut self.current_pairs, &mut self.previous_pairs);
        self.current_pairs.clear();

        // Phase 1: Broad-phase - overlapping bounds from the spatial structure
        let candidates = self.broad_phase();
        self.candidate_count = candidates.len();

        // Phase 2: Narrow-phase - test actual shape intersections
        self.narrow_phase(candidates);

        log::debug!(
            "Collision detection: {} candidates, {} contacts",
            self.candidate_count,
            self.current_pairs.len()
        );
        &self.current_pairs
    }

    /// Broad-phase: every pair of overlapping bounds, filtered by layer
    /// GEA 13.3.1: "The broad phase quickly identifies pairs of objects that
    /// might be colliding using some kind of spatial partitioning scheme."
    fn broad_phase(&self) -> Vec<CollisionPair> {
        self.spatial_query
            .collect_pairs()
            .into_iter()
            .filter(|&(a, b)| {
                match (self.colliders.get(&a), self.colliders.get(&b)) {
                    (Some(ca), Some(cb)) => {
                        CollisionLayers::should_collide(ca.layer, ca.mask, cb.layer, cb.mask)
                    }
                    // Stale entries are dropped in the narrow phase
                    _ => true,
                }
            })
            .map(|(a, b)| CollisionPair::new(a, b))
            .collect()
    }

    /// Narrow-phase: Test actual shape intersections
    /// GEA 13.3.4: "The narrow phase performs detailed shape-to-shape tests"
    fn narrow_phase(&mut self, candidates: Vec<CollisionPair>) {
        for pair in candidates {
            let (Some(a), Some(b)) = (
                self.colliders.get(&pair.entity_a),
                self.colliders.get(&pair.entity_b),
            ) else {
                log::debug!(
                    "Skipping pair ({}, {}) without a registered shape",
                    pair.entity_a,
                    pair.entity_b
                );
                continue;
            };

            if a.shape.intersects(&b.shape) {
                self.current_pairs.insert(pair);
            }
        }
    }

    /// Pairs that started colliding this frame, in entity order
    pub fn collision_entered(&self) -> Vec<CollisionPair> {
        let mut pairs: Vec<_> = self
            .current_pairs
            .difference(&self.previous_pairs)
            .copied()
            .collect();
        pairs.sort();
        pairs
    }

    /// Pairs that stopped colliding this frame, in entity order
    pub fn collision_exited(&self) -> Vec<CollisionPair> {
        let mut pairs: Vec<_> = self
            .previous_pairs
            .difference(&self.current_pairs)
            .copied()
            .collect();
        pairs.sort();
        pairs
    }

    /// Get all current collision pairs
    pub fn current_collisions(&self) -> &HashSet<CollisionPair> {
        &self.current_pairs
    }

    /// Whether either side of the pair is a trigger volume
    pub fn is_trigger_pair(&self, pair: &CollisionPair) -> bool {
        [pair.entity_a, pair.entity_b]
            .iter()
            .any(|e| self.colliders.get(e).is_some_and(|c| c.is_trigger))
    }

    /// Number of broad-phase candidates in the last detection pass
    pub fn candidate_count(&self) -> usize {
        self.candidate_count
    }

    /// Get spatial query for direct access
    pub fn spatial_query(&self) -> &dyn SpatialQuery {
        self.spatial_query.as_ref()
    }

    /// Get world-space collider shape for an entity
    pub fn get_collider_shape(&self, entity: Entity) -> Option<&WorldSpaceShape> {
        self.colliders.get(&entity).map(|c| &c.shape)
    }

    /// Check if an entity is registered
    pub fn has_collider(&self, entity: Entity) -> bool {
        self.colliders.contains_key(&entity)
    }

    /// Get the number of registered colliders
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    /// Clear all collision data
    pub fn clear(&mut self) {
        self.spatial_query.clear();
        self.colliders.clear();
        self.current_pairs.clear();
        self.previous_pairs.clear();
        self.candidate_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::physics::collision::CollisionShape;
    use crate::spatial::BvhSpatialQuery;

    fn create_test_system() -> PhysicsCollisionSystem {
        PhysicsCollisionSystem::new(Box::new(BvhSpatialQuery::new()))
    }

    fn sphere_at(x: f32, radius: f32) -> WorldSpaceShape {
        CollisionShape::sphere(radius).to_world_space(Vec3::new(x, 0.0, 0.0), Vec3::repeat(1.0))
    }

    fn box_at(x: f32, half: f32) -> WorldSpaceShape {
        CollisionShape::cuboid(Vec3::repeat(half)).to_world_space(Vec3::new(x, 0.0, 0.0), Vec3::repeat(1.0))
    }

    #[test]
    fn test_collision_detection() {
        let mut system = create_test_system();
        let entity_a = Entity::new(1, 0);
        let entity_b = Entity::new(2, 0);
        let all = CollisionLayers::all();

        system.register_collider(entity_a, sphere_at(0.0, 5.0), all, all, false);
        system.register_collider(entity_b, sphere_at(8.0, 5.0), all, all, false);

        let collisions = system.detect_collisions();
        assert_eq!(collisions.len(), 1);
        assert!(collisions.contains(&CollisionPair::new(entity_b, entity_a)));
    }

    #[test]
    fn test_layer_filtering() {
        let mut system = create_test_system();
        let entity_a = Entity::new(1, 0);
        let entity_b = Entity::new(2, 0);

        // A only collides with NPCs, B sits on the environment layer
        system.register_collider(
            entity_a,
            sphere_at(0.0, 5.0),
            CollisionLayers::PLAYER,
            CollisionLayers::NPC,
            false,
        );
        system.register_collider(
            entity_b,
            sphere_at(8.0, 5.0),
            CollisionLayers::ENVIRONMENT,
            CollisionLayers::all(),
            false,
        );

        assert!(system.detect_collisions().is_empty());
    }

    #[test]
    fn test_narrow_phase_rejects_bound_only_overlap() {
        let mut system = create_test_system();
        let all = CollisionLayers::all();
        // Bounds overlap at the corner, the spheres do not
        let a = CollisionShape::sphere(1.0).to_world_space(Vec3::zeros(), Vec3::repeat(1.0));
        let b = CollisionShape::sphere(1.0).to_world_space(Vec3::new(1.8, 1.8, 0.0), Vec3::repeat(1.0));
        system.register_collider(Entity::new(0, 0), a, all, all, false);
        system.register_collider(Entity::new(1, 0), b, all, all, false);

        assert!(system.detect_collisions().is_empty());
        assert_eq!(system.candidate_count(), 1);
    }

    #[test]
    fn test_face_contact_box_and_sphere() {
        let mut system = create_test_system();
        let all = CollisionLayers::all();
        system.register_collider(Entity::new(0, 0), box_at(0.0, 1.0), all, all, false);
        system.register_collider(Entity::new(1, 0), sphere_at(2.0, 1.0), all, all, true);

        let pairs: Vec<_> = system.detect_collisions().iter().copied().collect();
        assert_eq!(pairs.len(), 1);
        assert!(system.is_trigger_pair(&pairs[0]));
    }

    #[test]
    fn test_enter_and_exit_tracking() {
        let mut system = create_test_system();
        let all = CollisionLayers::all();
        let a = Entity::new(0, 0);
        let b = Entity::new(1, 0);
        system.register_collider(a, box_at(0.0, 1.0), all, all, false);
        system.register_collider(b, box_at(10.0, 1.0), all, all, false);

        system.detect_collisions();
        assert!(system.collision_entered().is_empty());

        assert!(system.update_collider(b, box_at(1.5, 1.0), all, all));
        system.detect_collisions();
        assert_eq!(system.collision_entered(), vec![CollisionPair::new(a, b)]);

        system.detect_collisions();
        assert!(system.collision_entered().is_empty());
        assert!(system.collision_exited().is_empty());

        system.update_collider(b, box_at(10.0, 1.0), all, all);
        system.detect_collisions();
        assert_eq!(system.collision_exited(), vec![CollisionPair::new(a, b)]);
    }

    #[test]
    fn test_unregistered_entities_are_ignored() {
        let mut system = create_test_system();
        let all = CollisionLayers::all();
        let a = Entity::new(0, 0);
        system.register_collider(a, box_at(0.0, 1.0), all, all, false);
        system.register_collider(Entity::new(1, 0), box_at(0.5, 1.0), all, all, false);
        system.unregister_collider(Entity::new(1, 0));

        assert!(!system.update_collider(Entity::new(7, 0), box_at(0.0, 1.0), all, all));
        assert!(system.detect_collisions().is_empty());
        assert_eq!(system.collider_count(), 1);
        assert!(system.has_collider(a));
    }

    #[test]
    fn test_margin_skips_small_moves() {
        let mut system = create_test_system().with_bound_margin(0.5);
        let all = CollisionLayers::all();
        let a = Entity::new(0, 0);
        system.register_collider(a, box_at(0.0, 1.0), all, all, false);
        let stored = system.spatial_query().get_bound(a);

        system.update_collider(a, box_at(0.25, 1.0), all, all);
        assert_eq!(system.spatial_query().get_bound(a), stored);

        system.update_collider(a, box_at(2.0, 1.0), all, all);
        assert_ne!(system.spatial_query().get_bound(a), stored);
        assert!(matches!(system.get_collider_shape(a), Some(WorldSpaceShape::Box(_))));
    }
}
