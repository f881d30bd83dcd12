//! Abstract spatial query interface for broad-phase collision detection
//!
//! Based on Game Engine Architecture 3rd Edition, Section 13.3.2:
//! "Spatial partitioning schemes... allow us to quickly cull out pairs of
//! objects that cannot possibly be colliding."
//!
//! The collision system only talks to this trait, so the partitioning scheme
//! behind it can change without touching collision code.

use crate::ecs::Entity;
use crate::physics::collision::AABB;
use crate::spatial::bvh::DynamicBvh;
use std::any::Any;

/// Abstract interface for spatial partitioning used in broad-phase collision detection
///
/// GEA 13.3.2: "The broad phase quickly identifies pairs of objects that might
/// be colliding using some kind of spatial partitioning scheme."
pub trait SpatialQuery: Send + Sync {
    /// Insert an entity with its world-space bound
    fn insert(&mut self, entity: Entity, bound: AABB);

    /// Remove an entity from the spatial structure
    fn remove(&mut self, entity: Entity);

    /// Update an entity's bound, inserting it when unknown
    fn update(&mut self, entity: Entity, bound: AABB);

    /// Entities whose bound intersects `bound`
    fn query_aabb(&self, bound: &AABB) -> Vec<Entity>;

    /// Every pair of entities whose bounds intersect, each pair once
    fn collect_pairs(&self) -> Vec<(Entity, Entity)>;

    /// Bound currently stored for an entity
    fn get_bound(&self, entity: Entity) -> Option<AABB>;

    /// Clear all entities from the spatial structure
    fn clear(&mut self);

    /// Get the number of entities in the structure
    fn entity_count(&self) -> usize;

    /// Downcast to Any for type-specific access (e.g., BvhSpatialQuery)
    fn as_any(&self) -> &dyn Any;

    /// Downcast to Any for mutable type-specific access
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// BVH-backed implementation of [`SpatialQuery`]
#[derive(Debug, Default)]
pub struct BvhSpatialQuery {
    bvh: DynamicBvh<Entity>,
}

impl BvhSpatialQuery {
    /// Create an empty BVH spatial query
    pub fn new() -> Self {
        Self { bvh: DynamicBvh::new() }
    }

    /// Get a reference to the underlying tree (diagnostics, debug drawing)
    pub fn bvh(&self) -> &DynamicBvh<Entity> {
        &self.bvh
    }
}

impl SpatialQuery for BvhSpatialQuery {
    fn insert(&mut self, entity: Entity, bound: AABB) {
        // One leaf per entity
        if self.bvh.find_leaf(entity).is_some() {
            self.bvh.update(entity, bound);
        } else {
            self.bvh.insert(entity, bound);
        }
    }

    fn remove(&mut self, entity: Entity) {
        if let Some(leaf) = self.bvh.find_leaf(entity) {
            self.bvh.remove(leaf);
        }
    }

    fn update(&mut self, entity: Entity, bound: AABB) {
        self.bvh.update(entity, bound);
    }

    fn query_aabb(&self, bound: &AABB) -> Vec<Entity> {
        let mut out = Vec::new();
        self.bvh.query(bound, &mut out);
        out
    }

    fn collect_pairs(&self) -> Vec<(Entity, Entity)> {
        let mut out = Vec::new();
        self.bvh.collect_pairs(&mut out);
        out
    }

    fn get_bound(&self, entity: Entity) -> Option<AABB> {
        self.bvh.find_leaf(entity).and_then(|leaf| self.bvh.bound(leaf))
    }

    fn clear(&mut self) {
        self.bvh.clear();
    }

    fn entity_count(&self) -> usize {
        self.bvh.leaf_count()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
