//! Collision detection components for ECS
//!
//! Based on Game Engine Architecture 3rd Edition:
//! - Section 13.3: Collision Detection System
//! - Section 16.2: Component-based architecture

use crate::ecs::{Component, Entity};
use crate::physics::collision::CollisionShape;
use crate::physics::collision_layers::CollisionLayers;
use std::collections::HashSet;

/// Component that marks an entity as taking part in broad-phase collision
///
/// The shape is in model space; the collision system places it using the
/// entity's transform translation and scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ColliderComponent {
    /// The collision shape (box or sphere)
    pub shape: CollisionShape,

    /// Layers this collider is on
    pub layer: CollisionLayers,

    /// Layers this collider can collide with
    pub mask: CollisionLayers,

    /// Is this a trigger volume (generates events but no physical response)?
    pub is_trigger: bool,
}

impl Component for ColliderComponent {}

impl ColliderComponent {
    /// Create a new collider on all layers, colliding with all layers
    pub fn new(shape: CollisionShape) -> Self {
        Self {
            shape,
            layer: CollisionLayers::all(),
            mask: CollisionLayers::all(),
            is_trigger: false,
        }
    }

    /// Create a collider with specific layer and mask
    pub fn with_layers(mut self, layer: CollisionLayers, mask: CollisionLayers) -> Self {
        self.layer = layer;
        self.mask = mask;
        self
    }

    /// Mark this as a trigger volume
    pub fn as_trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }
}

/// Component that tracks the current collision state of an entity
///
/// Following GEA 13.3.10: "Collision event callbacks"
/// Updated each frame by the collision system.
#[derive(Debug, Default, Clone)]
pub struct CollisionStateComponent {
    /// All entities we're currently colliding with
    pub colliding_with: HashSet<Entity>,

    /// Entities we started colliding with this frame (entered collision)
    pub collision_entered: Vec<Entity>,

    /// Entities we stopped colliding with this frame (exited collision)
    pub collision_exited: Vec<Entity>,
}

impl Component for CollisionStateComponent {}

impl CollisionStateComponent {
    /// Check if we're currently colliding with any entity
    pub fn is_colliding(&self) -> bool {
        !self.colliding_with.is_empty()
    }

    /// Check if we're colliding with a specific entity
    pub fn is_colliding_with(&self, entity: Entity) -> bool {
        self.colliding_with.contains(&entity)
    }

    /// Get the number of entities we're colliding with
    pub fn collision_count(&self) -> usize {
        self.colliding_with.len()
    }

    /// Check if we just started colliding with a specific entity this frame
    pub fn just_collided_with(&self, entity: Entity) -> bool {
        self.collision_entered.contains(&entity)
    }

    /// Check if we just stopped colliding with a specific entity this frame
    pub fn just_stopped_colliding_with(&self, entity: Entity) -> bool {
        self.collision_exited.contains(&entity)
    }

    /// Clear per-frame data (called by collision system at start of update)
    pub(crate) fn clear_frame_data(&mut self) {
        self.collision_entered.clear();
        self.collision_exited.clear();
    }
}
