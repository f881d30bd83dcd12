//! # Voxel Physics
//!
//! Collision and movement core for a voxel game engine.
//!
//! ## Features
//!
//! - **Dynamic BVH**: Incrementally maintained bounding-volume hierarchy with
//!   surface-area-heuristic insertion and self-pair collection
//! - **Broad Phase**: ECS-driven collider registration, layer filtering and
//!   exact box/sphere narrow phase
//! - **Voxel Movement**: Sub-stepped sweep/slide resolution, step climbing,
//!   gravity and emergency escape for stuck entities
//! - **Dynamic Bodies**: Moving voxel bodies and platforms that push entities
//!   out and carry riders
//!
//! ## Quick Start
//!
//! ```rust
//! use voxel_physics::prelude::*;
//!
//! let mut grid = VoxelGrid::new(Vec3::zeros(), IVec3::new(16, 16, 16), 1.0);
//! grid.fill(IVec3::new(0, 0, 0), IVec3::new(15, 0, 15), true);
//!
//! let mut world = World::new();
//! let mut events = EventSystem::new();
//! let mut pipeline = PhysicsPipeline::new(PhysicsConfig::default()).unwrap();
//!
//! let player = world.create_entity();
//! world.add_component(player, TransformComponent::from_position(Vec3::new(8.0, 3.0, 8.0)));
//! world.add_component(player, VoxelColliderComponent::new(Vec3::new(0.3, 0.9, 0.3)));
//! world.add_component(player, MovementComponent::with_velocity(Vec3::new(1.0, 0.0, 0.0)));
//!
//! for _ in 0..60 {
//!     pipeline.step(&mut world, &grid, &mut events, 1.0 / 60.0);
//! }
//! events.dispatch();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core modules
pub mod core;
pub mod config;
pub mod foundation;
pub mod events;

// Simulation
pub mod ecs;
pub mod physics;
pub mod spatial;
pub mod pipeline;

pub use pipeline::PhysicsPipeline;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::{Config, ConfigError, PhysicsConfig},
        ecs::{
            components::{
                BodyFlags, ColliderComponent, CollisionStateComponent, DynamicVoxelBodyComponent,
                LadderClimbingComponent, MovementComponent, PlatformComponent, StepClimbSettings,
                TransformComponent, VoxelColliderComponent,
            },
            Component, Entity, World,
        },
        events::{Event, EventArg, EventHandler, EventSystem, EventType},
        foundation::math::{IVec3, Quat, Vec3},
        physics::{
            collision::{CollisionShape, AABB},
            platform_motion::{CircularMotion, LinearMotion, PlatformMotion},
            voxel::{VoxelGrid, VoxelWorld},
            CollisionLayers,
        },
        spatial::{BvhSpatialQuery, DynamicBvh, SpatialQuery},
        PhysicsPipeline,
    };
}
