//! Physics frame pipeline
//!
//! Runs the physics systems in a fixed order once per frame:
//!
//! 1. Platform motion, then dynamic-body velocity derivation
//! 2. Broad phase: BVH refresh, pair collection, narrow phase, collision events
//! 3. Voxel colliders: movement, push-out, riding, clamping, stuck recovery
//!
//! Events are only queued; the caller decides when to dispatch them.

use crate::core::{ConfigError, PhysicsConfig};
use crate::ecs::systems::{EcsCollisionSystem, PlatformMotionSystem, VoxelCollisionSystem};
use crate::ecs::World;
use crate::events::EventSystem;
use crate::foundation::time::SimulationClock;
use crate::physics::voxel::VoxelWorld;
use crate::spatial::SpatialQuery;

/// Owns the physics systems and steps them in order
pub struct PhysicsPipeline {
    config: PhysicsConfig,
    clock: SimulationClock,
    platforms: PlatformMotionSystem,
    collisions: EcsCollisionSystem,
    voxels: VoxelCollisionSystem,
}

impl PhysicsPipeline {
    /// Create a pipeline with a BVH broad phase
    pub fn new(config: PhysicsConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let collisions = EcsCollisionSystem::with_bvh(&config.broad_phase);
        Ok(Self::assemble(config, collisions))
    }

    /// Create a pipeline with a custom broad-phase structure
    pub fn with_spatial_query(
        config: PhysicsConfig,
        spatial_query: Box<dyn SpatialQuery>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let collisions = EcsCollisionSystem::new(spatial_query, &config.broad_phase);
        Ok(Self::assemble(config, collisions))
    }

    fn assemble(config: PhysicsConfig, collisions: EcsCollisionSystem) -> Self {
        Self {
            config,
            clock: SimulationClock::new(),
            platforms: PlatformMotionSystem::new(),
            collisions,
            voxels: VoxelCollisionSystem::new(),
        }
    }

    /// Advance the simulation by `dt` seconds
    pub fn step(
        &mut self,
        world: &mut World,
        voxel_world: &dyn VoxelWorld,
        events: &mut EventSystem,
        dt: f32,
    ) {
        self.clock.advance(dt);
        events.update_time(self.clock.total_time());

        self.platforms.update(world, dt);
        self.collisions.update(world, events);
        self.voxels.update(world, voxel_world, events, &self.config, dt);

        log::trace!(
            "Physics frame {} done, {} events pending",
            self.clock.frame_count(),
            events.pending().len()
        );
    }

    /// Active configuration
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Simulation time
    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    /// Platform motion system, for spawning platforms
    pub fn platforms_mut(&mut self) -> &mut PlatformMotionSystem {
        &mut self.platforms
    }

    /// Broad-phase collision system
    pub fn collisions(&self) -> &EcsCollisionSystem {
        &self.collisions
    }

    /// Voxel collision system
    pub fn voxels(&self) -> &VoxelCollisionSystem {
        &self.voxels
    }
}
