//! ECS Systems module

pub mod collision_system;
pub mod platform_system;
pub mod voxel_collision_system;

pub use collision_system::EcsCollisionSystem;
pub use platform_system::PlatformMotionSystem;
pub use voxel_collision_system::VoxelCollisionSystem;
