//! # Core Module
//!
//! Shared configuration for the physics subsystems.
//!
//! ## Organization
//!
//! - **Config**: [`PhysicsConfig`] and its per-subsystem groups

pub mod config;

pub use config::{
    BroadPhaseConfig,
    Config,
    ConfigError,
    DynamicBodyConfig,
    PhysicsConfig,
    StepClimbConfig,
    StuckRecoveryConfig,
    VoxelMovementConfig,
};
