//! # Physics Configuration
//!
//! Tuning values for every physics subsystem, grouped per subsystem and
//! collected in [`PhysicsConfig`]. All groups are serde types with
//! `#[serde(default)]`, so a TOML or RON file only needs to name the values it
//! overrides.
//!
//! ## Configuration Categories
//!
//! - **Broad phase**: bound padding and collision event publishing
//! - **Voxel movement**: gravity, sub-stepping and world clamping
//! - **Step climb**: search resolution for climbing ledges
//! - **Dynamic bodies**: push-out limits and platform riding tolerances
//! - **Stuck recovery**: detection thresholds and escape search extents

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

fn require_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be a positive number, got {value}")))
    }
}

fn require_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be zero or positive, got {value}")))
    }
}

/// # Broad-Phase Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadPhaseConfig {
    /// Padding added around every collider bound before it enters the BVH.
    ///
    /// A padded bound still contains the collider after small moves, so the
    /// tree refits in place instead of re-inserting.
    pub bound_margin: f32,
    /// Publish a `CollisionPair` event for every narrow-phase hit
    pub publish_events: bool,
}

impl Default for BroadPhaseConfig {
    fn default() -> Self {
        Self {
            bound_margin: 0.0,
            publish_events: true,
        }
    }
}

impl BroadPhaseConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("broad_phase.bound_margin", self.bound_margin)
    }
}

/// # Voxel Movement Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoxelMovementConfig {
    /// Downward acceleration in units per second squared
    pub gravity: f32,
    /// Upper bound on movement sub-steps per frame
    pub max_substeps: u32,
    /// Largest sub-step as a fraction of one voxel
    pub max_substep_fraction: f32,
    /// Displacements shorter than this are not integrated
    pub min_move_distance: f32,
    /// |normal.y| above which a blocking surface cancels vertical velocity
    pub steep_normal_threshold: f32,
    /// Keep entities inside the horizontal extents and above the floor of the grid
    pub clamp_to_world: bool,
}

impl Default for VoxelMovementConfig {
    fn default() -> Self {
        Self {
            gravity: 20.0,
            max_substeps: 8,
            max_substep_fraction: 0.9,
            min_move_distance: 1.0e-5,
            steep_normal_threshold: 0.5,
            clamp_to_world: true,
        }
    }
}

impl VoxelMovementConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("movement.gravity", self.gravity)?;
        if self.max_substeps == 0 || self.max_substeps > 8 {
            return Err(ConfigError::invalid(
                "movement.max_substeps",
                format!("must be within 1..=8, got {}", self.max_substeps),
            ));
        }
        require_positive("movement.max_substep_fraction", self.max_substep_fraction)?;
        require_non_negative("movement.min_move_distance", self.min_move_distance)?;
        require_non_negative("movement.steep_normal_threshold", self.steep_normal_threshold)
    }
}

/// # Step-Climb Configuration
///
/// Per-entity limits (enabled, maximum height, overshoot) live on the
/// collider component; these values control the search itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepClimbConfig {
    /// Height scanned per search iteration
    pub height_increment: f32,
    /// Number of probe columns across the front face
    pub obstacle_probes: u32,
    /// Thickness of the slab below the feet that counts as support
    pub ground_slab: f32,
    /// Distance under which a smooth climb counts as arrived
    pub arrival_epsilon: f32,
}

impl Default for StepClimbConfig {
    fn default() -> Self {
        Self {
            height_increment: 0.05,
            obstacle_probes: 3,
            ground_slab: 0.05,
            arrival_epsilon: 0.01,
        }
    }
}

impl StepClimbConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("step_climb.height_increment", self.height_increment)?;
        if self.obstacle_probes == 0 {
            return Err(ConfigError::invalid("step_climb.obstacle_probes", "needs at least one probe"));
        }
        require_positive("step_climb.ground_slab", self.ground_slab)?;
        require_positive("step_climb.arrival_epsilon", self.arrival_epsilon)
    }
}

/// # Dynamic-Body Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicBodyConfig {
    /// Largest push applied in one resolution
    pub max_penetration_resolve: f32,
    /// Padding added to every push
    pub skin_width: f32,
    /// Height of the band above a platform's top face that counts as standing on it
    pub rider_band: f32,
    /// Depth of the probe below the feet used for riding detection
    pub rider_probe_depth: f32,
}

impl Default for DynamicBodyConfig {
    fn default() -> Self {
        Self {
            max_penetration_resolve: 0.5,
            skin_width: 0.001,
            rider_band: 0.1,
            rider_probe_depth: 0.05,
        }
    }
}

impl DynamicBodyConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("dynamic_bodies.max_penetration_resolve", self.max_penetration_resolve)?;
        require_non_negative("dynamic_bodies.skin_width", self.skin_width)?;
        require_positive("dynamic_bodies.rider_band", self.rider_band)?;
        require_positive("dynamic_bodies.rider_probe_depth", self.rider_probe_depth)
    }
}

/// # Stuck-Recovery Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StuckRecoveryConfig {
    /// Run stuck detection at all
    pub enabled: bool,
    /// Consecutive stuck frames before an escape is attempted
    pub frame_threshold: u32,
    /// Per-frame displacement below which a moving entity counts as stuck
    pub min_displacement: f32,
    /// Speed above which an entity is expected to move
    pub min_speed: f32,
    /// Distance between escape probes along each direction
    pub escape_step: f32,
    /// Farthest escape probe along each direction
    pub escape_max_distance: f32,
    /// Half extent of the fallback grid search
    pub search_radius: f32,
    /// Score bonus per unit of upward offset in the grid search
    pub upward_bias: f32,
    /// Relocations shorter than this are ignored
    pub min_relocation: f32,
    /// Most lattice cells the grid search visits along each half axis
    pub max_search_reach: u32,
}

impl Default for StuckRecoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frame_threshold: 30,
            min_displacement: 1.0e-3,
            min_speed: 1.0e-3,
            escape_step: 0.5,
            escape_max_distance: 3.0,
            search_radius: 5.0,
            upward_bias: 0.1,
            min_relocation: 0.01,
            max_search_reach: 10,
        }
    }
}

impl StuckRecoveryConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("stuck.min_displacement", self.min_displacement)?;
        require_non_negative("stuck.min_speed", self.min_speed)?;
        require_positive("stuck.escape_step", self.escape_step)?;
        require_positive("stuck.escape_max_distance", self.escape_max_distance)?;
        require_positive("stuck.search_radius", self.search_radius)?;
        require_non_negative("stuck.upward_bias", self.upward_bias)?;
        require_non_negative("stuck.min_relocation", self.min_relocation)?;
        if self.max_search_reach == 0 {
            return Err(ConfigError::invalid("stuck.max_search_reach", "must be at least 1"));
        }
        Ok(())
    }
}

/// # Complete Physics Configuration
///
/// Top-level configuration shared by the collision, movement and platform
/// systems.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Broad-phase settings
    pub broad_phase: BroadPhaseConfig,
    /// Voxel movement settings
    pub movement: VoxelMovementConfig,
    /// Step-climb search settings
    pub step_climb: StepClimbConfig,
    /// Dynamic body and platform riding settings
    pub dynamic_bodies: DynamicBodyConfig,
    /// Stuck detection and escape settings
    pub stuck: StuckRecoveryConfig,
}

impl PhysicsConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.broad_phase.validate()?;
        self.movement.validate()?;
        self.step_climb.validate()?;
        self.dynamic_bodies.validate()?;
        self.stuck.validate()
    }

    /// Load from a `.toml` or `.ron` file and validate the result
    pub fn load_validated(path: &str) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }
}

impl Config for PhysicsConfig {}
