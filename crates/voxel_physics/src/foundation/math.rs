//! Math utilities and types
//!
//! Provides the fundamental math types used by the collision core. All
//! vectors are `f32` nalgebra types; rotations are unit quaternions.

pub use nalgebra::{Quaternion, Unit, UnitQuaternion, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Integer voxel coordinate
pub type IVec3 = Vector3<i32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Generic tolerance for "is this effectively zero" checks
    pub const EPSILON: f32 = 1.0e-6;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Quat, Vec3};

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Wrap an angle into `[0, TAU)`
    pub fn wrap_angle(angle: f32) -> f32 {
        let wrapped = angle.rem_euclid(constants::TAU);
        // rem_euclid can round up to exactly TAU for tiny negative inputs
        if wrapped >= constants::TAU {
            0.0
        } else {
            wrapped
        }
    }

    /// Normalize a vector, returning zero for degenerate input instead of NaN
    pub fn safe_normalize(v: Vec3) -> Vec3 {
        let len_sq = v.magnitude_squared();
        if len_sq > constants::EPSILON * constants::EPSILON {
            v / len_sq.sqrt()
        } else {
            Vec3::zeros()
        }
    }

    /// Horizontal (XZ) part of a vector
    pub fn horizontal(v: Vec3) -> Vec3 {
        Vec3::new(v.x, 0.0, v.z)
    }

    /// Derive a linear velocity from a position delta over `dt`.
    ///
    /// Returns zero when `dt` is too small to divide by.
    pub fn velocity_from_delta(previous: Vec3, current: Vec3, dt: f32) -> Vec3 {
        if dt <= constants::EPSILON {
            return Vec3::zeros();
        }
        (current - previous) / dt
    }

    /// Derive an angular velocity (axis * rad/s) from a rotation delta over `dt`.
    ///
    /// The axis is extracted from the delta quaternion's vector part divided by
    /// `sin(angle / 2)`; when that sine is near zero (no rotation) or `dt` is
    /// near zero the result is the zero vector.
    pub fn angular_velocity_from_delta(previous: &Quat, current: &Quat, dt: f32) -> Vec3 {
        if dt <= constants::EPSILON {
            return Vec3::zeros();
        }

        let mut delta = (current * previous.inverse()).into_inner();
        // Take the short way around
        if delta.w < 0.0 {
            delta = -delta;
        }

        let w = delta.w.clamp(-1.0, 1.0);
        let angle = 2.0 * w.acos();
        let sin_half = (1.0 - w * w).max(0.0).sqrt();
        if sin_half < 1.0e-4 {
            return Vec3::zeros();
        }

        let axis = Vec3::new(delta.i, delta.j, delta.k) / sin_half;
        axis * (angle / dt)
    }
}
