//! Collision geometry
//!
//! # Module Organization
//!
//! - [`primitives`] - Basic geometric primitives (boxes, spheres, rays)
//! - [`shape`] - ECS-friendly model-space collision shapes
//! - [`sat`] - Separating-axis test and minimum translation vector for boxes
//!
//! Shapes are stored in model space and transformed to world space only when
//! a test needs them.

pub mod primitives;
pub mod shape;
pub mod sat;

pub use primitives::{BoundingSphere, Ray, AABB};
pub use shape::{CollisionShape, ShapeKind, WorldSpaceShape};
pub use sat::{separating_axis_test, SatResult};
