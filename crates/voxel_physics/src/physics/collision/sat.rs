//! Separating-axis test for axis-aligned boxes
//!
//! For two AABBs the only candidate separating axes are the three world
//! axes. On each axis the penetration is measured from both sides; a
//! non-positive value on any axis means the boxes are separated. Otherwise the
//! smallest penetration over all six (axis, side) options is the minimum
//! translation vector.

use crate::foundation::math::Vec3;
use super::primitives::AABB;

/// Result of a successful separating-axis test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatResult {
    /// Unit axis direction that moves the first box out of the second
    pub normal: Vec3,
    /// Penetration depth along `normal` (always > 0)
    pub depth: f32,
}

impl SatResult {
    /// Minimum translation vector for the first box
    pub fn mtv(&self) -> Vec3 {
        self.normal * self.depth
    }

    /// Whether the push is along the vertical axis
    pub fn is_vertical(&self) -> bool {
        self.normal.y != 0.0
    }
}

/// Test `a` against `b` and return the push that separates `a` from `b`.
///
/// Boxes that only touch (zero penetration) are not reported: there is
/// nothing to resolve. Ties between axes keep the earlier axis (X, Y, Z) and,
/// on one axis, the positive side.
pub fn separating_axis_test(a: &AABB, b: &AABB) -> Option<SatResult> {
    let mut best: Option<SatResult> = None;

    for axis in 0..3 {
        // Push `a` toward +axis until its min meets b.max
        let push_positive = b.max[axis] - a.min[axis];
        // Push `a` toward -axis until its max meets b.min
        let push_negative = a.max[axis] - b.min[axis];

        if push_positive <= 0.0 || push_negative <= 0.0 {
            return None;
        }

        let (depth, sign) = if push_positive <= push_negative {
            (push_positive, 1.0)
        } else {
            (push_negative, -1.0)
        };

        if best.map_or(true, |b| depth < b.depth) {
            let mut normal = Vec3::zeros();
            normal[axis] = sign;
            best = Some(SatResult { normal, depth });
        }
    }

    best
}
