//! Platform riding
//!
//! Tracks which entities stand on which platform and carries them along
//! with the platform's translation and, when enabled, its rotation. An
//! entity may stand on several platforms at once; each one carries it.

use super::dynamic_body::BodySnapshot;
use crate::core::DynamicBodyConfig;
use crate::ecs::components::BodyFlags;
use crate::ecs::Entity;
use crate::foundation::math::{Quat, Vec3};
use crate::physics::collision::AABB;
use crate::physics::voxel::grid::CONTACT_TOLERANCE;
use std::collections::{BTreeMap, BTreeSet};

/// Platform entity to the set of entities riding it
#[derive(Debug, Default, Clone)]
pub struct RiderTable {
    riders: BTreeMap<Entity, BTreeSet<Entity>>,
}

impl RiderTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `rider` on `platform`, returning `true` if it was not riding it yet
    pub fn insert(&mut self, platform: Entity, rider: Entity) -> bool {
        self.riders.entry(platform).or_default().insert(rider)
    }

    /// Unregister `rider` from `platform`, returning `true` if it was riding it
    pub fn remove(&mut self, platform: Entity, rider: Entity) -> bool {
        let Some(set) = self.riders.get_mut(&platform) else {
            return false;
        };
        let removed = set.remove(&rider);
        if set.is_empty() {
            self.riders.remove(&platform);
        }
        removed
    }

    /// Whether `rider` stands on `platform`
    pub fn rides(&self, platform: Entity, rider: Entity) -> bool {
        self.riders.get(&platform).is_some_and(|set| set.contains(&rider))
    }

    /// Whether `rider` stands on any platform
    pub fn is_riding(&self, rider: Entity) -> bool {
        self.riders.values().any(|set| set.contains(&rider))
    }

    /// Riders of `platform`
    pub fn riders_of(&self, platform: Entity) -> impl Iterator<Item = Entity> + '_ {
        self.riders.get(&platform).into_iter().flat_map(|set| set.iter().copied())
    }

    /// Platforms `rider` stands on
    pub fn platforms_of(&self, rider: Entity) -> Vec<Entity> {
        self.riders
            .iter()
            .filter(|(_, set)| set.contains(&rider))
            .map(|(platform, _)| *platform)
            .collect()
    }

    /// Remove every (platform, rider) entry that `keep` rejects and return them
    pub fn retain(&mut self, mut keep: impl FnMut(Entity, Entity) -> bool) -> Vec<(Entity, Entity)> {
        let mut dropped = Vec::new();
        for (platform, set) in &mut self.riders {
            set.retain(|rider| {
                let kept = keep(*platform, *rider);
                if !kept {
                    dropped.push((*platform, *rider));
                }
                kept
            });
        }
        self.riders.retain(|_, set| !set.is_empty());
        dropped
    }

    /// Number of (platform, rider) entries
    pub fn len(&self) -> usize {
        self.riders.values().map(BTreeSet::len).sum()
    }

    /// Whether nobody rides anything
    pub fn is_empty(&self) -> bool {
        self.riders.is_empty()
    }

    /// Forget every rider
    pub fn clear(&mut self) {
        self.riders.clear();
    }
}

/// Whether a collider box stands on a platform body.
///
/// The foot probe must overlap the platform horizontally and the feet must
/// sit in a band just above the top face. The band grows by the platform's
/// vertical travel this frame, since the platform has already moved.
pub fn is_standing_on(aabb: &AABB, body: &BodySnapshot, dt: f32, config: &DynamicBodyConfig) -> bool {
    if !body.flags.contains(BodyFlags::PLATFORM) {
        return false;
    }

    let horizontal = [0, 2].iter().all(|&axis| {
        aabb.max[axis] > body.bound.min[axis] + CONTACT_TOLERANCE
            && aabb.min[axis] < body.bound.max[axis] - CONTACT_TOLERANCE
    });
    if !horizontal {
        return false;
    }

    let travel = (body.velocity.y * dt).abs();
    let above_top = aabb.min.y - body.top();
    above_top >= -(config.rider_probe_depth + travel) && above_top <= config.rider_band + travel
}

/// Move a rider with its platform for one frame.
///
/// Returns the new rider position; `rotation` is turned with the platform
/// when the platform carries rotation. The rider never ends below the top
/// face.
pub fn carry_rider(
    position: Vec3,
    rotation: Option<&mut Quat>,
    feet_offset: f32,
    body: &BodySnapshot,
    dt: f32,
) -> Vec3 {
    let mut carried = position + body.velocity * dt;

    if body.flags.contains(BodyFlags::CARRY_ROTATION) && body.frame_rotation.angle() > 1.0e-6 {
        let relative = carried - body.center;
        carried = body.center + body.frame_rotation * relative;
        if let Some(rotation) = rotation {
            *rotation = body.frame_rotation * *rotation;
        }
    }

    let lowest = body.top() + feet_offset;
    carried.y = carried.y.max(lowest);
    carried
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::DynamicVoxelBodyComponent;
    use approx::assert_relative_eq;

    const DT: f32 = 0.1;

    /// 4x0.5x4 platform centered at `center`, moved from `previous`
    fn moving_platform(previous: Vec3, center: Vec3, flags: BodyFlags) -> BodySnapshot {
        let mut body = DynamicVoxelBodyComponent::new_box(Vec3::new(2.0, 0.25, 2.0), 1.0).with_flags(flags);
        body.sync_from_transform(previous, Quat::identity(), DT);
        body.sync_from_transform(center, Quat::identity(), DT);
        BodySnapshot::capture(Entity::new(5, 0), &body)
    }

    fn feet_box(x: f32, feet: f32, z: f32) -> AABB {
        AABB::new(Vec3::new(x - 0.3, feet, z - 0.3), Vec3::new(x + 0.3, feet + 1.0, z + 0.3))
    }

    #[test]
    fn test_table_bookkeeping() {
        let mut table = RiderTable::new();
        let (p1, p2, r) = (Entity::new(1, 0), Entity::new(2, 0), Entity::new(3, 0));
        assert!(table.insert(p1, r));
        assert!(!table.insert(p1, r));
        assert!(table.insert(p2, r));
        assert_eq!(table.platforms_of(r), vec![p1, p2]);
        assert_eq!(table.len(), 2);

        assert!(table.remove(p1, r));
        assert!(!table.rides(p1, r));
        assert!(table.is_riding(r));

        let dropped = table.retain(|platform, _| platform != p2);
        assert_eq!(dropped, vec![(p2, r)]);
        assert!(table.is_empty());
        assert_eq!(table.riders_of(p2).count(), 0);
    }

    #[test]
    fn test_standing_band() {
        let body = moving_platform(Vec3::zeros(), Vec3::zeros(), BodyFlags::PLATFORM);
        let config = DynamicBodyConfig::default();
        // Top face at 0.25
        assert!(is_standing_on(&feet_box(0.0, 0.25, 0.0), &body, DT, &config));
        assert!(is_standing_on(&feet_box(1.5, 0.3, -1.5), &body, DT, &config));
        assert!(!is_standing_on(&feet_box(0.0, 0.5, 0.0), &body, DT, &config));
        assert!(!is_standing_on(&feet_box(0.0, 0.1, 0.0), &body, DT, &config));
        // Off the edge
        assert!(!is_standing_on(&feet_box(2.3, 0.25, 0.0), &body, DT, &config));

        let not_platform = moving_platform(Vec3::zeros(), Vec3::zeros(), BodyFlags::PUSH_ENTITIES);
        assert!(!is_standing_on(&feet_box(0.0, 0.25, 0.0), &not_platform, DT, &config));
    }

    #[test]
    fn test_band_follows_platform_travel() {
        // Rose by 0.3 this frame, the rider has not been carried yet
        let body = moving_platform(Vec3::zeros(), Vec3::new(0.0, 0.3, 0.0), BodyFlags::PLATFORM);
        let config = DynamicBodyConfig::default();
        assert!(is_standing_on(&feet_box(0.0, 0.25, 0.0), &body, DT, &config));
    }

    #[test]
    fn test_carry_translation_and_floor() {
        let body = moving_platform(Vec3::zeros(), Vec3::new(0.5, -0.2, 0.0), BodyFlags::PLATFORM);
        let carried = carry_rider(Vec3::new(1.0, 0.75, 0.0), None, 0.5, &body, DT);
        assert_relative_eq!(carried, Vec3::new(1.5, 0.55, 0.0), epsilon = 1.0e-5);

        // Rising platform: never leave the rider inside it
        let body = moving_platform(Vec3::zeros(), Vec3::new(0.0, 0.2, 0.0), BodyFlags::PLATFORM);
        let carried = carry_rider(Vec3::new(0.0, 0.6, 0.0), None, 0.5, &body, DT);
        assert!(carried.y >= body.top() + 0.5 - 1.0e-6);
    }

    #[test]
    fn test_carry_rotation_about_center() {
        let mut body = DynamicVoxelBodyComponent::new_box(Vec3::new(2.0, 0.25, 2.0), 1.0)
            .with_flags(BodyFlags::PLATFORM | BodyFlags::CARRY_ROTATION);
        let quarter = Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::FRAC_PI_2);
        body.sync_from_transform(Vec3::zeros(), Quat::identity(), DT);
        body.sync_from_transform(Vec3::zeros(), quarter, DT);
        let snapshot = BodySnapshot::capture(Entity::new(5, 0), &body);

        let mut rider_rotation = Quat::identity();
        let carried = carry_rider(Vec3::new(1.0, 0.75, 0.0), Some(&mut rider_rotation), 0.5, &snapshot, DT);
        assert_relative_eq!(carried, Vec3::new(0.0, 0.75, -1.0), epsilon = 1.0e-5);
        assert_relative_eq!(rider_rotation.angle(), std::f32::consts::FRAC_PI_2, epsilon = 1.0e-5);

        // Without the flag only translation applies
        let mut plain = snapshot.clone();
        plain.flags = BodyFlags::PLATFORM;
        let carried = carry_rider(Vec3::new(1.0, 0.75, 0.0), None, 0.5, &plain, DT);
        assert_relative_eq!(carried, Vec3::new(1.0, 0.75, 0.0), epsilon = 1.0e-5);
    }
}
