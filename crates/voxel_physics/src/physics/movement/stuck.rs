//! Stuck detection and emergency escape
//!
//! An entity that wants to move but has not moved for a number of frames is
//! relocated to the nearest free spot: first along a fixed set of escape
//! directions, then through a local grid search.

use super::Obstacles;
use crate::core::StuckRecoveryConfig;
use crate::ecs::Entity;
use crate::foundation::math::Vec3;
use crate::physics::collision::AABB;
use std::collections::HashMap;

/// Per-entity stuck counters
#[derive(Debug, Default)]
pub struct StuckTracker {
    last_positions: HashMap<Entity, Vec3>,
    stuck_frames: HashMap<Entity, u32>,
}

impl StuckTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record this frame's position.
    ///
    /// `should_move` tells whether the entity is trying to move. Returns
    /// `true` once the entity has been stuck for more than the configured
    /// number of frames.
    pub fn observe(
        &mut self,
        entity: Entity,
        position: Vec3,
        should_move: bool,
        config: &StuckRecoveryConfig,
    ) -> bool {
        let previous = self.last_positions.insert(entity, position);
        let frames = self.stuck_frames.entry(entity).or_insert(0);

        let barely_moved = previous
            .is_some_and(|p| (position - p).magnitude() < config.min_displacement);
        if should_move && barely_moved {
            *frames += 1;
        } else {
            *frames = 0;
        }
        *frames > config.frame_threshold
    }

    /// Forget the counter after a relocation
    pub fn reset(&mut self, entity: Entity, position: Vec3) {
        self.last_positions.insert(entity, position);
        self.stuck_frames.insert(entity, 0);
    }

    /// Consecutive stuck frames recorded for `entity`
    pub fn stuck_frames(&self, entity: Entity) -> u32 {
        self.stuck_frames.get(&entity).copied().unwrap_or(0)
    }

    /// Drop entries for entities that `keep` rejects
    pub fn retain(&mut self, mut keep: impl FnMut(Entity) -> bool) {
        self.last_positions.retain(|e, _| keep(*e));
        self.stuck_frames.retain(|e, _| keep(*e));
    }

    /// Number of tracked entities
    pub fn len(&self) -> usize {
        self.last_positions.len()
    }

    /// Whether nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.last_positions.is_empty()
    }
}

fn escape_directions() -> [Vec3; 7] {
    let diagonal = std::f32::consts::FRAC_1_SQRT_2;
    [
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(-1.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        Vec3::new(0.0, 0.0, -1.0),
        Vec3::new(diagonal, diagonal, 0.0),
        Vec3::new(-diagonal, diagonal, 0.0),
    ]
}

/// Find an offset that moves `aabb` somewhere free.
///
/// Escape directions are tried nearest distance first; when none is free a
/// cube of `search_radius` around the box is scanned at `voxel_size` steps,
/// preferring short, upward offsets. Fine grids are scanned on a coarser
/// lattice so no more than `max_search_reach` cells lie along a half axis.
pub fn find_escape(
    obstacles: &Obstacles<'_>,
    aabb: &AABB,
    config: &StuckRecoveryConfig,
) -> Option<Vec3> {
    let tiers = (config.escape_max_distance / config.escape_step).floor() as u32;
    for tier in 1..=tiers {
        let distance = tier as f32 * config.escape_step;
        for direction in escape_directions() {
            let offset = direction * distance;
            if !obstacles.is_blocked(&aabb.translated(offset)) {
                log::debug!("Escape along {direction:?} at distance {distance}");
                return Some(offset);
            }
        }
    }

    grid_search(obstacles, aabb, config)
}

/// Cells per half axis and their spacing for a grid search
fn search_lattice(radius: f32, voxel_size: f32, max_reach: u32) -> Option<(i32, f32)> {
    if voxel_size <= 0.0 || radius <= 0.0 || max_reach == 0 {
        return None;
    }
    let cells = (radius / voxel_size).floor() as u32;
    if cells == 0 {
        return None;
    }
    if cells <= max_reach {
        Some((cells as i32, voxel_size))
    } else {
        // Stay on voxel multiples so candidates line up with the grid
        let stride = (radius / (max_reach as f32 * voxel_size)).ceil();
        let step = stride * voxel_size;
        Some((((radius / step).floor() as i32).max(1), step))
    }
}

fn grid_search(obstacles: &Obstacles<'_>, aabb: &AABB, config: &StuckRecoveryConfig) -> Option<Vec3> {
    let voxel_size = obstacles.world.grid_info().voxel_size;
    let (reach, step) = search_lattice(config.search_radius, voxel_size, config.max_search_reach)?;

    let mut best: Option<(f32, Vec3)> = None;
    for x in -reach..=reach {
        for y in -reach..=reach {
            for z in -reach..=reach {
                let offset = Vec3::new(x as f32, y as f32, z as f32) * step;
                if offset.magnitude() <= config.min_relocation {
                    continue;
                }
                let score = offset.magnitude_squared() - config.upward_bias * offset.y;
                if best.is_some_and(|(s, _)| s <= score) {
                    continue;
                }
                if !obstacles.is_blocked(&aabb.translated(offset)) {
                    best = Some((score, offset));
                }
            }
        }
    }

    if let Some((_, offset)) = best {
        log::debug!("Escape by grid search to offset {offset:?}");
    }
    best.map(|(_, offset)| offset)
}
