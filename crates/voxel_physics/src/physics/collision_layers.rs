//! Collision layer system for filtering collision detection
//!
//! Based on Game Engine Architecture 3rd Edition, Section 13.3.8:
//! "Most games need to filter collisions... This is typically done via
//! collision layers or groups."

use bitflags::bitflags;

bitflags! {
    /// Collision layer bits.
    ///
    /// A collider sits on one or more layers and carries a mask of the layers
    /// it wants to collide with.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionLayers: u32 {
        /// Player characters
        const PLAYER = 1 << 0;
        /// Non-player characters
        const NPC = 1 << 1;
        /// Projectiles
        const PROJECTILE = 1 << 2;
        /// Static level geometry
        const ENVIRONMENT = 1 << 3;
        /// Trigger volumes (no physical response)
        const TRIGGER = 1 << 4;
        /// Moving platforms and other dynamic voxel bodies
        const PLATFORM = 1 << 5;
        /// Pickups and collectibles
        const PICKUP = 1 << 6;

        // Bits 8..=31 are left for game code
        const _ = !0;
    }
}

impl CollisionLayers {
    /// Check if two colliders should collide based on their layers and masks.
    ///
    /// Filtering is mutual: A's layer must be in B's mask and B's layer must
    /// be in A's mask.
    ///
    /// ```
    /// use voxel_physics::physics::CollisionLayers;
    ///
    /// let player = (CollisionLayers::PLAYER, CollisionLayers::NPC | CollisionLayers::ENVIRONMENT);
    /// let npc = (CollisionLayers::NPC, CollisionLayers::PLAYER);
    /// assert!(CollisionLayers::should_collide(player.0, player.1, npc.0, npc.1));
    /// ```
    pub fn should_collide(
        layer_a: CollisionLayers,
        mask_a: CollisionLayers,
        layer_b: CollisionLayers,
        mask_b: CollisionLayers,
    ) -> bool {
        layer_a.intersects(mask_b) && layer_b.intersects(mask_a)
    }

    /// Custom layer for game code, `index` in `8..32`
    pub fn custom(index: u32) -> Option<CollisionLayers> {
        (8..32).contains(&index).then(|| CollisionLayers::from_bits_retain(1 << index))
    }
}

impl Default for CollisionLayers {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_collide_mutual() {
        assert!(CollisionLayers::should_collide(
            CollisionLayers::PLAYER,
            CollisionLayers::NPC,
            CollisionLayers::NPC,
            CollisionLayers::PLAYER,
        ));
    }

    #[test]
    fn test_should_not_collide_one_way() {
        // Player wants the NPC, the NPC only listens to projectiles
        assert!(!CollisionLayers::should_collide(
            CollisionLayers::PLAYER,
            CollisionLayers::NPC,
            CollisionLayers::NPC,
            CollisionLayers::PROJECTILE,
        ));
    }

    #[test]
    fn test_default_collides_with_everything() {
        let all = CollisionLayers::default();
        assert!(CollisionLayers::should_collide(all, all, CollisionLayers::PICKUP, all));
        assert!(all.contains(CollisionLayers::custom(31).unwrap_or(CollisionLayers::empty())));
    }

    #[test]
    fn test_custom_range() {
        assert_eq!(CollisionLayers::custom(8).map(|l| l.bits()), Some(1 << 8));
        assert!(CollisionLayers::custom(3).is_none());
        assert!(CollisionLayers::custom(32).is_none());
    }
}
