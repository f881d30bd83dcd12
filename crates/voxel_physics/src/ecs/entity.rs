//! Entity implementation
//!
//! Entities are keys of the world's slot map. A destroyed entity's slot is
//! reused with a new version, so a stale handle never resolves to a live
//! entity.

use slotmap::{Key, KeyData};

slotmap::new_key_type! {
    /// Entity identifier
    pub struct Entity;
}

impl Entity {
    /// Rebuild a handle from a slot index and version
    pub fn new(id: u32, generation: u32) -> Self {
        Self::from(KeyData::from_ffi((u64::from(generation) << 32) | u64::from(id)))
    }

    /// Get the entity ID (slot index)
    pub fn id(&self) -> u32 {
        (self.data().as_ffi() & 0xffff_ffff) as u32
    }

    /// Get the generation (slot version) of this handle
    pub fn generation(&self) -> u32 {
        (self.data().as_ffi() >> 32) as u32
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.id(), self.generation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_parts_round_trip() {
        let entity = Entity::new(7, 3);
        assert_eq!(entity.id(), 7);
        assert_eq!(entity.generation(), 3);
        assert_eq!(entity.to_string(), "7v3");
        assert!(Entity::new(1, 1) < Entity::new(2, 1));
    }
}
