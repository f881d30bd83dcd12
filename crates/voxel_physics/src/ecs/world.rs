//! ECS World implementation
//!
//! Components are stored per type in ordered maps keyed by [`Entity`], so
//! queries visit entities in id order. Component types can opt into change
//! tracking; the world then records which entities gained or lost a
//! component of that type until the owning system drains the lists.

use super::{Component, Entity};
use slotmap::SlotMap;
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};

/// Type-erased access to one component storage
trait ComponentStore: Send + Sync {
    fn remove_entity(&mut self, entity: Entity) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct Storage<T: Component> {
    components: BTreeMap<Entity, T>,
}

impl<T: Component> ComponentStore for Storage<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.components.remove(&entity).is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Default)]
struct ChangeLog {
    attached: Vec<Entity>,
    detached: Vec<Entity>,
}

/// ECS World containing all entities and components
pub struct World {
    entities: SlotMap<Entity, ()>,
    storages: HashMap<TypeId, Box<dyn ComponentStore>>,
    changes: HashMap<TypeId, ChangeLog>,
}

impl World {
    /// Create a new world
    pub fn new() -> Self {
        Self {
            entities: SlotMap::with_key(),
            storages: HashMap::new(),
            changes: HashMap::new(),
        }
    }

    /// Create a new entity, reusing a freed slot when one is available
    pub fn create_entity(&mut self) -> Entity {
        self.entities.insert(())
    }

    /// Destroy an entity and all of its components.
    ///
    /// Returns `false` for handles that are already stale.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if self.entities.remove(entity).is_none() {
            return false;
        }

        for (type_id, storage) in &mut self.storages {
            if storage.remove_entity(entity) {
                if let Some(log) = self.changes.get_mut(type_id) {
                    log.detached.push(entity);
                }
            }
        }

        log::trace!("Destroyed entity {}", entity);
        true
    }

    /// Whether the handle refers to a live entity
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.contains_key(entity)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Add (or replace) a component on an entity.
    ///
    /// Returns `false` and drops the component when the entity is not alive.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        let type_id = TypeId::of::<T>();
        let Some(storage) = self.storage_mut::<T>() else {
            return false;
        };
        let replaced = storage.components.insert(entity, component).is_some();

        if !replaced {
            if let Some(log) = self.changes.get_mut(&type_id) {
                log.attached.push(entity);
            }
        }
        true
    }

    /// Remove a component from an entity
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let removed = self
            .storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut::<Storage<T>>())
            .and_then(|s| s.components.remove(&entity));

        if removed.is_some() {
            if let Some(log) = self.changes.get_mut(&TypeId::of::<T>()) {
                log.detached.push(entity);
            }
        }
        removed
    }

    /// Get a component from an entity
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.storage::<T>()?.components.get(&entity)
    }

    /// Get a mutable component from an entity
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        self.storages
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<Storage<T>>()?
            .components
            .get_mut(&entity)
    }

    /// Whether the entity carries a component of type `T`
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.get_component::<T>(entity).is_some()
    }

    /// All entities with a component of type `T`, in id order
    pub fn query<T: Component>(&self) -> Vec<(Entity, &T)> {
        self.storage::<T>()
            .map(|s| s.components.iter().map(|(e, c)| (*e, c)).collect())
            .unwrap_or_default()
    }

    /// Mutable access to every component of type `T`, in id order
    pub fn query_mut<T: Component>(&mut self) -> Vec<(Entity, &mut T)> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut::<Storage<T>>())
            .map(|s| s.components.iter_mut().map(|(e, c)| (*e, c)).collect())
            .unwrap_or_default()
    }

    /// Entities with a component of type `T`, in id order
    pub fn entities_with<T: Component>(&self) -> Vec<Entity> {
        self.storage::<T>()
            .map(|s| s.components.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Start recording attach/detach notifications for `T`.
    ///
    /// Returns `true` the first time it is called for a type; the caller is
    /// then responsible for picking up components attached before tracking
    /// began.
    pub fn track_changes<T: Component>(&mut self) -> bool {
        let type_id = TypeId::of::<T>();
        if self.changes.contains_key(&type_id) {
            return false;
        }
        self.changes.insert(type_id, ChangeLog::default());
        true
    }

    /// Take the entities that gained a `T` since the last drain
    pub fn drain_attached<T: Component>(&mut self) -> Vec<Entity> {
        self.changes
            .get_mut(&TypeId::of::<T>())
            .map(|log| std::mem::take(&mut log.attached))
            .unwrap_or_default()
    }

    /// Take the entities that lost a `T` since the last drain
    pub fn drain_detached<T: Component>(&mut self) -> Vec<Entity> {
        self.changes
            .get_mut(&TypeId::of::<T>())
            .map(|log| std::mem::take(&mut log.detached))
            .unwrap_or_default()
    }

    fn storage<T: Component>(&self) -> Option<&Storage<T>> {
        self.storages
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<Storage<T>>()
    }

    fn storage_mut<T: Component>(&mut self) -> Option<&mut Storage<T>> {
        self.storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Storage::<T> { components: BTreeMap::new() }))
            .as_any_mut()
            .downcast_mut::<Storage<T>>()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(i32);
    impl Component for Health {}

    #[derive(Debug, PartialEq)]
    struct Tag;
    impl Component for Tag {}

    #[test]
    fn test_add_get_remove() {
        let mut world = World::new();
        let e = world.create_entity();
        assert!(world.add_component(e, Health(10)));
        assert_eq!(world.get_component::<Health>(e), Some(&Health(10)));

        if let Some(h) = world.get_component_mut::<Health>(e) {
            h.0 -= 3;
        }
        assert_eq!(world.remove_component::<Health>(e), Some(Health(7)));
        assert!(!world.has_component::<Health>(e));
    }

    #[test]
    fn test_stale_handle_after_destroy() {
        let mut world = World::new();
        let old = world.create_entity();
        world.add_component(old, Health(1));
        assert!(world.destroy_entity(old));
        assert!(!world.is_alive(old));

        let reused = world.create_entity();
        assert_eq!(reused.id(), old.id());
        assert_ne!(reused, old);
        assert!(world.is_alive(reused));
        assert!(world.get_component::<Health>(reused).is_none());
        assert!(!world.add_component(old, Health(5)));
        assert!(!world.destroy_entity(old));
    }

    #[test]
    fn test_query_in_id_order() {
        let mut world = World::new();
        let entities: Vec<Entity> = (0..5).map(|_| world.create_entity()).collect();
        for (i, &e) in entities.iter().enumerate().rev() {
            world.add_component(e, Health(i as i32));
        }
        world.add_component(entities[2], Tag);

        let visited: Vec<Entity> = world.query::<Health>().iter().map(|(e, _)| *e).collect();
        assert_eq!(visited, entities);
        assert_eq!(world.entities_with::<Tag>(), vec![entities[2]]);

        for (_, h) in world.query_mut::<Health>() {
            h.0 *= 10;
        }
        assert_eq!(world.get_component::<Health>(entities[4]), Some(&Health(40)));
    }

    #[test]
    fn test_change_tracking() {
        let mut world = World::new();
        let before = world.create_entity();
        world.add_component(before, Tag);

        assert!(world.track_changes::<Tag>());
        assert!(!world.track_changes::<Tag>());
        assert!(world.drain_attached::<Tag>().is_empty());

        let a = world.create_entity();
        world.add_component(a, Tag);
        // Replacing does not count as a new attach
        world.add_component(a, Tag);
        assert_eq!(world.drain_attached::<Tag>(), vec![a]);
        assert!(world.drain_attached::<Tag>().is_empty());

        world.remove_component::<Tag>(a);
        world.destroy_entity(before);
        assert_eq!(world.drain_detached::<Tag>(), vec![a, before]);
    }

    #[test]
    fn test_untracked_types_record_nothing() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add_component(e, Health(1));
        world.remove_component::<Health>(e);
        assert!(world.drain_attached::<Health>().is_empty());
        assert!(world.drain_detached::<Health>().is_empty());
    }
}
