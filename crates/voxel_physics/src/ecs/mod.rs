//! Entity-Component-System implementation
//!
//! A small type-keyed component store plus the components and systems the
//! physics core runs on.

pub mod world;
pub mod entity;
pub mod component;
pub mod components;
pub mod systems;

pub use world::World;
pub use entity::Entity;
pub use component::Component;
