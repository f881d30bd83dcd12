//! Event system following Game Engine Architecture Ch 16.8
//! Key principles:
//! - Key-value arguments (no order dependency)
//! - Handler returns bool (true = consumed, stops forwarding)
//! - Registration system (only notify interested handlers)
//!
//! The physics systems only publish; gameplay code registers handlers.

use crate::ecs::Entity;
use crate::foundation::math::Vec3;
use std::collections::HashMap;

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Two broad-phase colliders passed the narrow-phase test
    CollisionPair,
    /// A voxel collider became grounded or left the ground
    GroundedChanged,
    /// A dynamic body pushed a voxel collider out of itself
    DynamicCollision,
    /// An entity started riding a platform
    PlatformEnter,
    /// An entity stopped riding a platform
    PlatformExit,
    /// A stuck entity was relocated
    StuckEscape,
}

/// Variant for type-safe event arguments
/// Uses key-value pairs to avoid order dependency problems
#[derive(Debug, Clone, PartialEq)]
pub enum EventArg {
    /// Entity handle
    Entity(Entity),
    /// Boolean state
    Bool(bool),
    /// World-space vector (position, normal, offset)
    Vector(Vec3),
    /// Scalar value (depth, distance)
    Scalar(f32),
}

/// Event with type ID and key-value arguments
#[derive(Debug, Clone)]
pub struct Event {
    /// Type of event
    pub event_type: EventType,
    /// Timestamp when event was created (seconds)
    pub timestamp: f64,
    args: HashMap<&'static str, EventArg>,
}

impl Event {
    /// Create a new event with the given type and timestamp
    pub fn new(event_type: EventType, timestamp: f64) -> Self {
        Self {
            event_type,
            timestamp,
            args: HashMap::new(),
        }
    }

    /// Add an argument to the event (builder pattern)
    pub fn with_arg(mut self, key: &'static str, value: EventArg) -> Self {
        self.args.insert(key, value);
        self
    }

    /// Get an argument by key
    pub fn get_arg(&self, key: &str) -> Option<&EventArg> {
        self.args.get(key)
    }

    /// Get an entity argument if present
    pub fn get_entity(&self, key: &str) -> Option<Entity> {
        if let Some(EventArg::Entity(entity)) = self.get_arg(key) {
            Some(*entity)
        } else {
            None
        }
    }

    /// Get a boolean argument if present
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        if let Some(EventArg::Bool(value)) = self.get_arg(key) {
            Some(*value)
        } else {
            None
        }
    }

    /// Get a vector argument if present
    pub fn get_vector(&self, key: &str) -> Option<Vec3> {
        if let Some(EventArg::Vector(value)) = self.get_arg(key) {
            Some(*value)
        } else {
            None
        }
    }

    /// Get a scalar argument if present
    pub fn get_scalar(&self, key: &str) -> Option<f32> {
        if let Some(EventArg::Scalar(value)) = self.get_arg(key) {
            Some(*value)
        } else {
            None
        }
    }
}

/// Event handler trait
/// Returns true if event was consumed (stops forwarding)
/// Returns false to allow forwarding to other handlers
pub trait EventHandler {
    /// Handle an event, return true if consumed
    fn on_event(&mut self, event: &Event) -> bool;
}

/// Event system with registration and queuing
/// Follows chain of responsibility pattern
pub struct EventSystem {
    immediate_queue: Vec<Event>,
    handlers: HashMap<EventType, Vec<Box<dyn EventHandler>>>,
    current_time: f64,
}

impl EventSystem {
    /// Create a new empty event system
    pub fn new() -> Self {
        Self {
            immediate_queue: Vec::new(),
            handlers: HashMap::new(),
            current_time: 0.0,
        }
    }

    /// Update current time (seconds since start)
    pub fn update_time(&mut self, time: f64) {
        self.current_time = time;
    }

    /// Current time used to stamp new events
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Register a handler for a specific event type
    /// Only handlers registered for this type will be notified
    pub fn register_handler(&mut self, event_type: EventType, handler: Box<dyn EventHandler>) {
        self.handlers.entry(event_type).or_default().push(handler);
    }

    /// Start building an event stamped with the current time
    pub fn event(&self, event_type: EventType) -> Event {
        Event::new(event_type, self.current_time)
    }

    /// Send event for handling at the next dispatch
    pub fn send(&mut self, event: Event) {
        self.immediate_queue.push(event);
    }

    /// Events waiting for dispatch
    pub fn pending(&self) -> &[Event] {
        &self.immediate_queue
    }

    /// Dispatch all pending events
    pub fn dispatch(&mut self) {
        let immediate = std::mem::take(&mut self.immediate_queue);
        for event in immediate {
            self.dispatch_event(&event);
        }
    }

    /// Dispatch single event to registered handlers
    /// Stops on first handler that returns true (consumed)
    fn dispatch_event(&mut self, event: &Event) {
        if let Some(handlers) = self.handlers.get_mut(&event.event_type) {
            for handler in handlers.iter_mut() {
                if handler.on_event(event) {
                    // Event consumed, stop forwarding
                    break;
                }
            }
        }
    }

    /// Clear all queued events (useful for state transitions)
    pub fn clear(&mut self) {
        self.immediate_queue.clear();
    }
}

impl Default for EventSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingHandler {
        received: Arc<Mutex<Vec<EventType>>>,
        consume: bool,
    }

    impl EventHandler for RecordingHandler {
        fn on_event(&mut self, event: &Event) -> bool {
            if let Ok(mut received) = self.received.lock() {
                received.push(event.event_type);
            }
            self.consume
        }
    }

    fn recorder(consume: bool) -> (Box<RecordingHandler>, Arc<Mutex<Vec<EventType>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let handler = Box::new(RecordingHandler {
            received: Arc::clone(&received),
            consume,
        });
        (handler, received)
    }

    #[test]
    fn test_typed_arguments() {
        let a = Entity::new(3, 1);
        let event = Event::new(EventType::DynamicCollision, 0.5)
            .with_arg("entity", EventArg::Entity(a))
            .with_arg("normal", EventArg::Vector(Vec3::y()))
            .with_arg("depth", EventArg::Scalar(0.25))
            .with_arg("grounded", EventArg::Bool(true));

        assert_eq!(event.get_entity("entity"), Some(a));
        assert_eq!(event.get_vector("normal"), Some(Vec3::y()));
        assert_eq!(event.get_scalar("depth"), Some(0.25));
        assert_eq!(event.get_bool("grounded"), Some(true));
        // Wrong kind for the key
        assert_eq!(event.get_scalar("entity"), None);
    }

    #[test]
    fn test_dispatch_reaches_registered_handlers_only() {
        let mut system = EventSystem::new();
        let (handler, received) = recorder(false);
        system.register_handler(EventType::PlatformEnter, handler);

        system.send(system.event(EventType::PlatformEnter));
        system.send(system.event(EventType::PlatformExit));
        assert_eq!(system.pending().len(), 2);
        system.dispatch();

        assert!(system.pending().is_empty());
        let received = received.lock().map(|r| r.clone()).unwrap_or_default();
        assert_eq!(received, vec![EventType::PlatformEnter]);
    }

    #[test]
    fn test_event_consumption() {
        let mut system = EventSystem::new();
        let (first, first_received) = recorder(true);
        let (second, second_received) = recorder(false);
        system.register_handler(EventType::CollisionPair, first);
        system.register_handler(EventType::CollisionPair, second);

        system.update_time(2.0);
        let event = system.event(EventType::CollisionPair);
        assert_eq!(event.timestamp, 2.0);
        system.send(event);
        system.dispatch();

        assert_eq!(first_received.lock().map(|r| r.len()).unwrap_or(0), 1);
        assert_eq!(second_received.lock().map(|r| r.len()).unwrap_or(0), 0);
    }
}
