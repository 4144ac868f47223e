//! Typed data bus for what-if simulation passes.
//!
//! During safety analysis, effect plugins describe the hypothetical
//! consequences of a node losing (or gaining) its benefits by pushing
//! payload structs onto the bus; condition plugins then pull the payload
//! types they understand. New effect/condition pairs communicate through
//! new payload types without touching the core.
//!
//! The bus lives for a single synchronous simulation pass and is not
//! thread-safe.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::ids::{AttributeHandle, PropertyPath};

/// Append-only heterogeneous container keyed by payload type.
#[derive(Default)]
pub struct SimulationBus {
    buckets: HashMap<TypeId, Vec<Box<dyn Any>>>,
}

impl SimulationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies `payload` into the bucket for its type.
    pub fn add<T: Any>(&mut self, payload: T) {
        self.buckets
            .entry(TypeId::of::<T>())
            .or_default()
            .push(Box::new(payload));
    }

    /// First payload of type `T`, if any was pushed.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.buckets
            .get(&TypeId::of::<T>())
            .and_then(|bucket| bucket.first())
            .and_then(|payload| payload.downcast_ref::<T>())
    }

    /// Every payload of type `T` in insertion order.
    pub fn all<T: Any>(&self) -> impl Iterator<Item = &T> {
        self.buckets
            .get(&TypeId::of::<T>())
            .into_iter()
            .flatten()
            .filter_map(|payload| payload.downcast_ref::<T>())
    }

    /// Empties all buckets.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

/// Predicted net additive change to an owner attribute.
///
/// Pushed by scalable-modifier effects; consumed by attribute-requirement
/// conditions.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeDelta {
    pub attribute: AttributeHandle,
    pub net_change: f64,
}

/// Predicted net additive change to a scoped owner property.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyDelta {
    pub path: PropertyPath,
    pub net_change: f64,
}
