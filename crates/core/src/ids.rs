//! Identity newtypes shared across the engine.
//!
//! Nodes and trees are addressed by GUID everywhere state crosses a
//! boundary (save files, replication records, condition targets); the
//! arena index [`NodeIdx`] is an in-memory handle only and is never
//! persisted.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identity of a skill node. Survives serialization and template
/// edits; lookup in loaded or replicated data is always by this id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeGuid(pub Uuid);

impl NodeGuid {
    /// Generates a fresh random identity.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for NodeGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable identity of a skill tree template and its runtime instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TreeGuid(pub Uuid);

impl TreeGuid {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TreeGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a node within its tree's arena.
///
/// Valid only for the tree that produced it. Edges between nodes are
/// stored as `NodeIdx` pairs so the graph carries no owning references.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIdx(pub u32);

impl NodeIdx {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Configuration tag identifying a tree slot on a manager (e.g.
/// `"combat"`, `"crafting"`). Distinct from [`TreeGuid`]: the tag names
/// the slot, the guid names the content.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TreeTag(pub String);

impl TreeTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TreeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TreeTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Name of an integer property on the owner used as a resource pool.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyName(pub String);

impl PropertyName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PropertyName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Opaque handle addressing a numeric attribute on the owner's
/// attribute host (the Rust port of a gameplay-attribute reference).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttributeHandle(pub String);

impl AttributeHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttributeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AttributeHandle {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Scope qualifier for float-property effects: which object on the
/// owner side holds the property.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum PropertyScope {
    /// The owning actor itself.
    #[default]
    Owner,
    /// The owner's movement component.
    Movement,
    /// The owner's controller.
    Controller,
    /// The owner's player state.
    PlayerState,
}

/// Scoped path to a numeric property on the owner side.
///
/// Replaces reflection-based property addressing: the host resolves the
/// path however it likes, the core never introspects types.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyPath {
    pub scope: PropertyScope,
    pub name: PropertyName,
}

impl PropertyPath {
    pub fn new(scope: PropertyScope, name: impl Into<PropertyName>) -> Self {
        Self {
            scope,
            name: name.into(),
        }
    }

    /// Path on the owning actor itself.
    pub fn owner(name: impl Into<PropertyName>) -> Self {
        Self::new(PropertyScope::Owner, name)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.scope, self.name)
    }
}
