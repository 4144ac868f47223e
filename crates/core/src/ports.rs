//! Host-side ports.
//!
//! The engine core is pure: every interaction with the embedding
//! application goes through the traits here. [`HostEnv`] bundles the
//! ports for one call into the engine; only the owner context is
//! mandatory, everything else degrades to a typed error or a no-op when
//! absent.

use std::fmt;

use crate::cost::ResourceDef;
use crate::ids::{AttributeHandle, NodeGuid, PropertyName, PropertyPath};

/// Failure reported by a port implementation, or by [`HostEnv`] when a
/// required port is missing.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("port not available: {0}")]
    NotAvailable(&'static str),

    #[error("unknown property {0}")]
    UnknownProperty(String),

    #[error("unknown attribute {0}")]
    UnknownAttribute(AttributeHandle),

    #[error("{0}")]
    Host(String),
}

impl PortError {
    /// Wraps an arbitrary host-side failure message.
    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }
}

/// Access to the owning actor's mutable numeric state.
///
/// Integer properties back resource pools; scoped float properties and
/// attributes are effect targets.
pub trait OwnerContext {
    fn get_int_property(&self, name: &PropertyName) -> Result<i64, PortError>;
    fn set_int_property(&mut self, name: &PropertyName, value: i64) -> Result<(), PortError>;

    fn get_number(&self, path: &PropertyPath) -> Result<f64, PortError>;
    fn set_number(&mut self, path: &PropertyPath, value: f64) -> Result<(), PortError>;

    fn get_attribute(&self, handle: &AttributeHandle) -> Result<f64, PortError>;
    /// Applies an additive delta to an attribute's base value.
    fn modify_attribute(&mut self, handle: &AttributeHandle, delta: f64) -> Result<(), PortError>;
}

/// Opaque handle to an ability granted by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AbilityGrant(pub u64);

/// Opaque handle to an active modifier applied by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActiveModifier(pub u64);

/// Recipe for a scalable stat modifier, resolved by the host.
#[derive(Clone, Debug, PartialEq)]
pub struct ModifierSpec {
    pub attribute: AttributeHandle,
    /// Additive magnitude per node level.
    pub magnitude_per_level: f64,
}

/// Grants and revokes abilities and stat modifiers on the owner.
pub trait AbilityHost {
    fn grant_ability(
        &mut self,
        class: &str,
        level: i32,
        input_slot: Option<i32>,
    ) -> Result<AbilityGrant, PortError>;

    fn remove_ability(&mut self, grant: AbilityGrant) -> Result<(), PortError>;

    fn apply_scalable_modifier(
        &mut self,
        spec: &ModifierSpec,
        level: i32,
    ) -> Result<ActiveModifier, PortError>;

    fn remove_modifier(&mut self, active: ActiveModifier) -> Result<(), PortError>;
}

/// User-facing message about a node, typically a failed activation.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeUiMessage {
    pub node: NodeGuid,
    pub text: String,
    /// Suggested on-screen lifetime in seconds.
    pub lifetime_secs: f32,
}

impl NodeUiMessage {
    pub fn new(node: NodeGuid, text: impl Into<String>) -> Self {
        Self {
            node,
            text: text.into(),
            lifetime_secs: 1.5,
        }
    }
}

/// Engine lifecycle signals surfaced to the host.
#[derive(Clone, Debug, PartialEq)]
pub enum ManagerEvent {
    /// All configured trees are instantiated and any persisted state has
    /// been applied.
    PostInitialize,
    /// A node changed level or overall state.
    NodeStateUpdated { node: NodeGuid, level: i32 },
    /// The spent-resource ledger changed.
    ResourceAllocationChanged { resource: ResourceDef, spent: u32 },
}

/// Outbound message bus for UI-facing signals.
pub trait MessageBus {
    fn publish_node_message(&mut self, message: NodeUiMessage);
    fn publish_event(&mut self, event: ManagerEvent);
}

/// Byte-blob persistence keyed by slot name and user index.
pub trait SaveStore {
    fn load(&self, slot: &str, user_index: u32) -> Result<Option<Vec<u8>>, PortError>;
    fn save(&mut self, slot: &str, user_index: u32, bytes: &[u8]) -> Result<(), PortError>;
}

/// Replicated state groups a manager can flag as dirty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ReplicatedField {
    NodeStates,
    ResourceAllocations,
}

/// Notified whenever authoritative replicated state changes, so the host
/// can ship the projection to observers.
pub trait ReplicationSink {
    fn mark_dirty(&mut self, field: ReplicatedField);
}

/// Bundle of host ports for one engine call.
///
/// The owner context is required; optional ports answer
/// [`PortError::NotAvailable`] through the accessors, and the publish
/// and mark-dirty helpers fall back to no-ops.
pub struct HostEnv<'a> {
    owner: &'a mut dyn OwnerContext,
    abilities: Option<&'a mut dyn AbilityHost>,
    messages: Option<&'a mut dyn MessageBus>,
    save: Option<&'a mut dyn SaveStore>,
    replication: Option<&'a mut dyn ReplicationSink>,
}

impl<'a> HostEnv<'a> {
    pub fn new(owner: &'a mut dyn OwnerContext) -> Self {
        Self {
            owner,
            abilities: None,
            messages: None,
            save: None,
            replication: None,
        }
    }

    pub fn with_abilities(mut self, abilities: &'a mut dyn AbilityHost) -> Self {
        self.abilities = Some(abilities);
        self
    }

    pub fn with_messages(mut self, messages: &'a mut dyn MessageBus) -> Self {
        self.messages = Some(messages);
        self
    }

    pub fn with_save(mut self, save: &'a mut dyn SaveStore) -> Self {
        self.save = Some(save);
        self
    }

    pub fn with_replication(mut self, replication: &'a mut dyn ReplicationSink) -> Self {
        self.replication = Some(replication);
        self
    }

    pub fn owner(&self) -> &dyn OwnerContext {
        self.owner
    }

    pub fn owner_mut(&mut self) -> &mut dyn OwnerContext {
        self.owner
    }

    pub fn abilities(&mut self) -> Result<&mut dyn AbilityHost, PortError> {
        match self.abilities.as_deref_mut() {
            Some(host) => Ok(host),
            None => Err(PortError::NotAvailable("ability host")),
        }
    }

    pub fn save_store(&mut self) -> Result<&mut dyn SaveStore, PortError> {
        match self.save.as_deref_mut() {
            Some(store) => Ok(store),
            None => Err(PortError::NotAvailable("save store")),
        }
    }

    /// Publishes a node message if a bus is attached; silently dropped
    /// otherwise.
    pub fn publish_node_message(&mut self, message: NodeUiMessage) {
        if let Some(bus) = self.messages.as_deref_mut() {
            bus.publish_node_message(message);
        }
    }

    /// Publishes a lifecycle event if a bus is attached.
    pub fn publish_event(&mut self, event: ManagerEvent) {
        if let Some(bus) = self.messages.as_deref_mut() {
            bus.publish_event(event);
        }
    }

    /// Flags a replicated field dirty if a sink is attached.
    pub fn mark_dirty(&mut self, field: ReplicatedField) {
        if let Some(sink) = self.replication.as_deref_mut() {
            sink.mark_dirty(field);
        }
    }
}

impl fmt::Debug for HostEnv<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostEnv")
            .field("abilities", &self.abilities.is_some())
            .field("messages", &self.messages.is_some())
            .field("save", &self.save.is_some())
            .field("replication", &self.replication.is_some())
            .finish()
    }
}
