//! Owner, ability, message and replication port implementations backed
//! by plain collections.

use std::collections::HashMap;

use skilltree_core::{
    AbilityGrant, AbilityHost, ActiveModifier, AttributeHandle, ManagerEvent, MessageBus,
    ModifierSpec, NodeUiMessage, OwnerContext, PortError, PropertyName, PropertyPath,
    ReplicatedField, ReplicationSink,
};

/// Map-backed owner context. Properties and attributes must be declared
/// before the engine reads them; unknown names answer with a port error
/// so budget queries degrade to zero.
#[derive(Clone, Debug, Default)]
pub struct SimpleOwner {
    ints: HashMap<PropertyName, i64>,
    numbers: HashMap<PropertyPath, f64>,
    attributes: HashMap<AttributeHandle, f64>,
}

impl SimpleOwner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_int_property(mut self, name: impl Into<PropertyName>, value: i64) -> Self {
        self.ints.insert(name.into(), value);
        self
    }

    pub fn with_number(mut self, path: PropertyPath, value: f64) -> Self {
        self.numbers.insert(path, value);
        self
    }

    pub fn with_attribute(mut self, handle: impl Into<AttributeHandle>, value: f64) -> Self {
        self.attributes.insert(handle.into(), value);
        self
    }

    pub fn int_property(&self, name: &PropertyName) -> Option<i64> {
        self.ints.get(name).copied()
    }

    pub fn number(&self, path: &PropertyPath) -> Option<f64> {
        self.numbers.get(path).copied()
    }

    pub fn attribute(&self, handle: &AttributeHandle) -> Option<f64> {
        self.attributes.get(handle).copied()
    }
}

impl OwnerContext for SimpleOwner {
    fn get_int_property(&self, name: &PropertyName) -> Result<i64, PortError> {
        self.ints
            .get(name)
            .copied()
            .ok_or_else(|| PortError::UnknownProperty(name.to_string()))
    }

    fn set_int_property(&mut self, name: &PropertyName, value: i64) -> Result<(), PortError> {
        match self.ints.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(PortError::UnknownProperty(name.to_string())),
        }
    }

    fn get_number(&self, path: &PropertyPath) -> Result<f64, PortError> {
        self.numbers
            .get(path)
            .copied()
            .ok_or_else(|| PortError::UnknownProperty(path.to_string()))
    }

    fn set_number(&mut self, path: &PropertyPath, value: f64) -> Result<(), PortError> {
        match self.numbers.get_mut(path) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(PortError::UnknownProperty(path.to_string())),
        }
    }

    fn get_attribute(&self, handle: &AttributeHandle) -> Result<f64, PortError> {
        self.attributes
            .get(handle)
            .copied()
            .ok_or_else(|| PortError::UnknownAttribute(handle.clone()))
    }

    fn modify_attribute(&mut self, handle: &AttributeHandle, delta: f64) -> Result<(), PortError> {
        match self.attributes.get_mut(handle) {
            Some(slot) => {
                *slot += delta;
                Ok(())
            }
            None => Err(PortError::UnknownAttribute(handle.clone())),
        }
    }
}

/// Ability host that records grants and active modifiers for
/// inspection.
#[derive(Debug, Default)]
pub struct RecordingAbilityHost {
    next_handle: u64,
    granted: Vec<(AbilityGrant, String, i32)>,
    active: Vec<(ActiveModifier, ModifierSpec, i32)>,
}

impl RecordingAbilityHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn granted_classes(&self) -> Vec<&str> {
        self.granted.iter().map(|(_, class, _)| class.as_str()).collect()
    }

    pub fn active_modifiers(&self) -> &[(ActiveModifier, ModifierSpec, i32)] {
        &self.active
    }
}

impl AbilityHost for RecordingAbilityHost {
    fn grant_ability(
        &mut self,
        class: &str,
        level: i32,
        _input_slot: Option<i32>,
    ) -> Result<AbilityGrant, PortError> {
        self.next_handle += 1;
        let grant = AbilityGrant(self.next_handle);
        self.granted.push((grant, class.to_string(), level));
        Ok(grant)
    }

    fn remove_ability(&mut self, grant: AbilityGrant) -> Result<(), PortError> {
        self.granted.retain(|(handle, _, _)| *handle != grant);
        Ok(())
    }

    fn apply_scalable_modifier(
        &mut self,
        spec: &ModifierSpec,
        level: i32,
    ) -> Result<ActiveModifier, PortError> {
        self.next_handle += 1;
        let active = ActiveModifier(self.next_handle);
        self.active.push((active, spec.clone(), level));
        Ok(active)
    }

    fn remove_modifier(&mut self, active: ActiveModifier) -> Result<(), PortError> {
        self.active.retain(|(handle, _, _)| *handle != active);
        Ok(())
    }
}

/// Message bus buffering everything for later inspection.
#[derive(Debug, Default)]
pub struct BufferedMessageBus {
    pub node_messages: Vec<NodeUiMessage>,
    pub events: Vec<ManagerEvent>,
}

impl BufferedMessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.node_messages.clear();
        self.events.clear();
    }
}

impl MessageBus for BufferedMessageBus {
    fn publish_node_message(&mut self, message: NodeUiMessage) {
        self.node_messages.push(message);
    }

    fn publish_event(&mut self, event: ManagerEvent) {
        self.events.push(event);
    }
}

/// Replication sink counting dirty marks per field.
#[derive(Debug, Default)]
pub struct CountingReplicationSink {
    pub node_states: usize,
    pub resource_allocations: usize,
}

impl CountingReplicationSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReplicationSink for CountingReplicationSink {
    fn mark_dirty(&mut self, field: ReplicatedField) {
        match field {
            ReplicatedField::NodeStates => self.node_states += 1,
            ReplicatedField::ResourceAllocations => self.resource_allocations += 1,
        }
    }
}
