//! Condition plugins: predicates gating a node's prerequisites beyond
//! graph reachability.
//!
//! Conditions are pure over a [`ConditionCtx`] snapshot. Instead of
//! subscribing to host signals themselves, they declare the
//! [`WatchKey`]s whose changes can flip `is_met`; the manager owns the
//! subscription bookkeeping and re-evaluates on notification.

mod attribute;
mod composite;
mod parent_level;
mod property;
mod resource_spent;

pub use attribute::{AttributeCondition, NumericComparison};
pub use composite::{CompositeCondition, CompositeOp};
pub use parent_level::ParentLevelCondition;
pub use property::PropertyCondition;
pub use resource_spent::ResourceSpentCondition;

use crate::cost::ResourceDef;
use crate::error::ConditionFailure;
use crate::ids::{AttributeHandle, NodeGuid, PropertyName};
use crate::ports::OwnerContext;
use crate::simulation::SimulationBus;

/// Read-only view of cross-tree node and ledger state.
///
/// Implemented by the manager over its live trees, and by the safety
/// analyzer over a hypothetical post-refund snapshot.
pub trait WorldView {
    /// Current level of a node, `None` when the guid is unknown.
    fn node_level(&self, guid: NodeGuid) -> Option<i32>;

    /// Whether the node is assigned and emitting benefits (Set or Max).
    fn node_is_active(&self, guid: NodeGuid) -> bool;

    fn node_display_name(&self, guid: NodeGuid) -> Option<String>;

    /// Total spent from a resource across all trees.
    fn resource_spent(&self, resource: &ResourceDef) -> u32;
}

/// Evaluation snapshot handed to every condition call.
pub struct ConditionCtx<'a> {
    pub owner: &'a dyn OwnerContext,
    pub world: &'a dyn WorldView,
}

/// External signal whose change can flip a condition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum WatchKey {
    Attribute(AttributeHandle),
    Property(PropertyName),
    NodeState(NodeGuid),
    ResourceSpent(ResourceDef),
}

/// Hypothetical level change examined by safety analysis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlteredNode {
    pub guid: NodeGuid,
    pub current_level: i32,
    pub proposed_level: i32,
}

impl AlteredNode {
    /// True when the change removes benefits rather than adding them.
    pub fn benefits_lost(&self) -> bool {
        self.proposed_level < self.current_level
    }
}

/// Predicate plugin attached to a node.
pub trait Condition: Send {
    /// Wires the owning node's identity. Composites propagate to their
    /// children.
    fn set_owning_node(&mut self, _guid: NodeGuid) {}

    fn is_met(&self, ctx: &ConditionCtx<'_>) -> bool;

    /// Signals to monitor while the owning node is assigned.
    fn watch_keys(&self) -> Vec<WatchKey> {
        Vec::new()
    }

    /// Would `is_met` still hold if `altered`'s effects were removed
    /// (benefits lost) or added? `ctx` already reflects the hypothetical
    /// post-refund ledger; `bus` carries the predicted effect payloads.
    fn still_met_if_altered(
        &self,
        ctx: &ConditionCtx<'_>,
        _altered: &AlteredNode,
        _bus: &SimulationBus,
    ) -> bool {
        self.is_met(ctx)
    }

    fn tooltip_text(&self, ctx: &ConditionCtx<'_>) -> String;

    /// Human-readable reason for the current failure, with the blocking
    /// dependency node when one exists.
    fn failure(&self, ctx: &ConditionCtx<'_>) -> ConditionFailure {
        ConditionFailure {
            text: self.tooltip_text(ctx),
            dependency: None,
        }
    }

    fn clone_box(&self) -> Box<dyn Condition>;
}

impl Clone for Box<dyn Condition> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
