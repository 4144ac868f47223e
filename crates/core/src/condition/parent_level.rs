//! Parent level requirement: a specific node must be at or above a
//! level.

use crate::error::ConditionFailure;
use crate::ids::NodeGuid;
use crate::simulation::SimulationBus;

use super::{AlteredNode, Condition, ConditionCtx, WatchKey};

/// Requires the node identified by `parent` to be assigned at level
/// `>= required_level`.
#[derive(Clone, Debug)]
pub struct ParentLevelCondition {
    pub parent: NodeGuid,
    pub required_level: i32,
}

impl ParentLevelCondition {
    pub fn new(parent: NodeGuid, required_level: i32) -> Self {
        Self {
            parent,
            required_level,
        }
    }

    fn parent_label(&self, ctx: &ConditionCtx<'_>) -> String {
        ctx.world
            .node_display_name(self.parent)
            .unwrap_or_else(|| self.parent.to_string())
    }
}

impl Condition for ParentLevelCondition {
    fn is_met(&self, ctx: &ConditionCtx<'_>) -> bool {
        ctx.world.node_level(self.parent).unwrap_or(0) >= self.required_level
    }

    fn watch_keys(&self) -> Vec<WatchKey> {
        vec![WatchKey::NodeState(self.parent)]
    }

    fn still_met_if_altered(
        &self,
        ctx: &ConditionCtx<'_>,
        altered: &AlteredNode,
        _bus: &SimulationBus,
    ) -> bool {
        let projected = if altered.guid == self.parent {
            altered.proposed_level
        } else {
            ctx.world.node_level(self.parent).unwrap_or(0)
        };
        projected >= self.required_level
    }

    fn tooltip_text(&self, ctx: &ConditionCtx<'_>) -> String {
        format!(
            "Requires {} at level {}",
            self.parent_label(ctx),
            self.required_level
        )
    }

    fn failure(&self, ctx: &ConditionCtx<'_>) -> ConditionFailure {
        ConditionFailure {
            text: self.tooltip_text(ctx),
            dependency: Some(self.parent),
        }
    }

    fn clone_box(&self) -> Box<dyn Condition> {
        Box::new(self.clone())
    }
}
