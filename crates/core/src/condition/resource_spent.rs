//! Resource spend requirement: total spent of a resource across all
//! trees must reach a threshold.

use crate::cost::ResourceDef;
use crate::error::ConditionFailure;
use crate::simulation::SimulationBus;

use super::{AlteredNode, Condition, ConditionCtx, WatchKey};

#[derive(Clone, Debug)]
pub struct ResourceSpentCondition {
    pub resource: ResourceDef,
    pub required_spent: u32,
}

impl ResourceSpentCondition {
    pub fn new(resource: ResourceDef, required_spent: u32) -> Self {
        Self {
            resource,
            required_spent,
        }
    }
}

impl Condition for ResourceSpentCondition {
    fn is_met(&self, ctx: &ConditionCtx<'_>) -> bool {
        ctx.world.resource_spent(&self.resource) >= self.required_spent
    }

    fn watch_keys(&self) -> Vec<WatchKey> {
        vec![WatchKey::ResourceSpent(self.resource.clone())]
    }

    // Safety analysis hands a world view whose ledger already reflects
    // the hypothetical refund, so the plain predicate is the simulated
    // answer too.
    fn still_met_if_altered(
        &self,
        ctx: &ConditionCtx<'_>,
        _altered: &AlteredNode,
        _bus: &SimulationBus,
    ) -> bool {
        self.is_met(ctx)
    }

    fn tooltip_text(&self, ctx: &ConditionCtx<'_>) -> String {
        format!(
            "Requires {} total {} spent (currently {})",
            self.required_spent,
            self.resource,
            ctx.world.resource_spent(&self.resource)
        )
    }

    fn failure(&self, ctx: &ConditionCtx<'_>) -> ConditionFailure {
        ConditionFailure {
            text: self.tooltip_text(ctx),
            dependency: None,
        }
    }

    fn clone_box(&self) -> Box<dyn Condition> {
        Box::new(self.clone())
    }
}
