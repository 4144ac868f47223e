//! AND/OR composition over child conditions.

use crate::error::ConditionFailure;
use crate::ids::NodeGuid;
use crate::simulation::SimulationBus;

use super::{AlteredNode, Condition, ConditionCtx, WatchKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum CompositeOp {
    /// Every child must hold.
    All,
    /// At least one child must hold.
    Any,
}

/// Short-circuiting composite. Owning-node wiring and watch keys are
/// forwarded to every child.
#[derive(Clone)]
pub struct CompositeCondition {
    pub op: CompositeOp,
    pub children: Vec<Box<dyn Condition>>,
}

impl CompositeCondition {
    pub fn all(children: Vec<Box<dyn Condition>>) -> Self {
        Self {
            op: CompositeOp::All,
            children,
        }
    }

    pub fn any(children: Vec<Box<dyn Condition>>) -> Self {
        Self {
            op: CompositeOp::Any,
            children,
        }
    }

    fn combine(&self, mut results: impl Iterator<Item = bool>) -> bool {
        match self.op {
            CompositeOp::All => results.all(|met| met),
            CompositeOp::Any => results.any(|met| met),
        }
    }
}

impl Condition for CompositeCondition {
    fn set_owning_node(&mut self, guid: NodeGuid) {
        for child in &mut self.children {
            child.set_owning_node(guid);
        }
    }

    fn is_met(&self, ctx: &ConditionCtx<'_>) -> bool {
        self.combine(self.children.iter().map(|child| child.is_met(ctx)))
    }

    fn watch_keys(&self) -> Vec<WatchKey> {
        let mut keys: Vec<WatchKey> = Vec::new();
        for child in &self.children {
            for key in child.watch_keys() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    fn still_met_if_altered(
        &self,
        ctx: &ConditionCtx<'_>,
        altered: &AlteredNode,
        bus: &SimulationBus,
    ) -> bool {
        self.combine(
            self.children
                .iter()
                .map(|child| child.still_met_if_altered(ctx, altered, bus)),
        )
    }

    fn tooltip_text(&self, ctx: &ConditionCtx<'_>) -> String {
        let parts: Vec<String> = self
            .children
            .iter()
            .map(|child| child.tooltip_text(ctx))
            .collect();
        parts.join(match self.op {
            CompositeOp::All => " and ",
            CompositeOp::Any => " or ",
        })
    }

    fn failure(&self, ctx: &ConditionCtx<'_>) -> ConditionFailure {
        match self.op {
            // First failing child carries the most specific reason.
            CompositeOp::All => self
                .children
                .iter()
                .find(|child| !child.is_met(ctx))
                .map(|child| child.failure(ctx))
                .unwrap_or(ConditionFailure {
                    text: "Requirements not met".to_string(),
                    dependency: None,
                }),
            CompositeOp::Any => ConditionFailure {
                text: self.tooltip_text(ctx),
                dependency: None,
            },
        }
    }

    fn clone_box(&self) -> Box<dyn Condition> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{FixedWorld, MapOwner};
    use super::super::{ParentLevelCondition, ResourceSpentCondition};
    use super::*;
    use crate::cost::ResourceDef;

    #[test]
    fn all_and_any_short_circuit_semantics() {
        let parent = NodeGuid::generate();
        let r = ResourceDef::property("sp");
        let owner = MapOwner::default();
        let mut world = FixedWorld::default();
        world.levels.insert(parent, 1);
        world.spent.insert(r.clone(), 0);
        let ctx = ConditionCtx {
            owner: &owner,
            world: &world,
        };

        let met: Box<dyn Condition> = Box::new(ParentLevelCondition::new(parent, 1));
        let unmet: Box<dyn Condition> = Box::new(ResourceSpentCondition::new(r, 3));

        assert!(!CompositeCondition::all(vec![met.clone(), unmet.clone()]).is_met(&ctx));
        assert!(CompositeCondition::any(vec![met, unmet]).is_met(&ctx));
    }

    #[test]
    fn all_failure_reports_first_unmet_child() {
        let parent = NodeGuid::generate();
        let owner = MapOwner::default();
        let world = FixedWorld::default();
        let ctx = ConditionCtx {
            owner: &owner,
            world: &world,
        };

        let composite = CompositeCondition::all(vec![Box::new(ParentLevelCondition::new(
            parent, 1,
        ))]);
        assert_eq!(composite.failure(&ctx).dependency, Some(parent));
    }

    #[test]
    fn watch_keys_are_deduplicated() {
        let parent = NodeGuid::generate();
        let composite = CompositeCondition::all(vec![
            Box::new(ParentLevelCondition::new(parent, 1)),
            Box::new(ParentLevelCondition::new(parent, 2)),
        ]);
        assert_eq!(composite.watch_keys().len(), 1);
    }
}
