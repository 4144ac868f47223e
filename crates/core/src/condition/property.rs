//! Property requirement: compares a scoped owner number against a
//! threshold.

use crate::error::ConditionFailure;
use crate::ids::PropertyPath;
use crate::simulation::{PropertyDelta, SimulationBus};

use super::{AlteredNode, Condition, ConditionCtx, NumericComparison, WatchKey};

/// Requires `owner.<path> <cmp> required`. A missing property fails the
/// check rather than erroring.
#[derive(Clone, Debug)]
pub struct PropertyCondition {
    pub path: PropertyPath,
    pub comparison: NumericComparison,
    pub required: f64,
}

impl PropertyCondition {
    pub fn new(path: PropertyPath, comparison: NumericComparison, required: f64) -> Self {
        Self {
            path,
            comparison,
            required,
        }
    }

    fn current(&self, ctx: &ConditionCtx<'_>) -> Option<f64> {
        ctx.owner.get_number(&self.path).ok()
    }
}

impl Condition for PropertyCondition {
    fn is_met(&self, ctx: &ConditionCtx<'_>) -> bool {
        match self.current(ctx) {
            Some(value) => self.comparison.evaluate(value, self.required),
            None => false,
        }
    }

    fn watch_keys(&self) -> Vec<WatchKey> {
        vec![WatchKey::Property(self.path.name.clone())]
    }

    fn still_met_if_altered(
        &self,
        ctx: &ConditionCtx<'_>,
        _altered: &AlteredNode,
        bus: &SimulationBus,
    ) -> bool {
        let Some(value) = self.current(ctx) else {
            return false;
        };
        let predicted: f64 = bus
            .all::<PropertyDelta>()
            .filter(|delta| delta.path == self.path)
            .map(|delta| delta.net_change)
            .sum();
        self.comparison.evaluate(value + predicted, self.required)
    }

    fn tooltip_text(&self, _ctx: &ConditionCtx<'_>) -> String {
        format!(
            "Requires {} {} {}",
            self.path, self.comparison, self.required
        )
    }

    fn failure(&self, ctx: &ConditionCtx<'_>) -> ConditionFailure {
        let text = match self.current(ctx) {
            Some(value) => format!(
                "Requires {} {} {} (currently {value})",
                self.path, self.comparison, self.required
            ),
            None => format!("Property {} is unavailable", self.path),
        };
        ConditionFailure {
            text,
            dependency: None,
        }
    }

    fn clone_box(&self) -> Box<dyn Condition> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{FixedWorld, MapOwner};
    use super::*;

    fn ctx<'a>(owner: &'a MapOwner, world: &'a FixedWorld) -> ConditionCtx<'a> {
        ConditionCtx { owner, world }
    }

    #[test]
    fn compares_against_owner_property() {
        let path = PropertyPath::owner("mana");
        let mut owner = MapOwner::default();
        owner.numbers.insert(path.clone(), 80.0);
        let world = FixedWorld::default();

        let cond = PropertyCondition::new(path.clone(), NumericComparison::GreaterOrEqual, 50.0);
        assert!(cond.is_met(&ctx(&owner, &world)));

        let cond = PropertyCondition::new(path, NumericComparison::Greater, 80.0);
        assert!(!cond.is_met(&ctx(&owner, &world)));
    }

    #[test]
    fn missing_property_fails() {
        let owner = MapOwner::default();
        let world = FixedWorld::default();
        let cond = PropertyCondition::new(
            PropertyPath::owner("mana"),
            NumericComparison::GreaterOrEqual,
            0.0,
        );
        assert!(!cond.is_met(&ctx(&owner, &world)));
    }

    #[test]
    fn simulation_applies_predicted_deltas_for_its_path() {
        let path = PropertyPath::owner("mana");
        let mut owner = MapOwner::default();
        owner.numbers.insert(path.clone(), 50.0);
        let world = FixedWorld::default();
        let cond = PropertyCondition::new(path.clone(), NumericComparison::GreaterOrEqual, 50.0);

        let altered = AlteredNode {
            guid: crate::ids::NodeGuid::generate(),
            current_level: 1,
            proposed_level: 0,
        };
        let mut bus = SimulationBus::new();
        bus.add(PropertyDelta {
            path: path.clone(),
            net_change: -10.0,
        });
        assert!(!cond.still_met_if_altered(&ctx(&owner, &world), &altered, &bus));

        // Deltas for other paths are ignored.
        let mut bus = SimulationBus::new();
        bus.add(PropertyDelta {
            path: PropertyPath::owner("stamina"),
            net_change: -10.0,
        });
        assert!(cond.still_met_if_altered(&ctx(&owner, &world), &altered, &bus));
    }
}
