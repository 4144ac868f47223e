//! Attribute requirement: compares a named owner attribute against a
//! threshold.

use serde::{Deserialize, Serialize};

use crate::error::ConditionFailure;
use crate::ids::AttributeHandle;
use crate::simulation::{AttributeDelta, SimulationBus};

use super::{AlteredNode, Condition, ConditionCtx, WatchKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, Serialize, Deserialize)]
pub enum NumericComparison {
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = "=")]
    Equal,
    #[strum(serialize = "!=")]
    NotEqual,
    #[strum(serialize = ">=")]
    GreaterOrEqual,
    #[strum(serialize = "<=")]
    LessOrEqual,
}

impl NumericComparison {
    pub fn evaluate(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Greater => lhs > rhs,
            Self::Less => lhs < rhs,
            Self::Equal => lhs == rhs,
            Self::NotEqual => lhs != rhs,
            Self::GreaterOrEqual => lhs >= rhs,
            Self::LessOrEqual => lhs <= rhs,
        }
    }
}

/// Requires `owner.<attribute> <cmp> required`. A missing attribute
/// fails the check rather than erroring.
#[derive(Clone, Debug)]
pub struct AttributeCondition {
    pub attribute: AttributeHandle,
    pub comparison: NumericComparison,
    pub required: f64,
}

impl AttributeCondition {
    pub fn new(
        attribute: impl Into<AttributeHandle>,
        comparison: NumericComparison,
        required: f64,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            comparison,
            required,
        }
    }

    fn current(&self, ctx: &ConditionCtx<'_>) -> Option<f64> {
        ctx.owner.get_attribute(&self.attribute).ok()
    }
}

impl Condition for AttributeCondition {
    fn is_met(&self, ctx: &ConditionCtx<'_>) -> bool {
        match self.current(ctx) {
            Some(value) => self.comparison.evaluate(value, self.required),
            None => false,
        }
    }

    fn watch_keys(&self) -> Vec<WatchKey> {
        vec![WatchKey::Attribute(self.attribute.clone())]
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
            .all::<AttributeDelta>()
            .filter(|delta| delta.attribute == self.attribute)
            .map(|delta| delta.net_change)
            .sum();
        self.comparison.evaluate(value + predicted, self.required)
    }

    fn tooltip_text(&self, _ctx: &ConditionCtx<'_>) -> String {
        format!(
            "Requires {} {} {}",
            self.attribute, self.comparison, self.required
        )
    }

    fn failure(&self, ctx: &ConditionCtx<'_>) -> ConditionFailure {
        let text = match self.current(ctx) {
            Some(value) => format!(
                "Requires {} {} {} (currently {value})",
                self.attribute, self.comparison, self.required
            ),
            None => format!("Attribute {} is unavailable", self.attribute),
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
    fn compares_against_owner_attribute() {
        let mut owner = MapOwner::default();
        owner.attributes.insert("strength".into(), 12.0);
        let world = FixedWorld::default();

        let cond = AttributeCondition::new("strength", NumericComparison::GreaterOrEqual, 10.0);
        assert!(cond.is_met(&ctx(&owner, &world)));

        let cond = AttributeCondition::new("strength", NumericComparison::Less, 10.0);
        assert!(!cond.is_met(&ctx(&owner, &world)));
    }

    #[test]
    fn missing_attribute_fails() {
        let owner = MapOwner::default();
        let world = FixedWorld::default();
        let cond = AttributeCondition::new("strength", NumericComparison::GreaterOrEqual, 0.0);
        assert!(!cond.is_met(&ctx(&owner, &world)));
    }

    #[test]
    fn simulation_applies_predicted_deltas() {
        let mut owner = MapOwner::default();
        owner.attributes.insert("strength".into(), 10.0);
        let world = FixedWorld::default();
        let cond = AttributeCondition::new("strength", NumericComparison::GreaterOrEqual, 10.0);

        let altered = AlteredNode {
            guid: crate::ids::NodeGuid::generate(),
            current_level: 1,
            proposed_level: 0,
        };
        let mut bus = SimulationBus::new();
        bus.add(AttributeDelta {
            attribute: "strength".into(),
            net_change: -2.0,
        });
        assert!(!cond.still_met_if_altered(&ctx(&owner, &world), &altered, &bus));

        // Deltas for other attributes are ignored.
        let mut bus = SimulationBus::new();
        bus.add(AttributeDelta {
            attribute: "agility".into(),
            net_change: -2.0,
        });
        assert!(cond.still_met_if_altered(&ctx(&owner, &world), &altered, &bus));
    }
}
