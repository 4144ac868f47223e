//! Resource definitions and per-level cost schedules.
//!
//! Pure value types: no I/O and no failure modes. A definition with
//! source [`ResourceId::None`] always costs zero. Equality and hashing
//! on [`ResourceDef`] are variant-aware and deliberately ignore the
//! user-facing label, so two definitions naming the same backing store
//! collapse to one ledger entry.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::curve::LevelCurve;
use crate::ids::{AttributeHandle, PropertyName};

/// Backing store a resource pool is drawn from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceId {
    /// No cost; evaluation always yields zero.
    #[default]
    None,
    /// Named integer property on the owner.
    OwnerProperty(PropertyName),
    /// Numeric attribute on the owner's attribute host.
    OwnerAttribute(AttributeHandle),
}

/// Identity of a resource pool plus an optional display label.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResourceDef {
    pub id: ResourceId,
    /// User-facing name ("Skill Points"). Excluded from equality and
    /// hashing.
    pub label: Option<String>,
}

impl ResourceDef {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn property(name: impl Into<PropertyName>) -> Self {
        Self {
            id: ResourceId::OwnerProperty(name.into()),
            label: None,
        }
    }

    pub fn attribute(handle: impl Into<AttributeHandle>) -> Self {
        Self {
            id: ResourceId::OwnerAttribute(handle.into()),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_none(&self) -> bool {
        matches!(self.id, ResourceId::None)
    }

    /// Display name with fallbacks: label, then the backing store's
    /// name, then a generic placeholder.
    pub fn display_name(&self) -> &str {
        if let Some(label) = &self.label {
            return label;
        }
        match &self.id {
            ResourceId::OwnerProperty(name) => name.as_str(),
            ResourceId::OwnerAttribute(handle) => handle.as_str(),
            ResourceId::None => "Resource",
        }
    }
}

impl PartialEq for ResourceDef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ResourceDef {}

impl Hash for ResourceDef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ResourceDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Cost amount as a function of the target level.
///
/// When a curve is present and keyed at the target level it wins;
/// otherwise the flat amount applies.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CostSchedule {
    pub curve: Option<LevelCurve>,
    pub flat: u32,
}

impl CostSchedule {
    pub fn flat(amount: u32) -> Self {
        Self {
            curve: None,
            flat: amount,
        }
    }

    pub fn curve(curve: LevelCurve, fallback: u32) -> Self {
        Self {
            curve: Some(curve),
            flat: fallback,
        }
    }

    /// Cost to reach `target_level`. Always non-negative.
    pub fn amount_for_level(&self, target_level: i32) -> u32 {
        self.curve
            .as_ref()
            .and_then(|curve| curve.eval_rounded(target_level))
            .unwrap_or(self.flat)
    }
}

/// One resource requirement on a node, evaluated per target level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerLevelCost {
    pub resource: ResourceDef,
    pub schedule: CostSchedule,
}

impl PerLevelCost {
    pub fn new(resource: ResourceDef, schedule: CostSchedule) -> Self {
        Self { resource, schedule }
    }

    /// Resolves the cost of reaching exactly `target_level`.
    pub fn resolve(&self, target_level: i32) -> ResolvedCost {
        let amount = if self.resource.is_none() {
            0
        } else {
            self.schedule.amount_for_level(target_level)
        };
        ResolvedCost {
            resource: self.resource.clone(),
            amount,
        }
    }
}

/// A concrete (resource, amount) pair produced at query time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCost {
    pub resource: ResourceDef,
    pub amount: u32,
}

/// Sums resolved costs into one entry per distinct resource, preserving
/// first-seen order.
pub fn merge_costs(costs: impl IntoIterator<Item = ResolvedCost>) -> Vec<ResolvedCost> {
    let mut merged: Vec<ResolvedCost> = Vec::new();
    for cost in costs {
        if cost.resource.is_none() || cost.amount == 0 {
            continue;
        }
        match merged.iter_mut().find(|c| c.resource == cost.resource) {
            Some(existing) => existing.amount += cost.amount,
            None => merged.push(cost),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_label() {
        let a = ResourceDef::property("skill_points").with_label("Skill Points");
        let b = ResourceDef::property("skill_points");
        assert_eq!(a, b);

        let c = ResourceDef::attribute("skill_points");
        assert_ne!(a, c);
    }

    #[test]
    fn display_name_fallback_chain() {
        assert_eq!(
            ResourceDef::property("gold").with_label("Gold").display_name(),
            "Gold"
        );
        assert_eq!(ResourceDef::property("gold").display_name(), "gold");
        assert_eq!(ResourceDef::none().display_name(), "Resource");
    }

    #[test]
    fn curve_wins_inside_range_flat_outside() {
        let schedule = CostSchedule::curve(LevelCurve::new([(1, 2.0), (3, 6.0)]), 9);
        assert_eq!(schedule.amount_for_level(2), 4);
        assert_eq!(schedule.amount_for_level(5), 9);
    }

    #[test]
    fn none_resource_costs_zero() {
        let cost = PerLevelCost::new(ResourceDef::none(), CostSchedule::flat(5));
        assert_eq!(cost.resolve(3).amount, 0);
    }

    #[test]
    fn merge_collapses_same_resource() {
        let r = ResourceDef::property("sp");
        let merged = merge_costs([
            ResolvedCost {
                resource: r.clone(),
                amount: 1,
            },
            ResolvedCost {
                resource: r.clone(),
                amount: 2,
            },
            ResolvedCost {
                resource: ResourceDef::none(),
                amount: 4,
            },
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].amount, 3);
    }
}
