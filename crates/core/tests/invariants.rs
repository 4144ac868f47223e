//! Property tests over the value-type invariants.

use proptest::collection::vec;
use proptest::prelude::*;

use skilltree_core::{merge_costs, LevelCurve, NodeState, ResolvedCost, ResourceDef, ResourceLedger};

proptest! {
    #[test]
    fn state_is_consistent_with_level(
        level in -5i32..10,
        max_level in 1i32..10,
        prerequisites_met: bool,
    ) {
        match NodeState::derive(level, max_level, prerequisites_met) {
            NodeState::Unset => prop_assert!(level <= 0),
            NodeState::Suppressed => prop_assert!(level > 0 && !prerequisites_met),
            NodeState::Max => prop_assert!(level >= max_level && prerequisites_met),
            NodeState::Set => {
                prop_assert!(level > 0 && level < max_level && prerequisites_met)
            }
        }
    }

    #[test]
    fn merging_preserves_per_resource_totals(amounts in vec(0u32..100, 0..8)) {
        let resource = ResourceDef::property("sp");
        let merged = merge_costs(amounts.iter().map(|&amount| ResolvedCost {
            resource: resource.clone(),
            amount,
        }));
        let total: u32 = amounts.iter().sum();
        if total == 0 {
            prop_assert!(merged.is_empty());
        } else {
            prop_assert_eq!(merged.len(), 1);
            prop_assert_eq!(merged[0].amount, total);
        }
    }

    #[test]
    fn ledger_tracks_saturating_spend(ops in vec((any::<bool>(), 0u32..50), 0..20)) {
        let resource = ResourceDef::property("sp");
        let mut ledger = ResourceLedger::default();
        let mut model: i64 = 0;
        for (is_spend, amount) in ops {
            if is_spend {
                ledger.add(&resource, amount);
                model += i64::from(amount);
            } else {
                ledger.remove(&resource, amount);
                model = (model - i64::from(amount)).max(0);
            }
            prop_assert_eq!(i64::from(ledger.allocated(&resource)), model);
        }
    }

    #[test]
    fn curve_is_defined_exactly_on_the_keyed_range(
        points in vec((0i32..20, -50f32..50.0f32), 1..8),
        probe in -5i32..25,
    ) {
        let curve = LevelCurve::new(points.clone());
        let min = points.iter().map(|(level, _)| *level).min().unwrap();
        let max = points.iter().map(|(level, _)| *level).max().unwrap();
        prop_assert_eq!(curve.eval(probe).is_some(), probe >= min && probe <= max);
    }
}
