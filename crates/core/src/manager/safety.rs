//! What-if safety analysis for decrements and unassignments.
//!
//! The analysis never mutates state. It builds a hypothetical picture
//! of the world after the proposed change: the altered node's effects
//! describe their reversal on a simulation bus, the ledger is cloned
//! with the would-be refund applied, and every other active node is
//! asked whether its prerequisites would still hold against that
//! picture.

use std::collections::HashSet;

use crate::condition::{AlteredNode, ConditionCtx};
use crate::ids::NodeGuid;
use crate::ports::OwnerContext;
use crate::simulation::SimulationBus;

use super::{LiveWorld, SkillTreeManager};

impl SkillTreeManager {
    /// Nodes whose prerequisites would break if `guid` dropped from its
    /// current level to `proposed_level`. Empty means the change is
    /// safe.
    pub fn check_decrement_safety(
        &self,
        owner: &dyn OwnerContext,
        guid: NodeGuid,
        proposed_level: i32,
    ) -> Vec<NodeGuid> {
        let Some(at) = self.find_node(guid) else {
            return Vec::new();
        };
        let node = self.node(at);
        let current = node.level();
        if current == 0 || proposed_level >= current {
            return Vec::new();
        }

        let altered = AlteredNode {
            guid,
            current_level: current,
            proposed_level,
        };
        let mut hypothetically_inactive: HashSet<NodeGuid> = HashSet::new();
        if proposed_level == 0 {
            hypothetically_inactive.insert(guid);
        }

        // Net effect payloads: full reversal at the current level plus,
        // for a partial decrement, re-application at the proposed level.
        // A Suppressed node's benefits are already absent from the
        // world; lowering it changes nothing, so no payloads.
        let mut bus = SimulationBus::new();
        if node.state().is_active() {
            let target = node.effect_target();
            for effect in &node.effects {
                effect.populate_simulation_data(&target, current, true, &mut bus);
                if proposed_level > 0 {
                    effect.populate_simulation_data(&target, proposed_level, false, &mut bus);
                }
            }
        }

        // Post-refund ledger so spend-gated conditions answer against
        // the hypothetical tally.
        let mut ledger = self.ledger.clone();
        if !node.active_by_default {
            for cost in node.total_costs_for_levels(proposed_level + 1, current) {
                ledger.remove(&cost.resource, cost.amount);
            }
        }

        let world = LiveWorld {
            trees: &self.trees,
            ledger: &ledger,
        };
        let ctx = ConditionCtx {
            owner,
            world: &world,
        };

        let mut invalidated: Vec<NodeGuid> = Vec::new();
        for tree in &self.trees {
            for (idx, other) in tree.iter() {
                if other.guid == guid || tree.is_root(idx) || !other.state().is_active() {
                    continue;
                }
                if !tree.are_prerequisites_met_with_hypothetical_change(
                    idx,
                    &ctx,
                    &hypothetically_inactive,
                    &altered,
                    &bus,
                ) {
                    invalidated.push(other.guid);
                }
            }
        }
        invalidated
    }

    /// Safety of a single-level decrement.
    pub fn can_safely_decrement_node_level(
        &self,
        owner: &dyn OwnerContext,
        guid: NodeGuid,
    ) -> Result<(), Vec<NodeGuid>> {
        let proposed = self
            .find_node(guid)
            .map(|at| self.node(at).level() - 1)
            .unwrap_or(0);
        let invalidated = self.check_decrement_safety(owner, guid, proposed.max(0));
        if invalidated.is_empty() {
            Ok(())
        } else {
            Err(invalidated)
        }
    }

    /// Safety of a full unassignment, i.e. decrement repeated to zero.
    pub fn can_unassign_node(
        &self,
        owner: &dyn OwnerContext,
        guid: NodeGuid,
    ) -> Result<(), Vec<NodeGuid>> {
        let invalidated = self.check_decrement_safety(owner, guid, 0);
        if invalidated.is_empty() {
            Ok(())
        } else {
            Err(invalidated)
        }
    }
}
