//! Authoritative node action dispatch.
//!
//! Validation is separated from mutation: [`SkillTreeManager::validate_node_action`]
//! is a pure check usable on observers for UI gating, while the
//! mutators run it first and only then touch state. Failures surface as
//! a structured error plus a UI message on the owning node.

use crate::condition::ConditionCtx;
use crate::cost::{merge_costs, ResolvedCost, ResourceDef};
use crate::error::{ActionError, ConditionFailure};
use crate::ids::NodeGuid;
use crate::node::NodeState;
use crate::ports::{HostEnv, NodeUiMessage, OwnerContext};

use super::{NodeRef, SkillTreeManager};

/// Requestable node mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum NodeActionKind {
    Activate,
    Deactivate,
    IncrementLevel,
    DecrementLevel,
}

impl SkillTreeManager {
    /// Validated entry point for user-driven mutations. Observers are
    /// rejected; precondition failures additionally publish a UI message
    /// naming the reason.
    pub fn request_node_action(
        &mut self,
        env: &mut HostEnv<'_>,
        guid: NodeGuid,
        action: NodeActionKind,
    ) -> Result<(), ActionError> {
        self.ensure_authoritative()?;
        let result = match action {
            NodeActionKind::Activate => self.assign_node(env, guid),
            NodeActionKind::Deactivate => self.unassign_node(env, guid),
            NodeActionKind::IncrementLevel => self.increment_node_level(env, guid),
            NodeActionKind::DecrementLevel => self.decrement_node_level(env, guid),
        };
        if let Err(err) = &result {
            env.publish_node_message(NodeUiMessage::new(guid, err.to_string()));
        }
        result
    }

    /// Pure precondition check for an action, without mutating anything
    /// and without the authority gate. Covers wrong-state, prerequisite,
    /// affordability and safety verdicts.
    pub fn validate_node_action(
        &self,
        owner: &dyn OwnerContext,
        guid: NodeGuid,
        action: NodeActionKind,
    ) -> Result<(), ActionError> {
        let at = self.locate(guid)?;
        match action {
            NodeActionKind::Activate => {
                let state = self.node(at).state();
                if state != NodeState::Unset {
                    return Err(ActionError::WrongState {
                        guid,
                        state,
                        requested: "activate",
                    });
                }
                self.check_prerequisites(owner, at, guid)?;
                if !self.node(at).active_by_default {
                    let costs = merge_costs(self.node(at).costs_for_target_level(1));
                    self.check_affordable(owner, guid, &costs)?;
                }
                Ok(())
            }
            NodeActionKind::IncrementLevel => {
                {
                    let node = self.node(at);
                    if !node.is_assigned() {
                        return Err(ActionError::WrongState {
                            guid,
                            state: node.state(),
                            requested: "increment",
                        });
                    }
                    if node.level() >= node.max_level {
                        return Err(ActionError::AtMaxLevel { guid });
                    }
                }
                self.check_prerequisites(owner, at, guid)?;
                if !self.node(at).active_by_default {
                    let target = self.node(at).level() + 1;
                    let costs = merge_costs(self.node(at).costs_for_target_level(target));
                    self.check_affordable(owner, guid, &costs)?;
                }
                Ok(())
            }
            NodeActionKind::DecrementLevel => {
                self.check_downward(owner, at, guid, "decrement", self.node(at).level() - 1)
            }
            NodeActionKind::Deactivate => self.check_downward(owner, at, guid, "deactivate", 0),
        }
    }

    pub(crate) fn assign_node(
        &mut self,
        env: &mut HostEnv<'_>,
        guid: NodeGuid,
    ) -> Result<(), ActionError> {
        self.validate_node_action(env.owner(), guid, NodeActionKind::Activate)?;
        let at = self.locate(guid)?;

        let charged = !self.node(at).active_by_default;
        let costs = merge_costs(self.node(at).costs_for_target_level(1));
        self.node_mut(at).raise_level(env, 1);
        if charged {
            self.spend(env, &costs);
        }
        self.finish_mutation(env, at, guid, &costs);
        Ok(())
    }

    pub(crate) fn increment_node_level(
        &mut self,
        env: &mut HostEnv<'_>,
        guid: NodeGuid,
    ) -> Result<(), ActionError> {
        self.validate_node_action(env.owner(), guid, NodeActionKind::IncrementLevel)?;
        let at = self.locate(guid)?;

        let target_level = self.node(at).level() + 1;
        let charged = !self.node(at).active_by_default;
        let costs = merge_costs(self.node(at).costs_for_target_level(target_level));
        self.node_mut(at).raise_level(env, target_level);
        if charged {
            self.spend(env, &costs);
        }
        self.finish_mutation(env, at, guid, &costs);
        Ok(())
    }

    pub(crate) fn decrement_node_level(
        &mut self,
        env: &mut HostEnv<'_>,
        guid: NodeGuid,
    ) -> Result<(), ActionError> {
        self.validate_node_action(env.owner(), guid, NodeActionKind::DecrementLevel)?;
        let at = self.locate(guid)?;

        let current = self.node(at).level();
        let charged = !self.node(at).active_by_default;
        let refund = merge_costs(self.node(at).costs_for_target_level(current));
        let prerequisites_met = self.prerequisite_verdict(env.owner(), at);

        self.node_mut(at).lower_level(env, current - 1, prerequisites_met);
        if charged {
            self.refund(env, &refund);
        }
        self.finish_mutation(env, at, guid, &refund);
        Ok(())
    }

    pub(crate) fn unassign_node(
        &mut self,
        env: &mut HostEnv<'_>,
        guid: NodeGuid,
    ) -> Result<(), ActionError> {
        self.validate_node_action(env.owner(), guid, NodeActionKind::Deactivate)?;
        let at = self.locate(guid)?;

        let charged = !self.node(at).active_by_default;
        let refund = self.node(at).total_costs_for_all_active_levels();
        self.node_mut(at).lower_level(env, 0, true);
        if charged {
            self.refund(env, &refund);
        }
        self.finish_mutation(env, at, guid, &refund);
        Ok(())
    }

    // --- shared validation steps ----------------------------------------

    fn locate(&self, guid: NodeGuid) -> Result<NodeRef, ActionError> {
        self.find_node(guid)
            .ok_or(ActionError::NodeNotFound { guid })
    }

    fn prerequisite_verdict(&self, owner: &dyn OwnerContext, at: NodeRef) -> bool {
        let world = self.world();
        let ctx = ConditionCtx {
            owner,
            world: &world,
        };
        self.trees[at.tree].are_prerequisites_met(at.node, &ctx)
    }

    fn check_prerequisites(
        &self,
        owner: &dyn OwnerContext,
        at: NodeRef,
        guid: NodeGuid,
    ) -> Result<(), ActionError> {
        let world = self.world();
        let ctx = ConditionCtx {
            owner,
            world: &world,
        };
        if self.trees[at.tree].are_prerequisites_met(at.node, &ctx) {
            return Ok(());
        }
        let mut reasons = self.node(at).condition_failures(&ctx);
        if reasons.is_empty() {
            reasons.push(ConditionFailure {
                text: "No active parent node".to_string(),
                dependency: None,
            });
        }
        Err(ActionError::PrerequisitesNotMet { guid, reasons })
    }

    fn check_affordable(
        &self,
        owner: &dyn OwnerContext,
        guid: NodeGuid,
        costs: &[ResolvedCost],
    ) -> Result<(), ActionError> {
        for cost in costs {
            let available = self.get_current_value(owner, &cost.resource);
            if cost.amount > available {
                return Err(ActionError::InsufficientResources {
                    guid,
                    resource: cost.resource.clone(),
                    required: cost.amount,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Shared verdict for decrement and deactivate: assigned, not the
    /// root, and safe at the proposed level.
    fn check_downward(
        &self,
        owner: &dyn OwnerContext,
        at: NodeRef,
        guid: NodeGuid,
        requested: &'static str,
        proposed_level: i32,
    ) -> Result<(), ActionError> {
        {
            let node = self.node(at);
            if !node.is_assigned() {
                return Err(ActionError::WrongState {
                    guid,
                    state: node.state(),
                    requested,
                });
            }
        }
        if self.trees[at.tree].is_root(at.node) {
            return Err(ActionError::RootImmutable { guid });
        }
        let invalidated = self.check_decrement_safety(owner, guid, proposed_level.max(0));
        if invalidated.is_empty() {
            Ok(())
        } else {
            Err(ActionError::SafetyViolated { guid, invalidated })
        }
    }

    /// Post-mutation bookkeeping shared by every action: resync watch
    /// registrations, publish the projection update, then cascade a
    /// refresh through dependents and spend-gated watchers.
    fn finish_mutation(
        &mut self,
        env: &mut HostEnv<'_>,
        at: NodeRef,
        guid: NodeGuid,
        touched_costs: &[ResolvedCost],
    ) {
        self.sync_watches();
        self.publish_node_update(env, guid);

        let mut seeds = self.dependents_of(at);
        let resources: Vec<ResourceDef> = touched_costs
            .iter()
            .map(|cost| cost.resource.clone())
            .collect();
        for watcher in self.spent_watchers(&resources) {
            if !seeds.contains(&watcher) {
                seeds.push(watcher);
            }
        }
        self.refresh_nodes(env, seeds);
    }
}
