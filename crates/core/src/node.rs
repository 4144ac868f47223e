//! Skill node: stateful vertex of a tree.
//!
//! A node owns its conditions, effects and cost schedule, plus its level
//! and overall state. Graph-aware logic (reachability, prerequisite
//! checks across parents) lives on [`crate::tree::SkillTree`]; the node
//! itself only knows its edge index lists and how to transition its own
//! state while firing effects.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::condition::{Condition, ConditionCtx, WatchKey};
use crate::cost::{merge_costs, PerLevelCost, ResolvedCost};
use crate::effect::{Effect, EffectTarget};
use crate::error::ConditionFailure;
use crate::ids::{NodeGuid, NodeIdx};
use crate::ports::HostEnv;

/// Overall state of a node, derived from level and prerequisites.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum NodeState {
    /// Level 0, no benefits.
    #[default]
    Unset,
    /// Leveled below max with prerequisites satisfied.
    Set,
    /// At max level with prerequisites satisfied.
    Max,
    /// Leveled but prerequisites no longer hold; benefits withheld, the
    /// level is retained.
    Suppressed,
}

impl NodeState {
    /// State implied by the invariants for a given level and
    /// prerequisite verdict.
    pub fn derive(level: i32, max_level: i32, prerequisites_met: bool) -> Self {
        if level <= 0 {
            Self::Unset
        } else if !prerequisites_met {
            Self::Suppressed
        } else if level >= max_level {
            Self::Max
        } else {
            Self::Set
        }
    }

    /// Set or Max: assigned and emitting benefits.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Set | Self::Max)
    }
}

pub struct SkillNode {
    pub guid: NodeGuid,
    pub display_name: String,
    /// Opaque classifier for UI routing.
    pub type_tag: String,
    pub max_level: i32,
    pub active_by_default: bool,
    level: i32,
    state: NodeState,
    pub conditions: Vec<Box<dyn Condition>>,
    pub effects: Vec<Box<dyn Effect>>,
    pub costs: Vec<PerLevelCost>,
    pub parents: Vec<NodeIdx>,
    pub children: Vec<NodeIdx>,
}

impl Clone for SkillNode {
    fn clone(&self) -> Self {
        Self {
            guid: self.guid,
            display_name: self.display_name.clone(),
            type_tag: self.type_tag.clone(),
            max_level: self.max_level,
            active_by_default: self.active_by_default,
            level: self.level,
            state: self.state,
            conditions: self.conditions.clone(),
            effects: self.effects.clone(),
            costs: self.costs.clone(),
            parents: self.parents.clone(),
            children: self.children.clone(),
        }
    }
}

impl std::fmt::Debug for SkillNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillNode")
            .field("guid", &self.guid)
            .field("display_name", &self.display_name)
            .field("level", &self.level)
            .field("state", &self.state)
            .field("max_level", &self.max_level)
            .finish()
    }
}

impl SkillNode {
    pub fn builder(display_name: impl Into<String>) -> NodeBuilder {
        NodeBuilder::new(display_name)
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Assigned means level >= 1, Set, Max or Suppressed alike.
    pub fn is_assigned(&self) -> bool {
        self.level > 0
    }

    /// Snapshot handed to effects, taken before `self.effects` is
    /// borrowed mutably.
    pub fn effect_target(&self) -> EffectTarget {
        EffectTarget {
            guid: self.guid,
            display_name: self.display_name.clone(),
        }
    }

    /// Union of the conditions' watch keys.
    pub fn watch_keys(&self) -> Vec<WatchKey> {
        let mut keys: Vec<WatchKey> = Vec::new();
        for condition in &self.conditions {
            for key in condition.watch_keys() {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    pub fn conditions_met(&self, ctx: &ConditionCtx<'_>) -> bool {
        self.conditions.iter().all(|condition| condition.is_met(ctx))
    }

    /// Failure reasons from every currently unmet condition.
    pub fn condition_failures(&self, ctx: &ConditionCtx<'_>) -> Vec<ConditionFailure> {
        self.conditions
            .iter()
            .filter(|condition| !condition.is_met(ctx))
            .map(|condition| condition.failure(ctx))
            .collect()
    }

    /// Costs of reaching exactly `target_level`, unmerged.
    pub fn costs_for_target_level(&self, target_level: i32) -> Vec<ResolvedCost> {
        self.costs
            .iter()
            .map(|cost| cost.resolve(target_level))
            .collect()
    }

    /// Merged cost of the inclusive level range, per resource.
    pub fn total_costs_for_levels(&self, from: i32, to: i32) -> Vec<ResolvedCost> {
        merge_costs(
            (from..=to).flat_map(|level| self.costs.iter().map(move |cost| cost.resolve(level))),
        )
    }

    /// Merged cost of every currently held level.
    pub fn total_costs_for_all_active_levels(&self) -> Vec<ResolvedCost> {
        self.total_costs_for_levels(1, self.level)
    }

    fn fire_level_up(&mut self, env: &mut HostEnv<'_>, new_level: i32, old_level: i32) {
        let target = self.effect_target();
        for effect in &mut self.effects {
            if let Err(err) = effect.on_level_up(env, &target, new_level, old_level) {
                warn!(node = %target.guid, %err, "effect failed on level up");
            }
        }
    }

    fn fire_level_down(&mut self, env: &mut HostEnv<'_>, new_level: i32, old_level: i32) {
        let target = self.effect_target();
        for effect in &mut self.effects {
            if let Err(err) = effect.on_level_down(env, &target, new_level, old_level) {
                warn!(node = %target.guid, %err, "effect failed on level down");
            }
        }
    }

    fn fire_reset(&mut self, env: &mut HostEnv<'_>, previous_level: i32) {
        let target = self.effect_target();
        for effect in &mut self.effects {
            if let Err(err) = effect.on_node_reset(env, &target, previous_level) {
                warn!(node = %target.guid, %err, "effect failed on reset");
            }
        }
    }

    /// Default bootstrap: active-by-default nodes come up at level 1
    /// with their effects fired, everything else at Unset.
    pub fn initialize_state(&mut self, env: &mut HostEnv<'_>) {
        if self.active_by_default {
            self.level = 1;
            self.state = NodeState::derive(1, self.max_level, true);
            self.fire_level_up(env, 1, 0);
        } else {
            self.level = 0;
            self.state = NodeState::Unset;
        }
    }

    /// Raises the level to `new_level`, firing one coarse level-up.
    /// Caller has already validated prerequisites and resources.
    pub(crate) fn raise_level(&mut self, env: &mut HostEnv<'_>, new_level: i32) {
        debug_assert!(new_level > self.level && new_level <= self.max_level);
        let old_level = self.level;
        self.level = new_level;
        self.state = NodeState::derive(new_level, self.max_level, true);
        self.fire_level_up(env, new_level, old_level);
    }

    /// Lowers the level to `new_level`, firing one coarse level-down.
    /// Caller has already validated safety.
    ///
    /// A Suppressed node has no live benefits: lowering it fires
    /// nothing, unless the new state is active again, in which case the
    /// effects replay from zero at the new level.
    pub(crate) fn lower_level(&mut self, env: &mut HostEnv<'_>, new_level: i32, prerequisites_met: bool) {
        debug_assert!(new_level < self.level && new_level >= 0);
        let old_level = self.level;
        let benefits_live = self.state.is_active();
        self.level = new_level;
        self.state = NodeState::derive(new_level, self.max_level, prerequisites_met);
        if benefits_live {
            // A drop into Suppressed withholds everything, not just the
            // removed levels.
            let effective = if self.state.is_active() { new_level } else { 0 };
            self.fire_level_down(env, effective, old_level);
        } else if self.state.is_active() {
            self.fire_level_up(env, new_level, 0);
        }
    }

    /// Deterministic reset used by load, respec and admin unlocks.
    ///
    /// A zero target fires a single reset callback; a positive target
    /// fires one level-up, from zero when `force_from_zero` (the node
    /// was reset first) or from the previous level otherwise. A node
    /// coming out of Suppressed has nothing live to reverse, so its
    /// reset fires no callback and its level-up replays from zero.
    pub fn restore_node_to_state(
        &mut self,
        env: &mut HostEnv<'_>,
        target_level: i32,
        target_state: NodeState,
        force_from_zero: bool,
    ) {
        let previous = self.level;
        let was_active = self.state.is_active();
        let target_level = target_level.clamp(0, self.max_level);
        self.level = target_level;
        self.state = target_state;

        if target_level == 0 {
            if previous > 0 && was_active {
                self.fire_reset(env, previous);
            }
        } else {
            let from = if force_from_zero || !was_active { 0 } else { previous };
            if target_state.is_active() {
                self.fire_level_up(env, target_level, from);
            } else if was_active && previous > 0 {
                self.fire_level_down(env, 0, previous);
            }
        }
    }

    /// Trusts a loaded record without firing effects; the caller follows
    /// up with `restore_node_to_state`.
    pub fn apply_loaded_state(&mut self, level: i32, state: NodeState) {
        self.level = level.clamp(0, self.max_level);
        self.state = state;
    }

    /// Recomputes the overall state after a prerequisite verdict change.
    /// A transition into Suppressed reverses effects as if the level
    /// dropped to zero (the level itself is retained); a transition back
    /// out replays them at the current level. Returns true when the
    /// state changed.
    pub fn update_node_overall_state(
        &mut self,
        env: &mut HostEnv<'_>,
        prerequisites_met: bool,
    ) -> bool {
        let next = NodeState::derive(self.level, self.max_level, prerequisites_met);
        if next == self.state {
            return false;
        }
        let was_active = self.state.is_active();
        self.state = next;
        match (was_active, next) {
            (true, NodeState::Suppressed) => self.fire_level_down(env, 0, self.level),
            (false, NodeState::Set | NodeState::Max) if self.level > 0 => {
                self.fire_level_up(env, self.level, 0)
            }
            _ => {}
        }
        true
    }
}

/// Builder for template nodes.
pub struct NodeBuilder {
    guid: NodeGuid,
    display_name: String,
    type_tag: String,
    max_level: i32,
    active_by_default: bool,
    conditions: Vec<Box<dyn Condition>>,
    effects: Vec<Box<dyn Effect>>,
    costs: Vec<PerLevelCost>,
}

impl NodeBuilder {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            guid: NodeGuid::generate(),
            display_name: display_name.into(),
            type_tag: String::new(),
            max_level: 1,
            active_by_default: false,
            conditions: Vec::new(),
            effects: Vec::new(),
            costs: Vec::new(),
        }
    }

    pub fn guid(mut self, guid: NodeGuid) -> Self {
        self.guid = guid;
        self
    }

    pub fn type_tag(mut self, tag: impl Into<String>) -> Self {
        self.type_tag = tag.into();
        self
    }

    pub fn max_level(mut self, max_level: i32) -> Self {
        self.max_level = max_level.max(1);
        self
    }

    pub fn active_by_default(mut self, active: bool) -> Self {
        self.active_by_default = active;
        self
    }

    pub fn condition(mut self, condition: impl Condition + 'static) -> Self {
        self.conditions.push(Box::new(condition));
        self
    }

    pub fn effect(mut self, effect: impl Effect + 'static) -> Self {
        self.effects.push(Box::new(effect));
        self
    }

    pub fn cost(mut self, cost: PerLevelCost) -> Self {
        self.costs.push(cost);
        self
    }

    pub fn build(self) -> SkillNode {
        let mut conditions = self.conditions;
        for condition in &mut conditions {
            condition.set_owning_node(self.guid);
        }
        SkillNode {
            guid: self.guid,
            display_name: self.display_name,
            type_tag: self.type_tag,
            max_level: self.max_level,
            active_by_default: self.active_by_default,
            level: 0,
            state: NodeState::Unset,
            conditions,
            effects: self.effects,
            costs: self.costs,
            parents: Vec::new(),
            children: Vec::new(),
        }
    }
}
