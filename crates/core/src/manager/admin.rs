//! Admin operations: respec and forced unlocks.
//!
//! These bypass costs and prerequisite checks but still fire effects
//! through the deterministic restore path, then reconcile the ledger in
//! one rebuild pass so the spent invariant holds afterwards.

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use crate::error::{ManagerError, TreeError};
use crate::ids::{NodeIdx, TreeTag};
use crate::node::NodeState;
use crate::ports::HostEnv;

use super::SkillTreeManager;

impl SkillTreeManager {
    /// Deterministic respec: every non-default node in the tagged tree
    /// resets to Unset with a single reset callback, then the ledger is
    /// rebuilt from what remains assigned.
    pub fn force_unassign_all_in_tree(
        &mut self,
        env: &mut HostEnv<'_>,
        tag: &TreeTag,
    ) -> Result<(), ManagerError> {
        self.ensure_authoritative()?;
        let tree_index = self
            .tree_index(tag)
            .ok_or_else(|| TreeError::UnknownTag { tag: tag.clone() })?;

        let tree = &mut self.trees[tree_index];
        for i in 0..tree.len() {
            let idx = NodeIdx(i as u32);
            if tree.node(idx).active_by_default {
                continue;
            }
            tree.node_mut(idx)
                .restore_node_to_state(env, 0, NodeState::Unset, true);
        }
        debug!(tag = %tag, "tree force-unassigned");

        self.after_admin_mutation(env);
        Ok(())
    }

    /// Unlocks one node by display name, to level 1 or to max.
    pub fn force_unlock_node(
        &mut self,
        env: &mut HostEnv<'_>,
        tag: &TreeTag,
        name: &str,
        to_max: bool,
    ) -> Result<(), ManagerError> {
        self.force_unlock_with_depth(env, tag, name, 0, to_max)
    }

    /// Unlocks a node and its entire child subtree.
    pub fn force_unlock_node_and_descendants(
        &mut self,
        env: &mut HostEnv<'_>,
        tag: &TreeTag,
        name: &str,
        to_max: bool,
    ) -> Result<(), ManagerError> {
        self.force_unlock_with_depth(env, tag, name, usize::MAX, to_max)
    }

    /// Unlocks a node and descendants down to `depth` edges below it
    /// (0 = the node alone).
    pub fn force_unlock_with_depth(
        &mut self,
        env: &mut HostEnv<'_>,
        tag: &TreeTag,
        name: &str,
        depth: usize,
        to_max: bool,
    ) -> Result<(), ManagerError> {
        self.ensure_authoritative()?;
        let tree_index = self
            .tree_index(tag)
            .ok_or_else(|| TreeError::UnknownTag { tag: tag.clone() })?;
        let start = self.trees[tree_index]
            .find_node_by_name(name)
            .ok_or_else(|| TreeError::UnknownNodeName {
                tag: tag.clone(),
                name: name.to_string(),
            })?;

        // Breadth-first over child edges, bounded by depth. A visited
        // set guards against cyclic graphs.
        let mut queue: VecDeque<(NodeIdx, usize)> = VecDeque::from([(start, 0)]);
        let mut visited: HashSet<NodeIdx> = HashSet::new();
        while let Some((idx, distance)) = queue.pop_front() {
            if !visited.insert(idx) {
                continue;
            }
            self.force_unlock_at(env, tree_index, idx, to_max);
            if distance < depth {
                for &child in &self.trees[tree_index].node(idx).children.clone() {
                    queue.push_back((child, distance + 1));
                }
            }
        }

        self.after_admin_mutation(env);
        Ok(())
    }

    fn force_unlock_at(
        &mut self,
        env: &mut HostEnv<'_>,
        tree_index: usize,
        idx: NodeIdx,
        to_max: bool,
    ) {
        let node = self.trees[tree_index].node_mut(idx);
        let target = if to_max {
            node.max_level
        } else {
            node.level().max(1)
        };
        if target <= node.level() {
            return;
        }
        let state = NodeState::derive(target, node.max_level, true);
        node.restore_node_to_state(env, target, state, false);
    }

    /// Ledger rebuild plus the bookkeeping every admin mutation shares.
    fn after_admin_mutation(&mut self, env: &mut HostEnv<'_>) {
        self.rebuild_allocated_resource_cache(env);
        self.sync_watches();
        self.refresh_projection();
        env.mark_dirty(crate::ports::ReplicatedField::NodeStates);

        let seeds = self
            .trees
            .iter()
            .flat_map(|tree| tree.iter().map(|(_, node)| node.guid))
            .collect();
        self.refresh_nodes(env, seeds);
    }
}
