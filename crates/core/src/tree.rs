//! Skill tree: arena of nodes with index edges.
//!
//! A [`TreeTemplate`] is the validated, immutable design-time shape;
//! [`SkillTree`] is a per-owner runtime instance produced by deep copy.
//! Edges are `NodeIdx` pairs into the arena, so the graph carries no
//! owning references; identity across save/load and replication is by
//! `NodeGuid`, never by index.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::condition::{AlteredNode, ConditionCtx};
use crate::error::TreeError;
use crate::ids::{NodeGuid, NodeIdx, TreeGuid};
use crate::node::{NodeState, SkillNode};
use crate::ports::HostEnv;
use crate::simulation::SimulationBus;

/// Validated immutable tree shape shared by reference across managers.
#[derive(Clone)]
pub struct TreeTemplate {
    pub guid: TreeGuid,
    /// Monotonic schema version; a mismatch against a saved record
    /// triggers refund-and-reset on load.
    pub version: u32,
    pub name: String,
    pub tags: Vec<String>,
    nodes: Vec<SkillNode>,
    root: NodeIdx,
}

impl TreeTemplate {
    pub fn builder(name: impl Into<String>) -> TreeBuilder {
        TreeBuilder::new(name)
    }

    pub fn root(&self) -> NodeIdx {
        self.root
    }

    pub fn nodes(&self) -> &[SkillNode] {
        &self.nodes
    }
}

/// Builder assembling a template from nodes and guid-addressed edges.
pub struct TreeBuilder {
    guid: TreeGuid,
    version: u32,
    name: String,
    tags: Vec<String>,
    nodes: Vec<SkillNode>,
    edges: Vec<(NodeGuid, NodeGuid)>,
}

impl TreeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            guid: TreeGuid::generate(),
            version: 1,
            name: name.into(),
            tags: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn guid(mut self, guid: TreeGuid) -> Self {
        self.guid = guid;
        self
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Adds a node, returning its guid for edge wiring.
    pub fn node(&mut self, node: SkillNode) -> NodeGuid {
        let guid = node.guid;
        self.nodes.push(node);
        guid
    }

    /// Declares a parent -> child edge between previously added nodes.
    pub fn edge(&mut self, parent: NodeGuid, child: NodeGuid) {
        self.edges.push((parent, child));
    }

    /// Validates the shape: unique guids, known edge endpoints, exactly
    /// one parentless node which becomes the root. The root is forced
    /// active-by-default so the tree is anchored after initialization.
    pub fn build(self) -> Result<TreeTemplate, TreeError> {
        let tree = self.guid;
        let mut index: HashMap<NodeGuid, NodeIdx> = HashMap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if index.insert(node.guid, NodeIdx(i as u32)).is_some() {
                return Err(TreeError::DuplicateNodeGuid {
                    tree,
                    guid: node.guid,
                });
            }
        }

        let mut nodes = self.nodes;
        for (parent, child) in &self.edges {
            let parent_idx = *index
                .get(parent)
                .ok_or(TreeError::UnknownEdgeEndpoint { tree, guid: *parent })?;
            let child_idx = *index
                .get(child)
                .ok_or(TreeError::UnknownEdgeEndpoint { tree, guid: *child })?;
            nodes[parent_idx.index()].children.push(child_idx);
            nodes[child_idx.index()].parents.push(parent_idx);
        }

        let parentless: Vec<NodeIdx> = nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.parents.is_empty())
            .map(|(i, _)| NodeIdx(i as u32))
            .collect();
        let root = match parentless.as_slice() {
            [] => return Err(TreeError::MissingRoot { tree }),
            [root] => *root,
            many => {
                return Err(TreeError::AmbiguousRoot {
                    tree,
                    candidates: many.iter().map(|idx| nodes[idx.index()].guid).collect(),
                });
            }
        };
        nodes[root.index()].active_by_default = true;

        Ok(TreeTemplate {
            guid: tree,
            version: self.version,
            name: self.name,
            tags: self.tags,
            nodes,
            root,
        })
    }
}

/// Runtime tree instance, exclusively owned by one manager.
pub struct SkillTree {
    pub guid: TreeGuid,
    pub version: u32,
    pub name: String,
    pub tags: Vec<String>,
    nodes: Vec<SkillNode>,
    root: NodeIdx,
    index: HashMap<NodeGuid, NodeIdx>,
}

impl SkillTree {
    /// Deep-copies a template into a fresh instance. Nodes come up at
    /// level 0; `initialize_state` runs later under the manager.
    pub fn instantiate(template: &Arc<TreeTemplate>) -> Self {
        let nodes = template.nodes.clone();
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.guid, NodeIdx(i as u32)))
            .collect();
        Self {
            guid: template.guid,
            version: template.version,
            name: template.name.clone(),
            tags: template.tags.clone(),
            nodes,
            root: template.root,
            index,
        }
    }

    pub fn root(&self) -> NodeIdx {
        self.root
    }

    pub fn is_root(&self, idx: NodeIdx) -> bool {
        idx == self.root
    }

    pub fn node(&self, idx: NodeIdx) -> &SkillNode {
        &self.nodes[idx.index()]
    }

    pub fn node_mut(&mut self, idx: NodeIdx) -> &mut SkillNode {
        &mut self.nodes[idx.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iteration order is the template's stored node order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIdx, &SkillNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeIdx(i as u32), node))
    }

    pub fn find_node_by_guid(&self, guid: NodeGuid) -> Option<NodeIdx> {
        self.index.get(&guid).copied()
    }

    pub fn find_node_by_name(&self, name: &str) -> Option<NodeIdx> {
        self.iter()
            .find(|(_, node)| node.display_name == name)
            .map(|(idx, _)| idx)
    }

    /// Structural prerequisite half: a root path exists along parents
    /// each assigned at level >= 1. Nodes in `treat_inactive` count as
    /// level 0. Cycles are tolerated by the visited set.
    pub fn is_reachable_from_root(
        &self,
        idx: NodeIdx,
        treat_inactive: &HashSet<NodeGuid>,
    ) -> bool {
        if self.is_root(idx) {
            return true;
        }
        let mut visited: HashSet<NodeIdx> = HashSet::new();
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            for &parent_idx in &self.node(current).parents {
                let parent = self.node(parent_idx);
                if treat_inactive.contains(&parent.guid) || !parent.is_assigned() {
                    continue;
                }
                if self.is_root(parent_idx) {
                    return true;
                }
                stack.push(parent_idx);
            }
        }
        false
    }

    /// Full prerequisite check: root, or an active parent plus every
    /// condition satisfied.
    pub fn are_prerequisites_met(&self, idx: NodeIdx, ctx: &ConditionCtx<'_>) -> bool {
        if self.is_root(idx) {
            return true;
        }
        let node = self.node(idx);
        let parent_active = node
            .parents
            .iter()
            .any(|&parent| self.node(parent).is_assigned() && self.node(parent).state().is_active());
        parent_active && node.conditions_met(ctx)
    }

    /// Prerequisite check under a hypothetical change: nodes in
    /// `hypothetically_inactive` count as level 0 for reachability, and
    /// every condition answers for the altered node's proposed level
    /// with the simulated effect payloads on `bus`.
    pub fn are_prerequisites_met_with_hypothetical_change(
        &self,
        idx: NodeIdx,
        ctx: &ConditionCtx<'_>,
        hypothetically_inactive: &HashSet<NodeGuid>,
        altered: &AlteredNode,
        bus: &SimulationBus,
    ) -> bool {
        if self.is_root(idx) {
            return true;
        }
        if !self.is_reachable_from_root(idx, hypothetically_inactive) {
            return false;
        }
        self.node(idx)
            .conditions
            .iter()
            .all(|condition| condition.still_met_if_altered(ctx, altered, bus))
    }

    /// Restores every node to its default: active-by-default nodes at
    /// level 1, everything else Unset. Reset callbacks fire for nodes
    /// that held levels.
    pub fn reset_tree_to_defaults(&mut self, env: &mut HostEnv<'_>) {
        for node in &mut self.nodes {
            if node.active_by_default {
                let state = NodeState::derive(1, node.max_level, true);
                node.restore_node_to_state(env, 1, state, true);
            } else {
                node.restore_node_to_state(env, 0, NodeState::Unset, true);
            }
        }
    }
}
