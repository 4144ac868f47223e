//! Per-owner orchestration: tree instantiation, action dispatch,
//! resource ledger, safety analysis, replication projection, save I/O.
//!
//! One manager instance is authoritative per owner; observer instances
//! accept only the replicated projection and ledger. All mutation flows
//! through the authoritative action API in a fixed order: validate,
//! mutate node, fire effects, update ledger, update projection, emit
//! signals.

mod actions;
mod admin;
mod persistence;
mod replication;
mod resources;
mod safety;
mod watch;

pub use actions::NodeActionKind;
pub use resources::{ResourceAllocation, ResourceLedger};

use std::sync::Arc;

use tracing::{debug, error};

use crate::condition::{ConditionCtx, WorldView};
use crate::cost::ResourceDef;
use crate::error::{ActionError, ManagerError};
use crate::ids::{AttributeHandle, NodeGuid, NodeIdx, PropertyName, TreeTag};
use crate::node::SkillNode;
use crate::ports::{HostEnv, ManagerEvent, OwnerContext, ReplicatedField};
use crate::save::NodeRecord;
use crate::tree::{SkillTree, TreeTemplate};

use resources::budget_from_owner;
use watch::WatchRegistry;

/// Authority role of a manager instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ManagerRole {
    /// Permitted to mutate; typically server-side.
    Authoritative,
    /// Reconciles replicated state only.
    Observer,
}

/// One configured tree slot.
#[derive(Clone)]
pub struct TreeEntry {
    pub tag: TreeTag,
    pub template: Arc<TreeTemplate>,
}

/// Value-object configuration passed at construction.
#[derive(Clone)]
pub struct ManagerConfig {
    pub trees: Vec<TreeEntry>,
    pub save_slot: String,
    pub user_index: u32,
    pub load_on_init: bool,
}

impl ManagerConfig {
    pub fn new(save_slot: impl Into<String>) -> Self {
        Self {
            trees: Vec::new(),
            save_slot: save_slot.into(),
            user_index: 0,
            load_on_init: false,
        }
    }

    pub fn tree(mut self, tag: impl Into<TreeTag>, template: Arc<TreeTemplate>) -> Self {
        self.trees.push(TreeEntry {
            tag: tag.into(),
            template,
        });
        self
    }

    pub fn user_index(mut self, user_index: u32) -> Self {
        self.user_index = user_index;
        self
    }

    pub fn load_on_init(mut self, load: bool) -> Self {
        self.load_on_init = load;
        self
    }
}

/// Address of a node within the manager's tree list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct NodeRef {
    pub tree: usize,
    pub node: NodeIdx,
}

pub struct SkillTreeManager {
    role: ManagerRole,
    config: ManagerConfig,
    trees: Vec<SkillTree>,
    ledger: ResourceLedger,
    projection: Vec<NodeRecord>,
    watches: WatchRegistry,
    initialized: bool,
}

/// Read-only world view over the live trees and ledger.
pub(crate) struct LiveWorld<'a> {
    pub trees: &'a [SkillTree],
    pub ledger: &'a ResourceLedger,
}

impl LiveWorld<'_> {
    fn find(&self, guid: NodeGuid) -> Option<&SkillNode> {
        self.trees.iter().find_map(|tree| {
            tree.find_node_by_guid(guid)
                .map(|idx| tree.node(idx))
        })
    }
}

impl WorldView for LiveWorld<'_> {
    fn node_level(&self, guid: NodeGuid) -> Option<i32> {
        self.find(guid).map(|node| node.level())
    }

    fn node_is_active(&self, guid: NodeGuid) -> bool {
        self.find(guid)
            .map(|node| node.state().is_active())
            .unwrap_or(false)
    }

    fn node_display_name(&self, guid: NodeGuid) -> Option<String> {
        self.find(guid).map(|node| node.display_name.clone())
    }

    fn resource_spent(&self, resource: &ResourceDef) -> u32 {
        self.ledger.allocated(resource)
    }
}

impl SkillTreeManager {
    pub fn new(role: ManagerRole, config: ManagerConfig) -> Self {
        Self {
            role,
            config,
            trees: Vec::new(),
            ledger: ResourceLedger::default(),
            projection: Vec::new(),
            watches: WatchRegistry::default(),
            initialized: false,
        }
    }

    pub fn role(&self) -> ManagerRole {
        self.role
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Instantiates every configured tree, brings nodes to their
    /// defaults, optionally loads persisted state, then reconciles the
    /// ledger and projection.
    pub fn initialize_trees(&mut self, env: &mut HostEnv<'_>) -> Result<(), ManagerError> {
        self.trees = self
            .config
            .trees
            .iter()
            .map(|entry| SkillTree::instantiate(&entry.template))
            .collect();

        for tree in &mut self.trees {
            // Root first so default-active children see an anchored tree.
            let root = tree.root();
            tree.node_mut(root).initialize_state(env);
            for i in 0..tree.len() {
                let idx = NodeIdx(i as u32);
                if idx != root {
                    tree.node_mut(idx).initialize_state(env);
                }
            }
        }

        if self.config.load_on_init {
            self.load_all(env)?;
        }

        self.rebuild_allocated_resource_cache(env);
        self.sync_watches();
        self.refresh_projection();
        self.initialized = true;
        debug!(trees = self.trees.len(), "skill trees initialized");
        env.publish_event(ManagerEvent::PostInitialize);
        Ok(())
    }

    /// Tears the manager down: drops the live trees, stops condition
    /// monitoring and forgets the ledger. A later [`Self::initialize_trees`]
    /// starts fresh. Unsaved progress is discarded; call
    /// [`Self::save_all`] first if it should survive.
    pub fn shutdown(&mut self) {
        self.trees.clear();
        self.watches.clear();
        self.projection.clear();
        self.ledger.clear();
        self.initialized = false;
        debug!("skill tree manager shut down");
    }

    pub fn get_tree(&self, tag: &TreeTag) -> Option<&SkillTree> {
        self.tree_index(tag).map(|i| &self.trees[i])
    }

    pub fn trees(&self) -> &[SkillTree] {
        &self.trees
    }

    pub(crate) fn tree_index(&self, tag: &TreeTag) -> Option<usize> {
        self.config
            .trees
            .iter()
            .position(|entry| &entry.tag == tag)
    }

    pub(crate) fn find_node(&self, guid: NodeGuid) -> Option<NodeRef> {
        self.trees.iter().enumerate().find_map(|(tree, t)| {
            t.find_node_by_guid(guid).map(|node| NodeRef { tree, node })
        })
    }

    pub(crate) fn node(&self, at: NodeRef) -> &SkillNode {
        self.trees[at.tree].node(at.node)
    }

    pub(crate) fn node_mut(&mut self, at: NodeRef) -> &mut SkillNode {
        self.trees[at.tree].node_mut(at.node)
    }

    pub(crate) fn world(&self) -> LiveWorld<'_> {
        LiveWorld {
            trees: &self.trees,
            ledger: &self.ledger,
        }
    }

    pub(crate) fn ensure_authoritative(&self) -> Result<(), ActionError> {
        match self.role {
            ManagerRole::Authoritative => Ok(()),
            ManagerRole::Observer => Err(ActionError::NotAuthoritative),
        }
    }

    /// Visits every node in every tree in stored order.
    pub fn for_each_node(&mut self, mut action: impl FnMut(&mut SkillNode)) {
        for tree in &mut self.trees {
            for i in 0..tree.len() {
                action(tree.node_mut(NodeIdx(i as u32)));
            }
        }
    }

    // --- change notifications -------------------------------------------

    /// Host hook: a watched owner attribute changed.
    pub fn notify_attribute_changed(&mut self, env: &mut HostEnv<'_>, handle: &AttributeHandle) {
        let seeds = self.watches.watchers_of(|key| {
            matches!(key, crate::condition::WatchKey::Attribute(h) if h == handle)
        });
        self.refresh_nodes(env, seeds);
    }

    /// Host hook: a watched owner property changed.
    pub fn notify_property_changed(&mut self, env: &mut HostEnv<'_>, name: &PropertyName) {
        let seeds = self.watches.watchers_of(|key| {
            matches!(key, crate::condition::WatchKey::Property(n) if n == name)
        });
        self.refresh_nodes(env, seeds);
    }

    pub(crate) fn dependents_of(&self, at: NodeRef) -> Vec<NodeGuid> {
        let tree = &self.trees[at.tree];
        let guid = tree.node(at.node).guid;
        let mut seeds: Vec<NodeGuid> = tree
            .node(at.node)
            .children
            .iter()
            .map(|&child| tree.node(child).guid)
            .collect();
        for watcher in self.watches.watchers_of(|key| {
            matches!(key, crate::condition::WatchKey::NodeState(g) if *g == guid)
        }) {
            if !seeds.contains(&watcher) {
                seeds.push(watcher);
            }
        }
        seeds
    }

    pub(crate) fn spent_watchers(&self, resources: &[ResourceDef]) -> Vec<NodeGuid> {
        self.watches.watchers_of(|key| {
            matches!(key, crate::condition::WatchKey::ResourceSpent(r) if resources.contains(r))
        })
    }

    /// Cascading prerequisite refresh. Re-derives overall state for the
    /// seed nodes; every state flip enqueues its dependents in turn.
    pub(crate) fn refresh_nodes(&mut self, env: &mut HostEnv<'_>, seeds: Vec<NodeGuid>) {
        let mut worklist = seeds;
        let mut processed = 0usize;
        let budget = self.trees.iter().map(SkillTree::len).sum::<usize>().max(1) * 8;
        let mut any_changed = false;

        while let Some(guid) = worklist.pop() {
            processed += 1;
            if processed > budget {
                error!(%guid, "prerequisite refresh did not converge, aborting");
                break;
            }
            let Some(at) = self.find_node(guid) else {
                continue;
            };
            if !self.node(at).is_assigned() {
                continue;
            }

            let verdict = {
                let world = self.world();
                let ctx = ConditionCtx {
                    owner: env.owner(),
                    world: &world,
                };
                self.trees[at.tree].are_prerequisites_met(at.node, &ctx)
            };
            let changed = self.trees[at.tree]
                .node_mut(at.node)
                .update_node_overall_state(env, verdict);
            if changed {
                any_changed = true;
                let level = self.node(at).level();
                env.publish_event(ManagerEvent::NodeStateUpdated { node: guid, level });
                for dependent in self.dependents_of(at) {
                    worklist.push(dependent);
                }
            }
        }

        if any_changed {
            self.refresh_projection();
            env.mark_dirty(ReplicatedField::NodeStates);
        }
    }

    // --- bookkeeping ----------------------------------------------------

    /// Rebuilds the watch registry from every assigned node's condition
    /// watch keys. Monitoring stops when a node drops to Unset and stays
    /// registered while Suppressed.
    pub(crate) fn sync_watches(&mut self) {
        self.watches.clear();
        for tree in &self.trees {
            for (_, node) in tree.iter() {
                if node.is_assigned() {
                    self.watches.register(node.guid, node.watch_keys());
                }
            }
        }
    }

    pub(crate) fn refresh_projection(&mut self) {
        self.projection = self
            .trees
            .iter()
            .flat_map(|tree| {
                tree.iter().map(|(_, node)| NodeRecord {
                    guid: node.guid,
                    level: node.level(),
                    state: node.state(),
                })
            })
            .collect();
    }

    /// Publishes the post-mutation signals for one node in the order the
    /// authority contract requires.
    pub(crate) fn publish_node_update(&mut self, env: &mut HostEnv<'_>, guid: NodeGuid) {
        if let Some(at) = self.find_node(guid) {
            let level = self.node(at).level();
            self.refresh_projection();
            env.mark_dirty(ReplicatedField::NodeStates);
            env.publish_event(ManagerEvent::NodeStateUpdated { node: guid, level });
        }
    }
}

/// Convenience for queries that need owner-backed budget math.
impl SkillTreeManager {
    /// Total budget of a resource as backed by the owner's stores.
    pub fn get_total_budget(&self, owner: &dyn OwnerContext, resource: &ResourceDef) -> u32 {
        budget_from_owner(owner, resource)
    }

    /// Spent amount from the ledger.
    pub fn get_overall_allocated(&self, resource: &ResourceDef) -> u32 {
        self.ledger.allocated(resource)
    }

    /// Remaining amount: total minus spent, never negative.
    pub fn get_current_value(&self, owner: &dyn OwnerContext, resource: &ResourceDef) -> u32 {
        self.get_total_budget(owner, resource)
            .saturating_sub(self.get_overall_allocated(resource))
    }
}
