#![allow(dead_code)]

use std::sync::Arc;

use skilltree_core::{
    CostSchedule, HostEnv, ManagerConfig, ManagerRole, NodeGuid, NodeState, PerLevelCost,
    ResourceDef, SaveStore, SkillNode, SkillTreeManager, TreeGuid, TreeTag, TreeTemplate,
};
use skilltree_runtime::{BufferedMessageBus, CountingReplicationSink, MemorySaveStore, SimpleOwner};

pub const SP: &str = "skill_points";

/// Port bundle shared by the scenario tests.
pub struct Ports {
    pub owner: SimpleOwner,
    pub bus: BufferedMessageBus,
    pub sink: CountingReplicationSink,
    pub store: Box<dyn SaveStore>,
}

impl Ports {
    pub fn env(&mut self) -> HostEnv<'_> {
        HostEnv::new(&mut self.owner)
            .with_messages(&mut self.bus)
            .with_save(self.store.as_mut())
            .with_replication(&mut self.sink)
    }

    pub fn set_store(&mut self, store: impl SaveStore + 'static) {
        self.store = Box::new(store);
    }
}

pub fn ports(skill_point_budget: i64) -> Ports {
    Ports {
        owner: SimpleOwner::new().with_int_property(SP, skill_point_budget),
        bus: BufferedMessageBus::new(),
        sink: CountingReplicationSink::new(),
        store: Box::new(MemorySaveStore::new()),
    }
}

pub fn sp() -> ResourceDef {
    ResourceDef::property(SP)
}

pub fn sp_cost(amount: u32) -> PerLevelCost {
    PerLevelCost::new(sp(), CostSchedule::flat(amount))
}

pub fn tag() -> TreeTag {
    TreeTag::new("combat")
}

/// Stable identities for the canonical Root -> A -> B chain, reused
/// across template versions.
pub struct ChainIds {
    pub tree: TreeGuid,
    pub root: NodeGuid,
    pub a: NodeGuid,
    pub b: NodeGuid,
}

pub fn chain_ids() -> ChainIds {
    ChainIds {
        tree: TreeGuid::generate(),
        root: NodeGuid::generate(),
        a: NodeGuid::generate(),
        b: NodeGuid::generate(),
    }
}

/// Root -> A -> B; A and B cost 1 skill point per level, max level 2.
pub fn chain_template(ids: &ChainIds, version: u32) -> Arc<TreeTemplate> {
    let mut builder = TreeTemplate::builder("combat").guid(ids.tree).version(version);
    let root = builder.node(SkillNode::builder("Root").guid(ids.root).build());
    let a = builder.node(
        SkillNode::builder("A")
            .guid(ids.a)
            .max_level(2)
            .cost(sp_cost(1))
            .build(),
    );
    let b = builder.node(
        SkillNode::builder("B")
            .guid(ids.b)
            .max_level(2)
            .cost(sp_cost(1))
            .build(),
    );
    builder.edge(root, a);
    builder.edge(a, b);
    Arc::new(builder.build().unwrap())
}

pub fn authoritative(template: Arc<TreeTemplate>) -> SkillTreeManager {
    SkillTreeManager::new(
        ManagerRole::Authoritative,
        ManagerConfig::new("slot").tree(tag(), template),
    )
}

pub fn observer(template: Arc<TreeTemplate>) -> SkillTreeManager {
    SkillTreeManager::new(
        ManagerRole::Observer,
        ManagerConfig::new("slot").tree(tag(), template),
    )
}

pub fn node_info(manager: &SkillTreeManager, guid: NodeGuid) -> (i32, NodeState) {
    for tree in manager.trees() {
        if let Some(idx) = tree.find_node_by_guid(guid) {
            let node = tree.node(idx);
            return (node.level(), node.state());
        }
    }
    panic!("node {guid} not found");
}
