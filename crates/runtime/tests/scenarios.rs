//! End-to-end scenarios over the canonical Root -> A -> B chain.

mod common;

use std::sync::Arc;

use common::{authoritative, chain_ids, chain_template, node_info, ports, sp, sp_cost, tag, SP};
use skilltree_core::{
    ActionError, AttributeDelta, AttributeHandle, Effect, EffectTarget, HostEnv, NodeActionKind,
    NodeState, OwnerContext, PortError, PropertyName, SimulationBus, SkillNode, TreeTemplate,
};

/// Boost that additionally journals reset callbacks into owner
/// attributes, so tests can count them after the fact.
#[derive(Clone)]
struct TrackedBoostEffect {
    attribute: AttributeHandle,
    per_level: f64,
}

impl Effect for TrackedBoostEffect {
    fn on_level_up(
        &mut self,
        env: &mut HostEnv<'_>,
        _target: &EffectTarget,
        new_level: i32,
        old_level: i32,
    ) -> Result<(), PortError> {
        env.owner_mut()
            .modify_attribute(&self.attribute, self.per_level * f64::from(new_level - old_level))
    }

    fn on_level_down(
        &mut self,
        env: &mut HostEnv<'_>,
        _target: &EffectTarget,
        new_level: i32,
        old_level: i32,
    ) -> Result<(), PortError> {
        env.owner_mut()
            .modify_attribute(&self.attribute, self.per_level * f64::from(new_level - old_level))
    }

    fn on_node_reset(
        &mut self,
        env: &mut HostEnv<'_>,
        target: &EffectTarget,
        previous_level: i32,
    ) -> Result<(), PortError> {
        env.owner_mut()
            .modify_attribute(&AttributeHandle::new("reset_count"), 1.0)?;
        env.owner_mut()
            .modify_attribute(&AttributeHandle::new("reset_levels"), f64::from(previous_level))?;
        self.on_level_down(env, target, 0, previous_level)
    }

    fn populate_simulation_data(
        &self,
        _target: &EffectTarget,
        effective_level: i32,
        simulating_reversal: bool,
        bus: &mut SimulationBus,
    ) {
        let magnitude = self.per_level * f64::from(effective_level);
        bus.add(AttributeDelta {
            attribute: self.attribute.clone(),
            net_change: if simulating_reversal { -magnitude } else { magnitude },
        });
    }

    fn tooltip_text(&self, _target: &EffectTarget) -> String {
        format!("{:+} {} per level", self.per_level, self.attribute)
    }

    fn clone_box(&self) -> Box<dyn Effect> {
        Box::new(self.clone())
    }
}

#[test]
fn assign_chain() {
    let ids = chain_ids();
    let mut manager = authoritative(chain_template(&ids, 1));
    let mut ports = ports(3);
    manager.initialize_trees(&mut ports.env()).unwrap();

    manager
        .request_node_action(&mut ports.env(), ids.a, NodeActionKind::Activate)
        .unwrap();
    manager
        .request_node_action(&mut ports.env(), ids.b, NodeActionKind::Activate)
        .unwrap();

    assert_eq!(node_info(&manager, ids.a), (1, NodeState::Set));
    assert_eq!(node_info(&manager, ids.b), (1, NodeState::Set));
    assert_eq!(manager.get_overall_allocated(&sp()), 2);
    assert_eq!(manager.get_current_value(&ports.owner, &sp()), 1);
}

#[test]
fn increment_to_max() {
    let ids = chain_ids();
    let mut manager = authoritative(chain_template(&ids, 1));
    let mut ports = ports(3);
    manager.initialize_trees(&mut ports.env()).unwrap();
    manager
        .request_node_action(&mut ports.env(), ids.a, NodeActionKind::Activate)
        .unwrap();
    manager
        .request_node_action(&mut ports.env(), ids.b, NodeActionKind::Activate)
        .unwrap();

    manager
        .request_node_action(&mut ports.env(), ids.a, NodeActionKind::IncrementLevel)
        .unwrap();
    assert_eq!(node_info(&manager, ids.a), (2, NodeState::Max));
    assert_eq!(manager.get_overall_allocated(&sp()), 3);

    let err = manager
        .request_node_action(&mut ports.env(), ids.a, NodeActionKind::IncrementLevel)
        .unwrap_err();
    assert!(matches!(err, ActionError::AtMaxLevel { guid } if guid == ids.a));
    assert_eq!(manager.get_overall_allocated(&sp()), 3);
    // The failure surfaced as a UI message on the node.
    assert!(ports.bus.node_messages.iter().any(|m| m.node == ids.a));
}

#[test]
fn unsafe_unassign_reports_invalidated_dependent() {
    let ids = chain_ids();
    let mut manager = authoritative(chain_template(&ids, 1));
    let mut ports = ports(3);
    manager.initialize_trees(&mut ports.env()).unwrap();
    manager
        .request_node_action(&mut ports.env(), ids.a, NodeActionKind::Activate)
        .unwrap();
    manager
        .request_node_action(&mut ports.env(), ids.b, NodeActionKind::Activate)
        .unwrap();

    let err = manager
        .request_node_action(&mut ports.env(), ids.a, NodeActionKind::Deactivate)
        .unwrap_err();
    match err {
        ActionError::SafetyViolated { invalidated, .. } => assert_eq!(invalidated, vec![ids.b]),
        other => panic!("expected safety violation, got {other}"),
    }

    // No state change.
    assert_eq!(node_info(&manager, ids.a), (1, NodeState::Set));
    assert_eq!(node_info(&manager, ids.b), (1, NodeState::Set));
    assert_eq!(manager.get_overall_allocated(&sp()), 2);
}

#[test]
fn safe_unassign_via_cascade() {
    let ids = chain_ids();
    let mut manager = authoritative(chain_template(&ids, 1));
    let mut ports = ports(3);
    manager.initialize_trees(&mut ports.env()).unwrap();
    manager
        .request_node_action(&mut ports.env(), ids.a, NodeActionKind::Activate)
        .unwrap();
    manager
        .request_node_action(&mut ports.env(), ids.b, NodeActionKind::Activate)
        .unwrap();

    manager
        .request_node_action(&mut ports.env(), ids.b, NodeActionKind::Deactivate)
        .unwrap();
    manager
        .request_node_action(&mut ports.env(), ids.a, NodeActionKind::Deactivate)
        .unwrap();

    assert_eq!(node_info(&manager, ids.a), (0, NodeState::Unset));
    assert_eq!(node_info(&manager, ids.b), (0, NodeState::Unset));
    assert_eq!(manager.get_overall_allocated(&sp()), 0);
    assert_eq!(manager.get_current_value(&ports.owner, &sp()), 3);
}

#[test]
fn respec_refunds_everything() {
    let ids = chain_ids();
    let mut manager = authoritative(chain_template(&ids, 1));
    let mut ports = ports(3);
    manager.initialize_trees(&mut ports.env()).unwrap();
    manager
        .request_node_action(&mut ports.env(), ids.a, NodeActionKind::Activate)
        .unwrap();
    manager
        .request_node_action(&mut ports.env(), ids.b, NodeActionKind::Activate)
        .unwrap();
    manager
        .request_node_action(&mut ports.env(), ids.a, NodeActionKind::IncrementLevel)
        .unwrap();
    assert_eq!(manager.get_overall_allocated(&sp()), 3);
    assert_eq!(manager.get_current_value(&ports.owner, &sp()), 0);

    manager
        .force_unassign_all_in_tree(&mut ports.env(), &tag())
        .unwrap();

    assert_eq!(node_info(&manager, ids.a), (0, NodeState::Unset));
    assert_eq!(node_info(&manager, ids.b), (0, NodeState::Unset));
    assert_eq!(node_info(&manager, ids.root).0, 1);
    assert_eq!(manager.get_overall_allocated(&sp()), 0);
    assert_eq!(manager.get_current_value(&ports.owner, &sp()), 3);
}

#[test]
fn respec_fires_one_coarse_reset_per_node() {
    // Chain shape as above, with a tracked boost on A and B.
    let mut builder = TreeTemplate::builder("combat");
    let root = builder.node(SkillNode::builder("Root").build());
    let a = builder.node(
        SkillNode::builder("A")
            .max_level(2)
            .cost(sp_cost(1))
            .effect(TrackedBoostEffect {
                attribute: AttributeHandle::new("power"),
                per_level: 10.0,
            })
            .build(),
    );
    let b = builder.node(
        SkillNode::builder("B")
            .max_level(2)
            .cost(sp_cost(1))
            .effect(TrackedBoostEffect {
                attribute: AttributeHandle::new("power"),
                per_level: 10.0,
            })
            .build(),
    );
    builder.edge(root, a);
    builder.edge(a, b);
    let template = Arc::new(builder.build().unwrap());

    let mut manager = authoritative(template);
    let mut ports = ports(3);
    ports.owner = ports
        .owner
        .clone()
        .with_attribute("power", 0.0)
        .with_attribute("reset_count", 0.0)
        .with_attribute("reset_levels", 0.0);
    manager.initialize_trees(&mut ports.env()).unwrap();
    manager
        .request_node_action(&mut ports.env(), a, NodeActionKind::Activate)
        .unwrap();
    manager
        .request_node_action(&mut ports.env(), b, NodeActionKind::Activate)
        .unwrap();
    manager
        .request_node_action(&mut ports.env(), a, NodeActionKind::IncrementLevel)
        .unwrap();
    assert_eq!(ports.owner.attribute(&AttributeHandle::new("power")), Some(30.0));

    manager
        .force_unassign_all_in_tree(&mut ports.env(), &tag())
        .unwrap();

    assert_eq!(node_info(&manager, a), (0, NodeState::Unset));
    assert_eq!(node_info(&manager, b), (0, NodeState::Unset));
    assert_eq!(ports.owner.attribute(&AttributeHandle::new("power")), Some(0.0));
    // Exactly one reset per node, each carrying its pre-reset level
    // (2 for A, 1 for B).
    assert_eq!(
        ports.owner.attribute(&AttributeHandle::new("reset_count")),
        Some(2.0)
    );
    assert_eq!(
        ports.owner.attribute(&AttributeHandle::new("reset_levels")),
        Some(3.0)
    );
    assert_eq!(manager.get_overall_allocated(&sp()), 0);
    assert_eq!(manager.get_current_value(&ports.owner, &sp()), 3);
}

#[test]
fn validation_previews_without_mutating() {
    let ids = chain_ids();
    let mut manager = authoritative(chain_template(&ids, 1));
    let mut ports = ports(3);
    manager.initialize_trees(&mut ports.env()).unwrap();

    let err = manager
        .validate_node_action(&ports.owner, ids.b, NodeActionKind::Activate)
        .unwrap_err();
    assert!(matches!(err, ActionError::PrerequisitesNotMet { guid, .. } if guid == ids.b));
    assert_eq!(node_info(&manager, ids.b), (0, NodeState::Unset));
    assert_eq!(manager.get_overall_allocated(&sp()), 0);

    manager
        .request_node_action(&mut ports.env(), ids.a, NodeActionKind::Activate)
        .unwrap();
    manager
        .validate_node_action(&ports.owner, ids.b, NodeActionKind::Activate)
        .unwrap();
    assert_eq!(node_info(&manager, ids.b), (0, NodeState::Unset));
}

#[test]
fn shutdown_drops_live_state() {
    let ids = chain_ids();
    let mut manager = authoritative(chain_template(&ids, 1));
    let mut ports = ports(3);
    manager.initialize_trees(&mut ports.env()).unwrap();
    manager
        .request_node_action(&mut ports.env(), ids.a, NodeActionKind::Activate)
        .unwrap();

    manager.shutdown();
    assert!(!manager.is_initialized());
    assert!(manager.trees().is_empty());
    assert_eq!(manager.get_overall_allocated(&sp()), 0);

    // Re-initialization without a load starts from template defaults.
    manager.initialize_trees(&mut ports.env()).unwrap();
    assert_eq!(node_info(&manager, ids.a), (0, NodeState::Unset));
}

#[test]
fn version_mismatch_load_refunds_against_current_schedules() {
    let ids = chain_ids();
    let mut ports = ports(3);

    // Build up state under schema version 1 and persist it.
    let mut manager = authoritative(chain_template(&ids, 1));
    manager.initialize_trees(&mut ports.env()).unwrap();
    manager
        .request_node_action(&mut ports.env(), ids.a, NodeActionKind::Activate)
        .unwrap();
    manager
        .request_node_action(&mut ports.env(), ids.b, NodeActionKind::Activate)
        .unwrap();
    manager
        .request_node_action(&mut ports.env(), ids.a, NodeActionKind::IncrementLevel)
        .unwrap();
    manager.save_all(&mut ports.env()).unwrap();

    // Same tree under schema version 2: the stale record is refunded
    // into the owner pool and the tree starts from defaults.
    let mut manager = skilltree_core::SkillTreeManager::new(
        skilltree_core::ManagerRole::Authoritative,
        skilltree_core::ManagerConfig::new("slot")
            .tree(tag(), chain_template(&ids, 2))
            .load_on_init(true),
    );
    manager.initialize_trees(&mut ports.env()).unwrap();

    assert_eq!(node_info(&manager, ids.a), (0, NodeState::Unset));
    assert_eq!(node_info(&manager, ids.b), (0, NodeState::Unset));
    assert_eq!(manager.get_overall_allocated(&sp()), 0);
    // Saved state cost 3 against the current schedules; the pool grew
    // by exactly that.
    assert_eq!(
        ports.owner.int_property(&PropertyName::new(SP)),
        Some(6)
    );
    assert_eq!(manager.get_current_value(&ports.owner, &sp()), 6);
}
