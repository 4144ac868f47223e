//! Runtime core of a skill-tree progression engine.
//!
//! `skilltree-core` defines the canonical rules: a graph of skill nodes
//! with resource budgets, pluggable conditions and effects, what-if
//! safety analysis, versioned persistence and a replicated projection
//! for observers. The crate is pure; every host interaction goes
//! through the ports in [`ports`], and all state mutation flows through
//! [`manager::SkillTreeManager`].
pub mod condition;
pub mod cost;
pub mod curve;
pub mod effect;
pub mod error;
pub mod ids;
pub mod library;
pub mod manager;
pub mod node;
pub mod ports;
pub mod save;
pub mod simulation;
pub mod tree;
pub use condition::{
    AlteredNode, AttributeCondition, CompositeCondition, CompositeOp, Condition, ConditionCtx,
    NumericComparison, ParentLevelCondition, PropertyCondition, ResourceSpentCondition, WatchKey,
    WorldView,
};
pub use cost::{
    merge_costs, CostSchedule, PerLevelCost, ResolvedCost, ResourceDef, ResourceId,
};
pub use curve::LevelCurve;
pub use effect::{
    ApplyModifierEffect, Effect, EffectTarget, GrantAbilityEffect, ModifyPropertyEffect,
};
pub use error::{
    ActionError, ConditionFailure, EngineError, ErrorSeverity, ManagerError, SaveError, TreeError,
};
pub use ids::{
    AttributeHandle, NodeGuid, NodeIdx, PropertyName, PropertyPath, PropertyScope, TreeGuid,
    TreeTag,
};
pub use manager::{
    ManagerConfig, ManagerRole, NodeActionKind, ResourceAllocation, ResourceLedger,
    SkillTreeManager, TreeEntry,
};
pub use node::{NodeBuilder, NodeState, SkillNode};
pub use ports::{
    AbilityGrant, AbilityHost, ActiveModifier, HostEnv, ManagerEvent, MessageBus, ModifierSpec,
    NodeUiMessage, OwnerContext, PortError, ReplicatedField, ReplicationSink, SaveStore,
};
pub use save::{NodeRecord, SaveBlob, TreeRecord};
pub use simulation::{AttributeDelta, PropertyDelta, SimulationBus};
pub use tree::{SkillTree, TreeBuilder, TreeTemplate};
