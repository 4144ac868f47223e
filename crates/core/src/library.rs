//! Convenience lookups over a manager. Purely compositional; no new
//! contracts.

use crate::error::{ManagerError, TreeError};
use crate::ids::{NodeGuid, TreeTag};
use crate::manager::{NodeActionKind, SkillTreeManager};
use crate::ports::HostEnv;

/// Resolves a node guid by display name within the tagged tree.
pub fn find_node_guid_by_name(
    manager: &SkillTreeManager,
    tag: &TreeTag,
    name: &str,
) -> Result<NodeGuid, TreeError> {
    let tree = manager
        .get_tree(tag)
        .ok_or_else(|| TreeError::UnknownTag { tag: tag.clone() })?;
    tree.find_node_by_name(name)
        .map(|idx| tree.node(idx).guid)
        .ok_or_else(|| TreeError::UnknownNodeName {
            tag: tag.clone(),
            name: name.to_string(),
        })
}

/// Name-addressed variant of the action request API.
pub fn request_node_action_by_name(
    manager: &mut SkillTreeManager,
    env: &mut HostEnv<'_>,
    tag: &TreeTag,
    name: &str,
    action: NodeActionKind,
) -> Result<(), ManagerError> {
    let guid = find_node_guid_by_name(manager, tag, name)?;
    manager.request_node_action(env, guid, action)?;
    Ok(())
}

/// Admin unlock of a named node and its descendants to the given depth.
pub fn unlock_named_subtree(
    manager: &mut SkillTreeManager,
    env: &mut HostEnv<'_>,
    tag: &TreeTag,
    name: &str,
    depth: usize,
    to_max: bool,
) -> Result<(), ManagerError> {
    manager.force_unlock_with_depth(env, tag, name, depth, to_max)
}
