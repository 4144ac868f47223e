//! Versioned save records.
//!
//! The persisted shape is deliberately minimal: per tree, the schema
//! version plus `(guid, level, state)` for every node. Record order is
//! not meaningful; lookup on load is always by guid. The blob travels
//! as opaque bytes through the save-store port.

use serde::{Deserialize, Serialize};

use crate::error::SaveError;
use crate::ids::{NodeGuid, TreeGuid};
use crate::node::NodeState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub guid: NodeGuid,
    pub level: i32,
    pub state: NodeState,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeRecord {
    pub tree_guid: TreeGuid,
    pub tree_version: u32,
    pub nodes: Vec<NodeRecord>,
}

impl TreeRecord {
    pub fn find_node(&self, guid: NodeGuid) -> Option<&NodeRecord> {
        self.nodes.iter().find(|record| record.guid == guid)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveBlob {
    pub slot_name: String,
    pub user_index: u32,
    pub trees: Vec<TreeRecord>,
}

impl SaveBlob {
    pub fn new(slot_name: impl Into<String>, user_index: u32) -> Self {
        Self {
            slot_name: slot_name.into(),
            user_index,
            trees: Vec::new(),
        }
    }

    pub fn tree(&self, guid: TreeGuid) -> Option<&TreeRecord> {
        self.trees.iter().find(|record| record.tree_guid == guid)
    }

    /// Inserts or replaces the record with the same tree guid.
    pub fn upsert_tree(&mut self, record: TreeRecord) {
        match self
            .trees
            .iter_mut()
            .find(|existing| existing.tree_guid == record.tree_guid)
        {
            Some(existing) => *existing = record,
            None => self.trees.push(record),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, SaveError> {
        bincode::serialize(self).map_err(|err| SaveError::Encode(err.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SaveError> {
        bincode::deserialize(bytes).map_err(|err| SaveError::Decode(err.to_string()))
    }
}
