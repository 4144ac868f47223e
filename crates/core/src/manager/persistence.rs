//! Save and load through the save-store port.
//!
//! Saving writes one record per tree into the slot's blob, replacing
//! any record with the same tree guid. Loading replays records only
//! under version equality; a stale record is refunded against the
//! *current* cost schedules and the tree proceeds with defaults. Schema
//! migration is deliberately absent.

use tracing::{debug, warn};

use crate::cost::merge_costs;
use crate::error::ManagerError;
use crate::ports::HostEnv;
use crate::save::{NodeRecord, SaveBlob, TreeRecord};

use super::SkillTreeManager;

impl SkillTreeManager {
    /// Writes every managed tree into the slot blob.
    pub fn save_all(&mut self, env: &mut HostEnv<'_>) -> Result<(), ManagerError> {
        self.ensure_authoritative()?;
        let slot = self.config.save_slot.clone();
        let user = self.config.user_index;

        let store = env.save_store().map_err(crate::error::SaveError::Store)?;
        let mut blob = match store.load(&slot, user) {
            Ok(Some(bytes)) => SaveBlob::decode(&bytes).unwrap_or_else(|err| {
                warn!(%err, "existing save blob unreadable, starting fresh");
                SaveBlob::new(slot.clone(), user)
            }),
            Ok(None) => SaveBlob::new(slot.clone(), user),
            Err(err) => return Err(crate::error::SaveError::Store(err).into()),
        };

        for tree in &self.trees {
            blob.upsert_tree(TreeRecord {
                tree_guid: tree.guid,
                tree_version: tree.version,
                nodes: tree
                    .iter()
                    .map(|(_, node)| NodeRecord {
                        guid: node.guid,
                        level: node.level(),
                        state: node.state(),
                    })
                    .collect(),
            });
        }

        let bytes = blob.encode()?;
        env.save_store()
            .map_err(crate::error::SaveError::Store)?
            .save(&slot, user, &bytes)
            .map_err(crate::error::SaveError::Store)?;
        debug!(slot = %slot, trees = self.trees.len(), "save written");
        Ok(())
    }

    /// Applies the slot blob to every managed tree, then reconciles the
    /// ledger. A missing blob is not an error.
    pub fn load_all(&mut self, env: &mut HostEnv<'_>) -> Result<(), ManagerError> {
        self.ensure_authoritative()?;
        let slot = self.config.save_slot.clone();
        let user = self.config.user_index;

        let store = env.save_store().map_err(crate::error::SaveError::Store)?;
        let bytes = match store.load(&slot, user) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(slot = %slot, "no save blob, keeping defaults");
                return Ok(());
            }
            Err(err) => return Err(crate::error::SaveError::Store(err).into()),
        };
        let blob = SaveBlob::decode(&bytes)?;

        for tree_index in 0..self.trees.len() {
            let guid = self.trees[tree_index].guid;
            if let Some(record) = blob.tree(guid).cloned() {
                self.load_tree(env, tree_index, &record);
            }
        }

        self.rebuild_allocated_resource_cache(env);
        self.sync_watches();
        self.refresh_projection();
        Ok(())
    }

    /// Replays one tree record under version equality; refunds and
    /// resets otherwise.
    pub(crate) fn load_tree(
        &mut self,
        env: &mut HostEnv<'_>,
        tree_index: usize,
        record: &TreeRecord,
    ) {
        let version = self.trees[tree_index].version;
        if record.tree_version != version {
            warn!(
                tree = %self.trees[tree_index].guid,
                saved = record.tree_version,
                current = version,
                "save version mismatch, refunding"
            );
            self.refund_from_invalidated_save(env, tree_index, record);
            let tree = &mut self.trees[tree_index];
            tree.reset_tree_to_defaults(env);
            return;
        }

        let tree = &mut self.trees[tree_index];
        tree.reset_tree_to_defaults(env);
        for node_record in &record.nodes {
            match tree.find_node_by_guid(node_record.guid) {
                Some(idx) => {
                    let node = tree.node_mut(idx);
                    node.apply_loaded_state(node_record.level, node_record.state);
                    node.restore_node_to_state(env, node_record.level, node_record.state, true);
                }
                None => {
                    warn!(node = %node_record.guid, "saved node missing from tree, dropped");
                }
            }
        }
    }

    /// Treats a stale record as a historical allocation: its costs are
    /// re-evaluated against the current schedules and credited back to
    /// the owner's pools. Best effort; records for vanished nodes are
    /// dropped.
    pub(crate) fn refund_from_invalidated_save(
        &mut self,
        env: &mut HostEnv<'_>,
        tree_index: usize,
        record: &TreeRecord,
    ) {
        let mut refunds = Vec::new();
        for node_record in &record.nodes {
            if node_record.level <= 0 {
                continue;
            }
            let Some(idx) = self.trees[tree_index].find_node_by_guid(node_record.guid) else {
                warn!(node = %node_record.guid, "stale record for unknown node, no refund");
                continue;
            };
            let node = self.trees[tree_index].node(idx);
            if node.active_by_default {
                continue;
            }
            refunds.extend(node.total_costs_for_levels(1, node_record.level));
        }

        for cost in merge_costs(refunds) {
            self.modify_resource(env, &cost.resource, i64::from(cost.amount));
        }
    }
}
