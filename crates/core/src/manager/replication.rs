//! Replicated projection and observer reconciliation.
//!
//! The authoritative side maintains a flat `{guid, level, state}`
//! projection plus the ledger snapshot; the host ships both to
//! observers however it likes. Observers only reconcile: node records
//! apply without firing effects, unknown guids are logged and dropped,
//! and mutation requests are refused by role.

use tracing::{debug, warn};

use crate::ports::{HostEnv, ManagerEvent};
use crate::save::NodeRecord;

use super::{ManagerRole, ResourceAllocation, SkillTreeManager};

impl SkillTreeManager {
    /// Current replicated node projection.
    pub fn replicated_node_states(&self) -> &[NodeRecord] {
        &self.projection
    }

    /// Observer-side reconciliation of the node projection. Records for
    /// guids absent from the local trees (template mismatch) are
    /// discarded with a warning.
    pub fn apply_replicated_node_states(
        &mut self,
        env: &mut HostEnv<'_>,
        records: &[NodeRecord],
    ) {
        if self.role == ManagerRole::Authoritative {
            warn!("authoritative manager ignoring replicated node states");
            return;
        }
        let mut applied = 0usize;
        for record in records {
            match self.find_node(record.guid) {
                Some(at) => {
                    self.node_mut(at).apply_loaded_state(record.level, record.state);
                    applied += 1;
                    env.publish_event(ManagerEvent::NodeStateUpdated {
                        node: record.guid,
                        level: record.level,
                    });
                }
                None => {
                    warn!(node = %record.guid, "replicated record for unknown node, dropped");
                }
            }
        }
        self.refresh_projection();
        debug!(applied, total = records.len(), "replicated node states applied");
    }

    /// Observer-side reconciliation of the resource ledger; derived
    /// current values are recomputed by readers from `total - spent`.
    pub fn apply_replicated_allocations(
        &mut self,
        env: &mut HostEnv<'_>,
        allocations: Vec<ResourceAllocation>,
    ) {
        if self.role == ManagerRole::Authoritative {
            warn!("authoritative manager ignoring replicated allocations");
            return;
        }
        for entry in &allocations {
            env.publish_event(ManagerEvent::ResourceAllocationChanged {
                resource: entry.resource.clone(),
                spent: entry.allocated,
            });
        }
        self.ledger.replace_entries(allocations);
    }
}
