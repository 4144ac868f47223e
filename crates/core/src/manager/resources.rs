//! Resource ledger and budget math.
//!
//! The ledger tracks *spent*, never current: the owner's backing
//! property or attribute is the total budget, and the remaining amount
//! is recomputed as `total - spent` on every read. Outside writers to
//! the backing store are tolerated; drift is reconciled only by
//! [`SkillTreeManager::rebuild_allocated_resource_cache`].

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cost::{ResolvedCost, ResourceDef, ResourceId};
use crate::ports::{HostEnv, ManagerEvent, OwnerContext, ReplicatedField};

use super::SkillTreeManager;

/// One replicated ledger entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAllocation {
    pub resource: ResourceDef,
    pub allocated: u32,
}

/// Spent amounts per resource, one entry per distinct definition.
#[derive(Clone, Debug, Default)]
pub struct ResourceLedger {
    entries: Vec<ResourceAllocation>,
}

impl ResourceLedger {
    pub fn allocated(&self, resource: &ResourceDef) -> u32 {
        self.entries
            .iter()
            .find(|entry| &entry.resource == resource)
            .map(|entry| entry.allocated)
            .unwrap_or(0)
    }

    pub fn add(&mut self, resource: &ResourceDef, amount: u32) {
        if resource.is_none() || amount == 0 {
            return;
        }
        match self
            .entries
            .iter_mut()
            .find(|entry| &entry.resource == resource)
        {
            Some(entry) => entry.allocated += amount,
            None => self.entries.push(ResourceAllocation {
                resource: resource.clone(),
                allocated: amount,
            }),
        }
    }

    /// Saturating removal; the ledger never goes negative.
    pub fn remove(&mut self, resource: &ResourceDef, amount: u32) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| &entry.resource == resource)
        {
            entry.allocated = entry.allocated.saturating_sub(amount);
        }
        self.entries.retain(|entry| entry.allocated > 0);
    }

    pub fn set(&mut self, resource: &ResourceDef, amount: u32) {
        self.entries.retain(|entry| &entry.resource != resource);
        if amount > 0 {
            self.entries.push(ResourceAllocation {
                resource: resource.clone(),
                allocated: amount,
            });
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[ResourceAllocation] {
        &self.entries
    }

    pub fn replace_entries(&mut self, entries: Vec<ResourceAllocation>) {
        self.entries = entries;
    }
}

/// Total budget of a resource as backed by the owner. A missing backing
/// store reads as zero, making costs effectively unpayable.
pub(crate) fn budget_from_owner(owner: &dyn OwnerContext, resource: &ResourceDef) -> u32 {
    match &resource.id {
        ResourceId::None => 0,
        ResourceId::OwnerProperty(name) => owner
            .get_int_property(name)
            .map(|value| value.max(0) as u32)
            .unwrap_or(0),
        ResourceId::OwnerAttribute(handle) => owner
            .get_attribute(handle)
            .map(|value| value.max(0.0).round() as u32)
            .unwrap_or(0),
    }
}

impl SkillTreeManager {
    /// Replicated snapshot of the ledger.
    pub fn replicated_allocations(&self) -> Vec<ResourceAllocation> {
        self.ledger.entries().to_vec()
    }

    /// Spends merged costs against the ledger and emits the change
    /// signals. Caller has already validated affordability.
    pub(crate) fn spend(&mut self, env: &mut HostEnv<'_>, costs: &[ResolvedCost]) {
        for cost in costs {
            self.ledger.add(&cost.resource, cost.amount);
            let spent = self.ledger.allocated(&cost.resource);
            env.publish_event(ManagerEvent::ResourceAllocationChanged {
                resource: cost.resource.clone(),
                spent,
            });
        }
        if !costs.is_empty() {
            env.mark_dirty(ReplicatedField::ResourceAllocations);
        }
    }

    /// Refunds merged costs into the ledger and emits the change
    /// signals.
    pub(crate) fn refund(&mut self, env: &mut HostEnv<'_>, costs: &[ResolvedCost]) {
        for cost in costs {
            self.ledger.remove(&cost.resource, cost.amount);
            let spent = self.ledger.allocated(&cost.resource);
            env.publish_event(ManagerEvent::ResourceAllocationChanged {
                resource: cost.resource.clone(),
                spent,
            });
        }
        if !costs.is_empty() {
            env.mark_dirty(ReplicatedField::ResourceAllocations);
        }
    }

    /// Credits `delta` back to the owner's backing store and adjusts the
    /// ledger by the opposite amount. Used when an invalidated save is
    /// refunded: the player pool grows, the spent tally shrinks.
    pub fn modify_resource(&mut self, env: &mut HostEnv<'_>, resource: &ResourceDef, delta: i64) {
        let result = match &resource.id {
            ResourceId::None => Ok(()),
            ResourceId::OwnerProperty(name) => env
                .owner()
                .get_int_property(name)
                .and_then(|value| env.owner_mut().set_int_property(name, value + delta)),
            ResourceId::OwnerAttribute(handle) => {
                env.owner_mut().modify_attribute(handle, delta as f64)
            }
        };
        if let Err(err) = result {
            warn!(%resource, %err, "owner store rejected resource modification");
            return;
        }

        if delta >= 0 {
            self.ledger.remove(resource, delta as u32);
        } else {
            self.ledger.add(resource, delta.unsigned_abs() as u32);
        }
        let spent = self.ledger.allocated(resource);
        env.publish_event(ManagerEvent::ResourceAllocationChanged {
            resource: resource.clone(),
            spent,
        });
        env.mark_dirty(ReplicatedField::ResourceAllocations);
    }

    /// Direct ledger mutation used during load, before the rebuild pass.
    pub fn modify_overall_allocation(
        &mut self,
        env: &mut HostEnv<'_>,
        resource: &ResourceDef,
        delta: i64,
    ) {
        if delta >= 0 {
            self.ledger.add(resource, delta as u32);
        } else {
            self.ledger.remove(resource, delta.unsigned_abs() as u32);
        }
        let spent = self.ledger.allocated(resource);
        env.publish_event(ManagerEvent::ResourceAllocationChanged {
            resource: resource.clone(),
            spent,
        });
        env.mark_dirty(ReplicatedField::ResourceAllocations);
    }

    /// Zeroes the ledger, then re-derives it from the total costs of
    /// every assigned non-default node across all trees.
    pub fn rebuild_allocated_resource_cache(&mut self, env: &mut HostEnv<'_>) {
        self.ledger.clear();
        let mut totals: Vec<ResolvedCost> = Vec::new();
        for tree in &self.trees {
            for (_, node) in tree.iter() {
                if node.active_by_default || !node.is_assigned() {
                    continue;
                }
                totals.extend(node.total_costs_for_all_active_levels());
            }
        }
        for cost in crate::cost::merge_costs(totals) {
            self.ledger.set(&cost.resource, cost.amount);
            env.publish_event(ManagerEvent::ResourceAllocationChanged {
                resource: cost.resource,
                spent: cost.amount,
            });
        }
        env.mark_dirty(ReplicatedField::ResourceAllocations);
        debug!(entries = self.ledger.entries().len(), "resource cache rebuilt");
    }
}
