//! Condition monitoring registry.
//!
//! Conditions declare watch keys; the manager keeps one registry per
//! owner mapping keys to the nodes whose prerequisites they can flip.
//! Registration follows assignment: a node registers while level >= 1
//! (Suppressed included) and drops out at Unset.

use crate::condition::WatchKey;
use crate::ids::NodeGuid;

#[derive(Debug)]
struct WatchEntry {
    key: WatchKey,
    watcher: NodeGuid,
}

#[derive(Debug, Default)]
pub(crate) struct WatchRegistry {
    entries: Vec<WatchEntry>,
}

impl WatchRegistry {
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn register(&mut self, watcher: NodeGuid, keys: Vec<WatchKey>) {
        for key in keys {
            let duplicate = self
                .entries
                .iter()
                .any(|entry| entry.watcher == watcher && entry.key == key);
            if !duplicate {
                self.entries.push(WatchEntry { key, watcher });
            }
        }
    }

    /// Watching nodes whose key matches the predicate, deduplicated in
    /// registration order.
    pub fn watchers_of(&self, mut matches: impl FnMut(&WatchKey) -> bool) -> Vec<NodeGuid> {
        let mut watchers: Vec<NodeGuid> = Vec::new();
        for entry in &self.entries {
            if matches(&entry.key) && !watchers.contains(&entry.watcher) {
                watchers.push(entry.watcher);
            }
        }
        watchers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::AttributeHandle;

    #[test]
    fn registration_deduplicates_per_watcher() {
        let node = NodeGuid::generate();
        let key = WatchKey::Attribute(AttributeHandle::new("strength"));
        let mut registry = WatchRegistry::default();
        registry.register(node, vec![key.clone()]);
        registry.register(node, vec![key.clone()]);

        let watchers = registry.watchers_of(|k| *k == key);
        assert_eq!(watchers, vec![node]);
    }
}
