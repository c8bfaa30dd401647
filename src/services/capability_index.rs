//! Bidirectional worker ↔ capability tag index.
//!
//! Keeps `tag -> {worker ids}` and its inverse `worker id -> tag` in step so
//! the simulation can ask "who are the smiths?" without scanning every worker.
//! A worker belongs to at most one tag at a time.

use std::collections::HashMap;

use indexmap::IndexSet;

use crate::domain::models::WorkerId;

/// Index of workers by their declared profession.
///
/// Registration, lookup and removal are all O(1). Workers under a tag are
/// listed in registration order until one is removed: removal moves the most
/// recently registered worker of that tag into the freed slot.
#[derive(Debug, Clone, Default)]
pub struct CapabilityIndex {
    by_tag: HashMap<String, IndexSet<WorkerId>>,
    by_worker: HashMap<WorkerId, String>,
}

impl CapabilityIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `worker` with `tag`, dropping any previous tag first.
    ///
    /// Re-registering under the same tag keeps the worker's current position.
    pub fn register(&mut self, worker: WorkerId, tag: impl Into<String>) {
        let tag = tag.into();
        if self.by_worker.get(&worker) == Some(&tag) {
            return;
        }
        self.detach(worker);

        self.by_tag.entry(tag.clone()).or_default().insert(worker);
        self.by_worker.insert(worker, tag);
    }

    /// Workers registered under `tag`.
    pub fn lookup(&self, tag: &str) -> impl Iterator<Item = WorkerId> + '_ {
        self.by_tag.get(tag).into_iter().flatten().copied()
    }

    /// Number of workers registered under `tag`.
    pub fn count(&self, tag: &str) -> usize {
        self.by_tag.get(tag).map_or(0, IndexSet::len)
    }

    /// The tag `worker` is registered under.
    pub fn tag_of(&self, worker: WorkerId) -> Option<&str> {
        self.by_worker.get(&worker).map(String::as_str)
    }

    /// Removes `worker` from both directions. Returns the tag it held.
    pub fn deregister(&mut self, worker: WorkerId) -> Option<String> {
        self.detach(worker)
    }

    /// Number of registered workers.
    pub fn len(&self) -> usize {
        self.by_worker.len()
    }

    /// Returns `true` if no worker is registered.
    pub fn is_empty(&self) -> bool {
        self.by_worker.is_empty()
    }

    /// Number of distinct tags with at least one worker.
    pub fn tag_count(&self) -> usize {
        self.by_tag.len()
    }

    fn detach(&mut self, worker: WorkerId) -> Option<String> {
        let tag = self.by_worker.remove(&worker)?;
        if let Some(workers) = self.by_tag.get_mut(&tag) {
            workers.swap_remove(&worker);
            if workers.is_empty() {
                self.by_tag.remove(&tag);
            }
        }
        Some(tag)
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        let forward = self
            .by_tag
            .iter()
            .all(|(tag, workers)| workers.iter().all(|w| self.by_worker.get(w) == Some(tag)));
        let listed: usize = self.by_tag.values().map(IndexSet::len).sum();
        forward && listed == self.by_worker.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn listed(index: &CapabilityIndex, tag: &str) -> Vec<WorkerId> {
        index.lookup(tag).collect()
    }

    #[test]
    fn test_register_and_lookup() {
        let mut index = CapabilityIndex::new();
        index.register(WorkerId(1), "smith");
        index.register(WorkerId(2), "smith");
        index.register(WorkerId(3), "farmer");

        assert_eq!(listed(&index, "smith"), vec![WorkerId(1), WorkerId(2)]);
        assert_eq!(listed(&index, "farmer"), vec![WorkerId(3)]);
        assert_eq!(index.lookup("maester").count(), 0);
        assert_eq!(index.count("smith"), 2);
        assert_eq!(index.tag_of(WorkerId(3)), Some("farmer"));
    }

    #[test]
    fn test_tag_change_moves_worker() {
        let mut index = CapabilityIndex::new();
        index.register(WorkerId(1), "smith");
        index.register(WorkerId(1), "guard");

        assert_eq!(index.count("smith"), 0);
        assert_eq!(listed(&index, "guard"), vec![WorkerId(1)]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.tag_count(), 1);
    }

    #[test]
    fn test_reregister_same_tag_is_idempotent() {
        let mut index = CapabilityIndex::new();
        index.register(WorkerId(1), "smith");
        index.register(WorkerId(2), "smith");
        index.register(WorkerId(1), "smith");

        assert_eq!(listed(&index, "smith"), vec![WorkerId(1), WorkerId(2)]);
    }

    #[test]
    fn test_removal_fills_gap_with_latest_worker() {
        let mut index = CapabilityIndex::new();
        for id in 1..=4 {
            index.register(WorkerId(id), "smith");
        }

        index.deregister(WorkerId(2));
        assert_eq!(
            listed(&index, "smith"),
            vec![WorkerId(1), WorkerId(4), WorkerId(3)]
        );

        index.register(WorkerId(5), "smith");
        assert_eq!(index.lookup("smith").last(), Some(WorkerId(5)));
    }

    #[test]
    fn test_deregister_removes_both_directions() {
        let mut index = CapabilityIndex::new();
        index.register(WorkerId(1), "smith");

        assert_eq!(index.deregister(WorkerId(1)), Some("smith".to_string()));
        assert_eq!(index.deregister(WorkerId(1)), None);
        assert_eq!(index.count("smith"), 0);
        assert_eq!(index.tag_count(), 0);
        assert_eq!(index.tag_of(WorkerId(1)), None);
        assert!(index.is_empty());
    }

    proptest! {
        /// Property: the two maps stay mutual inverses
        #[test]
        fn prop_maps_stay_inverse(ops in prop::collection::vec((0u64..16, prop::option::of(0usize..4)), 0..100)) {
            let tags = ["smith", "farmer", "guard", "miner"];
            let mut index = CapabilityIndex::new();
            for (worker, tag) in ops {
                match tag {
                    Some(t) => index.register(WorkerId(worker), tags[t]),
                    None => { index.deregister(WorkerId(worker)); }
                }
                prop_assert!(index.is_consistent());
            }
        }
    }
}
